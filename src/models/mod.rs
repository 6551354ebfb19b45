pub mod link;

pub use link::{ClickEvent, NewClickEvent, NewLink, ShortLink};
