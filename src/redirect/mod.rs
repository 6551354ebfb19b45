pub mod handlers;
pub mod policy;
pub mod routes;

pub use policy::{evaluate, AccessDecision};
pub use routes::create_redirect_router;
