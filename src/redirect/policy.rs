//! Access policy for short links
//!
//! A pure decision function over the link record and an optionally supplied
//! credential. The caller passes the clock so the policy itself has no side
//! effects and no ambient time dependency.

use crate::models::ShortLink;

/// Terminal outcome of gating one redirect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Inactive,
    /// Covers both time-based expiry and click-cap exhaustion; the two
    /// share one terminal page.
    Expired,
    CredentialRequired,
}

/// Evaluate a link's access policy. First match wins, and the order is
/// user-visible: an inactive link reports inactive even when it is also
/// expired, and expiry is reported before a password prompt.
pub fn evaluate(link: &ShortLink, credential: Option<&str>, now_secs: i64) -> AccessDecision {
    if !link.is_active {
        return AccessDecision::Inactive;
    }

    if let Some(expires_at) = link.expires_at {
        if now_secs > expires_at {
            return AccessDecision::Expired;
        }
    }

    if let Some(max_clicks) = link.max_clicks {
        if link.click_count >= max_clicks {
            return AccessDecision::Expired;
        }
    }

    if let Some(ref password) = link.password {
        match credential {
            Some(supplied) if supplied == password => {}
            _ => return AccessDecision::CredentialRequired,
        }
    }

    AccessDecision::Allow
}
