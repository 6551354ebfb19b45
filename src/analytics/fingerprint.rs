//! Privacy-preserving visitor fingerprints
//!
//! A fingerprint is the SHA-256 of the visitor's address string, truncated
//! for storage compactness. The raw address must never be persisted or
//! logged; this hash is the only identifier that leaves the request path.

use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Stored fingerprint length in hex characters (8 bytes of the digest).
const FINGERPRINT_HEX_LEN: usize = 16;

/// Derive a stable, non-reversible fingerprint from a network address.
pub fn fingerprint(addr: &str) -> String {
    let digest = Sha256::digest(addr.as_bytes());

    let mut out = String::with_capacity(FINGERPRINT_HEX_LEN);
    for byte in &digest[..FINGERPRINT_HEX_LEN / 2] {
        // Writing to a String cannot fail
        let _ = write!(out, "{byte:02x}");
    }
    out
}
