//! Anonymous device fingerprinting
//!
//! Derives a stable pseudonymous fingerprint from device signals only
//! (OS family, architecture, device class). The network address is
//! deliberately excluded so the same physical device fingerprints
//! identically across browsers and networks. This is a lossy heuristic:
//! two different users with identical device signals collide, and that
//! is accepted.

use sha2::{Digest, Sha256};

/// Resolve the fingerprint for a request.
///
/// A client-supplied fingerprint in the expected format is trusted
/// verbatim (format check only, no ownership check). Anything else
/// falls through to derivation from the user agent.
pub fn resolve_fingerprint(client_provided: Option<&str>, user_agent: &str) -> String {
    if let Some(provided) = client_provided {
        if is_valid_fingerprint(provided) {
            return provided.to_string();
        }
    }
    derive_fingerprint(user_agent)
}

/// SHA-256 hex digest format issued by this service
pub fn is_valid_fingerprint(candidate: &str) -> bool {
    candidate.len() == 64 && candidate.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
}

/// Derive a fingerprint from stable device signals in the user agent.
/// Never fails; unrecognized signals land in the `unknown` buckets.
pub fn derive_fingerprint(user_agent: &str) -> String {
    let components = device_components(user_agent);
    let digest = Sha256::digest(components.as_bytes());
    hex_encode(&digest)
}

/// One-way hash of a client network address. Salted so raw addresses
/// cannot be recovered by rainbow lookup; the raw address is never stored.
pub fn hash_network_address(address: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(address.as_bytes());
    hasher.update(salt.as_bytes());
    hex_encode(&hasher.finalize())
}

/// Stable device signal string: OS family | architecture | device class.
/// Browser identity is intentionally ignored.
fn device_components(user_agent: &str) -> String {
    if user_agent.is_empty() {
        return "unknown".to_string();
    }

    let ua = user_agent.to_lowercase();
    let mut parts: Vec<&str> = Vec::with_capacity(3);

    // OS family
    if ua.contains("windows nt 10") {
        parts.push("windows10");
    } else if ua.contains("windows nt 6.3") {
        parts.push("windows8.1");
    } else if ua.contains("windows nt 6.2") {
        parts.push("windows8");
    } else if ua.contains("windows nt 6.1") {
        parts.push("windows7");
    } else if ua.contains("mac os x") {
        parts.push("macos");
    } else if ua.contains("android") {
        parts.push("android");
    } else if ua.contains("iphone") || ua.contains("ipad") {
        parts.push("ios");
    } else if ua.contains("linux") {
        parts.push("linux");
    } else {
        parts.push("unknown-os");
    }

    // Instruction-set width
    if ua.contains("x86_64") || ua.contains("win64") || ua.contains("x64") {
        parts.push("64bit");
    } else if ua.contains("arm64") {
        parts.push("arm64");
    } else {
        parts.push("unknown-arch");
    }

    // Device class
    if ua.contains("mobile") || ua.contains("android") || ua.contains("iphone") {
        parts.push("mobile");
    } else if ua.contains("ipad") || ua.contains("tablet") {
        parts.push("tablet");
    } else {
        parts.push("desktop");
    }

    parts.join("|")
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}
