//! HTTP handlers
//!
//! Thin axum layer over the service modules. Handlers classify nothing
//! themselves; they surface the error taxonomy from `crate::error`.

use axum::http::HeaderMap;

pub mod admin;
pub mod checkin;
pub mod health;
pub mod stats;

/// Request signals the intake path cares about
#[derive(Debug, Clone)]
pub struct ClientSignals {
    pub fingerprint: Option<String>,
    pub user_agent: String,
    pub network_address: String,
    pub accept_language: Option<String>,
}

/// Pull device/network signals out of the request headers.
///
/// The network address comes from proxy headers because the service is
/// expected to sit behind a reverse proxy; absent those it degrades to
/// an `unknown` bucket (the address only feeds a salted hash anyway).
pub fn client_signals(headers: &HeaderMap) -> ClientSignals {
    let header_str =
        |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);

    let network_address = header_str("x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
        .or_else(|| header_str("x-real-ip"))
        .unwrap_or_else(|| "unknown".to_string());

    ClientSignals {
        fingerprint: header_str("x-device-id"),
        user_agent: header_str("user-agent").unwrap_or_else(|| "unknown".to_string()),
        network_address,
        accept_language: header_str("accept-language"),
    }
}
