//! Client-key derivation from request headers.
//!
//! Priority order: `X-Real-IP` (trimmed) → first comma-separated segment of
//! `X-Forwarded-For` (trimmed) → peer socket address → literal `"unknown"`.
//! Grounded on `original_source/app/limiter.py::client_ip_from_headers`.

use axum::http::HeaderMap;

pub fn client_key(headers: &HeaderMap, peer: Option<std::net::SocketAddr>) -> String {
    if let Some(real_ip) = header_str(headers, "x-real-ip") {
        let trimmed = real_ip.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    if let Some(forwarded_for) = header_str(headers, "x-forwarded-for") {
        if let Some(first) = forwarded_for.split(',').next() {
            let trimmed = first.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }

    if let Some(addr) = peer {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
