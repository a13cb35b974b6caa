//! HTTP middleware stack: access gate, per-request trace span, CORS.

pub mod auth;
pub mod cors;
pub mod trace;
