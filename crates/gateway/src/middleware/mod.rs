//! HTTP middleware

pub mod request_metrics;
