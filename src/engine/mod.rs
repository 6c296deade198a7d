pub mod browser;
pub mod normalization;
pub mod rate_limiter;
