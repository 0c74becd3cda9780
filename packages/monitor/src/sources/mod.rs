//! Page source implementations.

mod http;
mod rate_limited;

pub use http::HttpSource;
pub use rate_limited::RateLimitedSource;
