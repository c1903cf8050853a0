// contentgate: content-validation gateway
//
// This is the library root. The decision pipeline lives in `pipeline`,
// built on the per-user limiter in `rate_limit` and the classifier
// abstraction in `moderation`. The HTTP surface is behind the `web` feature.

pub mod config;
pub mod logging;
pub mod moderation;
pub mod output;
pub mod pipeline;
pub mod rate_limit;

#[cfg(feature = "web")]
pub mod web;
