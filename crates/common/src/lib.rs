//! Reusable utils for the bot services: tracing bootstrap, localization
//! bundles and display formatting.

pub mod format;
pub mod lang;
pub mod logging;
