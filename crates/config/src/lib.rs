//! Consolidated bot configuration, loaded from a single TOML file.

mod config;

pub use config::{
    BotConfig, CheckIntervals, Config, NotifyConfig, PostgresConfig, SupportBotConfig,
};
