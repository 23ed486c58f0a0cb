use std::{path::PathBuf, str::FromStr};

use argh::FromArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Dev,
    Prod,
}

impl FromStr for AppMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => Err(format!("unknown mode {other}, expected dev|prod")),
        }
    }
}

/// Comma-separated BCP-47 tags.
#[derive(Debug, Clone)]
pub struct Locales(pub Vec<String>);

impl Default for Locales {
    fn default() -> Self {
        Self(vec!["en".to_owned()])
    }
}

impl FromStr for Locales {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tags: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_owned)
            .collect();
        if tags.is_empty() {
            return Err("expected a comma-separated list of locale tags".to_owned());
        }
        Ok(Self(tags))
    }
}

#[derive(Debug, Clone, FromArgs)]
#[argh(description = "Mining pool notification bot")]
pub struct Args {
    #[argh(
        option,
        short = 'm',
        description = "application mode (dev|prod)",
        default = "AppMode::Dev"
    )]
    pub mode: AppMode,

    #[argh(
        option,
        short = 'c',
        description = "path to configuration",
        default = "\"configs/bot.toml\".into()"
    )]
    pub config: PathBuf,

    #[argh(
        option,
        description = "pool api certificates path",
        default = "\"certs\".into()"
    )]
    pub certs: PathBuf,

    #[argh(option, description = "locales path", default = "\"locales\".into()")]
    pub locales_path: PathBuf,

    #[argh(
        option,
        description = "comma-separated list of bot locales",
        default = "Locales::default()"
    )]
    pub locales: Locales,

    #[argh(option, description = "additional log output path")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_locales_parse() {
        let locales: Locales = "en, ru,de".parse().unwrap();
        assert_eq!(locales.0, vec!["en", "ru", "de"]);

        assert!(Locales::from_str(" , ").is_err());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(AppMode::from_str("dev").unwrap(), AppMode::Dev);
        assert_eq!(AppMode::from_str("prod").unwrap(), AppMode::Prod);
        assert!(AppMode::from_str("staging").is_err());
    }
}
