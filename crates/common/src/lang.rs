//! Localization bundles for outbound bot messages.
//!
//! Bundles are flat `key = "template"` TOML files named `active.<tag>.toml`,
//! one per BCP-47 tag. Templates carry `{Placeholder}` markers substituted
//! at render time. Lookups fall back to the fallback locale, then to the
//! message key itself, so a missing translation never loses a notification.

use std::{collections::HashMap, path::Path};

use thiserror::Error;
use tracing::*;

pub const FALLBACK_LOCALE: &str = "en";

#[derive(Debug, Error)]
pub enum LangError {
    #[error("failed to read bundle {0}: {1}")]
    ReadBundle(String, std::io::Error),

    #[error("failed to parse bundle {0}: {1}")]
    ParseBundle(String, toml::de::Error),

    #[error("fallback locale {FALLBACK_LOCALE} missing from loaded bundles")]
    MissingFallback,
}

type Bundle = HashMap<String, String>;

pub struct Languages {
    bundles: HashMap<String, Bundle>,
}

impl Languages {
    /// Loads `active.<tag>.toml` for every requested tag from `locales_path`.
    /// The fallback locale must be among them.
    pub fn load(locales_path: &Path, locales: &[String]) -> Result<Self, LangError> {
        let mut bundles = HashMap::new();
        for tag in locales {
            let file = locales_path.join(format!("active.{tag}.toml"));
            let name = file.display().to_string();
            let raw =
                std::fs::read_to_string(&file).map_err(|e| LangError::ReadBundle(name.clone(), e))?;
            let bundle: Bundle =
                toml::from_str(&raw).map_err(|e| LangError::ParseBundle(name, e))?;
            bundles.insert(tag.clone(), bundle);
        }

        Self::from_bundles(bundles)
    }

    /// Builds the registry from in-memory bundles. Used directly by tests.
    pub fn from_bundles(bundles: HashMap<String, Bundle>) -> Result<Self, LangError> {
        if !bundles.contains_key(FALLBACK_LOCALE) {
            return Err(LangError::MissingFallback);
        }
        Ok(Self { bundles })
    }

    /// Resolves a localizer for a user-supplied tag: exact match, then the
    /// primary subtag, then the fallback locale.
    pub fn localizer(&self, lang: &str) -> Localizer<'_> {
        let fallback = &self.bundles[FALLBACK_LOCALE];
        let bundle = self
            .bundles
            .get(lang)
            .or_else(|| {
                let primary = lang.split('-').next().unwrap_or(lang);
                self.bundles.get(primary)
            })
            .unwrap_or(fallback);

        Localizer { bundle, fallback }
    }
}

pub struct Localizer<'a> {
    bundle: &'a Bundle,
    fallback: &'a Bundle,
}

impl Localizer<'_> {
    fn message(&self, key: &str) -> Option<&str> {
        self.bundle
            .get(key)
            .or_else(|| self.fallback.get(key))
            .map(String::as_str)
    }

    /// Renders a message template, substituting `{Name}` markers from `args`.
    pub fn render(&self, key: &str, args: &[(&str, &str)]) -> String {
        let Some(template) = self.message(key) else {
            warn!(%key, "missing localization message");
            return key.to_owned();
        };

        let mut out = template.to_owned();
        for (name, value) in args {
            out = out.replace(&format!("{{{name}}}"), value);
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn bundles() -> HashMap<String, Bundle> {
        let mut en = Bundle::new();
        en.insert("Greeting".to_owned(), "Hello, {Name}!".to_owned());
        en.insert("OnlyEnglish".to_owned(), "english only".to_owned());
        let mut ru = Bundle::new();
        ru.insert("Greeting".to_owned(), "Привет, {Name}!".to_owned());

        let mut map = HashMap::new();
        map.insert("en".to_owned(), en);
        map.insert("ru".to_owned(), ru);
        map
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let langs = Languages::from_bundles(bundles()).unwrap();
        let loc = langs.localizer("en");
        assert_eq!(loc.render("Greeting", &[("Name", "miner")]), "Hello, miner!");
    }

    #[test]
    fn test_primary_subtag_resolution() {
        let langs = Languages::from_bundles(bundles()).unwrap();
        let loc = langs.localizer("ru-RU");
        assert_eq!(loc.render("Greeting", &[("Name", "x")]), "Привет, x!");
    }

    #[test]
    fn test_fallback_to_english_message() {
        let langs = Languages::from_bundles(bundles()).unwrap();
        // Bundle exists but lacks the key.
        let loc = langs.localizer("ru");
        assert_eq!(loc.render("OnlyEnglish", &[]), "english only");
        // Unknown locale entirely.
        let loc = langs.localizer("zz");
        assert_eq!(loc.render("Greeting", &[("Name", "x")]), "Hello, x!");
    }

    #[test]
    fn test_missing_key_returns_key() {
        let langs = Languages::from_bundles(bundles()).unwrap();
        let loc = langs.localizer("en");
        assert_eq!(loc.render("NoSuchKey", &[]), "NoSuchKey");
    }

    #[test]
    fn test_fallback_bundle_required() {
        let mut map = bundles();
        map.remove("en");
        assert!(Languages::from_bundles(map).is_err());
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("active.en.toml"),
            "Greeting = \"Hello, {Name}!\"\n",
        )
        .unwrap();

        let langs = Languages::load(dir.path(), &["en".to_owned()]).unwrap();
        assert_eq!(
            langs.localizer("en").render("Greeting", &[("Name", "a")]),
            "Hello, a!"
        );
    }
}
