//! `[languages]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [languages]
//! default = "en"
//! default_in_subdir = false   # Publish default-language files under /en/ too
//!
//! [languages.fr]
//! weight = 1
//!
//! [languages.de]
//! weight = 2
//! disabled = true
//! ```
//!
//! The default language is always known, listed or not.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::page::Language;

/// One `[languages.<code>]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LanguageEntry {
    pub weight: i32,
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguagesConfig {
    pub default: String,
    pub default_in_subdir: bool,
    #[serde(flatten)]
    pub entries: BTreeMap<String, LanguageEntry>,
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self {
            default: "en".into(),
            default_in_subdir: false,
            entries: BTreeMap::new(),
        }
    }
}

impl LanguagesConfig {
    const DEFAULT: FieldPath = FieldPath::new("languages.default");

    pub fn is_known(&self, code: &str) -> bool {
        code == self.default || self.entries.contains_key(code)
    }

    pub fn is_disabled(&self, code: &str) -> bool {
        self.entries.get(code).is_some_and(|e| e.disabled)
    }

    /// All configured languages, the default included.
    pub fn languages(&self) -> Vec<Language> {
        let mut langs: Vec<Language> = self
            .entries
            .iter()
            .map(|(code, entry)| {
                let lang = Language::new(code).with_weight(entry.weight);
                if entry.disabled { lang.disabled() } else { lang }
            })
            .collect();
        if !self.entries.contains_key(&self.default) {
            langs.push(Language::new(&self.default));
        }
        langs
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.default.is_empty() {
            diag.error(Self::DEFAULT, "default language must not be empty");
        } else if self.is_disabled(&self.default) {
            diag.error_with_hint(
                Self::DEFAULT,
                format!("default language `{}` is disabled", self.default),
                format!("remove `disabled` from [languages.{}]", self.default),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_languages_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.languages.default, "en");
        assert!(!config.languages.default_in_subdir);
        assert_eq!(config.languages.languages(), [Language::new("en")]);
    }

    #[test]
    fn test_language_tables() {
        let config = test_parse_config(
            r#"
[languages]
default = "fr"
default_in_subdir = true

[languages.en]
weight = 1

[languages.de]
weight = 2
disabled = true
"#,
        );
        let langs = &config.languages;
        assert_eq!(langs.default, "fr");
        assert!(langs.default_in_subdir);
        assert!(langs.is_known("fr"));
        assert!(langs.is_known("de"));
        assert!(!langs.is_known("it"));
        assert!(langs.is_disabled("de"));

        let all = langs.languages();
        assert_eq!(all.len(), 3);
        assert!(all.contains(&Language::new("de").with_weight(2).disabled()));
        assert!(all.contains(&Language::new("fr")));
    }

    #[test]
    fn test_disabled_default_is_error() {
        let config = test_parse_config("[languages.en]\ndisabled = true");
        let mut diag = ConfigDiagnostics::new();
        config.languages.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert!(diag.errors()[0].hint.is_some());
    }
}
