//! Languages, the read-only source spec and the per-language page
//! collection.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::Serialize;

use super::model::Page;

/// A configured content language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Language {
    pub code: String,
    pub weight: i32,
    pub disabled: bool,
}

impl Language {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            weight: 0,
            disabled: false,
        }
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// Everything workers need to know about the site. Shared read-only.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub default_lang: String,
    /// Publish default-language files under `<output>/<lang>/` too.
    pub default_in_subdir: bool,
    /// Ordered by weight, then code. Always contains the default language.
    languages: Vec<Language>,
    pub publish_dir: PathBuf,
}

impl SourceSpec {
    pub fn new(default_lang: impl Into<String>, publish_dir: impl Into<PathBuf>) -> Self {
        let default_lang = default_lang.into();
        Self {
            languages: vec![Language::new(default_lang.clone())],
            default_lang,
            default_in_subdir: false,
            publish_dir: publish_dir.into(),
        }
    }

    /// Add or replace a language.
    pub fn with_language(mut self, lang: Language) -> Self {
        self.languages.retain(|l| l.code != lang.code);
        self.languages.push(lang);
        self.languages
            .sort_by(|a, b| a.weight.cmp(&b.weight).then_with(|| a.code.cmp(&b.code)));
        self
    }

    pub fn with_default_in_subdir(mut self, yes: bool) -> Self {
        self.default_in_subdir = yes;
        self
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn language_codes(&self) -> Vec<String> {
        self.languages.iter().map(|l| l.code.clone()).collect()
    }

    pub fn enabled_languages(&self) -> impl Iterator<Item = &Language> {
        self.languages.iter().filter(|l| !l.disabled)
    }

    /// Empty language means the default.
    pub fn resolve_lang<'a>(&'a self, lang: &'a str) -> &'a str {
        if lang.is_empty() {
            &self.default_lang
        } else {
            lang
        }
    }

    pub fn language(&self, lang: &str) -> Option<&Language> {
        let code = self.resolve_lang(lang);
        self.languages.iter().find(|l| l.code == code)
    }

    /// The site a language builds into; unknown languages fall back to
    /// the first site.
    pub fn site_for(&self, lang: &str) -> &Language {
        self.language(lang).unwrap_or(&self.languages[0])
    }

    pub fn is_disabled(&self, lang: &str) -> bool {
        self.language(lang).is_some_and(|l| l.disabled)
    }

    /// Output prefix for a language: empty for the default language unless
    /// `default_in_subdir`, else the language code.
    pub fn target_base_path(&self, lang: &str) -> PathBuf {
        let code = self.resolve_lang(lang);
        if code == self.default_lang && !self.default_in_subdir {
            PathBuf::new()
        } else {
            PathBuf::from(code)
        }
    }

    /// Where a plain file with this logical path is published.
    pub fn publish_target(&self, lang: &str, logical_path: &Path) -> PathBuf {
        self.publish_dir
            .join(self.target_base_path(lang))
            .join(logical_path)
    }
}

/// Pages of one language.
#[derive(Debug, Default)]
pub struct Site {
    pub lang: String,
    pages: Vec<Page>,
    /// Logical path -> index of the most recently added page.
    index: FxHashMap<PathBuf, usize>,
}

impl Site {
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            ..Self::default()
        }
    }

    pub fn add_page(&mut self, page: Page) {
        self.index.insert(page.logical_path().to_path_buf(), self.pages.len());
        self.pages.push(page);
    }

    /// Replace the page with the same logical path, or add it.
    pub fn replace_page(&mut self, page: Page) {
        match self.index.get(page.logical_path()) {
            Some(&i) => self.pages[i] = page,
            None => self.add_page(page),
        }
    }

    pub fn get(&self, logical_path: &Path) -> Option<&Page> {
        self.index.get(logical_path).map(|&i| &self.pages[i])
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Page collection for all languages.
///
/// Only the processor's consumer thread writes to it during a run.
#[derive(Debug, Default)]
pub struct Sites {
    sites: BTreeMap<String, Site>,
    /// Site used for pages in unknown languages.
    first: String,
}

impl Sites {
    pub fn new(spec: &SourceSpec) -> Self {
        let sites = spec
            .languages()
            .iter()
            .map(|l| (l.code.clone(), Site::new(l.code.clone())))
            .collect();
        Self {
            sites,
            first: spec.languages()[0].code.clone(),
        }
    }

    fn site_mut(&mut self, lang: &str) -> &mut Site {
        let key = if self.sites.contains_key(lang) {
            lang.to_owned()
        } else {
            self.first.clone()
        };
        self.sites
            .entry(key)
            .or_insert_with_key(|k| Site::new(k.clone()))
    }

    pub fn add_page(&mut self, page: Page) {
        let lang = page.lang.clone();
        self.site_mut(&lang).add_page(page);
    }

    pub fn replace_page(&mut self, page: Page) {
        let lang = page.lang.clone();
        self.site_mut(&lang).replace_page(page);
    }

    pub fn site(&self, lang: &str) -> Option<&Site> {
        self.sites.get(lang)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Site> {
        self.sites.values()
    }

    pub fn total_pages(&self) -> usize {
        self.sites.values().map(Site::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> SourceSpec {
        SourceSpec::new("en", "/out")
            .with_language(Language::new("fr").with_weight(2))
            .with_language(Language::new("de").with_weight(1).disabled())
    }

    #[test]
    fn test_languages_ordered_by_weight() {
        let spec = spec();
        assert_eq!(spec.language_codes(), ["en", "de", "fr"]);
        let enabled: Vec<_> = spec.enabled_languages().map(|l| l.code.as_str()).collect();
        assert_eq!(enabled, ["en", "fr"]);
    }

    #[test]
    fn test_resolve_and_disabled() {
        let spec = spec();
        assert_eq!(spec.resolve_lang(""), "en");
        assert_eq!(spec.resolve_lang("fr"), "fr");
        assert!(spec.is_disabled("de"));
        assert!(!spec.is_disabled(""));
        assert!(!spec.is_disabled("xx"));
        assert_eq!(spec.site_for("xx").code, "en");
    }

    #[test]
    fn test_publish_target() {
        let spec = spec();
        assert_eq!(
            spec.publish_target("", Path::new("img/a.png")),
            PathBuf::from("/out/img/a.png")
        );
        assert_eq!(
            spec.publish_target("fr", Path::new("img/a.png")),
            PathBuf::from("/out/fr/img/a.png")
        );

        let spec = spec.with_default_in_subdir(true);
        assert_eq!(
            spec.publish_target("en", Path::new("a.png")),
            PathBuf::from("/out/en/a.png")
        );
    }
}
