//! File role and language detection from names.

use std::path::Path;

use super::meta::ContentClass;

/// Extensions treated as page content.
pub const CONTENT_EXTENSIONS: &[&str] = &["md", "markdown", "html", "htm", "typ"];

/// Files never listed.
pub const IGNORED_FILES: &[&str] = &[".DS_Store"];

pub fn is_content_ext(ext: &str) -> bool {
    CONTENT_EXTENSIONS
        .iter()
        .any(|e| e.eq_ignore_ascii_case(ext))
}

/// Classify by (language-stripped) file name.
pub fn classify(name: &str, is_dir: bool) -> ContentClass {
    if is_dir {
        return ContentClass::Directory;
    }
    let path = Path::new(name);
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return ContentClass::StaticFile;
    };
    if !is_content_ext(ext) {
        return ContentClass::StaticFile;
    }
    match path.file_stem().and_then(|s| s.to_str()) {
        Some("index") => ContentClass::LeafBundleHeader,
        Some("_index") => ContentClass::BranchBundleHeader,
        _ => ContentClass::Content,
    }
}

/// Split a `name.<lang>.ext` language suffix off a file name.
///
/// Only configured languages count, so `v1.2.tar` stays intact.
/// Returns the language (if any) and the translation base name.
pub fn split_lang<'a, S: AsRef<str>>(name: &str, languages: &'a [S]) -> (Option<&'a str>, String) {
    let Some((rest, ext)) = name.rsplit_once('.') else {
        return (None, name.to_owned());
    };
    let Some((stem, lang)) = rest.rsplit_once('.') else {
        return (None, name.to_owned());
    };
    if stem.is_empty() {
        return (None, name.to_owned());
    }
    match languages.iter().map(AsRef::as_ref).find(|l| *l == lang) {
        Some(lang) => (Some(lang), format!("{stem}.{ext}")),
        None => (None, name.to_owned()),
    }
}
