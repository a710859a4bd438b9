//! Filename derivation and sanitization for downloaded products.
//!
//! A product is saved under the last segment of its download URL. Products
//! whose URL ends in a slash (or has no path) fall back to the title, then to
//! the catalog id.

use std::path::{Component, Path};

use url::Url;

use crate::catalog::ProductDescriptor;

/// Name used when nothing usable can be derived.
const FALLBACK_FILENAME: &str = "download.bin";

/// Longest stem kept from a title (titles can be whole sentences).
const MAX_TITLE_CHARS: usize = 120;

/// Derives the on-disk filename for `product`.
///
/// Order: decoded last URL path segment, title, id, `download.bin`.
#[must_use]
pub fn derive_filename(product: &ProductDescriptor) -> String {
    if let Some(name) = filename_from_url(&product.download_url) {
        return name;
    }
    let title: String = product.title.chars().take(MAX_TITLE_CHARS).collect();
    [title.as_str(), product.id.as_str()]
        .into_iter()
        .map(sanitize_filename)
        .find(|name| is_meaningful(name))
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Last non-empty URL path segment, percent-decoded and sanitized.
pub(crate) fn filename_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last).map_or_else(|_| last.to_string(), |d| d.into_owned());
    let name = sanitize_filename(&decoded);
    is_meaningful(&name).then_some(name)
}

/// Replaces characters that are unsafe in filenames with `_`.
///
/// Path separators, Windows-reserved characters and control characters are
/// replaced; surrounding whitespace is trimmed. A result that would still
/// name a directory component (`.` or `..`) has its dots replaced too.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    }
}

/// Splits `name` into stem and extension (with its dot).
///
/// A leading dot is part of the stem, so `.hidden` has no extension.
#[must_use]
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    }
}

fn is_meaningful(name: &str) -> bool {
    !name.trim_matches(|c| c == '_' || c == '.').is_empty()
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
