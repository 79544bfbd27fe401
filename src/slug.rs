//! URL slugs for content records.

use std::sync::LazyLock;

use regex::Regex;

static NON_SLUG_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

/// Convert a title into a URL-safe slug.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into a
/// single `-`, then trims hyphens from both ends. Degenerate input yields an
/// empty string.
///
/// ```
/// use slowcinema::slug::slugify;
///
/// assert_eq!(slugify("Stalker"), "stalker");
/// assert_eq!(slugify("Jeanne Dielman, 23 quai du Commerce"), "jeanne-dielman-23-quai-du-commerce");
/// ```
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    NON_SLUG_RUN.replace_all(&lowered, "-").trim_matches('-').to_string()
}

/// Last path segment of a stored source URL.
pub fn slug_from_url(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or_default()
}

/// Escape LIKE wildcards with `!` so a slug matches literally.
pub(crate) fn escape_like(slug: &str) -> String {
    let mut out = String::with_capacity(slug.len());
    for c in slug.chars() {
        if matches!(c, '%' | '_' | '!') {
            out.push('!');
        }
        out.push(c);
    }
    out
}
