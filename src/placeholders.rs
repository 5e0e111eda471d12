use regex::Regex;
use std::sync::OnceLock;

/// Matches `%(name)s` named placeholders, `%s`/`%d` style conversions and the
/// literal `%%` escape.
fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%\(\w+\)s|%\w|%%").unwrap())
}

/// Replace every placeholder in `text` with a `PLACEHOLDER_{i}` marker so the
/// translation service cannot mangle it. Returns the masked text and the
/// marker-to-placeholder map needed by [`restore`].
pub fn mask(text: &str) -> (String, Vec<(String, String)>) {
    let mut masked = text.to_string();
    let mut map = Vec::new();
    for (index, found) in placeholder_re().find_iter(text).enumerate() {
        let marker = format!("PLACEHOLDER_{index}");
        masked = masked.replacen(found.as_str(), &marker, 1);
        map.push((marker, found.as_str().to_string()));
    }
    (masked, map)
}

/// Substitute the markers produced by [`mask`] back with the original
/// placeholders, verbatim. Higher indices go first so `PLACEHOLDER_1` cannot
/// clobber the prefix of `PLACEHOLDER_10`.
pub fn restore(translated: &str, map: &[(String, String)]) -> String {
    let mut restored = translated.to_string();
    for (marker, placeholder) in map.iter().rev() {
        restored = restored.replace(marker, placeholder);
    }
    restored
}
