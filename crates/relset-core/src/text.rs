//! Text normalization applied to record text and entity names

/// Transliterate `text` to ASCII and trim surrounding whitespace.
///
/// Accents are stripped and other scripts are romanized, so `Zürich`
/// becomes `Zurich` and `Москва` becomes `Moskva`.
pub fn normalize(text: &str) -> String {
    deunicode::deunicode(text).trim().to_string()
}
