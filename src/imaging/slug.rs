use unicode_normalization::UnicodeNormalization;

/// Turn arbitrary text into a filesystem-safe file stem.
///
/// Without `allow_unicode` the text is NFKD-decomposed and folded to ASCII,
/// which strips diacritics. Word characters, whitespace and hyphens survive,
/// runs of whitespace/hyphens collapse to one `-`, and leading or trailing
/// `-`/`_` are removed.
pub fn slugify(value: &str, allow_unicode: bool) -> String {
    let normalized: String = if allow_unicode {
        value.nfkc().collect()
    } else {
        value.nfkd().filter(char::is_ascii).collect()
    };

    let mut slug = String::with_capacity(normalized.len());
    let mut pending_dash = false;
    for ch in normalized.to_lowercase().chars() {
        if ch == '-' || ch.is_whitespace() {
            pending_dash = true;
        } else if ch.is_alphanumeric() || ch == '_' {
            if pending_dash {
                slug.push('-');
                pending_dash = false;
            }
            slug.push(ch);
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}
