//! Canonical identifier derivation from archiver metric labels.
//!
//! Upstream labels are free-form English with embedded units, HTML
//! entities, and punctuation. The schema is keyed by the output of
//! [`key_to_pv`], so the whole pipeline must be deterministic: the same
//! label must normalize to the same identifier across restarts or a
//! schema bound once would silently stop matching.

/// Derive a PV-style identifier from an archiver metrics key.
///
/// Pre-filters run in fixed order before the generic parametrization:
/// the `»` transition separator (appearing both as the raw character and
/// as the `&raquo;` HTML entity) becomes " to ", `/` becomes " per ",
/// `ETL` is spaced out so it tokenizes as its own word, and a trailing
/// lowercase `rate` is normalized to `Rate`.
///
/// # Example
///
/// ```
/// use archstats_transform::key_to_pv;
///
/// assert_eq!(
///     key_to_pv("Avg time spent by getETLStreams() in ETL(0&raquo;1) (s/run)"),
///     "AvgTimeSpentByGetEtlStreamsInEtl0To1SPerRun",
/// );
/// ```
pub fn key_to_pv(key: &str) -> String {
    let key = key
        .replace("&raquo;", " to ")
        .replace('\u{00bb}', " to ")
        .replace('/', " per ")
        .replace("ETL", " ETL ");

    let key = match key.strip_suffix("rate") {
        Some(stripped) => format!("{stripped}Rate"),
        None => key,
    };

    camelize(&parameterize(&key))
}

/// Reduce a label to lowercase ASCII-alphanumeric tokens joined by `_`.
///
/// Runs of any other character collapse into a single separator;
/// leading/trailing separators are trimmed. An empty result means the
/// label had no usable characters, which callers must treat as an
/// anomaly rather than accept as an identifier.
pub fn parameterize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_sep = false;
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Upper-camel-case an underscore-separated identifier.
///
/// The first letter of each token is uppercased and the rest kept as-is,
/// so already well-formed keys like `totalSpace` camelize directly to
/// `TotalSpace` without a round-trip through [`parameterize`].
pub fn camelize(s: &str) -> String {
    s.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + chars.as_str()
                }
                None => String::new(),
            }
        })
        .collect()
}
