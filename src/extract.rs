//! Labeled-field extraction from raw dashboard cell text.
//!
//! Dashboard cells are multi-line text blocks of the shape
//! `Label : value` with inconsistent casing, spacing and the occasional
//! stray markup remnant. Extraction never fails: an absent label simply
//! yields nothing.

/// Returns the remainder of `block` after the first case-insensitive
/// occurrence of `label`, optional whitespace and a `:`, with leading
/// whitespace stripped. Whitespace-skipping crosses line breaks, so an
/// empty `Day :` value deliberately bleeds into the next line — the merge
/// step suppresses the resulting leftover-label artifacts.
fn after_label<'a>(block: &'a str, label: &str) -> Option<&'a str> {
    let haystack = block.to_ascii_lowercase();
    let needle = label.to_ascii_lowercase();
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(&needle) {
        let end = from + pos + needle.len();
        let after = block[end..].trim_start();
        if let Some(rest) = after.strip_prefix(':') {
            return Some(rest.trim_start());
        }
        from = end;
    }
    None
}

/// The value following `label :`, up to the end of the line, trimmed.
pub(crate) fn labeled_value(block: &str, label: &str) -> Option<String> {
    let line = after_label(block, label)?.lines().next()?.trim_end();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

/// First whitespace-delimited token after `label :`. Teacher fields are
/// short initials, never the full remainder of the line.
pub(crate) fn labeled_token(block: &str, label: &str) -> Option<String> {
    after_label(block, label)?
        .split_whitespace()
        .next()
        .map(str::to_string)
}

/// Leading run of digits and dots after `label :`, for credit values.
pub(crate) fn labeled_numeric(block: &str, label: &str) -> Option<String> {
    let rest = after_label(block, label)?;
    let run: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if run.is_empty() { None } else { Some(run) }
}

/// Strips literal bold-tag remnants that survive text extraction in some
/// portal cells.
pub(crate) fn strip_markup(value: &str) -> String {
    value.replace("<b>", "").replace("</b>", "").trim().to_string()
}
