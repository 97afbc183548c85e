//! Canonical name folding
//!
//! The backing store stores entity names lowercased with internal
//! whitespace folded to a single `-`. Every name comparison in the diff
//! and sync layers goes through [`normalize_name`] so that a template
//! saying `"Full Name"` matches a stored `"full-name"` instead of looking
//! like a duplicate creation on every re-import.

/// Separator the backing store folds whitespace runs into
pub const NAME_SEPARATOR: char = '-';

/// Canonicalize an entity name for comparison
///
/// Trims the name, lowercases it, and replaces each run of whitespace
/// with a single [`NAME_SEPARATOR`].
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for ch in name.trim().chars() {
        if ch.is_whitespace() {
            in_whitespace = true;
            continue;
        }
        if in_whitespace {
            out.push(NAME_SEPARATOR);
            in_whitespace = false;
        }
        for lower in ch.to_lowercase() {
            out.push(lower);
        }
    }

    out
}
