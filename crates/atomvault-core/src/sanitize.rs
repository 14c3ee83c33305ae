//! Filesystem name sanitization
//!
//! Remote component and folder names are display strings and may contain
//! anything, including path separators. Before a name becomes a path
//! segment it passes through [`sanitize_name`], which is deterministic and
//! has no failure mode.

/// Replacement for the empty or all-unsafe name
const FALLBACK_SEGMENT: &str = "_";

/// Sanitize a display name into a safe path segment
///
/// Keeps alphanumerics, space, `.`, `_`, and `-`; everything else becomes
/// `_`. Trailing whitespace and dots are trimmed (Windows rejects both at
/// the end of a file name). A name with nothing left resolves to `_` so
/// the caller always gets a usable segment.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_end_matches([' ', '.']);
    if trimmed.is_empty() {
        FALLBACK_SEGMENT.to_string()
    } else {
        trimmed.to_string()
    }
}
