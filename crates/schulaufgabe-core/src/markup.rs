//! Cleanup of model output into compilable LaTeX.

use once_cell::sync::Lazy;
use regex::Regex;

static LATEX_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```latex").expect("static regex is valid"));

const FENCE: &str = "```";

/// Strips markdown code fences from model output.
///
/// Trims, removes every case-insensitive "```latex" opener and every bare
/// "```", then trims again. Text outside the fence sequences is left as-is.
///
/// Idempotent: after the second removal every backtick run is shorter than three,
/// so a second pass finds nothing to remove.
///
/// # Examples
///
/// ```
/// use schulaufgabe_core::markup::sanitize;
///
/// assert_eq!(sanitize("```latex\n\\section{A}\n```"), "\\section{A}");
/// assert_eq!(sanitize("  plain  "), "plain");
/// ```
pub fn sanitize(text: &str) -> String {
    let trimmed = text.trim();
    let without_opener = LATEX_FENCE.replace_all(trimmed, "");
    let without_fences = without_opener.replace(FENCE, "");
    without_fences.trim().to_string()
}
