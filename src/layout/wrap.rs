//! Greedy word wrapping.
//!
//! Words are packed onto a line while a `fits` predicate holds for the
//! candidate line. A word that does not fit even on an empty line is placed
//! on its own line unbroken; there is no hyphenation. Explicit `\n` in the
//! input always starts a new line, and an empty input paragraph yields an
//! empty output line, so wrapping already-wrapped text is a no-op.

use super::font::{FontSpec, TextMetrics};

/// Wrap `text` with an arbitrary line predicate.
pub fn wrap_with<F>(text: &str, mut fits: F) -> Vec<String>
where
    F: FnMut(&str) -> bool,
{
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();

        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }

            let candidate = format!("{} {}", line, word);
            if fits(&candidate) {
                line = candidate;
            } else {
                lines.push(std::mem::take(&mut line));
                line.push_str(word);
            }
        }

        lines.push(line);
    }

    lines
}

/// Wrap to at most `width` characters per line (overlong words excepted).
///
/// Width is counted in `char`s, so precomposed Vietnamese letters count as
/// one column each.
pub fn wrap_chars(text: &str, width: usize) -> Vec<String> {
    wrap_with(text, |line| line.chars().count() <= width)
}

/// Wrap so each line measures at most `max_width` pixels in `font`.
pub fn wrap_pixels<M>(text: &str, metrics: &M, font: FontSpec, max_width: usize) -> Vec<String>
where
    M: TextMetrics + ?Sized,
{
    wrap_with(text, |line| metrics.measure(line, font) <= max_width)
}

/// Strip exactly one trailing line terminator (`\n` or `\r\n`).
///
/// Callers pass paragraphs that conventionally end in a newline; the
/// terminator is not content.
pub fn trim_terminator(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}
