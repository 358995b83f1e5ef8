//! Layout-preserving line wrapping for translated text
//!
//! Translations tend to run longer than their source. For UI texts with
//! fixed display widths the translated text is reflowed so each line
//! stays within `source_line_length * tolerance` characters.

/// Reflow `translated` to approximate the line lengths of `source`.
///
/// Pure function. A single-line source wraps the whole translation;
/// a multi-line source with a matching translated line count wraps per
/// line; mismatched line counts leave the translation untouched. Words
/// are never broken, so a single word longer than the bound keeps its
/// own line. Empty input comes back unchanged.
pub fn wrap_to_source(source: &str, translated: &str, tolerance: f64) -> String {
    if translated.is_empty() {
        return String::new();
    }

    let source_lines: Vec<&str> = source.split('\n').collect();

    if source_lines.len() == 1 {
        return wrap_line_to_width(translated, max_width(source, tolerance));
    }

    let translated_lines: Vec<&str> = translated.split('\n').collect();
    if translated_lines.len() != source_lines.len() {
        // No natural mapping between the layouts
        return translated.to_string();
    }

    let wrapped: Vec<String> = source_lines
        .iter()
        .zip(translated_lines.iter())
        .map(|(source_line, translated_line)| {
            if source_line.is_empty() {
                (*translated_line).to_string()
            } else {
                wrap_line_to_width(translated_line, max_width(source_line, tolerance))
            }
        })
        .collect();

    wrapped.join("\n")
}

fn max_width(source_line: &str, tolerance: f64) -> usize {
    (char_len(source_line) as f64 * tolerance) as usize
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Greedy word wrap; returns the text unchanged when it already fits
fn wrap_line_to_width(text: &str, width: usize) -> String {
    if char_len(text) <= width {
        return text.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = char_len(word);
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        return text.to_string();
    }

    lines.join("\n")
}
