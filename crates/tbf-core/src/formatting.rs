//! Outbound text shaping: sanitization and inline-link substitution.

use regex::Regex;

use crate::entities::Link;

/// Strip invisible characters and normalize whitespace/line structure.
///
/// Removes zero-width joiners/non-joiners, direction marks and the BOM
/// anywhere in the string. Runs of space/tab collapse to a single space and
/// lines are trimmed; leading blank lines are dropped and interior runs of
/// blank lines collapse to one. Idempotent.
pub fn sanitize(text: &str) -> String {
    let invisible = Regex::new("[\u{200c}\u{200d}\u{200e}\u{200f}\u{feff}]").expect("valid regex");
    let runs = Regex::new(r"[ \t]+").expect("valid regex");

    let stripped = invisible.replace_all(text, "");

    let mut lines: Vec<String> = Vec::new();
    for raw in stripped.split('\n') {
        let line = runs
            .replace_all(raw.trim_matches(&[' ', '\t'][..]), " ")
            .into_owned();
        if !line.is_empty() {
            lines.push(line);
        } else if lines.last().map_or(false, |prev| !prev.is_empty()) {
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

/// Merge sanitized text with extracted links as inline markdown.
///
/// Links substitute longest display text first so a shorter link whose text
/// is a substring of a longer one cannot partially consume it; ties keep
/// extraction order. Each link replaces only the first remaining occurrence
/// of its display text and is skipped silently once that text has been
/// consumed by an earlier substitution. Substitutions go through NUL-marked
/// placeholders so a later link can never match inside an earlier insertion.
/// The markdown form is padded with spaces so it cannot visually merge with
/// adjacent emoji or punctuation; a post-pass collapses the resulting space
/// runs and tidies `|` separators.
pub fn format_message(text: &str, links: &[Link]) -> String {
    let clean = sanitize(text);
    if links.is_empty() {
        return clean;
    }

    let mut ordered: Vec<&Link> = links.iter().collect();
    ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut formatted = clean;
    let mut inserted: Vec<&Link> = Vec::new();
    for link in ordered {
        let link_text = link.0.as_str();
        if let Some(pos) = formatted.find(link_text) {
            let idx = inserted.len();
            formatted.replace_range(pos..pos + link_text.len(), &format!(" \0LINK{idx}\0 "));
            inserted.push(link);
        }
    }

    let squeeze = Regex::new(r" {3,}").expect("valid regex");
    let mut formatted = squeeze.replace_all(&formatted, "  ").into_owned();
    let before_pipe = Regex::new(r" +\|").expect("valid regex");
    formatted = before_pipe.replace_all(&formatted, " |").into_owned();
    let after_pipe = Regex::new(r"\| +").expect("valid regex");
    formatted = after_pipe.replace_all(&formatted, "| ").into_owned();

    for (idx, (link_text, link_url)) in inserted.iter().map(|l| (&l.0, &l.1)).enumerate() {
        formatted = formatted.replace(
            &format!("\0LINK{idx}\0"),
            &format!("[{link_text}]({link_url})"),
        );
    }

    formatted
}
