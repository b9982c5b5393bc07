use crate::message::Occurrence;
use std::collections::HashSet;
use url::Url;

/// Find HTTP/HTTPS URL occurrences in `text`, each with the byte range it
/// spans. Scheme matching is ASCII case-insensitive. Deduplicated by
/// normalized URL, first occurrence wins, order of appearance.
///
/// Ranges are exact: a URL written as the target of a markdown masked link
/// produces the same range the masked-link filter computes for that target,
/// so positional acceptance policies compose with this scanner directly.
#[must_use]
pub fn scan_occurrences(text: &str) -> Vec<Occurrence<'_>> {
    // ASCII lowercasing never changes byte length, so offsets into
    // `lowered` are valid offsets into `text`.
    let lowered = text.to_ascii_lowercase();
    let mut seen = HashSet::new();
    let mut occurrences = Vec::new();
    let mut cursor = 0;

    while let Some(found) = lowered[cursor..].find("http") {
        let start = cursor + found;
        let end = run_end(text, start);
        // The run is consumed whether or not it parses; URLs never overlap.
        cursor = end;

        let raw = strip_trailing_punctuation(&text[start..end]);
        if raw.is_empty() {
            continue;
        }
        let Some(url) = try_parse_url(raw) else {
            continue;
        };
        if !seen.insert(url.to_string()) {
            continue;
        }
        occurrences.push(Occurrence {
            url,
            range: start..start + raw.len(),
            text,
        });
    }

    occurrences
}

/// Byte offset one past the last character belonging to the URL run that
/// starts at `start`.
fn run_end(text: &str, start: usize) -> usize {
    text[start..]
        .char_indices()
        .find(|&(_, c)| is_terminator(c))
        .map_or(text.len(), |(offset, _)| start + offset)
}

/// Characters that end a URL run. Trailing sentence punctuation is handled
/// separately so it can appear inside a URL but not at its end.
fn is_terminator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '<' | '>' | '[' | ']' | '"' | '\'' | '`')
}

fn strip_trailing_punctuation(s: &str) -> &str {
    let mut end = s.len();
    let bytes = s.as_bytes();

    while end > 0 {
        let ch = bytes[end - 1];
        if ch == b'.' || ch == b',' || ch == b';' || ch == b'!' || ch == b'?' || ch == b')' {
            end -= 1;
        } else {
            break;
        }
    }

    &s[..end]
}

fn try_parse_url(candidate: &str) -> Option<Url> {
    let url = Url::parse(candidate).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url),
        _ => None,
    }
}
