use crate::message::Occurrence;
use std::ops::Range;

/// Byte ranges of every `[label](target)` target portion found in `text`.
///
/// Brackets pair LIFO: each `]` consumes the nearest unconsumed `[`, and
/// only a paired `]` immediately followed by `(` starts a target. Targets
/// end at the first `)`, like the lazy matching the markdown renderers this
/// guards against use. Stray and unbalanced brackets contribute nothing.
/// Scanning resumes past a completed construct, so bytes inside a collected
/// target never pair with later text.
#[must_use]
pub fn masked_target_ranges(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut open_brackets: usize = 0;

    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'[' => open_brackets += 1,
            b']' => {
                // A `]` with no unconsumed `[` before it is stray text,
                // even when `(` follows.
                if open_brackets > 0 {
                    open_brackets -= 1;
                    if bytes.get(i + 1) == Some(&b'(') {
                        let start = i + 2;
                        if let Some(len) = bytes[start..].iter().position(|&b| b == b')') {
                            ranges.push(start..start + len);
                            i = start + len;
                        }
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }

    ranges
}

/// Acceptance policy for detected URL occurrences.
///
/// Rejects a candidate iff its byte range is exactly the target range of a
/// markdown-style masked link in the same text; everything else passes.
#[must_use]
pub fn accept(occurrence: &Occurrence<'_>) -> bool {
    !masked_target_ranges(occurrence.text)
        .iter()
        .any(|range| *range == occurrence.range)
}

#[cfg(test)]
mod tests {
    use super::{accept, masked_target_ranges};
    use crate::message::Occurrence;
    use url::Url;

    fn occurrence_at<'a>(text: &'a str, raw: &str) -> Occurrence<'a> {
        let start = text.find(raw).expect("raw url present in text");
        Occurrence {
            url: Url::parse(raw).expect("valid url"),
            range: start..start + raw.len(),
            text,
        }
    }

    #[test]
    fn finds_single_markdown_target() {
        let text = "Check [click me!](http://evil.example)";
        let ranges = masked_target_ranges(text);
        assert_eq!(ranges.len(), 1);
        assert_eq!(&text[ranges[0].clone()], "http://evil.example");
    }

    #[test]
    fn finds_every_construct_in_text() {
        let text = "[a](http://one.example) and [b](http://two.example)";
        let ranges = masked_target_ranges(text);
        let targets: Vec<&str> = ranges.iter().map(|r| &text[r.clone()]).collect();
        assert_eq!(targets, vec!["http://one.example", "http://two.example"]);
    }

    #[test]
    fn nested_constructs_collect_inner_and_outer_targets() {
        let text = "[outer [inner](http://in.example) rest](http://out.example)";
        let ranges = masked_target_ranges(text);
        let targets: Vec<&str> = ranges.iter().map(|r| &text[r.clone()]).collect();
        assert!(targets.contains(&"http://in.example"));
        assert!(targets.contains(&"http://out.example"));
    }

    #[test]
    fn target_ends_at_first_close_paren() {
        let text = "[wiki](http://x.test/p(q)r)";
        let ranges = masked_target_ranges(text);
        assert_eq!(&text[ranges[0].clone()], "http://x.test/p(q");
    }

    #[test]
    fn unbalanced_brackets_yield_no_targets() {
        assert!(masked_target_ranges("[open](http://x.test").is_empty());
        assert!(masked_target_ranges("](http://x.test)").is_empty());
        assert!(masked_target_ranges("no markdown at all").is_empty());
    }

    #[test]
    fn close_bracket_after_closed_pair_is_stray() {
        // `[a]` consumed its bracket, so the second `]` pairs with nothing.
        let text = "[a] ](http://x.test)";
        assert!(masked_target_ranges(text).is_empty());
        assert!(accept(&occurrence_at(text, "http://x.test")));
    }

    #[test]
    fn stray_tail_after_a_real_construct_masks_nothing() {
        let text = "[one](http://a.test) ](http://b.test)";
        let ranges = masked_target_ranges(text);
        assert_eq!(ranges.len(), 1);
        assert_eq!(&text[ranges[0].clone()], "http://a.test");
        assert!(accept(&occurrence_at(text, "http://b.test")));
    }

    #[test]
    fn rejects_occurrence_exactly_matching_a_target() {
        let text = "Check [click me!](http://evil.example)";
        assert!(!accept(&occurrence_at(text, "http://evil.example")));
    }

    #[test]
    fn accepts_plain_occurrence() {
        let text = "See http://example.com/page for details";
        assert!(accept(&occurrence_at(text, "http://example.com/page")));
    }

    #[test]
    fn rejection_is_positional_not_by_url() {
        // Same URL appears masked and bare; only the masked occurrence is
        // rejected.
        let text = "[hidden](http://dual.example) but also http://dual.example";
        let masked = occurrence_at(text, "http://dual.example");
        assert!(!accept(&masked));

        let bare_start = text.rfind("http://dual.example").unwrap();
        let bare = Occurrence {
            url: Url::parse("http://dual.example").unwrap(),
            range: bare_start..bare_start + "http://dual.example".len(),
            text,
        };
        assert!(accept(&bare));
    }

    #[test]
    fn accepts_when_markdown_is_malformed() {
        let text = "[dangling](http://x.test and http://x.test";
        assert!(accept(&occurrence_at(text, "http://x.test")));
    }

    #[test]
    fn ranges_are_byte_offsets_in_multibyte_text() {
        let text = "héllo → [masqué](http://évil.example) fin";
        let ranges = masked_target_ranges(text);
        assert_eq!(ranges.len(), 1);
        assert_eq!(&text[ranges[0].clone()], "http://évil.example");
    }

    #[test]
    fn empty_target_never_matches_a_real_url() {
        let text = "[empty]() plus http://real.example";
        assert!(accept(&occurrence_at(text, "http://real.example")));
    }
}
