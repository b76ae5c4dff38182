//! Checks the line scanners against equivalent regular expressions.

use std::ops::Range;

use libassetclone::rewrite::scanner::{guid_tokens, reference_blocks};
use pretty_assertions::assert_eq;
use regex::Regex;

const TOKEN_PATTERN: &str = r"guid: [0-9a-z]*(,| \})";
const FIELD: &str = r"[\p{Alphabetic}0-9_: \-]*";

fn block_pattern() -> Regex {
    Regex::new(&format!(r"\{{{FIELD}, guid: {FIELD}((, {FIELD})|)\}}")).unwrap()
}

const SAMPLES: &[&str] = &[
    "",
    "m_Prefab: {fileID: 1, guid: abc123, type: 2}",
    "m_Prefab: {fileID: 1, guid: abc123}",
    "m_Prefab: {fileID: 1, guid: , type: 2}",
    "m_Prefab: {fileID: 1, guid: abc123 }",
    "m_Prefab: {fileID: 1, guid: ABC123, type: 2}",
    "m_List: [{fileID: 1, guid: a, type: 2}, {fileID: 2, guid: b}]",
    "{fileID: 1, guid: a, type: 2, extra: 3}",
    "{fileID: 1, guid: a, guid: b}",
    "{{fileID: 1, guid: a}}",
    "guid: guid: abc,",
    "guid:abc,",
    "  guid: 0123456789abcdef0123456789abcdef,",
    "{fileID: -1, guid: x-y_z, type: 3}",
    "{ fileID: 1 , guid: a }",
    "{fileID: 1, guid: a, type: 2",
    "{fileID: 1 guid: a}",
    "{clé: 1, guid: é}",
    "{fileID: 1, guid: e\u{301}}",
    "{fileID: 1, guid: a\u{203f}b}",
    "{fileID: \u{663}, guid: x}",
    "{fileID: 1, guid: x\u{b2}}",
    "{fileID: 1, guid: a}{fileID: 2, guid: b}",
];

fn regex_ranges(regex: &Regex, line: &str) -> Vec<Range<usize>> {
    regex.find_iter(line).map(|m| m.range()).collect()
}

fn token_ranges(line: &str) -> Vec<Range<usize>> {
    guid_tokens(line).map(|token| token.range).collect()
}

fn block_ranges(line: &str) -> Vec<Range<usize>> {
    reference_blocks(line).collect()
}

fn check(line: &str, tokens: &Regex, blocks: &Regex) {
    assert_eq!(
        token_ranges(line),
        regex_ranges(tokens, line),
        "token mismatch on {line:?}"
    );
    assert_eq!(
        block_ranges(line),
        regex_ranges(blocks, line),
        "block mismatch on {line:?}"
    );
}

#[test]
fn samples_match_the_patterns() {
    let tokens = Regex::new(TOKEN_PATTERN).unwrap();
    let blocks = block_pattern();

    for line in SAMPLES {
        check(line, &tokens, &blocks);
    }
}

#[test]
fn token_ids_exclude_the_terminator() {
    let line = "a: {fileID: 1, guid: abc123, type: 2} b: {guid: x }";
    let ids: Vec<&str> = guid_tokens(line).map(|token| token.id).collect();

    assert_eq!(ids, vec!["abc123", "x"]);
}

/// Builds lines out of fragments that are likely to form partial or
/// complete references and compares both scanners with the patterns.
#[test]
fn random_lines_match_the_patterns() {
    const FRAGMENTS: &[&str] = &[
        "{", "}", " }", ",", ", ", "guid: ", ", guid: ", "fileID: ", "type: 2", "abc", "09",
        "Z", "-", "_", ":", " ", "é", "[", "]", "\t", "\u{301}", "\u{203f}", "\u{663}", "\u{b2}",
    ];

    let tokens = Regex::new(TOKEN_PATTERN).unwrap();
    let blocks = block_pattern();

    for _ in 0..5000 {
        let length = rand::random_range(0..16usize);
        let line: String = (0..length)
            .map(|_| FRAGMENTS[rand::random_range(0..FRAGMENTS.len())])
            .collect();

        check(&line, &tokens, &blocks);
    }
}
