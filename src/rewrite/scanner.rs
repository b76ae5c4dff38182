//! Finds reference tokens in single lines of serialized asset text.
//!
//! Two shapes are recognized:
//!
//! - A *reference token*, `guid: <id>` immediately followed by `,` or ` }`,
//!   where `<id>` is any run (possibly empty) of ASCII digits and lowercase
//!   letters. The terminator is part of the match.
//! - A *reference block*, `{<f>, guid: <g>}` or `{<f>, guid: <g>, <x>}`,
//!   where every field is a run of letters, ASCII digits, `_`, `:`, ` `
//!   and `-`. "Letters" means the Unicode `Alphabetic` property, so the
//!   field class is a strict subset of the regex class `[\w: \-]`: combining
//!   marks, connector punctuation other than `_` and non-ASCII digits end a
//!   field.
//!
//! Both scanners report leftmost, non-overlapping matches, scanning on from
//! the end of the previous match.

use std::ops::Range;

const TOKEN_PREFIX: &str = "guid: ";
const BLOCK_GUID_SEPARATOR: &str = ", guid: ";
const BLOCK_FIELD_SEPARATOR: &str = ", ";

/// A reference token found on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuidToken<'a> {
    /// The identifier text, possibly empty.
    pub id: &'a str,
    /// Byte range of the identifier within the line.
    pub id_range: Range<usize>,
    /// Byte range of the whole token, terminator included.
    pub range: Range<usize>,
}

/// Iterator over the reference tokens of a line.
pub struct GuidTokens<'a> {
    line: &'a str,
    position: usize,
}

pub fn guid_tokens(line: &str) -> GuidTokens<'_> {
    GuidTokens { line, position: 0 }
}

impl<'a> Iterator for GuidTokens<'a> {
    type Item = GuidToken<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.line;

        while self.position <= line.len() {
            let start = self.position + line[self.position..].find(TOKEN_PREFIX)?;
            let id_start = start + TOKEN_PREFIX.len();
            let id_end = id_start
                + line[id_start..]
                    .bytes()
                    .take_while(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
                    .count();

            let rest = &line[id_end..];
            let end = if rest.starts_with(',') {
                Some(id_end + 1)
            } else if rest.starts_with(" }") {
                Some(id_end + 2)
            } else {
                None
            };

            match end {
                Some(end) => {
                    self.position = end;
                    return Some(GuidToken {
                        id: &line[id_start..id_end],
                        id_range: id_start..id_end,
                        range: start..end,
                    });
                }
                None => self.position = start + 1,
            }
        }

        None
    }
}

/// Iterator over the byte ranges of the reference blocks of a line.
pub struct ReferenceBlocks<'a> {
    line: &'a str,
    position: usize,
}

pub fn reference_blocks(line: &str) -> ReferenceBlocks<'_> {
    ReferenceBlocks { line, position: 0 }
}

impl Iterator for ReferenceBlocks<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.line;

        while self.position < line.len() {
            let start = self.position + line[self.position..].find('{')?;

            match block_end(line, start) {
                Some(end) => {
                    self.position = end;
                    return Some(start..end);
                }
                None => self.position = start + 1,
            }
        }

        None
    }
}

fn is_field_char(c: char) -> bool {
    c.is_alphabetic() || c.is_ascii_digit() || matches!(c, '_' | ':' | ' ' | '-')
}

/// Byte offset just past the longest run of field characters at `from`.
fn skip_field(line: &str, from: usize) -> usize {
    line[from..]
        .char_indices()
        .find(|&(_, c)| !is_field_char(c))
        .map_or(line.len(), |(offset, _)| from + offset)
}

/// Matches a reference block whose `{` is at `start`, returning the offset just
/// past its closing `}`.
fn block_end(line: &str, start: usize) -> Option<usize> {
    let mut at = skip_field(line, start + 1);

    if !line[at..].starts_with(BLOCK_GUID_SEPARATOR) {
        return None;
    }
    at = skip_field(line, at + BLOCK_GUID_SEPARATOR.len());

    if line[at..].starts_with(BLOCK_FIELD_SEPARATOR) {
        at = skip_field(line, at + BLOCK_FIELD_SEPARATOR.len());
    }

    line[at..].starts_with('}').then_some(at + 1)
}
