use std::borrow::Cow;

use crate::copy::{index::MappingTable, stats::CopyStats};

use super::{scanner::guid_tokens, LineRewriter};

/// Points references to copied assets at the copies.
///
/// For each line, every reference token whose identifier is a source
/// identifier in the mapping marks that identifier for replacement, and every
/// occurrence of a marked identifier on the line is then swapped for its new
/// identifier. Replacement happens in one left-to-right pass, so a
/// replacement is never itself replaced again.
pub struct HardRewriter<'a> {
    mapping: &'a MappingTable,
}

impl<'a> HardRewriter<'a> {
    pub fn new(mapping: &'a MappingTable) -> Self {
        Self { mapping }
    }
}

impl LineRewriter for HardRewriter<'_> {
    fn rewrite_line<'a>(&self, line: &'a str, stats: &CopyStats) -> Cow<'a, str> {
        // (old, new), longest old identifier first so that at any position the
        // longest candidate wins.
        let mut replacements: Vec<(&str, &str)> = Vec::new();
        let mut unchanged = 0;

        for token in guid_tokens(line) {
            match self.mapping.lookup(token.id) {
                Some(new) if !token.id.is_empty() => {
                    if !replacements.iter().any(|(old, _)| *old == token.id) {
                        replacements.push((token.id, new.as_str()));
                    }
                    stats.record_remapped(1);
                }
                _ => unchanged += 1,
            }
        }

        stats.record_left_unchanged(unchanged);

        if replacements.is_empty() {
            return Cow::Borrowed(line);
        }

        replacements.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut output = String::with_capacity(line.len());
        let mut rest = line;
        let mut changed = false;

        'scan: while !rest.is_empty() {
            for (old, new) in &replacements {
                if let Some(after) = rest.strip_prefix(old) {
                    output.push_str(new);
                    rest = after;
                    changed |= old != new;
                    continue 'scan;
                }
            }

            let next = rest.chars().next().map_or(1, char::len_utf8);
            output.push_str(&rest[..next]);
            rest = &rest[next..];
        }

        if changed {
            Cow::Owned(output)
        } else {
            Cow::Borrowed(line)
        }
    }
}
