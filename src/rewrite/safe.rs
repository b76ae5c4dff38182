use std::borrow::Cow;

use crate::copy::stats::CopyStats;

use super::{scanner::reference_blocks, LineRewriter};

pub const DEFAULT_SCRIPT_MARKER: &str = "m_Script";
pub const DEFAULT_NULL_REFERENCE: &str = "{fileID: 0}";

/// Cuts every reference block in a copy loose by replacing it with a null
/// reference. Lines that bind a script are left alone.
#[derive(Debug, Clone)]
pub struct SafeRewriter {
    script_marker: String,
    null_reference: String,
}

impl Default for SafeRewriter {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT_MARKER, DEFAULT_NULL_REFERENCE)
    }
}

impl SafeRewriter {
    pub fn new(script_marker: impl Into<String>, null_reference: impl Into<String>) -> Self {
        Self {
            script_marker: script_marker.into(),
            null_reference: null_reference.into(),
        }
    }
}

impl LineRewriter for SafeRewriter {
    fn rewrite_line<'a>(&self, line: &'a str, stats: &CopyStats) -> Cow<'a, str> {
        if !self.script_marker.is_empty() && line.contains(self.script_marker.as_str()) {
            stats.record_script_line();
            return Cow::Borrowed(line);
        }

        let mut output: Option<String> = None;
        let mut copied_up_to = 0;
        let mut severed = 0;

        for block in reference_blocks(line) {
            let buffer = output.get_or_insert_with(|| String::with_capacity(line.len()));
            buffer.push_str(&line[copied_up_to..block.start]);
            buffer.push_str(&self.null_reference);
            copied_up_to = block.end;
            severed += 1;
        }

        stats.record_severed(severed);

        match output {
            Some(mut buffer) => {
                buffer.push_str(&line[copied_up_to..]);
                if buffer == line {
                    Cow::Borrowed(line)
                } else {
                    Cow::Owned(buffer)
                }
            }
            None => Cow::Borrowed(line),
        }
    }
}
