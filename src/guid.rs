use std::{borrow::Borrow, fmt, sync::Arc};

use uuid::Uuid;

/// Prefix of the field that carries an asset's own identifier in its sidecar
/// file, and of every reference field inside serialized assets.
pub const GUID_FIELD: &str = "guid:";

/// An opaque, stable identifier that the host assigns to every asset.
///
/// Identifiers are compared as plain strings. Nothing here assumes a
/// particular length or alphabet, although identifiers generated by
/// [`Guid::generate`] are always 32 lowercase hex characters.
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Clone)]
pub struct Guid(Arc<str>);

impl Guid {
    #[inline]
    pub fn new<S: AsRef<str>>(id: S) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Creates a fresh random identifier in the host's textual format.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().simple().to_string())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Guid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extracts the identifier from the top-level `guid:` line of a sidecar file.
///
/// Indented `guid:` fields belong to nested references and are ignored.
pub fn parse_sidecar_guid(contents: &str) -> Option<Guid> {
    contents.lines().find_map(|line| {
        let value = line.strip_prefix(GUID_FIELD)?.trim();
        let value = value.split_whitespace().next()?;
        Some(Guid::new(value))
    })
}

/// Replaces the identifier on the top-level `guid:` line of a sidecar file,
/// keeping every other line and all line endings intact. Appends a `guid:`
/// line if none exists.
pub fn replace_sidecar_guid(contents: &str, guid: &Guid) -> String {
    let mut output = String::with_capacity(contents.len() + 40);
    let mut replaced = false;

    for piece in contents.split_inclusive('\n') {
        let (line, ending) = split_line_ending(piece);

        if !replaced && line.starts_with(GUID_FIELD) {
            output.push_str(GUID_FIELD);
            output.push(' ');
            output.push_str(guid.as_str());
            output.push_str(ending);
            replaced = true;
        } else {
            output.push_str(piece);
        }
    }

    if !replaced {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(GUID_FIELD);
        output.push(' ');
        output.push_str(guid.as_str());
        output.push('\n');
    }

    output
}

/// Splits a piece produced by `split_inclusive('\n')` into its content and
/// its terminator (`"\r\n"`, `"\n"` or `""`).
pub(crate) fn split_line_ending(piece: &str) -> (&str, &str) {
    if let Some(line) = piece.strip_suffix("\r\n") {
        (line, "\r\n")
    } else if let Some(line) = piece.strip_suffix('\n') {
        (line, "\n")
    } else {
        (piece, "")
    }
}
