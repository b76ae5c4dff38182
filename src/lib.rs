//! Duplicates assets inside a project and fixes up the identifier references
//! of the copies.
//!
//! A *hard copy* duplicates folders and points every reference inside the
//! copies at the copied assets instead of the originals. A *safe copy*
//! duplicates files and cuts every reference in them.

pub mod cli;
pub mod config;
pub mod copy;
pub mod guid;
pub mod host;
pub mod logging;
pub mod rewrite;
pub mod walk;

pub use config::Config;
pub use copy::{hard_copy, safe_copy, CloneError, CopyMode, CopyOptions, CopyReport, CopySession};
pub use guid::Guid;
pub use host::{AssetHost, MetaFileHost};
