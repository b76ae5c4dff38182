use clap::Parser;

use crate::copy::CopyMode;

use super::{CopyArgs, GlobalOptions};

/// Copies folders and points the references between the copied assets at
/// the copies.
///
/// Every selected folder is copied next to itself with the suffix appended to
/// its name. Once the copies have their own identifiers, each reference in
/// them that pointed at an asset inside a copied folder is rewritten to point
/// at that asset's copy. References to assets outside the selection are kept.
#[derive(Debug, Parser)]
pub struct HardCopyCommand {
    #[clap(flatten)]
    pub args: CopyArgs,
}

impl HardCopyCommand {
    pub fn run(self, global: GlobalOptions) -> anyhow::Result<()> {
        self.args.run(CopyMode::Hard, global)
    }
}
