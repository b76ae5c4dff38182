use clap::Parser;

use crate::copy::CopyMode;

use super::{CopyArgs, GlobalOptions};

/// Copies files and cuts every reference inside the copies.
///
/// Each reference block in a copy is replaced with a null reference so the
/// copy cannot accidentally stay linked to the original's dependencies.
/// Lines that bind a script are kept as they are.
#[derive(Debug, Parser)]
pub struct SafeCopyCommand {
    #[clap(flatten)]
    pub args: CopyArgs,
}

impl SafeCopyCommand {
    pub fn run(self, global: GlobalOptions) -> anyhow::Result<()> {
        self.args.run(CopyMode::Safe, global)
    }
}
