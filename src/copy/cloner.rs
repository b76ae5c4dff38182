//! Performs the physical copies.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::host::AssetHost;

use super::collect::{CopyPair, CopyPlan};

/// A copy failed. Pairs after the failing one were not attempted.
#[derive(Debug, Error)]
#[error("failed to copy {} to {}", .from.display(), .to.display())]
pub struct CopyError {
    pub from: PathBuf,
    pub to: PathBuf,
    /// Pairs that were copied before the failure.
    pub completed: Vec<CopyPair>,
    #[source]
    pub source: io::Error,
}

/// Copies every pair in `plan` through the host, in order.
///
/// The host is not committed when a copy fails, so no identifiers get
/// assigned to a partial result.
pub fn clone_assets<H: AssetHost + ?Sized>(
    host: &mut H,
    plan: &CopyPlan,
) -> Result<Vec<CopyPair>, CopyError> {
    let mut completed = Vec::with_capacity(plan.len());

    for pair in plan.pairs() {
        if let Err(source) = host.copy(&pair.source, &pair.destination) {
            log::error!(
                "Copy of {} failed after {} successful copies",
                pair.source.display(),
                completed.len()
            );
            return Err(CopyError {
                from: pair.source.clone(),
                to: pair.destination.clone(),
                completed,
                source,
            });
        }

        log::info!(
            "Copied {} to {}",
            pair.source.display(),
            pair.destination.display()
        );
        completed.push(pair.clone());
    }

    Ok(completed)
}
