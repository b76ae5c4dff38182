//! Defines the assetclone CLI through clap types.

mod hard_copy;
mod report;
mod safe_copy;

use std::{
    borrow::Cow,
    env,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{bail, Context};
use clap::Parser;
use memofs::Vfs;
use thiserror::Error;

use crate::{
    config::Config,
    copy::{CloneError, CopyMode, CopyReport},
    host::{AssetHost, MetaFileHost},
    rewrite::RewriteErrorPolicy,
};

pub use self::hard_copy::HardCopyCommand;
pub use self::safe_copy::SafeCopyCommand;

/// Command line options that assetclone accepts, defined using the clap crate.
#[derive(Debug, Parser)]
#[clap(name = "assetclone", version, about)]
pub struct Options {
    #[clap(flatten)]
    pub global: GlobalOptions,

    /// Subcommand to run in this invocation.
    #[clap(subcommand)]
    pub subcommand: Subcommand,
}

impl Options {
    pub fn run(self) -> anyhow::Result<()> {
        match self.subcommand {
            Subcommand::HardCopy(subcommand) => subcommand.run(self.global),
            Subcommand::SafeCopy(subcommand) => subcommand.run(self.global),
        }
    }
}

#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Sets verbosity level. Can be specified multiple times.
    #[clap(long("verbose"), short, global(true), action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Set color behavior. Valid values are auto, always, and never.
    #[clap(long("color"), global(true), default_value("auto"))]
    pub color: ColorChoice,
}

#[derive(Debug, Clone, Copy)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl FromStr for ColorChoice {
    type Err = ColorChoiceParseError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        match source {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(ColorChoiceParseError {
                attempted: source.to_owned(),
            }),
        }
    }
}

impl From<ColorChoice> for termcolor::ColorChoice {
    fn from(value: ColorChoice) -> Self {
        match value {
            ColorChoice::Auto => termcolor::ColorChoice::Auto,
            ColorChoice::Always => termcolor::ColorChoice::Always,
            ColorChoice::Never => termcolor::ColorChoice::Never,
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid color choice '{attempted}'. Valid values are: auto, always, never")]
pub struct ColorChoiceParseError {
    attempted: String,
}

#[derive(Debug, Parser)]
pub enum Subcommand {
    HardCopy(HardCopyCommand),
    SafeCopy(SafeCopyCommand),
}

impl Subcommand {
    pub fn project_path(&self) -> Option<&Path> {
        match self {
            Subcommand::HardCopy(cmd) => Some(&cmd.args.project),
            Subcommand::SafeCopy(cmd) => Some(&cmd.args.project),
        }
    }

    pub fn command_name(&self) -> &'static str {
        match self {
            Subcommand::HardCopy(_) => "hard-copy",
            Subcommand::SafeCopy(_) => "safe-copy",
        }
    }
}

/// Arguments shared by both copy commands.
#[derive(Debug, Parser)]
pub struct CopyArgs {
    /// Items to copy. Copying nothing is allowed and does nothing.
    pub paths: Vec<PathBuf>,

    /// Path to the project the items belong to.
    #[clap(long, default_value = ".")]
    pub project: PathBuf,

    /// Text inserted into the name of every copy. Overrides the project's
    /// configuration.
    #[clap(long)]
    pub suffix: Option<String>,

    /// Keep rewriting the remaining files when one of them fails.
    #[clap(long)]
    pub keep_going: bool,

    /// If provided, every file that was looked at is listed on stdout.
    #[clap(long, short = 'l')]
    pub list: bool,
}

impl CopyArgs {
    fn run(&self, mode: CopyMode, global: GlobalOptions) -> anyhow::Result<()> {
        let project_dir = resolve_project_dir(&self.project);

        let mut config = Config::load(&project_dir)?;
        if let Some(suffix) = &self.suffix {
            config.suffix = suffix.clone();
            config.validate()?;
        }
        if self.keep_going {
            config.on_rewrite_error = RewriteErrorPolicy::Continue;
        }

        let vfs = Vfs::new_default();

        // Relative selections are resolved against the project, not the
        // working directory.
        let mut host = MetaFileHost::new(&vfs, &project_dir, &config.asset_dir, config.filter())
            .with_context(|| format!("Could not open project {}", project_dir.display()))?
            .with_selection(self.paths.iter().cloned());

        check_selection(&host, mode)?;

        let options = config.copy_options();
        let result = match mode {
            CopyMode::Hard => crate::copy::hard_copy(&vfs, &mut host, &options),
            CopyMode::Safe => crate::copy::safe_copy(&vfs, &mut host, &options),
        };

        let report = match result {
            Ok(report) => report,
            Err(err) => {
                report_copied(&err);
                return Err(err.into());
            }
        };

        report::print_report(&report, global.color.into(), self.list, host.project_dir())?;
        ensure_success(&report)
    }
}

/// Lists the copies a failed run left behind.
fn report_copied(err: &CloneError) {
    for pair in err.copied() {
        log::warn!(
            "{} was copied to {} before the failure",
            pair.source.display(),
            pair.destination.display()
        );
    }
}

/// Hard copies only take folders and safe copies only take files.
fn check_selection(host: &MetaFileHost<'_>, mode: CopyMode) -> anyhow::Result<()> {
    for path in host.resolve_selection().context("Could not resolve the selection")? {
        let is_dir = host.is_directory(&path)?;

        match mode {
            CopyMode::Hard if !is_dir => bail!(
                "hard-copy only copies folders, but {} is a file",
                path.display()
            ),
            CopyMode::Safe if is_dir => bail!(
                "safe-copy only copies files, but {} is a folder",
                path.display()
            ),
            _ => {}
        }
    }

    Ok(())
}

fn ensure_success(report: &CopyReport) -> anyhow::Result<()> {
    if report.is_success() {
        return Ok(());
    }

    if report.aborted {
        bail!(
            "Stopped rewriting after {} failure(s). Rerun with --keep-going to rewrite the remaining files.",
            report.failures.len()
        );
    }

    bail!("{} file(s) could not be rewritten", report.failures.len())
}

pub fn resolve_path(path: &Path) -> Cow<'_, Path> {
    if path.is_absolute() {
        Cow::Borrowed(path)
    } else {
        match env::current_dir() {
            Ok(current_dir) => Cow::Owned(current_dir.join(path)),
            Err(_) => Cow::Borrowed(path),
        }
    }
}

/// Resolves a project path (which may point to the config file) to the
/// project directory.
pub fn resolve_project_dir(project_path: &Path) -> PathBuf {
    let resolved = resolve_path(project_path);
    let resolved = resolved.as_ref();

    if resolved.is_file() {
        resolved
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| resolved.to_path_buf())
    } else if resolved.as_os_str().is_empty() {
        env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        resolved.to_path_buf()
    }
}
