use std::{env, panic, path::PathBuf, process};

use backtrace::Backtrace;
use clap::Parser;

use libassetclone::cli::{resolve_project_dir, Options};
use libassetclone::logging;

/// What the crash notice knows about the run that crashed.
struct CrashContext {
    command_name: &'static str,
    project_dir: Option<PathBuf>,
    file_log: bool,
}

fn install_panic_hook(context: CrashContext) {
    panic::set_hook(Box::new(move |panic_info| {
        let message = match panic_info.payload().downcast_ref::<&str>() {
            Some(&message) => message.to_string(),
            None => match panic_info.payload().downcast_ref::<String>() {
                Some(message) => message.clone(),
                None => "<no message>".to_string(),
            },
        };

        log::error!(
            "assetclone {} crashed during {}.",
            env!("CARGO_PKG_VERSION"),
            context.command_name
        );
        log::error!("This is probably an assetclone bug.");

        if let Some(project_dir) = &context.project_dir {
            log::error!(
                "Copies made in {} before the crash stay on disk and may still share identifiers or references with their originals.",
                project_dir.display()
            );

            if context.file_log {
                log::error!(
                    "The full log of this run is in {}.",
                    project_dir.join(logging::LOG_DIR).display()
                );
            }
        }

        log::error!("");
        log::error!("Details: {}", message);

        if let Some(location) = panic_info.location() {
            log::error!("in file {} on line {}", location.file(), location.line());
        }

        let should_backtrace = env::var("RUST_BACKTRACE")
            .map(|var| var == "1")
            .unwrap_or(false);

        if should_backtrace {
            eprintln!("{:?}", Backtrace::new());
        } else {
            eprintln!(
                "note: run with `RUST_BACKTRACE=1` environment variable to display a backtrace."
            );
        }

        process::exit(1);
    }));
}

fn main() {
    let options = Options::parse();

    let project_dir = options.subcommand.project_path().map(resolve_project_dir);

    let file_log_level = if env::var("ASSETCLONE_NO_FILE_LOG").is_ok() {
        None
    } else {
        project_dir
            .as_deref()
            .and_then(logging::quick_read_file_log_level)
            .unwrap_or(Some(tracing::level_filters::LevelFilter::TRACE))
    };

    install_panic_hook(CrashContext {
        command_name: options.subcommand.command_name(),
        project_dir: project_dir.clone(),
        file_log: file_log_level.is_some(),
    });

    let command_name = format!("assetclone-{}", options.subcommand.command_name());

    let _log_guard = logging::init_logging(
        options.global.verbosity,
        options.global.color,
        project_dir.as_deref(),
        file_log_level,
        &command_name,
    );

    if let Err(err) = options.run() {
        log::error!("{:?}", err);
        process::exit(1);
    }
}
