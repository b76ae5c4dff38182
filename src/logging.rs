use std::{
    io::{self, IsTerminal, Write},
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use flate2::{write::GzEncoder, Compression};
use tracing_subscriber::{
    fmt::{self, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::{cli::ColorChoice, config::Config};

/// Directory below the project that receives the file logs.
pub const LOG_DIR: &str = ".assetclone/logs";

pub struct LogGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

pub fn init_logging(
    verbosity: u8,
    color: ColorChoice,
    project_dir: Option<&Path>,
    file_log_level: Option<tracing::level_filters::LevelFilter>,
    command_name: &str,
) -> LogGuard {
    let console_filter = match verbosity {
        0 => "info",
        1 => "info,libassetclone=debug",
        2 => "info,libassetclone=trace",
        _ => "trace",
    };

    let console_env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(console_filter));

    let use_ansi = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => io::stderr().is_terminal(),
    };

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(use_ansi)
        .without_time()
        .with_target(false)
        .with_thread_names(false)
        .with_level(true)
        .with_filter(console_env_filter);

    let mut file_guard: Option<tracing_appender::non_blocking::WorkerGuard> = None;

    let file_layer = if let (Some(dir), Some(level)) = (project_dir, file_log_level) {
        let log_dir = dir.join(LOG_DIR);

        let appender = std::fs::create_dir_all(&log_dir)
            .map_err(|e| e.to_string())
            .and_then(|()| {
                compress_old_logs(&log_dir, command_name);

                tracing_appender::rolling::Builder::new()
                    .rotation(tracing_appender::rolling::Rotation::DAILY)
                    .filename_prefix(command_name)
                    .filename_suffix("log")
                    .build(&log_dir)
                    .map_err(|e| e.to_string())
            });

        match appender {
            Ok(file_appender) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                file_guard = Some(guard);

                let file_filter = EnvFilter::new(level.to_string());

                let layer = fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_timer(UtcTime::rfc_3339())
                    .with_target(true)
                    .with_thread_names(true)
                    .with_level(true)
                    .with_filter(file_filter);

                Some(layer)
            }
            Err(e) => {
                eprintln!(
                    "Warning: could not set up file logging in {}: {e}",
                    log_dir.display()
                );
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    LogGuard {
        _file_guard: file_guard,
    }
}

const SECONDS_PER_DAY: u64 = 86400;

/// Compressed logs older than this many days are deleted.
const KEEP_COMPRESSED_DAYS: u64 = 7;

fn day_number(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .map(|since| since.as_secs() / SECONDS_PER_DAY)
}

fn modified_day(entry: &std::fs::DirEntry) -> Option<u64> {
    entry
        .metadata()
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(day_number)
}

/// Gzips this command's logs from previous days and drops old archives.
/// Every failure here is ignored; logging must never stop a copy.
fn compress_old_logs(log_dir: &Path, command_name: &str) {
    let today = day_number(SystemTime::now()).unwrap_or_default();

    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if file_name.ends_with(".log.gz") {
            let age = modified_day(&entry).map_or(0, |day| today.saturating_sub(day));
            if age > KEEP_COMPRESSED_DAYS {
                let _ = std::fs::remove_file(&path);
            }
            continue;
        }

        if !file_name.ends_with(".log") || !file_name.starts_with(command_name) {
            continue;
        }

        if modified_day(&entry).unwrap_or(today) >= today {
            continue;
        }

        let Ok(input) = std::fs::read(&path) else {
            continue;
        };
        let gz_path = path.with_extension("log.gz");
        let Ok(gz_file) = std::fs::File::create(&gz_path) else {
            continue;
        };

        let mut encoder = GzEncoder::new(gz_file, Compression::default());
        if encoder.write_all(&input).is_ok() && encoder.finish().is_ok() {
            let _ = std::fs::remove_file(&path);
        } else {
            let _ = std::fs::remove_file(&gz_path);
        }
    }
}

/// Lightweight pre-read of the project configuration for `fileLogLevel`,
/// done before logging exists so that the file layer can be set up.
///
/// Returns `None` when the configuration cannot be read or the field is
/// absent (caller defaults to trace). Returns `Some(None)` for `"none"`.
pub fn quick_read_file_log_level(
    project_dir: &Path,
) -> Option<Option<tracing::level_filters::LevelFilter>> {
    let config = Config::load(project_dir).ok()?;
    if config.file_log_level.is_none() {
        return None;
    }
    config.file_log_level().ok()
}
