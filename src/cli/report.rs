use std::{
    io::{self, Write as _},
    path::Path,
};

use termcolor::{Buffer, BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

use crate::copy::{CopyMode, CopyReport};

fn relative<'a>(path: &'a Path, base: &Path) -> std::path::Display<'a> {
    path.strip_prefix(base).unwrap_or(path).display()
}

/// Prints what a copy run did to stdout. Individual files are only listed
/// when `list` is set; failures are always printed.
pub fn print_report(
    report: &CopyReport,
    color: ColorChoice,
    list: bool,
    base_path: &Path,
) -> io::Result<()> {
    let writer = BufferWriter::stdout(color);
    let mut buffer = writer.buffer();
    write_report(&mut buffer, report, list, base_path)?;
    writer.print(&buffer)
}

fn write_report(
    buffer: &mut Buffer,
    report: &CopyReport,
    list: bool,
    base_path: &Path,
) -> io::Result<()> {
    let no_color = ColorSpec::new();
    let mut written_color = ColorSpec::new();
    written_color.set_fg(Some(Color::Green));
    let mut skipped_color = ColorSpec::new();
    skipped_color.set_fg(Some(Color::Yellow));
    let mut failed_color = ColorSpec::new();
    failed_color.set_fg(Some(Color::Red));

    if report.is_empty() {
        writeln!(buffer, "Nothing to copy")?;
        return Ok(());
    }

    buffer.set_color(&written_color)?;
    for pair in &report.copied {
        writeln!(
            buffer,
            "Copied {} to {}",
            relative(&pair.source, base_path),
            relative(&pair.destination, base_path)
        )?;
    }

    if list {
        if report.mode == CopyMode::Hard {
            buffer.set_color(&no_color)?;
            for entry in report.mapping.iter() {
                writeln!(
                    buffer,
                    "Mapped {}: {} -> {}",
                    relative(&entry.key, base_path),
                    entry.source,
                    entry.destination
                )?;
            }
        }

        buffer.set_color(&written_color)?;
        for path in &report.rewritten {
            writeln!(buffer, "Rewrote {}", relative(path, base_path))?;
        }

        buffer.set_color(&no_color)?;
        for path in &report.unchanged {
            writeln!(buffer, "Unchanged {}", relative(path, base_path))?;
        }

        buffer.set_color(&skipped_color)?;
        for path in &report.skipped {
            writeln!(buffer, "Skipped {} (not text)", relative(path, base_path))?;
        }
    }

    buffer.set_color(&failed_color)?;
    for failure in &report.failures {
        writeln!(
            buffer,
            "Failed {}: {}",
            relative(&failure.path, base_path),
            failure.source
        )?;
    }

    buffer.set_color(&no_color)?;
    writeln!(
        buffer,
        "Finished {}: {} rewritten, {} unchanged, {} skipped, {} failed",
        report.mode,
        report.rewritten.len(),
        report.unchanged.len(),
        report.skipped.len(),
        report.failures.len()
    )?;

    Ok(())
}
