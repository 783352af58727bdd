use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use crate::extract::{ErrorNote, StationRecord};
use crate::registry::Category;

/// Write one category's outputs: a timestamped CSV of records and a
/// timestamped text file of error notes, one note per line. Both files are
/// written even when empty (header-only CSV, zero-byte error file).
///
/// The timestamp is computed fresh per invocation, so two categories written
/// in the same minute get independent (if equal) stamps.
pub fn write_outputs(
    category: Category,
    records: &[StationRecord],
    notes: &[ErrorNote],
    dir: &Path,
) -> Result<(PathBuf, PathBuf)> {
    let stamp = Local::now().format("%y%m%d-%H%M");
    let csv_path = dir.join(format!("{}-{}.csv", category.name(), stamp));
    let error_path = dir.join(format!("Error-{}-{}.txt", category.name(), stamp));

    write_csv(category, records, &csv_path)
        .with_context(|| format!("writing {}", csv_path.display()))?;
    write_notes(notes, &error_path)
        .with_context(|| format!("writing {}", error_path.display()))?;

    info!(
        "{}: wrote {} records to {} and {} notes to {}",
        category,
        records.len(),
        csv_path.display(),
        notes.len(),
        error_path.display()
    );
    Ok((csv_path, error_path))
}

fn write_csv(category: Category, records: &[StationRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(category.headers())?;
    for record in records {
        writer.write_record(record.values())?;
    }
    writer.flush()?;
    Ok(())
}

fn write_notes(notes: &[ErrorNote], path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    for note in notes {
        writeln!(file, "{note}")?;
    }
    Ok(())
}
