//! Append-only outcome log, one tab-separated row per case.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::batch::OutcomeRecord;
use crate::error::Result;

pub const LOG_PREFIX: &str = "zaak-update";
pub const HEADER: &str = "Date\tCase\tAction\tResult";
const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome log of a single run, named after the run's start time.
///
/// Every [`append`](Self::append) is flushed immediately so rows written
/// before an interrupt survive it.
#[derive(Debug)]
pub struct ResultLog {
	path: PathBuf,
	file: File,
	rows: usize,
}

impl ResultLog {
	/// Creates `<dir>/zaak-update-<YYYYmmdd-HHMMSS>.log` and writes the header.
	pub fn create(dir: &Path, started_at: NaiveDateTime) -> Result<Self> {
		fs::create_dir_all(dir)?;
		let path = dir.join(format!("{LOG_PREFIX}-{}.log", started_at.format(FILE_TIMESTAMP_FORMAT)));
		fs::write(&path, format!("{HEADER}\n"))?;
		let file = OpenOptions::new().append(true).open(&path)?;
		Ok(Self { path, file, rows: 0 })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Rows written so far, header excluded.
	pub fn rows(&self) -> usize {
		self.rows
	}

	pub fn append(&mut self, record: &OutcomeRecord) -> Result<()> {
		let row = format!(
			"{}\t{}\t{}\t{}\n",
			record.timestamp.format(ROW_TIMESTAMP_FORMAT),
			single_line(&record.case_id),
			single_line(&record.description),
			single_line(&record.result),
		);
		self.file.write_all(row.as_bytes())?;
		self.file.flush()?;
		self.rows += 1;
		Ok(())
	}
}

/// Keeps a field inside its column: tabs and line breaks become spaces.
fn single_line(field: &str) -> String {
	field.replace(['\t', '\r', '\n'], " ")
}
