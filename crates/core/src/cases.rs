//! Case-list input: one case id per line.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Reads case ids from `path`, trimming lines and dropping blank ones.
///
/// Order and duplicates are preserved. A missing file or a list without any
/// ids is an error.
pub fn load_cases(path: &Path) -> Result<Vec<String>> {
	let content = fs::read_to_string(path).map_err(|source| Error::CaseList {
		path: path.to_path_buf(),
		source,
	})?;

	let cases = parse_cases(&content);
	if cases.is_empty() {
		return Err(Error::EmptyCaseList { path: path.to_path_buf() });
	}
	Ok(cases)
}

pub fn parse_cases(content: &str) -> Vec<String> {
	content
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.map(String::from)
		.collect()
}
