//! Single-line progress bar on stderr.

use std::io::{self, Write};

const BAR_WIDTH: usize = 40;

/// `[#####-----] i/n` for case `index` (1-based) of `total`.
pub fn render_bar(index: usize, total: usize, width: usize) -> String {
	let filled = if total == 0 { width } else { width * index.min(total) / total };
	format!("[{}{}] {index}/{total}", "#".repeat(filled), "-".repeat(width - filled))
}

/// Redraws the bar in place; a newline follows the last case.
pub fn draw(index: usize, total: usize) {
	let mut stderr = io::stderr().lock();
	let _ = write!(stderr, "\r{}", render_bar(index, total, BAR_WIDTH));
	if index >= total {
		let _ = writeln!(stderr);
	}
	let _ = stderr.flush();
}
