//! Operator interaction: questions on stdout, answers from stdin.

use std::io::{self, BufRead, Write};

use crate::error::{CliError, Result};

/// Line-based conversation with the operator.
pub trait Prompter {
	/// Shows `question` and returns the answer without its line ending.
	fn ask(&mut self, question: &str) -> Result<String>;

	/// Shows an informational line.
	fn say(&mut self, message: &str);
}

/// [`Prompter`] on the process terminal.
pub struct TerminalPrompter<R> {
	input: R,
}

impl TerminalPrompter<io::StdinLock<'static>> {
	pub fn stdin() -> Self {
		Self { input: io::stdin().lock() }
	}
}

impl<R: BufRead> TerminalPrompter<R> {
	pub fn new(input: R) -> Self {
		Self { input }
	}
}

impl<R: BufRead> Prompter for TerminalPrompter<R> {
	fn ask(&mut self, question: &str) -> Result<String> {
		let mut stdout = io::stdout().lock();
		write!(stdout, "{question}")?;
		stdout.flush()?;

		let mut line = String::new();
		if self.input.read_line(&mut line)? == 0 {
			return Err(CliError::InputClosed(question.trim().trim_end_matches(':').to_string()));
		}
		Ok(line.trim_end_matches(['\r', '\n']).to_string())
	}

	fn say(&mut self, message: &str) {
		println!("{message}");
	}
}

/// Asks a yes/no question; `j`, `ja`, `y` and `yes` count as yes.
pub fn confirm(prompter: &mut dyn Prompter, question: &str) -> Result<bool> {
	let answer = prompter.ask(question)?;
	Ok(matches!(answer.trim().to_lowercase().as_str(), "j" | "ja" | "y" | "yes"))
}

/// Reads lines until the first blank one and joins them with newlines.
pub fn read_block(prompter: &mut dyn Prompter) -> Result<String> {
	let mut lines = Vec::new();
	loop {
		let line = prompter.ask("")?;
		if line.trim().is_empty() {
			break;
		}
		lines.push(line);
	}
	Ok(lines.join("\n"))
}
