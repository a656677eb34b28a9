use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	/// Stdin closed while a prompt still needed an answer.
	#[error("input closed while waiting for {0}")]
	InputClosed(String),

	#[error(transparent)]
	Core(#[from] zaakbatch::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}
