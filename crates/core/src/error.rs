use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// One or more credential fields are empty.
	#[error("incomplete credentials: {missing} is empty")]
	InvalidCredentials { missing: &'static str },

	#[error("invalid base URL {url:?}: {reason}")]
	InvalidBaseUrl { url: String, reason: String },

	#[error("phase must be at least 1, got {0}")]
	InvalidPhase(String),

	#[error("case type id must be a positive integer, got {0:?}")]
	InvalidCaseTypeId(String),

	#[error("case id {0:?} is not numeric")]
	InvalidCaseId(String),

	/// Attribute checks are reads; asking them for a wire request is a caller bug.
	#[error("action `{0}` does not issue a mutating request")]
	NotAMutation(&'static str),

	#[error("case list {} contains no case ids", path.display())]
	EmptyCaseList { path: PathBuf },

	#[error("failed to read case list {}", path.display())]
	CaseList {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("unexpected response from {endpoint}: {reason}")]
	UnexpectedResponse { endpoint: String, reason: String },

	#[error(transparent)]
	Http(#[from] reqwest::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
