//! Timestamped credential records for reuse across runs.
//!
//! Each successful credential acquisition is written to its own file,
//! `sessie-<environment>-<YYYYmmdd>-<HHMMSS>.json`. Records are never
//! rewritten; a later acquisition simply produces a newer file. At startup
//! [`SessionStore::discover`] offers the newest record still inside the
//! freshness window, since server-side sessions expire after roughly an hour.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info};

use crate::credentials::CredentialBundle;
use crate::error::Result;

pub const RECORD_PREFIX: &str = "sessie";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(3600);

/// A reusable record found by [`SessionStore::discover`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSession {
	pub bundle: CredentialBundle,
	pub age_minutes: u64,
	pub path: PathBuf,
}

/// Directory of session records.
#[derive(Debug, Clone)]
pub struct SessionStore {
	dir: PathBuf,
}

impl SessionStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Returns the newest record younger than `max_age`, measured from now.
	pub fn discover(&self, max_age: Duration) -> Option<DiscoveredSession> {
		self.discover_at(Local::now().naive_local(), max_age)
	}

	/// Like [`discover`](Self::discover) with an explicit clock.
	///
	/// Malformed names, unreadable files and records that fail validation are
	/// skipped; none of them stop the scan.
	pub fn discover_at(&self, now: NaiveDateTime, max_age: Duration) -> Option<DiscoveredSession> {
		let pattern = format!(
			"{}/{RECORD_PREFIX}-*.json",
			glob::Pattern::escape(&self.dir.to_string_lossy())
		);
		let paths = match glob::glob(&pattern) {
			Ok(paths) => paths,
			Err(err) => {
				debug!(%err, "invalid session glob");
				return None;
			}
		};

		let mut candidates: Vec<((NaiveDateTime, u32), PathBuf)> = paths
			.filter_map(|entry| entry.ok())
			.filter_map(|path| {
				let stamp = record_stamp(&path);
				if stamp.is_none() {
					debug!(path = %path.display(), "skipping record with malformed name");
				}
				stamp.map(|stamp| (stamp, path))
			})
			.collect();
		candidates.sort_by(|a, b| b.0.cmp(&a.0));

		for ((stamp, _), path) in candidates {
			// Clock skew can put a record slightly in the future; treat it as brand new.
			let age = (now - stamp).to_std().unwrap_or_default();
			if age >= max_age {
				continue;
			}

			match load_record(&path) {
				Ok(bundle) => {
					return Some(DiscoveredSession {
						bundle,
						age_minutes: age.as_secs() / 60,
						path,
					});
				}
				Err(err) => {
					debug!(path = %path.display(), %err, "skipping unreadable record");
				}
			}
		}

		None
	}

	/// Writes `bundle` to a new record stamped with the current local time.
	pub fn persist(&self, bundle: &CredentialBundle) -> Result<PathBuf> {
		self.persist_at(bundle, Local::now().naive_local())
	}

	/// Writes `bundle` to a new record stamped `now`.
	///
	/// An existing record is never overwritten: a second record in the same
	/// second gets a `-<n>` suffix.
	pub fn persist_at(&self, bundle: &CredentialBundle, now: NaiveDateTime) -> Result<PathBuf> {
		fs::create_dir_all(&self.dir)?;
		let stem = format!("{RECORD_PREFIX}-{}-{}", bundle.environment(), now.format(TIMESTAMP_FORMAT));
		let contents = serde_json::to_string_pretty(bundle)?;

		let mut attempt = 0u32;
		loop {
			let name = if attempt == 0 {
				format!("{stem}.json")
			} else {
				format!("{stem}-{attempt}.json")
			};
			let path = self.dir.join(name);

			match OpenOptions::new().write(true).create_new(true).open(&path) {
				Ok(mut file) => {
					file.write_all(contents.as_bytes())?;
					restrict_permissions(&path)?;
					info!(path = %path.display(), "session record saved");
					return Ok(path);
				}
				Err(err) if err.kind() == ErrorKind::AlreadyExists => attempt += 1,
				Err(err) => return Err(err.into()),
			}
		}
	}
}

/// Parses acquisition time and collision suffix out of
/// `sessie-<env>-<date>-<time>[-n].json`.
fn record_stamp(path: &Path) -> Option<(NaiveDateTime, u32)> {
	let stem = path.file_stem()?.to_str()?;
	let parts: Vec<&str> = stem.split('-').collect();
	if parts.len() < 4 || parts[0] != RECORD_PREFIX {
		return None;
	}
	let stamp = NaiveDateTime::parse_from_str(&format!("{}-{}", parts[2], parts[3]), TIMESTAMP_FORMAT).ok()?;
	let suffix = parts.get(4).and_then(|s| s.parse().ok()).unwrap_or(0);
	Some((stamp, suffix))
}

fn load_record(path: &Path) -> Result<CredentialBundle> {
	let content = fs::read_to_string(path)?;
	Ok(serde_json::from_str(&content)?)
}

fn restrict_permissions(path: &Path) -> Result<()> {
	#[cfg(unix)]
	{
		use std::os::unix::fs::PermissionsExt;
		fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
	}
	#[cfg(not(unix))]
	let _ = path;
	Ok(())
}
