use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;

/// Help output colours in cargo's style.
fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
}

#[derive(Parser, Debug)]
#[command(name = "zaakbatch")]
#[command(about = "Apply one action (phase, case type, reopen, attribute check) to a list of zaaksysteem cases")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// File with one case id per line
	#[arg(long, visible_alias = "zaken", value_name = "FILE")]
	pub cases: PathBuf,

	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Directory holding session records
	#[arg(long, value_name = "DIR", default_value = ".")]
	pub session_dir: PathBuf,

	/// Directory the outcome log is written to
	#[arg(long, value_name = "DIR", default_value = ".")]
	pub log_dir: PathBuf,

	/// Offer saved sessions younger than this many minutes for reuse
	#[arg(long, value_name = "MINUTES", default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
	pub max_session_age: u64,

	/// Pause between cases in milliseconds
	#[arg(long, value_name = "MS", default_value_t = 50)]
	pub delay_ms: u64,

	/// HTTP timeout per request in seconds (default: none)
	#[arg(long, value_name = "SECS")]
	pub timeout_secs: Option<u64>,

	/// Do not draw the progress bar
	#[arg(long)]
	pub no_progress: bool,
}

/// Resolved run settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
	pub cases: PathBuf,
	pub session_dir: PathBuf,
	pub log_dir: PathBuf,
	pub max_session_age: Duration,
	pub pause: Duration,
	pub timeout: Option<Duration>,
	pub show_progress: bool,
}

impl From<&Cli> for Settings {
	fn from(cli: &Cli) -> Self {
		Self {
			cases: cli.cases.clone(),
			session_dir: cli.session_dir.clone(),
			log_dir: cli.log_dir.clone(),
			max_session_age: Duration::from_secs(cli.max_session_age * 60),
			pause: Duration::from_millis(cli.delay_ms),
			timeout: cli.timeout_secs.map(Duration::from_secs),
			show_progress: !cli.no_progress,
		}
	}
}
