//! One interactive batch run from case list to log file.

use std::path::PathBuf;

use chrono::Local;
use colored::Colorize;
use futures_util::StreamExt;
use tracing::info;
use zaakbatch::{BatchProcessor, BatchSummary, CaseClient, HttpCaseClient, ResultLog, RunConfig, SessionStore, load_cases};

use crate::action::choose_action;
use crate::cli::Settings;
use crate::error::Result;
use crate::progress;
use crate::prompt::Prompter;
use crate::session::acquire_credentials;

/// What a finished run left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
	pub log_path: PathBuf,
	pub summary: BatchSummary,
}

/// Loads the case list, settles credentials and the action, then processes
/// every case.
///
/// Everything before the first case is configuration: any failure there
/// aborts the run without touching a case. Once the batch starts only a log
/// write failure stops it.
pub async fn run(settings: &Settings, prompter: &mut dyn Prompter) -> Result<RunReport> {
	let cases = load_cases(&settings.cases)?;
	info!(count = cases.len(), path = %settings.cases.display(), "case list loaded");

	let store = SessionStore::new(&settings.session_dir);
	let bundle = acquire_credentials(&store, settings.max_session_age, prompter)?;
	info!(base_url = bundle.base_url(), environment = %bundle.environment(), "credentials ready");

	let client = HttpCaseClient::new(bundle, settings.timeout)?;
	let action = choose_action(prompter, &client, &cases[0]).await?;
	let config = RunConfig::new(action).with_pause(settings.pause);

	process_batch(&client, &config, &cases, settings, prompter).await
}

async fn process_batch<C: CaseClient + ?Sized>(
	client: &C,
	config: &RunConfig,
	cases: &[String],
	settings: &Settings,
	prompter: &mut dyn Prompter,
) -> Result<RunReport> {
	let mut log = ResultLog::create(&settings.log_dir, Local::now().naive_local())?;
	let mut summary = BatchSummary::default();

	prompter.say(&format!("\nProcessing {} cases...", cases.len()));
	info!(action = config.action.name(), cases = cases.len(), log = %log.path().display(), "batch started");

	let outcomes = BatchProcessor::new(client, config).run(cases);
	futures_util::pin_mut!(outcomes);
	while let Some(outcome) = outcomes.next().await {
		log.append(&outcome.record)?;
		summary.record(&outcome);
		if settings.show_progress {
			progress::draw(outcome.index, outcome.total);
		}
	}

	info!(
		succeeded = summary.succeeded,
		unsatisfied = summary.unsatisfied,
		failed = summary.failed,
		"batch finished"
	);
	prompter.say(&format!(
		"\n{} Done! {} succeeded, {} not satisfied, {} failed",
		"✓".green(),
		summary.succeeded,
		summary.unsatisfied,
		summary.failed
	));
	prompter.say(&format!("Log file: {}", log.path().display()));

	Ok(RunReport {
		log_path: log.path().to_path_buf(),
		summary,
	})
}

#[cfg(test)]
mod tests {
	use std::fs;
	use std::time::Duration;

	use httpmock::prelude::*;
	use serde_json::json;
	use tempfile::TempDir;
	use zaakbatch::session::DEFAULT_MAX_AGE;

	use super::*;
	use crate::error::CliError;
	use crate::prompt::scripted::ScriptedPrompter;

	fn settings(tmp: &TempDir, cases: &str) -> Settings {
		let case_file = tmp.path().join("zaken.txt");
		fs::write(&case_file, cases).unwrap();
		Settings {
			cases: case_file,
			session_dir: tmp.path().join("sessions"),
			log_dir: tmp.path().join("logs"),
			max_session_age: DEFAULT_MAX_AGE,
			pause: Duration::ZERO,
			timeout: Some(Duration::from_secs(5)),
			show_progress: false,
		}
	}

	#[tokio::test]
	async fn reopen_run_against_server() {
		let server = MockServer::start_async().await;
		let ok = server
			.mock_async(|when, then| {
				when.method(POST)
					.path("/api/v0/case/100/update")
					.header("x-xsrf-token", "tok")
					.header("cookie", "zaaksysteem_session=sess; XSRF-TOKEN=tok")
					.json_body(json!({ "status": "open" }));
				then.status(200).json_body(json!({ "json": { "messages": [{ "message": "Zaak heropend" }] } }));
			})
			.await;
		let failing = server
			.mock_async(|when, then| {
				when.method(POST).path("/api/v0/case/101/update");
				then.status(500);
			})
			.await;

		let tmp = TempDir::new().unwrap();
		let settings = settings(&tmp, "100\n\n101\n");
		// The mock server speaks plain http, so the origin is typed in by hand.
		let mut prompter = ScriptedPrompter::new([
			"X-XSRF-TOKEN: tok".to_string(),
			"Cookie: zaaksysteem_session=sess; XSRF-TOKEN=tok".to_string(),
			String::new(),
			server.base_url(),
			"h".to_string(),
		]);

		let report = run(&settings, &mut prompter).await.unwrap();

		ok.assert_async().await;
		failing.assert_async().await;
		assert_eq!(report.summary, BatchSummary { succeeded: 1, unsatisfied: 0, failed: 1 });
		assert!(prompter.shown("Done! 1 succeeded, 0 not satisfied, 1 failed"));

		let content = fs::read_to_string(&report.log_path).unwrap();
		let lines: Vec<&str> = content.lines().collect();
		assert_eq!(lines[0], "Date\tCase\tAction\tResult");
		assert!(lines[1].ends_with("\t100\tCase reopened\tZaak heropend"));
		assert!(lines[2].contains("\t101\tCase reopened\tERROR: "));
		assert!(lines[2].contains("500"));
		assert_eq!(lines.len(), 3);

		let sessions: Vec<_> = fs::read_dir(tmp.path().join("sessions")).unwrap().collect();
		assert_eq!(sessions.len(), 1);
	}

	#[tokio::test]
	async fn attribute_check_never_posts() {
		let server = MockServer::start_async().await;
		let read = server
			.mock_async(|when, then| {
				when.method(GET).path("/api/v0/case/7");
				then.status(200)
					.json_body(json!({ "result": [{ "values": { "attribute.ztc_status": "open" } }] }));
			})
			.await;
		let writes = server
			.mock_async(|when, then| {
				when.method(POST);
				then.status(200);
			})
			.await;

		let tmp = TempDir::new().unwrap();
		let settings = settings(&tmp, "7\n7\n");
		let mut prompter = ScriptedPrompter::new([
			String::new(),
			server.base_url(),
			"tok".to_string(),
			"sess".to_string(),
			"c".to_string(),
			"ztc_status".to_string(),
			"2".to_string(),
			"open".to_string(),
		]);

		let report = run(&settings, &mut prompter).await.unwrap();

		read.assert_hits_async(2).await;
		writes.assert_hits_async(0).await;
		assert_eq!(report.summary.succeeded, 2);
		let content = fs::read_to_string(&report.log_path).unwrap();
		assert!(content.lines().skip(1).all(|l| l.ends_with("\tAttribute 'ztc_status' = 'open'\t✓ Value: open")));
	}

	#[tokio::test]
	async fn empty_case_list_aborts_before_prompting() {
		let tmp = TempDir::new().unwrap();
		let settings = settings(&tmp, "\n  \n");
		let mut prompter = ScriptedPrompter::new(Vec::<String>::new());

		let err = run(&settings, &mut prompter).await.unwrap_err();

		assert!(matches!(err, CliError::Core(zaakbatch::Error::EmptyCaseList { .. })), "got {err:?}");
		assert!(prompter.transcript.is_empty());
		assert!(!tmp.path().join("logs").exists());
	}

	#[tokio::test]
	async fn closed_input_aborts_without_log() {
		let tmp = TempDir::new().unwrap();
		let settings = settings(&tmp, "1\n");
		let mut prompter = ScriptedPrompter::new(["GET https://zaken.example.nl/"]);

		let err = run(&settings, &mut prompter).await.unwrap_err();

		assert!(matches!(err, CliError::InputClosed(_)), "got {err:?}");
		assert!(!tmp.path().join("logs").exists());
	}
}
