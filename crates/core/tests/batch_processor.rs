//! Batch engine behaviour against a scripted in-memory case API.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::time::Duration;

use chrono::Local;
use futures_util::StreamExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use zaakbatch::{
	ActionSpec, AttributeCheck, BatchProcessor, BatchSummary, BoxFut, CaseClient, CaseOutcome, Error, FieldValues,
	OutcomeStatus, ResultLog, RunConfig, TargetPhase,
};

/// Replays canned responses and records every call.
#[derive(Default)]
struct ScriptedClient {
	values: HashMap<String, FieldValues>,
	post_bodies: HashMap<String, String>,
	unreachable: Vec<String>,
	calls: RefCell<Vec<String>>,
}

impl ScriptedClient {
	fn with_values(mut self, case_id: &str, values: Value) -> Self {
		let Value::Object(map) = values else { panic!("values must be an object") };
		self.values.insert(case_id.to_string(), map);
		self
	}

	fn with_post(mut self, endpoint: &str, body: &str) -> Self {
		self.post_bodies.insert(endpoint.to_string(), body.to_string());
		self
	}

	fn unreachable(mut self, endpoint: &str) -> Self {
		self.unreachable.push(endpoint.to_string());
		self
	}

	fn calls(&self) -> Vec<String> {
		self.calls.borrow().clone()
	}

	fn refused() -> Error {
		Error::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"))
	}
}

impl CaseClient for ScriptedClient {
	fn case_values<'a>(&'a self, case_id: &'a str) -> BoxFut<'a, zaakbatch::Result<FieldValues>> {
		Box::pin(async move {
			self.calls.borrow_mut().push(format!("GET {case_id}"));
			self.values.get(case_id).cloned().ok_or_else(Self::refused)
		})
	}

	fn post_json<'a>(&'a self, endpoint: &'a str, _payload: &'a Value) -> BoxFut<'a, zaakbatch::Result<String>> {
		Box::pin(async move {
			self.calls.borrow_mut().push(format!("POST {endpoint}"));
			if self.unreachable.iter().any(|e| e == endpoint) {
				return Err(Self::refused());
			}
			Ok(self.post_bodies.get(endpoint).cloned().unwrap_or_default())
		})
	}
}

fn config(action: ActionSpec) -> RunConfig {
	RunConfig::new(action).with_pause(Duration::ZERO)
}

fn cases(ids: &[&str]) -> Vec<String> {
	ids.iter().map(|id| id.to_string()).collect()
}

async fn run_all(client: &ScriptedClient, config: &RunConfig, cases: &[String]) -> Vec<CaseOutcome> {
	BatchProcessor::new(client, config).run(cases).collect().await
}

#[tokio::test]
async fn yields_one_outcome_per_case_in_input_order() {
	let client = ScriptedClient::default()
		.with_post("/zaak/1/update/set_settings", r#"{"json":{"messages":[{"message":"Fase gewijzigd"}]}}"#)
		.unreachable("/zaak/3/update/set_settings");
	let config = config(ActionSpec::PhaseChange {
		target_phase: TargetPhase::new(3).unwrap(),
	});
	let cases = cases(&["1", "x", "3", "1"]);

	let outcomes = run_all(&client, &config, &cases).await;

	assert_eq!(outcomes.len(), 4);
	let ids: Vec<&str> = outcomes.iter().map(|o| o.record.case_id.as_str()).collect();
	assert_eq!(ids, ["1", "x", "3", "1"]);
	let positions: Vec<(usize, usize)> = outcomes.iter().map(|o| (o.index, o.total)).collect();
	assert_eq!(positions, [(1, 4), (2, 4), (3, 4), (4, 4)]);

	assert_eq!(outcomes[0].record.result, "Fase gewijzigd");
	assert_eq!(outcomes[0].status, OutcomeStatus::Succeeded);
	assert_eq!(outcomes[1].status, OutcomeStatus::Failed);
	assert!(outcomes[1].record.result.starts_with("ERROR: "));
	assert!(outcomes[1].record.result.contains("\"x\""));
	assert_eq!(outcomes[2].status, OutcomeStatus::Failed);
	assert!(outcomes[2].record.result.contains("connection refused"));
	assert_eq!(outcomes[3].status, OutcomeStatus::Succeeded);
	assert!(outcomes.iter().all(|o| o.record.description == "Phase changed to phase 3"));

	// The malformed id never reaches the wire.
	assert_eq!(
		client.calls(),
		[
			"POST /zaak/1/update/set_settings",
			"POST /zaak/3/update/set_settings",
			"POST /zaak/1/update/set_settings",
		]
	);
}

#[tokio::test]
async fn every_case_failing_still_yields_every_outcome() {
	let client = ScriptedClient::default()
		.unreachable("/api/v0/case/1/update")
		.unreachable("/api/v0/case/2/update");
	let config = config(ActionSpec::Reopen);
	let cases = cases(&["1", "2"]);

	let outcomes = run_all(&client, &config, &cases).await;

	assert_eq!(outcomes.len(), 2);
	assert!(outcomes.iter().all(|o| o.status == OutcomeStatus::Failed));
}

#[tokio::test]
async fn reopen_run_writes_log_despite_one_failure() {
	let tmp = TempDir::new().unwrap();
	let client = ScriptedClient::default()
		.with_post("/api/v0/case/100/update", "{}")
		.unreachable("/api/v0/case/101/update");
	let config = config(ActionSpec::Reopen);
	let cases = cases(&["100", "101"]);

	let mut log = ResultLog::create(tmp.path(), Local::now().naive_local()).unwrap();
	let mut summary = BatchSummary::default();
	let outcomes = BatchProcessor::new(&client, &config).run(&cases);
	futures_util::pin_mut!(outcomes);
	while let Some(outcome) = outcomes.next().await {
		log.append(&outcome.record).unwrap();
		summary.record(&outcome);
	}

	assert_eq!(summary.succeeded, 1);
	assert_eq!(summary.failed, 1);

	let content = fs::read_to_string(log.path()).unwrap();
	let rows: Vec<Vec<&str>> = content.lines().skip(1).map(|l| l.split('\t').collect()).collect();
	assert_eq!(rows.len(), 2);
	assert_eq!(rows[0][1..], ["100", "Case reopened", "OK"]);
	assert_eq!(rows[1][1], "101");
	assert!(rows[1][3].starts_with("ERROR: "));
	assert!(rows[1][3].contains("connection refused"));
}

#[tokio::test]
async fn attribute_check_only_reads() {
	let client = ScriptedClient::default()
		.with_values("1", json!({ "attribute.ztc_status": "5" }))
		.with_values("2", json!({ "attribute.ztc_status": 5 }))
		.with_values("3", json!({ "attribute.ztc_status": null }))
		.with_values("4", json!({ "attribute.ztc_status": "6" }));
	let config = config(ActionSpec::AttributeCheck(AttributeCheck::equals("ztc_status", "5")));
	let cases = cases(&["1", "2", "3", "4", "5"]);

	let outcomes = run_all(&client, &config, &cases).await;

	let results: Vec<(&str, OutcomeStatus)> = outcomes.iter().map(|o| (o.record.result.as_str(), o.status)).collect();
	assert_eq!(results[0], ("✓ Value: 5", OutcomeStatus::Succeeded));
	assert_eq!(results[1], ("✓ Value: 5", OutcomeStatus::Succeeded));
	assert_eq!(results[2], ("✗ Empty/Null", OutcomeStatus::Unsatisfied));
	assert_eq!(results[3], ("✗ Value: 6", OutcomeStatus::Unsatisfied));
	assert_eq!(results[4].1, OutcomeStatus::Failed);
	assert!(outcomes.iter().all(|o| o.record.description == "Attribute 'ztc_status' = '5'"));
	assert!(client.calls().iter().all(|call| call.starts_with("GET ")));
}

#[tokio::test]
async fn repeated_attribute_checks_are_identical() {
	let client = ScriptedClient::default().with_values("9", json!({ "attribute.ztc_zkn_resultaat": "toegekend" }));
	let config = config(ActionSpec::AttributeCheck(AttributeCheck::has_value("ztc_zkn_resultaat")));
	let cases = cases(&["9"]);

	let first = run_all(&client, &config, &cases).await;
	let second = run_all(&client, &config, &cases).await;

	let strip = |o: &CaseOutcome| (o.record.case_id.clone(), o.record.description.clone(), o.record.result.clone(), o.status);
	assert_eq!(first.iter().map(strip).collect::<Vec<_>>(), second.iter().map(strip).collect::<Vec<_>>());
	assert_eq!(first[0].record.result, "✓ Value: toegekend");
}

#[tokio::test]
async fn stream_is_lazy_and_rerun_reattempts() {
	let client = ScriptedClient::default().with_post("/api/v0/case/1/update", "");
	let config = config(ActionSpec::Reopen);
	let cases = cases(&["1"]);

	let pending = BatchProcessor::new(&client, &config).run(&cases);
	assert!(client.calls().is_empty());
	drop(pending);

	run_all(&client, &config, &cases).await;
	run_all(&client, &config, &cases).await;
	assert_eq!(client.calls().len(), 2);
}

#[tokio::test]
async fn empty_case_list_yields_nothing() {
	let client = ScriptedClient::default();
	let config = config(ActionSpec::Reopen);

	assert!(run_all(&client, &config, &[]).await.is_empty());
}
