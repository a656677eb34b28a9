//! Sequential batch dispatch with per-case fault isolation.
//!
//! [`BatchProcessor::run`] turns a case list into a lazy stream of
//! [`CaseOutcome`]s, one per input case, in input order. Anything that goes
//! wrong for a single case (bad id, transport error, error status, missing
//! fields) ends up as that case's result text; the stream always yields exactly
//! as many items as there are cases.

use std::error::Error as StdError;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use futures_util::stream::{self, Stream};
use serde_json::Value;
use tracing::{debug, warn};

use crate::action::{ActionSpec, value_text};
use crate::client::CaseClient;
use crate::error::Result;

/// Pause between consecutive cases, bounding the request rate.
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(50);

/// Result text when a mutation succeeded without a server message.
pub const SUCCESS_MARKER: &str = "OK";

/// Immutable configuration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
	pub action: ActionSpec,
	pub pause: Duration,
}

impl RunConfig {
	pub fn new(action: ActionSpec) -> Self {
		Self {
			action,
			pause: DEFAULT_PAUSE,
		}
	}

	pub fn with_pause(mut self, pause: Duration) -> Self {
		self.pause = pause;
		self
	}
}

/// Durable row for one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
	pub timestamp: NaiveDateTime,
	pub case_id: String,
	pub description: String,
	pub result: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
	/// Mutation accepted, or attribute check satisfied.
	Succeeded,
	/// Attribute check ran but the case did not satisfy it.
	Unsatisfied,
	/// The case faulted; the result holds the fault text.
	Failed,
}

/// One stream item: the record plus progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseOutcome {
	/// 1-based position in the case list.
	pub index: usize,
	pub total: usize,
	pub status: OutcomeStatus,
	pub record: OutcomeRecord,
}

/// Tally of a finished (or interrupted) run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
	pub succeeded: usize,
	pub unsatisfied: usize,
	pub failed: usize,
}

impl BatchSummary {
	pub fn record(&mut self, outcome: &CaseOutcome) {
		match outcome.status {
			OutcomeStatus::Succeeded => self.succeeded += 1,
			OutcomeStatus::Unsatisfied => self.unsatisfied += 1,
			OutcomeStatus::Failed => self.failed += 1,
		}
	}

	pub fn total(&self) -> usize {
		self.succeeded + self.unsatisfied + self.failed
	}
}

/// Runs one [`RunConfig`] over a case list through a [`CaseClient`].
pub struct BatchProcessor<'a, C: ?Sized> {
	client: &'a C,
	config: &'a RunConfig,
}

impl<'a, C: CaseClient + ?Sized> BatchProcessor<'a, C> {
	pub fn new(client: &'a C, config: &'a RunConfig) -> Self {
		Self { client, config }
	}

	/// Processes `cases` strictly one after another.
	///
	/// Nothing happens until the stream is polled. The stream is not
	/// restartable; calling `run` again re-attempts every case.
	pub fn run(self, cases: &'a [String]) -> impl Stream<Item = CaseOutcome> + 'a {
		let Self { client, config } = self;
		let total = cases.len();
		let description = config.action.description();

		stream::unfold(0usize, move |position| {
			let description = description.clone();
			async move {
				let case_id = cases.get(position)?;
				if position > 0 && !config.pause.is_zero() {
					tokio::time::sleep(config.pause).await;
				}

				debug!(case_id = %case_id, index = position + 1, total, "processing case");
				let (status, result) = process_case(client, &config.action, case_id).await;

				let outcome = CaseOutcome {
					index: position + 1,
					total,
					status,
					record: OutcomeRecord {
						timestamp: Local::now().naive_local(),
						case_id: case_id.clone(),
						description,
						result,
					},
				};
				Some((outcome, position + 1))
			}
		})
	}
}

/// Runs one case; faults never escape.
async fn process_case<C: CaseClient + ?Sized>(client: &C, action: &ActionSpec, case_id: &str) -> (OutcomeStatus, String) {
	match execute(client, action, case_id).await {
		Ok(outcome) => outcome,
		Err(err) => {
			let text = fault_text(&err);
			warn!(case_id = %case_id, error = %text, "case failed");
			(OutcomeStatus::Failed, format!("ERROR: {text}"))
		}
	}
}

async fn execute<C: CaseClient + ?Sized>(client: &C, action: &ActionSpec, case_id: &str) -> Result<(OutcomeStatus, String)> {
	if let ActionSpec::AttributeCheck(check) = action {
		let verdict = check.check(client, case_id).await?;
		let status = if verdict.satisfied {
			OutcomeStatus::Succeeded
		} else {
			OutcomeStatus::Unsatisfied
		};
		return Ok((status, verdict.describe()));
	}

	let request = action.build(case_id)?;
	let body = client.post_json(&request.endpoint, &request.payload).await?;
	Ok((OutcomeStatus::Succeeded, response_message(&body)))
}

/// First `json.messages[].message` of a response body, or [`SUCCESS_MARKER`].
///
/// The response was received, so an unparseable body still counts as success.
pub fn response_message(body: &str) -> String {
	let Ok(parsed) = serde_json::from_str::<Value>(body) else {
		return SUCCESS_MARKER.to_string();
	};

	match parsed.pointer("/json/messages/0/message") {
		Some(Value::Null) | None => SUCCESS_MARKER.to_string(),
		Some(message) => value_text(message),
	}
}

/// Error message followed by its source chain, `: `-separated.
fn fault_text(err: &(dyn StdError + 'static)) -> String {
	let mut text = err.to_string();
	let mut source = err.source();
	while let Some(cause) = source {
		let cause_text = cause.to_string();
		if !text.contains(&cause_text) {
			text.push_str(": ");
			text.push_str(&cause_text);
		}
		source = cause.source();
	}
	text
}
