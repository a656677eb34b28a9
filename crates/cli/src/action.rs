//! Interactive action selection, probing the first case for context.

use colored::Colorize;
use serde_json::Value;
use tracing::debug;
use zaakbatch::action::value_text;
use zaakbatch::{ActionSpec, AttributeCheck, CaseClient, CaseTypeId, FieldValues, TargetPhase};

use crate::error::Result;
use crate::prompt::{Prompter, confirm};

const ACTION_QUESTION: &str = "What do you want to do? (f) phase, (u) update case type, (h) reopen, (c) check attribute: ";

/// Asks which action to run and its parameters.
///
/// `first_case` is only read, to show the current phase or case type before
/// the operator commits to a value.
pub async fn choose_action<C: CaseClient + ?Sized>(prompter: &mut dyn Prompter, client: &C, first_case: &str) -> Result<ActionSpec> {
	let action = loop {
		let answer = prompter.ask(ACTION_QUESTION)?;
		match answer.trim().to_lowercase().as_str() {
			"f" | "phase" => break choose_phase(prompter, client, first_case).await?,
			"u" | "update-type" => break choose_case_type(prompter, client, first_case).await?,
			"h" | "reopen" => break ActionSpec::Reopen,
			"c" | "check-attribute" => break choose_check(prompter)?,
			_ => {}
		}
	};

	prompter.say(&format!("\n{} Action: {}", "✓".green(), action.description()));
	Ok(action)
}

/// First-case values, or `None` after telling the operator the probe failed.
async fn probe<C: CaseClient + ?Sized>(prompter: &mut dyn Prompter, client: &C, case_id: &str) -> Option<FieldValues> {
	match client.case_values(case_id).await {
		Ok(values) => Some(values),
		Err(err) => {
			debug!(case_id = %case_id, %err, "probe failed");
			prompter.say(&format!("{} Could not fetch case {case_id}: {err}", "✗".red()));
			None
		}
	}
}

fn shown(values: &FieldValues, key: &str) -> Option<String> {
	match values.get(key) {
		None | Some(Value::Null) => None,
		Some(value) => Some(value_text(value)),
	}
}

async fn choose_phase<C: CaseClient + ?Sized>(prompter: &mut dyn Prompter, client: &C, first_case: &str) -> Result<ActionSpec> {
	if let Some(values) = probe(prompter, client, first_case).await {
		prompter.say(&format!("\nCURRENT PHASE (case {first_case}):"));
		prompter.say(&format!("  Phase: {}", shown(&values, "case.phase").unwrap_or_else(|| "Unknown".into())));
		prompter.say(&format!("  Progress: {}%", shown(&values, "case.progress_status").unwrap_or_else(|| "0".into())));
	}

	let target_phase = loop {
		let answer = prompter.ask("\nMove to which phase? (e.g. 2, 3, 4, ...): ")?;
		match answer.parse::<TargetPhase>() {
			Ok(phase) => break phase,
			Err(err) => prompter.say(&format!("{} {err}", "✗".red())),
		}
	};

	prompter.say(&format!(
		"{} Phase {target_phase} selected (API value: {})",
		"✓".green(),
		target_phase.milestone()
	));
	Ok(ActionSpec::PhaseChange { target_phase })
}

async fn choose_case_type<C: CaseClient + ?Sized>(prompter: &mut dyn Prompter, client: &C, first_case: &str) -> Result<ActionSpec> {
	let found = probe(prompter, client, first_case)
		.await
		.and_then(|values| Some((shown(&values, "case.casetype.id")?, shown(&values, "case.casetype.name")?)));

	let mut question = "Enter the case type id: ";
	match found {
		Some((id, name)) => {
			prompter.say(&format!("\nCase type of case {first_case}:"));
			prompter.say(&format!("  ID: {id}"));
			prompter.say(&format!("  Name: {name}"));
			if confirm(prompter, "\nIs this the right case type? (y/n): ")? {
				if let Ok(casetype_id) = id.parse::<CaseTypeId>() {
					return Ok(ActionSpec::CaseTypeUpdate { casetype_id });
				}
				prompter.say(&format!("{} Case type id {id:?} is not numeric", "✗".red()));
			}
			question = "Enter the desired case type id: ";
		}
		None => prompter.say(&format!("{} Could not determine the case type", "✗".red())),
	}

	loop {
		let answer = prompter.ask(question)?;
		match answer.parse::<CaseTypeId>() {
			Ok(casetype_id) => return Ok(ActionSpec::CaseTypeUpdate { casetype_id }),
			Err(err) => prompter.say(&format!("{} {err}", "✗".red())),
		}
	}
}

fn choose_check(prompter: &mut dyn Prompter) -> Result<ActionSpec> {
	prompter.say("\nCHECK ATTRIBUTE");
	prompter.say("Enter the magicstring of the attribute to check: the technical name of an");
	prompter.say("attribute in the case type, e.g. 'ztc_contactpersoon' or 'ztc_zkn_resultaat'.");

	let magicstring = loop {
		let answer = prompter.ask("\nMagicstring: ")?;
		let answer = answer.trim();
		if !answer.is_empty() {
			break answer.to_string();
		}
	};

	prompter.say("\nCheck for:");
	prompter.say("  1. The attribute has a value (not empty/null)");
	prompter.say("  2. The attribute has a specific value");

	loop {
		match prompter.ask("Choice (1 or 2): ")?.trim() {
			"1" => return Ok(ActionSpec::AttributeCheck(AttributeCheck::has_value(magicstring))),
			"2" => {
				let expected = prompter.ask("Expected value: ")?;
				return Ok(ActionSpec::AttributeCheck(AttributeCheck::equals(magicstring, expected.trim())));
			}
			_ => {}
		}
	}
}
