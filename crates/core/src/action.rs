//! The four supported batch actions and their wire shapes.
//!
//! Mutating actions ([`ActionSpec::PhaseChange`], [`ActionSpec::CaseTypeUpdate`],
//! [`ActionSpec::Reopen`]) turn into a [`MutationRequest`] per case through the
//! pure [`ActionSpec::build`]. [`ActionSpec::AttributeCheck`] only reads: see
//! [`AttributeCheck::check`].

use std::fmt;
use std::str::FromStr;

use serde_json::{Value, json};

use crate::client::{CaseClient, FieldValues};
use crate::error::{Error, Result};

/// Field key prefix for case attributes.
pub const ATTRIBUTE_PREFIX: &str = "attribute.";

/// Operator-facing phase number, 1-based.
///
/// The API numbers milestones from zero; [`TargetPhase::milestone`] does the
/// translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetPhase(u32);

impl TargetPhase {
	pub fn new(phase: u32) -> Result<Self> {
		if phase == 0 {
			return Err(Error::InvalidPhase(phase.to_string()));
		}
		Ok(Self(phase))
	}

	pub fn get(self) -> u32 {
		self.0
	}

	/// Zero-based milestone index sent on the wire.
	pub fn milestone(self) -> u32 {
		self.0 - 1
	}
}

impl FromStr for TargetPhase {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		let trimmed = s.trim();
		let phase: i64 = trimmed.parse().map_err(|_| Error::InvalidPhase(trimmed.to_string()))?;
		let phase = u32::try_from(phase).map_err(|_| Error::InvalidPhase(trimmed.to_string()))?;
		Self::new(phase)
	}
}

impl fmt::Display for TargetPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Numeric case type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseTypeId(u64);

impl CaseTypeId {
	pub fn get(self) -> u64 {
		self.0
	}
}

impl FromStr for CaseTypeId {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		let trimmed = s.trim();
		trimmed
			.parse()
			.map(Self)
			.map_err(|_| Error::InvalidCaseTypeId(trimmed.to_string()))
	}
}

impl fmt::Display for CaseTypeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Read-only attribute verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeCheck {
	pub magicstring: String,
	pub expected_value: Option<String>,
	pub require_non_null: bool,
}

/// Result of evaluating an [`AttributeCheck`] against one case.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeVerdict {
	pub satisfied: bool,
	pub observed: Option<Value>,
}

impl AttributeVerdict {
	/// Log text for this verdict.
	pub fn describe(&self) -> String {
		match (self.satisfied, &self.observed) {
			(true, Some(value)) => format!("✓ Value: {}", value_text(value)),
			(true, None) => "✓".to_string(),
			(false, None) => "✗ Empty/Null".to_string(),
			(false, Some(value)) => format!("✗ Value: {}", value_text(value)),
		}
	}
}

impl AttributeCheck {
	/// Checks that the attribute holds any non-null value.
	pub fn has_value(magicstring: impl Into<String>) -> Self {
		Self {
			magicstring: magicstring.into(),
			expected_value: None,
			require_non_null: true,
		}
	}

	/// Checks that the attribute equals `expected`.
	pub fn equals(magicstring: impl Into<String>, expected: impl Into<String>) -> Self {
		Self {
			magicstring: magicstring.into(),
			expected_value: Some(expected.into()),
			require_non_null: false,
		}
	}

	/// Field key looked up in the case values.
	pub fn field_key(&self) -> String {
		format!("{ATTRIBUTE_PREFIX}{}", self.magicstring)
	}

	pub fn description(&self) -> String {
		match &self.expected_value {
			Some(expected) if !self.require_non_null => {
				format!("Attribute '{}' = '{}'", self.magicstring, expected)
			}
			_ => format!("Attribute '{}' has a value", self.magicstring),
		}
	}

	/// Evaluates the check against already fetched `values`.
	pub fn evaluate(&self, values: &FieldValues) -> AttributeVerdict {
		evaluate_field(values, &self.field_key(), self.expected_value.as_deref(), self.require_non_null)
	}

	/// Fetches the case through `client` and evaluates it.
	pub async fn check<C: CaseClient + ?Sized>(&self, client: &C, case_id: &str) -> Result<AttributeVerdict> {
		let values = client.case_values(case_id).await?;
		Ok(self.evaluate(&values))
	}
}

/// Presence, null and equality policy for a single field.
///
/// Any key is accepted (`attribute.x`, `case.status`, ...). Equality compares
/// string forms, so `5` and `"5"` match.
pub fn evaluate_field(values: &FieldValues, key: &str, expected: Option<&str>, require_non_null: bool) -> AttributeVerdict {
	let observed = match values.get(key) {
		None | Some(Value::Null) => {
			return AttributeVerdict {
				satisfied: false,
				observed: None,
			};
		}
		Some(value) => value.clone(),
	};

	let satisfied = match expected {
		_ if require_non_null => true,
		None => true,
		Some(expected) => value_text(&observed) == expected,
	};

	AttributeVerdict {
		satisfied,
		observed: Some(observed),
	}
}

/// String form of a JSON value: strings without quotes, everything else as JSON.
pub fn value_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// One POST to issue for one case.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
	pub endpoint: String,
	pub payload: Value,
	pub description: String,
}

/// Operator-selected action, fixed for a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionSpec {
	PhaseChange { target_phase: TargetPhase },
	CaseTypeUpdate { casetype_id: CaseTypeId },
	Reopen,
	AttributeCheck(AttributeCheck),
}

impl ActionSpec {
	pub fn name(&self) -> &'static str {
		match self {
			Self::PhaseChange { .. } => "phase",
			Self::CaseTypeUpdate { .. } => "update-type",
			Self::Reopen => "reopen",
			Self::AttributeCheck(_) => "check-attribute",
		}
	}

	pub fn is_mutation(&self) -> bool {
		!matches!(self, Self::AttributeCheck(_))
	}

	/// Case-agnostic description written next to every outcome.
	pub fn description(&self) -> String {
		match self {
			Self::PhaseChange { target_phase } => format!("Phase changed to phase {target_phase}"),
			Self::CaseTypeUpdate { casetype_id } => format!("Case type updated to {casetype_id}"),
			Self::Reopen => "Case reopened".to_string(),
			Self::AttributeCheck(check) => check.description(),
		}
	}

	/// Builds the wire request for `case_id`. Pure; performs no I/O.
	pub fn build(&self, case_id: &str) -> Result<MutationRequest> {
		let (endpoint, payload) = match self {
			Self::PhaseChange { target_phase } => (
				settings_endpoint(case_id),
				settings_payload(case_id, "milestone", json!(target_phase.milestone()))?,
			),
			Self::CaseTypeUpdate { casetype_id } => (
				settings_endpoint(case_id),
				settings_payload(case_id, "zaaktype_id", json!(casetype_id.get()))?,
			),
			Self::Reopen => (format!("/api/v0/case/{case_id}/update"), json!({ "status": "open" })),
			Self::AttributeCheck(_) => return Err(Error::NotAMutation(self.name())),
		};

		Ok(MutationRequest {
			endpoint,
			payload,
			description: self.description(),
		})
	}
}

fn settings_endpoint(case_id: &str) -> String {
	format!("/zaak/{case_id}/update/set_settings")
}

fn settings_payload(case_id: &str, field: &str, value: Value) -> Result<Value> {
	let numeric_id: u64 = case_id
		.trim()
		.parse()
		.map_err(|_| Error::InvalidCaseId(case_id.to_string()))?;

	let mut payload = json!({
		"selected_case_ids": numeric_id,
		"no_redirect": 1,
		"selection": "one_case",
		"commit": 1,
	});
	payload[field] = value;
	Ok(payload)
}
