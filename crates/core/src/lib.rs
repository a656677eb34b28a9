//! zaakbatch: apply one action to many zaaksysteem cases.
//!
//! The crate covers the two halves of a batch run:
//!
//! * the credential session lifecycle: [`credentials`] extracts a
//!   [`CredentialBundle`] from a pasted request, [`session`] persists it and
//!   offers fresh records for reuse
//! * the dispatch engine: [`action`] defines what to do per case,
//!   [`batch`] runs it over the case list through a [`CaseClient`] and
//!   [`log`] keeps the outcome trail
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use zaakbatch::{ActionSpec, BatchProcessor, HttpCaseClient, RunConfig};
//!
//! let client = HttpCaseClient::new(bundle, None)?;
//! let config = RunConfig::new(ActionSpec::Reopen);
//! let outcomes = BatchProcessor::new(&client, &config).run(&cases);
//! futures_util::pin_mut!(outcomes);
//! while let Some(outcome) = outcomes.next().await {
//!     log.append(&outcome.record)?;
//! }
//! ```

pub mod action;
pub mod batch;
pub mod cases;
pub mod client;
pub mod credentials;
pub mod error;
pub mod log;
pub mod session;

pub use action::{ActionSpec, AttributeCheck, AttributeVerdict, CaseTypeId, MutationRequest, TargetPhase};
pub use batch::{BatchProcessor, BatchSummary, CaseOutcome, OutcomeRecord, OutcomeStatus, RunConfig};
pub use cases::load_cases;
pub use client::{BoxFut, CaseClient, FieldValues, HttpCaseClient};
pub use credentials::{CredentialBundle, Environment, ExtractedTokens, extract_base_url, extract_tokens};
pub use error::{Error, Result};
pub use log::ResultLog;
pub use session::{DiscoveredSession, SessionStore};
