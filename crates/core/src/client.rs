//! Authenticated access to the remote case API.
//!
//! [`CaseClient`] is the seam the batch engine talks through; [`HttpCaseClient`]
//! is the `reqwest` implementation used by the CLI.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{ACCEPT, COOKIE};
use serde_json::Value;
use tracing::debug;

use crate::credentials::{CredentialBundle, XSRF_HEADER_NAME};
use crate::error::{Error, Result};

/// Boxing alias: stable async in trait without `async_trait`.
pub type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Field key to value mapping of a single case, e.g. `case.phase` or
/// `attribute.<magicstring>`.
pub type FieldValues = serde_json::Map<String, Value>;

/// Read path for a case.
pub fn case_endpoint(case_id: &str) -> String {
	format!("/api/v0/case/{case_id}")
}

pub trait CaseClient {
	/// Fetches the field values of a case.
	fn case_values<'a>(&'a self, case_id: &'a str) -> BoxFut<'a, Result<FieldValues>>;

	/// POSTs `payload` as JSON to `endpoint` (a path below the base URL) and
	/// returns the response body. Non-success statuses are errors.
	fn post_json<'a>(&'a self, endpoint: &'a str, payload: &'a Value) -> BoxFut<'a, Result<String>>;
}

/// [`CaseClient`] over HTTPS, authenticating every call with the bundle's
/// XSRF header and cookie pair.
#[derive(Debug, Clone)]
pub struct HttpCaseClient {
	http: reqwest::Client,
	credentials: CredentialBundle,
}

impl HttpCaseClient {
	/// `timeout` of `None` keeps the transport default.
	pub fn new(credentials: CredentialBundle, timeout: Option<Duration>) -> Result<Self> {
		let mut builder = reqwest::Client::builder();
		if let Some(timeout) = timeout {
			builder = builder.timeout(timeout);
		}
		Ok(Self {
			http: builder.build()?,
			credentials,
		})
	}

	pub fn credentials(&self) -> &CredentialBundle {
		&self.credentials
	}

	fn url(&self, endpoint: &str) -> String {
		format!("{}{}", self.credentials.base_url(), endpoint)
	}

	fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
		request
			.header(XSRF_HEADER_NAME, self.credentials.xsrf_token())
			.header(COOKIE, self.credentials.cookie_header())
	}

	async fn fetch_values(&self, case_id: &str) -> Result<FieldValues> {
		let endpoint = case_endpoint(case_id);
		debug!(%endpoint, "fetching case values");

		let body: Value = self
			.authorize(self.http.get(self.url(&endpoint)))
			.header(ACCEPT, "application/json")
			.send()
			.await?
			.error_for_status()?
			.json()
			.await?;

		match body.pointer("/result/0/values") {
			Some(Value::Object(values)) => Ok(values.clone()),
			_ => Err(Error::UnexpectedResponse {
				endpoint,
				reason: "missing result[0].values".into(),
			}),
		}
	}

	async fn send_json(&self, endpoint: &str, payload: &Value) -> Result<String> {
		debug!(%endpoint, "posting update");

		let response = self
			.authorize(self.http.post(self.url(endpoint)))
			.json(payload)
			.send()
			.await?
			.error_for_status()?;
		Ok(response.text().await?)
	}
}

impl CaseClient for HttpCaseClient {
	fn case_values<'a>(&'a self, case_id: &'a str) -> BoxFut<'a, Result<FieldValues>> {
		Box::pin(self.fetch_values(case_id))
	}

	fn post_json<'a>(&'a self, endpoint: &'a str, payload: &'a Value) -> BoxFut<'a, Result<String>> {
		Box::pin(self.send_json(endpoint, payload))
	}
}
