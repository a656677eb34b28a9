//! Credential bundles and extraction from pasted request text.
//!
//! Operators authenticate by copying a request from the browser's network tab
//! (raw headers or "copy as cURL") and pasting it. The extractors here recover
//! the three values needed to call the API on their behalf:
//!
//! * the origin (`https://host`) via [`extract_base_url`]
//! * the `X-XSRF-TOKEN` header value and the `zaaksysteem_session` cookie via
//!   [`extract_tokens`]
//!
//! Extraction never fails; missing values come back empty and the caller
//! decides how to fill them in.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Cookie carrying the server-side session id.
pub const SESSION_COOKIE_NAME: &str = "zaaksysteem_session";
/// Cookie mirroring the anti-forgery token.
pub const XSRF_COOKIE_NAME: &str = "XSRF-TOKEN";
/// Header echoing the anti-forgery token.
pub const XSRF_HEADER_NAME: &str = "X-XSRF-TOKEN";

static BASE_URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(https://[^/'"\s]+)"#).unwrap());
static XSRF_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)X-XSRF-TOKEN:\s*([^'"\s]+)"#).unwrap());
static COOKIE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?im)\bCookie:\s*([^'"\r\n]+)"#).unwrap());
static COOKIE_FLAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?:\s|^)(?:-b|--cookie)\s+['"]([^'"]+)['"]"#).unwrap());
static SESSION_COOKIE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?:^|[;\s])zaaksysteem_session=([^;'"\s]+)"#).unwrap());
static XSRF_COOKIE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?:^|[;\s])XSRF-TOKEN=([^;'"\s]+)"#).unwrap());

/// Deployment the credentials belong to, derived from the base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
	Acceptatie,
	Productie,
}

impl Environment {
	pub fn from_base_url(base_url: &str) -> Self {
		if base_url.contains("accept") {
			Self::Acceptatie
		} else {
			Self::Productie
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Acceptatie => "acceptatie",
			Self::Productie => "productie",
		}
	}
}

impl fmt::Display for Environment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Everything needed to authenticate a call: origin, anti-forgery token and
/// session cookie.
///
/// All fields are non-empty and the base URL is a bare origin; construction
/// via [`CredentialBundle::new`] or deserialization enforces both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BundleFields")]
pub struct CredentialBundle {
	base_url: String,
	xsrf_token: String,
	session_cookie: String,
}

#[derive(Deserialize)]
struct BundleFields {
	base_url: String,
	xsrf_token: String,
	session_cookie: String,
}

impl TryFrom<BundleFields> for CredentialBundle {
	type Error = Error;

	fn try_from(fields: BundleFields) -> Result<Self> {
		Self::new(&fields.base_url, &fields.xsrf_token, &fields.session_cookie)
	}
}

impl CredentialBundle {
	pub fn new(base_url: &str, xsrf_token: &str, session_cookie: &str) -> Result<Self> {
		let xsrf_token = xsrf_token.trim();
		let session_cookie = session_cookie.trim();
		if base_url.trim().is_empty() {
			return Err(Error::InvalidCredentials { missing: "base_url" });
		}
		if xsrf_token.is_empty() {
			return Err(Error::InvalidCredentials { missing: "xsrf_token" });
		}
		if session_cookie.is_empty() {
			return Err(Error::InvalidCredentials { missing: "session_cookie" });
		}

		Ok(Self {
			base_url: normalize_base_url(base_url)?,
			xsrf_token: xsrf_token.to_string(),
			session_cookie: session_cookie.to_string(),
		})
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub fn xsrf_token(&self) -> &str {
		&self.xsrf_token
	}

	pub fn session_cookie(&self) -> &str {
		&self.session_cookie
	}

	pub fn environment(&self) -> Environment {
		Environment::from_base_url(&self.base_url)
	}

	/// `Cookie` header value sent on every call.
	pub fn cookie_header(&self) -> String {
		format!(
			"{SESSION_COOKIE_NAME}={}; {XSRF_COOKIE_NAME}={}",
			self.session_cookie, self.xsrf_token
		)
	}
}

/// Reduces a URL to its origin (`scheme://host[:port]`).
fn normalize_base_url(raw: &str) -> Result<String> {
	let raw = raw.trim();
	let invalid = |reason: String| Error::InvalidBaseUrl {
		url: raw.to_string(),
		reason,
	};

	let parsed = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
	if !matches!(parsed.scheme(), "http" | "https") {
		return Err(invalid(format!("unsupported scheme `{}`", parsed.scheme())));
	}
	if parsed.host_str().is_none() {
		return Err(invalid("missing host".into()));
	}

	Ok(parsed.origin().ascii_serialization())
}

/// Token and cookie recovered from pasted text; empty when not found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedTokens {
	pub xsrf_token: String,
	pub session_cookie: String,
}

impl ExtractedTokens {
	pub fn is_complete(&self) -> bool {
		!self.xsrf_token.is_empty() && !self.session_cookie.is_empty()
	}
}

/// Returns the first `https://` origin in `text`.
pub fn extract_base_url(text: &str) -> Option<String> {
	BASE_URL_RE.captures(text).map(|caps| caps[1].to_string())
}

/// Recovers the XSRF token and session cookie from a pasted request.
///
/// The token comes from the `X-XSRF-TOKEN` header when present, otherwise from
/// the `XSRF-TOKEN` cookie. The cookie jar is read from a `Cookie:` header, or
/// from a curl `-b`/`--cookie` argument when no header exists.
pub fn extract_tokens(text: &str) -> ExtractedTokens {
	let mut tokens = ExtractedTokens::default();

	if let Some(caps) = XSRF_HEADER_RE.captures(text) {
		tokens.xsrf_token = caps[1].to_string();
	}

	let jar = COOKIE_HEADER_RE
		.captures(text)
		.or_else(|| COOKIE_FLAG_RE.captures(text))
		.map(|caps| caps[1].trim().to_string());

	if let Some(jar) = jar {
		if let Some(caps) = SESSION_COOKIE_RE.captures(&jar) {
			tokens.session_cookie = caps[1].to_string();
		}
		if tokens.xsrf_token.is_empty() {
			if let Some(caps) = XSRF_COOKIE_RE.captures(&jar) {
				tokens.xsrf_token = caps[1].to_string();
			}
		}
	}

	tokens
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extracts_header_token_and_session_cookie() {
		let raw = "POST /api/v0/case/1 HTTP/1.1\n\
			Host: zaken.example.nl\n\
			X-XSRF-TOKEN: abc123\n\
			Cookie: zaaksysteem_session=def456; XSRF-TOKEN=abc123\n";

		let tokens = extract_tokens(raw);
		assert_eq!(tokens.xsrf_token, "abc123");
		assert_eq!(tokens.session_cookie, "def456");
		assert!(tokens.is_complete());
	}

	#[test]
	fn falls_back_to_xsrf_cookie_without_header() {
		let raw = "GET /intern HTTP/1.1\nCookie: zaaksysteem_session=def456; XSRF-TOKEN=fromcookie\n";

		let tokens = extract_tokens(raw);
		assert_eq!(tokens.xsrf_token, "fromcookie");
		assert_eq!(tokens.session_cookie, "def456");
	}

	#[test]
	fn header_token_wins_over_cookie_token() {
		let raw = "X-XSRF-TOKEN: header\nCookie: XSRF-TOKEN=cookie; zaaksysteem_session=s1\n";

		let tokens = extract_tokens(raw);
		assert_eq!(tokens.xsrf_token, "header");
		assert_eq!(tokens.session_cookie, "s1");
	}

	#[test]
	fn reads_curl_copy_with_quoted_headers() {
		let raw = "curl 'https://zaken-accept.example.nl/api/v0/case/42' \\\n\
			-H 'accept: application/json' \\\n\
			-H 'cookie: other=1; zaaksysteem_session=sess789; XSRF-TOKEN=tok' \\\n\
			-H 'x-xsrf-token: tok'";

		let tokens = extract_tokens(raw);
		assert_eq!(tokens.xsrf_token, "tok");
		assert_eq!(tokens.session_cookie, "sess789");
		assert_eq!(extract_base_url(raw).as_deref(), Some("https://zaken-accept.example.nl"));
	}

	#[test]
	fn reads_curl_cookie_flag() {
		let raw = "curl 'https://zaken.example.nl/x' -b 'zaaksysteem_session=s2; XSRF-TOKEN=t2'";

		let tokens = extract_tokens(raw);
		assert_eq!(tokens.xsrf_token, "t2");
		assert_eq!(tokens.session_cookie, "s2");
	}

	#[test]
	fn missing_fields_come_back_empty() {
		let tokens = extract_tokens("nothing useful here");
		assert_eq!(tokens, ExtractedTokens::default());
		assert!(!tokens.is_complete());
		assert_eq!(extract_base_url("http://insecure.example.nl/path"), None);
	}

	#[test]
	fn bundle_normalizes_base_url_to_origin() {
		let bundle = CredentialBundle::new("https://zaken.example.nl/intern/zaak/1/", "t", "s").unwrap();
		assert_eq!(bundle.base_url(), "https://zaken.example.nl");
		assert_eq!(bundle.environment(), Environment::Productie);
		assert_eq!(bundle.cookie_header(), "zaaksysteem_session=s; XSRF-TOKEN=t");
	}

	#[test]
	fn bundle_rejects_empty_fields() {
		assert!(matches!(
			CredentialBundle::new("https://a.nl", "", "s"),
			Err(Error::InvalidCredentials { missing: "xsrf_token" })
		));
		assert!(matches!(
			CredentialBundle::new("https://a.nl", "t", "  "),
			Err(Error::InvalidCredentials { missing: "session_cookie" })
		));
		assert!(matches!(
			CredentialBundle::new("", "t", "s"),
			Err(Error::InvalidCredentials { missing: "base_url" })
		));
		assert!(matches!(CredentialBundle::new("zaken.example.nl", "t", "s"), Err(Error::InvalidBaseUrl { .. })));
	}

	#[test]
	fn environment_follows_accept_substring() {
		assert_eq!(Environment::from_base_url("https://zaken-accept.example.nl"), Environment::Acceptatie);
		assert_eq!(Environment::from_base_url("https://zaken.example.nl"), Environment::Productie);
	}

	#[test]
	fn bundle_deserialization_validates() {
		let ok: CredentialBundle =
			serde_json::from_str(r#"{"base_url":"https://a.nl","xsrf_token":"t","session_cookie":"s"}"#).unwrap();
		assert_eq!(ok.xsrf_token(), "t");

		let bad = serde_json::from_str::<CredentialBundle>(r#"{"base_url":"https://a.nl","xsrf_token":"","session_cookie":"s"}"#);
		assert!(bad.is_err());
	}
}
