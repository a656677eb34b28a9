//! Picks the credentials for this run: a fresh saved session, or a new one
//! pasted by the operator.

use std::time::Duration;

use colored::Colorize;
use tracing::info;
use zaakbatch::{CredentialBundle, SessionStore, extract_base_url, extract_tokens};

use crate::error::Result;
use crate::prompt::{Prompter, confirm, read_block};

/// Offers the newest saved session younger than `max_age`; otherwise asks for
/// a pasted request and saves the result as a new record.
pub fn acquire_credentials(store: &SessionStore, max_age: Duration, prompter: &mut dyn Prompter) -> Result<CredentialBundle> {
	if let Some(found) = store.discover(max_age) {
		prompter.say(&format!("{} Recent session found ({} min old)", "✓".green(), found.age_minutes));
		prompter.say(&format!("  URL: {}", found.bundle.base_url()));
		if confirm(prompter, "\nUse existing session? (y/n): ")? {
			info!(path = %found.path.display(), "reusing session record");
			prompter.say(&format!("{} Session loaded\n", "✓".green()));
			return Ok(found.bundle);
		}
	}

	let bundle = credentials_from_paste(prompter)?;
	let path = store.persist(&bundle)?;
	prompter.say(&format!("{} Session saved to {}\n", "✓".green(), path.display()));
	Ok(bundle)
}

/// Builds a bundle from pasted request text, asking for whatever could not be
/// extracted.
///
/// A missing URL is always asked for, whether the paste was empty or just
/// lacked an `https://` origin.
pub fn credentials_from_paste(prompter: &mut dyn Prompter) -> Result<CredentialBundle> {
	prompter.say("\nPaste a copied request or cURL command (an empty line ends the input):");
	let pasted = read_block(prompter)?;

	let base_url = match extract_base_url(&pasted) {
		Some(url) => {
			prompter.say(&format!("{} URL detected: {url}", "✓".green()));
			url
		}
		None => {
			if !pasted.trim().is_empty() {
				prompter.say(&format!("{} Could not find the URL", "✗".red()));
			}
			prompter.ask("BASE_URL: ")?.trim().to_string()
		}
	};

	let tokens = extract_tokens(&pasted);
	let (xsrf_token, session_cookie) = if tokens.is_complete() {
		prompter.say(&format!("{} Token and cookie extracted", "✓".green()));
		(tokens.xsrf_token, tokens.session_cookie)
	} else {
		if !pasted.trim().is_empty() {
			prompter.say(&format!("{} Could not find token/cookie", "✗".red()));
		}
		let xsrf = prompter.ask("X-XSRF-TOKEN: ")?;
		let session = prompter.ask("SESSION_COOKIE: ")?;
		(xsrf, session)
	};

	Ok(CredentialBundle::new(&base_url, &xsrf_token, &session_cookie)?)
}
