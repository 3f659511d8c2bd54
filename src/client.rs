//! HTTP client for the token endpoint: form assembly, OTP header, response classification.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, config::EngineConfig, params::TokenParams, secret::SecretString};

/// Production token endpoint.
pub const TOKEN_ENDPOINT: &str = "https://api.fastly.com/tokens";
/// Header carrying the TOTP second factor.
pub const OTP_HEADER: &str = "Fastly-OTP";
/// Fixed `name` form field identifying tokens minted by this engine.
pub const TOKEN_NAME: &str = "fastly-token-engine";
/// Per-request timeout applied by [`TokenClient::new`] and [`TokenClient::with_endpoint`].
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Issues tokens against a single endpoint, exactly one attempt per call.
#[derive(Clone, Debug)]
pub struct TokenClient {
	http: ReqwestClient,
	endpoint: Url,
}
impl TokenClient {
	/// Creates a client against the production endpoint with the default timeout.
	pub fn new() -> Result<Self> {
		let endpoint =
			Url::parse(TOKEN_ENDPOINT).map_err(|source| Error::InvalidEndpoint { source })?;

		Self::with_endpoint(endpoint)
	}

	/// Creates a client against a custom endpoint (stub servers, staging) with the default
	/// timeout.
	pub fn with_endpoint(endpoint: Url) -> Result<Self> {
		let http = ReqwestClient::builder()
			.timeout(DEFAULT_TIMEOUT)
			.build()
			.map_err(|source| Error::HttpClientBuild { source })?;

		Ok(Self::with_http_client(http, endpoint))
	}

	/// Creates a client that reuses the caller-provided reqwest client unchanged.
	///
	/// The caller owns the timeout policy here; the engine assumes some bound exists.
	pub fn with_http_client(http: ReqwestClient, endpoint: Url) -> Self {
		Self { http, endpoint }
	}

	/// Returns the endpoint requests are sent to.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Performs one token request; no retries, no backoff.
	///
	/// The OTP header goes on the wire only when `otp` is non-empty. Dropping the returned
	/// future aborts the outbound call; nothing is persisted on this path.
	pub async fn issue(
		&self,
		config: &EngineConfig,
		otp: &str,
		params: &TokenParams,
	) -> Result<IssuedToken> {
		let mut request = self.http.post(self.endpoint.clone()).form(&token_form(config, params));

		if !otp.is_empty() {
			request = request.header(OTP_HEADER, otp);
		}

		let response = request.send().await.map_err(|source| Error::Transport { source })?;
		let status = response.status();
		let body = response.text().await.map_err(|source| Error::Transport { source })?;

		if !status.is_success() {
			return Err(Error::RemoteRejected {
				status: status.as_u16(),
				status_text: status.canonical_reason().unwrap_or_default().to_owned(),
				body,
			});
		}

		let mut deserializer = serde_json::Deserializer::from_str(&body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::MalformedResponse { source })
	}
}

/// Form body for one token request, in wire order.
fn token_form(config: &EngineConfig, params: &TokenParams) -> Vec<(&'static str, String)> {
	let mut form = vec![
		("username", config.username.clone()),
		("password", config.password.expose().to_owned()),
		("scope", params.scope.clone()),
	];

	form.extend(params.service_ids.iter().map(|id| ("services[]", id.clone())));
	form.push(("name", TOKEN_NAME.to_owned()));
	form.push(("expires_at", params.expires_at_form.clone()));

	form
}

/// Token record returned by the endpoint on success.
///
/// Absent fields decode to defaults so schema drift on the remote side stays non-fatal; only
/// `access_token` is handed back to callers by the engine facade.
#[derive(Clone, Debug, Deserialize)]
pub struct IssuedToken {
	/// Remote token identifier.
	#[serde(default)]
	pub id: String,
	/// The minted API token; redacted in logs.
	#[serde(default)]
	pub access_token: SecretString,
	/// Token display name, normally [`TOKEN_NAME`].
	#[serde(default)]
	pub name: String,
	/// Account the token belongs to.
	#[serde(default)]
	pub user_id: String,
	/// Primary service the token is bound to, when the remote reports one.
	#[serde(default)]
	pub service_id: String,
	/// Scope string granted by the endpoint.
	#[serde(default)]
	pub scope: String,
	/// Services the token can touch.
	#[serde(default)]
	pub services: Vec<String>,
	/// Expiry reported by the endpoint.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub expires_at: Option<OffsetDateTime>,
	/// Creation instant reported by the endpoint.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	/// Last-update instant reported by the endpoint.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub updated_at: Option<OffsetDateTime>,
}
