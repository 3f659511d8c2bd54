//! Engine-level error types shared across the store adapter, validator, and token client.

// self
use crate::_prelude::*;

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical engine error exposed by public APIs.
///
/// The generate operation never surfaces these as `Err`: the facade stringifies every variant
/// into a response-level error payload instead. Config reads and writes return them directly.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Caller-supplied fields failed validation.
	#[error(transparent)]
	Validation(#[from] crate::params::ValidationError),
	/// No credential record has been written yet.
	#[error("Engine is not configured; write username, password, and sharedSecret first.")]
	NotConfigured,
	/// One-time code derivation from the stored shared secret failed.
	#[error("Could not generate one-time code.")]
	SecretDerivation(
		#[from]
		#[source]
		crate::totp::TotpError,
	),
	/// Token endpoint answered with a non-success status.
	///
	/// The display starts with the numeric status and ends with the raw body, so callers can
	/// branch on the code and operators can read what the remote actually said.
	#[error("{status} {status_text} {body}")]
	RemoteRejected {
		/// HTTP status code.
		status: u16,
		/// Canonical reason phrase; empty when the code has none.
		status_text: String,
		/// Raw response body, verbatim.
		body: String,
	},
	/// Token endpoint accepted the request but returned an undecodable body.
	#[error("Token endpoint returned a malformed body.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error("Network error occurred while calling the token endpoint.")]
	Transport {
		/// Underlying client failure.
		#[source]
		source: ReqwestError,
	},

	/// Token endpoint URL cannot be parsed.
	#[error("Token endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying builder failure.
		#[source]
		source: ReqwestError,
	},
}
