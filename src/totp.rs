//! RFC 6238 time-based one-time codes derived from the stored shared secret.
//!
//! Fixed profile, matching what the token endpoint verifies: 30-second step, 6 decimal digits,
//! HMAC-SHA-1, no clock-skew window. The secret is normalized before decoding (trimmed,
//! upper-cased, padded to a multiple of 8) so records written with relaxed base32 still derive.

// crates.io
use data_encoding::BASE32;
use hmac::{Hmac, Mac};
use sha1::Sha1;
// self
use crate::_prelude::*;

/// Step length of the code window, in seconds.
pub const PERIOD_SECS: u64 = 30;
/// Number of decimal digits in a derived code.
pub const DIGITS: u32 = 6;

const MODULUS: u32 = 10_u32.pow(DIGITS);

/// Failures raised while deriving a one-time code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TotpError {
	/// The stored shared secret is empty; the engine was configured without one.
	#[error("Shared secret is empty.")]
	EmptySecret,
	/// The shared secret is not valid base32.
	#[error("Shared secret is not valid base32.")]
	InvalidSecret,
	/// The code could not be derived from a well-formed secret.
	#[error("Code derivation failed: {message}.")]
	Derivation {
		/// Human-readable error payload.
		message: String,
	},
}

/// Derives the code for the window containing `at`.
pub fn generate_at(secret: &str, at: OffsetDateTime) -> Result<String, TotpError> {
	let key = decode_secret(secret)?;
	let timestamp = u64::try_from(at.unix_timestamp()).map_err(|_| TotpError::Derivation {
		message: format!("instant {at} precedes the Unix epoch"),
	})?;

	hotp(&key, timestamp / PERIOD_SECS)
}

/// Derives the code for the current window.
pub fn generate_now(secret: &str) -> Result<String, TotpError> {
	generate_at(secret, OffsetDateTime::now_utc())
}

fn decode_secret(secret: &str) -> Result<Vec<u8>, TotpError> {
	let trimmed = secret.trim();

	if trimmed.is_empty() {
		return Err(TotpError::EmptySecret);
	}

	let mut normalized = trimmed.to_ascii_uppercase();

	// RFC 4648 decoding expects padded input; stored secrets usually come unpadded.
	while normalized.len() % 8 != 0 {
		normalized.push('=');
	}

	BASE32.decode(normalized.as_bytes()).map_err(|_| TotpError::InvalidSecret)
}

fn hotp(key: &[u8], counter: u64) -> Result<String, TotpError> {
	let mut mac = <Hmac<Sha1>>::new_from_slice(key)
		.map_err(|e| TotpError::Derivation { message: e.to_string() })?;

	mac.update(&counter.to_be_bytes());

	let digest = mac.finalize().into_bytes();
	// Dynamic truncation (RFC 4226): the low nibble of the last byte picks a 31-bit window.
	let offset = (digest[digest.len() - 1] & 0x0f) as usize;
	let code = u32::from_be_bytes([
		digest[offset] & 0x7f,
		digest[offset + 1],
		digest[offset + 2],
		digest[offset + 3],
	]);

	Ok(format!("{:0width$}", code % MODULUS, width = DIGITS as usize))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	// RFC 6238 appendix B, SHA-1 rows; the base32 secret is the ASCII key "12345678901234567890".
	const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

	fn at(unix: i64) -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(unix).expect("Test timestamp should be representable.")
	}

	#[test]
	fn matches_rfc_6238_sha1_vectors() {
		for (unix, expected) in [
			(59, "287082"),
			(1_111_111_109, "081804"),
			(1_111_111_111, "050471"),
			(1_234_567_890, "005924"),
			(2_000_000_000, "279037"),
			(20_000_000_000, "353130"),
		] {
			let code = generate_at(RFC_SECRET, at(unix)).expect("RFC vector should derive a code.");

			assert_eq!(code, expected, "mismatch at T={unix}");
		}
	}

	#[test]
	fn stays_constant_inside_one_window() {
		let begin = generate_at(RFC_SECRET, at(30)).expect("Window begin should derive.");
		let end = generate_at(RFC_SECRET, at(59)).expect("Window end should derive.");

		assert_eq!(begin, end);
	}

	#[test]
	fn changes_across_adjacent_windows() {
		let earlier =
			generate_at(RFC_SECRET, at(1_111_111_109)).expect("Earlier window should derive.");
		let later =
			generate_at(RFC_SECRET, at(1_111_111_111)).expect("Later window should derive.");

		assert_ne!(earlier, later);
	}

	#[test]
	fn empty_secret_is_a_distinct_failure() {
		assert_eq!(generate_at("", at(59)), Err(TotpError::EmptySecret));
		assert_eq!(generate_at("   ", at(59)), Err(TotpError::EmptySecret));
	}

	#[test]
	fn invalid_base32_is_rejected() {
		assert_eq!(generate_at("not-base32!", at(59)), Err(TotpError::InvalidSecret));
	}

	#[test]
	fn relaxed_secrets_normalize_before_decoding() {
		let canonical =
			generate_at("JBSWY3DPEHPK3PXP", at(59)).expect("Canonical secret should derive.");
		let relaxed =
			generate_at(" jbswy3dpehpk3pxp ", at(59)).expect("Relaxed secret should derive.");

		assert_eq!(canonical, relaxed);
	}

	#[test]
	fn pre_epoch_instants_fail_derivation() {
		let err = generate_at(RFC_SECRET, at(-1)).expect_err("Pre-epoch instants should fail.");

		assert!(matches!(err, TotpError::Derivation { .. }));
	}
}
