//! Redacted wrapper for credential material and issued tokens.

// self
use crate::_prelude::*;

/// Redacted string wrapper keeping passwords, shared secrets, and minted tokens out of logs.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretString(String);
impl SecretString {
	/// Wraps a new secret value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Whether the wrapped value is the empty string, the unset marker for stored credentials.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl AsRef<str> for SecretString {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for SecretString {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SecretString").field(&"<redacted>").finish()
	}
}
impl Display for SecretString {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = SecretString::new("correct-horse");

		assert_eq!(format!("{secret:?}"), "SecretString(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn serde_passes_the_bare_string_through() {
		let secret = SecretString::new("tok-123");
		let json = serde_json::to_string(&secret).expect("Secret should serialize as a bare string.");

		assert_eq!(json, "\"tok-123\"");

		let round_trip: SecretString =
			serde_json::from_str(&json).expect("Bare string should deserialize into a secret.");

		assert_eq!(round_trip.expose(), "tok-123");
	}
}
