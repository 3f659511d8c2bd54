//! The persisted credential record and its store adapter.
//!
//! The record serializes with the field names `username`/`password`/`sharedSecret`, so an
//! engine pointed at an existing mount keeps reading records written by earlier deployments.

// self
use crate::{
	_prelude::*,
	params::{Fields, ValidationError},
	secret::SecretString,
	store::{SecretStore, StoreEntry},
};

/// Fixed storage key the credential record lives under.
pub const CONFIG_KEY: &str = "config";

/// Service-account credentials persisted by the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
	/// Account username used for the token request.
	#[serde(default)]
	pub username: String,
	/// Account password used for the token request.
	#[serde(default)]
	pub password: SecretString,
	/// Base32 TOTP shared secret, canonicalized to upper case on write.
	#[serde(default, rename = "sharedSecret")]
	pub shared_secret: SecretString,
}
impl EngineConfig {
	/// Overwrites each field carried (non-empty) in `update`, leaving the rest untouched.
	pub fn apply(&mut self, update: ConfigUpdate) {
		if !update.username.is_empty() {
			self.username = update.username;
		}
		if !update.password.is_empty() {
			self.password = SecretString::new(update.password);
		}
		if !update.shared_secret.is_empty() {
			// The TOTP decoder expects the upper-case RFC 4648 alphabet.
			self.shared_secret = SecretString::new(update.shared_secret.to_ascii_uppercase());
		}
	}
}

/// Partial credential update parsed from caller-supplied fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
	/// Replacement username; empty keeps the stored value.
	pub username: String,
	/// Replacement password; empty keeps the stored value.
	pub password: String,
	/// Replacement shared secret; empty keeps the stored value.
	pub shared_secret: String,
}
impl ConfigUpdate {
	/// Fields the config write operation accepts.
	pub const SCHEMA: &'static [&'static str] = &["password", "sharedSecret", "username"];

	/// Parses an update out of `fields`, rejecting anything outside the schema.
	pub fn from_fields(fields: &Fields) -> Result<Self, ValidationError> {
		fields.ensure_known(Self::SCHEMA)?;

		Ok(Self {
			username: fields.get("username").unwrap_or_default().to_owned(),
			password: fields.get("password").unwrap_or_default().to_owned(),
			shared_secret: fields.get("sharedSecret").unwrap_or_default().to_owned(),
		})
	}
}

/// Reads the credential record, if one has been written.
pub async fn read(store: &dyn SecretStore) -> Result<Option<EngineConfig>> {
	match store.get(CONFIG_KEY).await? {
		Some(entry) => Ok(Some(entry.decode_json()?)),
		None => Ok(None),
	}
}

/// Applies `update` on top of the stored record (all-empty when absent) and persists the merge.
///
/// The written entry is flagged for seal wrapping. Callers that cache records must invalidate
/// after a successful write; [`crate::engine::Engine`] does both under its exclusive write lock.
pub async fn write(store: &dyn SecretStore, update: ConfigUpdate) -> Result<EngineConfig> {
	let mut config = read(store).await?.unwrap_or_default();

	config.apply(update);
	store.put(StoreEntry::json(CONFIG_KEY, &config)?.seal_wrapped()).await?;

	Ok(config)
}
