//! Storage contracts and built-in backends for the engine's credential record.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Future type returned by [`SecretStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract the engine persists its credential record through.
///
/// The engine stores exactly one entry, under [`crate::config::CONFIG_KEY`], and flags it for
/// seal wrapping. Backends that encrypt at rest should honor the flag; the built-in backends
/// only record it.
pub trait SecretStore
where
	Self: Send + Sync,
{
	/// Fetches the entry stored under `key`, if present.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<StoreEntry>>;

	/// Persists or replaces the entry under its own key.
	fn put(&self, entry: StoreEntry) -> StoreFuture<'_, ()>;
}

/// A single key/value entry held by a [`SecretStore`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEntry {
	/// Storage key the entry lives under.
	pub key: String,
	/// Raw value bytes; JSON for the engine's own record.
	pub value: Vec<u8>,
	/// Whether the backend should apply seal wrapping (extra encryption at rest).
	pub seal_wrap: bool,
}
impl StoreEntry {
	/// Builds a plain entry from raw bytes.
	pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
		Self { key: key.into(), value: value.into(), seal_wrap: false }
	}

	/// Builds an entry by serializing `value` to JSON.
	pub fn json<T>(key: impl Into<String>, value: &T) -> Result<Self, StoreError>
	where
		T: Serialize,
	{
		let value = serde_json::to_vec(value).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize entry: {e}"),
		})?;

		Ok(Self::new(key, value))
	}

	/// Marks the entry for seal wrapping.
	pub fn seal_wrapped(mut self) -> Self {
		self.seal_wrap = true;

		self
	}

	/// Decodes the entry's value as JSON into `T`.
	pub fn decode_json<T>(&self) -> Result<T, StoreError>
	where
		T: serde::de::DeserializeOwned,
	{
		serde_json::from_slice(&self.value).map_err(|e| StoreError::Serialization {
			message: format!("Failed to decode entry {}: {e}", self.key),
		})
	}
}

/// Error type produced by [`SecretStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend or the entry helpers.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
