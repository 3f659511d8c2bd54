//! Thread-safe in-memory [`SecretStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{SecretStore, StoreEntry, StoreFuture},
};

type EntryMap = Arc<RwLock<HashMap<String, StoreEntry>>>;

/// Thread-safe storage backend that keeps entries in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(EntryMap);
impl MemoryStore {
	fn get_now(map: EntryMap, key: String) -> Option<StoreEntry> {
		map.read().get(&key).cloned()
	}

	fn put_now(map: EntryMap, entry: StoreEntry) {
		map.write().insert(entry.key.clone(), entry);
	}
}
impl SecretStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<StoreEntry>> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(Self::get_now(map, key)) })
	}

	fn put(&self, entry: StoreEntry) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			Self::put_now(map, entry);

			Ok(())
		})
	}
}
