//! The handler facade: info, config read/write, token generation, cache invalidation.

// self
use crate::{
	_prelude::*,
	client::TokenClient,
	config::{self, ConfigUpdate, EngineConfig},
	obs::{self, OpKind, OpOutcome, OpSpan},
	params::{Fields, TokenParams},
	store::SecretStore,
	totp,
};

/// Engine version, from Cargo metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Commit the engine was built from; "unknown" unless the build injects
/// `FASTLY_TOKEN_ENGINE_COMMIT`.
pub const GIT_COMMIT: &str = match option_env!("FASTLY_TOKEN_ENGINE_COMMIT") {
	Some(commit) => commit,
	None => "unknown",
};

/// Coordinates the engine's operations over one store and one token client.
///
/// The credential record is cached behind a read-write lock. Cache misses and writes serialize
/// on one async mutex, and the cache is only filled under that mutex, so a fill can never
/// interleave with a write's persist + invalidate: readers observe fully-old or fully-new
/// credentials, and cache hits take only a brief read lock.
pub struct Engine {
	store: Arc<dyn SecretStore>,
	client: TokenClient,
	cached: RwLock<Option<EngineConfig>>,
	write_lock: AsyncMutex<()>,
}
impl Engine {
	/// Creates an engine that talks to the production token endpoint.
	pub fn new(store: Arc<dyn SecretStore>) -> Result<Self> {
		Ok(Self::with_token_client(store, TokenClient::new()?))
	}

	/// Creates an engine that reuses the caller-provided token client.
	pub fn with_token_client(store: Arc<dyn SecretStore>, client: TokenClient) -> Self {
		Self { store, client, cached: RwLock::new(None), write_lock: AsyncMutex::new(()) }
	}

	/// Reports the build metadata; no storage or network access.
	pub fn info(&self) -> InfoResponse {
		const KIND: OpKind = OpKind::Info;

		let _guard = OpSpan::new(KIND, "info").entered();

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let response = InfoResponse { version: VERSION.into(), commit: GIT_COMMIT.into() };

		obs::record_op_outcome(KIND, OpOutcome::Success);

		response
	}

	/// Returns the stored credentials, or `None` before the first write.
	///
	/// Values come back in clear, password and shared secret included; gating who may call
	/// this sits with the storage mount's access layer, not with the engine.
	pub async fn read_config(&self) -> Result<Option<ConfigResponse>> {
		const KIND: OpKind = OpKind::ConfigRead;

		let span = OpSpan::new(KIND, "read_config");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(
				async move { Ok(self.load_config().await?.as_ref().map(ConfigResponse::from)) },
			)
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Validates `fields` against the {username, password, sharedSecret} schema, merges them
	/// over the stored record, persists the merge, and invalidates the cache.
	pub async fn write_config(&self, fields: &Fields) -> Result<()> {
		const KIND: OpKind = OpKind::ConfigWrite;

		let span = OpSpan::new(KIND, "write_config");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let update = ConfigUpdate::from_fields(fields)?;
				let _exclusive = self.write_lock.lock().await;

				config::write(self.store.as_ref(), update).await?;
				self.invalidate();

				Ok(())
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Issues a token for the caller-supplied fields (schema {scope, ttl, service_id}).
	///
	/// Always responds: every failure, storage included, comes back as
	/// [`GenerateResponse::Failed`] rather than `Err`. Dropping the future mid-flight aborts
	/// the outbound HTTP call; the operation persists nothing.
	pub async fn generate(&self, fields: &Fields) -> GenerateResponse {
		const KIND: OpKind = OpKind::Generate;

		let span = OpSpan::new(KIND, "generate");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.try_generate(fields)).await;

		match result {
			Ok(token) => {
				obs::record_op_outcome(KIND, OpOutcome::Success);

				GenerateResponse::Issued { token }
			},
			Err(e) => {
				obs::record_op_outcome(KIND, OpOutcome::Failure);

				GenerateResponse::Failed { error: e.to_string() }
			},
		}
	}

	/// Drops the cached credential record; the next read reloads from storage.
	///
	/// Runs automatically after successful writes. Exposed for hosts whose storage can change
	/// underneath the engine (replication, restored snapshots).
	pub fn invalidate(&self) {
		*self.cached.write() = None;
	}

	async fn try_generate(&self, fields: &Fields) -> Result<String> {
		let config = self.load_config().await?.ok_or(Error::NotConfigured)?;
		let params = TokenParams::validate(fields)?;
		let otp = totp::generate_now(config.shared_secret.expose())?;
		let token = self.client.issue(&config, &otp, &params).await?;

		Ok(token.access_token.expose().to_owned())
	}

	async fn load_config(&self) -> Result<Option<EngineConfig>> {
		if let Some(config) = self.cached.read().clone() {
			return Ok(Some(config));
		}

		// Fill only under the write lock; a concurrent write's persist + invalidate cannot
		// interleave with this read.
		let _exclusive = self.write_lock.lock().await;

		if let Some(config) = self.cached.read().clone() {
			return Ok(Some(config));
		}

		let config = config::read(self.store.as_ref()).await?;

		if let Some(config) = &config {
			*self.cached.write() = Some(config.clone());
		}

		Ok(config)
	}
}
impl Debug for Engine {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Engine")
			.field("endpoint", &self.client.endpoint().as_str())
			.field("cached", &self.cached.read().is_some())
			.finish()
	}
}

/// Build metadata reported by [`Engine::info`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoResponse {
	/// Crate version.
	pub version: String,
	/// Source commit, or "unknown".
	pub commit: String,
}

/// Stored credentials as reported by [`Engine::read_config`]; empty fields are omitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigResponse {
	/// Stored username, when set.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	/// Stored password, when set.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub password: Option<String>,
	/// Stored shared secret, when set.
	#[serde(default, rename = "sharedSecret", skip_serializing_if = "Option::is_none")]
	pub shared_secret: Option<String>,
}
impl From<&EngineConfig> for ConfigResponse {
	fn from(config: &EngineConfig) -> Self {
		let set = |value: &str| (!value.is_empty()).then(|| value.to_owned());

		Self {
			username: set(&config.username),
			password: set(config.password.expose()),
			shared_secret: set(config.shared_secret.expose()),
		}
	}
}

/// Outcome of [`Engine::generate`]: a minted token or a response-level error payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerateResponse {
	/// The endpoint minted a token.
	Issued {
		/// The token value; treat as a secret.
		token: String,
	},
	/// Something failed; the payload carries the classified error text.
	Failed {
		/// Human-readable failure, e.g. "401 Unauthorized ...".
		error: String,
	},
}
impl GenerateResponse {
	/// Returns the minted token, if issuance succeeded.
	pub fn token(&self) -> Option<&str> {
		match self {
			Self::Issued { token } => Some(token),
			Self::Failed { .. } => None,
		}
	}

	/// Returns the failure payload, if issuance failed.
	pub fn error(&self) -> Option<&str> {
		match self {
			Self::Issued { .. } => None,
			Self::Failed { error } => Some(error),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::MemoryStore;

	fn build_engine() -> Engine {
		let client = TokenClient::with_http_client(
			ReqwestClient::new(),
			Url::parse("http://127.0.0.1:9/tokens").expect("Static test URL should parse."),
		);

		Engine::with_token_client(Arc::new(MemoryStore::default()), client)
	}

	#[test]
	fn info_reports_build_metadata() {
		let info = build_engine().info();

		assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
		assert!(!info.commit.is_empty());
	}

	#[test]
	fn config_response_omits_empty_fields() {
		let config = EngineConfig { username: "ops@example.com".into(), ..Default::default() };
		let response = ConfigResponse::from(&config);
		let json = serde_json::to_string(&response).expect("Config response should serialize.");

		assert_eq!(json, "{\"username\":\"ops@example.com\"}");
	}

	#[tokio::test]
	async fn invalidate_forces_a_reload_from_the_store() {
		let engine = build_engine();
		let mut fields = Fields::new();

		fields.insert("username", "ops@example.com");
		fields.insert("password", "hunter2");
		fields.insert("sharedSecret", "jbswy3dpehpk3pxp");

		engine.write_config(&fields).await.expect("Config write should succeed.");

		let first = engine
			.read_config()
			.await
			.expect("Config read should succeed.")
			.expect("Config should exist after a write.");

		assert_eq!(first.shared_secret.as_deref(), Some("JBSWY3DPEHPK3PXP"));

		engine.invalidate();

		let second = engine
			.read_config()
			.await
			.expect("Config read should succeed after invalidation.")
			.expect("Config should reload from the store.");

		assert_eq!(first, second);
	}
}
