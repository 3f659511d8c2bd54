//! Demonstrates configuring the engine against a stub token endpoint and minting a short-lived
//! API token from the stored credentials plus a fresh one-time code.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use fastly_token_engine::{
	client::TokenClient, engine::Engine, params::Fields, store::MemoryStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/tokens").header_exists("Fastly-OTP");
			then.status(200).header("content-type", "application/json").body(
				"{\"id\":\"demo\",\"access_token\":\"tok-demo\",\"name\":\"fastly-token-engine\"}",
			);
		})
		.await;
	let client = TokenClient::with_endpoint(Url::parse(&server.url("/tokens"))?)?;
	let engine = Engine::with_token_client(Arc::new(MemoryStore::default()), client);
	let info = engine.info();

	println!("Engine {} (commit {}).", &info.version, &info.commit);

	let mut credentials = Fields::new();

	credentials.insert("username", "ops@example.com");
	credentials.insert("password", "hunter2");
	credentials.insert("sharedSecret", "JBSWY3DPEHPK3PXP");
	engine.write_config(&credentials).await?;

	let mut request = Fields::new();

	request.insert("scope", "purge_all");
	request.insert("service_id", "svc1,svc2");
	request.insert("ttl", "60");

	let response = engine.generate(&request).await;

	match response.token() {
		Some(token) => println!("Issued token: {token}."),
		None => println!("Issuance failed: {}", response.error().unwrap_or_default()),
	}

	token_mock.assert_async().await;

	Ok(())
}
