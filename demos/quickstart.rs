//! Quick-start examples for the proof.holdings Rust SDK.
//!
//! Run with:
//!   PROOF_API_KEY=pk_test_... cargo run --example quickstart
//!
//! Set `RUST_LOG=proof_sdk=debug` to see each attempt and retry.

use std::time::Duration;

use proof_sdk::{json_str, status_of, CancelToken, ClientBuilder, ErrorKind, WaitOptions};
use serde_json::json;

#[tokio::main]
async fn main() -> proof_sdk::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // -----------------------------------------------------------------------
    // 1. Create a client (reads PROOF_API_KEY from environment)
    // -----------------------------------------------------------------------
    let client = ClientBuilder::new().max_retries(3).build()?;

    // One token bounds the whole session; Ctrl-C style cancellation would
    // call `cancel.cancel()` from another task.
    let cancel = CancelToken::with_timeout(Duration::from_secs(15 * 60));

    // -----------------------------------------------------------------------
    // 2. Start a phone verification and wait for it
    // -----------------------------------------------------------------------
    let created = client
        .verifications()
        .create(
            &cancel,
            &json!({ "type": "phone", "channel": "sms", "identifier": "+15550100" }),
        )
        .await?;
    let id = json_str(&created, "id").to_string();
    println!("Created verification {id} ({})", status_of(&created));

    // Test keys can short-circuit the OTP step.
    client.verifications().test_verify(&cancel, &id).await?;

    let opts = WaitOptions::new(Duration::from_secs(2), Duration::from_secs(120));
    match client
        .verifications()
        .wait_for_completion(&cancel, &id, Some(&opts))
        .await
    {
        Ok(done) => println!("Verification finished: {}", status_of(&done)),
        Err(e) if e.kind() == Some(ErrorKind::PollingTimeout) => {
            println!("Still pending after two minutes: {e}");
        }
        Err(e) => return Err(e),
    }
    println!();

    // -----------------------------------------------------------------------
    // 3. Validate the resulting proof, then list failed webhook deliveries
    // -----------------------------------------------------------------------
    let status = client.proofs().status(&cancel, &id).await?;
    println!("Proof status: {}", status_of(&status));

    let failed = client
        .webhook_deliveries()
        .list(&cancel, &[("status", "failed"), ("limit", "10")])
        .await?;
    if let Some(items) = failed.get("data").and_then(|d| d.as_array()) {
        for delivery in items {
            println!("  failed delivery: {}", delivery["id"]);
        }
    }

    // -----------------------------------------------------------------------
    // 4. Branch on error kind instead of message text
    // -----------------------------------------------------------------------
    match client.sessions().retrieve(&cancel, "sess_does_not_exist").await {
        Ok(session) => println!("Unexpected session: {session:?}"),
        Err(e) => match e.as_api_error() {
            Some(api) if api.kind() == ErrorKind::NotFound => {
                println!("No such session (request id: {:?})", api.request_id());
            }
            Some(api) if api.is_retryable() => println!("Transient failure, try later: {api}"),
            _ => return Err(e),
        },
    }

    Ok(())
}
