//! # proof.holdings SDK for Rust
//!
//! Async client for the [proof.holdings](https://proof.holdings) identity
//! verification API. Create verifications and sessions, validate or revoke
//! proofs, and wait for asynchronous status changes.
//!
//! Every call takes a [`CancelToken`]; cancelling it (or letting its deadline
//! pass) stops retries and polling at the next suspension point.
//!
//! ## Quick start
//!
//! ```no_run
//! use proof_sdk::{CancelToken, Client, WaitOptions};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> proof_sdk::Result<()> {
//!     let client = Client::new("pk_live_your_api_key")?;
//!     let cancel = CancelToken::with_timeout(Duration::from_secs(300));
//!
//!     let created = client
//!         .verifications()
//!         .create(&cancel, &json!({ "type": "phone", "channel": "sms", "identifier": "+15550100" }))
//!         .await?;
//!     let id = proof_sdk::json_str(&created, "id");
//!
//!     let done = client
//!         .verifications()
//!         .wait_for_completion(&cancel, id, Some(&WaitOptions::default()))
//!         .await?;
//!     println!("final status: {}", proof_sdk::status_of(&done));
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Failures are a single [`ProofError`]. HTTP failures carry an [`ApiError`]
//! whose [`ErrorKind`] is derived from the status code, so callers branch on
//! the kind rather than on message text:
//!
//! ```no_run
//! # use proof_sdk::{CancelToken, Client, ErrorKind};
//! # async fn example(client: Client) {
//! match client.sessions().retrieve(&CancelToken::new(), "sess_1").await {
//!     Ok(session) => println!("{session:?}"),
//!     Err(e) if e.kind() == Some(ErrorKind::NotFound) => println!("no such session"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! # }
//! ```

mod cancel;
mod client;
mod errors;
mod models;
mod polling;
pub mod resources;
mod transport;

pub use cancel::CancelToken;
pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
pub use errors::{classify, ApiError, ErrorBody, ErrorKind, ProofError, Result};
pub use models::{json_str, status_of, ApiObject, Query};
pub use polling::{poll_until_complete, WaitOptions};
pub use transport::{backoff, Transport};
