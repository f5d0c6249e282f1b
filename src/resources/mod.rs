//! Per-resource method sets. Each method maps one endpoint onto the
//! [`Transport`](crate::Transport); pollable resources add
//! `wait_for_completion` on top of [`poll_until_complete`](crate::poll_until_complete).

mod proofs;
mod sessions;
mod verification_requests;
mod verifications;
mod webhook_deliveries;

pub use proofs::Proofs;
pub use sessions::{is_terminal_session_status, Sessions};
pub use verification_requests::{is_terminal_request_status, VerificationRequests};
pub use verifications::{is_terminal_verification_status, Verifications};
pub use webhook_deliveries::WebhookDeliveries;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Escape `id` so it stays a single path segment.
pub(crate) fn segment(id: &str) -> String {
    utf8_percent_encode(id, PATH_SEGMENT).to_string()
}
