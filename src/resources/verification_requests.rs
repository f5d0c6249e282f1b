use serde::Serialize;

use super::segment;
use crate::cancel::CancelToken;
use crate::errors::Result;
use crate::models::{ApiObject, Query};
use crate::polling::{poll_until_complete, WaitOptions};
use crate::transport::Transport;

const BASE: &str = "/api/v1/verification-requests";

/// `completed`, `expired`, or `cancelled`.
pub fn is_terminal_request_status(status: &str) -> bool {
    matches!(status, "completed" | "expired" | "cancelled")
}

/// Multi-asset verification requests.
pub struct VerificationRequests<'a> {
    pub(crate) transport: &'a Transport,
}

impl VerificationRequests<'_> {
    pub async fn create<B>(&self, cancel: &CancelToken, params: &B) -> Result<ApiObject>
    where
        B: Serialize + ?Sized,
    {
        self.transport.post(cancel, BASE, params).await
    }

    pub async fn retrieve(&self, cancel: &CancelToken, id: &str) -> Result<ApiObject> {
        self.transport
            .get(cancel, &format!("{BASE}/{}", segment(id)), &[])
            .await
    }

    pub async fn list(&self, cancel: &CancelToken, params: &Query<'_>) -> Result<ApiObject> {
        self.transport.get(cancel, BASE, params).await
    }

    /// Look a request up by the caller-assigned reference id.
    pub async fn get_by_reference(
        &self,
        cancel: &CancelToken,
        reference_id: &str,
    ) -> Result<ApiObject> {
        self.transport
            .get(
                cancel,
                &format!("{BASE}/by-reference/{}", segment(reference_id)),
                &[],
            )
            .await
    }

    /// Cancel a pending request.
    pub async fn cancel(&self, cancel: &CancelToken, id: &str) -> Result<ApiObject> {
        self.transport
            .delete(cancel, &format!("{BASE}/{}", segment(id)))
            .await
    }

    /// Poll until the request reaches a terminal status.
    pub async fn wait_for_completion(
        &self,
        cancel: &CancelToken,
        id: &str,
        opts: Option<&WaitOptions>,
    ) -> Result<ApiObject> {
        poll_until_complete(
            cancel,
            move || self.retrieve(cancel, id),
            is_terminal_request_status,
            &format!("Verification request {id}"),
            opts,
        )
        .await
    }
}
