use serde::Serialize;

use super::segment;
use crate::cancel::CancelToken;
use crate::errors::Result;
use crate::models::ApiObject;
use crate::polling::{poll_until_complete, WaitOptions};
use crate::transport::Transport;

const BASE: &str = "/api/v1/sessions";

/// `verified`, `failed`, or `expired`.
pub fn is_terminal_session_status(status: &str) -> bool {
    matches!(status, "verified" | "failed" | "expired")
}

/// Phone verification sessions.
pub struct Sessions<'a> {
    pub(crate) transport: &'a Transport,
}

impl Sessions<'_> {
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

    /// Poll until the session reaches a terminal status.
    pub async fn wait_for_completion(
        &self,
        cancel: &CancelToken,
        id: &str,
        opts: Option<&WaitOptions>,
    ) -> Result<ApiObject> {
        poll_until_complete(
            cancel,
            move || self.retrieve(cancel, id),
            is_terminal_session_status,
            &format!("Session {id}"),
            opts,
        )
        .await
    }
}
