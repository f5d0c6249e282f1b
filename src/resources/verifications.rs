use serde::Serialize;
use serde_json::json;

use super::segment;
use crate::cancel::CancelToken;
use crate::errors::Result;
use crate::models::{ApiObject, Query};
use crate::polling::{poll_until_complete, WaitOptions};
use crate::transport::Transport;

const BASE: &str = "/api/v1/verifications";

/// `verified`, `failed`, `expired`, or `revoked`.
pub fn is_terminal_verification_status(status: &str) -> bool {
    matches!(status, "verified" | "failed" | "expired" | "revoked")
}

/// Verifications API.
pub struct Verifications<'a> {
    pub(crate) transport: &'a Transport,
}

impl Verifications<'_> {
    /// Start a new verification.
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

    /// List verifications, filtered by `params` (e.g. `status`, `limit`).
    pub async fn list(&self, cancel: &CancelToken, params: &Query<'_>) -> Result<ApiObject> {
        self.transport.get(cancel, BASE, params).await
    }

    /// Trigger a DNS/HTTP verification check.
    pub async fn verify(&self, cancel: &CancelToken, id: &str) -> Result<ApiObject> {
        self.action(cancel, id, "verify").await
    }

    /// Submit an OTP or challenge code.
    pub async fn submit(&self, cancel: &CancelToken, id: &str, code: &str) -> Result<ApiObject> {
        self.transport
            .post(
                cancel,
                &format!("{BASE}/{}/submit", segment(id)),
                &json!({ "code": code }),
            )
            .await
    }

    /// Resend the verification email. Email channel only.
    pub async fn resend(&self, cancel: &CancelToken, id: &str) -> Result<ApiObject> {
        self.action(cancel, id, "resend").await
    }

    /// Auto-complete a verification. Test-mode keys (`pk_test_*`) only.
    pub async fn test_verify(&self, cancel: &CancelToken, id: &str) -> Result<ApiObject> {
        self.action(cancel, id, "test-verify").await
    }

    /// Verified users grouped by `external_user_id`.
    pub async fn list_verified_users(
        &self,
        cancel: &CancelToken,
        params: &Query<'_>,
    ) -> Result<ApiObject> {
        self.transport
            .get(cancel, &format!("{BASE}/users"), params)
            .await
    }

    pub async fn get_verified_user(
        &self,
        cancel: &CancelToken,
        external_user_id: &str,
    ) -> Result<ApiObject> {
        self.transport
            .get(
                cancel,
                &format!("{BASE}/users/{}", segment(external_user_id)),
                &[],
            )
            .await
    }

    /// Start a B2B domain verification.
    pub async fn start_domain_verification<B>(
        &self,
        cancel: &CancelToken,
        params: &B,
    ) -> Result<ApiObject>
    where
        B: Serialize + ?Sized,
    {
        self.transport
            .post(cancel, &format!("{BASE}/domain"), params)
            .await
    }

    /// Check a pending domain verification (DNS record or HTTP file).
    pub async fn check_domain_verification(
        &self,
        cancel: &CancelToken,
        id: &str,
    ) -> Result<ApiObject> {
        self.transport
            .post(cancel, &format!("{BASE}/domain/{}/check", segment(id)), &())
            .await
    }

    /// Poll until the verification reaches a terminal status.
    pub async fn wait_for_completion(
        &self,
        cancel: &CancelToken,
        id: &str,
        opts: Option<&WaitOptions>,
    ) -> Result<ApiObject> {
        poll_until_complete(
            cancel,
            move || self.retrieve(cancel, id),
            is_terminal_verification_status,
            &format!("Verification {id}"),
            opts,
        )
        .await
    }

    async fn action(&self, cancel: &CancelToken, id: &str, action: &str) -> Result<ApiObject> {
        self.transport
            .post(cancel, &format!("{BASE}/{}/{action}", segment(id)), &())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        for s in ["verified", "failed", "expired", "revoked"] {
            assert!(is_terminal_verification_status(s), "{s}");
        }
        for s in ["pending", "", "completed"] {
            assert!(!is_terminal_verification_status(s), "{s}");
        }
    }
}
