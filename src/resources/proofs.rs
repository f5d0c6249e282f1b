use serde::Serialize;

use super::segment;
use crate::cancel::CancelToken;
use crate::errors::Result;
use crate::models::ApiObject;
use crate::transport::Transport;

const BASE: &str = "/api/v1/proofs";

#[derive(Serialize)]
struct ValidateBody<'a> {
    proof_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    identifier: Option<&'a str>,
}

#[derive(Serialize)]
struct RevokeBody<'a> {
    reason: &'a str,
}

/// Issued proofs: online validation and revocation.
pub struct Proofs<'a> {
    pub(crate) transport: &'a Transport,
}

impl Proofs<'_> {
    /// Validate a proof token online, including its revocation status.
    pub async fn validate(
        &self,
        cancel: &CancelToken,
        proof_token: &str,
        identifier: Option<&str>,
    ) -> Result<ApiObject> {
        let body = ValidateBody {
            proof_token,
            identifier: identifier.filter(|s| !s.is_empty()),
        };
        self.transport
            .post(cancel, &format!("{BASE}/validate"), &body)
            .await
    }

    /// Revoke the proof issued for verification `id`.
    pub async fn revoke(
        &self,
        cancel: &CancelToken,
        id: &str,
        reason: Option<&str>,
    ) -> Result<ApiObject> {
        let body = reason
            .filter(|r| !r.is_empty())
            .map(|reason| RevokeBody { reason });
        self.transport
            .post(cancel, &format!("{BASE}/{}/revoke", segment(id)), &body)
            .await
    }

    pub async fn status(&self, cancel: &CancelToken, id: &str) -> Result<ApiObject> {
        self.transport
            .get(cancel, &format!("{BASE}/{}/status", segment(id)), &[])
            .await
    }

    /// The revocation list.
    pub async fn list_revoked(&self, cancel: &CancelToken) -> Result<ApiObject> {
        self.transport
            .get(cancel, &format!("{BASE}/revoked"), &[])
            .await
    }
}
