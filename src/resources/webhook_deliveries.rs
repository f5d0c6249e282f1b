use super::segment;
use crate::cancel::CancelToken;
use crate::errors::Result;
use crate::models::{ApiObject, Query};
use crate::transport::Transport;

const BASE: &str = "/api/v1/webhook-deliveries";

/// Outbound webhook delivery log.
pub struct WebhookDeliveries<'a> {
    pub(crate) transport: &'a Transport,
}

impl WebhookDeliveries<'_> {
    pub async fn list(&self, cancel: &CancelToken, params: &Query<'_>) -> Result<ApiObject> {
        self.transport.get(cancel, BASE, params).await
    }

    pub async fn retrieve(&self, cancel: &CancelToken, id: &str) -> Result<ApiObject> {
        self.transport
            .get(cancel, &format!("{BASE}/{}", segment(id)), &[])
            .await
    }

    /// Re-send a failed delivery.
    pub async fn retry(&self, cancel: &CancelToken, id: &str) -> Result<ApiObject> {
        self.transport
            .post(cancel, &format!("{BASE}/{}/retry", segment(id)), &())
            .await
    }

    /// Aggregate delivery counts.
    pub async fn stats(&self, cancel: &CancelToken) -> Result<ApiObject> {
        self.transport
            .get(cancel, &format!("{BASE}/stats"), &[])
            .await
    }
}
