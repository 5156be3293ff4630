//! Best-effort publication of battle events on the realtime broadcast API.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    dao::models::BattleId,
    dto::broadcast::{BattleEvent, BroadcastEnvelope},
    services::token_issuer::TokenIssuer,
};

/// Path of the broadcast endpoint relative to the project URL.
pub const BROADCAST_PATH: &str = "/realtime/v1/api/broadcast";
/// Upper bound for one publish call.
pub const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);
const CLIENT_INFO: &str = "battle-orchestrator-broadcast";

/// Destination for battle events.
///
/// Publishing never fails loudly: the returned flag only tells whether the
/// receiver acknowledged the message. Clients that miss an event reconcile via
/// the pull endpoints.
pub trait EventSink: Send + Sync {
    /// Publish `payload` as `event` on the channel of `battle_id`.
    fn publish(
        &self,
        battle_id: &BattleId,
        event: BattleEvent,
        payload: Value,
    ) -> BoxFuture<'static, bool>;
}

/// [`EventSink`] posting envelopes to the realtime REST API.
#[derive(Clone)]
pub struct RealtimeBroadcaster {
    client: Client,
    endpoint: Arc<str>,
    api_key: Arc<str>,
    project_ref: Option<Arc<str>>,
    tokens: Arc<TokenIssuer>,
}

impl RealtimeBroadcaster {
    /// Build a broadcaster for the project at `base_url`.
    pub fn new(
        base_url: &str,
        api_key: &str,
        tokens: Arc<TokenIssuer>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(PUBLISH_TIMEOUT).build()?;
        let base_url = base_url.trim_end_matches('/');
        let project_ref = base_url
            .split("//")
            .nth(1)
            .and_then(|host| host.split('.').next())
            .filter(|value| !value.is_empty())
            .map(Arc::<str>::from);

        Ok(Self {
            client,
            endpoint: Arc::<str>::from(format!("{base_url}{BROADCAST_PATH}")),
            api_key: Arc::<str>::from(api_key),
            project_ref,
            tokens,
        })
    }

    async fn send(&self, battle_id: BattleId, event: BattleEvent, payload: Value) -> bool {
        let envelope = BroadcastEnvelope::new(&battle_id, event, payload);

        let token = match self.tokens.issue() {
            Ok(token) => token,
            Err(err) => {
                error!(%battle_id, %event, error = %err, "cannot mint broadcast token");
                return false;
            }
        };

        let mut request = self
            .client
            .post(self.endpoint.as_ref())
            .header("apikey", self.api_key.as_ref())
            .header("x-client-info", CLIENT_INFO)
            .bearer_auth(token.as_str())
            .json(&envelope);
        if let Some(project_ref) = &self.project_ref {
            request = request.header("x-project-ref", project_ref.as_ref());
        }

        debug!(%battle_id, %event, "publishing battle event");
        match request.send().await {
            Ok(response) if response.status().is_success() => {
                info!(%battle_id, %event, status = %response.status(), "broadcast delivered");
                true
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(%battle_id, %event, %status, %body, "broadcast rejected");
                false
            }
            Err(err) if err.is_timeout() => {
                warn!(%battle_id, %event, error = %err, "broadcast timed out");
                false
            }
            Err(err) => {
                warn!(%battle_id, %event, error = %err, "broadcast failed");
                false
            }
        }
    }
}

impl EventSink for RealtimeBroadcaster {
    fn publish(
        &self,
        battle_id: &BattleId,
        event: BattleEvent,
        payload: Value,
    ) -> BoxFuture<'static, bool> {
        let broadcaster = self.clone();
        let battle_id = battle_id.clone();
        Box::pin(async move { broadcaster.send(battle_id, event, payload).await })
    }
}
