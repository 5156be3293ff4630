use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;

use crate::dao::{
    battle_store::BattleStore,
    models::{
        BattleId, BattleStatus, Leaderboard, Participant, Question, QuestionStats, RowSet,
    },
    storage::StorageResult,
};

use super::{
    config::SupabaseConfig,
    error::{SupabaseError, SupabaseResult},
    rows::{
        BattleArgs, JOINED, NextQuestionArgs, PARTICIPANT_COLUMNS, PARTICIPANTS_TABLE,
        RPC_FIRST_QUESTION, RPC_LEADERBOARD, RPC_NEXT_QUESTION, RPC_STATS, SCHEDULE_TABLE,
        StatsArgs, StatusPatch, StatusRow, decode_all, decode_first,
    },
};

/// Battle store backed by the PostgREST endpoints of a Supabase project.
#[derive(Clone)]
pub struct SupabaseBattleStore {
    client: Client,
    base_url: Arc<str>,
    service_key: Arc<str>,
}

impl SupabaseBattleStore {
    /// Build the HTTP client used for every store call.
    pub fn connect(config: SupabaseConfig) -> SupabaseResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| SupabaseError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            service_key: Arc::<str>::from(config.service_key),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, path);
        self.client
            .request(method, url)
            .header("apikey", self.service_key.as_ref())
            .bearer_auth(self.service_key.as_ref())
    }

    async fn send(&self, path: &str, builder: reqwest::RequestBuilder) -> SupabaseResult<Value> {
        let response = builder
            .send()
            .await
            .map_err(|source| SupabaseError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupabaseError::RequestStatus {
                path: path.to_string(),
                status,
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| SupabaseError::DecodeResponse {
                path: path.to_string(),
                source,
            })?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|source| SupabaseError::DeserializeRow {
            path: path.to_string(),
            source,
        })
    }

    async fn rpc<A>(&self, function: &str, args: &A) -> SupabaseResult<Value>
    where
        A: ?Sized + Serialize,
    {
        let path = format!("rpc/{function}");
        let builder = self.request(Method::POST, &path).json(args);
        self.send(&path, builder).await
    }

    async fn participants(&self, battle_id: &str) -> SupabaseResult<Vec<Participant>> {
        let battle_filter = format!("eq.{battle_id}");
        let status_filter = format!("eq.{JOINED}");
        let builder = self.request(Method::GET, PARTICIPANTS_TABLE).query(&[
            ("select", PARTICIPANT_COLUMNS),
            ("battle_id", battle_filter.as_str()),
            ("status", status_filter.as_str()),
        ]);
        let payload = self.send(PARTICIPANTS_TABLE, builder).await?;
        decode_all(PARTICIPANTS_TABLE, payload)
    }

    async fn status(&self, battle_id: &str) -> SupabaseResult<Option<BattleStatus>> {
        let battle_filter = format!("eq.{battle_id}");
        let builder = self
            .request(Method::GET, SCHEDULE_TABLE)
            .query(&[("select", "status"), ("battle_id", battle_filter.as_str())]);
        let payload = self.send(SCHEDULE_TABLE, builder).await?;
        let row = decode_first::<StatusRow>(SCHEDULE_TABLE, payload)?;
        Ok(row.map(StatusRow::into_status))
    }

    async fn update_status(&self, battle_id: &str, status: BattleStatus) -> SupabaseResult<()> {
        let battle_filter = format!("eq.{battle_id}");
        let builder = self
            .request(Method::PATCH, SCHEDULE_TABLE)
            .query(&[("battle_id", battle_filter.as_str())])
            .json(&StatusPatch {
                status: status.as_str(),
            });
        self.send(SCHEDULE_TABLE, builder).await.map(|_| ())
    }

    async fn first_question(&self, battle_id: &str) -> SupabaseResult<Option<Question>> {
        let payload = self
            .rpc(RPC_FIRST_QUESTION, &BattleArgs { battle_id_input: battle_id })
            .await?;
        decode_first(RPC_FIRST_QUESTION, payload)
    }

    async fn next_question(&self, battle_id: &str, after: i64) -> SupabaseResult<Option<Question>> {
        let args = NextQuestionArgs {
            battle_id_input: battle_id,
            react_order_input: after,
        };
        let payload = self.rpc(RPC_NEXT_QUESTION, &args).await?;
        decode_first(RPC_NEXT_QUESTION, payload)
    }

    async fn stats(&self, question_id: &str) -> SupabaseResult<Option<QuestionStats>> {
        let payload = self
            .rpc(RPC_STATS, &StatsArgs { mcq_id_input: question_id })
            .await?;
        decode_first(RPC_STATS, payload)
    }

    async fn stats_rows(&self, question_id: &str) -> SupabaseResult<RowSet> {
        let payload = self
            .rpc(RPC_STATS, &StatsArgs { mcq_id_input: question_id })
            .await?;
        decode_all(RPC_STATS, payload).map(RowSet)
    }

    async fn leaderboard_rows(&self, battle_id: &str) -> SupabaseResult<RowSet> {
        let payload = self
            .rpc(RPC_LEADERBOARD, &BattleArgs { battle_id_input: battle_id })
            .await?;
        decode_all(RPC_LEADERBOARD, payload).map(RowSet)
    }

    async fn leaderboard(&self, battle_id: &str) -> SupabaseResult<Option<Leaderboard>> {
        let payload = self
            .rpc(RPC_LEADERBOARD, &BattleArgs { battle_id_input: battle_id })
            .await?;
        decode_first(RPC_LEADERBOARD, payload)
    }

    async fn ping(&self) -> SupabaseResult<()> {
        let builder = self
            .request(Method::GET, SCHEDULE_TABLE)
            .query(&[("select", "battle_id"), ("limit", "1")]);
        self.send(SCHEDULE_TABLE, builder).await.map(|_| ())
    }
}

impl BattleStore for SupabaseBattleStore {
    fn fetch_participants(
        &self,
        battle_id: &BattleId,
    ) -> BoxFuture<'static, StorageResult<Vec<Participant>>> {
        let store = self.clone();
        let battle_id = battle_id.clone();
        Box::pin(async move {
            store
                .participants(battle_id.as_str())
                .await
                .map_err(Into::into)
        })
    }

    fn fetch_status(
        &self,
        battle_id: &BattleId,
    ) -> BoxFuture<'static, StorageResult<Option<BattleStatus>>> {
        let store = self.clone();
        let battle_id = battle_id.clone();
        Box::pin(async move { store.status(battle_id.as_str()).await.map_err(Into::into) })
    }

    fn set_status(
        &self,
        battle_id: &BattleId,
        status: BattleStatus,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let battle_id = battle_id.clone();
        Box::pin(async move {
            store
                .update_status(battle_id.as_str(), status)
                .await
                .map_err(Into::into)
        })
    }

    fn fetch_first_question(
        &self,
        battle_id: &BattleId,
    ) -> BoxFuture<'static, StorageResult<Option<Question>>> {
        let store = self.clone();
        let battle_id = battle_id.clone();
        Box::pin(async move {
            store
                .first_question(battle_id.as_str())
                .await
                .map_err(Into::into)
        })
    }

    fn fetch_stats(
        &self,
        question_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<QuestionStats>>> {
        let store = self.clone();
        let question_id = question_id.to_string();
        Box::pin(async move { store.stats(&question_id).await.map_err(Into::into) })
    }

    fn fetch_stats_rows(&self, question_id: &str) -> BoxFuture<'static, StorageResult<RowSet>> {
        let store = self.clone();
        let question_id = question_id.to_string();
        Box::pin(async move { store.stats_rows(&question_id).await.map_err(Into::into) })
    }

    fn fetch_leaderboard_rows(
        &self,
        battle_id: &BattleId,
    ) -> BoxFuture<'static, StorageResult<RowSet>> {
        let store = self.clone();
        let battle_id = battle_id.clone();
        Box::pin(async move {
            store
                .leaderboard_rows(battle_id.as_str())
                .await
                .map_err(Into::into)
        })
    }

    fn fetch_leaderboard(
        &self,
        battle_id: &BattleId,
    ) -> BoxFuture<'static, StorageResult<Option<Leaderboard>>> {
        let store = self.clone();
        let battle_id = battle_id.clone();
        Box::pin(async move {
            store
                .leaderboard(battle_id.as_str())
                .await
                .map_err(Into::into)
        })
    }

    fn fetch_next_question(
        &self,
        battle_id: &BattleId,
        after: i64,
    ) -> BoxFuture<'static, StorageResult<Option<Question>>> {
        let store = self.clone();
        let battle_id = battle_id.clone();
        Box::pin(async move {
            store
                .next_question(battle_id.as_str(), after)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }
}
