// --- File: crates/reservo_client/src/api.rs ---
//! Transport between a picker and the booking server.
//!
//! Slot statuses returned here are hints for rendering. Only the result of a
//! hold or a reservation submit is authoritative.

use crate::error::ClientError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, Response};
use reservo_common::ErrorBody;
use reservo_config::ClientConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Booked,
    Held,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub time: String,
    pub label: String,
    pub status: SlotStatus,
    #[serde(default)]
    pub mine: bool,
}

impl Slot {
    /// Whether this session may pick the slot.
    pub fn is_selectable(&self) -> bool {
        self.status == SlotStatus::Available
    }
}

/// A hold or release for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRequest {
    pub date: NaiveDate,
    pub time: String,
    pub session_id: String,
    pub locale: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldReceipt {
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeslotAction<'a> {
    #[serde(flatten)]
    request: &'a SlotRequest,
    action: &'static str,
}

#[derive(Deserialize)]
struct TimeslotsResponse {
    slots: Vec<Slot>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlotApi: Send + Sync {
    async fn list_slots(&self, date: NaiveDate, session_id: String) -> Result<Vec<Slot>, ClientError>;

    async fn hold(&self, request: SlotRequest) -> Result<HoldReceipt, ClientError>;

    async fn release(&self, request: SlotRequest) -> Result<(), ClientError>;
}

/// `SlotApi` over the server's `/api/timeslots` endpoints.
#[derive(Debug, Clone)]
pub struct HttpSlotApi {
    client: Client,
    base_url: String,
}

impl HttpSlotApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(&config.base_url, Duration::from_secs(config.request_timeout_seconds))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let text = response.text().await?;
        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => Err(ClientError::from_error_body(status.as_u16(), body)),
            Err(_) => Err(ClientError::Rejected {
                status: status.as_u16(),
                code: status.canonical_reason().unwrap_or("error").to_lowercase(),
                message: text,
            }),
        }
    }

    async fn post_action<T: DeserializeOwned>(&self, request: &SlotRequest, action: &'static str) -> Result<T, ClientError> {
        debug!("POST timeslots {} {} {}", action, request.date, request.time);
        let response = self
            .client
            .post(self.url("/timeslots"))
            .json(&TimeslotAction { request, action })
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl SlotApi for HttpSlotApi {
    async fn list_slots(&self, date: NaiveDate, session_id: String) -> Result<Vec<Slot>, ClientError> {
        let response = self
            .client
            .get(self.url("/timeslots"))
            .query(&[("date", date.to_string()), ("sessionId", session_id)])
            .send()
            .await?;
        let body: TimeslotsResponse = Self::decode(response).await?;
        Ok(body.slots)
    }

    async fn hold(&self, request: SlotRequest) -> Result<HoldReceipt, ClientError> {
        self.post_action(&request, "hold").await
    }

    async fn release(&self, request: SlotRequest) -> Result<(), ClientError> {
        let _: HoldReceipt = self.post_action(&request, "release").await?;
        Ok(())
    }
}
