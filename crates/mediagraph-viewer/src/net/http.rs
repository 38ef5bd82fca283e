use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use mediagraph_core::{
    DetailRecord, GraphPayload, ModelInfo, ModelsRequest, ModelsResponse, ScanProgress,
    ScanRequest,
};

use crate::net::{Incoming, Outbound};

#[derive(Debug, Error)]
pub enum NetError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("backend rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<reqwest::Error> for NetError {
    fn from(err: reqwest::Error) -> Self {
        NetError::Transport(err.to_string())
    }
}

impl NetError {
    /// Rejections carry a backend reason worth showing verbatim; transport
    /// errors get a generic lead-in.
    pub fn user_message(&self) -> String {
        match self {
            NetError::Transport(_) => format!("backend unreachable: {self}"),
            NetError::Rejected { message, .. } if !message.is_empty() => message.clone(),
            NetError::Rejected { status, .. } => format!("backend returned status {status}"),
        }
    }
}

pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn checked(resp: reqwest::Response) -> Result<reqwest::Response, NetError> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(NetError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }

    pub async fn graph(&self, threshold: f32) -> Result<GraphPayload, NetError> {
        let resp = self
            .client
            .get(format!("{}/graph", self.base_url))
            .query(&[("sim_threshold", threshold)])
            .send()
            .await?;
        Ok(Self::checked(resp).await?.json().await?)
    }

    pub async fn progress(&self) -> Result<ScanProgress, NetError> {
        let resp = self
            .client
            .get(format!("{}/progress", self.base_url))
            .send()
            .await?;
        Ok(Self::checked(resp).await?.json().await?)
    }

    pub async fn start_scan(&self, req: &ScanRequest) -> Result<(), NetError> {
        let resp = self
            .client
            .post(format!("{}/scan", self.base_url))
            .json(req)
            .send()
            .await?;
        Self::checked(resp).await?;
        Ok(())
    }

    pub async fn stop_scan(&self) -> Result<(), NetError> {
        let resp = self
            .client
            .post(format!("{}/stop", self.base_url))
            .send()
            .await?;
        Self::checked(resp).await?;
        Ok(())
    }

    pub async fn reset(&self) -> Result<(), NetError> {
        let resp = self
            .client
            .post(format!("{}/reset", self.base_url))
            .send()
            .await?;
        Self::checked(resp).await?;
        Ok(())
    }

    pub async fn detail(&self, entity_id: &str) -> Result<DetailRecord, NetError> {
        let resp = self
            .client
            .get(format!("{}/image/{entity_id}", self.base_url))
            .send()
            .await?;
        Ok(Self::checked(resp).await?.json().await?)
    }

    pub async fn models(&self, req: &ModelsRequest) -> Result<Vec<ModelInfo>, NetError> {
        let resp = self
            .client
            .post(format!("{}/models", self.base_url))
            .json(req)
            .send()
            .await?;
        let body: ModelsResponse = Self::checked(resp).await?.json().await?;
        Ok(body.models)
    }

    /// Rendering attribute only; never fetched by the client itself.
    pub fn image_content_url(base_url: &str, entity_id: &str) -> String {
        format!("{}/image_content/{entity_id}", base_url.trim_end_matches('/'))
    }

    #[allow(dead_code)]
    pub fn thumbnail_url(base_url: &str, entity_id: &str) -> String {
        format!("{}/thumbnail/{entity_id}", base_url.trim_end_matches('/'))
    }
}

/// Runs the HTTP side on its own thread with its own runtime. Commands come
/// in over the tokio channel (send is non-blocking from the UI thread); each
/// command becomes one spawned request task so a slow graph fetch never
/// delays a progress poll. Results funnel back over the crossbeam channel
/// the UI drains once per frame. Dropping the sender ends the worker.
pub fn spawn_worker(client: BackendClient) -> (UnboundedSender<Outbound>, Receiver<Incoming>) {
    let (cmd_tx, mut cmd_rx) = unbounded_channel::<Outbound>();
    let (evt_tx, evt_rx) = crossbeam_channel::unbounded::<Incoming>();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
        rt.block_on(async move {
            let client = Arc::new(client);
            while let Some(cmd) = cmd_rx.recv().await {
                let client = Arc::clone(&client);
                let tx = evt_tx.clone();
                tokio::spawn(async move {
                    deliver(&tx, handle(&client, cmd).await);
                });
            }
        });
    });

    (cmd_tx, evt_rx)
}

fn deliver(tx: &Sender<Incoming>, msg: Incoming) {
    if tx.send(msg).is_err() {
        tracing::debug!("session gone, dropping net result");
    }
}

async fn handle(client: &BackendClient, cmd: Outbound) -> Incoming {
    match cmd {
        Outbound::StartScan(req) => Incoming::ScanStarted(client.start_scan(&req).await),
        Outbound::StopScan => Incoming::StopResult(client.stop_scan().await),
        Outbound::FetchProgress { probe } => Incoming::Progress {
            probe,
            result: client.progress().await,
        },
        Outbound::FetchGraph { threshold, seq } => Incoming::Graph {
            seq,
            result: client.graph(threshold).await,
        },
        Outbound::FetchDetail { node, entity_id } => Incoming::Detail {
            node,
            result: client.detail(&entity_id).await,
        },
        Outbound::ResetIndex => Incoming::ResetResult(client.reset().await),
        Outbound::FetchModels(req) => Incoming::Models(client.models(&req).await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_urls_are_keyed_by_entity_id() {
        assert_eq!(
            BackendClient::image_content_url("http://localhost:8001/", "42"),
            "http://localhost:8001/image_content/42"
        );
        assert_eq!(
            BackendClient::thumbnail_url("http://localhost:8001", "42"),
            "http://localhost:8001/thumbnail/42"
        );
    }

    #[test]
    fn rejection_message_prefers_backend_reason() {
        let err = NetError::Rejected {
            status: 400,
            message: "Invalid directory path".to_string(),
        };
        assert_eq!(err.user_message(), "Invalid directory path");

        let blank = NetError::Rejected {
            status: 409,
            message: String::new(),
        };
        assert_eq!(blank.user_message(), "backend returned status 409");
    }
}
