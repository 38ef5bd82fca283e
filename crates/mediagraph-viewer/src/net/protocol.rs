use mediagraph_core::{
    DetailRecord, GraphPayload, ModelInfo, ModelsRequest, NodeId, ScanProgress, ScanRequest,
};

use crate::net::http::NetError;

/// Commands the session sends to the net worker. One HTTP request each.
#[derive(Debug, Clone)]
pub enum Outbound {
    StartScan(ScanRequest),
    StopScan,
    /// `probe` marks the one-shot status check at session start, as opposed
    /// to a poll of an active scan.
    FetchProgress {
        probe: bool,
    },
    FetchGraph {
        threshold: f32,
        seq: u64,
    },
    FetchDetail {
        node: NodeId,
        entity_id: String,
    },
    ResetIndex,
    FetchModels(ModelsRequest),
}

/// Results delivered back to the session, drained once per frame.
#[derive(Debug)]
pub enum Incoming {
    ScanStarted(Result<(), NetError>),
    Progress {
        probe: bool,
        result: Result<ScanProgress, NetError>,
    },
    Graph {
        seq: u64,
        result: Result<GraphPayload, NetError>,
    },
    Detail {
        node: NodeId,
        result: Result<DetailRecord, NetError>,
    },
    StopResult(Result<(), NetError>),
    ResetResult(Result<(), NetError>),
    Models(Result<Vec<ModelInfo>, NetError>),
}
