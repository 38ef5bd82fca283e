use bevy::prelude::Resource;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use mediagraph_core::{DetailRecord, GraphPayload, ModelInfo, ModelsRequest, NodeId, NodeKind, ScanRequest};

use crate::graph::layout::LayoutState;
use crate::graph::model::GraphModel;
use crate::graph::scan::{ScanAction, ScanController, ScanEvent};
use crate::graph::search::SearchState;
use crate::net::{Incoming, Outbound};
use crate::util::config::ViewerConfig;
use crate::util::debounce::Debounce;
use crate::util::ids;

const NOTICE_CAP: usize = 5;
const NOTICE_TTL: Duration = Duration::from_secs(8);

/// Form state for the scan controls. The api key and model settings ride
/// along in the start request when LLM analysis is enabled.
pub struct ScanForm {
    pub path: String,
    pub use_llm: bool,
    pub api_key: String,
    pub provider: String,
    pub model_id: String,
    pub base_url: String,
    pub models: Vec<ModelInfo>,
}

impl Default for ScanForm {
    fn default() -> Self {
        Self {
            path: String::new(),
            use_llm: false,
            api_key: String::new(),
            provider: "gemini".to_string(),
            model_id: String::new(),
            base_url: String::new(),
            models: Vec::new(),
        }
    }
}

pub struct UiState {
    pub scan_form: ScanForm,
    pub sim_threshold: f32,
    pub threshold_debounce: Debounce<f32>,
    /// Matched ids the camera should frame; taken by the camera system.
    pub fit_request: Option<Vec<NodeId>>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            scan_form: ScanForm::default(),
            sim_threshold: 0.7,
            threshold_debounce: Debounce::new(Duration::from_millis(300)),
            fit_request: None,
        }
    }
}

#[derive(Default)]
pub struct SelectionState {
    pub selected: Option<NodeId>,
    pub detail: Option<DetailRecord>,
    /// Node id the in-flight detail fetch was issued for; late responses
    /// for anything else are ignored.
    detail_pending: Option<NodeId>,
}

pub struct Notice {
    pub text: String,
    pub at: Instant,
}

/// All session state, owned by the event loop. Every mutation funnels
/// through the methods here; systems never poke the fields from outside.
#[derive(Resource)]
pub struct SessionState {
    pub model: GraphModel,
    pub scan: ScanController,
    pub search: SearchState,
    pub layout: LayoutState,
    pub selection: SelectionState,
    pub ui: UiState,
    pub notices: VecDeque<Notice>,
    pub backend_url: String,

    /// Sequence token of the newest issued graph refresh; responses carrying
    /// an older token are stale and discarded.
    refresh_seq: u64,
    outbound: Vec<Outbound>,

    pub needs_redraw: AtomicBool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            model: GraphModel::default(),
            scan: ScanController::default(),
            search: SearchState::default(),
            layout: LayoutState::default(),
            selection: SelectionState::default(),
            ui: UiState::default(),
            notices: VecDeque::new(),
            backend_url: "http://localhost:8001".to_string(),
            refresh_seq: 0,
            outbound: Vec::new(),
            needs_redraw: AtomicBool::new(true),
        }
    }
}

impl SessionState {
    pub fn apply_viewer_config(&mut self, cfg: &ViewerConfig) {
        self.backend_url = cfg.backend_url.clone();
        self.scan.poll_interval = Duration::from_millis(cfg.poll_interval_ms);
        self.ui.sim_threshold = cfg.sim_threshold.clamp(0.5, 1.0);
        self.ui
            .threshold_debounce
            .set_quiet(Duration::from_millis(cfg.debounce_ms));
        self.layout.algorithm = cfg.layout;
        self.layout.anim_duration = cfg.layout_anim_ms as f32 / 1000.0;
        self.layout.node_spacing = cfg.node_spacing;
        self.layout.link_distance = cfg.link_distance;
        self.layout.repulsion = cfg.repulsion;
        self.layout.damping = cfg.damping;
        self.layout.max_step = cfg.max_step;
    }

    /// Session start: one status probe (recovers a scan already in progress
    /// on the backend) plus the initial graph load.
    pub fn begin_session(&mut self) {
        self.outbound.push(Outbound::FetchProgress { probe: true });
        self.request_refresh();
    }

    // ----- Refresh orchestration -----

    pub fn request_refresh(&mut self) {
        let threshold = self.ui.sim_threshold.clamp(0.5, 1.0);
        self.refresh_seq += 1;
        self.outbound.push(Outbound::FetchGraph {
            threshold,
            seq: self.refresh_seq,
        });
    }

    fn apply_snapshot(&mut self, payload: GraphPayload) {
        let dropped = self.model.replace(payload);
        if dropped > 0 {
            tracing::warn!(dropped, "dropped edges referencing missing nodes");
        }

        if let Some(selected) = self.selection.selected.clone() {
            if !self.model.contains(&selected) {
                self.selection.selected = None;
                self.selection.detail = None;
                self.selection.detail_pending = None;
            }
        }

        self.search.reapply(&self.model);
        self.redraw();
    }

    // ----- Scan lifecycle -----

    pub fn request_start(&mut self, now: Instant) {
        let form = &self.ui.scan_form;
        let req = ScanRequest {
            path: form.path.trim().to_string(),
            use_llm: form.use_llm,
            api_key: form.api_key.clone(),
            provider: form.provider.clone(),
            model_id: form.model_id.clone(),
            base_url: form.base_url.clone(),
        };
        let actions = self.scan.handle(ScanEvent::StartRequested(req), now);
        self.run_scan_actions(actions);
    }

    pub fn request_stop(&mut self, now: Instant) {
        let actions = self.scan.handle(ScanEvent::StopRequested, now);
        self.run_scan_actions(actions);
    }

    pub fn request_reset(&mut self) {
        self.outbound.push(Outbound::ResetIndex);
    }

    pub fn request_models(&mut self) {
        let form = &self.ui.scan_form;
        self.outbound.push(Outbound::FetchModels(ModelsRequest {
            api_key: form.api_key.clone(),
            provider: form.provider.clone(),
            base_url: form.base_url.clone(),
        }));
    }

    fn run_scan_actions(&mut self, actions: Vec<ScanAction>) {
        for action in actions {
            match action {
                ScanAction::SendStart(req) => self.outbound.push(Outbound::StartScan(req)),
                ScanAction::SendStop => self.outbound.push(Outbound::StopScan),
                ScanAction::SendPoll => {
                    self.outbound.push(Outbound::FetchProgress { probe: false })
                }
                ScanAction::RefreshGraph => self.request_refresh(),
                ScanAction::Notify(text) => self.push_notice(text),
            }
        }
    }

    // ----- Search -----

    pub fn set_query(&mut self, query: &str) {
        if let Some(ids) = self.search.apply(query, &self.model) {
            self.ui.fit_request = Some(ids);
        }
        self.redraw();
    }

    // ----- Selection / detail -----

    pub fn select(&mut self, target: Option<NodeId>) {
        if self.selection.selected == target {
            return;
        }
        self.selection.selected = target.clone();
        self.selection.detail = None;
        self.selection.detail_pending = None;

        if let Some(id) = target {
            let kind = self.model.nodes.get(&id).map(|n| n.kind);
            if matches!(kind, Some(NodeKind::Image) | Some(NodeKind::Text)) {
                let entity = ids::entity_id(id.as_str()).map(str::to_string);
                if let Some(entity_id) = entity {
                    self.selection.detail_pending = Some(id.clone());
                    self.outbound.push(Outbound::FetchDetail {
                        node: id,
                        entity_id,
                    });
                }
            }
        }
        self.redraw();
    }

    /// Entity id behind the current detail record, for content URLs.
    pub fn detail_entity_id(&self) -> Option<String> {
        let selected = self.selection.selected.as_ref()?;
        self.selection.detail.as_ref()?;
        ids::entity_id(selected.as_str()).map(str::to_string)
    }

    // ----- Layout -----

    /// Frame-rate driven: re-runs the layout when the snapshot or the
    /// algorithm changed, then advances the animation/simulation.
    pub fn advance_layout(&mut self, dt: f32) {
        if self.layout.refresh_if_needed(&self.model) {
            self.redraw();
        }
        self.layout.step(&self.model, dt);
    }

    // ----- Timers -----

    /// Frame-rate driven: delivers a quiet debounced threshold and nudges
    /// the poll schedule.
    pub fn tick(&mut self, now: Instant) {
        if let Some(value) = self.ui.threshold_debounce.poll(now) {
            self.ui.sim_threshold = value.clamp(0.5, 1.0);
            self.request_refresh();
        }

        let actions = self.scan.handle(ScanEvent::PollTick, now);
        self.run_scan_actions(actions);

        while let Some(front) = self.notices.front() {
            if now.duration_since(front.at) > NOTICE_TTL {
                self.notices.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn submit_threshold(&mut self, value: f32, now: Instant) {
        self.ui.sim_threshold = value;
        self.ui.threshold_debounce.submit(value, now);
    }

    // ----- Inbound network results -----

    pub fn apply(&mut self, inc: Incoming, now: Instant) {
        match inc {
            Incoming::ScanStarted(Ok(())) => {
                let actions = self.scan.handle(ScanEvent::StartAccepted, now);
                self.run_scan_actions(actions);
            }
            Incoming::ScanStarted(Err(err)) => {
                let actions = self
                    .scan
                    .handle(ScanEvent::StartRejected(err.user_message()), now);
                self.run_scan_actions(actions);
            }
            Incoming::Progress {
                probe: false,
                result: Ok(progress),
            } => {
                let actions = self.scan.handle(ScanEvent::PollResult(progress), now);
                self.run_scan_actions(actions);
            }
            Incoming::Progress {
                probe: false,
                result: Err(err),
            } => {
                let actions = self
                    .scan
                    .handle(ScanEvent::PollFailed(err.to_string()), now);
                self.run_scan_actions(actions);
            }
            Incoming::Progress {
                probe: true,
                result: Ok(progress),
            } => {
                let actions = self.scan.handle(ScanEvent::ProbeResult(progress), now);
                self.run_scan_actions(actions);
            }
            Incoming::Progress {
                probe: true,
                result: Err(err),
            } => {
                tracing::debug!(error = %err, "startup status probe failed");
            }
            Incoming::Graph { seq, result } => {
                if seq != self.refresh_seq {
                    tracing::debug!(seq, latest = self.refresh_seq, "discarding stale graph response");
                    return;
                }
                match result {
                    Ok(payload) => self.apply_snapshot(payload),
                    Err(err) => {
                        self.push_notice(format!("graph refresh failed: {}", err.user_message()))
                    }
                }
            }
            Incoming::Detail { node, result } => {
                if self.selection.detail_pending.as_ref() != Some(&node) {
                    return;
                }
                self.selection.detail_pending = None;
                match result {
                    Ok(record) if self.selection.selected.as_ref() == Some(&node) => {
                        self.selection.detail = Some(record);
                    }
                    Ok(_) => {}
                    Err(err) => {
                        // No metadata shown, node stays selected.
                        tracing::debug!(node = %node, error = %err, "detail fetch failed");
                        self.selection.detail = None;
                    }
                }
            }
            Incoming::StopResult(Ok(())) => {}
            Incoming::StopResult(Err(err)) => {
                self.push_notice(format!("stop request failed: {}", err.user_message()));
            }
            Incoming::ResetResult(Ok(())) => {
                self.select(None);
                self.push_notice("index reset".to_string());
                self.request_refresh();
            }
            Incoming::ResetResult(Err(err)) => {
                self.push_notice(format!("reset failed: {}", err.user_message()));
            }
            Incoming::Models(Ok(models)) => {
                self.ui.scan_form.models = models;
            }
            Incoming::Models(Err(err)) => {
                self.push_notice(format!("model list failed: {}", err.user_message()));
            }
        }
    }

    // ----- Plumbing -----

    pub fn push_notice(&mut self, text: String) {
        tracing::warn!(%text, "notice");
        self.notices.push_back(Notice {
            text,
            at: Instant::now(),
        });
        while self.notices.len() > NOTICE_CAP {
            self.notices.pop_front();
        }
    }

    pub fn take_outbound(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbound)
    }

    pub fn redraw(&self) {
        self.needs_redraw.store(true, Ordering::Relaxed);
    }
}
