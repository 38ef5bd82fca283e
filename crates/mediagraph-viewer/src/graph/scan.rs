use std::time::{Duration, Instant};

use mediagraph_core::{ScanProgress, ScanRequest, ScanStatus};

/// Scan lifecycle. `Completing` is transient: the controller passes through
/// it while handling the finishing poll and settles in `Idle` before the
/// event returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanPhase {
    #[default]
    Idle,
    Starting,
    Scanning,
    Completing,
}

/// Discrete inbound events. Wall time enters only through `handle`'s `now`
/// argument, so the machine runs on synthetic clocks in tests.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    StartRequested(ScanRequest),
    StartAccepted,
    StartRejected(String),
    /// Periodic nudge from the frame loop; emits a poll only when one is due
    /// and none is in flight.
    PollTick,
    PollResult(ScanProgress),
    PollFailed(String),
    StopRequested,
    /// Result of the one-shot status probe at session start.
    ProbeResult(ScanProgress),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanAction {
    SendStart(ScanRequest),
    SendStop,
    SendPoll,
    RefreshGraph,
    Notify(String),
}

pub struct ScanController {
    pub phase: ScanPhase,
    pub progress: ScanProgress,
    pub poll_interval: Duration,
    poll_in_flight: bool,
    last_poll: Option<Instant>,
}

impl Default for ScanController {
    fn default() -> Self {
        Self {
            phase: ScanPhase::Idle,
            progress: ScanProgress::default(),
            poll_interval: Duration::from_millis(1000),
            poll_in_flight: false,
            last_poll: None,
        }
    }
}

impl ScanController {
    pub fn handle(&mut self, event: ScanEvent, now: Instant) -> Vec<ScanAction> {
        match event {
            ScanEvent::StartRequested(req) => self.on_start_requested(req),
            ScanEvent::StartAccepted => self.on_start_accepted(),
            ScanEvent::StartRejected(reason) => self.on_start_rejected(reason),
            ScanEvent::PollTick => self.on_poll_tick(now),
            ScanEvent::PollResult(progress) => self.on_poll_result(progress),
            ScanEvent::PollFailed(reason) => self.on_poll_failed(reason),
            ScanEvent::StopRequested => self.on_stop_requested(),
            ScanEvent::ProbeResult(progress) => self.on_probe_result(progress),
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase != ScanPhase::Idle
    }

    fn on_start_requested(&mut self, req: ScanRequest) -> Vec<ScanAction> {
        if self.phase != ScanPhase::Idle {
            return vec![ScanAction::Notify("a scan is already running".to_string())];
        }
        if req.path.trim().is_empty() {
            return vec![ScanAction::Notify("scan path is empty".to_string())];
        }
        self.phase = ScanPhase::Starting;
        vec![ScanAction::SendStart(req)]
    }

    fn on_start_accepted(&mut self) -> Vec<ScanAction> {
        if self.phase != ScanPhase::Starting {
            return Vec::new();
        }
        self.phase = ScanPhase::Scanning;
        self.progress = ScanProgress {
            status: ScanStatus::Scanning,
            ..ScanProgress::default()
        };
        // First poll is due immediately.
        self.poll_in_flight = false;
        self.last_poll = None;
        Vec::new()
    }

    fn on_start_rejected(&mut self, reason: String) -> Vec<ScanAction> {
        if self.phase != ScanPhase::Starting {
            return Vec::new();
        }
        self.phase = ScanPhase::Idle;
        vec![ScanAction::Notify(format!("scan failed to start: {reason}"))]
    }

    fn on_poll_tick(&mut self, now: Instant) -> Vec<ScanAction> {
        if self.phase != ScanPhase::Scanning || self.poll_in_flight {
            return Vec::new();
        }
        let due = self
            .last_poll
            .map_or(true, |at| now.duration_since(at) >= self.poll_interval);
        if !due {
            return Vec::new();
        }
        self.poll_in_flight = true;
        self.last_poll = Some(now);
        vec![ScanAction::SendPoll]
    }

    fn on_poll_result(&mut self, progress: ScanProgress) -> Vec<ScanAction> {
        self.poll_in_flight = false;
        // Latest poll wins, even if a stop raced it; the mirror stays fresh.
        let finished = progress.status == ScanStatus::Idle
            && progress.total > 0
            && progress.processed == progress.total;
        self.progress = progress;

        if self.phase != ScanPhase::Scanning || !finished {
            return Vec::new();
        }

        self.phase = ScanPhase::Completing;
        self.phase = ScanPhase::Idle;
        vec![ScanAction::RefreshGraph]
    }

    fn on_poll_failed(&mut self, reason: String) -> Vec<ScanAction> {
        self.poll_in_flight = false;
        // Transient: the next tick retries. Never treated as completion.
        tracing::warn!(%reason, "scan status poll failed");
        Vec::new()
    }

    fn on_stop_requested(&mut self) -> Vec<ScanAction> {
        if self.phase != ScanPhase::Scanning {
            return Vec::new();
        }
        self.phase = ScanPhase::Idle;
        vec![ScanAction::SendStop]
    }

    fn on_probe_result(&mut self, progress: ScanProgress) -> Vec<ScanAction> {
        // Recovers an in-progress scan after a session restart. A probe that
        // shows a finished or idle backend changes nothing: the initial load
        // fetches the graph anyway.
        if self.phase == ScanPhase::Idle && progress.status == ScanStatus::Scanning {
            self.phase = ScanPhase::Scanning;
            self.progress = progress;
            self.poll_in_flight = false;
            self.last_poll = None;
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanning(processed: u64, total: u64) -> ScanProgress {
        ScanProgress {
            status: ScanStatus::Scanning,
            current: String::new(),
            processed,
            total,
            logs: Vec::new(),
        }
    }

    fn idle(processed: u64, total: u64) -> ScanProgress {
        ScanProgress {
            status: ScanStatus::Idle,
            current: String::new(),
            processed,
            total,
            logs: Vec::new(),
        }
    }

    fn request(path: &str) -> ScanRequest {
        ScanRequest {
            path: path.to_string(),
            ..ScanRequest::default()
        }
    }

    fn start_scanning(ctl: &mut ScanController, now: Instant) {
        let actions = ctl.handle(ScanEvent::StartRequested(request("/photos")), now);
        assert_eq!(actions, vec![ScanAction::SendStart(request("/photos"))]);
        assert!(ctl.handle(ScanEvent::StartAccepted, now).is_empty());
        assert_eq!(ctl.phase, ScanPhase::Scanning);
    }

    #[test]
    fn completion_triggers_exactly_one_refresh() {
        let mut ctl = ScanController::default();
        let now = Instant::now();
        start_scanning(&mut ctl, now);

        assert_eq!(ctl.handle(ScanEvent::PollTick, now), vec![ScanAction::SendPoll]);
        assert!(ctl.handle(ScanEvent::PollResult(scanning(3, 10)), now).is_empty());
        assert_eq!(ctl.progress.processed, 3);

        let now = now + Duration::from_secs(1);
        assert_eq!(ctl.handle(ScanEvent::PollTick, now), vec![ScanAction::SendPoll]);
        let actions = ctl.handle(ScanEvent::PollResult(idle(10, 10)), now);

        assert_eq!(actions, vec![ScanAction::RefreshGraph]);
        assert_eq!(ctl.phase, ScanPhase::Idle);
        // Nothing further fires once idle.
        assert!(ctl.handle(ScanEvent::PollTick, now + Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn completion_requires_idle_and_full_count() {
        let mut ctl = ScanController::default();
        let now = Instant::now();
        start_scanning(&mut ctl, now);

        // Still scanning, counts equal: not finished.
        assert!(ctl.handle(ScanEvent::PollResult(scanning(10, 10)), now).is_empty());
        assert_eq!(ctl.phase, ScanPhase::Scanning);

        // Idle but zero total: not finished either.
        assert!(ctl.handle(ScanEvent::PollResult(idle(0, 0)), now).is_empty());
        assert_eq!(ctl.phase, ScanPhase::Scanning);
    }

    #[test]
    fn poll_errors_never_complete_or_change_phase() {
        let mut ctl = ScanController::default();
        let now = Instant::now();
        start_scanning(&mut ctl, now);

        assert_eq!(ctl.handle(ScanEvent::PollTick, now), vec![ScanAction::SendPoll]);
        assert!(ctl
            .handle(ScanEvent::PollFailed("timeout".to_string()), now)
            .is_empty());
        assert_eq!(ctl.phase, ScanPhase::Scanning);

        // The next due tick retries.
        let later = now + Duration::from_secs(2);
        assert_eq!(ctl.handle(ScanEvent::PollTick, later), vec![ScanAction::SendPoll]);
    }

    #[test]
    fn polls_are_serialized_never_overlapped() {
        let mut ctl = ScanController::default();
        let now = Instant::now();
        start_scanning(&mut ctl, now);

        assert_eq!(ctl.handle(ScanEvent::PollTick, now), vec![ScanAction::SendPoll]);
        // In flight: ticks do nothing, however overdue.
        assert!(ctl.handle(ScanEvent::PollTick, now + Duration::from_secs(30)).is_empty());

        // Resolution re-arms the interval.
        let later = now + Duration::from_secs(30);
        assert!(ctl.handle(ScanEvent::PollResult(scanning(1, 4)), later).is_empty());
        assert_eq!(
            ctl.handle(ScanEvent::PollTick, later + Duration::from_secs(1)),
            vec![ScanAction::SendPoll]
        );
    }

    #[test]
    fn poll_interval_is_respected() {
        let mut ctl = ScanController::default();
        let now = Instant::now();
        start_scanning(&mut ctl, now);

        assert_eq!(ctl.handle(ScanEvent::PollTick, now), vec![ScanAction::SendPoll]);
        assert!(ctl.handle(ScanEvent::PollResult(scanning(1, 4)), now).is_empty());

        // Same instant: previous poll just resolved, interval not yet over.
        assert!(ctl.handle(ScanEvent::PollTick, now).is_empty());
        assert_eq!(
            ctl.handle(ScanEvent::PollTick, now + Duration::from_millis(1000)),
            vec![ScanAction::SendPoll]
        );
    }

    #[test]
    fn rejected_start_rolls_back_to_idle_without_polling() {
        let mut ctl = ScanController::default();
        let now = Instant::now();

        let actions = ctl.handle(ScanEvent::StartRequested(request("/photos")), now);
        assert_eq!(actions.len(), 1);
        assert_eq!(ctl.phase, ScanPhase::Starting);

        let actions = ctl.handle(
            ScanEvent::StartRejected("API key required".to_string()),
            now,
        );
        assert!(matches!(actions.as_slice(), [ScanAction::Notify(_)]));
        assert_eq!(ctl.phase, ScanPhase::Idle);
        assert!(ctl.handle(ScanEvent::PollTick, now + Duration::from_secs(2)).is_empty());
    }

    #[test]
    fn empty_path_is_refused_locally() {
        let mut ctl = ScanController::default();
        let actions = ctl.handle(ScanEvent::StartRequested(request("  ")), Instant::now());
        assert!(matches!(actions.as_slice(), [ScanAction::Notify(_)]));
        assert_eq!(ctl.phase, ScanPhase::Idle);
    }

    #[test]
    fn stop_leaves_scanning_immediately() {
        let mut ctl = ScanController::default();
        let now = Instant::now();
        start_scanning(&mut ctl, now);

        assert_eq!(ctl.handle(ScanEvent::StopRequested, now), vec![ScanAction::SendStop]);
        assert_eq!(ctl.phase, ScanPhase::Idle);

        // A straggler poll result must not resurrect the scan or refresh.
        assert!(ctl.handle(ScanEvent::PollResult(idle(10, 10)), now).is_empty());
        assert_eq!(ctl.phase, ScanPhase::Idle);
    }

    #[test]
    fn stop_is_ignored_before_the_job_is_accepted() {
        let mut ctl = ScanController::default();
        let now = Instant::now();
        ctl.handle(ScanEvent::StartRequested(request("/photos")), now);
        assert_eq!(ctl.phase, ScanPhase::Starting);

        assert!(ctl.handle(ScanEvent::StopRequested, now).is_empty());
        assert_eq!(ctl.phase, ScanPhase::Starting);
    }

    #[test]
    fn probe_recovers_a_running_scan() {
        let mut ctl = ScanController::default();
        let now = Instant::now();

        assert!(ctl.handle(ScanEvent::ProbeResult(scanning(5, 9)), now).is_empty());
        assert_eq!(ctl.phase, ScanPhase::Scanning);
        assert_eq!(ctl.progress.processed, 5);
        assert_eq!(ctl.handle(ScanEvent::PollTick, now), vec![ScanAction::SendPoll]);
    }

    #[test]
    fn probe_of_a_finished_backend_does_not_refresh() {
        let mut ctl = ScanController::default();
        let actions = ctl.handle(ScanEvent::ProbeResult(idle(10, 10)), Instant::now());
        assert!(actions.is_empty());
        assert_eq!(ctl.phase, ScanPhase::Idle);
    }

    #[test]
    fn start_while_active_is_refused() {
        let mut ctl = ScanController::default();
        let now = Instant::now();
        start_scanning(&mut ctl, now);

        let actions = ctl.handle(ScanEvent::StartRequested(request("/other")), now);
        assert!(matches!(actions.as_slice(), [ScanAction::Notify(_)]));
        assert_eq!(ctl.phase, ScanPhase::Scanning);
    }
}
