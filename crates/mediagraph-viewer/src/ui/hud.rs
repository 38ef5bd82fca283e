use bevy::prelude::Res;
use bevy_egui::{egui, EguiContexts};

use crate::graph::scan::ScanPhase;
use crate::graph::SessionState;
use crate::ui::PANEL_W;

pub fn hud_overlay(mut contexts: EguiContexts, st: Res<SessionState>) {
    let ctx = contexts.ctx_mut();
    let screen = ctx.screen_rect();
    let pos = egui::pos2(screen.min.x + PANEL_W + 16.0, screen.min.y + 8.0);

    egui::Area::new("hud".into())
        .order(egui::Order::Foreground)
        .fixed_pos(pos)
        .show(ctx, |ui| {
            ui.group(|ui| {
                let status = match st.scan.phase {
                    ScanPhase::Idle => "idle".to_string(),
                    ScanPhase::Starting => "starting...".to_string(),
                    ScanPhase::Scanning | ScanPhase::Completing => format!(
                        "scanning {} / {}",
                        st.scan.progress.processed, st.scan.progress.total
                    ),
                };
                ui.label(format!("Scan: {status}"));
                ui.label(format!(
                    "{} nodes / {} edges",
                    st.model.nodes.len(),
                    st.model.edges.len()
                ));
                if st.search.is_active() {
                    ui.label(format!("matches: {}", st.search.match_count()));
                }
            });
        });
}
