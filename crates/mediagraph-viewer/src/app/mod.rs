use std::time::Instant;

use bevy::prelude::*;

use crate::app::events::Picked;
use crate::app::resources::{NetRx, NetTx};
use crate::graph::SessionState;
use crate::{render, ui};

pub mod events;
pub mod resources;

pub struct ViewerPlugin;

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<Picked>()
            .add_systems(Startup, (render::setup_scene, bootstrap))
            .add_systems(
                Update,
                (
                    pump_network,
                    tick_session,
                    ui::handle_shortcuts,
                    ui::ui_panel,
                    ui::hud_overlay,
                    render::picking,
                    render::apply_picked,
                    update_layout,
                    render::sync_node_transforms,
                    render::draw_scene,
                    render::apply_camera_fit,
                    render::advance_camera_tween,
                    flush_outbound,
                )
                    .chain(),
            );
    }
}

fn bootstrap(mut st: ResMut<SessionState>) {
    st.begin_session();
}

fn pump_network(mut st: ResMut<SessionState>, rx: Res<NetRx>) {
    let now = Instant::now();
    for msg in rx.0.try_iter().take(100_000) {
        st.apply(msg, now);
    }
}

fn tick_session(mut st: ResMut<SessionState>) {
    st.tick(Instant::now());
}

fn update_layout(time: Res<Time>, mut st: ResMut<SessionState>) {
    let dt = time.delta_seconds().min(0.033);
    st.advance_layout(dt);
}

fn flush_outbound(mut st: ResMut<SessionState>, tx: Res<NetTx>) {
    for cmd in st.take_outbound() {
        if tx.0.send(cmd).is_err() {
            tracing::warn!("net worker is gone, dropping command");
        }
    }
}
