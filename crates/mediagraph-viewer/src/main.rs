mod app;
mod graph;
mod net;
mod render;
mod ui;
mod util;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;

use app::resources::{NetRx, NetTx};
use graph::SessionState;
use net::BackendClient;
use render::CameraCtl;
use util::config;

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn main() {
    init_tracing();
    let cfg = config::load_or_default();
    tracing::info!(backend = %cfg.backend_url, "starting viewer");

    let (tx, rx) = net::spawn_worker(BackendClient::new(&cfg.backend_url));

    let mut session = SessionState::default();
    session.apply_viewer_config(&cfg);

    let camera = CameraCtl::new(
        cfg.camera_zoom_cap,
        cfg.camera_anim_ms as f32 / 1000.0,
    );

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "MediaGraph".into(),
                        ..default()
                    }),
                    ..default()
                })
                // The viewer installs its own tracing subscriber.
                .disable::<LogPlugin>(),
        )
        .add_plugins(EguiPlugin)
        .insert_resource(NetTx(tx))
        .insert_resource(NetRx(rx))
        .insert_resource(session)
        .insert_resource(camera)
        .add_plugins(app::ViewerPlugin)
        .run();
}
