use bevy::prelude::ResMut;
use bevy_egui::{egui, EguiContexts};

use crate::graph::SessionState;

pub fn handle_shortcuts(mut contexts: EguiContexts, mut st: ResMut<SessionState>) {
    let ctx = contexts.ctx_mut();

    // Escape deselects from anywhere, text focus included.
    if ctx.input(|i| i.key_pressed(egui::Key::Escape)) && st.selection.selected.is_some() {
        st.select(None);
    }
}
