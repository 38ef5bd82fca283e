pub mod hud;
pub mod panel;
pub mod shortcuts;

pub use hud::hud_overlay;
pub use panel::ui_panel;
pub use shortcuts::handle_shortcuts;

pub const PANEL_W: f32 = 340.0;
