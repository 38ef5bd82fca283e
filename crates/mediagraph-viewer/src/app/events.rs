use bevy::prelude::Event;
use mediagraph_core::NodeId;

/// Click pick result. `None` is an empty-canvas tap (deselect).
#[derive(Event)]
pub struct Picked(pub Option<NodeId>);
