pub mod camera;

use std::collections::HashMap;
use std::sync::atomic::Ordering;

use bevy::prelude::*;
use bevy_egui::EguiContexts;

use mediagraph_core::{EdgeKind, NodeId, NodeKind};

use crate::app::events::Picked;
use crate::graph::search::Emphasis;
use crate::graph::SessionState;

pub use camera::{advance_camera_tween, apply_camera_fit, setup_scene, CameraCtl};

#[derive(Component)]
pub struct NodeMarker {
    pub id: NodeId,
}

const PICK_RADIUS: f32 = 14.0;

/// Left click picks the nearest node within reach on screen; a miss is an
/// empty-canvas tap and clears the selection.
pub fn picking(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window>,
    cam_q: Query<(&Camera, &GlobalTransform)>,
    mut contexts: EguiContexts,
    st: Res<SessionState>,
    mut out: EventWriter<Picked>,
) {
    if !buttons.just_pressed(MouseButton::Left) {
        return;
    }
    if contexts.ctx_mut().wants_pointer_input() {
        return;
    }
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, cam_tf)) = cam_q.get_single() else {
        return;
    };

    let mut best: Option<(f32, NodeId)> = None;
    for (id, pos) in st.layout.positions.iter() {
        let Some(screen) = camera.world_to_viewport(cam_tf, *pos) else {
            continue;
        };
        let d = screen.distance(cursor);
        if d < PICK_RADIUS && best.as_ref().map(|(bd, _)| d < *bd).unwrap_or(true) {
            best = Some((d, id.clone()));
        }
    }
    out.send(Picked(best.map(|(_, id)| id)));
}

pub fn apply_picked(mut st: ResMut<SessionState>, mut ev: EventReader<Picked>) {
    for Picked(target) in ev.read() {
        st.select(target.clone());
    }
}

/// Keeps spawned node entities on their (possibly animating) layout
/// positions. Runs every frame; respawning is reserved for membership or
/// emphasis changes.
pub fn sync_node_transforms(
    st: Res<SessionState>,
    mut query: Query<(&NodeMarker, &mut Transform)>,
) {
    for (marker, mut tf) in query.iter_mut() {
        if let Some(pos) = st.layout.positions.get(&marker.id) {
            tf.translation = *pos;
        }
    }
}

fn node_base_color(kind: NodeKind) -> (f32, f32, f32) {
    match kind {
        NodeKind::Image => (0.0, 0.48, 1.0),
        NodeKind::Text => (0.62, 0.62, 0.66),
        NodeKind::Concept => (0.16, 0.65, 0.27),
    }
}

fn node_material(kind: NodeKind, emphasis: Emphasis) -> StandardMaterial {
    let (r, g, b) = node_base_color(kind);
    match emphasis {
        Emphasis::Neutral => StandardMaterial {
            base_color: Color::srgb(r, g, b),
            ..default()
        },
        Emphasis::Highlighted => StandardMaterial {
            base_color: Color::srgb(1.0, 0.76, 0.03),
            emissive: Color::srgb(0.55, 0.4, 0.0).into(),
            ..default()
        },
        Emphasis::Dimmed => StandardMaterial {
            base_color: Color::srgba(r, g, b, 0.15),
            alpha_mode: AlphaMode::Blend,
            ..default()
        },
    }
}

fn edge_color(kind: EdgeKind, emphasis: Emphasis) -> Color {
    if emphasis == Emphasis::Dimmed {
        return Color::srgba(0.7, 0.7, 0.75, 0.06);
    }
    match kind {
        EdgeKind::Similar => Color::srgba(0.0, 0.48, 1.0, 0.5),
        EdgeKind::HasConcept | EdgeKind::CoOccurrence | EdgeKind::Other => {
            Color::srgba(0.75, 0.75, 0.78, 0.55)
        }
    }
}

pub fn draw_scene(
    mut commands: Commands,
    st: Res<SessionState>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut mats: ResMut<Assets<StandardMaterial>>,
    query: Query<Entity, With<NodeMarker>>,
    mut gizmos: Gizmos,
) {
    if st.needs_redraw.swap(false, Ordering::Relaxed) {
        for entity in query.iter() {
            commands.entity(entity).despawn_recursive();
        }

        let image_mesh = meshes.add(Cuboid::new(0.9, 0.9, 0.9));
        let text_mesh = meshes.add(Cuboid::new(0.7, 0.95, 0.2));
        let concept_mesh = meshes.add(Sphere::new(0.35));

        let mut materials: HashMap<(NodeKind, Emphasis), Handle<StandardMaterial>> =
            HashMap::new();

        for (id, node) in st.model.nodes.iter() {
            let pos = st.layout.positions.get(id).copied().unwrap_or(Vec3::ZERO);
            let emphasis = st.search.node_emphasis(id);
            let material = materials
                .entry((node.kind, emphasis))
                .or_insert_with(|| mats.add(node_material(node.kind, emphasis)))
                .clone();
            let mesh = match node.kind {
                NodeKind::Image => image_mesh.clone(),
                NodeKind::Text => text_mesh.clone(),
                NodeKind::Concept => concept_mesh.clone(),
            };

            commands.spawn((
                PbrBundle {
                    mesh,
                    material,
                    transform: Transform::from_translation(pos),
                    ..default()
                },
                NodeMarker { id: id.clone() },
            ));
        }
    }

    let edge_emphasis = st.search.edge_emphasis();
    for edge in st.model.edges.iter() {
        let (Some(a), Some(b)) = (
            st.layout.positions.get(&edge.source),
            st.layout.positions.get(&edge.target),
        ) else {
            continue;
        };
        gizmos.line(*a, *b, edge_color(edge.kind, edge_emphasis));
    }

    if let Some(selected) = st.selection.selected.as_ref() {
        if let Some(pos) = st.layout.positions.get(selected) {
            gizmos.circle(
                *pos + Vec3::Y * 0.05,
                Dir3::Y,
                0.85,
                Color::srgb(1.0, 0.76, 0.03),
            );
        }
    }
}
