use bevy::prelude::*;

use crate::graph::SessionState;

/// Camera motion state. Fits are animated; a bounded zoom factor keeps a
/// tight match set from slamming the camera in.
#[derive(Resource)]
pub struct CameraCtl {
    tween: Option<CameraTween>,
    pub zoom_cap: f32,
    pub anim_duration: f32,
}

impl Default for CameraCtl {
    fn default() -> Self {
        Self::new(2.0, 0.5)
    }
}

impl CameraCtl {
    pub fn new(zoom_cap: f32, anim_duration: f32) -> Self {
        Self {
            tween: None,
            zoom_cap,
            anim_duration,
        }
    }
}

struct CameraTween {
    from_pos: Vec3,
    to_pos: Vec3,
    from_look: Vec3,
    to_look: Vec3,
    elapsed: f32,
    duration: f32,
}

pub fn setup_scene(mut commands: Commands) {
    commands.spawn(PointLightBundle {
        point_light: PointLight {
            intensity: 5000.0,
            shadows_enabled: true,
            ..default()
        },
        transform: Transform::from_xyz(10.0, 20.0, 10.0),
        ..default()
    });

    commands.spawn(Camera3dBundle {
        transform: Transform::from_xyz(0.0, 26.0, 32.0).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });
}

/// Consumes a pending fit request (set by a search transition) and starts a
/// tween framing the matched nodes.
pub fn apply_camera_fit(
    mut st: ResMut<SessionState>,
    mut ctl: ResMut<CameraCtl>,
    cam_q: Query<&Transform, With<Camera>>,
) {
    let Some(ids) = st.ui.fit_request.take() else {
        return;
    };

    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for id in &ids {
        let Some(pos) = st.layout.positions.get(id) else {
            continue;
        };
        min = min.min(*pos);
        max = max.max(*pos);
    }
    if !min.x.is_finite() {
        return;
    }
    let Ok(cam_tf) = cam_q.get_single() else {
        return;
    };

    let center = (min + max) * 0.5;
    let extent = (max - min).length().max(4.0);
    let current_dist = cam_tf.translation.distance(center).max(1.0);

    // Frame the matches, but never zoom in past the cap.
    let dist = (extent * 1.2)
        .max(6.0)
        .max(current_dist / ctl.zoom_cap.max(1.0));
    let offset = Vec3::new(dist * 0.6, dist * 0.5, dist * 0.9);

    let from_look = cam_tf.translation + *cam_tf.forward() * current_dist;
    ctl.tween = Some(CameraTween {
        from_pos: cam_tf.translation,
        to_pos: center + offset,
        from_look,
        to_look: center,
        elapsed: 0.0,
        duration: ctl.anim_duration.max(0.01),
    });
}

pub fn advance_camera_tween(
    time: Res<Time>,
    mut ctl: ResMut<CameraCtl>,
    mut cam_q: Query<&mut Transform, With<Camera>>,
) {
    let Some(tween) = ctl.tween.as_mut() else {
        return;
    };
    tween.elapsed += time.delta_seconds();
    let t = (tween.elapsed / tween.duration).clamp(0.0, 1.0);
    let ease = t * t * (3.0 - 2.0 * t);

    let Ok(mut cam_tf) = cam_q.get_single_mut() else {
        ctl.tween = None;
        return;
    };
    cam_tf.translation = tween.from_pos.lerp(tween.to_pos, ease);
    let look = tween.from_look.lerp(tween.to_look, ease);
    cam_tf.look_at(look, Vec3::Y);

    if t >= 1.0 {
        ctl.tween = None;
    }
}
