//! Aiming system - stick placement, pull-back and shot prediction.

use avian2d::prelude::*;
use bevy::input::mouse::{AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::components::{Ball, CueBall, CueStick, Fader, SelectionFx};
use crate::debug_lines::{DebugLines, LineStyle};
use crate::resources::{AimPointer, CueConfig, CueController};
use crate::types::{AimHit, GameLayer};

/// Scroll distance of one wheel notch on pixel-precise devices.
const PIXELS_PER_LINE: f32 = 16.0;

const PREDICTION_WHITE: Color = Color::WHITE;
const PREDICTION_YELLOW: Color = Color::srgb(1.0, 0.92, 0.016);
const PREDICTION_RED: Color = Color::srgb(1.0, 0.0, 0.0);

/// Build the cue controller when a cue ball appears.
///
/// Sizes the pull-back range from the ball radius, puts the stick halfway
/// back and starts the selection highlight.
pub fn setup_cue_controller(
    added: Query<&CueBall, Added<CueBall>>,
    config: Res<CueConfig>,
    mut controller: ResMut<CueController>,
    mut highlights: Query<&mut Fader, With<SelectionFx>>,
) {
    let Some(cue_ball) = added.iter().last() else {
        return;
    };

    *controller = CueController::for_ball(cue_ball.radius, config.max_pull);
    for mut fader in highlights.iter_mut() {
        fader.restart();
    }
    debug!(
        "cue controller ready: radius {}, pull range [{}, {}]",
        controller.ball_radius, controller.max_dist, controller.min_dist
    );
}

/// Refresh [`AimPointer`] from the primary window cursor.
pub fn track_pointer(
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform)>,
    mut pointer: ResMut<AimPointer>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };

    for (camera, camera_transform) in cameras.iter() {
        if !camera.is_active {
            continue;
        }
        if let Ok(world) = camera.viewport_to_world_2d(camera_transform, cursor) {
            pointer.0 = Some(world);
            return;
        }
    }
}

/// Move the stick along its axis with the scroll wheel.
pub fn adjust_pull_back(
    scroll: Res<AccumulatedMouseScroll>,
    config: Res<CueConfig>,
    mut controller: ResMut<CueController>,
) {
    if scroll.delta.y == 0.0 {
        return;
    }
    let lines = match scroll.unit {
        MouseScrollUnit::Line => scroll.delta.y,
        MouseScrollUnit::Pixel => scroll.delta.y / PIXELS_PER_LINE,
    };
    controller.adjust(lines * config.scroll_sensitivity);
}

/// Point the stick at the pointer and set it `dist` along its up axis
/// from the cue ball.
pub fn aim_stick(
    pointer: Res<AimPointer>,
    controller: Res<CueController>,
    cue_ball: Query<&Transform, (With<CueBall>, Without<CueStick>)>,
    mut stick: Query<&mut Transform, (With<CueStick>, Without<CueBall>)>,
) {
    let Ok(ball) = cue_ball.single() else {
        return;
    };
    let Ok(mut stick) = stick.single_mut() else {
        return;
    };

    let ball_position = ball.translation.truncate();
    if let Some(rotation) = pointer.0.and_then(|target| stick_rotation(ball_position, target)) {
        stick.rotation = rotation;
    }
    let offset = stick.up().as_vec3().truncate() * controller.dist;
    stick.translation = (ball_position + offset).extend(stick.translation.z);
}

/// Cast the cue ball along the stick and draw where it will go.
///
/// The cast sweeps a circle of the cue ball's radius against balls and
/// walls. When nothing is hit, a second cast from the stick against walls
/// alone shows the rebound in red. Lines are only queued when a
/// [`DebugLines`] buffer exists.
pub fn predict_shot(
    spatial_query: SpatialQuery,
    config: Res<CueConfig>,
    mut controller: ResMut<CueController>,
    lines: Option<ResMut<DebugLines>>,
    cue_ball: Query<(Entity, &Transform), (With<CueBall>, Without<CueStick>)>,
    stick: Query<&Transform, (With<CueStick>, Without<CueBall>)>,
    balls: Query<&Transform, (With<Ball>, Without<CueStick>)>,
) {
    let Ok((cue_entity, ball)) = cue_ball.single() else {
        return;
    };
    let Ok(stick) = stick.single() else {
        return;
    };
    let Ok(direction) = Dir2::new(stick.up().as_vec3().truncate()) else {
        return;
    };

    let radius = controller.ball_radius;
    if radius <= 0.0 {
        return;
    }
    let shape = Collider::circle(radius);
    let cast_config = ShapeCastConfig::from_max_distance(config.cast_distance);
    let ball_position = ball.translation.truncate();
    let stick_position = stick.translation.truncate();

    let cast = |origin: Vec2, filter: &SpatialQueryFilter| {
        spatial_query
            .cast_shape(&shape, origin, 0.0, direction, &cast_config, filter)
            .map(|hit| AimHit {
                entity: hit.entity,
                centroid: origin + *direction * hit.distance,
                normal: hit.normal1,
                distance: hit.distance,
                target_ball: balls.get(hit.entity).ok().map(|t| t.translation.truncate()),
            })
    };

    let table = SpatialQueryFilter::from_mask([GameLayer::Ball, GameLayer::Wall])
        .with_excluded_entities([cue_entity]);
    let hit = cast(ball_position, &table);
    controller.last_hit = hit;

    let Some(mut lines) = lines.filter(|_| config.debug_draw) else {
        return;
    };
    match hit {
        Some(hit) => draw_prediction(
            &mut lines,
            stick_position,
            &hit,
            radius,
            config.target_ray_length,
        ),
        None => {
            let walls = SpatialQueryFilter::from_mask(GameLayer::Wall)
                .with_excluded_entities([cue_entity]);
            if let Some(rebound) = cast(stick_position, &walls) {
                draw_rebound(&mut lines, stick_position, &rebound);
            }
        }
    }
}

/// Queue the prediction for a cast that hit a ball or wall.
///
/// White path from the stick to the contact, the cue ball outline at the
/// contact, the cue ball's deflection in yellow and, for a ball, the
/// object ball's direction in red.
pub fn draw_prediction(
    lines: &mut DebugLines,
    stick: Vec2,
    hit: &AimHit,
    radius: f32,
    target_ray_length: f32,
) {
    let centroid = hit.centroid.extend(0.0);
    lines.draw_line(stick.extend(0.0), centroid, LineStyle::colored(PREDICTION_WHITE));
    lines.draw_circle(centroid, radius, LineStyle::colored(PREDICTION_YELLOW));

    let travel = (hit.centroid - stick).normalize_or_zero();
    let deflection = reflect(travel, hit.normal);
    lines.draw_ray(centroid, deflection.extend(0.0), LineStyle::colored(PREDICTION_YELLOW));

    if let Some(target) = hit.target_ball {
        let target_dir = (target - hit.centroid).normalize_or_zero() * target_ray_length;
        lines.draw_ray(centroid, target_dir.extend(0.0), LineStyle::colored(PREDICTION_RED));
    }
}

/// Queue the wall rebound shown when the main cast finds nothing.
pub fn draw_rebound(lines: &mut DebugLines, stick: Vec2, hit: &AimHit) {
    let centroid = hit.centroid.extend(0.0);
    lines.draw_line(stick.extend(0.0), centroid, LineStyle::colored(PREDICTION_RED));

    let travel = (hit.centroid - stick).normalize_or_zero();
    let deflection = reflect(travel, hit.normal);
    lines.draw_ray(centroid, deflection.extend(0.0), LineStyle::colored(PREDICTION_RED));
}

/// Rotation about Z that turns +Y from `ball` toward `target`.
///
/// Returns `None` when the two points coincide.
///
/// # Example
/// ```
/// use bevy::prelude::*;
/// use bevy_snooker2d::systems::aiming::stick_rotation;
///
/// let rotation = stick_rotation(Vec2::ZERO, Vec2::new(-1.0, 0.0)).unwrap();
/// assert!((rotation * Vec3::Y - Vec3::NEG_X).length() < 1e-5);
/// ```
pub fn stick_rotation(ball: Vec2, target: Vec2) -> Option<Quat> {
    let aim = target - ball;
    if aim.length_squared() <= f32::EPSILON {
        return None;
    }
    Some(Quat::from_rotation_z(Vec2::Y.angle_to(aim)))
}

/// Mirror `direction` about a surface with the given normal.
pub fn reflect(direction: Vec2, normal: Vec2) -> Vec2 {
    direction - 2.0 * direction.dot(normal) * normal
}

/// Map `value` from `[from_start, from_end]` onto `[to_start, to_end]`.
///
/// A degenerate source range maps everything to `to_start`.
pub fn remap(value: f32, from_start: f32, from_end: f32, to_start: f32, to_end: f32) -> f32 {
    let span = from_end - from_start;
    if span.abs() <= f32::EPSILON {
        return to_start;
    }
    to_start + (value - from_start) * (to_end - to_start) / span
}
