//! App-level tests running the table plugins headless.

use std::any::TypeId;
use std::time::Duration;

use avian2d::prelude::*;
use bevy::ecs::message::MessageReader;
use bevy::gizmos::{GizmoAsset, GizmoHandles, GizmoPlugin};
use bevy::input::mouse::{AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use crate::debug_lines::{DebugLines, LineStyle, OverlayLineGizmos, TimedLine};
use crate::prelude::*;
use crate::systems::debug::{prune_hidden_debug_lines, toggle_debug_lines};

fn cue_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin));
    app.init_resource::<ButtonInput<MouseButton>>();
    app.init_resource::<AccumulatedMouseScroll>();
    app.add_plugins(CuePlugin);
    app.insert_resource(CueConfig {
        stick_toggle_delay: 0.0,
        ..Default::default()
    });
    app
}

fn spawn_table(app: &mut App, ball_at: Vec2) -> (Entity, Entity) {
    let cue_ball = app
        .world_mut()
        .spawn((
            Ball,
            CueBall::new(0.25),
            TableBall::at(ball_at),
            Transform::from_translation(ball_at.extend(0.0)),
            LinearVelocity::ZERO,
        ))
        .id();
    let stick = app
        .world_mut()
        .spawn((CueStick, Transform::from_xyz(0.0, 0.0, 1.0), Visibility::default()))
        .id();
    (cue_ball, stick)
}

fn phase(app: &App) -> ShotPhase {
    *app.world().resource::<State<ShotPhase>>().get()
}

fn release_left_button(app: &mut App) {
    let mut buttons = app.world_mut().resource_mut::<ButtonInput<MouseButton>>();
    buttons.press(MouseButton::Left);
    buttons.release(MouseButton::Left);
}

#[test]
fn test_controller_sized_from_cue_ball() {
    let mut app = cue_app();
    spawn_table(&mut app, Vec2::ZERO);
    app.update();

    let controller = app.world().resource::<CueController>();
    assert_eq!(controller.ball_radius, 0.25);
    assert_eq!(controller.min_dist, -0.375);
    assert_eq!(controller.max_dist, -3.0);
    assert_eq!(controller.dist, -1.5);
}

#[test]
fn test_stick_follows_pointer() {
    let mut app = cue_app();
    let (_, stick) = spawn_table(&mut app, Vec2::new(1.0, 1.0));
    app.insert_resource(AimPointer(Some(Vec2::new(1.0, 5.0))));
    app.update();

    let transform = app.world().get::<Transform>(stick).unwrap();
    assert!((transform.up().as_vec3() - Vec3::Y).length() < 1e-5);
    assert!((transform.translation - Vec3::new(1.0, -0.5, 1.0)).length() < 1e-5);

    // Pointer to the right: stick swings behind the ball on the left.
    app.insert_resource(AimPointer(Some(Vec2::new(4.0, 1.0))));
    app.update();
    let transform = app.world().get::<Transform>(stick).unwrap();
    assert!((transform.up().as_vec3() - Vec3::X).length() < 1e-5);
    assert!((transform.translation - Vec3::new(-0.5, 1.0, 1.0)).length() < 1e-5);
}

#[test]
fn test_scroll_moves_stick_and_meter() {
    let mut app = cue_app();
    spawn_table(&mut app, Vec2::ZERO);
    let meter = app
        .world_mut()
        .spawn((PowerMeter::default(), Node::default()))
        .id();
    app.update();

    app.insert_resource(AccumulatedMouseScroll {
        unit: MouseScrollUnit::Line,
        delta: Vec2::new(0.0, -5.0),
    });
    app.update();

    let controller = app.world().resource::<CueController>();
    assert!((controller.dist + 2.0).abs() < 1e-5);

    let meter = app.world().get::<PowerMeter>(meter).unwrap();
    assert!((meter.value - 2.0).abs() < 1e-5);
    assert_eq!(meter.min, 0.375);
    assert_eq!(meter.max, 3.0);

    // Scrolling far past the end pins the stick at full pull.
    app.insert_resource(AccumulatedMouseScroll {
        unit: MouseScrollUnit::Line,
        delta: Vec2::new(0.0, -500.0),
    });
    app.update();
    assert_eq!(app.world().resource::<CueController>().dist, -3.0);
}

#[test]
fn test_shot_cycle() {
    let mut app = cue_app();
    let (cue_ball, stick) = spawn_table(&mut app, Vec2::ZERO);
    app.insert_resource(AimPointer(Some(Vec2::new(0.0, 3.0))));
    app.update();
    assert_eq!(phase(&app), ShotPhase::Aiming);

    release_left_button(&mut app);
    app.update();

    let velocity = app.world().get::<LinearVelocity>(cue_ball).unwrap().0;
    assert!(velocity.x.abs() < 1e-5);
    assert!(velocity.y > 0.0, "cue ball should travel toward the pointer");

    app.world_mut().resource_mut::<ButtonInput<MouseButton>>().clear();
    app.update();
    assert_eq!(phase(&app), ShotPhase::Resolving);
    assert_eq!(app.world().get::<Visibility>(stick), Some(&Visibility::Hidden));

    // Still rolling.
    app.update();
    assert_eq!(phase(&app), ShotPhase::Resolving);

    app.world_mut().get_mut::<LinearVelocity>(cue_ball).unwrap().0 = Vec2::new(0.05, 0.0);
    app.update();
    app.update();
    assert_eq!(phase(&app), ShotPhase::Aiming);
    assert_eq!(app.world().get::<Visibility>(stick), Some(&Visibility::Inherited));
}

#[test]
fn test_harder_pull_gives_faster_ball() {
    let speed_after_shot = |scroll: f32| {
        let mut app = cue_app();
        let (cue_ball, _) = spawn_table(&mut app, Vec2::ZERO);
        app.insert_resource(AimPointer(Some(Vec2::new(0.0, 3.0))));
        app.update();
        app.insert_resource(AccumulatedMouseScroll {
            unit: MouseScrollUnit::Line,
            delta: Vec2::new(0.0, scroll),
        });
        app.update();
        release_left_button(&mut app);
        app.update();
        app.world().get::<LinearVelocity>(cue_ball).unwrap().0.length()
    };

    assert!(speed_after_shot(-100.0) > speed_after_shot(100.0));
}

#[test]
fn test_no_shot_while_resolving() {
    let mut app = cue_app();
    let (cue_ball, _) = spawn_table(&mut app, Vec2::ZERO);
    app.insert_resource(AimPointer(Some(Vec2::new(0.0, 3.0))));
    app.update();
    release_left_button(&mut app);
    app.update();
    app.update();
    let after_first = app.world().get::<LinearVelocity>(cue_ball).unwrap().0;

    release_left_button(&mut app);
    app.update();
    assert_eq!(app.world().get::<LinearVelocity>(cue_ball).unwrap().0, after_first);
}

#[test]
fn test_reset_restores_rack() {
    let mut app = cue_app();
    let (cue_ball, stick) = spawn_table(&mut app, Vec2::new(-2.0, 0.0));
    let red = app
        .world_mut()
        .spawn((
            Ball,
            TableBall::at(Vec2::new(2.0, 0.5)),
            Transform::from_xyz(2.0, 0.5, 0.0),
            LinearVelocity::ZERO,
        ))
        .id();
    app.update();

    app.world_mut().get_mut::<Transform>(red).unwrap().translation = Vec3::new(3.0, -1.0, 0.0);
    app.world_mut().get_mut::<LinearVelocity>(red).unwrap().0 = Vec2::new(1.0, 1.0);
    app.world_mut().get_mut::<Transform>(cue_ball).unwrap().translation = Vec3::new(0.0, 1.0, 0.0);
    *app.world_mut().get_mut::<Visibility>(stick).unwrap() = Visibility::Hidden;
    app.world_mut().resource_mut::<CueController>().adjust(-1.0);

    app.world_mut().write_message(ResetTable);
    app.update();

    let red_transform = app.world().get::<Transform>(red).unwrap();
    assert_eq!(red_transform.translation, Vec3::new(2.0, 0.5, 0.0));
    assert_eq!(app.world().get::<LinearVelocity>(red).unwrap().0, Vec2::ZERO);
    let cue_transform = app.world().get::<Transform>(cue_ball).unwrap();
    assert_eq!(cue_transform.translation.truncate(), Vec2::new(-2.0, 0.0));
    assert_eq!(app.world().get::<Visibility>(stick), Some(&Visibility::Inherited));
    assert_eq!(app.world().resource::<CueController>().dist, -1.5);
}

#[test]
fn test_selection_highlight_flashes_on_setup() {
    let mut app = cue_app();
    let highlight = app
        .world_mut()
        .spawn((SelectionFx, Fader::new(10.0), Sprite::default()))
        .id();
    spawn_table(&mut app, Vec2::ZERO);
    app.update();

    let fader = app.world().get::<Fader>(highlight).unwrap();
    assert!(fader.active);
    let sprite = app.world().get::<Sprite>(highlight).unwrap();
    assert!(sprite.color.alpha() > 0.9);
}

const PHYSICS_STEP: f32 = 1.0 / 64.0;
const BALL_RADIUS: f32 = 0.1;

/// One physics step per `update()`, no gravity.
fn add_headless_physics(app: &mut App) {
    // Avian's `bevy_scene` feature schedules a system that reads `SceneSpawner`.
    app.add_plugins((AssetPlugin::default(), bevy::scene::ScenePlugin));
    app.add_plugins((TransformPlugin, PhysicsPlugins::default()));
    app.insert_resource(Gravity(Vec2::ZERO));
    app.insert_resource(Time::<Fixed>::from_duration(Duration::from_secs_f32(
        PHYSICS_STEP,
    )));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
        PHYSICS_STEP,
    )));
}

fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

#[derive(Resource, Default)]
struct ImpactLog {
    impacts: Vec<(Entity, Entity, f32)>,
    contacts: usize,
}

fn log_impacts(
    mut impacts: MessageReader<BallImpact>,
    mut contacts: MessageReader<CollisionStart>,
    mut log: ResMut<ImpactLog>,
) {
    log.impacts
        .extend(impacts.read().map(|impact| (impact.ball, impact.other, impact.speed_sq)));
    log.contacts += contacts.read().count();
}

fn impact_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    add_headless_physics(&mut app);
    app.add_plugins(ImpactSoundPlugin);
    app.init_resource::<ImpactLog>();
    app.add_systems(Update, log_impacts);
    app.finish();
    app
}

fn spawn_rolling_ball(app: &mut App, at: Vec2, velocity: Vec2) -> EntityWorldMut<'_> {
    app.world_mut().spawn((
        RigidBody::Dynamic,
        Collider::circle(BALL_RADIUS),
        CollisionEventsEnabled,
        Transform::from_translation(at.extend(0.0)),
        LinearVelocity(velocity),
        Ball,
    ))
}

#[test]
fn test_head_on_hit_clicks_both_balls() {
    let mut app = impact_app();
    let a = spawn_rolling_ball(&mut app, Vec2::new(-0.5, 0.0), Vec2::new(2.0, 0.0))
        .insert(ImpactSound::default())
        .id();
    let b = spawn_rolling_ball(&mut app, Vec2::new(0.5, 0.0), Vec2::new(-2.0, 0.0))
        .insert(ImpactSound::default())
        .id();

    run_frames(&mut app, 60);

    let log = app.world().resource::<ImpactLog>();
    assert!(log.contacts > 0);
    let first_a = log.impacts.iter().find(|(ball, other, _)| (*ball, *other) == (a, b));
    let first_b = log.impacts.iter().find(|(ball, other, _)| (*ball, *other) == (b, a));
    let (Some(first_a), Some(first_b)) = (first_a, first_b) else {
        panic!("both balls should click, got {:?}", log.impacts);
    };
    // Approach speed is 4 before the solver stops the balls.
    assert!(first_a.2 > 9.0, "measured speed² {}", first_a.2);
    assert!(first_b.2 > 9.0, "measured speed² {}", first_b.2);
}

#[test]
fn test_soft_contact_is_silent() {
    let mut app = impact_app();
    spawn_rolling_ball(&mut app, Vec2::new(-0.15, 0.0), Vec2::new(0.3, 0.0))
        .insert(ImpactSound::default());
    spawn_rolling_ball(&mut app, Vec2::new(0.15, 0.0), Vec2::ZERO).insert(ImpactSound::default());

    run_frames(&mut app, 60);

    let log = app.world().resource::<ImpactLog>();
    assert!(log.contacts > 0);
    assert!(log.impacts.is_empty(), "unexpected clicks {:?}", log.impacts);
}

#[test]
fn test_hard_cushion_hit_is_silent() {
    let mut app = impact_app();
    spawn_rolling_ball(&mut app, Vec2::ZERO, Vec2::new(5.0, 0.0)).insert(ImpactSound::default());
    app.world_mut().spawn((
        RigidBody::Static,
        Collider::rectangle(0.2, 2.0),
        Transform::from_xyz(0.5, 0.0, 0.0),
    ));

    run_frames(&mut app, 30);

    let log = app.world().resource::<ImpactLog>();
    assert!(log.contacts > 0);
    assert!(log.impacts.is_empty());
}

#[test]
fn test_ball_without_sound_only_gets_struck() {
    let mut app = impact_app();
    let loud = spawn_rolling_ball(&mut app, Vec2::new(-0.5, 0.0), Vec2::new(3.0, 0.0))
        .insert(ImpactSound::default())
        .id();
    let quiet = spawn_rolling_ball(&mut app, Vec2::new(0.5, 0.0), Vec2::ZERO).id();

    run_frames(&mut app, 60);

    let log = &app.world().resource::<ImpactLog>().impacts;
    assert_eq!(log.first().map(|(ball, other, _)| (*ball, *other)), Some((loud, quiet)));
    assert!(log.iter().all(|(ball, _, _)| *ball != quiet));
}

fn prediction_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin));
    add_headless_physics(&mut app);
    app.init_resource::<ButtonInput<MouseButton>>();
    app.init_resource::<AccumulatedMouseScroll>();
    app.add_plugins(CuePlugin);
    app.insert_resource(AimPointer(Some(Vec2::new(0.0, 3.0))));
    app.finish();

    // Cue ball at the origin with its own collider, stick aiming up.
    app.world_mut().spawn((
        Ball,
        CueBall::new(0.25),
        RigidBody::Static,
        Collider::circle(0.25),
        CollisionLayers::new(GameLayer::Ball, [GameLayer::Ball, GameLayer::Wall]),
        Transform::default(),
    ));
    app.world_mut()
        .spawn((CueStick, Transform::from_xyz(0.0, 0.0, 1.0), Visibility::default()));
    app
}

fn spawn_cushion(app: &mut App, center: Vec2, size: Vec2) -> Entity {
    app.world_mut()
        .spawn((
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            CollisionLayers::new(GameLayer::Wall, [GameLayer::Ball]),
            Transform::from_translation(center.extend(0.0)),
        ))
        .id()
}

/// Let the physics step build its query pipeline, then capture one frame
/// of prediction.
fn predicted_frame(app: &mut App) -> (Option<AimHit>, Vec<TimedLine>) {
    app.init_resource::<DebugLines>();
    run_frames(app, 3);
    app.world_mut().resource_mut::<DebugLines>().clear();
    app.update();

    let hit = app.world().resource::<CueController>().last_hit;
    let lines = app.world().resource::<DebugLines>().overlay().to_vec();
    (hit, lines)
}

fn is_red(line: &TimedLine) -> bool {
    line.color == Color::srgb(1.0, 0.0, 0.0)
}

#[test]
fn test_prediction_targets_ball_ahead() {
    let mut app = prediction_app();
    let red = app
        .world_mut()
        .spawn((
            Ball,
            RigidBody::Static,
            Collider::circle(0.25),
            CollisionLayers::new(GameLayer::Ball, [GameLayer::Ball, GameLayer::Wall]),
            Transform::from_xyz(0.0, 2.0, 0.0),
        ))
        .id();
    // Decoration on the default layer sits on the shot line.
    app.world_mut().spawn((
        RigidBody::Static,
        Collider::circle(0.1),
        Transform::from_xyz(0.0, 1.0, 0.0),
    ));

    let (hit, lines) = predicted_frame(&mut app);

    let hit = hit.expect("the cast should reach the red ball");
    assert_eq!(hit.entity, red);
    assert!((hit.centroid - Vec2::new(0.0, 1.5)).length() < 1e-2);
    assert!((hit.normal - Vec2::NEG_Y).length() < 1e-2);
    assert!(hit.is_ball());
    assert!((hit.target_ball.unwrap() - Vec2::new(0.0, 2.0)).length() < 1e-4);

    // path + circle + deflection + object ball ray
    assert_eq!(lines.len(), 35);
    let target_ray = lines.last().unwrap();
    assert!(is_red(target_ray));
    assert!((target_ray.end - target_ray.start).normalize().dot(Vec3::Y) > 0.999);
}

#[test]
fn test_prediction_stops_at_cushion_past_own_collider() {
    let mut app = prediction_app();
    let cushion = spawn_cushion(&mut app, Vec2::new(0.0, 3.0), Vec2::new(4.0, 0.5));

    let (hit, lines) = predicted_frame(&mut app);

    // The cast starts inside the cue ball's collider and must skip it.
    let hit = hit.expect("the cast should reach the cushion");
    assert_eq!(hit.entity, cushion);
    assert!((hit.distance - 2.5).abs() < 1e-2);
    assert!((hit.normal - Vec2::NEG_Y).length() < 1e-2);
    assert!(!hit.is_ball());

    assert_eq!(lines.len(), 34);
    assert!(lines.iter().all(|line| !is_red(line)));
}

#[test]
fn test_missed_cast_shows_rebound_from_stick() {
    let mut app = prediction_app();
    // Only a cushion between the stick and the ball.
    spawn_cushion(&mut app, Vec2::new(0.0, -0.8), Vec2::new(4.0, 0.2));

    let (hit, lines) = predicted_frame(&mut app);

    assert!(hit.is_none());
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(is_red));
    assert!((lines[0].start - Vec3::new(0.0, -1.5, 0.0)).length() < 1e-4);
    assert!((lines[0].end - Vec3::new(0.0, -1.15, 0.0)).length() < 1e-2);
}

#[test]
fn test_prediction_runs_without_line_buffer() {
    let mut app = prediction_app();
    let cushion = spawn_cushion(&mut app, Vec2::new(0.0, 3.0), Vec2::new(4.0, 0.5));

    run_frames(&mut app, 5);

    let hit = app.world().resource::<CueController>().last_hit;
    assert_eq!(hit.map(|hit| hit.entity), Some(cushion));
    assert!(app.world().get_resource::<DebugLines>().is_none());
}

#[test]
fn test_lines_reach_gizmos_in_the_frame_they_are_queued() {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, AssetPlugin::default(), GizmoPlugin));
    app.init_resource::<ButtonInput<KeyCode>>();
    app.add_plugins(DebugLinesPlugin);

    app.world_mut().resource_mut::<DebugLines>().draw_line(
        Vec3::ZERO,
        Vec3::X,
        LineStyle::default(),
    );
    app.update();

    let overlay_mesh = |app: &App| {
        app.world()
            .resource::<GizmoHandles>()
            .handles()
            .get(&TypeId::of::<OverlayLineGizmos>())
            .cloned()
            .flatten()
    };
    let handle = overlay_mesh(&app).expect("overlay gizmo mesh built this frame");
    let asset = app.world().resource::<Assets<GizmoAsset>>().get(&handle).unwrap();
    assert_eq!(asset.buffer().list_positions, vec![Vec3::ZERO, Vec3::X]);

    // The single-frame line is gone on the next frame.
    app.update();
    assert!(overlay_mesh(&app).is_none());
}

#[test]
fn test_toggle_key_hides_and_ages_lines() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.init_resource::<ButtonInput<KeyCode>>();
    app.init_resource::<DebugLines>();
    app.add_systems(Update, (toggle_debug_lines, prune_hidden_debug_lines).chain());

    {
        let mut lines = app.world_mut().resource_mut::<DebugLines>();
        lines.set_clock(0.0);
        lines.draw_line(Vec3::ZERO, Vec3::X, LineStyle::default().with_duration(1.0));
        lines.draw_line(Vec3::ZERO, Vec3::Y, LineStyle::default().with_duration(5.0));
    }

    app.world_mut().resource_mut::<ButtonInput<KeyCode>>().press(KeyCode::F3);
    app.world_mut().resource_mut::<DebugLines>().set_clock(2.0);
    app.update();

    let lines = app.world().resource::<DebugLines>();
    assert!(!lines.display_lines);
    assert_eq!(lines.len(), 1);

    // Held key does not toggle again.
    app.world_mut().resource_mut::<ButtonInput<KeyCode>>().clear();
    app.update();
    assert!(!app.world().resource::<DebugLines>().display_lines);

    {
        let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
        keys.release(KeyCode::F3);
        keys.clear();
        keys.press(KeyCode::F3);
    }
    app.update();
    assert!(app.world().resource::<DebugLines>().display_lines);
}
