use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::ecs::message::MessageWriter;
use bevy_snooker2d::prelude::*;

const BALL_RADIUS: f32 = 0.125;
const TABLE_HALF_SIZE: Vec2 = Vec2::new(6.0, 3.0);
const CUSHION_THICKNESS: f32 = 0.3;
const PIXELS_PER_UNIT: f32 = 60.0;
const STICK_LENGTH: f32 = 3.0;
const CONTROLS_HELP: &str = concat!(
    "Mouse: aim | Wheel: pull back | Release LMB: shoot\n",
    "R: reset | P: prediction | F3: debug lines",
);

#[derive(Component)]
struct PhaseText;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(PhysicsPlugins::default())
        .add_plugins(SnookerPluginGroup)
        .insert_resource(Gravity(Vec2::ZERO))
        .insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.08)))
        .insert_resource(CueConfig {
            max_pull: 3.0,
            force_multiplier: 2.5,
            debug_draw: true,
            ..default()
        })
        .add_systems(Startup, (setup_table, setup_ui))
        .add_systems(Update, (table_controls, update_phase_text))
        .run();
}

fn setup_table(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    commands.spawn((
        Camera2d,
        Transform::from_scale(Vec3::splat(1.0 / PIXELS_PER_UNIT)),
    ));

    commands.insert_resource(SnookerAudio {
        ball_click: Some(asset_server.load("sounds/ball_click.ogg")),
        cue_strike: Some(asset_server.load("sounds/cue_strike.ogg")),
    });

    // Cloth
    commands.spawn((
        Sprite {
            color: Color::srgb(0.0, 0.35, 0.15),
            custom_size: Some(TABLE_HALF_SIZE * 2.0),
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, -1.0),
    ));

    // Cushions
    let cushion_color = Color::srgb(0.3, 0.15, 0.05);
    let horizontal = Vec2::new(
        TABLE_HALF_SIZE.x * 2.0 + CUSHION_THICKNESS * 2.0,
        CUSHION_THICKNESS,
    );
    let vertical = Vec2::new(CUSHION_THICKNESS, TABLE_HALF_SIZE.y * 2.0);
    let offset_x = TABLE_HALF_SIZE.x + CUSHION_THICKNESS * 0.5;
    let offset_y = TABLE_HALF_SIZE.y + CUSHION_THICKNESS * 0.5;
    for (size, position) in [
        (horizontal, Vec2::new(0.0, offset_y)),
        (horizontal, Vec2::new(0.0, -offset_y)),
        (vertical, Vec2::new(offset_x, 0.0)),
        (vertical, Vec2::new(-offset_x, 0.0)),
    ] {
        commands.spawn((
            Sprite {
                color: cushion_color,
                custom_size: Some(size),
                ..default()
            },
            Transform::from_translation(position.extend(0.0)),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            Restitution::new(0.8),
            CollisionLayers::new(GameLayer::Wall, [GameLayer::Ball]),
        ));
    }

    let ball_mesh = meshes.add(Circle::new(BALL_RADIUS));

    // Cue ball with its selection ring
    let cue_position = Vec2::new(-TABLE_HALF_SIZE.x * 0.5, 0.0);
    commands
        .spawn((
            ball_bundle(cue_position),
            Mesh2d(ball_mesh.clone()),
            MeshMaterial2d(materials.add(Color::WHITE)),
            CueBall::new(BALL_RADIUS),
        ))
        .with_children(|parent| {
            parent.spawn((
                Sprite {
                    color: Color::srgba(1.0, 1.0, 0.6, 0.0),
                    custom_size: Some(Vec2::splat(BALL_RADIUS * 3.0)),
                    ..default()
                },
                Transform::from_xyz(0.0, 0.0, -0.5),
                SelectionFx,
                Fader::new(0.6),
            ));
        });

    // Triangle rack
    let red = materials.add(Color::srgb(0.8, 0.05, 0.05));
    let apex = Vec2::new(TABLE_HALF_SIZE.x * 0.45, 0.0);
    let row_step = BALL_RADIUS * 3.0_f32.sqrt();
    for row in 0..5 {
        for i in 0..=row {
            let position = apex
                + Vec2::new(
                    row as f32 * row_step,
                    (i as f32 - row as f32 * 0.5) * BALL_RADIUS * 2.02,
                );
            commands.spawn((
                ball_bundle(position),
                Mesh2d(ball_mesh.clone()),
                MeshMaterial2d(red.clone()),
            ));
        }
    }

    // Stick pivot: the shaft hangs behind it along -Y
    commands
        .spawn((
            CueStick,
            Transform::from_translation(cue_position.extend(1.0)),
            Visibility::default(),
        ))
        .with_children(|parent| {
            parent.spawn((
                Sprite {
                    color: Color::srgb(0.85, 0.7, 0.45),
                    custom_size: Some(Vec2::new(0.05, STICK_LENGTH)),
                    ..default()
                },
                Transform::from_xyz(0.0, -STICK_LENGTH * 0.5, 0.0),
            ));
        });
}

fn ball_bundle(position: Vec2) -> impl Bundle {
    (
        Transform::from_translation(position.extend(0.0)),
        RigidBody::Dynamic,
        Collider::circle(BALL_RADIUS),
        CollisionLayers::new(GameLayer::Ball, [GameLayer::Ball, GameLayer::Wall]),
        CollisionEventsEnabled,
        Restitution::new(0.95),
        Friction::new(0.05),
        LinearDamping(0.6),
        AngularDamping(0.6),
        Ball,
        ImpactSound::default(),
        TableBall::at(position),
    )
}

fn setup_ui(mut commands: Commands) {
    // Power meter
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(20.0),
                left: Val::Px(20.0),
                width: Val::Px(200.0),
                height: Val::Px(16.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
        ))
        .with_children(|parent| {
            parent.spawn((
                Node {
                    width: Val::Percent(0.0),
                    height: Val::Percent(100.0),
                    ..default()
                },
                BackgroundColor(Color::srgb(0.9, 0.6, 0.1)),
                PowerMeter::default(),
            ));
        });

    commands.spawn((
        Text::new(""),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        PhaseText,
    ));
}

fn table_controls(
    keys: Res<ButtonInput<KeyCode>>,
    mut resets: MessageWriter<ResetTable>,
    mut config: ResMut<CueConfig>,
) {
    if keys.just_pressed(KeyCode::KeyR) {
        resets.write(ResetTable);
    }
    if keys.just_pressed(KeyCode::KeyP) {
        config.debug_draw = !config.debug_draw;
    }
}

fn update_phase_text(
    phase: Res<State<ShotPhase>>,
    controller: Res<CueController>,
    config: Res<CueConfig>,
    mut text: Query<&mut Text, With<PhaseText>>,
) {
    let Ok(mut text) = text.single_mut() else {
        return;
    };
    let phase_name = match phase.get() {
        ShotPhase::Aiming => "Aiming",
        ShotPhase::Resolving => "Resolving",
    };
    text.0 = format!(
        "Phase: {phase_name}\nPower: {:.0}%\nPrediction: {}\n\n{CONTROLS_HELP}",
        controller.power() * 100.0,
        if config.debug_draw { "on" } else { "off" },
    );
}
