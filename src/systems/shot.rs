//! Shot system - striking the cue ball, waiting for the table to settle
//! and resetting the rack.

use avian2d::prelude::*;
use bevy::audio::Volume;
use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;

use crate::components::{CueBall, CueStick, Fader, SelectionFx, StickVisibilityChange, TableBall};
use crate::events::{ResetTable, ShotResolved, ShotTaken};
use crate::resources::{CueConfig, CueController, SnookerAudio};
use crate::types::ShotPhase;

/// Strike the cue ball when the left button is released.
///
/// The impulse scales with the pull-back and points from the stick to the
/// ball. It is applied straight to the ball's velocity, so the phase change
/// sees a moving ball on the next frame. The strike sound plays louder the
/// further the stick was drawn.
pub fn take_shot(
    mut commands: Commands,
    buttons: Res<ButtonInput<MouseButton>>,
    config: Res<CueConfig>,
    controller: Res<CueController>,
    audio: Res<SnookerAudio>,
    mut next_phase: ResMut<NextState<ShotPhase>>,
    mut shots: MessageWriter<ShotTaken>,
    mut cue_ball: Query<
        (Entity, &Transform, &mut LinearVelocity, Option<&ComputedMass>),
        (With<CueBall>, Without<CueStick>),
    >,
    stick: Query<(Entity, &Transform), (With<CueStick>, Without<CueBall>)>,
) {
    if !buttons.just_released(MouseButton::Left) {
        return;
    }
    let Ok((ball_entity, ball, mut velocity, mass)) = cue_ball.single_mut() else {
        return;
    };
    let Ok((stick_entity, stick)) = stick.single() else {
        return;
    };

    let power = controller.power();
    if let Some(clip) = audio.cue_strike.as_ref() {
        commands.spawn((
            AudioPlayer::new(clip.clone()),
            PlaybackSettings::DESPAWN.with_volume(Volume::Linear(power)),
        ));
    }

    let impulse = controller.shot_impulse(
        ball.translation.truncate(),
        stick.translation.truncate(),
        &config,
    );
    let inverse_mass = mass.map(|m| m.inverse()).unwrap_or(1.0);
    velocity.0 += impulse * inverse_mass;

    next_phase.set(ShotPhase::Resolving);
    commands
        .entity(stick_entity)
        .insert(StickVisibilityChange::after(config.stick_toggle_delay, false));
    shots.write(ShotTaken {
        cue_ball: ball_entity,
        impulse,
        power,
    });
    info!("shot taken: impulse {impulse}, power {power:.2}");
}

/// Return to aiming once the cue ball is nearly still.
pub fn resolve_shot(
    mut commands: Commands,
    config: Res<CueConfig>,
    mut next_phase: ResMut<NextState<ShotPhase>>,
    mut resolved: MessageWriter<ShotResolved>,
    cue_ball: Query<(Entity, &Transform, &LinearVelocity), With<CueBall>>,
    stick: Query<Entity, With<CueStick>>,
    mut highlights: Query<&mut Fader, With<SelectionFx>>,
) {
    let Ok((ball_entity, ball, velocity)) = cue_ball.single() else {
        return;
    };
    if velocity.0.length_squared() >= config.rest_speed_sq {
        return;
    }

    next_phase.set(ShotPhase::Aiming);
    for mut fader in highlights.iter_mut() {
        fader.restart();
    }
    if let Ok(stick) = stick.single() {
        commands
            .entity(stick)
            .insert(StickVisibilityChange::after(config.stick_toggle_delay, true));
    }
    resolved.write(ShotResolved {
        cue_ball: ball_entity,
        rest_position: ball.translation.truncate(),
    });
    debug!("table settled, cue ball at {}", ball.translation.truncate());
}

/// Apply pending stick visibility changes once their delay runs out.
pub fn apply_stick_visibility(
    mut commands: Commands,
    time: Res<Time>,
    mut pending: Query<(Entity, &mut StickVisibilityChange, &mut Visibility)>,
) {
    for (entity, mut change, mut visibility) in pending.iter_mut() {
        change.timer.tick(time.delta());
        if !change.timer.is_finished() {
            continue;
        }
        *visibility = if change.visible {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        commands.entity(entity).remove::<StickVisibilityChange>();
    }
}

/// Put every rack ball back in place and start a fresh shot.
pub fn reset_table(
    mut commands: Commands,
    mut resets: MessageReader<ResetTable>,
    config: Res<CueConfig>,
    mut controller: ResMut<CueController>,
    mut next_phase: ResMut<NextState<ShotPhase>>,
    mut balls: Query<(
        &TableBall,
        &mut Transform,
        Option<&mut Position>,
        Option<&mut LinearVelocity>,
        Option<&mut AngularVelocity>,
    )>,
    mut stick: Query<(Entity, &mut Visibility), With<CueStick>>,
    mut highlights: Query<&mut Fader, With<SelectionFx>>,
) {
    if resets.read().count() == 0 {
        return;
    }

    for (table_ball, mut transform, position, linear, angular) in balls.iter_mut() {
        transform.translation = table_ball.rest_position.extend(transform.translation.z);
        transform.rotation = Quat::IDENTITY;
        if let Some(mut position) = position {
            position.0 = table_ball.rest_position;
        }
        if let Some(mut linear) = linear {
            linear.0 = Vec2::ZERO;
        }
        if let Some(mut angular) = angular {
            angular.0 = 0.0;
        }
    }

    *controller = CueController::for_ball(controller.ball_radius, config.max_pull);
    for (entity, mut visibility) in stick.iter_mut() {
        *visibility = Visibility::Inherited;
        commands.entity(entity).remove::<StickVisibilityChange>();
    }
    for mut fader in highlights.iter_mut() {
        fader.restart();
    }
    next_phase.set(ShotPhase::Aiming);
    info!("table reset");
}
