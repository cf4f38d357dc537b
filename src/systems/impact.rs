//! Impact system - ball click sounds on hard contacts.

use avian2d::prelude::*;
use bevy::audio::Volume;
use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;

use crate::components::{Ball, ImpactSound};
use crate::events::BallImpact;
use crate::resources::{ImpactSoundConfig, SnookerAudio};

/// Turn contact starts between tagged balls into [`BallImpact`] messages.
///
/// Runs inside the physics step, right after the contact start messages
/// are written, so the contact pair still holds the approach speed the
/// narrow phase measured before the solver ran. Each side of a contact is
/// checked on its own: a body with [`ImpactSound`] that touches a [`Ball`]
/// reports the impact when the squared approach speed exceeds the
/// configured threshold. Colliders need `CollisionEventsEnabled` for the
/// physics step to report them.
///
/// # Arguments
/// * `collisions` - Contact start messages from the physics step
/// * `contacts` - Touching contact pairs of the current step
/// * `config` - Impact sound thresholds
/// * `emitters` - Bodies that play a click
/// * `balls` - Tagged balls
/// * `velocities` - Linear velocities, used when the pair is already gone
/// * `impacts` - Output messages
pub fn detect_ball_impacts(
    mut collisions: MessageReader<CollisionStart>,
    contacts: Collisions,
    config: Res<ImpactSoundConfig>,
    emitters: Query<(), With<ImpactSound>>,
    balls: Query<(), With<Ball>>,
    velocities: Query<&LinearVelocity>,
    mut impacts: MessageWriter<BallImpact>,
) {
    for contact in collisions.read() {
        let first = (contact.collider1, contact.body1);
        let second = (contact.collider2, contact.body2);

        let velocity = |(collider, body): (Entity, Option<Entity>)| {
            velocities
                .get(body.unwrap_or(collider))
                .map(|v| v.0)
                .unwrap_or(Vec2::ZERO)
        };
        let speed_sq = contacts
            .get(contact.collider1, contact.collider2)
            .and_then(|pair| {
                approach_speed_sq(
                    pair.manifolds
                        .iter()
                        .flat_map(|manifold| manifold.points.iter())
                        .map(|point| point.normal_speed),
                )
            })
            .unwrap_or_else(|| impact_speed_sq(velocity(first), velocity(second)));
        if !is_audible(speed_sq, config.threshold_sq) {
            continue;
        }

        for (me, other) in [(first, second), (second, first)] {
            let emitter = carrier(me, |e| emitters.contains(e));
            let struck_ball = carrier(other, |e| balls.contains(e));
            if let (Some(ball), Some(other)) = (emitter, struck_ball) {
                impacts.write(BallImpact {
                    ball,
                    other,
                    speed_sq,
                });
            }
        }
    }
}

/// Play the ball click for every reported impact.
pub fn play_impact_sounds(
    mut commands: Commands,
    mut impacts: MessageReader<BallImpact>,
    config: Res<ImpactSoundConfig>,
    audio: Res<SnookerAudio>,
    emitters: Query<&ImpactSound>,
) {
    for impact in impacts.read() {
        let Some(clip) = audio.ball_click.as_ref() else {
            continue;
        };
        let ball_volume = emitters.get(impact.ball).map(|s| s.volume).unwrap_or(1.0);
        commands.spawn((
            AudioPlayer::new(clip.clone()),
            PlaybackSettings::DESPAWN.with_volume(Volume::Linear(config.volume * ball_volume)),
        ));
    }
}

/// Squared approach speed of a contact from its per-point normal speeds.
///
/// Negative normal speeds are approaching. Returns `None` for a contact
/// without points.
pub fn approach_speed_sq(normal_speeds: impl IntoIterator<Item = f32>) -> Option<f32> {
    normal_speeds
        .into_iter()
        .map(|speed| {
            let approach = (-speed).max(0.0);
            approach * approach
        })
        .reduce(f32::max)
}

/// Squared relative velocity of two bodies.
pub fn impact_speed_sq(velocity: Vec2, other_velocity: Vec2) -> f32 {
    (velocity - other_velocity).length_squared()
}

/// Whether an impact is loud enough to play.
pub fn is_audible(speed_sq: f32, threshold_sq: f32) -> bool {
    speed_sq > threshold_sq
}

/// Entity of a contact side that passes `has`: the collider first, then
/// its body.
fn carrier(
    (collider, body): (Entity, Option<Entity>),
    has: impl Fn(Entity) -> bool,
) -> Option<Entity> {
    if has(collider) {
        Some(collider)
    } else {
        body.filter(|b| has(*b))
    }
}
