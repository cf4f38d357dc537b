//! Messages emitted by the snooker table.
//!
//! Note: In Bevy 0.18, buffered events use the `Message` trait instead of `Event`.

use bevy::ecs::message::Message;
use bevy::prelude::*;

/// A ball with an [`ImpactSound`](crate::components::ImpactSound) struck
/// another ball hard enough to be heard.
///
/// A ball/ball contact produces one message per participating ball.
///
/// # Fields
/// * `ball` - The body that plays the click
/// * `other` - The ball it struck
/// * `speed_sq` - Squared relative velocity at contact
#[derive(Message, Clone, Debug)]
pub struct BallImpact {
    pub ball: Entity,
    pub other: Entity,
    pub speed_sq: f32,
}

/// The cue struck the cue ball.
///
/// # Fields
/// * `impulse` - Linear impulse applied to the cue ball
/// * `power` - Normalized pull-back in `[0, 1]`, also the strike volume
#[derive(Message, Clone, Debug)]
pub struct ShotTaken {
    pub cue_ball: Entity,
    pub impulse: Vec2,
    pub power: f32,
}

/// The cue ball came to rest after a shot.
#[derive(Message, Clone, Debug)]
pub struct ShotResolved {
    pub cue_ball: Entity,
    pub rest_position: Vec2,
}

/// Request to put every ball back on its rack position.
#[derive(Message, Clone, Debug, Default)]
pub struct ResetTable;
