//! Common types and enums for the snooker table.

use avian2d::prelude::*;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Physics layers used by the table.
///
/// Balls live on [`GameLayer::Ball`], cushions on [`GameLayer::Wall`].
/// Aim prediction casts against these two layers only, so decorative
/// colliders on [`GameLayer::Default`] never block the shot line.
///
/// # Example
/// ```
/// use avian2d::prelude::*;
/// use bevy_snooker2d::types::GameLayer;
///
/// let layers = CollisionLayers::new(GameLayer::Ball, [GameLayer::Ball, GameLayer::Wall]);
/// ```
#[derive(PhysicsLayer, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GameLayer {
    #[default]
    Default,
    /// Every ball on the table, cue ball included
    Ball,
    /// Cushions and table edges
    Wall,
}

/// Phase of the current shot.
///
/// The controller follows the pointer only while [`ShotPhase::Aiming`].
/// After the cue strikes it switches to [`ShotPhase::Resolving`] until the
/// cue ball comes to rest.
#[derive(
    States, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize,
)]
pub enum ShotPhase {
    /// Stick follows the pointer, prediction lines are drawn
    #[default]
    Aiming,
    /// Balls are rolling, input is ignored
    Resolving,
}

/// Result of the aim prediction cast.
///
/// # Fields
/// * `entity` - Collider the cast ball would touch first
/// * `centroid` - Centre of the cast circle at the moment of contact
/// * `normal` - Outward surface normal of the hit collider
/// * `distance` - Travel distance of the cast circle before contact
/// * `target_ball` - Position of the hit body when it is a ball
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct AimHit {
    pub entity: Entity,
    pub centroid: Vec2,
    pub normal: Vec2,
    pub distance: f32,
    pub target_ball: Option<Vec2>,
}

impl AimHit {
    /// Whether the first obstruction is another ball.
    pub fn is_ball(&self) -> bool {
        self.target_ball.is_some()
    }
}
