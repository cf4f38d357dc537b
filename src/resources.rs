//! Global resources for the snooker table.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::systems::aiming::remap;
use crate::types::AimHit;

/// Tuning for the cue controller.
///
/// # Fields
/// * `max_pull` - Furthest the stick can be drawn back from the ball centre
/// * `force_multiplier` - Impulse per unit of pull-back
/// * `impulse_offset` - Pull-back added on top of the minimum so the softest
///   shot still moves the ball
/// * `cast_distance` - Reach of the aim prediction cast
/// * `rest_speed_sq` - Squared cue ball speed under which the table counts as settled
/// * `stick_toggle_delay` - Delay before the stick hides after a shot and
///   reappears after the table settles (seconds)
/// * `scroll_sensitivity` - Pull-back change per scroll line
/// * `target_ray_length` - Length of the predicted object ball direction ray
/// * `debug_draw` - Draw the prediction lines
///
/// # Example
/// ```
/// use bevy_snooker2d::resources::CueConfig;
///
/// let config = CueConfig {
///     force_multiplier: 4.0,
///     ..Default::default()
/// };
/// assert_eq!(config.max_pull, 3.0);
/// ```
#[derive(Resource, Reflect, Clone, Debug, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct CueConfig {
    pub max_pull: f32,
    pub force_multiplier: f32,
    pub impulse_offset: f32,
    pub cast_distance: f32,
    pub rest_speed_sq: f32,
    pub stick_toggle_delay: f32,
    pub scroll_sensitivity: f32,
    pub target_ray_length: f32,
    pub debug_draw: bool,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            max_pull: 3.0,
            force_multiplier: 2.5,
            impulse_offset: 0.02,
            cast_distance: 99.0,
            rest_speed_sq: 0.015,
            stick_toggle_delay: 0.2,
            scroll_sensitivity: 0.1,
            target_ray_length: 10.0,
            debug_draw: true,
        }
    }
}

/// Tuning for ball click sounds.
///
/// # Fields
/// * `threshold_sq` - Squared relative impact speed a contact must exceed
/// * `volume` - Global click volume
#[derive(Resource, Reflect, Clone, Debug, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct ImpactSoundConfig {
    pub threshold_sq: f32,
    pub volume: f32,
}

impl Default for ImpactSoundConfig {
    fn default() -> Self {
        Self {
            threshold_sq: 1.0,
            volume: 1.0,
        }
    }
}

/// Audio clips played by the table. Missing clips are skipped silently.
#[derive(Resource, Default, Clone)]
pub struct SnookerAudio {
    pub ball_click: Option<Handle<AudioSource>>,
    pub cue_strike: Option<Handle<AudioSource>>,
}

/// Pointer position in world space, refreshed from the primary window
/// cursor every frame. Keeps its last value while the cursor is outside.
#[derive(Resource, Default, Clone, Copy, Debug)]
pub struct AimPointer(pub Option<Vec2>);

/// Runtime state of the cue.
///
/// Distances are signed offsets along the stick's up axis measured from
/// the cue ball centre, so a drawn-back stick has a negative `dist`.
/// `max_dist <= dist <= min_dist` always holds.
///
/// # Fields
/// * `ball_radius` - Cue ball radius
/// * `min_dist` - Closest stick offset, one and a half radii behind the ball
/// * `max_dist` - Furthest stick offset
/// * `dist` - Current stick offset
/// * `last_hit` - Latest aim prediction result
#[derive(Resource, Reflect, Clone, Debug, Default)]
#[reflect(Resource)]
pub struct CueController {
    pub ball_radius: f32,
    pub min_dist: f32,
    pub max_dist: f32,
    pub dist: f32,
    pub last_hit: Option<AimHit>,
}

impl CueController {
    /// Controller for a cue ball of the given radius, stick halfway drawn.
    ///
    /// # Example
    /// ```
    /// use bevy_snooker2d::resources::CueController;
    ///
    /// let cue = CueController::for_ball(0.25, 3.0);
    /// assert_eq!(cue.min_dist, -0.375);
    /// assert_eq!(cue.max_dist, -3.0);
    /// assert_eq!(cue.dist, -1.5);
    /// ```
    pub fn for_ball(ball_radius: f32, max_pull: f32) -> Self {
        let min_dist = -(ball_radius + ball_radius / 2.0);
        // A ball too large for the pull range pins the stick at the minimum.
        let max_dist = (-max_pull).min(min_dist);
        Self {
            ball_radius,
            min_dist,
            max_dist,
            dist: (max_dist / 2.0).clamp(max_dist, min_dist),
            last_hit: None,
        }
    }

    /// Move the stick by `delta` along its up axis, staying in range.
    pub fn adjust(&mut self, delta: f32) {
        self.dist = (self.dist + delta).clamp(self.max_dist, self.min_dist);
    }

    /// Power meter range as `(min, max)`.
    pub fn meter_range(&self) -> (f32, f32) {
        (-self.min_dist, -self.max_dist)
    }

    /// Power meter value: the pull-back distance.
    pub fn meter_value(&self) -> f32 {
        -self.dist
    }

    /// Normalized pull-back, 0 at the minimum and 1 at the maximum.
    pub fn power(&self) -> f32 {
        remap(self.dist, self.max_dist, self.min_dist, 1.0, 0.0).clamp(0.0, 1.0)
    }

    /// Impulse the stick at `stick` gives the ball at `ball`.
    pub fn shot_impulse(&self, ball: Vec2, stick: Vec2, config: &CueConfig) -> Vec2 {
        let pull = -(self.dist - self.min_dist - config.impulse_offset);
        (ball - stick).normalize_or_zero() * pull * config.force_multiplier
    }
}
