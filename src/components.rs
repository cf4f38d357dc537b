//! Core components for the snooker table.

use bevy::prelude::*;

/// Tag for every ball on the table.
///
/// Impact sounds only fire when the other body of a contact carries this
/// tag, and the aim prediction draws a target ray when the cast stops on
/// a tagged body.
#[derive(Component, Reflect, Default, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct Ball;

/// Plays the ball click when this body strikes a [`Ball`] hard enough.
///
/// # Fields
/// * `volume` - Per-ball volume multiplier applied on top of the global
///   [`ImpactSoundConfig`](crate::resources::ImpactSoundConfig) volume
#[derive(Component, Reflect, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct ImpactSound {
    pub volume: f32,
}

impl Default for ImpactSound {
    fn default() -> Self {
        Self { volume: 1.0 }
    }
}

/// The ball the cue strikes.
///
/// The radius must match the ball's circle collider: it sizes both the
/// minimum stick offset and the prediction cast.
///
/// # Example
/// ```
/// use bevy_snooker2d::components::CueBall;
///
/// let cue_ball = CueBall::new(0.25);
/// assert_eq!(cue_ball.radius, 0.25);
/// ```
#[derive(Component, Reflect, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct CueBall {
    /// Collider radius (world units)
    pub radius: f32,
}

impl CueBall {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

/// The cue stick. Its transform is driven by the aiming systems.
#[derive(Component, Reflect, Default, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct CueStick;

/// A ball that belongs to the rack and is restored on table reset.
///
/// # Fields
/// * `rest_position` - Where the ball sits when the table is set up
#[derive(Component, Reflect, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct TableBall {
    pub rest_position: Vec2,
}

impl TableBall {
    pub fn at(rest_position: Vec2) -> Self {
        Self { rest_position }
    }
}

/// Marker for the highlight that fades in around the cue ball when a new
/// shot can be taken.
#[derive(Component, Reflect, Default, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct SelectionFx;

/// Linear alpha fade on a sprite.
///
/// Restarting sets the alpha back to full; it then decays to zero over
/// `duration` seconds and the fader goes idle.
///
/// # Example
/// ```
/// use bevy_snooker2d::components::Fader;
///
/// let mut fader = Fader::new(0.5);
/// fader.restart();
/// assert_eq!(fader.alpha(), 1.0);
/// fader.advance(0.25);
/// assert!((fader.alpha() - 0.5).abs() < 1e-6);
/// ```
#[derive(Component, Reflect, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct Fader {
    /// Fade length (seconds)
    pub duration: f32,
    /// Time since the last restart (seconds)
    pub elapsed: f32,
    pub active: bool,
}

impl Default for Fader {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Fader {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: duration,
            active: false,
        }
    }

    pub fn restart(&mut self) {
        self.elapsed = 0.0;
        self.active = true;
    }

    /// Advance the fade. Returns false once the fade has finished.
    pub fn advance(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.elapsed = self.duration;
            self.active = false;
        }
        self.active
    }

    /// Current alpha in `[0, 1]`.
    pub fn alpha(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (1.0 - self.elapsed / self.duration).clamp(0.0, 1.0)
    }
}

/// UI bar showing the current pull-back.
///
/// Put it on the fill node of the bar; its width follows the value as a
/// percentage of the range.
///
/// # Fields
/// * `min` - Value at an empty bar
/// * `max` - Value at a full bar
/// * `value` - Current value
#[derive(Component, Reflect, Default, Clone, Copy, Debug)]
#[reflect(Component)]
pub struct PowerMeter {
    pub min: f32,
    pub max: f32,
    pub value: f32,
}

impl PowerMeter {
    /// Fill fraction in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        let span = self.max - self.min;
        if span.abs() <= f32::EPSILON {
            return 0.0;
        }
        ((self.value - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Pending change of the stick's visibility.
///
/// The stick is hidden shortly after a shot and shown again shortly after
/// the table settles. Inserting a new request replaces the pending one, so
/// the latest request always wins.
#[derive(Component, Clone, Debug)]
pub struct StickVisibilityChange {
    pub timer: Timer,
    pub visible: bool,
}

impl StickVisibilityChange {
    pub fn after(delay: f32, visible: bool) -> Self {
        Self {
            timer: Timer::from_seconds(delay, TimerMode::Once),
            visible,
        }
    }
}
