//! # Bevy Snooker 2D
//!
//! A 2D snooker table for Bevy 0.18 on top of avian2d physics.
//!
//! ## Features
//! - Cue stick that follows the pointer, scroll-wheel pull-back and
//!   pull-back scaled strikes
//! - Shot prediction: shape cast of the cue ball with deflection and
//!   object ball direction lines
//! - Ball click sounds on hard ball/ball contacts
//! - Timed immediate-mode debug lines with depth-tested and overlay passes
//!
//! ## Quick Start
//! ```rust,no_run
//! use avian2d::prelude::*;
//! use bevy::prelude::*;
//! use bevy_snooker2d::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(PhysicsPlugins::default())
//!         .add_plugins(SnookerPluginGroup)
//!         .run();
//! }
//! ```

pub mod components;
pub mod debug_lines;
pub mod events;
pub mod resources;
pub mod systems;
pub mod types;

#[cfg(test)]
mod snooker_tests;

pub mod prelude {
    pub use crate::components::*;
    pub use crate::debug_lines::{DebugLines, LineStyle, TimedLine};
    pub use crate::events::*;
    pub use crate::resources::*;
    pub use crate::types::*;
    pub use crate::SnookerPluginGroup;
    pub use crate::{CuePlugin, DebugLinesPlugin, ImpactSoundPlugin};
}

use avian2d::prelude::{CollisionStart, PhysicsSchedule, PhysicsStepSystems, SpatialQueryPipeline};
use bevy::gizmos::GizmoMeshSystems;
use bevy::prelude::*;

use crate::debug_lines::{DebugLines, DepthTestedLineGizmos, OverlayLineGizmos};
use crate::types::ShotPhase;

/// Main plugin group with every table subsystem.
///
/// Physics is not included: add avian2d's `PhysicsPlugins` alongside it.
#[derive(Default)]
pub struct SnookerPluginGroup;

impl PluginGroup for SnookerPluginGroup {
    fn build(self) -> bevy::app::PluginGroupBuilder {
        bevy::app::PluginGroupBuilder::start::<Self>()
            .add(ImpactSoundPlugin)
            .add(DebugLinesPlugin)
            .add(CuePlugin)
    }
}

/// Ball click sounds.
///
/// # Systems
/// - `detect_ball_impacts` - Filters contact starts down to audible ball
///   impacts at the end of each physics step
/// - `play_impact_sounds` - Plays the click for each impact
pub struct ImpactSoundPlugin;

impl Plugin for ImpactSoundPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<components::Ball>()
            .register_type::<components::ImpactSound>()
            .register_type::<resources::ImpactSoundConfig>()
            .init_resource::<resources::ImpactSoundConfig>()
            .init_resource::<resources::SnookerAudio>()
            .add_message::<CollisionStart>()
            .add_message::<events::BallImpact>()
            .add_systems(
                PhysicsSchedule,
                systems::impact::detect_ball_impacts.in_set(PhysicsStepSystems::Last),
            )
            .add_systems(Update, systems::impact::play_impact_sounds);
    }
}

/// Timed debug line overlay.
///
/// The clock is stamped in `First`, hidden lines age in `Update` and the
/// draw pass runs in `Last` before the gizmo meshes are built, so lines
/// queued during the frame show up in that same frame.
pub struct DebugLinesPlugin;

impl Plugin for DebugLinesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DebugLines>()
            .init_gizmo_group::<DepthTestedLineGizmos>()
            .insert_gizmo_config(
                OverlayLineGizmos,
                GizmoConfig {
                    depth_bias: -1.0,
                    ..default()
                },
            )
            .add_systems(First, systems::debug::sync_debug_clock)
            .add_systems(
                Update,
                (
                    systems::debug::toggle_debug_lines,
                    systems::debug::prune_hidden_debug_lines,
                )
                    .chain(),
            )
            .add_systems(
                Last,
                systems::debug::draw_debug_lines.before(GizmoMeshSystems),
            );
    }
}

/// Cue aiming and shooting.
///
/// Prediction lines go to the [`DebugLines`] buffer when one exists. Add
/// [`DebugLinesPlugin`] (or the whole [`SnookerPluginGroup`]) to see them.
///
/// # Systems
/// - `setup_cue_controller` - Sizes the pull-back range when a cue ball appears
/// - `track_pointer` / `adjust_pull_back` - Pointer and scroll input
/// - `aim_stick` / `predict_shot` / `take_shot` - Aiming phase
/// - `resolve_shot` - Waits for the cue ball to stop
/// - `apply_stick_visibility`, `reset_table`, `update_faders`, `sync_power_meters`
pub struct CuePlugin;

impl Plugin for CuePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<components::CueBall>()
            .register_type::<components::CueStick>()
            .register_type::<components::TableBall>()
            .register_type::<components::SelectionFx>()
            .register_type::<components::Fader>()
            .register_type::<components::PowerMeter>()
            .register_type::<resources::CueConfig>()
            .register_type::<resources::CueController>()
            .init_resource::<resources::CueConfig>()
            .init_resource::<resources::CueController>()
            .init_resource::<resources::AimPointer>()
            .init_resource::<resources::SnookerAudio>()
            .init_state::<ShotPhase>()
            .add_message::<events::ShotTaken>()
            .add_message::<events::ShotResolved>()
            .add_message::<events::ResetTable>()
            .add_systems(
                Update,
                (
                    systems::aiming::setup_cue_controller,
                    systems::aiming::track_pointer,
                    systems::aiming::adjust_pull_back,
                    systems::aiming::aim_stick.run_if(in_state(ShotPhase::Aiming)),
                    systems::aiming::predict_shot.run_if(
                        in_state(ShotPhase::Aiming).and(resource_exists::<SpatialQueryPipeline>),
                    ),
                    systems::shot::take_shot.run_if(in_state(ShotPhase::Aiming)),
                    systems::shot::resolve_shot.run_if(in_state(ShotPhase::Resolving)),
                    systems::shot::apply_stick_visibility,
                    systems::shot::reset_table,
                    systems::fx::update_faders,
                    systems::fx::sync_power_meters,
                )
                    .chain(),
            );
    }
}
