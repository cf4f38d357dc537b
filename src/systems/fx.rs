//! Table UI feedback - selection highlight fade and the power meter.

use bevy::prelude::*;

use crate::components::{Fader, PowerMeter};
use crate::resources::CueController;

/// Advance active fades and write their alpha to the sprite.
pub fn update_faders(time: Res<Time>, mut faders: Query<(&mut Fader, &mut Sprite)>) {
    let dt = time.delta_secs();

    for (mut fader, mut sprite) in faders.iter_mut() {
        if !fader.active {
            continue;
        }
        fader.advance(dt);
        sprite.color.set_alpha(fader.alpha());
    }
}

/// Mirror the cue pull-back on every power meter.
pub fn sync_power_meters(
    controller: Res<CueController>,
    mut meters: Query<(&mut PowerMeter, Option<&mut Node>)>,
) {
    if !controller.is_changed() {
        return;
    }
    let (min, max) = controller.meter_range();

    for (mut meter, node) in meters.iter_mut() {
        meter.min = min;
        meter.max = max;
        meter.value = controller.meter_value();
        if let Some(mut node) = node {
            node.width = Val::Percent(meter.fraction() * 100.0);
        }
    }
}
