use bevy::prelude::*;

use crate::debug_lines::{DebugLines, DepthTestedLineGizmos, OverlayLineGizmos};

/// Stamp the line buffer with the frame's clock.
pub fn sync_debug_clock(time: Res<Time>, mut lines: ResMut<DebugLines>) {
    lines.set_clock(time.elapsed_secs());
}

/// Flip the overlay when its toggle key is pressed.
pub fn toggle_debug_lines(keys: Res<ButtonInput<KeyCode>>, mut lines: ResMut<DebugLines>) {
    if keys.just_pressed(lines.toggle_key) {
        lines.display_lines = !lines.display_lines;
        debug!("debug lines {}", if lines.display_lines { "shown" } else { "hidden" });
    }
}

/// Age lines while the overlay is hidden.
pub fn prune_hidden_debug_lines(mut lines: ResMut<DebugLines>) {
    if lines.display_lines {
        return;
    }
    lines.prune();
}

/// Draw queued lines through the depth-tested and overlay gizmo groups.
///
/// Runs after everything else in the frame so lines queued this frame are
/// drawn before single-frame ones are evicted.
pub fn draw_debug_lines(
    mut lines: ResMut<DebugLines>,
    mut depth_tested: Gizmos<DepthTestedLineGizmos>,
    mut overlay: Gizmos<OverlayLineGizmos>,
) {
    if !lines.display_lines {
        return;
    }

    lines.draw_and_prune(
        |line| depth_tested.line(line.start, line.end, line.color),
        |line| overlay.line(line.start, line.end, line.color),
    );
}
