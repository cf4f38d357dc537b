//! Timed immediate-mode debug lines.
//!
//! Lines are queued on the [`DebugLines`] resource from any system and
//! drawn through gizmos once per frame. Every line carries a lifetime: a
//! zero-duration line is drawn for exactly one frame, longer ones are drawn
//! every frame until their age reaches the duration.
//!
//! Two passes exist. Depth-tested lines go through [`DepthTestedLineGizmos`]
//! and can be hidden behind scene geometry; the rest go through
//! [`OverlayLineGizmos`], which is configured to draw on top of everything.
//!
//! ```
//! use bevy::prelude::*;
//! use bevy_snooker2d::debug_lines::{DebugLines, LineStyle};
//!
//! let mut lines = DebugLines::default();
//! lines.draw_line(Vec3::ZERO, Vec3::X, LineStyle::default());
//! let red = LineStyle::colored(Color::srgb(1.0, 0.0, 0.0)).with_duration(2.0);
//! lines.draw_ray(Vec3::ZERO, Vec3::Y, red);
//! assert_eq!(lines.overlay().len(), 2);
//! ```

use std::f32::consts::TAU;
use std::time::Duration;

use bevy::platform::time::Instant;
use bevy::prelude::*;

/// Gizmo group for lines that respect scene depth.
#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct DepthTestedLineGizmos;

/// Gizmo group for lines drawn on top of the scene.
#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct OverlayLineGizmos;

const CIRCLE_STEP: f32 = 0.2;
const CIRCLE_TICK: f32 = 0.02;

/// Appearance and lifetime of a queued line.
///
/// # Fields
/// * `color` - Line color, white by default
/// * `duration` - Lifetime in seconds; zero draws the line for one frame
/// * `depth_test` - Draw in the depth-tested pass instead of the overlay
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineStyle {
    pub color: Color,
    pub duration: f32,
    pub depth_test: bool,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            duration: 0.0,
            depth_test: false,
        }
    }
}

impl LineStyle {
    /// Single-frame overlay line of the given color.
    pub fn colored(color: impl Into<Color>) -> Self {
        Self {
            color: color.into(),
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<Color>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_depth_test(mut self, depth_test: bool) -> Self {
        self.depth_test = depth_test;
        self
    }
}

/// A queued line segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimedLine {
    pub start: Vec3,
    pub end: Vec3,
    pub color: Color,
    /// Clock value when the line was queued (seconds)
    pub start_time: f32,
    pub duration: f32,
}

impl TimedLine {
    /// Whether the line has lived its full duration at time `now`.
    pub fn expired(&self, now: f32) -> bool {
        now - self.start_time >= self.duration
    }
}

/// Buffer of timed debug lines, one per app.
///
/// # Fields
/// * `display_lines` - Draw the buffer; while false, lines only age
/// * `toggle_key` - Key that flips `display_lines`
#[derive(Resource, Clone, Debug)]
pub struct DebugLines {
    pub display_lines: bool,
    pub toggle_key: KeyCode,
    depth_tested: Vec<TimedLine>,
    overlay: Vec<TimedLine>,
    now: f32,
    last_pass: Duration,
}

impl Default for DebugLines {
    fn default() -> Self {
        Self {
            display_lines: true,
            toggle_key: KeyCode::F3,
            depth_tested: Vec::new(),
            overlay: Vec::new(),
            now: 0.0,
            last_pass: Duration::ZERO,
        }
    }
}

impl DebugLines {
    /// Set the clock used to stamp and age lines.
    pub fn set_clock(&mut self, now: f32) {
        self.now = now;
    }

    pub fn now(&self) -> f32 {
        self.now
    }

    pub fn depth_tested(&self) -> &[TimedLine] {
        &self.depth_tested
    }

    pub fn overlay(&self) -> &[TimedLine] {
        &self.overlay
    }

    pub fn len(&self) -> usize {
        self.depth_tested.len() + self.overlay.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth_tested.is_empty() && self.overlay.is_empty()
    }

    /// Time spent in the last prune or draw pass.
    pub fn last_pass(&self) -> Duration {
        self.last_pass
    }

    pub fn clear(&mut self) {
        self.depth_tested.clear();
        self.overlay.clear();
    }

    /// Queue a line segment.
    ///
    /// Degenerate segments are dropped, and so are single-frame lines while
    /// the overlay is hidden since they would expire unseen.
    pub fn draw_line(&mut self, start: Vec3, end: Vec3, style: LineStyle) {
        if style.duration == 0.0 && !self.display_lines {
            return;
        }
        if start == end {
            return;
        }
        let line = TimedLine {
            start,
            end,
            color: style.color,
            start_time: self.now,
            duration: style.duration,
        };
        if style.depth_test {
            self.depth_tested.push(line);
        } else {
            self.overlay.push(line);
        }
    }

    /// Queue a segment from `start` to `start + dir`.
    pub fn draw_ray(&mut self, start: Vec3, dir: Vec3, style: LineStyle) {
        if dir == Vec3::ZERO {
            return;
        }
        self.draw_line(start, start + dir, style);
    }

    /// Queue an arrow from `start` to `end`.
    pub fn draw_line_arrow(
        &mut self,
        start: Vec3,
        end: Vec3,
        head_length: f32,
        head_angle_deg: f32,
        style: LineStyle,
    ) {
        self.draw_arrow(start, end - start, head_length, head_angle_deg, style);
    }

    /// Queue an arrow along `dir` with two head strokes at the tip.
    ///
    /// The head strokes are the reversed direction rotated by
    /// `±head_angle_deg` around the view axis (+Z), so they stay in the
    /// table plane. Arrows pointing along Z rotate around +Y instead.
    pub fn draw_arrow(
        &mut self,
        start: Vec3,
        dir: Vec3,
        head_length: f32,
        head_angle_deg: f32,
        style: LineStyle,
    ) {
        if dir == Vec3::ZERO {
            return;
        }
        self.draw_ray(start, dir, style);

        let back = -dir.normalize();
        let axis = if back.cross(Vec3::Z).length_squared() > 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let angle = head_angle_deg.to_radians();
        let right = Quat::from_axis_angle(axis, angle) * back;
        let left = Quat::from_axis_angle(axis, -angle) * back;
        let tip = start + dir;
        self.draw_ray(tip, right * head_length, style);
        self.draw_ray(tip, left * head_length, style);
    }

    /// Queue the outline of the unit square in the local XZ plane.
    pub fn draw_square(&mut self, matrix: Mat4, style: LineStyle) {
        let p1 = matrix.transform_point3(Vec3::new(0.5, 0.0, 0.5));
        let p2 = matrix.transform_point3(Vec3::new(0.5, 0.0, -0.5));
        let p3 = matrix.transform_point3(Vec3::new(-0.5, 0.0, -0.5));
        let p4 = matrix.transform_point3(Vec3::new(-0.5, 0.0, 0.5));

        self.draw_line(p1, p2, style);
        self.draw_line(p2, p3, style);
        self.draw_line(p3, p4, style);
        self.draw_line(p4, p1, style);
    }

    pub fn draw_square_at(
        &mut self,
        position: Vec3,
        rotation: Quat,
        scale: Vec3,
        style: LineStyle,
    ) {
        self.draw_square(
            Mat4::from_scale_rotation_translation(scale, rotation, position),
            style,
        );
    }

    /// Like [`draw_square_at`](Self::draw_square_at) with rotation given as
    /// Euler angles in degrees (applied Z, then X, then Y).
    pub fn draw_square_euler(
        &mut self,
        position: Vec3,
        euler_deg: Vec3,
        scale: Vec3,
        style: LineStyle,
    ) {
        self.draw_square_at(position, euler_rotation(euler_deg), scale, style);
    }

    /// Queue the twelve edges of the unit cube.
    pub fn draw_cube(&mut self, matrix: Mat4, style: LineStyle) {
        let corner = |x: f32, y: f32, z: f32| matrix.transform_point3(Vec3::new(x, y, z));
        let down = [
            corner(0.5, -0.5, 0.5),
            corner(0.5, -0.5, -0.5),
            corner(-0.5, -0.5, -0.5),
            corner(-0.5, -0.5, 0.5),
        ];
        let up = [
            corner(0.5, 0.5, 0.5),
            corner(0.5, 0.5, -0.5),
            corner(-0.5, 0.5, -0.5),
            corner(-0.5, 0.5, 0.5),
        ];

        for i in 0..4 {
            let next = (i + 1) % 4;
            self.draw_line(down[i], down[next], style);
            self.draw_line(down[i], up[i], style);
            self.draw_line(up[i], up[next], style);
        }
    }

    pub fn draw_cube_at(
        &mut self,
        position: Vec3,
        rotation: Quat,
        scale: Vec3,
        style: LineStyle,
    ) {
        self.draw_cube(
            Mat4::from_scale_rotation_translation(scale, rotation, position),
            style,
        );
    }

    pub fn draw_cube_euler(
        &mut self,
        position: Vec3,
        euler_deg: Vec3,
        scale: Vec3,
        style: LineStyle,
    ) {
        self.draw_cube_at(position, euler_rotation(euler_deg), scale, style);
    }

    /// Queue a dotted circle in the XY plane: one short vertical tick
    /// every 0.2 rad.
    pub fn draw_circle(&mut self, center: Vec3, radius: f32, style: LineStyle) {
        let mut theta = 0.0_f32;
        while theta < TAU {
            let point = Vec3::new(
                theta.cos() * radius + center.x,
                theta.sin() * radius + center.y,
                center.z,
            );
            self.draw_line(point, point + Vec3::new(0.0, CIRCLE_TICK, 0.0), style);
            theta += CIRCLE_STEP;
        }
    }

    /// Drop expired lines without drawing them.
    pub fn prune(&mut self) {
        let started = Instant::now();
        let now = self.now;
        self.depth_tested.retain(|line| !line.expired(now));
        self.overlay.retain(|line| !line.expired(now));
        self.last_pass = started.elapsed();
    }

    /// Hand every line to its pass, depth-tested lines first, then drop
    /// the expired ones.
    pub fn draw_and_prune(
        &mut self,
        mut depth_tested: impl FnMut(&TimedLine),
        mut overlay: impl FnMut(&TimedLine),
    ) {
        let started = Instant::now();
        let now = self.now;
        self.depth_tested.retain(|line| {
            depth_tested(line);
            !line.expired(now)
        });
        self.overlay.retain(|line| {
            overlay(line);
            !line.expired(now)
        });
        self.last_pass = started.elapsed();
    }
}

fn euler_rotation(euler_deg: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        euler_deg.y.to_radians(),
        euler_deg.x.to_radians(),
        euler_deg.z.to_radians(),
    )
}
