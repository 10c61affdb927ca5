#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic platformer kinematics for the controlled body.
//!
//! The engine advances exactly one body per call against a caller-supplied
//! solidity predicate, so it stays independent of how levels store their
//! tiles. Horizontal and vertical motion resolve separately; each axis
//! probes ahead of the motion and snaps flush against the first solid tile
//! it meets.

use backtrack_core::StepInput;

/// Tuning knobs controlling every adjustable aspect of body kinematics.
#[derive(Clone, Debug)]
pub struct Tuning {
    /// Downward acceleration added to vertical velocity every frame.
    pub gravity: f32,
    /// Terminal fall speed; raising it past one tile length per frame would
    /// let the vertical probes skip over thin floors.
    pub max_fall_speed: f32,
    /// Horizontal speed applied instantly while one direction is held.
    pub run_speed: f32,
    /// Vertical velocity applied at launch; negative values point up.
    pub jump_velocity: f32,
    /// Frames after leaving the ground during which a jump still fires.
    pub coyote_frames: u32,
    /// Frames a jump press stays queued while the body is airborne.
    pub jump_buffer_frames: u32,
    /// Frames that must pass between consecutive launches.
    pub jump_cooldown_frames: u32,
    /// Half the body width; lateral probes extend this far from the centre.
    pub half_width: f32,
    /// Height above the feet of the lower lateral probe.
    pub side_probe_low: f32,
    /// Height above the feet of the upper lateral probe.
    pub side_probe_high: f32,
    /// Height above the feet treated as the top of the body.
    pub crown_height: f32,
    /// Clearance kept between the body and any surface it snaps against.
    pub skin: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 0.45,
            max_fall_speed: 10.0,
            run_speed: 1.3,
            jump_velocity: -6.8,
            coyote_frames: 6,
            jump_buffer_frames: 6,
            jump_cooldown_frames: 24,
            half_width: 6.0,
            side_probe_low: 6.0,
            side_probe_high: 20.0,
            crown_height: 21.0,
            skin: 1.0,
        }
    }
}

/// Mutable kinematic state of the controlled body.
///
/// `x` marks the horizontal centre of the body and `y` the feet, with the
/// vertical axis increasing downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// Horizontal centre of the body in world units.
    pub x: f32,
    /// Vertical position of the feet in world units.
    pub y: f32,
    /// Horizontal velocity applied this frame.
    pub vx: f32,
    /// Vertical velocity applied this frame, positive when falling.
    pub vy: f32,
    /// Indicates whether the body rested on solid ground after resolution.
    pub on_ground: bool,
    /// Frames elapsed since the body last rested on the ground.
    pub frames_since_grounded: u32,
    /// Frames remaining until another launch is allowed.
    pub jump_cooldown: u32,
    /// Frames the most recent jump press stays eligible for execution.
    pub jump_buffer: u32,
}

impl Body {
    /// Creates an airborne body at the provided coordinates with no momentum
    /// and no leftover jump grace.
    #[must_use]
    pub fn spawned_at(x: f32, y: f32, tuning: &Tuning) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            on_ground: false,
            frames_since_grounded: tuning.coyote_frames + 1,
            jump_cooldown: 0,
            jump_buffer: 0,
        }
    }
}

/// Advances the body by exactly one frame against the solidity predicate.
///
/// The predicate receives world-space coordinates and must treat everything
/// outside the level as solid. The jump check runs twice: once before
/// gravity integrates, and once more after a landing so that a press
/// buffered just before touchdown still fires on the landing frame.
pub fn step<F>(tuning: &Tuning, tile_length: f32, body: &mut Body, input: StepInput, is_solid: F)
where
    F: Fn(f32, f32) -> bool,
{
    if body.jump_cooldown > 0 {
        body.jump_cooldown -= 1;
    }
    if input.jump {
        body.jump_buffer = tuning.jump_buffer_frames;
    } else if body.jump_buffer > 0 {
        body.jump_buffer -= 1;
    }

    let desired = i32::from(input.right) - i32::from(input.left);
    body.vx = desired as f32 * tuning.run_speed;

    let within_coyote = body.on_ground || body.frames_since_grounded <= tuning.coyote_frames;
    if body.jump_buffer > 0 && within_coyote && body.jump_cooldown == 0 {
        launch(body, tuning);
    }

    body.vy = (body.vy + tuning.gravity).min(tuning.max_fall_speed);

    move_and_collide(tuning, tile_length, body, &is_solid);

    if body.on_ground {
        body.frames_since_grounded = 0;
    } else {
        body.frames_since_grounded = body.frames_since_grounded.saturating_add(1);
    }

    if body.on_ground && body.jump_buffer > 0 && body.jump_cooldown == 0 {
        launch(body, tuning);
    }
}

fn launch(body: &mut Body, tuning: &Tuning) {
    body.vy = tuning.jump_velocity;
    body.on_ground = false;
    body.frames_since_grounded = tuning.coyote_frames + 1;
    body.jump_cooldown = tuning.jump_cooldown_frames;
    body.jump_buffer = 0;
}

fn move_and_collide<F>(tuning: &Tuning, tile_length: f32, body: &mut Body, is_solid: &F)
where
    F: Fn(f32, f32) -> bool,
{
    let mut next_x = body.x + body.vx;
    if body.vx > 0.0 {
        let edge = next_x + tuning.half_width;
        if is_solid(edge, body.y - tuning.side_probe_low)
            || is_solid(edge, body.y - tuning.side_probe_high)
        {
            next_x = (edge / tile_length).floor() * tile_length - (tuning.half_width + tuning.skin);
            body.vx = 0.0;
        }
    } else if body.vx < 0.0 {
        let edge = next_x - tuning.half_width;
        if is_solid(edge, body.y - tuning.side_probe_low)
            || is_solid(edge, body.y - tuning.side_probe_high)
        {
            next_x =
                ((edge / tile_length).floor() + 1.0) * tile_length + tuning.half_width + tuning.skin;
            body.vx = 0.0;
        }
    }
    body.x = next_x;

    let mut next_y = body.y + body.vy;
    if body.vy > 0.0 {
        let sole = next_y + tuning.skin;
        if is_solid(body.x - tuning.half_width, sole) || is_solid(body.x + tuning.half_width, sole)
        {
            next_y = (sole / tile_length).floor() * tile_length - tuning.skin;
            body.vy = 0.0;
            body.on_ground = true;
        }
    } else if body.vy < 0.0 {
        let crown = next_y - tuning.crown_height;
        if is_solid(body.x - tuning.half_width, crown)
            || is_solid(body.x + tuning.half_width, crown)
        {
            next_y = ((crown / tile_length).floor() + 1.0) * tile_length + tuning.crown_height;
            body.vy = 0.0;
        }
    }
    if body.vy != 0.0 {
        body.on_ground = false;
    }
    body.y = next_y;
}
