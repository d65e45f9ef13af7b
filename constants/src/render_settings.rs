/// Scene settings applied until the settings JSON has loaded.
pub const DEFAULT_MODEL_SCALE: f32 = 1.0;
pub const DEFAULT_ROTATION_SPEED: f32 = 0.5;
pub const DEFAULT_AUTO_ROTATE: bool = true;
pub const DEFAULT_AMBIENT_INTENSITY: f32 = 400.0;
pub const DEFAULT_DIRECTIONAL_INTENSITY: f32 = 8_000.0;

/// Reticle ring radii (metres).
pub const RETICLE_INNER_RADIUS: f32 = 0.08;
pub const RETICLE_OUTER_RADIUS: f32 = 0.1;

/// Linear RGBA tints.
pub const RETICLE_COLOUR: [f32; 4] = [1.0, 1.0, 1.0, 0.9];
pub const HUD_IDLE_COLOUR: [f32; 4] = [0.22, 0.24, 0.28, 0.9];
pub const HUD_ACTIVE_COLOUR: [f32; 4] = [0.0, 0.9, 0.0, 0.9];
pub const HUD_CLEAR_COLOUR: [f32; 4] = [0.28, 0.10, 0.10, 0.9];

/// Orbit camera defaults for exploration mode.
pub const ORBIT_DEFAULT_DISTANCE: f32 = 4.0;
pub const ORBIT_MIN_DISTANCE: f32 = 0.5;
pub const ORBIT_MAX_DISTANCE: f32 = 50.0;
pub const ORBIT_DEFAULT_PITCH: f32 = -0.4;
