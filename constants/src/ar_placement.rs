use bevy::math::Vec3;

/// Lockout applied to world placement after any HUD control is touched (milliseconds).
/// Spans a full pointer-down/up pair plus event propagation.
pub const GATE_COOLDOWN_MS: u64 = 500;

/// Distance in front of the camera where the floating preview hovers (metres).
pub const PREVIEW_FOLLOW_DISTANCE: f32 = 1.5;

/// How far below eye level the floating preview sits (metres).
pub const PREVIEW_EYE_DROP: f32 = 0.4;

/// Exponential smoothing rate of the floating preview (1/s).
/// alpha = 1 - exp(-rate * dt)
pub const PREVIEW_FOLLOW_RATE: f32 = 6.0;

/// Camera-local offsets of the HUD controls.
pub const HUD_CLEAR_SCENE_OFFSET: Vec3 = Vec3::new(-0.12, -0.22, -0.6);
pub const HUD_TOGGLE_PLACEMENT_OFFSET: Vec3 = Vec3::new(0.12, -0.22, -0.6);

/// Edge length of a HUD control quad (metres).
pub const HUD_CONTROL_SIZE: f32 = 0.08;

/// Entries kept by the AR log sink before the oldest are dropped.
pub const LOG_HISTORY_LIMIT: usize = 200;

/// Height of the emulated ground plane used by the desktop platform.
pub const DESKTOP_GROUND_HEIGHT: f32 = 0.0;
