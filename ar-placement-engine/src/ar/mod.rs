//! AR placement core: surface tracking, gated tap placement, and the
//! placed-instance registry.
//!
//! ## Architecture
//!
//! [`ArModeController`] is the single owner of session state. It holds the
//! current [`SceneMode`] (exploration or an active [`ArSession`]) and the
//! [`PlacementRegistry`], which outlives sessions and is only emptied by an
//! explicit clear.
//!
//! An `ArSession` bundles the pieces that are rebuilt on every AR entry:
//! - [`HitTestSession`]: platform hit-test source lifecycle
//! - [`SurfaceTracker`]: `NoSurface` / `SurfaceLocked` state machine
//! - [`InteractionGate`]: HUD lockout window
//! - the placement mode flag
//!
//! ## Frame Flow
//!
//! ```text
//! ArCommand events
//!   └─> handle_ar_commands()        enter/exit/toggle/clear
//! sample_frame_clock()              Time + ArCamera pose -> FrameClock
//! collect_select_gestures()         platform -> SelectGestureEvent
//! tick_surface_tracking()           hit test poll -> tracker update
//! handle_hud_activations()          HUD events -> gate block + action
//! route_select_gestures()           HUD pick, then gated placement
//! ```
//!
//! The chain runs in [`ArPlacementSet`]; visuals run after it, so the reticle
//! and a same-frame tap always agree on the pose.
//!
//! ## Platforms
//!
//! Anything that provides hit tests and select gestures implements
//! [`ArPlatform`] and is installed as the [`ArPlatformHost`] resource. The
//! desktop emulator lives in [`desktop`]; the WebXR bridge in
//! `crate::rpc::webxr_bridge`.

/// Gated tap placement and session lifecycle.
pub mod controller;

/// Desktop AR emulation: cursor ray against the ground plane.
pub mod desktop;

/// Frame timing and camera pose sampling.
pub mod frame_clock;

/// HUD lockout window.
pub mod gate;


/// Camera-facing HUD controls and ray picking.
pub mod hud;

/// User-facing event sink.
pub mod log;

/// Platform seam: hit tests, select gestures.
pub mod platform;

pub mod pose;

/// Placed instance storage.
pub mod registry;

/// Surface detection state machine and floating preview.
pub mod surface;

/// Bevy events and systems driving the controller.
pub mod systems;

/// Reticle, preview, placed models, and HUD meshes.
pub mod visuals;

use bevy::prelude::*;

pub use controller::{
    ArModeController, ArPlacementConfig, ArSession, PlacementOutcome, PlacementRejection,
    SceneMode, SceneView,
};
pub use frame_clock::{ArCamera, FrameClock};
pub use gate::InteractionGate;
pub use hit_test::HitTestSession;
pub use hud::{HudControl, HudOverlay};
pub use log::{ArLog, ArLogEvent};
pub use platform::{
    ArPlatform, ArPlatformHost, HitTestHandle, HitTestResolver, PlatformError,
    ReferenceSpaceKind, SelectGesture,
};
pub use pose::Pose;
pub use registry::{InstanceId, PlacedInstance, PlacementError, PlacementRegistry};
pub use surface::{PreviewFollow, SurfaceSnapshot, SurfaceState, SurfaceTracker};
pub use systems::{ArCommand, HudControlActivated, PlacementAttempted, SelectGestureEvent};

use frame_clock::sample_frame_clock;
use systems::{
    collect_select_gestures, dispose_on_exit, handle_ar_commands, handle_hud_activations,
    route_select_gestures, tick_surface_tracking,
};

/// Ordering anchor for everything that reads the controller after this frame's update.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArPlacementSet;

/// Registers the placement core. Needs no rendering resources, so it also
/// runs under `MinimalPlugins`.
#[derive(Default)]
pub struct ArPlacementPlugin {
    pub config: ArPlacementConfig,
}

impl Plugin for ArPlacementPlugin {
    fn build(&self, app: &mut App) {
        app
            // init resources
            .insert_resource(ArModeController::new(self.config))
            .init_resource::<ArLog>()
            .init_resource::<FrameClock>()
            .add_event::<ArCommand>()
            .add_event::<HudControlActivated>()
            .add_event::<SelectGestureEvent>()
            .add_event::<PlacementAttempted>()
            .add_systems(
                Update,
                (
                    handle_ar_commands,
                    sample_frame_clock,
                    collect_select_gestures,
                    tick_surface_tracking,
                    handle_hud_activations,
                    route_select_gestures,
                )
                    .chain()
                    .in_set(ArPlacementSet),
            )
            .add_systems(Last, dispose_on_exit);
    }
}
