//! [`ArPlatform`] backed by a WebXR session running in the host page.
//!
//! The page owns the `XRSession`. Bevy asks for hit-test sources and select
//! bindings through outgoing notifications, and the page answers with bridge
//! calls that land in [`WebXrBridge`]:
//!
//! ```text
//! Bevy                                   Page (WebXR)
//!  ├─ request_hit_test_source {request} ──> requestHitTestSource()
//!  │ <── hit_test_source_ready {request, handle}
//!  │ <── hit_test_source_failed {request, message}
//!  │ <── hit_test_result {handle, pose|null}      every XR frame
//!  │ <── viewer_pose {pose}                       every XR frame
//!  │ <── select {ray|null}                        on "select"
//!  ├─ cancel_hit_test_source {handle} ──> source.cancel()
//!  ├─ bind_select / unbind_select ──> add/removeEventListener
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use bevy::prelude::*;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::ar::{
    ArCamera, ArModeController, ArPlacementSet, ArPlatform, ArPlatformHost, FrameClock,
    HitTestHandle, HitTestResolver, PlatformError, Pose, ReferenceSpaceKind, SelectGesture,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error("no pending hit-test source request {0}")]
    UnknownRequest(u64),
    #[error("bridge state unavailable")]
    Poisoned,
}

#[derive(Default)]
struct BridgeState {
    next_request: u64,
    pending: HashMap<u64, HitTestResolver>,
    /// Latest result per live source; `None` means the last frame missed.
    live: HashMap<HitTestHandle, Option<Pose>>,
    gestures: Vec<SelectGesture>,
    select_bound: bool,
    viewer: Option<Pose>,
    outbox: Vec<(&'static str, Value)>,
}

/// Shared state between the platform (inside `ArPlatformHost`) and the RPC
/// handlers receiving page calls.
#[derive(Resource, Clone, Default)]
pub struct WebXrBridge(Arc<Mutex<BridgeState>>);

impl WebXrBridge {
    fn state(&self) -> Result<MutexGuard<'_, BridgeState>, BridgeError> {
        self.0.lock().map_err(|_| BridgeError::Poisoned)
    }

    /// The page created the source for `request`.
    pub fn source_ready(&self, request: u64, handle: HitTestHandle) -> Result<(), BridgeError> {
        let mut state = self.state()?;
        let resolver = state
            .pending
            .remove(&request)
            .ok_or(BridgeError::UnknownRequest(request))?;

        if resolver.resolve(Ok(handle)) {
            state.live.insert(handle, None);
        } else {
            // Session stopped while the request was in flight
            info!("Cancelling late hit-test source {:?}", handle);
            state
                .outbox
                .push(("cancel_hit_test_source", json!({ "handle": handle.0 })));
        }
        Ok(())
    }

    pub fn source_failed(&self, request: u64, message: &str) -> Result<(), BridgeError> {
        let resolver = self
            .state()?
            .pending
            .remove(&request)
            .ok_or(BridgeError::UnknownRequest(request))?;
        let error = if message.is_empty() {
            PlatformError::Unsupported
        } else {
            PlatformError::RequestFailed(message.to_string())
        };
        resolver.resolve(Err(error));
        Ok(())
    }

    /// Record this frame's first hit for `handle`. Results for cancelled
    /// sources are dropped.
    pub fn hit_test_result(&self, handle: HitTestHandle, pose: Option<Pose>) -> Result<bool, BridgeError> {
        let mut state = self.state()?;
        match state.live.get_mut(&handle) {
            Some(latest) => {
                *latest = pose.filter(Pose::is_finite);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn select(&self, ray: Option<Ray3d>) -> Result<bool, BridgeError> {
        let mut state = self.state()?;
        if !state.select_bound {
            return Ok(false);
        }
        state.gestures.push(SelectGesture { ray });
        Ok(true)
    }

    pub fn viewer_pose(&self, pose: Pose) -> Result<(), BridgeError> {
        if pose.is_finite() {
            self.state()?.viewer = Some(pose);
        }
        Ok(())
    }

    pub fn viewer(&self) -> Option<Pose> {
        self.state().ok().and_then(|state| state.viewer)
    }

    /// Notifications queued for the page since the last call.
    pub fn take_outbox(&self) -> Vec<(&'static str, Value)> {
        self.state()
            .map(|mut state| std::mem::take(&mut state.outbox))
            .unwrap_or_default()
    }
}

pub struct WebXrPlatform {
    bridge: WebXrBridge,
}

impl WebXrPlatform {
    pub fn new() -> (Self, WebXrBridge) {
        let bridge = WebXrBridge::default();
        (
            Self {
                bridge: bridge.clone(),
            },
            bridge,
        )
    }
}

impl ArPlatform for WebXrPlatform {
    fn request_hit_test_source(&mut self, space: ReferenceSpaceKind, resolver: HitTestResolver) {
        let Ok(mut state) = self.bridge.state() else {
            resolver.resolve(Err(PlatformError::RequestFailed(
                BridgeError::Poisoned.to_string(),
            )));
            return;
        };
        state.next_request += 1;
        let request = state.next_request;
        state.pending.insert(request, resolver);
        state.outbox.push((
            "request_hit_test_source",
            json!({ "request": request, "space": space.as_str() }),
        ));
    }

    fn poll_hit_test(
        &mut self,
        handle: HitTestHandle,
        _frame: &FrameClock,
        _space: ReferenceSpaceKind,
    ) -> Option<Pose> {
        // The page already reports poses in the local space
        self.bridge.state().ok()?.live.get(&handle).copied().flatten()
    }

    fn cancel_hit_test(&mut self, handle: HitTestHandle) -> Result<(), PlatformError> {
        let mut state = self
            .bridge
            .state()
            .map_err(|err| PlatformError::CancelFailed(err.to_string()))?;
        if state.live.remove(&handle).is_none() {
            return Err(PlatformError::CancelFailed(format!(
                "unknown handle {}",
                handle.0
            )));
        }
        state
            .outbox
            .push(("cancel_hit_test_source", json!({ "handle": handle.0 })));
        Ok(())
    }

    fn bind_select(&mut self) {
        if let Ok(mut state) = self.bridge.state() {
            state.select_bound = true;
            state.outbox.push(("bind_select", json!({})));
        }
    }

    fn unbind_select(&mut self) {
        if let Ok(mut state) = self.bridge.state() {
            state.select_bound = false;
            state.gestures.clear();
            state.outbox.push(("unbind_select", json!({})));
        }
    }

    fn drain_select_gestures(&mut self) -> Vec<SelectGesture> {
        self.bridge
            .state()
            .map(|mut state| std::mem::take(&mut state.gestures))
            .unwrap_or_default()
    }
}

/// Pose as sent by the page: position and an `[x, y, z, w]` quaternion.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct PoseParams {
    pub position: [f32; 3],
    pub orientation: [f32; 4],
}

impl PoseParams {
    pub fn to_pose(self) -> Pose {
        Pose::new(
            Vec3::from_array(self.position),
            Quat::from_array(self.orientation).normalize(),
        )
    }
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct RayParams {
    pub origin: [f32; 3],
    pub direction: [f32; 3],
}

impl RayParams {
    pub fn to_ray(self) -> Option<Ray3d> {
        let direction = Dir3::new(Vec3::from_array(self.direction)).ok()?;
        Some(Ray3d::new(Vec3::from_array(self.origin), direction))
    }
}

/// In AR the page's viewer pose drives the camera.
pub fn apply_viewer_pose(
    bridge: Res<WebXrBridge>,
    controller: Res<ArModeController>,
    mut camera: Query<&mut Transform, With<ArCamera>>,
) {
    if !controller.is_ar_active() {
        return;
    }
    let (Some(pose), Ok(mut transform)) = (bridge.viewer(), camera.single_mut()) else {
        return;
    };
    transform.translation = pose.position();
    transform.rotation = pose.orientation();
}

/// Installs the WebXR platform and the shared bridge.
pub struct WebXrBridgePlugin;

impl Plugin for WebXrBridgePlugin {
    fn build(&self, app: &mut App) {
        let (platform, bridge) = WebXrPlatform::new();
        app.insert_resource(ArPlatformHost::new(platform))
            .insert_resource(bridge)
            .add_systems(Update, apply_viewer_pose.before(ArPlacementSet));
    }
}
