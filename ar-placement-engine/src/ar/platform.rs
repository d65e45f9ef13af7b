//! Seam between the placement core and whatever provides the AR session.
//!
//! The desktop emulator and the WebXR bridge both implement [`ArPlatform`];
//! tests script their own.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use thiserror::Error;

use super::frame_clock::FrameClock;
use super::pose::Pose;

/// Reference spaces a hit-test source or a pose can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceSpaceKind {
    /// Tracks the viewer; hit-test rays are cast from here.
    Viewer,
    /// Fixed origin near the session start; poses are rendered here.
    Local,
}

impl ReferenceSpaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Local => "local",
        }
    }
}

/// Opaque platform handle of a live hit-test source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitTestHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlatformError {
    #[error("hit testing is not supported by this session")]
    Unsupported,
    #[error("hit-test source request failed: {0}")]
    RequestFailed(String),
    #[error("hit-test source cancellation failed: {0}")]
    CancelFailed(String),
}

pub type HitTestOutcome = Result<HitTestHandle, PlatformError>;

#[derive(Debug)]
struct ResolverSlot {
    live: bool,
    outcome: Option<HitTestOutcome>,
}

/// Completion slot for one hit-test source request.
///
/// The platform keeps a clone and calls [`resolve`](Self::resolve) whenever
/// the request completes, possibly frames later. Once the owning session is
/// stopped the resolver is retired and late results are refused.
#[derive(Debug, Clone)]
pub struct HitTestResolver {
    slot: Arc<Mutex<ResolverSlot>>,
}

impl HitTestResolver {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(ResolverSlot {
                live: true,
                outcome: None,
            })),
        }
    }

    /// Deliver the request result. Returns `false` when the session is gone,
    /// in which case the caller still owns the handle and must cancel it.
    pub fn resolve(&self, outcome: HitTestOutcome) -> bool {
        let Ok(mut slot) = self.slot.lock() else {
            return false;
        };
        if !slot.live || slot.outcome.is_some() {
            return false;
        }
        slot.outcome = Some(outcome);
        true
    }

    pub fn is_live(&self) -> bool {
        self.slot.lock().map(|slot| slot.live).unwrap_or(false)
    }

    pub(crate) fn take(&self) -> Option<HitTestOutcome> {
        self.slot.lock().ok().and_then(|mut slot| slot.outcome.take())
    }

    /// Stop accepting results. Returns a handle that was delivered but never
    /// adopted so the session can cancel it.
    pub(crate) fn retire(&self) -> Option<HitTestHandle> {
        let Ok(mut slot) = self.slot.lock() else {
            return None;
        };
        slot.live = false;
        match slot.outcome.take() {
            Some(Ok(handle)) => Some(handle),
            _ => None,
        }
    }
}

impl Default for HitTestResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// One platform select (tap/trigger) gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectGesture {
    /// World-space target ray, when the platform provides one.
    pub ray: Option<Ray3d>,
}

/// Services the placement core needs from the AR session provider.
pub trait ArPlatform: Send + Sync + 'static {
    /// Ask for a hit-test source in `space`. Completion goes through `resolver`.
    fn request_hit_test_source(&mut self, space: ReferenceSpaceKind, resolver: HitTestResolver);

    /// First result of `handle` for this frame, expressed in `space`.
    fn poll_hit_test(
        &mut self,
        handle: HitTestHandle,
        frame: &FrameClock,
        space: ReferenceSpaceKind,
    ) -> Option<Pose>;

    fn cancel_hit_test(&mut self, handle: HitTestHandle) -> Result<(), PlatformError>;

    /// Start delivering select gestures.
    fn bind_select(&mut self) {}

    /// Stop delivering select gestures.
    fn unbind_select(&mut self) {}

    /// Select gestures received since the last call.
    fn drain_select_gestures(&mut self) -> Vec<SelectGesture>;
}

/// The active platform, owned by the app.
#[derive(Resource)]
pub struct ArPlatformHost(pub Box<dyn ArPlatform>);

impl ArPlatformHost {
    pub fn new(platform: impl ArPlatform) -> Self {
        Self(Box::new(platform))
    }

    pub fn platform(&mut self) -> &mut dyn ArPlatform {
        self.0.as_mut()
    }
}
