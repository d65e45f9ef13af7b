//! Desktop stand-in for an AR session.
//!
//! Hit tests cast the cursor ray onto a flat ground plane and a left click is
//! the select gesture, so the whole placement flow can be driven with a mouse.

use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use constants::ar_placement::DESKTOP_GROUND_HEIGHT;

use super::frame_clock::{ArCamera, FrameClock};
use super::platform::{
    ArPlatform, ArPlatformHost, HitTestHandle, HitTestResolver, PlatformError,
    ReferenceSpaceKind, SelectGesture,
};
use super::pose::Pose;
use super::systems::ArCommand;

#[derive(Default)]
struct DesktopInput {
    cursor_ray: Option<Ray3d>,
    gestures: Vec<SelectGesture>,
    select_bound: bool,
}

/// Shared view of the window input, written by [`feed_desktop_input`].
#[derive(Resource, Clone)]
pub struct DesktopInputFeed(Arc<Mutex<DesktopInput>>);

pub struct DesktopArPlatform {
    input: Arc<Mutex<DesktopInput>>,
    ground_height: f32,
    next_handle: u64,
    active: Option<HitTestHandle>,
}

impl DesktopArPlatform {
    pub fn new(ground_height: f32) -> (Self, DesktopInputFeed) {
        let input = Arc::new(Mutex::new(DesktopInput::default()));
        let platform = Self {
            input: input.clone(),
            ground_height,
            next_handle: 0,
            active: None,
        };
        (platform, DesktopInputFeed(input))
    }
}

impl ArPlatform for DesktopArPlatform {
    fn request_hit_test_source(&mut self, space: ReferenceSpaceKind, resolver: HitTestResolver) {
        self.next_handle += 1;
        let handle = HitTestHandle(self.next_handle);
        if resolver.resolve(Ok(handle)) {
            debug!("Desktop hit-test source {:?} in {} space", handle, space.as_str());
            self.active = Some(handle);
        }
    }

    fn poll_hit_test(
        &mut self,
        handle: HitTestHandle,
        _frame: &FrameClock,
        _space: ReferenceSpaceKind,
    ) -> Option<Pose> {
        if self.active != Some(handle) {
            return None;
        }
        let ray = self.input.lock().ok()?.cursor_ray?;
        ground_plane_intersection(&ray, self.ground_height).map(Pose::from_translation)
    }

    fn cancel_hit_test(&mut self, handle: HitTestHandle) -> Result<(), PlatformError> {
        if self.active != Some(handle) {
            return Err(PlatformError::CancelFailed(format!("unknown handle {}", handle.0)));
        }
        self.active = None;
        Ok(())
    }

    fn bind_select(&mut self) {
        if let Ok(mut input) = self.input.lock() {
            input.select_bound = true;
        }
    }

    fn unbind_select(&mut self) {
        if let Ok(mut input) = self.input.lock() {
            input.select_bound = false;
            input.gestures.clear();
        }
    }

    fn drain_select_gestures(&mut self) -> Vec<SelectGesture> {
        self.input
            .lock()
            .map(|mut input| std::mem::take(&mut input.gestures))
            .unwrap_or_default()
    }
}

/// Ray against the horizontal plane `y = plane_y`, forward hits only.
pub fn ground_plane_intersection(ray: &Ray3d, plane_y: f32) -> Option<Vec3> {
    if ray.direction.y.abs() < 0.001 {
        return None;
    }
    let t = (plane_y - ray.origin.y) / ray.direction.y;
    if t > 0.0 {
        Some(ray.origin + *ray.direction * t)
    } else {
        None
    }
}

/// Publish the cursor ray and left clicks to the desktop platform.
pub fn feed_desktop_input(
    feed: Res<DesktopInputFeed>,
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&GlobalTransform, &Camera), With<ArCamera>>,
) {
    let ray = match (windows.single(), cameras.single()) {
        (Ok(window), Ok((camera_transform, camera))) => window
            .cursor_position()
            .and_then(|cursor| camera.viewport_to_world(camera_transform, cursor).ok()),
        _ => None,
    };

    let Ok(mut input) = feed.0.lock() else {
        return;
    };
    input.cursor_ray = ray;

    if input.select_bound && buttons.just_pressed(MouseButton::Left) {
        input.gestures.push(SelectGesture { ray });
    }
}

/// System handling keyboard shortcuts for AR control (native builds only).
#[cfg(not(target_arch = "wasm32"))]
pub fn handle_ar_keyboard_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    controller: Res<super::controller::ArModeController>,
    mut commands: EventWriter<ArCommand>,
) {
    if keyboard.just_pressed(KeyCode::Tab) {
        commands.write(if controller.is_ar_active() {
            ArCommand::ExitAr
        } else {
            ArCommand::EnterAr
        });
    }

    if keyboard.just_pressed(KeyCode::KeyP) {
        commands.write(ArCommand::TogglePlacement);
    }

    if keyboard.just_pressed(KeyCode::KeyC) {
        commands.write(ArCommand::ClearScene);
    }
}

/// Installs the desktop platform and its input feed.
pub struct DesktopArPlugin;

impl Plugin for DesktopArPlugin {
    fn build(&self, app: &mut App) {
        let (platform, feed) = DesktopArPlatform::new(DESKTOP_GROUND_HEIGHT);
        app.insert_resource(ArPlatformHost::new(platform))
            .insert_resource(feed)
            .add_systems(
                Update,
                feed_desktop_input.before(super::ArPlacementSet),
            );

        #[cfg(not(target_arch = "wasm32"))]
        app.add_systems(
            Update,
            handle_ar_keyboard_shortcuts.before(super::ArPlacementSet),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_meets_ground_in_front() {
        let ray = Ray3d::new(Vec3::new(0.0, 2.0, 0.0), Dir3::new(Vec3::new(0.0, -1.0, -1.0)).unwrap());
        let hit = ground_plane_intersection(&ray, 0.0).unwrap();
        assert!((hit - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn ray_pointing_up_misses() {
        let ray = Ray3d::new(Vec3::new(0.0, 2.0, 0.0), Dir3::Y);
        assert_eq!(ground_plane_intersection(&ray, 0.0), None);
    }

    #[test]
    fn polls_only_the_active_source() {
        let (mut platform, feed) = DesktopArPlatform::new(0.0);
        feed.0.lock().unwrap().cursor_ray = Some(Ray3d::new(Vec3::new(1.0, 1.0, 0.0), Dir3::NEG_Y));

        let resolver = HitTestResolver::new();
        platform.request_hit_test_source(ReferenceSpaceKind::Viewer, resolver.clone());
        let Some(Ok(handle)) = resolver.take() else {
            panic!("desktop platform resolves immediately");
        };

        let frame = FrameClock::default();
        let pose = platform.poll_hit_test(handle, &frame, ReferenceSpaceKind::Local).unwrap();
        assert!((pose.position() - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);

        platform.cancel_hit_test(handle).unwrap();
        assert_eq!(platform.poll_hit_test(handle, &frame, ReferenceSpaceKind::Local), None);
        assert!(platform.cancel_hit_test(handle).is_err());
    }

    #[test]
    fn gestures_are_dropped_on_unbind() {
        let (mut platform, feed) = DesktopArPlatform::new(0.0);
        platform.bind_select();
        feed.0.lock().unwrap().gestures.push(SelectGesture { ray: None });
        platform.unbind_select();
        assert!(platform.drain_select_gestures().is_empty());
    }
}
