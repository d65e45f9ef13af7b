use bevy::prelude::*;

use super::controller::{ArModeController, PlacementOutcome};
use super::frame_clock::FrameClock;
use super::hud::HudControl;
use super::log::ArLog;
use super::platform::{ArPlatformHost, SelectGesture};

/// Application-level requests into the placement core.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArCommand {
    EnterAr,
    ExitAr,
    TogglePlacement,
    ClearScene,
}

/// A HUD control was activated outside the select stream (RPC, keyboard).
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HudControlActivated {
    pub control: HudControl,
}

/// Select gesture drained from the platform this frame.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SelectGestureEvent(pub SelectGesture);

/// Result of every placement attempt, for frontends and visuals.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct PlacementAttempted(pub PlacementOutcome);

pub fn handle_ar_commands(
    mut commands: EventReader<ArCommand>,
    mut controller: ResMut<ArModeController>,
    platform: Option<ResMut<ArPlatformHost>>,
    mut log: ResMut<ArLog>,
) {
    let Some(mut platform) = platform else {
        for command in commands.read() {
            warn!("Ignoring {:?}: no AR platform installed", command);
        }
        return;
    };

    for command in commands.read() {
        match command {
            ArCommand::EnterAr => controller.enter_ar(platform.platform(), &mut log),
            ArCommand::ExitAr => controller.exit_ar(platform.platform(), &mut log),
            ArCommand::TogglePlacement => {
                if controller.toggle_placement_mode(&mut log).is_none() {
                    warn!("Placement toggle ignored outside AR");
                }
            }
            ArCommand::ClearScene => controller.clear_scene(&mut log),
        }
    }
}

/// Release the hit-test source and select binding when the app shuts down mid-session.
pub fn dispose_on_exit(
    mut exits: EventReader<AppExit>,
    mut controller: ResMut<ArModeController>,
    platform: Option<ResMut<ArPlatformHost>>,
    mut log: ResMut<ArLog>,
) {
    if exits.read().last().is_none() {
        return;
    }
    if let Some(mut platform) = platform {
        controller.dispose(platform.platform(), &mut log);
    }
}

/// Pull select gestures from the platform; only while a session is bound.
pub fn collect_select_gestures(
    controller: Res<ArModeController>,
    platform: Option<ResMut<ArPlatformHost>>,
    mut gestures: EventWriter<SelectGestureEvent>,
) {
    if !controller.is_ar_active() {
        return;
    }
    let Some(mut platform) = platform else {
        return;
    };

    for gesture in platform.platform().drain_select_gestures() {
        gestures.write(SelectGestureEvent(gesture));
    }
}

pub fn tick_surface_tracking(
    mut controller: ResMut<ArModeController>,
    platform: Option<ResMut<ArPlatformHost>>,
    clock: Res<FrameClock>,
    mut log: ResMut<ArLog>,
) {
    let Some(mut platform) = platform else {
        return;
    };
    controller.tick(platform.platform(), &clock, &mut log);
}

pub fn handle_hud_activations(
    mut events: EventReader<HudControlActivated>,
    mut controller: ResMut<ArModeController>,
    clock: Res<FrameClock>,
    mut log: ResMut<ArLog>,
) {
    for event in events.read() {
        controller.activate_hud(event.control, clock.elapsed, &mut log);
    }
}

/// Route each select gesture: HUD first, then world placement.
///
/// Both run for every gesture. A gesture that lands on a HUD control blocks
/// the gate before the placement attempt sees it.
pub fn route_select_gestures(
    mut gestures: EventReader<SelectGestureEvent>,
    mut controller: ResMut<ArModeController>,
    clock: Res<FrameClock>,
    mut log: ResMut<ArLog>,
    mut outcomes: EventWriter<PlacementAttempted>,
) {
    for SelectGestureEvent(gesture) in gestures.read() {
        let hud_hit = gesture
            .ray
            .and_then(|ray| controller.config().hud.pick(&clock.camera, ray));

        if let Some(control) = hud_hit {
            controller.activate_hud(control, clock.elapsed, &mut log);
        }

        let outcome = controller.attempt_placement(clock.elapsed, &mut log);
        outcomes.write(PlacementAttempted(outcome));
    }
}
