use std::time::Duration;

/// Lockout window that keeps a HUD tap from also landing as a world tap.
///
/// HUD controls and the world share one select stream, so the same gesture
/// reaches both. Touching a control blocks the gate; world placement only
/// goes ahead once the window has passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionGate {
    blocked_until: Option<Duration>,
}

impl InteractionGate {
    /// Reject placement until `now + duration`. Overwrites any earlier block.
    pub fn block(&mut self, now: Duration, duration: Duration) {
        self.blocked_until = Some(now + duration);
    }

    /// Whether a placement may proceed at `now`. Has no side effect.
    pub fn try_consume(&self, now: Duration) -> bool {
        match self.blocked_until {
            Some(until) => now >= until,
            None => true,
        }
    }

    pub fn blocked_until(&self) -> Option<Duration> {
        self.blocked_until
    }

    pub fn reset(&mut self) {
        self.blocked_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_millis(500);

    #[test]
    fn open_by_default() {
        assert!(InteractionGate::default().try_consume(Duration::ZERO));
    }

    #[test]
    fn rejects_inside_window_and_opens_at_its_end() {
        let mut gate = InteractionGate::default();
        let start = Duration::from_millis(1_000);
        gate.block(start, COOLDOWN);

        for offset in [0, 1, 250, 499] {
            assert!(!gate.try_consume(start + Duration::from_millis(offset)), "offset {offset}");
        }
        assert!(gate.try_consume(start + COOLDOWN));
        assert!(gate.try_consume(start + Duration::from_millis(900)));
    }

    #[test]
    fn consuming_does_not_move_the_window() {
        let mut gate = InteractionGate::default();
        gate.block(Duration::ZERO, COOLDOWN);
        let _ = gate.try_consume(Duration::from_millis(100));
        assert_eq!(gate.blocked_until(), Some(COOLDOWN));
    }

    #[test]
    fn reblocking_restarts_the_window() {
        let mut gate = InteractionGate::default();
        gate.block(Duration::ZERO, COOLDOWN);
        gate.block(Duration::from_millis(400), COOLDOWN);
        assert!(!gate.try_consume(Duration::from_millis(600)));
        assert!(gate.try_consume(Duration::from_millis(900)));
    }
}
