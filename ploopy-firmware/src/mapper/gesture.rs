use crate::input::WheelDirection;

/// Counts wheel detents in one direction until they add up to a back/forward gesture.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(super) struct WheelGesture {
    count: i8,
    last_pulse: u64,
}

impl WheelGesture {
    /// Returns the gesture direction once `threshold` detents have been turned in one direction
    /// with no gap longer than `timeout`.
    pub(super) fn pulse(
        &mut self,
        now: u64,
        direction: WheelDirection,
        threshold: u8,
        timeout: u16,
    ) -> Option<WheelDirection> {
        let sign = direction.sign();
        if self.count != 0 && (self.count.signum() != sign || now >= self.deadline(timeout)) {
            self.count = 0;
        }
        self.count = self.count.saturating_add(sign);
        self.last_pulse = now;

        if self.count.unsigned_abs() >= threshold {
            self.count = 0;
            Some(direction)
        } else {
            None
        }
    }

    pub(super) fn deadline(&self, timeout: u16) -> u64 {
        if self.count == 0 {
            u64::MAX
        } else {
            self.last_pulse + timeout as u64
        }
    }

    pub(super) fn expire(&mut self, now: u64, timeout: u16) -> bool {
        if now >= self.deadline(timeout) {
            self.count = 0;
            true
        } else {
            false
        }
    }

    pub(super) fn clear(&mut self) {
        self.count = 0;
    }

    #[cfg(test)]
    pub(super) fn count(&self) -> i8 {
        self.count
    }
}

#[cfg(test)]
#[path = "gesture_test.rs"]
mod test;
