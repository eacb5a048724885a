use ploopy_common::globals::TrackballConfig;

use crate::input::Motion;

/// Sensor resolution selection and the drag scroll accumulator.
#[derive(Debug, Default)]
pub(super) struct Pointing {
    dpi_index: u8,
    sniper: bool,
    drag_momentary: bool,
    drag_latched: bool,
    scroll_h: f32,
    scroll_v: f32,
    cpi: u16,
}

impl Pointing {
    pub(super) fn new(config: &TrackballConfig, saved_dpi_index: Option<u8>) -> Self {
        let dpi_index = config.dpi_index(saved_dpi_index);
        Self {
            dpi_index,
            cpi: config.dpi(dpi_index),
            ..Default::default()
        }
    }

    pub(super) fn dpi_index(&self) -> u8 {
        self.dpi_index
    }

    /// The CPI last handed to the sensor.
    pub(super) fn cpi(&self) -> u16 {
        self.cpi
    }

    pub(super) fn is_drag_scrolling(&self) -> bool {
        self.drag_momentary || self.drag_latched
    }

    #[cfg(test)]
    pub(super) fn is_drag_latched(&self) -> bool {
        self.drag_latched
    }

    pub(super) fn next_dpi(&mut self, config: &TrackballConfig) -> u8 {
        self.dpi_index = config.next_dpi_index(self.dpi_index);
        self.dpi_index
    }

    pub(super) fn set_sniper(&mut self, on: bool) {
        self.sniper = on;
    }

    pub(super) fn set_drag_momentary(&mut self, on: bool) {
        let was = self.is_drag_scrolling();
        self.drag_momentary = on;
        self.drag_changed(was);
    }

    pub(super) fn toggle_drag_latch(&mut self) {
        let was = self.is_drag_scrolling();
        self.drag_latched = !self.drag_latched;
        self.drag_changed(was);
    }

    pub(super) fn cancel_drag_latch(&mut self) -> bool {
        if !self.drag_latched {
            return false;
        }
        let was = self.is_drag_scrolling();
        self.drag_latched = false;
        self.drag_changed(was);
        true
    }

    fn drag_changed(&mut self, was: bool) {
        if was != self.is_drag_scrolling() {
            self.scroll_h = 0.0;
            self.scroll_v = 0.0;
        }
    }

    fn effective_cpi(&self, config: &TrackballConfig) -> u16 {
        if self.is_drag_scrolling() {
            config.drag_scroll_dpi(self.dpi_index)
        } else if self.sniper {
            config.sniper_dpi
        } else {
            config.dpi(self.dpi_index)
        }
    }

    /// Recalculate the sensor resolution. Returns the new CPI only if it changed.
    pub(super) fn update_cpi(&mut self, config: &TrackballConfig) -> Option<u16> {
        let cpi = self.effective_cpi(config);
        if cpi == self.cpi {
            None
        } else {
            self.cpi = cpi;
            Some(cpi)
        }
    }

    /// Convert motion into `(wheel, pan)` keeping the fractional remainder for the next call.
    pub(super) fn drag_scroll(&mut self, config: &TrackballConfig, motion: Motion) -> (i8, i8) {
        self.scroll_h += motion.x as f32 / config.drag_scroll_divisor_h;
        self.scroll_v += motion.y as f32 / config.drag_scroll_divisor_v;

        let pan = take_whole(&mut self.scroll_h);
        let wheel = take_whole(&mut self.scroll_v);
        if config.drag_scroll_invert {
            (-wheel, pan)
        } else {
            (wheel, pan)
        }
    }
}

/// Remove the whole part of `acc` (toward zero) up to the HID range and return it. Anything past
/// the range stays for the next report.
fn take_whole(acc: &mut f32) -> i8 {
    let whole = (*acc as i32).clamp(-127, 127);
    *acc -= whole as f32;
    whole as i8
}

#[cfg(test)]
#[path = "pointing_test.rs"]
mod test;
