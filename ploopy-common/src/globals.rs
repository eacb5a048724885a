//! Compile-time tuning for the trackball.
//!
//! [`TrackballConfig::DEFAULT`] holds the values the firmware ships with. A board can start from it
//! and override individual fields in a `const`, then call [`TrackballConfig::validate`] at start up.

pub const DPI_OPTIONS_MAX: usize = 8;

pub const TAPPING_TERM_DEFAULT: u16 = 250;
pub const DRAG_SCROLL_DIVISOR_DEFAULT: f32 = 8.0;
pub const SNIPER_DPI_DEFAULT: u16 = 200;
pub const GESTURE_THRESHOLD_DEFAULT: u8 = 3;
pub const GESTURE_TIMEOUT_DEFAULT: u16 = 600;
pub const DEBOUNCE_MS_DEFAULT: u8 = 5;
pub const ENCODER_RESOLUTION_DEFAULT: u8 = 4;

/// How the sensor resolution is chosen while drag scroll is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragScrollCpi {
    /// Scale the current DPI option.
    Multiplier(f32),
    /// Use this CPI regardless of the DPI option.
    Fixed(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    NoDpiOptions,
    TooManyDpiOptions,
    DefaultDpiOutOfRange,
    ZeroCpi,
    InvalidDivisor,
    ZeroTappingTerm,
    ZeroGestureThreshold,
    ZeroEncoderResolution,
}

#[derive(Debug, Clone, Copy)]
pub struct TrackballConfig {
    pub dpi_options: &'static [u16],
    /// Index into `dpi_options` used when nothing has been saved yet.
    pub dpi_default: u8,
    pub sniper_dpi: u16,
    pub tapping_term_ms: u16,
    /// Promote a waiting tap/hold key to hold as soon as another key is pressed.
    pub hold_on_other_key_press: bool,
    pub drag_scroll_divisor_h: f32,
    pub drag_scroll_divisor_v: f32,
    pub drag_scroll_invert: bool,
    pub drag_scroll_cpi: DragScrollCpi,
    pub wheel_invert: bool,
    /// Wheel detents needed on the navigation layer to trigger back/forward.
    pub gesture_threshold: u8,
    pub gesture_timeout_ms: u16,
    pub debounce_ms: u8,
    /// Valid quadrature transitions per wheel detent.
    pub encoder_resolution: u8,
    pub sensor_poll_ms: u8,
}

impl Default for TrackballConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TrackballConfig {
    pub const DEFAULT: Self = Self {
        dpi_options: &[400, 1000],
        dpi_default: 1,
        sniper_dpi: SNIPER_DPI_DEFAULT,
        tapping_term_ms: TAPPING_TERM_DEFAULT,
        hold_on_other_key_press: true,
        drag_scroll_divisor_h: DRAG_SCROLL_DIVISOR_DEFAULT,
        drag_scroll_divisor_v: DRAG_SCROLL_DIVISOR_DEFAULT,
        drag_scroll_invert: false,
        drag_scroll_cpi: DragScrollCpi::Multiplier(0.75),
        wheel_invert: false,
        gesture_threshold: GESTURE_THRESHOLD_DEFAULT,
        gesture_timeout_ms: GESTURE_TIMEOUT_DEFAULT,
        debounce_ms: DEBOUNCE_MS_DEFAULT,
        encoder_resolution: ENCODER_RESOLUTION_DEFAULT,
        sensor_poll_ms: 1,
    };

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dpi_options.is_empty() {
            return Err(ConfigError::NoDpiOptions);
        }
        if self.dpi_options.len() > DPI_OPTIONS_MAX {
            return Err(ConfigError::TooManyDpiOptions);
        }
        if self.dpi_default as usize >= self.dpi_options.len() {
            return Err(ConfigError::DefaultDpiOutOfRange);
        }
        if self.sniper_dpi == 0 || self.dpi_options.contains(&0) {
            return Err(ConfigError::ZeroCpi);
        }
        match self.drag_scroll_cpi {
            DragScrollCpi::Fixed(0) => return Err(ConfigError::ZeroCpi),
            DragScrollCpi::Multiplier(m) if !(m.is_finite() && m > 0.0) => {
                return Err(ConfigError::ZeroCpi)
            }
            _ => {}
        }
        for d in [self.drag_scroll_divisor_h, self.drag_scroll_divisor_v] {
            if !(d.is_finite() && d > 0.0) {
                return Err(ConfigError::InvalidDivisor);
            }
        }
        if self.tapping_term_ms == 0 {
            return Err(ConfigError::ZeroTappingTerm);
        }
        if self.gesture_threshold == 0 {
            return Err(ConfigError::ZeroGestureThreshold);
        }
        if self.encoder_resolution == 0 {
            return Err(ConfigError::ZeroEncoderResolution);
        }
        Ok(())
    }

    /// Index to start with given a possibly stale saved index.
    pub fn dpi_index(&self, saved: Option<u8>) -> u8 {
        match saved {
            Some(i) if (i as usize) < self.dpi_options.len() => i,
            _ => self.dpi_default,
        }
    }

    pub fn dpi(&self, index: u8) -> u16 {
        self.dpi_options[self.dpi_index(Some(index)) as usize]
    }

    pub fn next_dpi_index(&self, index: u8) -> u8 {
        ((self.dpi_index(Some(index)) as usize + 1) % self.dpi_options.len()) as u8
    }

    /// Sensor CPI while drag scrolling, given the current DPI option.
    pub fn drag_scroll_dpi(&self, index: u8) -> u16 {
        match self.drag_scroll_cpi {
            DragScrollCpi::Fixed(cpi) => cpi,
            DragScrollCpi::Multiplier(m) => {
                let cpi = self.dpi(index) as f32 * m;
                if cpi < 1.0 {
                    1
                } else if cpi > u16::MAX as f32 {
                    u16::MAX
                } else {
                    cpi as u16
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "globals_test.rs"]
mod test;
