/// HID keyboard page usages (page 0x07) used by the trackball keymap.
pub mod usage {
    pub const NO: u8 = 0x00;

    pub const A: u8 = 0x04;
    pub const C: u8 = 0x06;

    pub const DOWN: u8 = 0x51;
    pub const UP: u8 = 0x52;

    pub const MODIFIER_MIN: u8 = 0xe0;
    pub const MODIFIER_MAX: u8 = 0xe7;

    pub const fn is_modifier(code: u8) -> bool {
        code >= MODIFIER_MIN && code <= MODIFIER_MAX
    }
}

/// Modifier bits as laid out in byte 1 of the keyboard report.
pub mod modifier {
    pub const LCTL: u8 = 1 << 0;
    pub const LSFT: u8 = 1 << 1;
    pub const LALT: u8 = 1 << 2;
    pub const LGUI: u8 = 1 << 3;
    pub const RCTL: u8 = 1 << 4;
    pub const RSFT: u8 = 1 << 5;
    pub const RALT: u8 = 1 << 6;
    pub const RGUI: u8 = 1 << 7;

    /// Bit for a modifier usage (0xe0..=0xe7).
    pub const fn from_usage(code: u8) -> u8 {
        1 << (code - super::usage::MODIFIER_MIN)
    }
}

/// Consumer page usages (page 0x0c).
pub mod consumer {
    pub const PLAY_PAUSE: u16 = 0xcd;
    pub const MUTE: u16 = 0xe2;
}

/// Bit index of each button in the mouse report.
pub mod mouse_button {
    pub const LEFT: u8 = 0;
    pub const RIGHT: u8 = 1;
    pub const MIDDLE: u8 = 2;
    pub const BACK: u8 = 3;
    pub const FORWARD: u8 = 4;
    pub const MAX: u8 = 7;

    pub const fn bit(button: u8) -> u8 {
        1 << (button & MAX)
    }
}

#[cfg(test)]
#[path = "keycodes_test.rs"]
mod test;
