//! What each trackball button does on each layer.

use ploopy_common::keycodes::{consumer, modifier, mouse_button, usage};

pub const BUTTON_COUNT: usize = 5;
pub const LAYER_COUNT: usize = 2;

pub const BASE: u8 = 0;
pub const NAV: u8 = 1;

/// Use the configured tapping term.
pub const DEFAULT_TERM: u16 = u16::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    #[default]
    None,
    /// Fall through to the next active layer below.
    Transparent,
    MouseButton(u8),
    Key {
        code: u8,
        modifiers: u8,
    },
    Consumer(u16),
    /// Active while held.
    Layer(u8),
    /// Step to the next DPI option and save it.
    DpiToggle,
    /// Sniper DPI while held.
    Sniper,
    /// Drag scroll while held.
    DragScroll,
    /// Latch drag scroll on or off.
    DragScrollToggle,
    Bootloader,
    Reset,
}

impl Action {
    pub const fn key(code: u8) -> Self {
        Self::Key { code, modifiers: 0 }
    }

    pub const fn with_mods(modifiers: u8, code: u8) -> Self {
        Self::Key { code, modifiers }
    }

    /// Restarts the device. As a hold action only the tapping term can promote it.
    pub fn is_restart(&self) -> bool {
        matches!(self, Self::Bootloader | Self::Reset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyAction {
    Single(Action),
    TapHold { tap: Action, hold: Action, term_ms: u16 },
}

impl KeyAction {
    pub const fn tap_hold(tap: Action, hold: Action) -> Self {
        Self::TapHold {
            tap,
            hold,
            term_ms: DEFAULT_TERM,
        }
    }

    fn is_transparent(&self) -> bool {
        matches!(self, KeyAction::Single(Action::Transparent))
    }
}

pub struct Keymap<const N: usize, const L: usize> {
    layers: [[KeyAction; N]; L],
}

impl<const N: usize, const L: usize> Keymap<N, L> {
    const OKAY: bool = assert_layer_count::<L>();

    pub const fn new(layers: [[KeyAction; N]; L]) -> Self {
        assert!(Self::OKAY);
        Self { layers }
    }

    /// The action for `key` from the highest layer in `layer_mask` that is not transparent. The
    /// base layer is always consulted last.
    pub fn action(&self, layer_mask: u8, key: usize) -> KeyAction {
        if key >= N {
            return KeyAction::Single(Action::None);
        }
        let mask = layer_mask | 1;
        for layer in (0..L).rev() {
            if mask & (1 << layer) == 0 {
                continue;
            }
            let ka = self.layers[layer][key];
            if !ka.is_transparent() {
                return ka;
            }
        }
        KeyAction::Single(Action::None)
    }
}

const fn assert_layer_count<const L: usize>() -> bool {
    assert!(L > 0 && L <= 8);
    true
}

use Action::*;

#[rustfmt::skip]
pub const DEFAULT_KEYMAP: Keymap<BUTTON_COUNT, LAYER_COUNT> = Keymap::new([
    // BASE
    [
        KeyAction::Single(MouseButton(mouse_button::LEFT)),
        KeyAction::tap_hold(DpiToggle, Sniper),
        KeyAction::tap_hold(Action::with_mods(modifier::LCTL, usage::UP), Layer(NAV)),
        KeyAction::Single(MouseButton(mouse_button::RIGHT)),
        KeyAction::tap_hold(Action::with_mods(modifier::LCTL, usage::DOWN), DragScroll),
    ],
    // NAV
    [
        KeyAction::Single(MouseButton(mouse_button::MIDDLE)),
        KeyAction::Single(DragScrollToggle),
        KeyAction::Single(Transparent),
        KeyAction::Single(Consumer(consumer::PLAY_PAUSE)),
        KeyAction::TapHold { tap: Consumer(consumer::MUTE), hold: Bootloader, term_ms: 1000 },
    ],
]);

#[cfg(test)]
#[path = "keymap_test.rs"]
mod test;
