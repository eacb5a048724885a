#![no_std]
pub mod button_scanner;
pub mod firmware_functions;
pub mod hid;
pub mod input;
pub mod key_reporter;
pub mod keymap;
pub mod mapper;
pub mod sensor;
pub mod settings;
pub mod trackball;
pub mod usb;
pub mod wheel_encoder;

#[cfg(test)]
pub mod flash_test_stub;
#[cfg(test)]
pub mod switch_test_stub;
#[cfg(test)]
pub mod time_driver_test_stub;
#[cfg(test)]
pub mod usb_test_stub;

#[macro_use]
mod macros;

pub(crate) const KEYBOARD_ROLLOVER: usize = 6;

/// Add `kc` to the rollover slots of a keyboard report. Returns false if there was no room.
fn add_key(keys_down: &mut [u8], kc: u8) -> bool {
    if keys_down.contains(&kc) {
        return true;
    }
    match keys_down.iter_mut().find(|k| **k == 0) {
        Some(slot) => {
            *slot = kc;
            true
        }
        None => false,
    }
}

/// Remove `kc` from the rollover slots keeping the remaining keys packed. Returns false if `kc` was
/// not down.
fn del_key(keys_down: &mut [u8], kc: u8) -> bool {
    let Some(i) = keys_down.iter().position(|k| *k == kc) else {
        return false;
    };
    keys_down.copy_within(i + 1.., i);
    if let Some(last) = keys_down.last_mut() {
        *last = 0;
    }
    true
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod test;
