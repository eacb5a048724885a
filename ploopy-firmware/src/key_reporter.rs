use embassy_usb::driver::EndpointIn;
use ploopy_common::keycodes::usage;

use crate::{
    add_key, del_key,
    hid::HidWriter,
    mapper::KeyEvent,
    usb::{CONSUMER_REPORT_ID, KEYBOARD_REPORT_ID, MAX_REPORT_LEN, MOUSE_REPORT_ID},
    warn, KEYBOARD_ROLLOVER,
};

const KEYBOARD_REPORT_LEN: usize = KEYBOARD_ROLLOVER + 3;

/// Turns [KeyEvent]s into HID input reports.
pub struct Reporter<E: EndpointIn> {
    hid_writer: HidWriter<E, MAX_REPORT_LEN>,
    keyboard_report: [u8; KEYBOARD_REPORT_LEN],
    mouse_buttons: u8,
}

impl<E: EndpointIn> Reporter<E> {
    pub fn new(hid_writer: HidWriter<E, MAX_REPORT_LEN>) -> Self {
        let mut keyboard_report = [0; KEYBOARD_REPORT_LEN];
        keyboard_report[0] = KEYBOARD_REPORT_ID;
        Self {
            hid_writer,
            keyboard_report,
            mouse_buttons: 0,
        }
    }

    async fn write_report(&mut self, report: &[u8]) {
        if let Err(e) = self.hid_writer.write(report).await {
            warn!("Failed to send report: {:?}", e);
        }
    }

    async fn write_keyboard_report(&mut self) {
        let report = self.keyboard_report;
        self.write_report(&report).await;
    }

    /// X/Y are limited to the descriptor's logical range of -32767..=32767.
    async fn write_mouse_report(&mut self, x: i16, y: i16, wheel: i8, pan: i8) {
        let [x_lo, x_hi] = x.max(-i16::MAX).to_le_bytes();
        let [y_lo, y_hi] = y.max(-i16::MAX).to_le_bytes();
        self.write_report(&[
            MOUSE_REPORT_ID,
            self.mouse_buttons,
            x_lo,
            x_hi,
            y_lo,
            y_hi,
            wheel as u8,
            pan as u8,
        ])
        .await;
    }

    pub async fn report(&mut self, msg: KeyEvent) {
        match msg {
            KeyEvent::Basic(key, is_down) => {
                if usage::is_modifier(key) {
                    let bit = 1 << (key - usage::MODIFIER_MIN);
                    if is_down {
                        self.keyboard_report[1] |= bit;
                    } else {
                        self.keyboard_report[1] &= !bit;
                    }
                } else if is_down {
                    if !add_key(&mut self.keyboard_report[3..], key) {
                        warn!("rollover full; dropping key {}", key);
                        return;
                    }
                } else if !del_key(&mut self.keyboard_report[3..], key) {
                    return;
                }
                self.write_keyboard_report().await;
            }
            KeyEvent::Modifiers(modifiers, is_down) => {
                if is_down {
                    self.keyboard_report[1] |= modifiers;
                } else {
                    self.keyboard_report[1] &= !modifiers;
                }
                self.write_keyboard_report().await;
            }
            KeyEvent::Consumer(key) => {
                let [lo, hi] = key.to_le_bytes();
                self.write_report(&[CONSUMER_REPORT_ID, lo, hi]).await;
            }
            KeyEvent::MouseButton(buttons) => {
                self.mouse_buttons = buttons;
                self.write_mouse_report(0, 0, 0, 0).await;
            }
            KeyEvent::Motion(x, y) => {
                self.write_mouse_report(x, y, 0, 0).await;
            }
            KeyEvent::Scroll { wheel, pan } => {
                self.write_mouse_report(0, 0, wheel, pan).await;
            }
            KeyEvent::Clear => {
                self.keyboard_report.iter_mut().skip(1).for_each(|b| *b = 0);
                self.mouse_buttons = 0;
                self.write_keyboard_report().await;
                self.write_mouse_report(0, 0, 0, 0).await;
                self.write_report(&[CONSUMER_REPORT_ID, 0, 0]).await;
            }
        }
    }

    /// Wait for the host to enable the endpoint.
    pub async fn ready(&mut self) {
        self.hid_writer.ready().await;
    }
}

#[cfg(test)]
#[path = "key_reporter_test.rs"]
mod test;
