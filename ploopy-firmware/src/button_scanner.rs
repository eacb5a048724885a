use core::pin::pin;

use embassy_futures::select::select_slice;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;

use crate::input::{InputChannel, InputEvent, ScanKey};

/// Scans once the buttons have been idle this long before sleeping on pin edges.
const IDLE_WAIT_COUNT: u32 = 100;
const SCAN_PERIOD: Duration = Duration::from_millis(1);
const MAX_DEBOUNCE: u8 = 0x3f;

/// Debounces buttons wired directly to pins; a closed switch reads low.
pub struct ButtonScanner<'c, I: InputPin + Wait, M: RawMutex, const N: usize, const PS: usize> {
    channel: &'c InputChannel<M, PS>,
    pins: [I; N],

    /// Per button: bits 7-2 scans left before settled, bit 1 last reported position, bit 0 actual
    /// position.
    state: [u8; N],

    debounce_ms: u8,

    /// A countdown of scans when all buttons are up and settled before calling `wait_for_button`.
    all_up_limit: u32,
}

impl<'c, I: InputPin + Wait, M: RawMutex, const N: usize, const PS: usize>
    ButtonScanner<'c, I, M, N, PS>
{
    pub fn new(pins: [I; N], channel: &'c InputChannel<M, PS>, debounce_ms: u8) -> Self {
        Self {
            channel,
            pins,
            state: [0; N],
            debounce_ms: debounce_ms.min(MAX_DEBOUNCE),
            all_up_limit: IDLE_WAIT_COUNT,
        }
    }

    pub async fn run(&mut self) -> ! {
        self.wait_for_button().await;
        let mut next_scan = Instant::now();
        loop {
            let is_idle = self.scan().await;

            if is_idle {
                if self.all_up_limit == 0 {
                    self.wait_for_button().await;
                    next_scan = Instant::now();
                    continue;
                }
                self.all_up_limit -= 1;
            } else {
                self.all_up_limit = IDLE_WAIT_COUNT;
            }

            next_scan += SCAN_PERIOD;
            Timer::at(next_scan).await;
        }
    }

    /// Sleep until any button pin goes low.
    pub async fn wait_for_button(&mut self) {
        self.all_up_limit = IDLE_WAIT_COUNT;
        let futs = self.pins.each_mut().map(|pin| pin.wait_for_low());
        let _ = select_slice(pin!(futs)).await;
    }

    /// Read every pin once and send settled changes. Returns true when every button is up and
    /// nothing is settling.
    pub async fn scan(&mut self) -> bool {
        let mut is_idle = true;
        for (idx, (pin, s)) in self.pins.iter_mut().zip(self.state.iter_mut()).enumerate() {
            let is_down = pin.is_low().unwrap_or(false);
            let changed = debounce(s, is_down, self.debounce_ms);
            if *s != 0 {
                is_idle = false;
            }
            if let Some(is_down) = changed {
                crate::debug!("button {} {}", idx, is_down);
                self.channel
                    .send(InputEvent::Button(ScanKey::new(idx as u8, is_down)))
                    .await;
            }
        }
        is_idle
    }
}

/// Advance one button's debounce state. Returns the new position once it has been stable for
/// `debounce` scans.
fn debounce(s: &mut u8, is_down: bool, debounce: u8) -> Option<bool> {
    let actual = is_down as u8;
    let mut settle = *s >> 2;
    if *s & 1 != actual {
        settle = debounce;
    } else if settle > 0 {
        settle -= 1;
    }

    let mut reported = *s & 2;
    let changed = settle == 0 && reported >> 1 != actual;
    if changed {
        reported = actual << 1;
    }
    *s = settle << 2 | reported | actual;
    changed.then_some(is_down)
}

#[cfg(test)]
#[path = "button_scanner_test.rs"]
mod test;
