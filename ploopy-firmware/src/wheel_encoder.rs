use embassy_futures::select::select;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;

use crate::input::{InputChannel, InputEvent, WheelDirection};

/// Step for each `previous << 2 | current` quadrature state. Zero entries are either no change or
/// an invalid jump of both channels.
#[rustfmt::skip]
const TRANSITIONS: [i8; 16] = [
     0, -1,  1,  0,
     1,  0,  0, -1,
    -1,  0,  0,  1,
     0,  1, -1,  0,
];

/// Decodes the scroll wheel's two-channel quadrature signal into detents.
pub struct WheelEncoder<'c, P: InputPin + Wait, M: RawMutex, const PS: usize> {
    channel: &'c InputChannel<M, PS>,
    pin_a: P,
    pin_b: P,
    state: u8,
    pulses: i8,
    resolution: i8,
}

impl<'c, P: InputPin + Wait, M: RawMutex, const PS: usize> WheelEncoder<'c, P, M, PS> {
    /// `resolution` is the number of valid transitions per detent.
    pub fn new(pin_a: P, pin_b: P, channel: &'c InputChannel<M, PS>, resolution: u8) -> Self {
        let mut encoder = Self {
            channel,
            pin_a,
            pin_b,
            state: 0,
            pulses: 0,
            resolution: resolution.clamp(1, i8::MAX as u8) as i8,
        };
        encoder.state = encoder.read_pins();
        encoder
    }

    fn read_pins(&mut self) -> u8 {
        let a = self.pin_a.is_high().unwrap_or(false) as u8;
        let b = self.pin_b.is_high().unwrap_or(false) as u8;
        a | b << 1
    }

    /// Feed the latest pin levels. Returns a direction once a full detent has been turned.
    pub fn update(&mut self, a: bool, b: bool) -> Option<WheelDirection> {
        let current = a as u8 | (b as u8) << 1;
        let step = TRANSITIONS[(self.state << 2 | current) as usize];
        self.state = current;
        if step == 0 {
            return None;
        }

        self.pulses += step;
        let direction = if self.pulses >= self.resolution {
            Some(WheelDirection::Clockwise)
        } else if self.pulses <= -self.resolution {
            Some(WheelDirection::CounterClockwise)
        } else {
            None
        };
        self.pulses %= self.resolution;
        direction
    }

    pub async fn run(&mut self) -> ! {
        loop {
            let _ = select(self.pin_a.wait_for_any_edge(), self.pin_b.wait_for_any_edge()).await;
            let current = self.read_pins();
            if let Some(direction) = self.update(current & 1 != 0, current & 2 != 0) {
                self.channel.send(InputEvent::Wheel(direction)).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "wheel_encoder_test.rs"]
mod test;
