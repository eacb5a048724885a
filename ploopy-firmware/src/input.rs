use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Channel};

/// A button change. Bit 7 of the packed byte holds the down state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanKey(u8);
impl ScanKey {
    pub fn new(index: u8, is_down: bool) -> Self {
        Self((index & 0x7f) | if is_down { 0x80 } else { 0 })
    }

    pub fn index(&self) -> usize {
        (self.0 & 0x7f) as usize
    }

    pub fn is_down(&self) -> bool {
        self.0 & 0x80 == 0x80
    }

    pub fn same_key(&self, other: ScanKey) -> bool {
        self.0 & 0x7f == other.0 & 0x7f
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WheelDirection {
    Clockwise,
    CounterClockwise,
}
impl WheelDirection {
    pub fn sign(self) -> i8 {
        match self {
            WheelDirection::Clockwise => 1,
            WheelDirection::CounterClockwise => -1,
        }
    }
}

/// Sensor counts since the last read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Motion {
    pub x: i16,
    pub y: i16,
}
impl Motion {
    pub fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    Button(ScanKey),
    Wheel(WheelDirection),
    Motion(Motion),
}

/// Carries events from the button scanner, wheel encoder and sensor tasks to the mapper.
pub struct InputChannel<M: RawMutex, const N: usize>(Channel<M, InputEvent, N>);
impl<M: RawMutex, const N: usize> Default for InputChannel<M, N> {
    fn default() -> Self {
        Self(Channel::new())
    }
}
impl<M: RawMutex, const N: usize> InputChannel<M, N> {
    pub async fn receive(&self) -> InputEvent {
        self.0.receive().await
    }

    pub async fn send(&self, event: InputEvent) {
        self.0.send(event).await;
    }

    pub fn try_send(&self, event: InputEvent) -> bool {
        self.0.try_send(event).is_ok()
    }

    pub fn try_receive(&self) -> Option<InputEvent> {
        self.0.try_receive().ok()
    }
}
