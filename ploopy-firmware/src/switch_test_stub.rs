extern crate std;

use core::cell::Cell;
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, signal::Signal};
use embedded_hal::digital::{Error, ErrorKind, ErrorType, InputPin};
use embedded_hal_async::digital::Wait;
use std::rc::Rc;

#[derive(Debug)]
pub struct TestError;

impl Error for TestError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

struct PinShared {
    n: u8,
    is_high: Cell<bool>,
    signal: Signal<NoopRawMutex, bool>,
}

/// An input pin with a pull-up. Clones share the same level so a test can drive a pin it has
/// handed to the firmware.
#[derive(Clone)]
pub struct Pin(Rc<PinShared>);
impl core::fmt::Debug for Pin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pin")
            .field("n", &self.0.n)
            .field("is_high", &self.0.is_high.get())
            .finish()
    }
}
impl Pin {
    pub fn new(n: u8) -> Self {
        Self(Rc::new(PinShared {
            n,
            is_high: Cell::new(true),
            signal: Signal::new(),
        }))
    }

    pub fn num(&self) -> u8 {
        self.0.n
    }

    pub fn set_level(&self, is_high: bool) {
        if self.0.is_high.get() != is_high {
            self.0.is_high.set(is_high);
            self.0.signal.signal(is_high);
        }
    }

    /// Close the switch (pull the line low).
    pub fn press(&self) {
        self.set_level(false);
    }

    pub fn release(&self) {
        self.set_level(true);
    }

    async fn wait_level(&self, is_high: bool) {
        while self.0.is_high.get() != is_high {
            self.0.signal.wait().await;
        }
    }
}

impl ErrorType for Pin {
    type Error = TestError;
}

impl InputPin for Pin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.is_high.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.is_high.get())
    }
}

impl Wait for Pin {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        self.wait_level(true).await;
        Ok(())
    }

    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        self.wait_level(false).await;
        Ok(())
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        self.wait_level(false).await;
        self.wait_level(true).await;
        Ok(())
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        self.wait_level(true).await;
        self.wait_level(false).await;
        Ok(())
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        let level = self.0.is_high.get();
        self.wait_level(!level).await;
        Ok(())
    }
}
