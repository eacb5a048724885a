//! The optical sensor behind a small trait so any chip driver can feed the mapper.

use embassy_sync::{blocking_mutex::raw::RawMutex, signal::Signal};
use embassy_time::{Duration, Instant, Timer};

use crate::input::{InputChannel, InputEvent, Motion};

/// A motion sensor driver.
#[allow(async_fn_in_trait)]
pub trait MotionSensor {
    type Error;

    /// Counts moved since the last read.
    async fn read_motion(&mut self) -> Result<Motion, Self::Error>;

    async fn set_cpi(&mut self, cpi: u16) -> Result<(), Self::Error>;
}

/// Polls a [MotionSensor] and applies CPI changes signalled by the mapper.
pub struct SensorPoller<'c, S: MotionSensor, M: RawMutex, const PS: usize> {
    sensor: S,
    channel: &'c InputChannel<M, PS>,
    cpi: &'c Signal<M, u16>,
    poll_period: Duration,
}

impl<'c, S: MotionSensor, M: RawMutex, const PS: usize> SensorPoller<'c, S, M, PS> {
    pub fn new(
        sensor: S,
        channel: &'c InputChannel<M, PS>,
        cpi: &'c Signal<M, u16>,
        poll_ms: u8,
    ) -> Self {
        Self {
            sensor,
            channel,
            cpi,
            poll_period: Duration::from_millis(poll_ms.max(1) as u64),
        }
    }

    async fn set_cpi(&mut self, cpi: u16) {
        if self.sensor.set_cpi(cpi).await.is_err() {
            crate::warn!("failed to set sensor cpi {}", cpi);
        } else {
            crate::debug!("sensor cpi {}", cpi);
        }
    }

    /// Apply any pending CPI change then forward one reading.
    pub async fn poll(&mut self) {
        if let Some(cpi) = self.cpi.try_take() {
            self.set_cpi(cpi).await;
        }
        match self.sensor.read_motion().await {
            Ok(motion) if !motion.is_zero() => {
                self.channel.send(InputEvent::Motion(motion)).await;
            }
            Ok(_) => {}
            Err(_) => crate::warn!("sensor read failed"),
        }
    }

    pub async fn run(&mut self, initial_cpi: u16) -> ! {
        self.set_cpi(initial_cpi).await;
        let mut next_poll = Instant::now();
        loop {
            self.poll().await;
            next_poll += self.poll_period;
            Timer::at(next_poll).await;
        }
    }

    #[cfg(test)]
    fn sensor(&self) -> &S {
        &self.sensor
    }
}

#[cfg(test)]
#[path = "sensor_test.rs"]
mod test;
