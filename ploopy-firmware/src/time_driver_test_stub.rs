extern crate std;

use core::{cell::RefCell, task::Waker};
use embassy_time_driver::Driver;
use std::time::SystemTime;

/// Clock for tests. Until [set_time] is called on a thread it follows the wall clock. After that
/// it is frozen and jumps straight to each requested wake time.
struct TestClock;

impl Driver for TestClock {
    fn now(&self) -> u64 {
        CLOCK.with_borrow(|c| {
            if c.now == 0 {
                SystemTime::now()
                    .duration_since(SystemTime::UNIX_EPOCH)
                    .map_or(0, |d| d.as_micros() as u64)
            } else {
                c.now
            }
        })
    }

    fn schedule_wake(&self, at: u64, waker: &Waker) {
        CLOCK.with_borrow_mut(|c| {
            if c.now != 0 && at > c.now {
                c.now = at;
            }
        });

        waker.wake_by_ref();
    }
}

struct Clock {
    now: u64,
}

std::thread_local! {
    static CLOCK: RefCell<Clock> = const { RefCell::new(Clock { now: 0 }) };
}

embassy_time_driver::time_driver_impl!(static TIME_DRIVER: TestClock = TestClock);

/// Freeze this thread's clock at `t` microseconds.
pub fn set_time(t: u64) {
    CLOCK.with_borrow_mut(|c| c.now = t);
}
