//! Board hooks for restarting the MCU.
//!
//! The board crate registers what a restart means on its chip; the mapper calls [reset] or
//! [reset_to_usb_boot] when the matching key action is released.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::CriticalSectionMutex;

pub type ResetFn = &'static (dyn Fn() + Sync);

#[derive(Clone, Copy)]
enum Hook {
    Reset = 0,
    UsbBoot = 1,
}

static HOOKS: CriticalSectionMutex<RefCell<[Option<ResetFn>; 2]>> =
    CriticalSectionMutex::new(RefCell::new([None, None]));

fn call(hook: Hook) {
    let f = HOOKS.lock(|r| r.borrow_mut()[hook as usize].take());
    match f {
        Some(f) => f(),
        None => crate::warn!("no restart hook registered"),
    }
}

fn register(hook: Hook, value: Option<ResetFn>) {
    HOOKS.lock(|r| r.borrow_mut()[hook as usize] = value);
}

pub fn reset() {
    call(Hook::Reset);
}

pub fn reset_to_usb_boot() {
    call(Hook::UsbBoot);
}

/// Register the function [reset] calls. It is called at most once per registration.
///
/// ```
/// use ploopy_firmware::firmware_functions::handle_reset;
/// # pub mod cortex_m { pub mod peripheral {pub mod SCB {pub fn sys_reset() {}}}}
///
/// fn myreset() {
///     cortex_m::peripheral::SCB::sys_reset();
/// }
///
/// handle_reset(Some(&myreset));
/// ```
pub fn handle_reset(value: Option<ResetFn>) {
    register(Hook::Reset, value);
}

/// Register the function [reset_to_usb_boot] calls; usually the chip's ROM bootloader entry.
pub fn handle_reset_to_usb_boot(value: Option<ResetFn>) {
    register(Hook::UsbBoot, value);
}

#[cfg(all(not(test), feature = "reset-on-panic", target_os = "none"))]
mod panic {
    #[panic_handler]
    fn panic(_info: &core::panic::PanicInfo) -> ! {
        super::reset();

        loop {}
    }
}
