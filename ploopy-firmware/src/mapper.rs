use core::{cell::RefCell, cmp::min};

use embassy_futures::select::{select, select3, Either, Either3};
use embassy_sync::{
    blocking_mutex::raw::{NoopRawMutex, RawMutex},
    channel::Channel,
    signal::Signal,
};
use embassy_time::{Duration, Instant, Timer};
use gesture::WheelGesture;
use ploopy_common::{
    globals::TrackballConfig,
    keycodes::{modifier, mouse_button, usage},
};
use pointing::Pointing;
use tap_hold::{Release, TapHoldTimer};

use crate::{
    firmware_functions,
    input::{InputChannel, InputEvent, Motion, ScanKey, WheelDirection},
    keymap::{Action, KeyAction, Keymap, DEFAULT_TERM},
    settings::Settings,
};

pub(crate) mod gesture;
pub(crate) mod pointing;
pub(crate) mod tap_hold;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyEvent {
    Basic(u8, bool),
    Modifiers(u8, bool),
    Consumer(u16),
    MouseButton(u8),
    Motion(i16, i16),
    Scroll { wheel: i8, pan: i8 },
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlMessage {
    TimerExpired,
    Exit,
}

#[derive(Default)]
pub struct ControlSignal(Signal<NoopRawMutex, ControlMessage>);
impl ControlSignal {
    pub fn exit(&self) {
        self.0.signal(ControlMessage::Exit);
    }

    #[cfg(test)]
    pub fn try_take(&self) -> Option<ControlMessage> {
        self.0.try_take()
    }
}

/// Wakes the mapper when the earliest tap/hold or gesture deadline passes.
pub struct MapperTimer {
    expires_at: RefCell<Instant>,
    at_sig: Signal<NoopRawMutex, Instant>,
    ctl_sig: ControlSignal,
}
impl Default for MapperTimer {
    fn default() -> Self {
        Self {
            expires_at: RefCell::new(Instant::MAX),
            at_sig: Default::default(),
            ctl_sig: Default::default(),
        }
    }
}
impl MapperTimer {
    pub fn shutdown(&self) {
        self.at_sig.signal(Instant::MIN);
    }

    fn at(&self, expires_at: Instant) {
        self.at_sig.signal(expires_at);
    }

    async fn wait_control(&self) {
        self.set_expires_at(self.at_sig.wait().await);
    }

    pub async fn run(timer: &Self) {
        loop {
            match timer.get_expires_at() {
                Instant::MAX => timer.wait_control().await,
                Instant::MIN => break,
                expires_at => {
                    if let Either::First(_) =
                        select(Timer::at(expires_at), timer.wait_control()).await
                    {
                        timer.set_expires_at(Instant::MAX);
                        timer.ctl_sig.0.signal(ControlMessage::TimerExpired);
                    }
                }
            }
        }
    }

    fn get_expires_at(&self) -> Instant {
        *self.expires_at.borrow()
    }

    fn set_expires_at(&self, expires_at: Instant) {
        *self.expires_at.borrow_mut() = expires_at;
    }
}

/// Everything the mapper sends to other tasks: HID events for the reporter, CPI changes for the
/// sensor and settings to persist.
pub struct MapperChannel<M: RawMutex, const N: usize> {
    reports: Channel<M, KeyEvent, N>,
    timer: MapperTimer,
    cpi: Signal<M, u16>,
    settings: Signal<M, Settings>,
}
impl<M: RawMutex, const N: usize> Default for MapperChannel<M, N> {
    fn default() -> Self {
        Self {
            reports: Channel::new(),
            timer: MapperTimer::default(),
            cpi: Signal::new(),
            settings: Signal::new(),
        }
    }
}
impl<M: RawMutex, const N: usize> MapperChannel<M, N> {
    pub async fn receive(&self) -> KeyEvent {
        self.reports.receive().await
    }

    pub fn timer(&self) -> &MapperTimer {
        &self.timer
    }

    pub fn control(&self) -> &ControlSignal {
        &self.timer.ctl_sig
    }

    pub fn cpi(&self) -> &Signal<M, u16> {
        &self.cpi
    }

    pub fn settings(&self) -> &Signal<M, Settings> {
        &self.settings
    }

    async fn wait_control(&self) -> ControlMessage {
        self.control().0.wait().await
    }

    /// Queue `message`. Returns false if the queue was full and has been replaced by a single
    /// [KeyEvent::Clear].
    fn report(&self, message: KeyEvent) -> bool {
        if self.reports.try_send(message).is_ok() {
            return true;
        }
        crate::warn!("report buffer full; clearing");
        self.reports.clear();
        let _ = self.reports.try_send(KeyEvent::Clear);
        false
    }
}

const MIN_REPORT_BUFFER_SIZE: usize = 4;

/// How long held back motion waits for the report queue to empty before trying again.
const MOTION_RETRY: Duration = Duration::from_millis(1);

const fn assert_sizes<const N: usize, const REPORT_BUFFER_SIZE: usize>() -> bool {
    assert!(REPORT_BUFFER_SIZE >= MIN_REPORT_BUFFER_SIZE);
    assert!(N > 0 && N <= 0x7f);
    true
}

pub struct Mapper<
    'c,
    const N: usize,
    const L: usize,
    M: RawMutex,
    const REPORT_BUFFER_SIZE: usize,
> {
    keymap: &'c Keymap<N, L>,
    config: TrackballConfig,
    report_channel: &'c MapperChannel<M, REPORT_BUFFER_SIZE>,

    active_actions: [Action; N],
    tap_hold: [TapHoldTimer; N],
    layer_count: [u8; 8],
    layer_mask: u8,
    modifier_count: [i8; 8],
    button_count: [u8; 8],
    mouse_buttons: u8,
    pointing: Pointing,
    gesture: WheelGesture,
    /// Motion not yet queued; summed until the reporter has taken the previous motion.
    pending_motion: Motion,

    wait_time: u64,
    now: u64,
}
impl<'c, const N: usize, const L: usize, M: RawMutex, const REPORT_BUFFER_SIZE: usize>
    Mapper<'c, N, L, M, REPORT_BUFFER_SIZE>
{
    const OKAY: bool = assert_sizes::<N, REPORT_BUFFER_SIZE>();

    pub fn new(
        report_channel: &'c MapperChannel<M, REPORT_BUFFER_SIZE>,
        keymap: &'c Keymap<N, L>,
        config: TrackballConfig,
        saved: Option<Settings>,
    ) -> Self {
        assert!(Self::OKAY);
        Self {
            keymap,
            pointing: Pointing::new(&config, saved.map(|s| s.dpi_index)),
            config,
            report_channel,
            active_actions: [Action::None; N],
            tap_hold: [TapHoldTimer::Idle; N],
            layer_count: [0; 8],
            layer_mask: 1,
            modifier_count: [0; 8],
            button_count: [0; 8],
            mouse_buttons: 0,
            gesture: WheelGesture::default(),
            pending_motion: Motion::default(),
            wait_time: u64::MAX,
            now: 1,
        }
    }

    /// The CPI the sensor should be running at.
    pub fn cpi(&self) -> u16 {
        self.pointing.cpi()
    }

    pub fn settings(&self) -> Settings {
        Settings {
            dpi_index: self.pointing.dpi_index(),
        }
    }

    pub async fn run<const INPUT_BUFFER_SIZE: usize>(
        &mut self,
        input_channel: &InputChannel<M, INPUT_BUFFER_SIZE>,
    ) -> ControlMessage {
        loop {
            let has_pending = !self.pending_motion.is_zero();
            let event = select3(
                input_channel.receive(),
                self.report_channel.wait_control(),
                async {
                    if has_pending {
                        Timer::after(MOTION_RETRY).await;
                    } else {
                        core::future::pending::<()>().await;
                    }
                },
            )
            .await;

            self.now = Instant::now().as_millis();

            match event {
                Either3::First(InputEvent::Button(scan_key)) => self.key_switch(scan_key),
                Either3::First(InputEvent::Wheel(direction)) => self.wheel(direction),
                Either3::First(InputEvent::Motion(motion)) => self.motion(motion),
                Either3::Second(ControlMessage::TimerExpired) => self.check_time(),
                Either3::Third(()) => self.flush_motion(false),
                Either3::Second(ControlMessage::Exit) => {
                    self.clear_all();
                    return ControlMessage::Exit;
                }
            }
        }
    }

    fn clear_all(&mut self) {
        self.active_actions = [Action::None; N];
        self.tap_hold = [TapHoldTimer::Idle; N];
        self.layer_count = [0; 8];
        self.layer_mask = 1;
        self.modifier_count = [0; 8];
        self.button_count = [0; 8];
        self.mouse_buttons = 0;
        self.gesture.clear();
        self.pending_motion = Motion::default();
        self.pointing.set_sniper(false);
        self.pointing.set_drag_momentary(false);
        self.pointing.cancel_drag_latch();
        self.update_cpi();
        self.report_channel.reports.clear();
        self.report(KeyEvent::Clear);
        self.set_wait_time();
    }

    /// Key-event dispatcher.
    pub fn key_switch(&mut self, k: ScanKey) {
        let idx = k.index();
        if idx >= N {
            crate::warn!("button out of range {}", idx);
            return;
        }

        if k.is_down() {
            self.key_down(idx);
        } else {
            self.key_up(idx);
        }
        self.set_wait_time();
    }

    fn key_down(&mut self, idx: usize) {
        if !self.tap_hold[idx].is_idle() || self.active_actions[idx] != Action::None {
            crate::warn!("button {} already down", idx);
            return;
        }

        if self.config.hold_on_other_key_press {
            for i in 0..N {
                if i == idx {
                    continue;
                }
                if let Some(hold) = self.tap_hold[i].interrupt() {
                    self.run_action(hold, true);
                }
            }
        }

        match self.keymap.action(self.layer_mask, idx) {
            KeyAction::Single(action) => {
                self.active_actions[idx] = action;
                self.run_action(action, true);
            }
            KeyAction::TapHold { tap, hold, term_ms } => {
                let term = if term_ms == DEFAULT_TERM {
                    self.config.tapping_term_ms
                } else {
                    term_ms
                };
                self.tap_hold[idx].start(self.now, tap, hold, term);
            }
        }
    }

    fn key_up(&mut self, idx: usize) {
        if self.tap_hold[idx].is_idle() {
            let action = core::mem::take(&mut self.active_actions[idx]);
            self.run_action(action, false);
            return;
        }

        match self.tap_hold[idx].release(self.now) {
            Release::Tapped(action) | Release::HeldAndReleased(action) => {
                self.run_action(action, true);
                self.run_action(action, false);
            }
            Release::Released(action) => self.run_action(action, false),
            Release::Cancelled => {}
        }
    }

    /// Tick handler; promotes expired tap/hold keys and expires the wheel gesture.
    pub fn check_time(&mut self) {
        if self.wait_time == u64::MAX {
            return;
        }
        for i in 0..N {
            if let Some(hold) = self.tap_hold[i].expire(self.now) {
                self.run_action(hold, true);
            }
        }
        self.gesture.expire(self.now, self.config.gesture_timeout_ms);
        self.set_wait_time();
    }

    /// Scroll wheel handler.
    pub fn wheel(&mut self, direction: WheelDirection) {
        if self.layer_mask & !1 != 0 {
            if let Some(direction) = self.gesture.pulse(
                self.now,
                direction,
                self.config.gesture_threshold,
                self.config.gesture_timeout_ms,
            ) {
                let button = match direction {
                    WheelDirection::Clockwise => mouse_button::FORWARD,
                    WheelDirection::CounterClockwise => mouse_button::BACK,
                };
                self.mouse_button(button, true);
                self.mouse_button(button, false);
            }
            self.set_wait_time();
        } else if self.pointing.cancel_drag_latch() {
            crate::debug!("drag scroll cancelled by wheel");
            self.update_cpi();
        } else {
            let wheel = if self.config.wheel_invert {
                -direction.sign()
            } else {
                direction.sign()
            };
            self.report(KeyEvent::Scroll { wheel, pan: 0 });
        }
    }

    /// Sensor motion handler.
    pub fn motion(&mut self, motion: Motion) {
        if motion.is_zero() {
            return;
        }
        if self.pointing.is_drag_scrolling() {
            let (wheel, pan) = self.pointing.drag_scroll(&self.config, motion);
            if wheel != 0 || pan != 0 {
                self.report(KeyEvent::Scroll { wheel, pan });
            }
        } else {
            self.pending_motion = Motion {
                x: self.pending_motion.x.saturating_add(motion.x),
                y: self.pending_motion.y.saturating_add(motion.y),
            };
            self.flush_motion(false);
        }
    }

    /// Queue held back motion. Unless `force`d it waits until the reporter has drained the queue
    /// so continuous motion never builds a backlog.
    fn flush_motion(&mut self, force: bool) {
        if self.pending_motion.is_zero() {
            return;
        }
        if force || self.report_channel.reports.is_empty() {
            let m = core::mem::take(&mut self.pending_motion);
            self.send(KeyEvent::Motion(m.x, m.y));
        }
    }

    fn run_action(&mut self, action: Action, is_down: bool) {
        match action {
            Action::None | Action::Transparent => {}
            Action::MouseButton(button) => self.mouse_button(button, is_down),
            Action::Key { code, modifiers } => self.key(code, modifiers, is_down),
            Action::Consumer(code) => {
                self.report(KeyEvent::Consumer(if is_down { code } else { 0 }));
            }
            Action::Layer(layern) => self.layer(layern, is_down),
            Action::DpiToggle => {
                if is_down {
                    self.dpi_toggle();
                }
            }
            Action::Sniper => {
                self.pointing.set_sniper(is_down);
                self.update_cpi();
            }
            Action::DragScroll => {
                self.pointing.set_drag_momentary(is_down);
                self.update_cpi();
            }
            Action::DragScrollToggle => {
                if is_down {
                    self.pointing.toggle_drag_latch();
                    self.update_cpi();
                }
            }
            Action::Bootloader => {
                if !is_down {
                    firmware_functions::reset_to_usb_boot();
                }
            }
            Action::Reset => {
                if !is_down {
                    firmware_functions::reset();
                }
            }
        }
    }

    fn key(&mut self, code: u8, modifiers: u8, is_down: bool) {
        let (code, modifiers) = if usage::is_modifier(code) {
            (usage::NO, modifiers | modifier::from_usage(code))
        } else {
            (code, modifiers)
        };
        if is_down {
            self.write_modifiers(modifiers, 1);
            if code != usage::NO {
                self.report(KeyEvent::Basic(code, true));
            }
        } else {
            if code != usage::NO {
                self.report(KeyEvent::Basic(code, false));
            }
            self.write_modifiers(modifiers, -1);
        }
    }

    /// Keep a count for each modifier so overlapping keys sharing a modifier only report the
    /// first press and the last release.
    fn write_modifiers(&mut self, modifiers: u8, count: i8) {
        let mut changed = 0;
        for i in 0..8 {
            if modifiers & (1 << i) == 0 {
                continue;
            }
            let before = self.modifier_count[i] > 0;
            self.modifier_count[i] = self.modifier_count[i].saturating_add(count).max(0);
            if before != (self.modifier_count[i] > 0) {
                changed |= 1 << i;
            }
        }
        if changed != 0 {
            self.report(KeyEvent::Modifiers(changed, count > 0));
        }
    }

    fn mouse_button(&mut self, button: u8, is_down: bool) {
        let i = (button & mouse_button::MAX) as usize;
        let before = self.mouse_buttons;
        if is_down {
            self.button_count[i] = self.button_count[i].saturating_add(1);
            self.mouse_buttons |= mouse_button::bit(button);
        } else {
            self.button_count[i] = self.button_count[i].saturating_sub(1);
            if self.button_count[i] == 0 {
                self.mouse_buttons &= !mouse_button::bit(button);
            }
        }
        if before != self.mouse_buttons {
            self.report(KeyEvent::MouseButton(self.mouse_buttons));
        }
    }

    fn layer(&mut self, layern: u8, is_down: bool) {
        if layern as usize >= L || layern >= 8 {
            crate::warn!("layer out of range {}", layern);
            return;
        }
        let i = layern as usize;
        if is_down {
            self.layer_count[i] = self.layer_count[i].saturating_add(1);
        } else {
            self.layer_count[i] = self.layer_count[i].saturating_sub(1);
        }
        let mask = self
            .layer_count
            .iter()
            .enumerate()
            .fold(1, |m, (i, c)| if *c > 0 { m | 1 << i } else { m });
        if mask != self.layer_mask {
            self.layer_mask = mask;
            self.gesture.clear();
        }
    }

    fn dpi_toggle(&mut self) {
        let dpi_index = self.pointing.next_dpi(&self.config);
        crate::info!(
            "dpi option {} ({})",
            dpi_index,
            self.config.dpi(dpi_index)
        );
        self.report_channel.settings.signal(Settings { dpi_index });
        self.update_cpi();
    }

    fn update_cpi(&mut self) {
        if let Some(cpi) = self.pointing.update_cpi(&self.config) {
            crate::debug!("cpi {}", cpi);
            self.report_channel.cpi.signal(cpi);
        }
    }

    /// Queue a non-motion event after any held back motion so the host sees them in order.
    fn report(&mut self, message: KeyEvent) {
        self.flush_motion(true);
        self.send(message);
    }

    fn send(&mut self, message: KeyEvent) {
        if !self.report_channel.report(message) {
            self.resend_held();
        }
    }

    /// After the queue has been cleared re-assert what is still held.
    fn resend_held(&self) {
        let reports = &self.report_channel.reports;
        if self.mouse_buttons != 0 {
            let _ = reports.try_send(KeyEvent::MouseButton(self.mouse_buttons));
        }
        let modifiers = self
            .modifier_count
            .iter()
            .enumerate()
            .fold(0, |m, (i, c)| if *c > 0 { m | 1 << i } else { m });
        if modifiers != 0 {
            let _ = reports.try_send(KeyEvent::Modifiers(modifiers, true));
        }
        let held = self
            .active_actions
            .iter()
            .copied()
            .chain(self.tap_hold.iter().filter_map(|th| th.held()));
        for action in held {
            let event = match action {
                Action::Key { code, .. } if code != usage::NO && !usage::is_modifier(code) => {
                    KeyEvent::Basic(code, true)
                }
                Action::Consumer(code) => KeyEvent::Consumer(code),
                _ => continue,
            };
            let _ = reports.try_send(event);
        }
    }

    fn set_wait_time(&mut self) {
        let t = self.tap_hold.iter().fold(
            self.gesture.deadline(self.config.gesture_timeout_ms),
            |t, th| min(t, th.deadline()),
        );

        if t != self.wait_time {
            self.wait_time = t;
            self.report_channel.timer().at(if t == u64::MAX {
                Instant::MAX
            } else {
                Instant::from_millis(t)
            });
        } else if t != u64::MAX {
            self.report_channel.timer().at(Instant::from_millis(t));
        }
    }
}

#[cfg(test)]
#[path = "mapper_test.rs"]
mod test;
