use super::*;

const TAP: Action = Action::DpiToggle;
const HOLD: Action = Action::Sniper;

#[test]
fn tap_within_term() {
    let mut t = TapHoldTimer::default();
    assert_eq!(t.deadline(), u64::MAX);

    t.start(1_000, TAP, HOLD, 250);
    assert!(t.is_waiting());
    assert_eq!(t.deadline(), 1_250);
    assert_eq!(t.expire(1_249), None);

    assert_eq!(t.release(1_100), Release::Tapped(TAP));
    assert_eq!(t, TapHoldTimer::Idle);
}

#[test]
fn hold_after_term() {
    let mut t = TapHoldTimer::default();
    t.start(1_000, TAP, HOLD, 250);

    assert_eq!(t.expire(1_250), Some(HOLD));
    assert!(!t.is_waiting());
    assert_eq!(t.deadline(), u64::MAX);
    assert_eq!(t.expire(5_000), None);

    assert_eq!(t.release(2_000), Release::Released(HOLD));
    assert_eq!(t, TapHoldTimer::Idle);
}

#[test]
fn late_release_before_timer_fired() {
    let mut t = TapHoldTimer::default();
    t.start(1_000, TAP, HOLD, 250);

    assert_eq!(t.release(1_300), Release::HeldAndReleased(HOLD));
}

#[test]
fn interrupt_promotes() {
    let mut t = TapHoldTimer::default();
    t.start(1_000, TAP, HOLD, 250);

    assert_eq!(t.interrupt(), Some(HOLD));
    assert_eq!(t.interrupt(), None);
    assert_eq!(t.release(1_010), Release::Released(HOLD));
}

#[test]
fn tap_timeout_without_hold() {
    let mut t = TapHoldTimer::default();
    t.start(1_000, TAP, Action::None, 250);
    assert_eq!(t.expire(1_300), None);
    assert_eq!(t.release(1_400), Release::Cancelled);

    t.start(1_000, TAP, Action::None, 250);
    assert_eq!(t.release(1_400), Release::Cancelled);

    t.start(2_000, TAP, Action::None, 250);
    assert_eq!(t.release(2_100), Release::Tapped(TAP));
}

#[test]
fn release_when_idle() {
    let mut t = TapHoldTimer::default();
    assert_eq!(t.release(1), Release::Cancelled);
}

#[test]
fn restart_hold_ignores_interrupt() {
    let mut t = TapHoldTimer::default();
    t.start(1_000, Action::Consumer(0xe2), Action::Bootloader, 1_000);

    assert_eq!(t.interrupt(), None);
    assert!(t.is_waiting());
    assert_eq!(t.release(1_040), Release::Tapped(Action::Consumer(0xe2)));

    t.start(1_000, TAP, Action::Reset, 1_000);
    assert_eq!(t.interrupt(), None);
    assert_eq!(t.expire(2_000), Some(Action::Reset));
}
