use crate::keymap::Action;

use TapHoldTimer::*;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(super) enum TapHoldTimer {
    #[default]
    Idle,
    Wait {
        since: u64,
        term: u16,
        tap: Action,
        hold: Action,
    },
    Hold {
        hold: Action,
    },
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(super) enum Release {
    /// Released within the term: press then release `tap`.
    Tapped(Action),
    /// Released past the term before the timer fired: press then release `hold`.
    HeldAndReleased(Action),
    /// `hold` was pressed earlier; release it.
    Released(Action),
    /// Nothing to send.
    Cancelled,
}

impl TapHoldTimer {
    pub(super) fn start(&mut self, now: u64, tap: Action, hold: Action, term: u16) {
        debug_assert!(matches!(self, Idle));
        *self = Wait {
            since: now,
            term,
            tap,
            hold,
        };
    }

    #[cfg(test)]
    pub(super) fn is_waiting(&self) -> bool {
        matches!(self, Wait { .. })
    }

    pub(super) fn is_idle(&self) -> bool {
        matches!(self, Idle)
    }

    /// The hold action while it is pressed.
    pub(super) fn held(&self) -> Option<Action> {
        match self {
            Hold { hold } => Some(*hold),
            _ => None,
        }
    }

    pub(super) fn deadline(&self) -> u64 {
        match self {
            Wait { since, term, .. } => since + *term as u64,
            _ => u64::MAX,
        }
    }

    /// Promote to hold if the term has passed. Returns the action to press.
    pub(super) fn expire(&mut self, now: u64) -> Option<Action> {
        if now >= self.deadline() {
            self.promote()
        } else {
            None
        }
    }

    /// Another key went down while waiting. Restart holds keep waiting for their term.
    pub(super) fn interrupt(&mut self) -> Option<Action> {
        match *self {
            Wait { hold, .. } if hold.is_restart() => None,
            _ => self.promote(),
        }
    }

    fn promote(&mut self) -> Option<Action> {
        match *self {
            Wait { hold, .. } => {
                *self = Hold { hold };
                match hold {
                    Action::None => None,
                    hold => Some(hold),
                }
            }
            _ => None,
        }
    }

    pub(super) fn release(&mut self, now: u64) -> Release {
        let deadline = self.deadline();
        let result = match *self {
            Idle => Release::Cancelled,
            Wait { tap, .. } if now < deadline => Release::Tapped(tap),
            Wait {
                hold: Action::None, ..
            } => Release::Cancelled,
            Wait { hold, .. } => Release::HeldAndReleased(hold),
            Hold { hold: Action::None } => Release::Cancelled,
            Hold { hold } => Release::Released(hold),
        };
        *self = Idle;
        result
    }
}

#[cfg(test)]
#[path = "tap_hold_test.rs"]
mod test;
