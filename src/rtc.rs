//! Real-time clock collaborator.
//!
//! The clock keeps wall time and holds at most one pending deadline. Reaching
//! the deadline raises exactly one notification, after which the deadline is
//! gone until armed again. Arming replaces any pending deadline atomically:
//! no notification can be observed for a half-written deadline.

use crate::time::Timestamp;

pub trait RealTimeClock {
    fn now(&mut self) -> Timestamp;

    fn set_now(&mut self, now: Timestamp);

    /// Programs the single pending deadline, replacing any previous one.
    fn arm_deadline(&mut self, at: Timestamp);

    fn clear_deadline(&mut self);
}

impl<C: RealTimeClock + ?Sized> RealTimeClock for &mut C {
    fn now(&mut self) -> Timestamp {
        (**self).now()
    }

    fn set_now(&mut self, now: Timestamp) {
        (**self).set_now(now)
    }

    fn arm_deadline(&mut self, at: Timestamp) {
        (**self).arm_deadline(at)
    }

    fn clear_deadline(&mut self) {
        (**self).clear_deadline()
    }
}
