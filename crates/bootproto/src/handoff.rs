//! The watchdog-reset handoff back to the application. Tearing down
//! every peripheral cleanly before jumping to application code proved
//! fragile in the original firmware, so `LEAVE_PROGMODE_ISP` instead
//! triggers a watchdog reset; the reset handler recognizes the reason
//! and jumps straight to the application entry point. This trait lets
//! `bootproto` stay target-agnostic about how that reset is triggered.
pub trait HandoffSink {
    fn reset_into_application(&mut self) -> !;
}
