//! Explicit-sink logging. The source hangs a `console::kprint!` macro
//! off a global UART writer; this keeps the same call shape
//! (`log!`/`log_line!` read like `kprint!`) but takes the sink as an
//! explicit first argument instead, per the no-globals rule peripherals
//! are threaded under everywhere else in this workspace.

use core::fmt;
use core::sync::atomic::{AtomicPtr, Ordering};

/// Anything text can be written to: a UART, the framed I/O channel, a
/// line buffer in tests.
pub trait Sink {
    fn write_str(&mut self, s: &str);
}

impl<W: fmt::Write> Sink for W {
    fn write_str(&mut self, s: &str) {
        let _ = fmt::Write::write_str(self, s);
    }
}

/// Adapts a [`Sink`] into a [`core::fmt::Write`] so `write!`/`writeln!`
/// can format into it. `log!`/`log_line!` build one of these around
/// whatever sink they're given.
pub struct SinkWriter<'a, S: Sink + ?Sized>(pub &'a mut S);

impl<'a, S: Sink + ?Sized> fmt::Write for SinkWriter<'a, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_str(s);
        Ok(())
    }
}

#[macro_export]
macro_rules! log {
    ($sink:expr, $($arg:tt)*) => {{
        use core::fmt::Write as _;
        let _ = write!($crate::log::SinkWriter($sink), $($arg)*);
    }};
}

#[macro_export]
macro_rules! log_line {
    ($sink:expr, $($arg:tt)*) => {{
        $crate::log!($sink, $($arg)*);
        $crate::log!($sink, "\n");
    }};
}

/// The one unavoidable global: `panic_impl` takes no arguments, so the
/// sink it writes to must be registered ahead of time. Holds a
/// `fn(&str)` rather than a `dyn Sink` trait object, since `AtomicPtr`
/// needs a thin, `Sized` pointee.
static PANIC_WRITER: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

/// Registers the function the panic handler calls to emit its banner.
/// Meant to be called once at boot, wrapping whatever sink was chosen
/// for this build (UART, the framed I/O channel before it became the
/// bootloader's).
pub fn set_panic_writer(f: fn(&str)) {
    PANIC_WRITER.store(f as *mut (), Ordering::Release);
}

/// Clears a previously registered panic writer. Exists for tests that
/// need PANIC_WRITER to start from a known state.
pub fn clear_panic_writer() {
    PANIC_WRITER.store(core::ptr::null_mut(), Ordering::Release);
}

pub(crate) fn panic_write(s: &str) {
    let ptr = PANIC_WRITER.load(Ordering::Acquire);
    if !ptr.is_null() {
        let f: fn(&str) = unsafe { core::mem::transmute(ptr) };
        f(s);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::String;
    use std::sync::Mutex;

    struct StringSink(String);
    impl Sink for StringSink {
        fn write_str(&mut self, s: &str) {
            self.0.push_str(s);
        }
    }

    #[test]
    fn log_formats_into_the_sink() {
        let mut sink = StringSink(String::new());
        log!(&mut sink, "x={} y={}", 3, 4);
        assert_eq!(sink.0, "x=3 y=4");
    }

    #[test]
    fn log_line_appends_newline() {
        let mut sink = StringSink(String::new());
        log_line!(&mut sink, "boot");
        assert_eq!(sink.0, "boot\n");
    }

    static CAPTURED: Mutex<Option<String>> = Mutex::new(None);

    fn capture(s: &str) {
        let mut slot = CAPTURED.lock().unwrap();
        let entry = slot.get_or_insert_with(String::new);
        entry.push_str(s);
    }

    // Both cases live in one test: PANIC_WRITER is a crate-wide global,
    // and parallel test threads touching it independently would race.
    #[test]
    fn panic_writer_registration_gates_delivery() {
        clear_panic_writer();
        panic_write("dropped on the floor");
        assert!(CAPTURED.lock().unwrap().is_none());

        set_panic_writer(capture);
        panic_write("hello");
        panic_write(" world");
        assert_eq!(CAPTURED.lock().unwrap().as_deref(), Some("hello world"));
        clear_panic_writer();
    }
}
