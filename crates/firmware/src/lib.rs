//! The top-level firmware crate: the ambient logging/error/config
//! plumbing, the panic handler, and the mode-dispatcher contract the
//! rest of the workspace's crates plug into. Board bring-up (GPIO mux,
//! UART, ATAGS), the LCD driver, the Bluetooth AT-command layer, the
//! battery/ADC telemetry and the interactive per-mode command parsers
//! are out of scope; this crate only names the seams they'd occupy.

#![no_std]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod log;
pub mod panic;

pub use config::Config;
pub use dispatch::{Mode, ModeDispatcher, StreamSink};
pub use error::Error;
