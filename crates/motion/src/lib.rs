//! Motion pipeline: the fixed mode table driving the inertial sensor,
//! the ISR-fed sample ring, calibration, and an optional orientation
//! fusion filter.

#![no_std]

pub mod calibration;
pub mod mode;
pub mod quaternion;
pub mod ring;
pub mod sample;

pub use calibration::{calibrate, mag_calibrate, CalibrationMode, MotionSensor};
pub use mode::{Bandwidth, InterruptSource, MagRate, Mode, SampleRate, SUPPORTED_MODES};
pub use quaternion::{Madgwick, OrientationFilter, Quaternion};
pub use ring::SampleRing;
pub use sample::{Sample, REGISTER_WINDOW_LEN};
