//! The fixed, enumerated set of motion modes. Each mode names a sample
//! rate, accelerometer/gyroscope bandwidths, a magnetometer rate and
//! whether the quaternion filter runs; configuring a mode drives both
//! the sensor's own registers and which interrupt source feeds the
//! sample ring.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRate {
    Hz100,
    Hz200,
    Hz500,
    Hz1000,
}

impl SampleRate {
    pub const fn hz(self) -> u16 {
        match self {
            SampleRate::Hz100 => 100,
            SampleRate::Hz200 => 200,
            SampleRate::Hz500 => 500,
            SampleRate::Hz1000 => 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bandwidth {
    Narrow,
    Normal,
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagRate {
    Off,
    Hz8,
    Hz100,
}

/// Picks the interrupt source a mode drives the sensor with: its own
/// data-ready pin, or a timer dividing a faster tick down to the mode's
/// sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptSource {
    DataReady,
    TimerDivided { divisor: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub sample_rate: SampleRate,
    pub accel_bandwidth: Bandwidth,
    pub gyro_bandwidth: Bandwidth,
    pub mag_rate: MagRate,
    pub quaternion_filter: bool,
}

impl Mode {
    pub const OFF: Mode = Mode {
        sample_rate: SampleRate::Hz100,
        accel_bandwidth: Bandwidth::Normal,
        gyro_bandwidth: Bandwidth::Normal,
        mag_rate: MagRate::Off,
        quaternion_filter: false,
    };

    pub fn interrupt_source(&self) -> InterruptSource {
        match self.mag_rate {
            MagRate::Off => InterruptSource::DataReady,
            _ => InterruptSource::TimerDivided { divisor: 1000 / self.sample_rate.hz() },
        }
    }
}

/// The fixed set of supported non-off modes. An attempt to configure
/// anything outside this table (and `Mode::OFF`) is rejected by the
/// caller before it ever reaches the sensor.
pub const SUPPORTED_MODES: &[Mode] = &[
    Mode {
        sample_rate: SampleRate::Hz100,
        accel_bandwidth: Bandwidth::Narrow,
        gyro_bandwidth: Bandwidth::Narrow,
        mag_rate: MagRate::Off,
        quaternion_filter: false,
    },
    Mode {
        sample_rate: SampleRate::Hz100,
        accel_bandwidth: Bandwidth::Normal,
        gyro_bandwidth: Bandwidth::Normal,
        mag_rate: MagRate::Hz8,
        quaternion_filter: true,
    },
    Mode {
        sample_rate: SampleRate::Hz200,
        accel_bandwidth: Bandwidth::Normal,
        gyro_bandwidth: Bandwidth::Normal,
        mag_rate: MagRate::Off,
        quaternion_filter: true,
    },
    Mode {
        sample_rate: SampleRate::Hz500,
        accel_bandwidth: Bandwidth::Wide,
        gyro_bandwidth: Bandwidth::Wide,
        mag_rate: MagRate::Off,
        quaternion_filter: false,
    },
    Mode {
        sample_rate: SampleRate::Hz1000,
        accel_bandwidth: Bandwidth::Wide,
        gyro_bandwidth: Bandwidth::Wide,
        mag_rate: MagRate::Off,
        quaternion_filter: false,
    },
    Mode {
        sample_rate: SampleRate::Hz100,
        accel_bandwidth: Bandwidth::Normal,
        gyro_bandwidth: Bandwidth::Normal,
        mag_rate: MagRate::Hz100,
        quaternion_filter: true,
    },
];

pub fn is_supported(mode: &Mode) -> bool {
    *mode == Mode::OFF || SUPPORTED_MODES.contains(mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_is_always_supported() {
        assert!(is_supported(&Mode::OFF));
    }

    #[test]
    fn arbitrary_mode_outside_table_is_rejected() {
        let bogus = Mode {
            sample_rate: SampleRate::Hz1000,
            accel_bandwidth: Bandwidth::Narrow,
            gyro_bandwidth: Bandwidth::Wide,
            mag_rate: MagRate::Hz100,
            quaternion_filter: true,
        };
        assert!(!is_supported(&bogus));
    }

    #[test]
    fn mag_enabled_mode_uses_timer_divided_source() {
        let mode = SUPPORTED_MODES[1];
        assert_eq!(mode.interrupt_source(), InterruptSource::TimerDivided { divisor: 10 });
    }

    #[test]
    fn mag_off_mode_uses_data_ready_source() {
        let mode = SUPPORTED_MODES[0];
        assert_eq!(mode.interrupt_source(), InterruptSource::DataReady);
    }
}
