//! Radio alarm timing
//!
//! Derives the integer tick constants used by every timing-dependent layer
//! (alarm scheduling, low-power-listening windows, acknowledgement waits)
//! from the processor clock configuration.
//!
//! The constants of the crate's own build are resolved at compile time:
//!
//! ```
//! use rfstack::time::ALARM;
//!
//! assert_eq!(ALARM.log2_ticks_per_millisecond(), 10);
//! let ack_wait = ALARM.millis_to_ticks(2);
//! assert_eq!(ack_wait, 2048);
//! ```

mod alarm;

pub use self::alarm::{
    TimingParameters, ALARM_BASE_DIVIDER, ALARM_BASE_MILLI_EXP, RADIO_CRYSTAL_HZ,
};

use crate::core::{ClockConfig, RadioConfig, Result};

/// Alarm constants of this build. An unsupported clock fails compilation.
pub const ALARM: TimingParameters = match TimingParameters::derive(&RadioConfig::BUILD.clock) {
    Ok(params) => params,
    Err(_) => panic!("radio alarm clock must run at the required MHz"),
};

/// Derives the alarm constants for a runtime-loaded configuration
pub fn derive(clock: &ClockConfig) -> Result<TimingParameters> {
    let params = TimingParameters::derive(clock)?;
    tracing::debug!(
        mhz = clock.mhz,
        prescaler = clock.divisor.prescaler(),
        ticks_per_us = params.ticks_per_microsecond(),
        milli_exp = params.log2_ticks_per_millisecond(),
        "derived radio alarm timing"
    );
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ClockDivisor, ConfigError, Error};

    #[test]
    fn test_build_alarm() {
        assert_eq!(ALARM.ticks_per_microsecond(), 0);
        assert_eq!(ALARM.log2_ticks_per_millisecond(), 10);
        assert_eq!(Ok(ALARM), TimingParameters::derive(&ClockConfig::default()));
    }

    #[test]
    fn test_derive_reports_config_error() {
        let err = derive(&ClockConfig { mhz: 16, divisor: ClockDivisor::Divide8 }).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::UnsupportedClock { required: 8, found: 16 })
        ));
    }
}
