use serde::Serialize;

use crate::core::{ClockConfig, ConfigError, REQUIRED_MHZ};

/// Frequency of the crystal driving the radio alarm timer
pub const RADIO_CRYSTAL_HZ: u32 = 7_372_800;

/// Divider from the crystal to the 32 kHz alarm base
pub const ALARM_BASE_DIVIDER: u32 = 32;

/// log2 of alarm base ticks per millisecond
pub const ALARM_BASE_MILLI_EXP: u8 = 5;

/// Nominal rate the timer prescaler is matched against
const TIMER_BASE_HZ: u64 = 32_768;

/// Integer constants used by timing-dependent layers to schedule alarms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimingParameters {
    ticks_per_microsecond: u32,
    log2_ticks_per_millisecond: u8,
    divide_log2: u8,
    ticks_per_second: u32,
}

impl TimingParameters {
    /// Derives the alarm constants for a clock configuration.
    ///
    /// All arithmetic is integer and evaluated left to right, so
    /// `ticks_per_microsecond` truncates exactly like the hardware
    /// definition it mirrors.
    pub const fn derive(clock: &ClockConfig) -> Result<Self, ConfigError> {
        if clock.mhz != REQUIRED_MHZ {
            return Err(ConfigError::UnsupportedClock {
                required: REQUIRED_MHZ,
                found: clock.mhz,
            });
        }

        let divide_log2 = match divide_log2(clock) {
            Ok(log2) => log2,
            Err(e) => return Err(e),
        };

        let ticks_per_second = (RADIO_CRYSTAL_HZ / clock.mhz / ALARM_BASE_DIVIDER) * (1 << divide_log2);

        Ok(TimingParameters {
            ticks_per_microsecond: ticks_per_second / 1_000_000,
            log2_ticks_per_millisecond: ALARM_BASE_MILLI_EXP + divide_log2,
            divide_log2,
            ticks_per_second,
        })
    }

    /// Alarm ticks per microsecond, truncated
    pub const fn ticks_per_microsecond(&self) -> u32 {
        self.ticks_per_microsecond
    }

    /// Base two logarithm of alarm ticks per millisecond
    pub const fn log2_ticks_per_millisecond(&self) -> u8 {
        self.log2_ticks_per_millisecond
    }

    /// log2 of the timer rate over the 32 kHz base
    pub const fn divide_log2(&self) -> u8 {
        self.divide_log2
    }

    /// Untruncated alarm rate
    pub const fn ticks_per_second(&self) -> u32 {
        self.ticks_per_second
    }

    // Conversions widen to u64; a full u32 range of either unit fits.

    pub const fn micros_to_ticks(&self, micros: u32) -> u64 {
        micros as u64 * self.ticks_per_second as u64 / 1_000_000
    }

    pub const fn ticks_to_micros(&self, ticks: u32) -> u64 {
        ticks as u64 * 1_000_000 / self.ticks_per_second as u64
    }

    /// Milliseconds to ticks using the power-of-two approximation
    pub const fn millis_to_ticks(&self, millis: u32) -> u64 {
        (millis as u64) << self.log2_ticks_per_millisecond
    }
}

/// Rounded log2 of the prescaled timer rate over the 32 kHz base
const fn divide_log2(clock: &ClockConfig) -> Result<u8, ConfigError> {
    let prescaler = clock.divisor.prescaler();
    let timer_hz = clock.mhz as u64 * 1_000_000 / prescaler as u64;
    let squared = timer_hz * timer_hz;

    // Rounds in the log domain: step up while the rate is at least
    // sqrt(2) times the next lower power of two.
    if squared * 2 < TIMER_BASE_HZ * TIMER_BASE_HZ {
        return Err(ConfigError::PrescalerTooSlow { prescaler });
    }

    let mut log2 = 0u8;
    loop {
        let base = TIMER_BASE_HZ << log2;
        if squared < 2 * base * base {
            break;
        }
        log2 += 1;
    }
    Ok(log2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClockDivisor;

    fn derive(divisor: ClockDivisor) -> Result<TimingParameters, ConfigError> {
        TimingParameters::derive(&ClockConfig { mhz: 8, divisor })
    }

    #[test]
    fn test_reference_clock_golden_values() {
        let params = derive(ClockDivisor::Divide8).unwrap();
        // 0.9216 ticks per microsecond truncates to zero
        assert_eq!(params.ticks_per_microsecond(), 0);
        assert_eq!(params.log2_ticks_per_millisecond(), 10);
        assert_eq!(params.divide_log2(), 5);
        assert_eq!(params.ticks_per_second(), 921_600);
    }

    #[test]
    fn test_divisor_exponents() {
        assert_eq!(derive(ClockDivisor::Divide1).unwrap().divide_log2(), 8);
        assert_eq!(derive(ClockDivisor::Divide64).unwrap().divide_log2(), 2);
        assert_eq!(derive(ClockDivisor::Divide256).unwrap().divide_log2(), 0);
        assert_eq!(
            derive(ClockDivisor::Divide1024),
            Err(ConfigError::PrescalerTooSlow { prescaler: 1024 })
        );
    }

    #[test]
    fn test_fast_timer_truncation() {
        let params = derive(ClockDivisor::Divide1).unwrap();
        assert_eq!(params.ticks_per_second(), 28_800 * 256);
        assert_eq!(params.ticks_per_microsecond(), 7);
        assert_eq!(params.log2_ticks_per_millisecond(), 13);
    }

    #[test]
    fn test_unsupported_clock() {
        for mhz in [1, 4, 7, 16] {
            let result = TimingParameters::derive(&ClockConfig {
                mhz,
                divisor: ClockDivisor::Divide8,
            });
            assert_eq!(
                result,
                Err(ConfigError::UnsupportedClock { required: 8, found: mhz })
            );
        }
    }

    #[test]
    fn test_conversions() {
        let params = derive(ClockDivisor::Divide8).unwrap();
        assert_eq!(params.micros_to_ticks(1_000_000), 921_600);
        assert_eq!(params.micros_to_ticks(1_000), 921);
        assert_eq!(params.ticks_to_micros(921_600), 1_000_000);
        assert_eq!(params.millis_to_ticks(1), 1024);
        assert_eq!(params.millis_to_ticks(20), 20 * 1024);
    }

    #[test]
    fn test_conversions_do_not_wrap() {
        let params = derive(ClockDivisor::Divide8).unwrap();
        // u32::MAX ticks at 921.6 kHz is about 77 minutes
        assert_eq!(params.ticks_to_micros(u32::MAX), 4_660_337_776);
        assert!(params.ticks_to_micros(u32::MAX) > u32::MAX as u64);
        assert_eq!(params.millis_to_ticks(u32::MAX), (u32::MAX as u64) << 10);
        assert_eq!(params.micros_to_ticks(u32::MAX), 3_958_241_859);

        let fast = derive(ClockDivisor::Divide1).unwrap();
        assert_eq!(fast.micros_to_ticks(u32::MAX), u32::MAX as u64 * 7_372_800 / 1_000_000);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = derive(ClockDivisor::Divide8).unwrap();
        let b = derive(ClockDivisor::Divide8).unwrap();
        assert_eq!(a, b);
    }
}
