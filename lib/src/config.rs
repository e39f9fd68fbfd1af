use crate::errors::*;

use std::time::Duration;

use smart_default::SmartDefault;

make_log_macro!(debug, "config");

/// Every tunable of the controller. Built once at startup and never mutated,
/// each component copies the values it needs when it is constructed.
#[derive(Clone, Debug, PartialEq, SmartDefault)]
pub struct ControlConfig {
    /// Highest lux value the sensor reports, readings above are clamped.
    #[default(6159.0)]
    pub lux_max: f64,

    #[default(82)]
    pub brightness_min: u32,

    #[default(820)]
    pub brightness_max: u32,

    /// Width of one discrete brightness level.
    #[default(82)]
    pub step_size: u32,

    /// Number of discrete brightness levels.
    #[default(10)]
    pub level_count: u32,

    /// Exponent of the lux to brightness power law, `< 1` favours dim light.
    #[default(0.3)]
    pub power_exponent: f64,

    /// Keyboard backlight is lit at or below this many lux.
    #[default(1.0)]
    pub kb_lux_threshold: f64,

    /// Changes smaller than `step_size * hysteresis_factor` are ignored.
    #[default(1.5)]
    pub hysteresis_factor: f64,

    #[default(Duration::from_secs(2))]
    pub fade_duration: Duration,

    #[default(50)]
    pub fade_steps: u32,

    #[default(Duration::from_secs(5))]
    pub check_interval: Duration,

    /// Raw sensor samples averaged per reading.
    #[default(3)]
    pub sample_count: u32,

    /// Delay after every raw sample.
    #[default(Duration::from_millis(500))]
    pub sample_delay: Duration,

    #[default(120_000)]
    pub inactivity_dim_timeout_ms: u64,

    #[default(300_000)]
    pub kb_inactivity_timeout_ms: u64,

    /// Fraction of `brightness_max` used while idle on battery.
    #[default(0.01)]
    pub inactivity_dim_fraction: f64,
}

impl ControlConfig {
    pub fn hysteresis_threshold(&self) -> f64 {
        self.step_size as f64 * self.hysteresis_factor
    }

    /// Check that the constants describe a usable brightness scale.
    pub fn validate(&self) -> Result<()> {
        debug!("{:?}", self);

        let invalid = |msg: String| Err(AlsError::InvalidConfig(msg));

        if self.step_size == 0 {
            return invalid("step_size must be greater than 0".into());
        }
        if self.brightness_min == 0 || self.brightness_min > self.brightness_max {
            return invalid(format!(
                "brightness range {}..={} is empty or starts at 0",
                self.brightness_min, self.brightness_max
            ));
        }
        for (name, value) in [
            ("brightness_min", self.brightness_min),
            ("brightness_max", self.brightness_max),
        ] {
            if value % self.step_size != 0 {
                return invalid(format!(
                    "{name} ({value}) is not a multiple of step_size ({})",
                    self.step_size
                ));
            }
        }
        if self.brightness_max / self.step_size < self.level_count {
            return invalid(format!(
                "{} levels of {} do not fit below brightness_max ({})",
                self.level_count, self.step_size, self.brightness_max
            ));
        }
        if !(self.lux_max > 0.0) {
            return invalid(format!("lux_max ({}) must be positive", self.lux_max));
        }
        if !(self.power_exponent > 0.0 && self.power_exponent <= 1.0) {
            return invalid(format!(
                "power_exponent ({}) must be in (0, 1]",
                self.power_exponent
            ));
        }
        if !(0.0..=1.0).contains(&self.inactivity_dim_fraction) {
            return invalid(format!(
                "inactivity_dim_fraction ({}) must be in [0, 1]",
                self.inactivity_dim_fraction
            ));
        }
        if self.sample_count == 0 || self.fade_steps == 0 {
            return invalid("sample_count and fade_steps must be greater than 0".into());
        }
        Ok(())
    }
}
