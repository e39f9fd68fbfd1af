use crate::config::ControlConfig;

/// Maps ambient light to one of `level_count` discrete brightness levels.
///
/// Uses a power law on the normalized lux so that most of the resolution sits
/// at low light levels, where the eye is most sensitive.
#[derive(Clone, Copy, Debug)]
pub struct BrightnessMapper {
    lux_max: f64,
    exponent: f64,
    min: u32,
    max: u32,
    step: u32,
    levels: u32,
}

impl BrightnessMapper {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            lux_max: config.lux_max,
            exponent: config.power_exponent,
            min: config.brightness_min,
            max: config.brightness_max,
            step: config.step_size,
            levels: config.level_count,
        }
    }

    pub fn map(&self, lux: f64) -> u32 {
        // NaN from a garbage reading is treated as darkness
        let lux = if lux.is_nan() {
            0.0
        } else {
            lux.clamp(0.0, self.lux_max)
        };

        let target = if lux <= 1.0 {
            self.min as f64
        } else {
            let normalized = (lux / self.lux_max).powf(self.exponent);
            self.min as f64 + (self.max - self.min) as f64 * normalized
        };

        self.quantize(target)
    }

    /// Round an absolute brightness to the nearest level, never below level 1.
    pub fn quantize(&self, value: f64) -> u32 {
        let steps = (value / self.step as f64).round().clamp(1.0, self.levels as f64) as u32;
        (steps * self.step).clamp(self.min, self.max)
    }
}
