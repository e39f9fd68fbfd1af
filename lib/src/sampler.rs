use std::time::Duration;

use tokio::time::sleep;

use crate::capability::LightSensor;
use crate::config::ControlConfig;

make_log_macro!(debug, "sampler");
make_log_macro!(warn, "sampler");

/// Averages a burst of raw sensor readings into one lux value.
#[derive(Clone, Copy, Debug)]
pub struct SensorSampler {
    count: u32,
    delay: Duration,
}

impl SensorSampler {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            count: config.sample_count.max(1),
            delay: config.sample_delay,
        }
    }

    /// Takes `count` readings, sleeping `delay` after each one, and returns
    /// their mean. A failed reading counts as `0.0` lux.
    pub async fn stabilize(&self, sensor: &mut dyn LightSensor) -> f64 {
        let mut sum = 0.0;
        for _ in 0..self.count {
            sum += match sensor.read().await {
                Ok(lux) => lux,
                Err(e) => {
                    warn!("Could not read light sensor, using 0 lux: {e}");
                    0.0
                }
            };
            sleep(self.delay).await;
        }
        let lux = sum / self.count as f64;
        debug!("stabilized {lux:.2} lux from {} samples", self.count);
        lux
    }
}
