use std::time::Duration;

use tokio::time::sleep;

use crate::capability::BrightnessDevice;
use crate::config::ControlConfig;
use crate::errors::*;

make_log_macro!(debug, "fade");

/// Linear brightness ramp of fixed total duration.
#[derive(Clone, Copy, Debug)]
pub struct FadeTransition {
    duration: Duration,
    steps: u32,
}

impl FadeTransition {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            duration: config.fade_duration,
            steps: config.fade_steps.max(1),
        }
    }

    /// Number of writes used to go from `from` to `to`. Small changes use one
    /// write per unit so that no two consecutive writes are equal.
    pub fn step_count(&self, from: u32, to: u32) -> u32 {
        let diff = from.abs_diff(to);
        if diff < self.steps {
            diff.max(1)
        } else {
            self.steps
        }
    }

    /// Walk the device from `from` to `to`, sleeping between writes. Runs to
    /// completion once started.
    ///
    /// Only a permission failure is returned, every other write error is
    /// dropped so that a flaky device does not flood the log.
    pub async fn apply(&self, device: &mut dyn BrightnessDevice, from: u32, to: u32) -> Result<()> {
        if from == to {
            return Ok(());
        }

        let steps = self.step_count(from, to);
        let increment = (to as f64 - from as f64) / steps as f64;
        let delay = self.duration / steps;
        debug!("fading {from} -> {to} in {steps} steps of {delay:?}");

        for i in 1..=steps {
            let level = if i == steps {
                to
            } else {
                (from as f64 + i as f64 * increment).round() as u32
            };

            match device.write(level).await {
                Err(e) if e.is_fatal() => return Err(e),
                _ => {}
            }

            sleep(delay).await;
        }
        Ok(())
    }
}
