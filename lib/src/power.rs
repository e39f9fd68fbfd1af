use crate::capability::PowerState;
use crate::config::ControlConfig;
use crate::mapper::BrightnessMapper;

/// What a cycle should do with the panel, given power and activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerMode {
    /// Follow the light sensor.
    Normal,
    /// Idle on battery: dim to `target`, and turn the keyboard off once
    /// `keyboard_off` is set.
    IdleDim { target: u32, keyboard_off: bool },
}

#[derive(Clone, Copy, Debug)]
pub struct PowerPolicy {
    dim_timeout_ms: u64,
    kb_timeout_ms: u64,
    dim_target: u32,
}

impl PowerPolicy {
    pub fn new(config: &ControlConfig) -> Self {
        let dim = (config.brightness_max as f64 * config.inactivity_dim_fraction).floor();
        let dim_target = BrightnessMapper::new(config)
            .quantize(dim)
            .max(config.brightness_min);
        Self {
            dim_timeout_ms: config.inactivity_dim_timeout_ms,
            kb_timeout_ms: config.kb_inactivity_timeout_ms,
            dim_target,
        }
    }

    pub fn dim_target(&self) -> u32 {
        self.dim_target
    }

    pub fn mode(&self, power: PowerState, idle_ms: u64) -> PowerMode {
        match power {
            PowerState::Battery if idle_ms > self.dim_timeout_ms => PowerMode::IdleDim {
                target: self.dim_target,
                keyboard_off: idle_ms > self.kb_timeout_ms,
            },
            _ => PowerMode::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PowerPolicy {
        PowerPolicy::new(&ControlConfig::default())
    }

    #[test]
    fn ac_never_dims() {
        let policy = policy();
        for idle in [0, 120_001, 10_000_000] {
            assert_eq!(policy.mode(PowerState::Ac, idle), PowerMode::Normal);
        }
    }

    #[test]
    fn battery_dims_after_timeout() {
        let policy = policy();
        assert_eq!(policy.mode(PowerState::Battery, 0), PowerMode::Normal);
        assert_eq!(policy.mode(PowerState::Battery, 120_000), PowerMode::Normal);
        assert_eq!(
            policy.mode(PowerState::Battery, 120_001),
            PowerMode::IdleDim {
                target: 82,
                keyboard_off: false
            }
        );
        assert_eq!(
            policy.mode(PowerState::Battery, 300_001),
            PowerMode::IdleDim {
                target: 82,
                keyboard_off: true
            }
        );
    }

    #[test]
    fn dim_target_stays_on_the_grid() {
        let config = ControlConfig {
            inactivity_dim_fraction: 0.25,
            ..Default::default()
        };
        assert_eq!(PowerPolicy::new(&config).dim_target(), 246);
        assert_eq!(policy().dim_target(), 82);
    }
}
