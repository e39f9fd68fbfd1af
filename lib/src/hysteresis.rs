use crate::config::ControlConfig;

/// Dead zone around the current brightness. Keeps sensor noise from moving
/// the panel backlight every cycle.
#[derive(Clone, Copy, Debug)]
pub struct HysteresisGate {
    threshold: f64,
}

impl HysteresisGate {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            threshold: config.hysteresis_threshold(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn accept(&self, target: u32, current: u32) -> bool {
        target.abs_diff(current) as f64 >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_level_is_not_enough() {
        let gate = HysteresisGate::new(&ControlConfig::default());
        assert!(!gate.accept(246, 164));
        assert!(!gate.accept(164, 246));
        assert!(!gate.accept(164, 164));
        assert!(!gate.accept(164, 286));
    }

    #[test]
    fn threshold_is_inclusive() {
        let gate = HysteresisGate::new(&ControlConfig::default());
        assert!(gate.accept(328, 164));
        assert!(gate.accept(164, 287));
        assert!(gate.accept(820, 82));
    }
}
