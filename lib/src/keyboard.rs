use crate::capability::{KeyboardBacklightDevice, KeyboardState};
use crate::config::ControlConfig;

make_log_macro!(info, "keyboard");
make_log_macro!(warn, "keyboard");

#[derive(Clone, Copy, Debug)]
pub struct KeyboardBacklightPolicy {
    lux_threshold: f64,
}

impl KeyboardBacklightPolicy {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            lux_threshold: config.kb_lux_threshold,
        }
    }

    /// A forced state wins, otherwise the keyboard is lit in the dark.
    pub fn decide(&self, lux: f64, forced: Option<KeyboardState>) -> KeyboardState {
        match forced {
            Some(state) => state,
            None if lux <= self.lux_threshold => KeyboardState::On,
            None => KeyboardState::Off,
        }
    }

    /// Decide and write the state, touching the device only when it changes.
    /// Returns the state that was written, if any.
    pub async fn apply(
        &self,
        device: Option<&mut (dyn KeyboardBacklightDevice + 'static)>,
        lux: f64,
        forced: Option<KeyboardState>,
    ) -> Option<KeyboardState> {
        let device = device?;
        let target = self.decide(lux, forced);

        let current = match device.read().await {
            Ok(current) => current,
            Err(e) => {
                warn!("Could not read keyboard backlight: {e}");
                return None;
            }
        };
        if current == target {
            return None;
        }

        match device.write(target).await {
            Ok(()) => {
                let reason = if forced.is_some() { "forced" } else { "ALS" };
                info!("keyboard backlight ({reason}) set to {target:?}");
                Some(target)
            }
            Err(e) => {
                warn!("Could not set keyboard backlight: {e}");
                None
            }
        }
    }
}
