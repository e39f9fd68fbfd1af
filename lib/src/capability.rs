//! The outside world as seen by the controller.
//!
//! Every read may fail; the controller decides which default replaces a
//! failed read. Implementations backed by sysfs and desktop tools live in
//! [`crate::device`] and [`crate::session`].

use async_trait::async_trait;

use crate::errors::*;

/// Binary state of the keyboard backlight LED.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyboardState {
    Off,
    On,
}

impl KeyboardState {
    pub fn from_raw(raw: u32) -> Self {
        if raw == 0 {
            KeyboardState::Off
        } else {
            KeyboardState::On
        }
    }

    pub fn as_raw(self) -> u32 {
        match self {
            KeyboardState::Off => 0,
            KeyboardState::On => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerState {
    Ac,
    Battery,
}

#[async_trait]
pub trait LightSensor: Send {
    /// Instantaneous illuminance in lux.
    async fn read(&mut self) -> Result<f64>;
}

#[async_trait]
pub trait BrightnessDevice: Send {
    /// Current brightness in absolute device units.
    async fn read(&mut self) -> Result<u32>;

    /// A denied write must come back as [`AlsError::PermissionDenied`].
    async fn write(&mut self, value: u32) -> Result<()>;
}

#[async_trait]
pub trait KeyboardBacklightDevice: Send {
    async fn read(&mut self) -> Result<KeyboardState>;
    async fn write(&mut self, state: KeyboardState) -> Result<()>;
}

#[async_trait]
pub trait PowerSource: Send {
    async fn power_state(&mut self) -> Result<PowerState>;
}

#[async_trait]
pub trait IdleTimeProvider: Send {
    /// Milliseconds since the last keyboard or pointer input.
    async fn idle_ms(&mut self) -> Result<u64>;
}

#[async_trait]
pub trait EnableToggle: Send {
    async fn is_enabled(&mut self) -> Result<bool>;
}

#[async_trait]
pub trait NotificationSink: Send {
    async fn notify(&mut self, level: u32, lux: f64) -> Result<()>;
}
