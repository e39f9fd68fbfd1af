#![warn(clippy::match_same_arms)]
#![warn(clippy::semicolon_if_nothing_returned)]
#![warn(clippy::unnecessary_wraps)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Ambient light driven backlight control.
//!
//! [`ControlLoop`] samples a light sensor, maps lux onto a small set of
//! brightness levels and fades the panel there, while a power policy dims the
//! panel (and switches the keyboard backlight off) when the machine sits idle
//! on battery. The hardware and desktop session are reached only through the
//! traits in [`capability`], with Linux implementations in [`device`] and
//! [`session`].

#[macro_use]
mod util;
pub mod capability;
mod config;
mod consts;
mod control;
pub mod device;
mod errors;
mod fade;
mod hysteresis;
mod keyboard;
mod mapper;
mod power;
mod sampler;
pub mod session;
#[cfg(test)]
mod testing;

pub use crate::capability::{KeyboardState, PowerState};
pub use crate::config::ControlConfig;
pub use crate::consts::*;
pub use crate::control::{ControlLoop, ControllerBuilder, CycleOutcome};
pub use crate::errors::{AlsError, Result};
pub use crate::fade::FadeTransition;
pub use crate::hysteresis::HysteresisGate;
pub use crate::keyboard::KeyboardBacklightPolicy;
pub use crate::mapper::BrightnessMapper;
pub use crate::power::{PowerMode, PowerPolicy};
pub use crate::sampler::SensorSampler;
