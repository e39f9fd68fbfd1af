use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::capability::*;
use crate::config::ControlConfig;
use crate::errors::*;
use crate::fade::FadeTransition;
use crate::hysteresis::HysteresisGate;
use crate::keyboard::KeyboardBacklightPolicy;
use crate::mapper::BrightnessMapper;
use crate::power::{PowerMode, PowerPolicy};
use crate::sampler::SensorSampler;

make_log_macro!(debug, "control");
make_log_macro!(info, "control");
make_log_macro!(warn, "control");

/// What a single control cycle did.
#[derive(Clone, Debug, PartialEq)]
pub enum CycleOutcome {
    /// Automatic control is switched off by the user.
    Disabled,
    /// The current brightness could not be read, nothing was touched.
    Skipped,
    /// Idle on battery. `faded` is false when the panel was already dimmed.
    Dimmed {
        target: u32,
        faded: bool,
        keyboard: Option<KeyboardState>,
    },
    /// The sensor moved the panel to a new level.
    Adjusted {
        from: u32,
        to: u32,
        lux: f64,
        keyboard: Option<KeyboardState>,
    },
    /// The change was inside the hysteresis dead zone.
    Held {
        current: u32,
        target: u32,
        lux: f64,
        keyboard: Option<KeyboardState>,
    },
}

/// Used to construct [`ControlLoop`]
pub struct ControllerBuilder {
    config: ControlConfig,
    sensor: Option<Box<dyn LightSensor>>,
    backlight: Option<Box<dyn BrightnessDevice>>,
    keyboard: Option<Box<dyn KeyboardBacklightDevice>>,
    power: Option<Box<dyn PowerSource>>,
    idle: Option<Box<dyn IdleTimeProvider>>,
    toggle: Option<Box<dyn EnableToggle>>,
    notifier: Option<Box<dyn NotificationSink>>,
}

impl ControllerBuilder {
    /// Create a new [`ControllerBuilder`].
    pub fn new(config: ControlConfig) -> Self {
        Self {
            config,
            sensor: None,
            backlight: None,
            keyboard: None,
            power: None,
            idle: None,
            toggle: None,
            notifier: None,
        }
    }

    /// Required.
    pub fn with_sensor(mut self, sensor: impl LightSensor + 'static) -> Self {
        self.sensor = Some(Box::new(sensor));
        self
    }

    /// Required.
    pub fn with_backlight(mut self, backlight: impl BrightnessDevice + 'static) -> Self {
        self.backlight = Some(Box::new(backlight));
        self
    }

    /// Without one, keyboard backlight control is skipped.
    pub fn with_keyboard(mut self, keyboard: impl KeyboardBacklightDevice + 'static) -> Self {
        self.keyboard = Some(Box::new(keyboard));
        self
    }

    /// Defaults to always on AC.
    pub fn with_power_source(mut self, power: impl PowerSource + 'static) -> Self {
        self.power = Some(Box::new(power));
        self
    }

    /// Defaults to a user that is always active.
    pub fn with_idle_time(mut self, idle: impl IdleTimeProvider + 'static) -> Self {
        self.idle = Some(Box::new(idle));
        self
    }

    /// Defaults to always enabled.
    pub fn with_toggle(mut self, toggle: impl EnableToggle + 'static) -> Self {
        self.toggle = Some(Box::new(toggle));
        self
    }

    /// Defaults to no notifications.
    pub fn with_notifier(mut self, notifier: impl NotificationSink + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    /// Returns the constructed [`ControlLoop`] instance.
    pub fn build(self) -> Result<ControlLoop> {
        self.config.validate()?;
        let config = &self.config;

        Ok(ControlLoop {
            sampler: SensorSampler::new(config),
            mapper: BrightnessMapper::new(config),
            gate: HysteresisGate::new(config),
            fade: FadeTransition::new(config),
            keyboard_policy: KeyboardBacklightPolicy::new(config),
            power_policy: PowerPolicy::new(config),
            sensor: self
                .sensor
                .ok_or(AlsError::MissingCollaborator("light sensor"))?,
            backlight: self
                .backlight
                .ok_or(AlsError::MissingCollaborator("brightness device"))?,
            keyboard: self.keyboard,
            power: self.power,
            idle: self.idle,
            toggle: self.toggle,
            notifier: self.notifier,
            config: self.config,
        })
    }
}

/// Periodic ambient light controller. Holds no state between cycles besides
/// its collaborators, everything is re-read each time.
pub struct ControlLoop {
    config: ControlConfig,
    sampler: SensorSampler,
    mapper: BrightnessMapper,
    gate: HysteresisGate,
    fade: FadeTransition,
    keyboard_policy: KeyboardBacklightPolicy,
    power_policy: PowerPolicy,
    sensor: Box<dyn LightSensor>,
    backlight: Box<dyn BrightnessDevice>,
    keyboard: Option<Box<dyn KeyboardBacklightDevice>>,
    power: Option<Box<dyn PowerSource>>,
    idle: Option<Box<dyn IdleTimeProvider>>,
    toggle: Option<Box<dyn EnableToggle>>,
    notifier: Option<Box<dyn NotificationSink>>,
}

impl ControlLoop {
    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Run cycles every `check_interval` until `shutdown` is cancelled.
    ///
    /// Cancellation is only noticed between cycles, a fade in progress always
    /// finishes. The only error returned is a fatal permission failure.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        info!(
            "checking every {:?}, hysteresis threshold {:.2}",
            self.config.check_interval,
            self.gate.threshold()
        );

        while !shutdown.is_cancelled() {
            self.cycle().await?;

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(self.config.check_interval) => {}
            }
        }

        info!("shutting down");
        Ok(())
    }

    /// Evaluate the enable flag, power and activity, and the light sensor once.
    pub async fn cycle(&mut self) -> Result<CycleOutcome> {
        if !self.is_enabled().await {
            info!("automatic brightness is disabled");
            return Ok(CycleOutcome::Disabled);
        }

        let current = match self.backlight.read().await {
            Ok(current) => current,
            Err(e) => {
                warn!("Could not read current brightness, skipping cycle: {e}");
                return Ok(CycleOutcome::Skipped);
            }
        };

        let power = self.power_state().await;
        let idle_ms = self.idle_ms().await;

        match self.power_policy.mode(power, idle_ms) {
            PowerMode::IdleDim {
                target,
                keyboard_off,
            } => self.dim(current, target, idle_ms, keyboard_off).await,
            PowerMode::Normal => {
                debug!("{power:?}, idle for {}s, following the sensor", idle_ms / 1000);
                self.follow_sensor(current).await
            }
        }
    }

    async fn dim(
        &mut self,
        current: u32,
        target: u32,
        idle_ms: u64,
        keyboard_off: bool,
    ) -> Result<CycleOutcome> {
        let faded = target != current;
        if faded {
            info!(
                "on battery and idle for {}s, dimming to {target}",
                idle_ms / 1000
            );
            self.fade.apply(self.backlight.as_mut(), current, target).await?;
        } else {
            debug!("on battery and idle for {}s, already at {current}", idle_ms / 1000);
        }

        // Between the two timeouts the keyboard is left alone
        let keyboard = if keyboard_off {
            self.keyboard_policy
                .apply(
                    self.keyboard.as_deref_mut(),
                    0.0,
                    Some(KeyboardState::Off),
                )
                .await
        } else {
            None
        };

        Ok(CycleOutcome::Dimmed {
            target,
            faded,
            keyboard,
        })
    }

    async fn follow_sensor(&mut self, current: u32) -> Result<CycleOutcome> {
        let lux = self.sampler.stabilize(self.sensor.as_mut()).await;
        let target = self.mapper.map(lux);
        let diff = target.abs_diff(current);

        if !self.gate.accept(target, current) {
            info!(
                "{lux:.2} lux, target {target}, current {current}, change too small ({diff})"
            );
            let keyboard = self.update_keyboard(lux).await;
            return Ok(CycleOutcome::Held {
                current,
                target,
                lux,
                keyboard,
            });
        }

        info!("{lux:.2} lux, target {target}, current {current}, updating");
        self.fade.apply(self.backlight.as_mut(), current, target).await?;

        if let Some(notifier) = self.notifier.as_mut() {
            if let Err(e) = notifier.notify(target, lux).await {
                warn!("Could not send notification: {e}");
            }
        }

        let keyboard = self.update_keyboard(lux).await;
        Ok(CycleOutcome::Adjusted {
            from: current,
            to: target,
            lux,
            keyboard,
        })
    }

    async fn update_keyboard(&mut self, lux: f64) -> Option<KeyboardState> {
        self.keyboard_policy
            .apply(self.keyboard.as_deref_mut(), lux, None)
            .await
    }

    async fn is_enabled(&mut self) -> bool {
        let Some(toggle) = self.toggle.as_mut() else {
            return true;
        };
        toggle.is_enabled().await.unwrap_or_else(|e| {
            warn!("Could not read enable flag, assuming enabled: {e}");
            true
        })
    }

    async fn power_state(&mut self) -> PowerState {
        let Some(power) = self.power.as_mut() else {
            return PowerState::Ac;
        };
        power.power_state().await.unwrap_or_else(|e| {
            warn!("Could not read power supply, assuming AC: {e}");
            PowerState::Ac
        })
    }

    async fn idle_ms(&mut self) -> u64 {
        let Some(idle) = self.idle.as_mut() else {
            return 0;
        };
        idle.idle_ms().await.unwrap_or_else(|e| {
            warn!("Could not read idle time, assuming active: {e}");
            0
        })
    }
}
