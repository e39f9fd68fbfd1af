//! Recording fakes for the collaborator traits.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::capability::*;
use crate::errors::*;

/// Replays queued readings, then repeats the last one. `None` is a failed read.
#[derive(Clone, Default)]
pub struct FakeSensor {
    pub readings: Arc<Mutex<VecDeque<Option<f64>>>>,
    pub reads: Arc<Mutex<usize>>,
    last: Option<f64>,
}

impl FakeSensor {
    pub fn new(readings: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self {
            readings: Arc::new(Mutex::new(readings.into_iter().collect())),
            ..Default::default()
        }
    }

    pub fn constant(lux: f64) -> Self {
        Self::new([Some(lux)])
    }

    pub fn reads(&self) -> usize {
        *self.reads.lock().unwrap()
    }
}

#[async_trait]
impl LightSensor for FakeSensor {
    async fn read(&mut self) -> Result<f64> {
        *self.reads.lock().unwrap() += 1;
        let next = self.readings.lock().unwrap().pop_front();
        let reading = match next {
            Some(reading) => {
                self.last = reading;
                reading
            }
            None => self.last,
        };
        reading.ok_or_else(|| AlsError::Other("sensor unavailable".into()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteFailure {
    PermissionDenied,
    Busy,
}

#[derive(Clone, Default)]
pub struct FakeBacklight {
    pub current: Arc<Mutex<Option<u32>>>,
    pub writes: Arc<Mutex<Vec<u32>>>,
    pub failure: Arc<Mutex<Option<WriteFailure>>>,
}

impl FakeBacklight {
    pub fn new(current: u32) -> Self {
        Self {
            current: Arc::new(Mutex::new(Some(current))),
            ..Default::default()
        }
    }

    /// Reads fail until a value is written.
    pub fn unreadable() -> Self {
        Self::default()
    }

    pub fn failing(current: u32, failure: WriteFailure) -> Self {
        let fake = Self::new(current);
        *fake.failure.lock().unwrap() = Some(failure);
        fake
    }

    pub fn writes(&self) -> Vec<u32> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrightnessDevice for FakeBacklight {
    async fn read(&mut self) -> Result<u32> {
        self.current
            .lock()
            .unwrap()
            .ok_or_else(|| AlsError::Other("brightness unavailable".into()))
    }

    async fn write(&mut self, value: u32) -> Result<()> {
        self.writes.lock().unwrap().push(value);
        match *self.failure.lock().unwrap() {
            Some(WriteFailure::PermissionDenied) => Err(AlsError::PermissionDenied {
                path: PathBuf::from("/sys/class/backlight/fake/brightness"),
            }),
            Some(WriteFailure::Busy) => Err(AlsError::Io(std::io::Error::other("busy"))),
            None => {
                *self.current.lock().unwrap() = Some(value);
                Ok(())
            }
        }
    }
}

#[derive(Clone)]
pub struct FakeKeyboard {
    pub state: Arc<Mutex<KeyboardState>>,
    pub writes: Arc<Mutex<Vec<KeyboardState>>>,
}

impl FakeKeyboard {
    pub fn new(state: KeyboardState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            writes: Default::default(),
        }
    }

    pub fn state(&self) -> KeyboardState {
        *self.state.lock().unwrap()
    }

    pub fn writes(&self) -> Vec<KeyboardState> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyboardBacklightDevice for FakeKeyboard {
    async fn read(&mut self) -> Result<KeyboardState> {
        Ok(*self.state.lock().unwrap())
    }

    async fn write(&mut self, state: KeyboardState) -> Result<()> {
        self.writes.lock().unwrap().push(state);
        *self.state.lock().unwrap() = state;
        Ok(())
    }
}

/// Shared value handed out by a fake; `None` makes the read fail.
#[derive(Clone)]
pub struct Shared<T>(pub Arc<Mutex<Option<T>>>);

impl<T: Copy> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(Mutex::new(Some(value))))
    }

    pub fn failing() -> Self {
        Self(Arc::new(Mutex::new(None)))
    }

    pub fn set(&self, value: T) {
        *self.0.lock().unwrap() = Some(value);
    }

    fn get(&self, what: &str) -> Result<T> {
        self.0
            .lock()
            .unwrap()
            .ok_or_else(|| AlsError::Other(format!("{what} unavailable")))
    }
}

#[async_trait]
impl PowerSource for Shared<PowerState> {
    async fn power_state(&mut self) -> Result<PowerState> {
        self.get("power supply")
    }
}

#[async_trait]
impl IdleTimeProvider for Shared<u64> {
    async fn idle_ms(&mut self) -> Result<u64> {
        self.get("idle time")
    }
}

#[async_trait]
impl EnableToggle for Shared<bool> {
    async fn is_enabled(&mut self) -> Result<bool> {
        self.get("toggle")
    }
}

#[derive(Clone, Default)]
pub struct FakeNotifier {
    pub sent: Arc<Mutex<Vec<(u32, f64)>>>,
    pub fail: bool,
}

impl FakeNotifier {
    pub fn sent(&self) -> Vec<(u32, f64)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for FakeNotifier {
    async fn notify(&mut self, level: u32, lux: f64) -> Result<()> {
        self.sent.lock().unwrap().push((level, lux));
        if self.fail {
            Err(AlsError::Other("no notification daemon".into()))
        } else {
            Ok(())
        }
    }
}
