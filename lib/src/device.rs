use crate::capability::*;
use crate::consts::*;
use crate::errors::*;
use crate::util::*;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex::Regex;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use zbus::Connection;

make_log_macro!(debug, "device");
make_log_macro!(info, "device");
make_log_macro!(warn, "device");

#[zbus::dbus_proxy(
    interface = "org.freedesktop.login1.Session",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1/session/auto"
)]
trait Session {
    fn set_brightness(&self, subsystem: &str, name: &str, brightness: u32) -> zbus::Result<()>;
}

/// A denied backlight write is the one fatal error, whether it comes from
/// opening the file or writing to it.
fn classify_write_error(path: &Path, e: std::io::Error) -> AlsError {
    if e.kind() == ErrorKind::PermissionDenied {
        AlsError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else {
        AlsError::Other(format!(
            "Could not write sysfs brightness {}: {e}",
            path.display()
        ))
    }
}

async fn write_sysfs(path: &Path, value: u32) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| classify_write_error(path, e))?;
    file.write_all(value.to_string().as_bytes())
        .await
        .map_err(|e| classify_write_error(path, e))
}

async fn read_number<T>(path: &Path) -> Result<T>
where
    T: std::str::FromStr,
    AlsError: From<T::Err>,
{
    Ok(read_file(path).await?.parse()?)
}

/// Ambient light sensor exposing lux as a single sysfs attribute.
pub struct SysfsLightSensor {
    path: PathBuf,
}

impl SysfsLightSensor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl LightSensor for SysfsLightSensor {
    async fn read(&mut self) -> Result<f64> {
        read_number(&self.path).await
    }
}

/// Represents a physical backlight device under `/sys/class/backlight`.
pub struct SysfsBacklight {
    pub device_name: String,
    read_brightness_file: PathBuf,
    write_brightness_file: PathBuf,
    max_brightness: u32,
    dbus_proxy: Option<SessionProxy<'static>>,
}

impl SysfsBacklight {
    /// Use the first backlight whose name matches `device_regex`.
    pub async fn discover(device_regex: &str) -> Result<Self> {
        Self::discover_in(Path::new(BACKLIGHT_PATH), device_regex).await
    }

    pub async fn discover_in(class_path: &Path, device_regex: &str) -> Result<Self> {
        let regex = Regex::new(device_regex)?;
        let device_path =
            find_device(class_path, &regex)
                .await?
                .ok_or_else(|| AlsError::NoDevice {
                    class: "backlight",
                    regex: device_regex.to_string(),
                })?;

        let dbus_proxy = match Connection::system().await {
            Ok(conn) => match SessionProxy::new(&conn).await {
                Ok(proxy) => Some(proxy),
                Err(e) => {
                    debug!("Failed to create SessionProxy: {e}");
                    None
                }
            },
            Err(e) => {
                debug!("Failed to open DBus system connection: {e}");
                None
            }
        };

        Self::open(&device_path, dbus_proxy).await
    }

    async fn open(device_path: &Path, dbus_proxy: Option<SessionProxy<'static>>) -> Result<Self> {
        let device_name = device_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        let max_brightness = read_number(&device_path.join(FILE_MAX_BRIGHTNESS))
            .await
            .error("Failed to read max_brightness")?;

        Ok(Self {
            read_brightness_file: device_path.join({
                if device_path.ends_with("amdgpu_bl0") {
                    FILE_BRIGHTNESS_AMD
                } else {
                    FILE_BRIGHTNESS
                }
            }),
            write_brightness_file: device_path.join(FILE_BRIGHTNESS_WRITE),
            device_name,
            max_brightness,
            dbus_proxy,
        })
    }

    pub fn max_brightness(&self) -> u32 {
        self.max_brightness
    }
}

#[async_trait]
impl BrightnessDevice for SysfsBacklight {
    async fn read(&mut self) -> Result<u32> {
        read_number(&self.read_brightness_file).await
    }

    async fn write(&mut self, value: u32) -> Result<()> {
        let value = value.min(self.max_brightness);
        if let Some(proxy) = &self.dbus_proxy {
            match proxy
                .set_brightness("backlight", &self.device_name, value)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) => {
                    // Fall back to writing to sysfs brightness file
                    debug!("{e}");
                }
            }
        }
        write_sysfs(&self.write_brightness_file, value).await
    }
}

/// Keyboard backlight LED under `/sys/class/leds`.
pub struct SysfsKeyboardBacklight {
    brightness_file: PathBuf,
}

impl SysfsKeyboardBacklight {
    /// Returns `None` when no LED matches, keyboard control is then skipped.
    pub async fn discover(led_regex: &str) -> Result<Option<Self>> {
        Self::discover_in(Path::new(LEDS_PATH), led_regex).await
    }

    pub async fn discover_in(class_path: &Path, led_regex: &str) -> Result<Option<Self>> {
        let regex = Regex::new(led_regex)?;
        let found = match find_device(class_path, &regex).await {
            Ok(found) => found,
            Err(AlsError::Io(e)) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };
        match found {
            Some(path) => {
                info!("keyboard backlight at {}", path.display());
                Ok(Some(Self {
                    brightness_file: path.join(FILE_BRIGHTNESS_WRITE),
                }))
            }
            None => {
                info!("no keyboard backlight matches {led_regex:?}, keyboard control disabled");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl KeyboardBacklightDevice for SysfsKeyboardBacklight {
    async fn read(&mut self) -> Result<KeyboardState> {
        read_number(&self.brightness_file)
            .await
            .map(KeyboardState::from_raw)
    }

    async fn write(&mut self, state: KeyboardState) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.brightness_file)
            .await?;
        file.write_all(state.as_raw().to_string().as_bytes())
            .await
            .map_err(Into::into)
    }
}

/// AC adapter `online` attribute.
pub struct SysfsPowerSource {
    online_file: PathBuf,
    warned: bool,
}

impl SysfsPowerSource {
    pub fn new(online_file: impl Into<PathBuf>) -> Self {
        Self {
            online_file: online_file.into(),
            warned: false,
        }
    }
}

#[async_trait]
impl PowerSource for SysfsPowerSource {
    async fn power_state(&mut self) -> Result<PowerState> {
        match read_file(&self.online_file).await {
            Ok(status) if status == "0" => Ok(PowerState::Battery),
            Ok(_) => Ok(PowerState::Ac),
            // Desktops have no adapter to report
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if !self.warned {
                    warn!(
                        "{} not found, assuming AC is connected",
                        self.online_file.display()
                    );
                    self.warned = true;
                }
                Ok(PowerState::Ac)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn backlight_dir(name: &str, current: &str, max: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let device = dir.path().join(name);
        std::fs::create_dir(&device).unwrap();
        std::fs::write(device.join(FILE_BRIGHTNESS), format!("{current}\n")).unwrap();
        std::fs::write(device.join(FILE_MAX_BRIGHTNESS), format!("{max}\n")).unwrap();
        (dir, device)
    }

    #[tokio::test]
    async fn backlight_reads_and_writes_sysfs() {
        let (_dir, device) = backlight_dir("intel_backlight", "410", "820");
        std::fs::write(device.join(FILE_BRIGHTNESS_WRITE), "410").unwrap();
        let mut backlight = SysfsBacklight::open(&device, None).await.unwrap();

        assert_eq!(backlight.max_brightness(), 820);
        assert_eq!(backlight.device_name, "intel_backlight");

        backlight.write(5000).await.unwrap();
        let written = std::fs::read_to_string(device.join(FILE_BRIGHTNESS_WRITE)).unwrap();
        assert_eq!(written, "820");
    }

    #[test]
    fn denied_write_is_fatal() {
        let path = Path::new("/sys/class/backlight/intel_backlight/brightness");

        let denied = std::io::Error::from(ErrorKind::PermissionDenied);
        let err = classify_write_error(path, denied);
        assert!(err.is_fatal());
        assert!(matches!(err, AlsError::PermissionDenied { path: p } if p == path));

        let busy = std::io::Error::from(ErrorKind::ResourceBusy);
        assert!(!classify_write_error(path, busy).is_fatal());
    }

    #[tokio::test]
    async fn failed_write_to_directory_is_not_fatal() {
        let (_dir, device) = backlight_dir("intel_backlight", "410", "820");
        let mut backlight = SysfsBacklight::open(&device, None).await.unwrap();
        // "brightness" is a directory here, so the write fails but not fatally
        std::fs::create_dir(device.join(FILE_BRIGHTNESS_WRITE)).unwrap();

        let err = backlight.write(164).await.unwrap_err();
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn backlight_reads_actual_brightness() {
        let (_dir, device) = backlight_dir("intel_backlight", "246", "820");
        let mut backlight = SysfsBacklight::open(&device, None).await.unwrap();

        assert_eq!(backlight.read().await.unwrap(), 246);
    }

    #[tokio::test]
    async fn missing_backlight_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = SysfsBacklight::discover_in(dir.path(), "intel")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AlsError::NoDevice { class: "backlight", .. }));
    }

    #[tokio::test]
    async fn sensor_parses_lux() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ali");
        std::fs::write(&path, "123\n").unwrap();

        let mut sensor = SysfsLightSensor::new(&path);
        assert_eq!(sensor.read().await.unwrap(), 123.0);

        std::fs::write(&path, "garbage").unwrap();
        assert!(sensor.read().await.is_err());
    }

    #[tokio::test]
    async fn power_source_states() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("online");
        let mut power = SysfsPowerSource::new(&path);

        assert_eq!(power.power_state().await.unwrap(), PowerState::Ac);

        std::fs::write(&path, "0\n").unwrap();
        assert_eq!(power.power_state().await.unwrap(), PowerState::Battery);

        std::fs::write(&path, "1\n").unwrap();
        assert_eq!(power.power_state().await.unwrap(), PowerState::Ac);
    }

    #[tokio::test]
    async fn keyboard_backlight_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let led = dir.path().join("asus::kbd_backlight");
        std::fs::create_dir(&led).unwrap();
        std::fs::write(led.join(FILE_BRIGHTNESS_WRITE), "0\n").unwrap();

        let mut keyboard = SysfsKeyboardBacklight::discover_in(dir.path(), DEFAULT_KEYBOARD_REGEX)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(keyboard.read().await.unwrap(), KeyboardState::Off);

        keyboard.write(KeyboardState::On).await.unwrap();
        assert_eq!(keyboard.read().await.unwrap(), KeyboardState::On);
    }

    #[tokio::test]
    async fn absent_keyboard_backlight_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("leds");

        assert!(
            SysfsKeyboardBacklight::discover_in(&missing, DEFAULT_KEYBOARD_REGEX)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            SysfsKeyboardBacklight::discover_in(dir.path(), DEFAULT_KEYBOARD_REGEX)
                .await
                .unwrap()
                .is_none()
        );
    }
}
