/// Location of backlight devices
pub const BACKLIGHT_PATH: &str = "/sys/class/backlight";

/// Location of LED devices, keyboard backlights live here
pub const LEDS_PATH: &str = "/sys/class/leds";

/// Filename for device's max brightness
pub const FILE_MAX_BRIGHTNESS: &str = "max_brightness";

/// Filename for current brightness.
pub const FILE_BRIGHTNESS: &str = "actual_brightness";

/// amdgpu drivers set the actual_brightness in a different scale than
/// [0, max_brightness], so we have to use the 'brightness' file instead.
pub const FILE_BRIGHTNESS_AMD: &str = "brightness";

/// set the requested brightness level
pub const FILE_BRIGHTNESS_WRITE: &str = "brightness";

/// ACPI ambient light sensor, reports lux
pub const DEFAULT_SENSOR_PATH: &str = "/sys/devices/LNXSYSTM:00/LNXSYBUS:00/ACPI0008:00/ali";

/// `1` while the AC adapter is plugged in, `0` on battery
pub const DEFAULT_AC_ONLINE_PATH: &str = "/sys/class/power_supply/AC0/online";

pub const DEFAULT_BACKLIGHT_REGEX: &str = "intel_backlight";

pub const DEFAULT_KEYBOARD_REGEX: &str = "kbd_backlight";

/// Enable flag, relative to the home directory
pub const TOGGLE_FILE_NAME: &str = ".als_controller_state";

pub const IDLE_COMMAND: &str = "xprintidle";

pub const NOTIFY_COMMAND: &str = "notify-send";
