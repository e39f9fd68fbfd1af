use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use alsctl::device::{SysfsBacklight, SysfsKeyboardBacklight, SysfsLightSensor, SysfsPowerSource};
use alsctl::session::{FileToggle, NotifySend, XPrintIdle};
use alsctl::{AlsError, BrightnessMapper, ControlConfig, ControllerBuilder};

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

/// Adjust the screen and keyboard backlight to the ambient light
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable flag file, defaults to ~/.als_controller_state
    #[arg(long, value_name = "path", global = true)]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Run the controller until interrupted.
    Run(RunArgs),
    /// Turn automatic brightness on.
    Enable,
    /// Turn automatic brightness off.
    Disable,
    /// Flip automatic brightness on or off.
    Toggle,
    /// Print whether automatic brightness is on.
    Status,
    /// Print the brightness level chosen for a lux value.
    Map {
        #[arg(value_name = "lux")]
        lux: f64,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Regular expression for the backlight device to control
    #[arg(long, value_name = "regex", default_value_t = String::from(alsctl::DEFAULT_BACKLIGHT_REGEX))]
    device: String,

    /// Regular expression for the keyboard backlight LED
    #[arg(long, value_name = "regex", default_value_t = String::from(alsctl::DEFAULT_KEYBOARD_REGEX))]
    keyboard: String,

    /// Ambient light sensor attribute reporting lux
    #[arg(long, value_name = "path", default_value = alsctl::DEFAULT_SENSOR_PATH)]
    sensor: PathBuf,

    /// AC adapter `online` attribute
    #[arg(long, value_name = "path", default_value = alsctl::DEFAULT_AC_ONLINE_PATH)]
    ac_online: PathBuf,

    /// Seconds between checks
    #[arg(long, value_name = "seconds", default_value_t = 5.0)]
    interval: f64,

    /// Seconds a brightness fade takes
    #[arg(long, value_name = "seconds", default_value_t = 2.0)]
    fade: f64,

    /// Do not send desktop notifications
    #[arg(long)]
    no_notify: bool,

    /// Leave the keyboard backlight alone
    #[arg(long)]
    no_keyboard: bool,
}

fn seconds(value: f64, name: &str) -> Result<Duration, AlsError> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| AlsError::InvalidConfig(format!("{name} ({value}): {e}")))
}

async fn run(args: RunArgs, toggle: FileToggle) -> Result<(), AlsError> {
    let config = ControlConfig {
        check_interval: seconds(args.interval, "interval")?,
        fade_duration: seconds(args.fade, "fade")?,
        ..Default::default()
    };

    #[cfg(unix)]
    if unsafe { libc::geteuid() } != 0 {
        warn!("not running as root, writing the backlight may be denied");
    }

    let backlight = SysfsBacklight::discover(&args.device).await?;
    info!("backlight: {}", backlight.device_name);
    if backlight.max_brightness() < config.brightness_max {
        warn!(
            "{} reports max brightness {}, below the configured {}",
            backlight.device_name,
            backlight.max_brightness(),
            config.brightness_max
        );
    }
    info!("sensor: {}", args.sensor.display());
    info!("power supply: {}", args.ac_online.display());
    info!("enable flag: {}", toggle.path().display());

    let mut builder = ControllerBuilder::new(config.clone())
        .with_sensor(SysfsLightSensor::new(args.sensor))
        .with_backlight(backlight)
        .with_power_source(SysfsPowerSource::new(args.ac_online))
        .with_idle_time(XPrintIdle::default())
        .with_toggle(toggle);
    if !args.no_notify {
        builder = builder.with_notifier(NotifySend::new(config.brightness_max));
    }
    if !args.no_keyboard {
        if let Some(keyboard) = SysfsKeyboardBacklight::discover(&args.keyboard).await? {
            builder = builder.with_keyboard(keyboard);
        }
    }
    let mut controller = builder.build()?;

    let effective = controller.config();
    info!("fade duration: {:?}", effective.fade_duration);
    info!(
        "inactivity dimming after {}s, keyboard off after {}s, keyboard lit at <= {} lux",
        effective.inactivity_dim_timeout_ms / 1000,
        effective.kb_inactivity_timeout_ms / 1000,
        effective.kb_lux_threshold
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    controller.run(shutdown).await
}

async fn wait_for_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!("Could not listen for SIGTERM: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    let _ = tokio::signal::ctrl_c().await;

    info!("stop requested, finishing the current cycle");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = match args.action {
        Action::Run(_) => "info",
        _ => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match dispatch(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(args: Args) -> Result<(), AlsError> {
    let toggle = match args.state_file {
        Some(path) => FileToggle::new(path),
        None => FileToggle::in_home()?,
    };

    match args.action {
        Action::Run(run_args) => run(run_args, toggle).await?,
        Action::Enable => toggle.set(true).await?,
        Action::Disable => toggle.set(false).await?,
        Action::Toggle => {
            let enabled = toggle.toggle().await?;
            println!("{}", if enabled { "enabled" } else { "disabled" });
        }
        Action::Status => {
            let enabled = toggle.read().await?;
            println!("{}", if enabled { "enabled" } else { "disabled" });
        }
        Action::Map { lux } => {
            println!("{}", BrightnessMapper::new(&ControlConfig::default()).map(lux));
        }
    }

    Ok(())
}
