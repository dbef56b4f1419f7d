//! TamperWatch firmware entry point
//!
//! Two independent motion-detection sessions share one accelerometer:
//! the *alarm* session sounds the buzzer, the *capture* session silently
//! photographs whoever moved the device.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  DeviceHardware    LogEventSink   NvsAdapter   MonotonicClock  │
//! │  (SessionIo × 2)   (EventSink)    (Config+NVS) (uptime)        │
//! │  Console reader    ButtonDriver                                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  PasscodeGate · MotionController × 2 · FSM             │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Result, anyhow};
use esp_idf_svc::fs::fatfs::Fatfs;
use esp_idf_svc::hal::gpio::{AnyIOPin, PinDriver, Pull};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, config::TimerConfig};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::sd::{SdCardConfiguration, SdCardDriver, spi::SdSpiHostDriver};
use esp_idf_svc::hal::spi::{Dma, SpiDriver, config::DriverConfig};
use esp_idf_svc::hal::units::FromValueType;
use esp_idf_svc::io::vfs::MountedFatfs;
use log::{info, warn};

use tamperwatch::actions::alarm::AudioAlarm;
use tamperwatch::actions::photo::PhotoCapture;
use tamperwatch::adapters::camera::FrontCamera;
use tamperwatch::adapters::console;
use tamperwatch::adapters::hardware::{DeviceHardware, SessionHardware};
use tamperwatch::adapters::keep_alive::PmKeepAlive;
use tamperwatch::adapters::log_sink::LogEventSink;
use tamperwatch::adapters::nvs::NvsAdapter;
use tamperwatch::adapters::photo_library::FsPhotoLibrary;
use tamperwatch::adapters::time::MonotonicClock;
use tamperwatch::app::commands::AppCommand;
use tamperwatch::app::ports::ConfigPort;
use tamperwatch::app::service::AppService;
use tamperwatch::config::SystemConfig;
use tamperwatch::drivers::button::{ButtonDriver, ButtonEvent};
use tamperwatch::drivers::buzzer::BuzzerDriver;
use tamperwatch::fsm::context::Mode;
use tamperwatch::pins;
use tamperwatch::sensors::accelerometer::Lis2dh12;
use tamperwatch::sensors::MotionSampler;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  TamperWatch v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = NvsAdapter::new().map_err(|e| anyhow!("NVS init failed: {}", e))?;
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Peripherals ────────────────────────────────────────
    let p = Peripherals::take()?;

    // SAFETY: `pins` is the only place GPIO numbers are assigned, and each
    // pin below is claimed exactly once.
    // The camera pins are handed to the esp32-camera driver by number.
    let (sda, scl, buzzer_pin, button_pin) = unsafe {
        (
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
            AnyIOPin::new(pins::BUZZER_PWM_GPIO),
            AnyIOPin::new(pins::BUTTON_GPIO),
        )
    };
    let (sd_sck, sd_mosi, sd_miso, sd_cs) = unsafe {
        (
            AnyIOPin::new(pins::SD_SCK_GPIO),
            AnyIOPin::new(pins::SD_MOSI_GPIO),
            AnyIOPin::new(pins::SD_MISO_GPIO),
            AnyIOPin::new(pins::SD_CS_GPIO),
        )
    };

    let mut i2c = I2cDriver::new(
        p.i2c0,
        sda,
        scl,
        &I2cConfig::new().baudrate(pins::I2C_FREQ_HZ.Hz().into()),
    )?;
    let accel = match Lis2dh12::detect(&mut i2c).map(|addr| Lis2dh12::new(i2c, addr)) {
        Some(Ok(dev)) => Some(Rc::new(RefCell::new(dev))),
        Some(Err(e)) => {
            warn!("Accelerometer init failed ({}), sessions cannot arm", e);
            None
        }
        None => {
            warn!("Accelerometer not found, sessions cannot arm");
            None
        }
    };

    let buzzer_timer = LedcTimerDriver::new(
        p.ledc.timer0,
        &TimerConfig::default().frequency(pins::BUZZER_FREQ_HZ.Hz().into()),
    )?;
    let buzzer_pwm = LedcDriver::new(p.ledc.channel0, &buzzer_timer, buzzer_pin)?;

    let mut button_pin = PinDriver::input(button_pin)?;
    button_pin.set_pull(Pull::Up)?;
    let mut button = ButtonDriver::new(button_pin);

    // Unmounted when dropped, so it lives for the whole of `main`.
    let sd_card = SpiDriver::new(
        p.spi2,
        sd_sck,
        sd_mosi,
        Some(sd_miso),
        &DriverConfig::default().dma(Dma::Auto(4096)),
    )
    .and_then(|spi| {
        SdSpiHostDriver::new(
            spi,
            Some(sd_cs),
            AnyIOPin::none(),
            AnyIOPin::none(),
            AnyIOPin::none(),
            None,
        )
    })
    .and_then(|host| SdCardDriver::new_spi(host, &SdCardConfiguration::new()))
    .and_then(|card| Fatfs::new_sdcard(0, card))
    .and_then(|fatfs| MountedFatfs::mount(fatfs, pins::SD_MOUNT_POINT, 4));
    let _sd_card = match sd_card {
        Ok(mounted) => {
            info!("SD card mounted at {}", pins::SD_MOUNT_POINT);
            Some(mounted)
        }
        Err(e) => {
            warn!("SD card not mounted ({}), photos cannot be saved", e);
            None
        }
    };

    // ── 4. Sessions ───────────────────────────────────────────
    let alarm_hw = SessionHardware::new(
        MotionSampler::new(accel.clone()),
        AudioAlarm::new(BuzzerDriver::new(buzzer_pwm), &config.alarm_asset),
        PmKeepAlive::new(c"tw_alarm").with_lease_ms(config.keep_alive_lease_ms),
    );
    let capture_hw = SessionHardware::new(
        MotionSampler::new(accel),
        PhotoCapture::new(FrontCamera::new(), FsPhotoLibrary::new(config.photo_dir.as_str())),
        PmKeepAlive::new(c"tw_capture").with_lease_ms(config.keep_alive_lease_ms),
    );
    let mut hw = DeviceHardware::new(alarm_hw, capture_hw);

    let mut sink = LogEventSink::new();
    let loop_ms = u64::from(config.control_loop_interval_ms);
    let mut app = AppService::new(nvs);
    app.start(&mut sink);

    if let Err(e) = console::spawn_reader() {
        warn!("Console reader not started: {}", e);
    }

    let clock = MonotonicClock::new();
    info!("System ready. Entering main loop.");

    // ── 5. Main loop ──────────────────────────────────────────
    loop {
        let now_ms = clock.uptime_ms();

        while let Some(cmd) = console::next_command() {
            app.handle_command(cmd, &mut hw, &mut sink);
        }

        match button.tick(now_ms) {
            Some(ButtonEvent::ShortPress) => {
                app.handle_command(AppCommand::Toggle(Mode::Alarm), &mut hw, &mut sink);
            }
            Some(ButtonEvent::LongPress) => {
                app.handle_command(AppCommand::DismissPrompt(Mode::Alarm), &mut hw, &mut sink);
            }
            None => {}
        }

        app.poll(now_ms, &mut hw, &mut sink);

        std::thread::sleep(std::time::Duration::from_millis(loop_ms));
    }
}
