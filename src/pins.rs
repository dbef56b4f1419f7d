//! GPIO / peripheral pin assignments for the TamperWatch board (ESP32-S3).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// I²C bus (LIS2DH12 accelerometer)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// Bus clock.  The LIS2DH12 supports fast mode.
pub const I2C_FREQ_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// Piezo buzzer
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the passive buzzer.
pub const BUZZER_PWM_GPIO: i32 = 4;
/// Carrier frequency; sets the alarm pitch.
pub const BUZZER_FREQ_HZ: u32 = 2_700;

// ---------------------------------------------------------------------------
// User button (BOOT, active LOW with internal pull-up)
// ---------------------------------------------------------------------------

pub const BUTTON_GPIO: i32 = 0;

// ---------------------------------------------------------------------------
// OV2640 front camera (DVP), driven by the esp32-camera component
// ---------------------------------------------------------------------------

/// -1: line not wired.
pub const CAM_PWDN_GPIO: i32 = -1;
pub const CAM_RESET_GPIO: i32 = -1;
pub const CAM_XCLK_GPIO: i32 = 15;
pub const CAM_XCLK_FREQ_HZ: i32 = 20_000_000;
pub const CAM_SIOD_GPIO: i32 = 1;
pub const CAM_SIOC_GPIO: i32 = 2;
/// SCCB runs on I²C port 1; port 0 is the accelerometer bus.
pub const CAM_SCCB_I2C_PORT: i32 = 1;
pub const CAM_D7_GPIO: i32 = 16;
pub const CAM_D6_GPIO: i32 = 17;
pub const CAM_D5_GPIO: i32 = 18;
pub const CAM_D4_GPIO: i32 = 12;
pub const CAM_D3_GPIO: i32 = 10;
pub const CAM_D2_GPIO: i32 = 14;
pub const CAM_D1_GPIO: i32 = 21;
pub const CAM_D0_GPIO: i32 = 11;
pub const CAM_VSYNC_GPIO: i32 = 6;
pub const CAM_HREF_GPIO: i32 = 7;
pub const CAM_PCLK_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// microSD slot (SPI2, FAT)
// ---------------------------------------------------------------------------

pub const SD_SCK_GPIO: i32 = 39;
pub const SD_MOSI_GPIO: i32 = 38;
pub const SD_MISO_GPIO: i32 = 40;
pub const SD_CS_GPIO: i32 = 41;
/// VFS mount point; the photo directory lives below it.
pub const SD_MOUNT_POINT: &str = "/sdcard";
