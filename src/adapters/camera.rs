//! Front camera adapter.
//!
//! - **`target_os = "espidf"`**: the esp32-camera component driving the
//!   OV2640 on the DVP bus (pins in [`crate::pins`]).  `new` initialises
//!   the driver; a sensor that fails to initialise leaves the camera
//!   unavailable and the capture session skips every trigger.
//! - **`not(target_os = "espidf")`**: a simulated sensor that returns a
//!   minimal JPEG stamped with a frame counter.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::CameraPort;
use crate::error::ActionError;

/// JPEG start-of-image and end-of-image markers.
const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

/// A frame is usable when it carries both JPEG markers.  The driver hands
/// back truncated buffers when the DMA overruns.
pub fn is_complete_jpeg(frame: &[u8]) -> bool {
    frame.len() >= 4 && frame.starts_with(&SOI) && frame.ends_with(&EOI)
}

pub struct FrontCamera {
    #[cfg(target_os = "espidf")]
    available: bool,
    #[cfg(not(target_os = "espidf"))]
    frames: u32,
}

impl Default for FrontCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
impl FrontCamera {
    pub fn new() -> Self {
        use crate::pins;
        use esp_idf_svc::sys::camera;

        let config = camera::camera_config_t {
            pin_pwdn: pins::CAM_PWDN_GPIO,
            pin_reset: pins::CAM_RESET_GPIO,
            pin_xclk: pins::CAM_XCLK_GPIO,
            __bindgen_anon_1: camera::camera_config_t__bindgen_ty_1 {
                pin_sccb_sda: pins::CAM_SIOD_GPIO,
            },
            __bindgen_anon_2: camera::camera_config_t__bindgen_ty_2 {
                pin_sccb_scl: pins::CAM_SIOC_GPIO,
            },
            pin_d7: pins::CAM_D7_GPIO,
            pin_d6: pins::CAM_D6_GPIO,
            pin_d5: pins::CAM_D5_GPIO,
            pin_d4: pins::CAM_D4_GPIO,
            pin_d3: pins::CAM_D3_GPIO,
            pin_d2: pins::CAM_D2_GPIO,
            pin_d1: pins::CAM_D1_GPIO,
            pin_d0: pins::CAM_D0_GPIO,
            pin_vsync: pins::CAM_VSYNC_GPIO,
            pin_href: pins::CAM_HREF_GPIO,
            pin_pclk: pins::CAM_PCLK_GPIO,
            xclk_freq_hz: pins::CAM_XCLK_FREQ_HZ,
            // Timer 0 / channel 0 belong to the buzzer.
            ledc_timer: camera::ledc_timer_t_LEDC_TIMER_1,
            ledc_channel: camera::ledc_channel_t_LEDC_CHANNEL_1,
            pixel_format: camera::pixformat_t_PIXFORMAT_JPEG,
            frame_size: camera::framesize_t_FRAMESIZE_VGA,
            jpeg_quality: 12,
            fb_count: 1,
            fb_location: camera::camera_fb_location_t_CAMERA_FB_IN_DRAM,
            grab_mode: camera::camera_grab_mode_t_CAMERA_GRAB_LATEST,
            sccb_i2c_port: pins::CAM_SCCB_I2C_PORT,
            ..Default::default()
        };

        // SAFETY: `config` outlives the call; the driver copies what it keeps.
        let available = match esp_idf_svc::sys::esp!(unsafe { camera::esp_camera_init(&config) }) {
            Ok(()) => {
                info!("FrontCamera: OV2640 ready");
                true
            }
            Err(e) => {
                warn!("FrontCamera: esp_camera_init failed ({}), camera disabled", e);
                false
            }
        };
        Self { available }
    }
}

#[cfg(target_os = "espidf")]
impl Drop for FrontCamera {
    fn drop(&mut self) {
        if self.available {
            // SAFETY: matched with the successful esp_camera_init in `new`.
            unsafe {
                esp_idf_svc::sys::camera::esp_camera_deinit();
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl FrontCamera {
    pub fn new() -> Self {
        info!("FrontCamera: simulation backend");
        Self { frames: 0 }
    }
}

impl CameraPort for FrontCamera {
    #[cfg(target_os = "espidf")]
    fn is_available(&self) -> bool {
        self.available
    }

    #[cfg(target_os = "espidf")]
    fn capture(&mut self) -> Result<Vec<u8>, ActionError> {
        use esp_idf_svc::sys::camera;

        if !self.available {
            return Err(ActionError::HardwareUnavailable);
        }

        // SAFETY: the driver is initialised; the buffer is returned to it
        // before this block ends and is not referenced afterwards.
        unsafe {
            let fb = camera::esp_camera_fb_get();
            if fb.is_null() {
                warn!("FrontCamera: no frame from sensor");
                return Err(ActionError::DriverFault);
            }
            let frame = std::slice::from_raw_parts((*fb).buf, (*fb).len);
            let jpeg = is_complete_jpeg(frame).then(|| frame.to_vec());
            camera::esp_camera_fb_return(fb);
            jpeg.ok_or_else(|| {
                warn!("FrontCamera: truncated frame discarded");
                ActionError::DriverFault
            })
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_available(&self) -> bool {
        true
    }

    #[cfg(not(target_os = "espidf"))]
    fn capture(&mut self) -> Result<Vec<u8>, ActionError> {
        self.frames = self.frames.wrapping_add(1);
        // SOI, COM segment carrying the counter, EOI.
        let mut jpeg = SOI.to_vec();
        jpeg.extend_from_slice(&[0xFF, 0xFE, 0x00, 0x06]);
        jpeg.extend_from_slice(&self.frames.to_be_bytes());
        jpeg.extend_from_slice(&EOI);
        Ok(jpeg)
    }
}
