//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements          | Connects to               |
//! |-----------------|---------------------|---------------------------|
//! | `camera`        | CameraPort          | Front camera / simulation |
//! | `console`       | (command source)    | Serial console (stdin)    |
//! | `hardware`      | SessionIo, DeviceIo | Per-session peripherals   |
//! | `keep_alive`    | KeepAlivePort       | ESP-IDF PM lock           |
//! | `log_sink`      | EventSink           | Serial log output         |
//! | `nvs`           | ConfigPort          | NVS / in-memory store     |
//! |                 | StoragePort         |                           |
//! | `photo_library` | PhotoLibraryPort    | SD card / filesystem      |
//! | `time`          | (clock)             | ESP32 system timer        |

pub mod camera;
pub mod console;
pub mod hardware;
pub mod keep_alive;
pub mod log_sink;
pub mod nvs;
pub mod photo_library;
pub mod time;
