//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                 |
//! |----------------|--------------------|-----------------------------|
//! | `console`      | AudioPort          | Serial log (tone events)    |
//! |                | DisplayPort        | Serial log (list snapshot)  |
//! | `history`      | -                  | REST node (HTTP GET)        |
//! | `log_sink`     | EventSink          | Serial log output           |
//! | `platform`     | Platform (bundle)  | All of the below            |
//! | `system`       | SystemPort (heap)  | ESP-IDF heap allocator      |
//! | `time`         | -                  | ESP32 system timer          |
//! | `touch`        | TouchPort          | Panel touch controller      |
//! | `wifi`         | SystemPort (link)  | ESP-IDF WiFi STA            |
//! | `ws_transport` | FeedTransport      | ESP-IDF WebSocket client    |

pub mod console;
pub mod history;
pub mod log_sink;
pub mod platform;
pub mod system;
pub mod time;
pub mod touch;
pub mod wifi;
pub mod ws_transport;
