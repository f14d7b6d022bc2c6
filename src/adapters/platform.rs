//! Device platform bundle.
//!
//! The monitor core takes one `&mut impl Platform` per call.  This struct
//! owns the concrete adapters and forwards each port to the right one.
//!
//! ```text
//!  FeedTransport ──▶ WsTransport
//!  AudioPort     ──▶ ConsoleOutput
//!  DisplayPort   ──▶ ConsoleOutput
//!  SystemPort    ──▶ HeapMonitor (memory) + WifiAdapter (link)
//!  TouchPort     ──▶ TouchInput
//! ```

use crate::app::ports::{AudioPort, DisplayPort, FeedTransport, SystemPort, TouchPort};
use crate::list_store::{ListStore, TouchEvent};
use crate::record::Rgb565;

use super::console::ConsoleOutput;
use super::system::HeapMonitor;
use super::touch::TouchInput;
use super::wifi::{ConnectivityPort, WifiAdapter};
use super::ws_transport::WsTransport;

#[derive(Default)]
pub struct DevicePlatform {
    pub transport: WsTransport,
    pub output: ConsoleOutput,
    pub heap: HeapMonitor,
    pub wifi: WifiAdapter,
    pub touch: TouchInput,
}

impl DevicePlatform {
    pub fn new(wifi: WifiAdapter, volume: u8) -> Self {
        Self {
            transport: WsTransport::new(),
            output: ConsoleOutput::new(volume),
            heap: HeapMonitor::new(),
            wifi,
            touch: TouchInput::new(),
        }
    }
}

impl FeedTransport for DevicePlatform {
    fn connect(&mut self, url: &str) -> bool {
        self.transport.connect(url)
    }

    fn send(&mut self, text: &str) -> bool {
        self.transport.send(text)
    }

    fn ping(&mut self) -> bool {
        self.transport.ping()
    }

    fn poll(&mut self) {
        self.transport.poll();
    }

    fn close(&mut self) {
        self.transport.close();
    }
}

impl AudioPort for DevicePlatform {
    fn play_tone(&mut self, frequency_hz: u16, duration_ms: u32) {
        self.output.play_tone(frequency_hz, duration_ms);
    }
}

impl DisplayPort for DevicePlatform {
    fn flash_region(&mut self, colour: Rgb565) {
        self.output.flash_region(colour);
    }

    fn render_list(&mut self, list: &ListStore) {
        self.output.render_list(list);
    }
}

impl TouchPort for DevicePlatform {
    fn poll_touch(&mut self) -> TouchEvent {
        self.touch.poll_touch()
    }
}

impl SystemPort for DevicePlatform {
    fn available_memory(&self) -> u32 {
        self.heap.free_bytes()
    }

    fn link_up(&self) -> bool {
        self.wifi.is_connected()
    }
}
