//! Optional per-message byte dump.
//!
//! Gated by an enabled flag and a bus-id filter. Both live in a [`DumpConfig`] handed to the
//! queue at construction and may be flipped at runtime by whoever else holds it.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use tracing::info;

/// Bytes per dump line.
pub const ROW_SIZE: usize = 16;

/// Column where the ASCII rendering starts: two hex digits and a separator per byte, plus one.
const ASCII_COLUMN: usize = ROW_SIZE * 3 + 1;

#[derive(Debug, Default)]
pub struct DumpConfig {
    enabled: AtomicBool,
    bus_id: AtomicI32,
}

impl DumpConfig {
    pub fn new(enabled: bool, bus_id: i32) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            bus_id: AtomicI32::new(bus_id),
        }
    }

    pub fn disabled() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn set_bus_id(&self, bus_id: i32) {
        self.bus_id.store(bus_id, Ordering::Relaxed);
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn bus_id(&self) -> i32 {
        self.bus_id.load(Ordering::Relaxed)
    }

    /// Whether messages read from `bus_id` should be dumped right now.
    pub fn matches(&self, bus_id: i32) -> bool {
        self.enabled() && self.bus_id() == bus_id
    }
}

/// Dumps drained messages of one queue.
pub struct HexDump {
    config: Arc<DumpConfig>,
    bus_id: i32,
    prefix: String,
}

impl HexDump {
    pub fn new(config: Arc<DumpConfig>, bus_id: i32) -> Self {
        Self {
            config,
            bus_id,
            prefix: format!("bus_id:{bus_id}: "),
        }
    }

    pub fn config(&self) -> &Arc<DumpConfig> {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.config.matches(self.bus_id)
    }

    pub fn dump(&self, bytes: &[u8]) {
        if !self.is_active() {
            return;
        }
        for row in hex_rows(bytes) {
            info!(target: "slave_mqueue::dump", "{}{}", self.prefix, row);
        }
    }
}

/// Render `bytes` as lines of `ROW_SIZE` space-separated hex bytes followed by their ASCII form.
pub fn hex_rows(bytes: &[u8]) -> impl Iterator<Item = String> + '_ {
    bytes.chunks(ROW_SIZE).map(format_row)
}

fn format_row(chunk: &[u8]) -> String {
    let mut line = String::with_capacity(ASCII_COLUMN + ROW_SIZE);
    for (i, byte) in chunk.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        let _ = write!(line, "{byte:02x}");
    }
    while line.len() < ASCII_COLUMN {
        line.push(' ');
    }
    line.extend(chunk.iter().map(|&b| {
        if b.is_ascii_graphic() || b == b' ' {
            b as char
        } else {
            '.'
        }
    }));
    line
}
