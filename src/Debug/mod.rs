pub mod StructDebug;
pub mod hexdump;

pub use hexdump::{hex_rows, DumpConfig, HexDump};
