pub mod Buffer_Structs;

pub use Buffer_Structs::{raw, BusEvent, Drained, EventOutcome, QueueStats}; // re-export for stable path
