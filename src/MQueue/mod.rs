pub mod Buffer;
pub mod Structs;

mod builder;
mod consumer;
mod debug;
mod producer;

pub use builder::{QueueBuilder, MAX_SLAVE_ADDRESS};
pub use consumer::Consumer;
pub use producer::Producer;
