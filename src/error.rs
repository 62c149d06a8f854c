use thiserror::Error;

/// Errors surfaced by the queue, its lifecycle helpers and the C ABI.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MqueueError {
    /// The oldest message did not fit the reader's buffer. It has been dropped regardless.
    #[error("message of {len} bytes does not fit in a {capacity} byte buffer")]
    TooLarge { len: usize, capacity: usize },

    #[error("producer has terminated")]
    Disconnected,

    #[error("failed to allocate {slots} message slots")]
    Allocation { slots: usize },

    #[error("invalid slave address {0:#x} (expected a 7-bit address)")]
    InvalidAddress(u32),

    #[error("invalid device spec: {0}")]
    InvalidDeviceSpec(String),

    #[error("bus {bus_id} refused slave {address:#04x}: {reason}")]
    Registration {
        bus_id: i32,
        address: u8,
        reason: String,
    },

    #[error("no device at {address:#04x} on bus {bus_id}")]
    NotFound { bus_id: i32, address: u8 },

    #[error("a device already occupies {address:#04x} on bus {bus_id}")]
    AlreadyExists { bus_id: i32, address: u8 },
}

impl MqueueError {
    /// Negative errno equivalent, used at the C boundary.
    pub fn errno(&self) -> i32 {
        match self {
            MqueueError::TooLarge { .. } => -libc::EOVERFLOW,
            MqueueError::Disconnected => -libc::EPIPE,
            MqueueError::Allocation { .. } => -libc::ENOMEM,
            MqueueError::InvalidAddress(_) | MqueueError::InvalidDeviceSpec(_) => -libc::EINVAL,
            MqueueError::Registration { .. } => -libc::EBUSY,
            MqueueError::NotFound { .. } => -libc::ENOENT,
            MqueueError::AlreadyExists { .. } => -libc::EEXIST,
        }
    }
}

pub type Result<T> = std::result::Result<T, MqueueError>;
