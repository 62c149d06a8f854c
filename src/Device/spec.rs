use crate::error::{MqueueError, Result};
use crate::MQueue::MAX_SLAVE_ADDRESS;

/// Driver name, also the only accepted device type.
pub const DEVICE_NAME: &str = "slave-mqueue";

/// Compatible strings this driver binds to.
pub const COMPATIBLE: &[&str] = &["slave-mqueue"];

/// Own-slave flag in the `new_device` address syntax (`0x1000 | addr`).
pub const NEW_DEVICE_SLAVE_FLAG: u32 = 0x1000;

/// Own-slave flag in a firmware `reg` property (`0x4000_0000 | addr`).
pub const REG_OWN_SLAVE_ADDRESS: u32 = 0x4000_0000;

/// A request to instantiate a queue at one of our own slave addresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceSpec {
    pub name: String,
    pub address: u8,
}

impl DeviceSpec {
    pub fn new(address: u8) -> Result<Self> {
        if address as u16 > MAX_SLAVE_ADDRESS {
            return Err(MqueueError::InvalidAddress(address as u32));
        }
        Ok(Self {
            name: DEVICE_NAME.to_string(),
            address,
        })
    }

    /// Parse a `new_device` line such as `"slave-mqueue 0x1013"`.
    ///
    /// The address must carry the own-slave flag; a plain address would describe a remote
    /// device we talk to, not one we impersonate.
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let (name, raw) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(raw), None) => (name, raw),
            _ => {
                return Err(MqueueError::InvalidDeviceSpec(format!(
                    "expected \"<name> <address>\", got {line:?}"
                )))
            }
        };

        if !is_compatible(name) {
            return Err(MqueueError::InvalidDeviceSpec(format!(
                "unsupported device {name:?}"
            )));
        }

        let value = parse_address(raw)?;
        if value & NEW_DEVICE_SLAVE_FLAG == 0 {
            return Err(MqueueError::InvalidDeviceSpec(format!(
                "{raw} lacks the own-slave flag {NEW_DEVICE_SLAVE_FLAG:#x}"
            )));
        }
        Self::new(checked_address(value & !NEW_DEVICE_SLAVE_FLAG)?)
    }

    /// Build from a firmware `reg` value, e.g. `0x13 | REG_OWN_SLAVE_ADDRESS`.
    pub fn from_reg(reg: u32) -> Result<Self> {
        if reg & REG_OWN_SLAVE_ADDRESS == 0 {
            return Err(MqueueError::InvalidDeviceSpec(format!(
                "reg {reg:#x} lacks the own-slave flag"
            )));
        }
        Self::new(checked_address(reg & !REG_OWN_SLAVE_ADDRESS)?)
    }

    /// The address part of a `delete_device` line, in `new_device` syntax.
    pub fn parse_delete(line: &str) -> Result<u8> {
        let value = parse_address(line.trim())?;
        checked_address(value & !NEW_DEVICE_SLAVE_FLAG)
    }
}

pub fn is_compatible(name: &str) -> bool {
    COMPATIBLE.contains(&name)
}

fn parse_address(raw: &str) -> Result<u32> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => raw.parse::<u32>(),
    };
    parsed.map_err(|e| MqueueError::InvalidDeviceSpec(format!("bad address {raw:?}: {e}")))
}

fn checked_address(value: u32) -> Result<u8> {
    if value > MAX_SLAVE_ADDRESS as u32 {
        return Err(MqueueError::InvalidAddress(value));
    }
    Ok(value as u8)
}
