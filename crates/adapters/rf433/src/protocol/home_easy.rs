//! HomeEasy (self-learning) remote switch protocol.
//!
//! A command is a 32-bit frame sent MSB first:
//!
//! | Bits | Field |
//! |------|-------|
//! | 31..6 | 26-bit transmitter address |
//! | 5 | group flag (always 0, commands target one unit) |
//! | 4 | on/off |
//! | 3..0 | unit code |
//!
//! Each frame bit goes on air Manchester-coded: `0` → `01`, `1` → `10`, so a
//! command is 64 symbols. Sync and pause pulses are generated by the
//! transmitter firmware.

use super::{BitCode, EncoderError, ProtocolEncoder};

const ADDRESS_BITS: u32 = 26;
const MAX_ADDRESS: u32 = (1 << ADDRESS_BITS) - 1;
const MAX_UNIT: u8 = 15;
const FRAME_BITS: u32 = 32;

#[derive(Debug, Clone)]
pub struct HomeEasy {
    address: u32,
    unit: u8,
    on: bool,
    code: BitCode,
}

impl HomeEasy {
    pub const PROTOCOL: &'static str = "home_easy";

    /// Build an encoder from a hexadecimal address (optionally `0x`-prefixed)
    /// and a decimal unit code. The transmit buffer starts out as "off".
    ///
    /// # Errors
    ///
    /// Returns [`EncoderError::InvalidAddress`] if the address is not
    /// hexadecimal or exceeds 26 bits, and [`EncoderError::InvalidSubDevice`]
    /// if the unit code is not in `0..=15`.
    pub fn new(address: &str, sub_device: &str) -> Result<Self, EncoderError> {
        let mut encoder = Self {
            address: parse_address(address)?,
            unit: parse_unit(sub_device)?,
            on: false,
            code: BitCode::default(),
        };
        encoder.generate_bit_code();
        Ok(encoder)
    }

    pub(super) fn boxed(
        address: &str,
        sub_device: &str,
    ) -> Result<Box<dyn ProtocolEncoder>, EncoderError> {
        Ok(Box::new(Self::new(address, sub_device)?))
    }

    /// The logical 32-bit frame for the current state.
    #[must_use]
    pub fn frame(&self) -> u32 {
        (self.address << 6) | (u32::from(self.on) << 4) | u32::from(self.unit)
    }
}

impl ProtocolEncoder for HomeEasy {
    fn protocol(&self) -> &'static str {
        Self::PROTOCOL
    }

    fn set_on_off(&mut self, on: bool) {
        self.on = on;
    }

    fn generate_bit_code(&mut self) {
        let frame = self.frame();
        self.code = (0..FRAME_BITS)
            .rev()
            .map(|shift| (frame >> shift) & 1 == 1)
            .flat_map(|bit| [bit, !bit])
            .collect();
    }

    fn transmit_data(&self) -> &BitCode {
        &self.code
    }
}

fn parse_address(raw: &str) -> Result<u32, EncoderError> {
    let invalid = |reason: &'static str| EncoderError::InvalidAddress {
        address: raw.to_string(),
        reason,
    };
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(invalid("empty"));
    }
    let address = u32::from_str_radix(digits, 16).map_err(|_| invalid("not hexadecimal"))?;
    if address > MAX_ADDRESS {
        return Err(invalid("exceeds 26 bits"));
    }
    Ok(address)
}

fn parse_unit(raw: &str) -> Result<u8, EncoderError> {
    let invalid = |reason: &'static str| EncoderError::InvalidSubDevice {
        sub_device: raw.to_string(),
        reason,
    };
    let unit: u8 = raw.trim().parse().map_err(|_| invalid("not a number"))?;
    if unit > MAX_UNIT {
        return Err(invalid("unit code must be 0..=15"));
    }
    Ok(unit)
}
