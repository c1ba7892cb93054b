//! CIDR block arithmetic.
//!
//! Blocks are parsed once into octets, and `/24` subnets are derived by
//! third-octet index, so a malformed VPC block fails at load time instead of
//! producing a nonsense address.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// An IPv4 CIDR block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CidrBlock {
    octets: [u8; 4],
    prefix_len: u8,
}

impl CidrBlock {
    pub fn new(octets: [u8; 4], prefix_len: u8) -> Self {
        Self { octets, prefix_len }
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// The `/24` subnet of this block whose third octet is `index`.
    ///
    /// Only meaningful for `/16` parents; config validation enforces that
    /// before any subnet is derived.
    pub fn subnet(&self, index: u8) -> CidrBlock {
        CidrBlock {
            octets: [self.octets[0], self.octets[1], index, 0],
            prefix_len: 24,
        }
    }

    /// Whether `other` lies entirely within this block.
    pub fn contains(&self, other: &CidrBlock) -> bool {
        if other.prefix_len < self.prefix_len {
            return false;
        }
        let mask = if self.prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix_len))
        };
        (self.as_u32() & mask) == (other.as_u32() & mask)
    }

    fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.octets)
    }
}

impl FromStr for CidrBlock {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidField {
            field: "cidr".to_string(),
            reason: format!("'{s}': {reason}"),
        };

        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| invalid("missing '/' prefix length"))?;
        let prefix_len: u8 = prefix
            .parse()
            .map_err(|_| invalid("prefix length is not a number"))?;
        if prefix_len > 32 {
            return Err(invalid("prefix length exceeds 32"));
        }

        let mut octets = [0u8; 4];
        let mut parts = addr.split('.');
        for octet in &mut octets {
            let part = parts.next().ok_or_else(|| invalid("expected four octets"))?;
            *octet = part
                .parse()
                .map_err(|_| invalid("octet is not a number in 0..=255"))?;
        }
        if parts.next().is_some() {
            return Err(invalid("expected four octets"));
        }

        Ok(CidrBlock { octets, prefix_len })
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}/{}",
            self.octets[0], self.octets[1], self.octets[2], self.octets[3], self.prefix_len
        )
    }
}
