//! [`Amount`] represents the price of a request in satoshis.
//!
//! This module holds its type definition and implementations.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// A non-negative invoice amount in satoshis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(pub u64);

impl From<u8> for Amount {
    fn from(value: u8) -> Self {
        Amount(value as u64)
    }
}

impl From<u16> for Amount {
    fn from(value: u16) -> Self {
        Amount(value as u64)
    }
}

impl From<u32> for Amount {
    fn from(value: u32) -> Self {
        Amount(value as u64)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(value)
    }
}

/// Pricing functions return a signed amount; anything below zero is a contract violation.
impl TryFrom<i64> for Amount {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(Amount)
            .map_err(|_| Error::InvalidPrice(value))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} sat", self.0)
    }
}
