//! Token identifiers and their fixed binary layout.
//!
//! The identifier is the payload a macaroon signs, so its encoding must be
//! byte-for-byte deterministic:
//!
//! ```text
//! version (u16, big endian) | payment hash (32 bytes) | token id (32 bytes)
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    errors::{Error, Result},
    types::{PaymentHash, TokenId},
};

/// The only identifier layout currently minted and understood.
pub const IDENTIFIER_VERSION_0: u16 = 0;

const VERSION_LEN: usize = 2;
const VERSION_0_LEN: usize = VERSION_LEN + PaymentHash::LEN + TokenId::LEN;

/// Identifies an LSAT and binds it to a single invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenIdentifier {
    pub version: u16,
    pub payment_hash: PaymentHash,
    pub token_id: TokenId,
}

impl TokenIdentifier {
    /// A version 0 identifier for `payment_hash` with a freshly drawn token id.
    pub fn new(payment_hash: PaymentHash) -> Self {
        TokenIdentifier {
            version: IDENTIFIER_VERSION_0,
            payment_hash,
            token_id: TokenId::random(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(VERSION_0_LEN);
        out.extend_from_slice(&self.version.to_be_bytes());
        out.extend_from_slice(self.payment_hash.as_bytes());
        out.extend_from_slice(self.token_id.as_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (version, rest) = bytes
            .split_first_chunk::<VERSION_LEN>()
            .ok_or_else(|| Error::MalformedIdentifier("missing version".to_string()))?;
        let version = u16::from_be_bytes(*version);

        if version != IDENTIFIER_VERSION_0 {
            return Err(Error::MalformedIdentifier(format!(
                "unsupported version {version}"
            )));
        }
        if bytes.len() != VERSION_0_LEN {
            return Err(Error::MalformedIdentifier(format!(
                "expected {VERSION_0_LEN} bytes for version {version}, got {}",
                bytes.len()
            )));
        }

        let (payment_hash, token_id) = rest.split_at(PaymentHash::LEN);
        Ok(TokenIdentifier {
            version,
            payment_hash: PaymentHash::try_from(payment_hash)
                .map_err(|err| Error::MalformedIdentifier(err.to_string()))?,
            token_id: TokenId::try_from(token_id)
                .map_err(|err| Error::MalformedIdentifier(err.to_string()))?,
        })
    }
}
