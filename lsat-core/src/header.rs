//! HTTP header formats of the LSAT protocol.
//!
//! - `Authorization: LSAT <macaroon base64>:<preimage hex>` presents a token.
//! - `WWW-Authenticate: LSAT macaroon=<macaroon base64>, invoice=<invoice>`
//!   challenges the client to pay.
//! - An `Accept` header containing [`LSAT_ACCEPT`] announces client support.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    errors::{Error, Result},
    types::Preimage,
};

/// Authentication scheme name used in both directions.
pub const LSAT_SCHEME: &str = "LSAT";

/// Content type clients list in `Accept` to opt into the payment challenge.
pub const LSAT_ACCEPT: &str = "application/vnd.lsat.v1.full";

/// A token presented in an `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LsatCredential {
    /// The macaroon in its base64 transport form.
    pub macaroon: String,
    pub preimage: Preimage,
}

impl LsatCredential {
    /// Parse an `Authorization` header value.
    ///
    /// Returns `None` when the value uses another scheme, and an error when
    /// it claims the LSAT scheme but cannot be parsed.
    pub fn parse(value: &str) -> Option<Result<Self>> {
        let value = value.trim();
        let (scheme, rest) = value.split_once(' ').unwrap_or((value, ""));
        if !scheme.eq_ignore_ascii_case(LSAT_SCHEME) {
            return None;
        }
        Some(Self::parse_token(rest.trim()))
    }

    fn parse_token(token: &str) -> Result<Self> {
        let (macaroon, preimage) = token.split_once(':').ok_or_else(|| {
            Error::MalformedToken("expected <macaroon>:<preimage>".to_string())
        })?;
        if macaroon.is_empty() {
            return Err(Error::MalformedToken("empty macaroon".to_string()));
        }
        let preimage = preimage
            .parse::<Preimage>()
            .map_err(|err| Error::MalformedToken(format!("invalid preimage: {err}")))?;
        Ok(LsatCredential {
            macaroon: macaroon.to_string(),
            preimage,
        })
    }

    pub fn header_value(&self) -> String {
        format!("{LSAT_SCHEME} {}:{}", self.macaroon, self.preimage.to_hex())
    }
}

/// A payment challenge: the token to pay for and the invoice settling it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// The macaroon in its base64 transport form.
    pub macaroon: String,
    /// The invoice's payment request.
    pub invoice: String,
}

impl Challenge {
    pub fn header_value(&self) -> String {
        self.to_string()
    }

    /// Parse a `WWW-Authenticate` value as produced by [`Challenge::header_value`].
    pub fn from_header_value(value: &str) -> Result<Self> {
        let malformed = || Error::MalformedToken("malformed LSAT challenge".to_string());

        let rest = value
            .trim()
            .strip_prefix(LSAT_SCHEME)
            .and_then(|rest| rest.strip_prefix(' '))
            .ok_or_else(malformed)?;

        let mut macaroon = None;
        let mut invoice = None;
        for param in rest.split(',') {
            match param.trim().split_once('=') {
                // base64 padding contains '=', so only the first one separates the key
                Some(("macaroon", v)) => macaroon = Some(v.trim_matches('"').to_string()),
                Some(("invoice", v)) => invoice = Some(v.trim_matches('"').to_string()),
                _ => return Err(malformed()),
            }
        }

        Ok(Challenge {
            macaroon: macaroon.ok_or_else(malformed)?,
            invoice: invoice.ok_or_else(malformed)?,
        })
    }
}

impl Display for Challenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{LSAT_SCHEME} macaroon={}, invoice={}",
            self.macaroon, self.invoice
        )
    }
}
