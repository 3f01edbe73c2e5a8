//! Verifying presented LSATs.

use std::sync::Arc;

use bon::Builder;
use lsat_core::{
    errors::{Error, Result},
    identifier::TokenIdentifier,
    macaroon::Macaroon,
    root_key::RootKey,
    types::Preimage,
};

use crate::issuer::DEFAULT_LOCATION;

/// Checks that a token was minted by this server and that its invoice was paid.
///
/// Verification is a pure check: nothing is recorded, and a failure is final
/// for the request that presented the token.
#[derive(Builder, Debug, Clone)]
pub struct Verifier {
    /// The key macaroons were signed under.
    pub root_key: Arc<RootKey>,
    /// Expected macaroon location label.
    #[builder(into, default = DEFAULT_LOCATION.to_string())]
    pub location: String,
}

impl Verifier {
    /// Authenticate `macaroon` (base64) and check `preimage` against its payment hash.
    ///
    /// Returns the token identifier on success. Failures, in the order they
    /// are checked: [`Error::MalformedToken`], [`Error::InvalidSignature`],
    /// [`Error::MalformedIdentifier`], [`Error::PaymentNotProven`].
    pub fn verify(&self, macaroon: &str, preimage: &Preimage) -> Result<TokenIdentifier> {
        let payload = Macaroon::open(macaroon, &self.root_key, &self.location)?;
        let identifier = TokenIdentifier::decode(&payload)?;

        if !preimage.proves(&identifier.payment_hash) {
            return Err(Error::PaymentNotProven);
        }

        Ok(identifier)
    }
}
