//! Per-request classification: free, challenge, paid or invalid.
//!
//! Classification is decided from the request head alone and keeps no state
//! between requests:
//!
//! 1. An `Authorization` header using the LSAT scheme is verified, yielding
//!    [`Classification::Paid`] or [`Classification::Invalid`]. A credential
//!    that fails to parse is invalid too; it never falls through to the
//!    free or challenge branches.
//! 2. Otherwise, a client whose `Accept` header lists [`LSAT_ACCEPT`] gets a
//!    fresh challenge ([`Classification::PaymentRequired`]), or
//!    [`Classification::Invalid`] if issuance fails.
//! 3. Everyone else is [`Classification::Free`].

use http::{
    HeaderMap,
    header::{ACCEPT, AUTHORIZATION},
    request::Parts,
};
use lsat_core::{
    backend::PaymentBackend,
    errors::{Error, Result},
    header::{Challenge, LSAT_ACCEPT, LsatCredential},
    identifier::TokenIdentifier,
    types::Preimage,
};

use crate::paywall::PayWall;

/// Outcome of classifying one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// No payment involved: the client neither presented nor asked for a token.
    Free,
    /// A challenge was issued; normal handling should stop with a `402`.
    PaymentRequired(Challenge),
    /// The token is authentic and its invoice is paid.
    Paid {
        identifier: TokenIdentifier,
        preimage: Preimage,
    },
    /// A presented token failed verification, or a challenge could not be issued.
    Invalid(Error),
}

impl<B: PaymentBackend> PayWall<B> {
    /// Classify a request by its head.
    ///
    /// May await the payment backend when a challenge is issued.
    pub async fn classify(&self, parts: &Parts) -> Classification {
        if let Some(credential) = find_credential(&parts.headers) {
            return match credential {
                Ok(credential) => self.verify_credential(&credential),
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Unparseable LSAT credential: {err}");
                    Classification::Invalid(err)
                }
            };
        }

        if !accepts_lsat(&parts.headers) {
            return Classification::Free;
        }

        match self.issuer.issue_challenge(parts).await {
            Ok(challenge) => Classification::PaymentRequired(challenge),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Failed to issue LSAT challenge: {err}");
                Classification::Invalid(err)
            }
        }
    }

    fn verify_credential(&self, credential: &LsatCredential) -> Classification {
        match self
            .verifier
            .verify(&credential.macaroon, &credential.preimage)
        {
            Ok(identifier) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    "LSAT verified: payment_hash='{}', token_id='{}'",
                    identifier.payment_hash,
                    identifier.token_id
                );
                Classification::Paid {
                    identifier,
                    preimage: credential.preimage,
                }
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("LSAT rejected: {err}");
                Classification::Invalid(err)
            }
        }
    }
}

/// The first LSAT credential among the `Authorization` headers.
///
/// Headers using other schemes are ignored. A header that is not visible
/// ASCII cannot be ruled out as an LSAT and is reported as malformed.
pub fn find_credential(headers: &HeaderMap) -> Option<Result<LsatCredential>> {
    headers.get_all(AUTHORIZATION).iter().find_map(|value| {
        match value.to_str() {
            Ok(value) => LsatCredential::parse(value),
            Err(_) => Some(Err(Error::MalformedToken(
                "Authorization header is not visible ASCII".to_string(),
            ))),
        }
    })
}

/// Whether the client announced LSAT support in an `Accept` header.
pub fn accepts_lsat(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains(LSAT_ACCEPT))
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn test_accepts_lsat() {
        let mut headers = HeaderMap::new();
        assert!(!accepts_lsat(&headers));

        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        assert!(!accepts_lsat(&headers));

        headers.append(
            ACCEPT,
            HeaderValue::from_static("text/html, application/vnd.lsat.v1.full"),
        );
        assert!(accepts_lsat(&headers));
    }

    #[test]
    fn test_find_credential_skips_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(find_credential(&headers), None);

        headers.append(AUTHORIZATION, HeaderValue::from_static("LSAT broken"));
        assert!(matches!(
            find_credential(&headers),
            Some(Err(Error::MalformedToken(_)))
        ));
    }

    #[test]
    fn test_find_credential_flags_opaque_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_bytes(b"LSAT \xff").unwrap(),
        );
        assert!(matches!(
            find_credential(&headers),
            Some(Err(Error::MalformedToken(_)))
        ));
    }
}
