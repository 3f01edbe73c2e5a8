//! Minting LSAT challenges.
//!
//! For details, see the [`Issuer`] struct documentation.

use std::{sync::Arc, time::Duration};

use bon::Builder;
use http::request::Parts;
use lsat_core::{
    backend::PaymentBackend,
    errors::{Error, Result},
    header::Challenge,
    identifier::TokenIdentifier,
    macaroon::Macaroon,
    root_key::RootKey,
    types::Amount,
};

/// Location label written into every minted macaroon.
pub const DEFAULT_LOCATION: &str = "LSAT";

/// Memo attached to every invoice.
pub const DEFAULT_MEMO: &str = "LSAT";

/// How long invoice creation may take before issuance fails.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Pricing policy: the amount in satoshis to charge for a request.
pub type PriceFn = Arc<dyn Fn(&Parts) -> i64 + Send + Sync>;

/// Issues payment challenges: an invoice plus a macaroon bound to its payment hash.
///
/// The issuer keeps no state between calls. A token's only link to its invoice
/// is the payment hash signed into its identifier, so verification needs no
/// database of issued tokens.
///
/// `issue_challenge` uses [`tokio::time::timeout`] and must run inside a
/// tokio runtime with the time driver enabled.
#[derive(Builder, Clone)]
pub struct Issuer<B: PaymentBackend> {
    /// Creates the invoices clients pay.
    pub backend: B,
    /// The key macaroons are signed under.
    pub root_key: Arc<RootKey>,
    /// Price of a request, in satoshis. Negative prices are rejected.
    #[builder(with = |price: impl Fn(&Parts) -> i64 + Send + Sync + 'static| Arc::new(price) as PriceFn)]
    pub price: PriceFn,
    /// Macaroon location label.
    #[builder(into, default = DEFAULT_LOCATION.to_string())]
    pub location: String,
    /// Invoice memo.
    #[builder(into, default = DEFAULT_MEMO.to_string())]
    pub memo: String,
    /// Upper bound on invoice creation. Timeouts are not retried.
    #[builder(default = DEFAULT_BACKEND_TIMEOUT)]
    pub timeout: Duration,
}

impl<B: PaymentBackend> Issuer<B> {
    /// Price the request, create an invoice and mint a macaroon for it.
    ///
    /// Fails with [`Error::InvalidPrice`], [`Error::PaymentBackendError`]
    /// or [`Error::SigningError`]; no macaroon is produced on failure.
    pub async fn issue_challenge(&self, parts: &Parts) -> Result<Challenge> {
        let amount = Amount::try_from((self.price)(parts))?;

        let invoice = tokio::time::timeout(
            self.timeout,
            self.backend.create_invoice(amount, &self.memo),
        )
        .await
        .map_err(|_| {
            Error::PaymentBackendError(format!(
                "invoice creation timed out after {:?}",
                self.timeout
            ))
        })?
        .map_err(|err| Error::PaymentBackendError(err.to_string()))?;

        let identifier = TokenIdentifier::new(invoice.payment_hash);
        let macaroon = Macaroon::new(
            &self.root_key,
            identifier.encode(),
            self.location.as_str(),
        )?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Issued LSAT challenge: amount='{}', payment_hash='{}', token_id='{}'",
            amount,
            identifier.payment_hash,
            identifier.token_id
        );

        Ok(Challenge {
            macaroon: macaroon.to_base64(),
            invoice: invoice.payment_request,
        })
    }
}

impl<B: PaymentBackend + std::fmt::Debug> std::fmt::Debug for Issuer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Issuer")
            .field("backend", &self.backend)
            .field("location", &self.location)
            .field("memo", &self.memo)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::Request;
    use lsat_core::{backend::Invoice, types::PaymentHash};

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("node offline")]
    struct Offline;

    #[derive(Debug, Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<(Amount, String)>>,
        offline: bool,
        delay: Option<Duration>,
    }

    impl PaymentBackend for RecordingBackend {
        type Error = Offline;

        async fn create_invoice(
            &self,
            amount: Amount,
            memo: &str,
        ) -> std::result::Result<Invoice, Offline> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.calls.lock().unwrap().push((amount, memo.to_string()));
            if self.offline {
                return Err(Offline);
            }
            Ok(Invoice {
                payment_request: format!("lnbc{}n1test", amount.0),
                payment_hash: PaymentHash([0x77; 32]),
            })
        }
    }

    fn parts(path: &str) -> Parts {
        Request::builder()
            .uri(path)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn issuer(backend: RecordingBackend) -> Issuer<Arc<RecordingBackend>> {
        Issuer::builder()
            .backend(Arc::new(backend))
            .root_key(Arc::new(RootKey::from_bytes([1u8; 32])))
            .price(|parts: &Parts| if parts.uri.path() == "/expensive" { 5000 } else { 1000 })
            .build()
    }

    #[tokio::test]
    async fn test_issue_challenge_binds_invoice_hash() {
        let issuer = issuer(RecordingBackend::default());
        let challenge = issuer.issue_challenge(&parts("/expensive")).await.unwrap();

        assert_eq!(challenge.invoice, "lnbc5000n1test");
        assert_eq!(
            issuer.backend.calls.lock().unwrap().as_slice(),
            &[(Amount(5000), "LSAT".to_string())]
        );

        let payload =
            Macaroon::open(&challenge.macaroon, &issuer.root_key, DEFAULT_LOCATION).unwrap();
        let identifier = TokenIdentifier::decode(&payload).unwrap();
        assert_eq!(identifier.version, 0);
        assert_eq!(identifier.payment_hash, PaymentHash([0x77; 32]));
    }

    #[tokio::test]
    async fn test_negative_price_is_rejected_before_invoicing() {
        let issuer = Issuer::builder()
            .backend(Arc::new(RecordingBackend::default()))
            .root_key(Arc::new(RootKey::generate()))
            .price(|_: &Parts| -1)
            .build();

        assert_eq!(
            issuer.issue_challenge(&parts("/")).await,
            Err(Error::InvalidPrice(-1))
        );
        assert!(issuer.backend.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_aborts_issuance() {
        let issuer = issuer(RecordingBackend {
            offline: true,
            ..Default::default()
        });
        assert_eq!(
            issuer.issue_challenge(&parts("/")).await,
            Err(Error::PaymentBackendError("node offline".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_timeout_is_a_backend_error() {
        let backend = Arc::new(RecordingBackend {
            delay: Some(Duration::from_secs(60)),
            ..Default::default()
        });
        let issuer = Issuer::builder()
            .backend(backend.clone())
            .root_key(Arc::new(RootKey::generate()))
            .price(|_: &Parts| 10)
            .timeout(Duration::from_secs(1))
            .build();

        let err = issuer.issue_challenge(&parts("/")).await.unwrap_err();
        assert!(matches!(err, Error::PaymentBackendError(msg) if msg.contains("timed out")));
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_invoice_hash_yields_distinct_tokens() {
        let issuer = issuer(RecordingBackend::default());
        let a = issuer.issue_challenge(&parts("/")).await.unwrap();
        let b = issuer.issue_challenge(&parts("/")).await.unwrap();
        assert_eq!(a.invoice, b.invoice);
        assert_ne!(a.macaroon, b.macaroon);
    }
}
