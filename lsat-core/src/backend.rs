//! The payment backend interface.
//!
//! LSAT servers never create or settle invoices themselves; a Lightning node
//! client (LND, LNURL, ...) does that behind [`PaymentBackend`].

use serde::{Deserialize, Serialize};

use crate::types::{Amount, PaymentHash};

/// An invoice created by the payment backend for one token issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// The encoded payment request handed to the client, e.g. a BOLT11 string.
    pub payment_request: String,
    /// The payment hash the invoice is locked to.
    pub payment_hash: PaymentHash,
}

/// Payment backend interface.
///
/// Each call must create a new invoice; invoices are never reused across
/// issuances.
pub trait PaymentBackend {
    type Error: std::error::Error;

    fn create_invoice(
        &self,
        amount: Amount,
        memo: &str,
    ) -> impl Future<Output = Result<Invoice, Self::Error>> + Send;
}

impl<B: PaymentBackend + Sync> PaymentBackend for std::sync::Arc<B> {
    type Error = B::Error;

    fn create_invoice(
        &self,
        amount: Amount,
        memo: &str,
    ) -> impl Future<Output = Result<Invoice, Self::Error>> + Send {
        self.as_ref().create_invoice(amount, memo)
    }
}
