/// Error types for LSAT operations.
///
/// None of the variants carry key material, preimages or backend credentials.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The root key could not be loaded from process configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The pricing function returned an amount that cannot be invoiced.
    #[error("Invalid price: {0}")]
    InvalidPrice(i64),

    /// The payment backend failed to create an invoice, or timed out.
    #[error("Payment backend error: {0}")]
    PaymentBackendError(String),

    /// The token envelope could not be signed.
    #[error("Signing error: {0}")]
    SigningError(String),

    /// The presented credential or its transport encoding is malformed.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The signed identifier does not match the layout of its declared version.
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    /// The envelope was not issued by this server or was altered.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The preimage does not hash to the payment hash bound into the token.
    #[error("Payment not proven")]
    PaymentNotProven,
}

/// A specialized `Result` type for LSAT operations.
pub type Result<T> = std::result::Result<T, Error>;
