use std::error::Error as StdError;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

use crate::H256;

/// The result of interacting with a chain.
pub type ChainResult<T> = Result<T, ChainCommunicationError>;

/// An "Any"-typed error.
pub trait TeleportCustomError: StdError + Send + Sync + 'static {}

impl<E: StdError + Send + Sync + 'static> TeleportCustomError for E {}

/// Thin wrapper around a boxed TeleportCustomError. Basically a trait-object
/// adaptor.
#[repr(transparent)]
pub struct TeleportCustomErrorWrapper(Box<dyn TeleportCustomError>);

impl Debug for TeleportCustomErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", AsRef::<dyn TeleportCustomError>::as_ref(&self))
    }
}

impl Display for TeleportCustomErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", AsRef::<dyn TeleportCustomError>::as_ref(&self))
    }
}

impl StdError for TeleportCustomErrorWrapper {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl AsRef<dyn TeleportCustomError> for TeleportCustomErrorWrapper {
    fn as_ref(&self) -> &dyn TeleportCustomError {
        self.0.as_ref()
    }
}

impl Deref for TeleportCustomErrorWrapper {
    type Target = Box<dyn TeleportCustomError>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
#[repr(transparent)]
struct StringError(String);

impl Display for StringError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for StringError {}

/// Coarse classification of every error in the system. Callers branch on
/// this instead of on concrete error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Retryable with bounded backoff
    TransientNetwork,
    /// Bad caller input; fails fast and is never retried
    InvalidInput,
    /// A normal transient domain state, e.g. a proof that is not available
    /// yet. Not a failure.
    NotReady,
    /// A caller-specified deadline passed or the wait was cancelled. The
    /// operation may still succeed out-of-band.
    Timeout,
    /// The target domain reports the message as already finalized
    FinalizationConflict,
    /// Anything else
    Fatal,
}

/// Implemented by every error type so callers can classify failures.
pub trait Classify {
    /// The coarse kind of this error
    fn kind(&self) -> ErrorKind;

    /// Whether retrying the same operation later may succeed
    fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TransientNetwork | ErrorKind::NotReady | ErrorKind::Timeout
        )
    }
}

/// ChainCommunicationError contains errors returned when attempting to
/// call a chain or dispatch a transaction
#[derive(Debug, thiserror::Error)]
pub enum ChainCommunicationError {
    /// Transport level failure talking to the node (connection, 5xx,
    /// rate limiting)
    #[error("Provider error: {0}")]
    Provider(TeleportCustomErrorWrapper),
    /// The call or transaction reverted
    #[error("Contract call reverted: {0}")]
    Revert(String),
    /// The node returned data we could not decode
    #[error("Could not decode response for `{method}`: {reason}")]
    Decode {
        /// The method whose output was malformed
        method: &'static str,
        /// Why decoding failed
        reason: String,
    },
    /// The target reports the message as already finalized
    #[error("Message already finalized: {0}")]
    AlreadyFinalized(String),
    /// A transaction was dropped from the mempool
    #[error("Transaction dropped from mempool {0:?}")]
    TransactionDropped(H256),
    /// A transaction submission timed out
    #[error("Transaction submission timed out")]
    TransactionTimeout(),
    /// Any other error; does not implement `From` to prevent
    /// conflicting/absorbing other errors.
    #[error(transparent)]
    Other(TeleportCustomErrorWrapper),
}

impl ChainCommunicationError {
    /// Create a provider error from any transport error
    pub fn from_provider_error<E: TeleportCustomError>(err: E) -> Self {
        Self::Provider(TeleportCustomErrorWrapper(Box::new(err)))
    }

    /// Create a chain communication error from any other existing error
    pub fn from_other<E: TeleportCustomError>(err: E) -> Self {
        Self::Other(TeleportCustomErrorWrapper(Box::new(err)))
    }

    /// Creates a chain communication error of the other error variant from a
    /// string
    pub fn from_other_str(err: impl Into<String>) -> Self {
        Self::from_other(StringError(err.into()))
    }

    /// Creates a decode error for `method`
    pub fn decode(method: &'static str, reason: impl Display) -> Self {
        Self::Decode {
            method,
            reason: reason.to_string(),
        }
    }
}

impl Classify for ChainCommunicationError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Provider(_) | Self::TransactionDropped(_) | Self::TransactionTimeout() => {
                ErrorKind::TransientNetwork
            }
            Self::AlreadyFinalized(_) => ErrorKind::FinalizationConflict,
            Self::Revert(_) | Self::Decode { .. } | Self::Other(_) => ErrorKind::Fatal,
        }
    }
}
