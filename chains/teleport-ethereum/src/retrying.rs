use std::{fmt::Debug, str::FromStr, time::Duration};

use async_trait::async_trait;
use ethers::providers::{
    Http, HttpClientError, JsonRpcClient, JsonRpcError, ProviderError, RpcError,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, instrument, trace, warn};

/// Sends are never retried: a second attempt could broadcast twice.
const METHODS_TO_NOT_RETRY: &[&str] = &[
    "eth_estimateGas",
    "eth_sendTransaction",
    "eth_sendRawTransaction",
];

/// An HTTP Provider with a simple naive exponential backoff built-in
#[derive(Debug, Clone)]
pub struct RetryingProvider<P> {
    inner: P,
    max_requests: u32,
    base_retry_ms: u64,
}

impl<P> RetryingProvider<P> {
    /// Instantiate a RetryingProvider
    pub fn new(inner: P, max_requests: Option<u32>, base_retry_ms: Option<u64>) -> Self {
        Self {
            inner,
            max_requests: max_requests.unwrap_or(6).max(1),
            base_retry_ms: base_retry_ms.unwrap_or(50),
        }
    }

    /// Get the max_requests
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Get the base retry duration in ms.
    pub fn base_retry_ms(&self) -> u64 {
        self.base_retry_ms
    }

    /// Backoff after attempt `attempt` (1-based)
    fn backoff_ms(&self, attempt: u32) -> u64 {
        self.base_retry_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// How to handle the result from the underlying provider
enum HandleMethod<R, PE> {
    Accept(R),
    Halt(PE),
    Retry(PE),
}

/// Error type for the RetryingProvider
#[derive(Error, Debug)]
pub enum RetryingProviderError<P>
where
    P: JsonRpcClient,
{
    /// An internal error in the JSON RPC Client which we did not want to retry
    /// on.
    #[error(transparent)]
    JsonRpcClientError(P::Error),
    /// Hit max requests
    #[error("Hit max requests")]
    MaxRequests(P::Error),
    /// The request params could not be serialized
    #[error("Invalid request params: {0}")]
    Params(serde_json::Error),
}

impl<P> RpcError for RetryingProviderError<P>
where
    P: JsonRpcClient,
{
    fn as_error_response(&self) -> Option<&JsonRpcError> {
        match self {
            Self::JsonRpcClientError(e) | Self::MaxRequests(e) => e.as_error_response(),
            Self::Params(_) => None,
        }
    }

    fn as_serde_error(&self) -> Option<&serde_json::Error> {
        match self {
            Self::JsonRpcClientError(e) | Self::MaxRequests(e) => e.as_serde_error(),
            Self::Params(e) => Some(e),
        }
    }
}

impl<P> From<RetryingProviderError<P>> for ProviderError
where
    P: JsonRpcClient + 'static,
    <P as JsonRpcClient>::Error: Send + Sync,
{
    fn from(src: RetryingProviderError<P>) -> Self {
        ProviderError::JsonRpcClientError(Box::new(src))
    }
}

impl<P> RetryingProvider<P>
where
    P: JsonRpcClient,
{
    /// The retrying provider logic which accepts a matcher function that can
    /// handle specific cases for different underlying provider
    /// implementations.
    #[instrument(level = "error", skip_all, fields(method = %method))]
    async fn request_with_retry<T, R>(
        &self,
        method: &str,
        params: T,
        matcher: impl Fn(
            // result from the provider request
            Result<R, P::Error>,
            // which attempt this is
            u32,
            // what the next backoff will be in ms
            u64,
        ) -> HandleMethod<R, P::Error>,
    ) -> Result<R, RetryingProviderError<P>>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let params = serde_json::to_value(params).map_err(RetryingProviderError::Params)?;

        let mut attempt = 1;
        loop {
            let backoff_ms = self.backoff_ms(attempt);
            trace!(params = %params, "Dispatching request with params");
            debug!(attempt, "Dispatching request");

            let res = match params {
                Value::Null => self.inner.request(method, ()).await,
                _ => self.inner.request(method, &params).await,
            };

            let last_err = match matcher(res, attempt, backoff_ms) {
                HandleMethod::Accept(v) => return Ok(v),
                HandleMethod::Halt(e) => return Err(RetryingProviderError::JsonRpcClientError(e)),
                HandleMethod::Retry(e) => e,
            };

            if attempt >= self.max_requests {
                trace!(
                    requests_made = self.max_requests,
                    "Retrying provider reached max requests."
                );
                return Err(RetryingProviderError::MaxRequests(last_err));
            }
            trace!(backoff_ms, "Retrying provider going to sleep.");
            sleep(Duration::from_millis(backoff_ms)).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl JsonRpcClient for RetryingProvider<Http> {
    type Error = RetryingProviderError<Http>;

    #[instrument(level = "error", skip(self, params), fields(provider_host = %self.inner.url().host_str().unwrap_or("unknown")))]
    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, Self::Error>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        self.request_with_retry::<T, R>(method, params, |res, attempt, next_backoff_ms| match res {
            Ok(res) => HandleMethod::Accept(res),
            Err(HttpClientError::ReqwestError(e)) => {
                info!(
                    next_backoff_ms,
                    retries_remaining = self.max_requests.saturating_sub(attempt),
                    error = %e,
                    "ReqwestError in http provider.",
                );
                HandleMethod::Retry(HttpClientError::ReqwestError(e))
            }
            Err(HttpClientError::JsonRpcError(e)) => {
                // Reverts and nonce errors will not go away by asking again
                if METHODS_TO_NOT_RETRY.contains(&method) || e.message.contains("revert") {
                    warn!(attempt, next_backoff_ms, error = %e, "JsonRpcError in http provider; not retrying.");
                    HandleMethod::Halt(HttpClientError::JsonRpcError(e))
                } else {
                    info!(attempt, next_backoff_ms, error = %e, "JsonRpcError in http provider.");
                    HandleMethod::Retry(HttpClientError::JsonRpcError(e))
                }
            }
            Err(HttpClientError::SerdeJson { err, text }) => {
                info!(attempt, next_backoff_ms, error = %err, text = text, "SerdeJson error in http provider");
                HandleMethod::Retry(HttpClientError::SerdeJson { err, text })
            }
        })
        .await
    }
}

impl<P> FromStr for RetryingProvider<P>
where
    P: JsonRpcClient + FromStr,
{
    type Err = <P as FromStr>::Err;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(src.parse()?, None, None))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn backoff_doubles() {
        let provider: RetryingProvider<Http> = "http://localhost:8545".parse().unwrap();
        assert_eq!(provider.max_requests(), 6);
        assert_eq!(provider.backoff_ms(1), 50);
        assert_eq!(provider.backoff_ms(2), 100);
        assert_eq!(provider.backoff_ms(4), 400);
    }
}
