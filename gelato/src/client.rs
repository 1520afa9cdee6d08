use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use auto_impl::auto_impl;
use ethers_core::types::{Address, U256};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::err::GelatoError;
use crate::oracles::{EstimateResult, OraclesResult};
use crate::task::{CreateTaskArgs, CreateTaskResult};
use crate::task_status::TaskStatusResult;
use crate::RELAY_URL;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(2000);

/// The relay network API
#[async_trait]
#[auto_impl(&, Box, Arc)]
pub trait RelayApi: Send + Sync + Debug {
    /// `POST /tasks`: ask a relayer to send `args.data` to `args.target`
    async fn create_task(&self, args: &CreateTaskArgs) -> Result<CreateTaskResult, GelatoError>;

    /// `GET /tasks/{id}`
    async fn task_status(&self, task_id: &str) -> Result<TaskStatusResult, GelatoError>;

    /// `GET /oracles`: chains with a fee oracle
    async fn supported_chains(&self) -> Result<Vec<u64>, GelatoError>;

    /// `GET /oracles/{chainId}/estimate`: fee for `gas_limit` gas, in
    /// `payment_token`
    async fn estimate_fee(
        &self,
        chain_id: u64,
        payment_token: Address,
        gas_limit: U256,
    ) -> Result<U256, GelatoError>;
}

/// Status line and body of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reply {
    pub status: u16,
    pub body: String,
}

/// How to handle one attempt's result
enum HandleMethod<R, E> {
    Accept(R),
    Halt(E),
    Retry(E),
}

/// HTTP client for the relay network with a linear backoff on transient
/// failures. Client errors (4xx) are never retried.
#[derive(Debug, Clone)]
pub struct GelatoClient {
    http: reqwest::Client,
    base_url: Url,
    max_attempts: u32,
    backoff_step: Duration,
}

impl GelatoClient {
    /// Client for the relay network at `base_url`
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_step: DEFAULT_BACKOFF_STEP,
        }
    }

    /// Client for the public relay network
    pub fn mainnet(http: reqwest::Client) -> Result<Self, GelatoError> {
        Ok(Self::new(http, Url::parse(RELAY_URL)?))
    }

    /// Override the retry policy. Attempt `n` sleeps `n * backoff_step`
    /// before the next one.
    pub fn with_retry(mut self, max_attempts: u32, backoff_step: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.backoff_step = backoff_step;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, GelatoError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    async fn read(res: reqwest::Response) -> Result<Reply, GelatoError> {
        let status = res.status().as_u16();
        let body = res.text().await?;
        Ok(Reply { status, body })
    }

    fn handle(result: Result<Reply, GelatoError>) -> HandleMethod<String, GelatoError> {
        let err = match result {
            Ok(Reply { status, body }) if (200..300).contains(&status) => {
                return HandleMethod::Accept(body)
            }
            Ok(Reply { status, body }) => GelatoError::Api { status, body },
            Err(err) => err,
        };
        if err.is_transient() {
            HandleMethod::Retry(err)
        } else {
            HandleMethod::Halt(err)
        }
    }

    /// Run `send` until it yields a 2xx reply, a non-transient error, or the
    /// attempts run out.
    #[instrument(level = "debug", skip(self, send))]
    pub(crate) async fn request_with_retry<F, Fut>(
        &self,
        op: &'static str,
        send: F,
    ) -> Result<String, GelatoError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Reply, GelatoError>>,
    {
        let mut attempt = 1;
        loop {
            debug!(attempt, "Dispatching relay API request");
            let last_err = match Self::handle(send().await) {
                HandleMethod::Accept(body) => return Ok(body),
                HandleMethod::Halt(err) => {
                    warn!(attempt, error = %err, "Relay API request failed; not retrying");
                    return Err(err);
                }
                HandleMethod::Retry(err) => err,
            };

            if attempt >= self.max_attempts {
                warn!(attempts = attempt, error = %last_err, "Relay API request hit max attempts");
                return Err(GelatoError::MaxRetries {
                    op,
                    attempts: attempt,
                    last: Box::new(last_err),
                });
            }
            let backoff = self.backoff_step * attempt;
            info!(
                attempt,
                retries_remaining = self.max_attempts - attempt,
                backoff_ms = backoff.as_millis() as u64,
                error = %last_err,
                "Transient relay API error"
            );
            sleep(backoff).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl RelayApi for GelatoClient {
    #[instrument(skip(self), fields(chain_id = args.chain_id, target = ?args.target))]
    async fn create_task(&self, args: &CreateTaskArgs) -> Result<CreateTaskResult, GelatoError> {
        let url = self.endpoint("tasks")?;
        let body = self
            .request_with_retry("create_task", || {
                let req = self.http.post(url.clone()).json(args);
                async move { Self::read(req.send().await?).await }
            })
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self))]
    async fn task_status(&self, task_id: &str) -> Result<TaskStatusResult, GelatoError> {
        let url = self.endpoint(&format!("tasks/{task_id}"))?;
        let res = self
            .request_with_retry("task_status", || {
                let req = self.http.get(url.clone());
                async move { Self::read(req.send().await?).await }
            })
            .await;
        match res {
            Ok(body) => Ok(serde_json::from_str(&body)?),
            // an unknown task id is a state, not a failure
            Err(GelatoError::Api { status: 404, body }) => Ok(serde_json::from_str(&body)
                .unwrap_or(TaskStatusResult {
                    message: Some(body),
                    task: None,
                })),
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self))]
    async fn supported_chains(&self) -> Result<Vec<u64>, GelatoError> {
        let url = self.endpoint("oracles")?;
        let body = self
            .request_with_retry("supported_chains", || {
                let req = self.http.get(url.clone());
                async move { Self::read(req.send().await?).await }
            })
            .await?;
        let parsed: OraclesResult = serde_json::from_str(&body)?;
        Ok(parsed.chain_ids())
    }

    #[instrument(skip(self))]
    async fn estimate_fee(
        &self,
        chain_id: u64,
        payment_token: Address,
        gas_limit: U256,
    ) -> Result<U256, GelatoError> {
        let mut url = self.endpoint(&format!("oracles/{chain_id}/estimate"))?;
        url.query_pairs_mut()
            .append_pair("paymentToken", &format!("{payment_token:?}"))
            .append_pair("gasLimit", &gas_limit.to_string());
        let body = self
            .request_with_retry("estimate_fee", || {
                let req = self.http.get(url.clone());
                async move { Self::read(req.send().await?).await }
            })
            .await?;
        let parsed: EstimateResult = serde_json::from_str(&body)?;
        parsed.fee().map_err(GelatoError::InvalidReply)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    fn client() -> GelatoClient {
        GelatoClient::new(
            reqwest::Client::new(),
            Url::parse("http://relay.test/api/").unwrap(),
        )
    }

    #[test]
    fn endpoints_keep_the_base_path() {
        let c = client();
        assert_eq!(
            c.endpoint("tasks/0x01").unwrap().as_str(),
            "http://relay.test/api/tasks/0x01"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retries_5xx_with_linear_backoff() {
        let calls = AtomicU32::new(0);
        let script = [503, 502, 200];
        let start = Instant::now();
        let body = client()
            .request_with_retry("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) as usize;
                let status = script[n];
                async move {
                    Ok(Reply {
                        status,
                        body: "ok".into(),
                    })
                }
            })
            .await
            .unwrap();
        assert_eq!(body, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 2s after the first failure, 4s after the second
        assert_eq!(start.elapsed(), Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let err = client()
            .request_with_retry("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Ok(Reply {
                        status: 500,
                        body: "boom".into(),
                    })
                }
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(matches!(
            err,
            GelatoError::MaxRetries { attempts: 5, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_halt_immediately() {
        let calls = AtomicU32::new(0);
        let err = client()
            .request_with_retry("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Ok(Reply {
                        status: 400,
                        body: "invalid chainId".into(),
                    })
                }
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, GelatoError::Api { status: 400, .. }));
    }
}
