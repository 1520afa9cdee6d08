use std::sync::Arc;

use ethers_core::abi::{encode, Token};
use ethers_core::utils::id;
use gelato::task::{CreateTaskArgs, NATIVE_FEE_TOKEN_ADDRESS};
use gelato::task_status::TaskState;
use gelato::{GelatoError, RelayApi};
use prometheus::IntCounterVec;
use teleport_core::{
    Address, Bytes, Classify, ErrorKind, RelayAuthorization, RelayKind, RelayTask,
    RelayTaskStatus, Signature, TeleportSigner, TeleportSignerError, TeleportSignerExt,
    TransferGuid, H256, U256,
};
use tracing::{debug, info, instrument, warn};

use crate::{Clock, PollInterrupt, PollOptions};

/// Errors requesting or tracking a relayed mint
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The relayer would take the whole transfer
    #[error("Relay fee {relay_fee} must be below the transfer amount {amount}")]
    InvalidRelayFee {
        /// Requested fee
        relay_fee: u128,
        /// Transfer amount
        amount: u128,
    },
    /// The request does not fit the configured relay contract
    #[error("Invalid relay request: {0}")]
    InvalidInput(String),
    /// The relay network API failed
    #[error(transparent)]
    RelayApiError(#[from] GelatoError),
    /// The wait ended; the task may still complete
    #[error("Timed out waiting for relay task {task_id}")]
    RelayTimeout {
        /// Task to re-poll later
        task_id: String,
    },
    /// The relay network gave up on the task
    #[error("Relay task {task_id} failed: {reason}")]
    TaskFailed {
        /// Failed task
        task_id: String,
        /// Relay network's explanation
        reason: String,
    },
    /// The caller cancelled the wait
    #[error("Relay task wait was cancelled")]
    Cancelled,
    /// The receiver's key could not sign
    #[error(transparent)]
    Signer(#[from] TeleportSignerError),
}

impl Classify for RelayError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRelayFee { .. } | Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::RelayApiError(e) if e.is_transient() => ErrorKind::TransientNetwork,
            Self::RelayApiError(GelatoError::MaxRetries { .. }) => ErrorKind::TransientNetwork,
            Self::RelayTimeout { .. } | Self::Cancelled => ErrorKind::Timeout,
            Self::RelayApiError(_) | Self::TaskFailed { .. } | Self::Signer(_) => ErrorKind::Fatal,
        }
    }
}

/// A call the trusted relay makes after minting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraCall {
    /// Call target
    pub to: Address,
    /// Calldata
    pub data: Bytes,
}

/// Everything needed to ask for a relayed mint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    /// The transfer to mint
    pub guid: TransferGuid,
    /// Oracle signatures, concatenated in signer order
    pub signatures: Bytes,
    /// Fee for the relayer, in the asset's base unit
    pub relay_fee: u128,
    /// Upper bound on the bridge fee, as a WAD fraction
    pub max_fee_percentage: U256,
    /// Unix seconds after which the receiver's authorization is void
    pub expiry: u64,
    /// Follow-up call, trusted relays only
    pub extra_call: Option<ExtraCall>,
}

/// Submits relayed mints to the relay network and tracks them
#[derive(Debug)]
pub struct RelayClient {
    api: Arc<dyn RelayApi>,
    clock: Arc<dyn Clock>,
    chain_id: u64,
    relay_address: Address,
    kind: RelayKind,
    gas_limit: u64,
    fee_token: Address,
    outcomes: Option<IntCounterVec>,
}

impl RelayClient {
    /// Client for the `kind` relay contract at `relay_address` on `chain_id`
    pub fn new(
        api: Arc<dyn RelayApi>,
        clock: Arc<dyn Clock>,
        chain_id: u64,
        relay_address: Address,
        kind: RelayKind,
    ) -> Self {
        Self {
            api,
            clock,
            chain_id,
            relay_address,
            kind,
            gas_limit: kind.default_gas_limit(),
            fee_token: NATIVE_FEE_TOKEN_ADDRESS,
            outcomes: None,
        }
    }

    /// Request a different gas limit per relay
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Count terminal task outcomes on `counter`
    pub fn with_outcome_counter(mut self, counter: IntCounterVec) -> Self {
        self.outcomes = Some(counter);
        self
    }

    fn count_outcome(&self, outcome: &str) {
        if let Some(outcomes) = &self.outcomes {
            outcomes.with_label_values(&[outcome]).inc();
        }
    }

    fn validate(&self, req: &RelayRequest) -> Result<(), RelayError> {
        let amount = req.guid.amount();
        if req.relay_fee >= amount {
            return Err(RelayError::InvalidRelayFee {
                relay_fee: req.relay_fee,
                amount,
            });
        }
        if req.extra_call.is_some() && self.kind == RelayKind::Basic {
            return Err(RelayError::InvalidInput(
                "the basic relay cannot make an extra call".into(),
            ));
        }
        Ok(())
    }

    /// ABI-encoded `relay()` call carrying the receiver's authorization
    pub fn relay_calldata(&self, req: &RelayRequest, authorization: &Signature) -> Bytes {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        authorization.r.to_big_endian(&mut r);
        authorization.s.to_big_endian(&mut s);

        let mut tokens = vec![
            req.guid.to_token(),
            Token::Bytes(req.signatures.to_vec()),
            Token::Uint(req.max_fee_percentage),
            Token::Uint(req.relay_fee.into()),
            Token::Uint(req.expiry.into()),
            Token::Uint(authorization.v.into()),
            Token::FixedBytes(r.to_vec()),
            Token::FixedBytes(s.to_vec()),
        ];
        if self.kind == RelayKind::Trusted {
            let (to, data) = req
                .extra_call
                .as_ref()
                .map(|call| (call.to, call.data.to_vec()))
                .unwrap_or_default();
            tokens.push(Token::Address(to));
            tokens.push(Token::Bytes(data));
        }

        let mut calldata = id(self.kind.relay_signature()).to_vec();
        calldata.extend(encode(&tokens));
        calldata.into()
    }

    /// Have the receiver authorize the relayer and hand the mint to the
    /// relay network. Fails before touching the network or the key when the
    /// request is invalid.
    #[instrument(skip_all, fields(guid = ?req.guid.guid_hash(), relay_fee = req.relay_fee))]
    pub async fn request_relay<S: TeleportSigner>(
        &self,
        signer: &S,
        req: RelayRequest,
    ) -> Result<RelayTask, RelayError> {
        self.validate(&req)?;

        let guid_hash = req.guid.guid_hash();
        let authorization = signer
            .sign(RelayAuthorization {
                guid_hash,
                max_fee_percentage: req.max_fee_percentage,
                gas_fee: req.relay_fee.into(),
                expiry: req.expiry.into(),
            })
            .await?;

        let args = CreateTaskArgs {
            chain_id: self.chain_id,
            target: self.relay_address,
            data: self.relay_calldata(&req, &authorization.signature),
            fee_token: self.fee_token,
            gas_limit: self.gas_limit.into(),
        };
        let created = self.api.create_task(&args).await?;
        info!(task_id = %created.task_id, "Relay task created");
        Ok(RelayTask::new(created.task_id, guid_hash))
    }

    fn fail(&self, task: &mut RelayTask, reason: String) -> RelayError {
        warn!(task_id = %task.task_id, %reason, "Relay task failed");
        task.advance(RelayTaskStatus::Failed {
            reason: reason.clone(),
        });
        self.count_outcome("failed");
        RelayError::TaskFailed {
            task_id: task.task_id.clone(),
            reason,
        }
    }

    fn interrupted(&self, task: &RelayTask, interrupt: PollInterrupt) -> RelayError {
        match interrupt {
            PollInterrupt::TimedOut => {
                self.count_outcome("timeout");
                RelayError::RelayTimeout {
                    task_id: task.task_id.clone(),
                }
            }
            PollInterrupt::Cancelled => RelayError::Cancelled,
        }
    }

    /// Poll the task until it is mined or fails. Returns the mint tx hash.
    ///
    /// A task that already reached a terminal state is answered without
    /// asking the network. Once the network reports the task as executing,
    /// stale error messages from earlier checks no longer fail it. On timeout
    /// the task may still complete; calling again with the same task resumes
    /// the wait.
    #[instrument(skip(self, task, opts), fields(task_id = %task.task_id))]
    pub async fn wait_for_task(
        &self,
        task: &mut RelayTask,
        opts: &PollOptions,
    ) -> Result<H256, RelayError> {
        match task.status() {
            RelayTaskStatus::Executed { tx_hash } => return Ok(*tx_hash),
            RelayTaskStatus::Failed { reason } => {
                return Err(RelayError::TaskFailed {
                    task_id: task.task_id.clone(),
                    reason: reason.clone(),
                })
            }
            RelayTaskStatus::Submitted | RelayTaskStatus::Pending => {}
        }

        let timer = opts.start(self.clock.as_ref());
        let mut pending = *task.status() == RelayTaskStatus::Pending;
        loop {
            let reply = timer
                .run(self.api.task_status(&task.task_id))
                .await
                .map_err(|interrupt| self.interrupted(task, interrupt))??;
            match reply.task {
                Some(status) => {
                    debug!(state = ?status.task_state, "Relay task status");
                    match status.task_state {
                        TaskState::ExecSuccess => match status.transaction_hash() {
                            Some(hash) => {
                                let tx_hash: H256 = hash.parse().map_err(|_| {
                                    GelatoError::InvalidReply(format!("bad transaction hash {hash}"))
                                })?;
                                task.advance(RelayTaskStatus::Executed { tx_hash });
                                self.count_outcome("executed");
                                info!(?tx_hash, "Relay task executed");
                                return Ok(tx_hash);
                            }
                            None => debug!("Relay task succeeded without a transaction hash yet"),
                        },
                        TaskState::ExecPending => {
                            pending = true;
                            task.advance(RelayTaskStatus::Pending);
                        }
                        TaskState::ExecReverted | TaskState::Cancelled | TaskState::Blacklisted => {
                            let reason = status
                                .last_check
                                .and_then(|c| c.message)
                                .unwrap_or_else(|| format!("{:?}", status.task_state));
                            return Err(self.fail(task, reason));
                        }
                        _ if !pending && status.last_check_mentions_error() => {
                            let reason = status
                                .last_check
                                .and_then(|c| c.message)
                                .unwrap_or_default();
                            return Err(self.fail(task, reason));
                        }
                        _ => {}
                    }
                }
                None => debug!(message = ?reply.message, "Relay task not found yet"),
            }

            timer
                .tick()
                .await
                .map_err(|interrupt| self.interrupted(task, interrupt))?;
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use ethers_core::abi::{decode, ParamType};
    use ethers_signers::LocalWallet;
    use gelato::task::CreateTaskResult;
    use gelato::task_status::{Execution, LastCheck, TaskStatus, TaskStatusResult};
    use teleport_core::Signable;
    use teleport_test::mocks::MockRelayApi;

    use teleport_test::test_utils::test_guid;
    use tracing_test::traced_test;

    use super::*;
    use crate::{ManualClock, TokioClock};

    fn guid(amount: u128) -> TransferGuid {
        test_guid(amount, 0)
    }

    fn request(amount: u128, relay_fee: u128) -> RelayRequest {
        RelayRequest {
            guid: guid(amount),
            signatures: vec![0xab; 65].into(),
            relay_fee,
            max_fee_percentage: U256::zero(),
            expiry: 1_700_003_600,
            extra_call: None,
        }
    }

    fn wallet() -> LocalWallet {
        LocalWallet::from_bytes(&[7u8; 32]).unwrap()
    }

    fn status(state: TaskState, message: Option<&str>, tx: Option<&str>) -> TaskStatusResult {
        TaskStatusResult {
            message: None,
            task: Some(TaskStatus {
                task_id: "0x01".into(),
                task_state: state,
                chain_id: Some(10),
                created_at: None,
                last_check: message.map(|m| LastCheck {
                    message: Some(m.into()),
                    ..Default::default()
                }),
                execution: tx.map(|t| Execution {
                    status: Some("success".into()),
                    transaction_hash: t.into(),
                    block_number: Some(1),
                    created_at: None,
                }),
            }),
        }
    }

    fn scripted(script: Vec<TaskStatusResult>) -> (MockRelayApi, Arc<AtomicUsize>) {
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();
        let mut api = MockRelayApi::new();
        api.expect__task_status().returning(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(script[n.min(script.len() - 1)].clone())
        });
        (api, polls)
    }

    fn client(api: MockRelayApi, clock: Arc<ManualClock>, kind: RelayKind) -> RelayClient {
        RelayClient::new(Arc::new(api), clock, 10, Address::repeat_byte(0x22), kind)
    }

    #[tokio::test]
    async fn rejects_fee_eating_the_transfer_without_network_calls() {
        let mut api = MockRelayApi::new();
        api.expect__create_task().never();
        let client = client(api, Arc::new(ManualClock::default()), RelayKind::Basic);
        for fee in [100, 101] {
            let err = client.request_relay(&wallet(), request(100, fee)).await.unwrap_err();
            assert!(matches!(err, RelayError::InvalidRelayFee { amount: 100, .. }));
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[tokio::test]
    async fn basic_relays_reject_extra_calls() {
        let mut api = MockRelayApi::new();
        api.expect__create_task().never();
        let client = client(api, Arc::new(ManualClock::default()), RelayKind::Basic);
        let mut req = request(100, 1);
        req.extra_call = Some(ExtraCall {
            to: Address::repeat_byte(3),
            data: vec![1, 2].into(),
        });
        let err = client.request_relay(&wallet(), req).await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn submits_signed_relay_calldata() {
        let wallet = wallet();
        let req = request(100, 1);
        let expected_auth = RelayAuthorization {
            guid_hash: req.guid.guid_hash(),
            max_fee_percentage: U256::zero(),
            gas_fee: 1.into(),
            expiry: 1_700_003_600u64.into(),
        };
        let receiver = wallet.eth_address();

        let mut api = MockRelayApi::new();
        api.expect__create_task()
            .times(1)
            .withf(|args| {
                args.chain_id == 10
                    && args.target == Address::repeat_byte(0x22)
                    && args.fee_token == NATIVE_FEE_TOKEN_ADDRESS
                    && args.gas_limit == U256::from(420_000)
                    && args.data[..4] == id(RelayKind::Basic.relay_signature())
            })
            .returning(move |args| {
                let tokens = decode(
                    &[
                        ParamType::Tuple(vec![
                            ParamType::FixedBytes(32),
                            ParamType::FixedBytes(32),
                            ParamType::FixedBytes(32),
                            ParamType::FixedBytes(32),
                            ParamType::Uint(128),
                            ParamType::Uint(80),
                            ParamType::Uint(48),
                        ]),
                        ParamType::Bytes,
                        ParamType::Uint(256),
                        ParamType::Uint(256),
                        ParamType::Uint(256),
                        ParamType::Uint(8),
                        ParamType::FixedBytes(32),
                        ParamType::FixedBytes(32),
                    ],
                    &args.data[4..],
                )
                .unwrap();
                let v = tokens[5].clone().into_uint().unwrap().as_u64();
                let r = U256::from_big_endian(&tokens[6].clone().into_fixed_bytes().unwrap());
                let s = U256::from_big_endian(&tokens[7].clone().into_fixed_bytes().unwrap());
                let sig = Signature { r, s, v };
                assert_eq!(sig.recover(expected_auth.eth_signed_message_hash()).unwrap(), receiver);
                assert_eq!(tokens[1].clone().into_bytes().unwrap(), vec![0xab; 65]);
                Ok(CreateTaskResult {
                    task_id: "0xfeed".into(),
                })
            });

        let client = client(api, Arc::new(ManualClock::default()), RelayKind::Basic);
        let task = client.request_relay(&wallet, req.clone()).await.unwrap();
        assert_eq!(task.task_id, "0xfeed");
        assert_eq!(task.guid_hash, req.guid.guid_hash());
        assert_eq!(task.status(), &RelayTaskStatus::Submitted);
    }

    #[test]
    fn trusted_calldata_appends_the_extra_call() {
        let client = client(MockRelayApi::new(), Arc::new(ManualClock::default()), RelayKind::Trusted);
        let sig = Signature {
            r: U256::one(),
            s: U256::one(),
            v: 27,
        };
        let basic = RelayClient::new(
            Arc::new(MockRelayApi::new()),
            Arc::new(ManualClock::default()),
            10,
            Address::zero(),
            RelayKind::Basic,
        );
        let mut req = request(100, 1);
        let plain = basic.relay_calldata(&req, &sig);
        req.extra_call = Some(ExtraCall {
            to: Address::repeat_byte(3),
            data: vec![1, 2, 3].into(),
        });
        let trusted = client.relay_calldata(&req, &sig);
        assert_eq!(trusted[..4], id(RelayKind::Trusted.relay_signature()));
        // head grows by two words, tail by the bytes length and payload
        assert_eq!(trusted.len(), plain.len() + 32 * 2 + 32 * 2);
    }

    #[tokio::test]
    async fn executes_after_three_polls() {
        let (api, polls) = scripted(vec![
            status(TaskState::CheckPending, None, None),
            status(TaskState::ExecPending, None, None),
            status(
                TaskState::ExecSuccess,
                None,
                Some("0x0101010101010101010101010101010101010101010101010101010101010101"),
            ),
        ]);
        let clock = Arc::new(ManualClock::default());
        let client = client(api, clock.clone(), RelayKind::Basic);
        let mut task = RelayTask::new("0x01".into(), H256::zero());
        let tx = client
            .wait_for_task(&mut task, &PollOptions::every(Duration::from_millis(2000)))
            .await
            .unwrap();
        assert_eq!(tx, H256::repeat_byte(1));
        assert_eq!(polls.load(Ordering::SeqCst), 3);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(2000); 2]);
        assert_eq!(task.status(), &RelayTaskStatus::Executed { tx_hash: tx });
    }

    #[tokio::test]
    async fn early_error_messages_fail_the_task() {
        let (api, _) = scripted(vec![status(
            TaskState::CheckPending,
            Some("Execution error: insufficient fee"),
            None,
        )]);
        let client = client(api, Arc::new(ManualClock::default()), RelayKind::Basic);
        let mut task = RelayTask::new("0x01".into(), H256::zero());
        let err = client
            .wait_for_task(&mut task, &PollOptions::every(Duration::from_secs(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::TaskFailed { .. }));
        assert!(task.status().is_terminal());
    }

    #[tokio::test]
    async fn stale_errors_are_ignored_once_pending() {
        let (api, polls) = scripted(vec![
            status(TaskState::ExecPending, None, None),
            status(TaskState::WaitingForConfirmation, Some("Simulation error, retrying"), None),
            status(
                TaskState::ExecSuccess,
                None,
                Some("0x0202020202020202020202020202020202020202020202020202020202020202"),
            ),
        ]);
        let client = client(api, Arc::new(ManualClock::default()), RelayKind::Basic);
        let mut task = RelayTask::new("0x01".into(), H256::zero());
        let tx = client
            .wait_for_task(&mut task, &PollOptions::every(Duration::from_secs(2)))
            .await
            .unwrap();
        assert_eq!(tx, H256::repeat_byte(2));
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn reverted_tasks_fail() {
        let (api, _) = scripted(vec![status(TaskState::ExecReverted, Some("Reverted"), None)]);
        let client = client(api, Arc::new(ManualClock::default()), RelayKind::Basic);
        let mut task = RelayTask::new("0x01".into(), H256::zero());
        let err = client
            .wait_for_task(&mut task, &PollOptions::every(Duration::from_secs(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::TaskFailed { ref reason, .. } if reason == "Reverted"));
    }

    #[tokio::test]
    async fn times_out_and_can_resume() {
        let (api, polls) = scripted(vec![
            TaskStatusResult::default(),
            TaskStatusResult::default(),
            status(
                TaskState::ExecSuccess,
                None,
                Some("0x0303030303030303030303030303030303030303030303030303030303030303"),
            ),
        ]);
        let clock = Arc::new(ManualClock::default());
        let client = client(api, clock, RelayKind::Basic);
        let mut task = RelayTask::new("0x01".into(), H256::zero());
        let opts = PollOptions::every(Duration::from_secs(2)).with_timeout(Duration::from_secs(3));
        let err = client.wait_for_task(&mut task, &opts).await.unwrap_err();
        assert!(matches!(err, RelayError::RelayTimeout { ref task_id } if task_id == "0x01"));
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(polls.load(Ordering::SeqCst), 2);

        let tx = client.wait_for_task(&mut task, &opts).await.unwrap();
        assert_eq!(tx, H256::repeat_byte(3));
    }

    #[tokio::test]
    async fn api_errors_surface() {
        let mut api = MockRelayApi::new();
        api.expect__task_status().times(1).returning(|_| {
            Err(GelatoError::Api {
                status: 400,
                body: "bad task id".into(),
            })
        });
        let client = client(api, Arc::new(ManualClock::default()), RelayKind::Basic);
        let mut task = RelayTask::new("nope".into(), H256::zero());
        let err = client
            .wait_for_task(&mut task, &PollOptions::every(Duration::from_secs(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::RelayApiError(GelatoError::Api { status: 400, .. })));
        assert_eq!(task.status(), &RelayTaskStatus::Submitted);
    }

    #[tokio::test]
    async fn terminal_tasks_are_answered_without_polling() {
        let mut api = MockRelayApi::new();
        api.expect__task_status().never();
        let client = client(api, Arc::new(ManualClock::default()), RelayKind::Basic);
        let opts = PollOptions::every(Duration::from_secs(2));

        let mut failed = RelayTask::new("0x01".into(), H256::zero());
        failed.advance(RelayTaskStatus::Failed {
            reason: "reverted".into(),
        });
        let err = client.wait_for_task(&mut failed, &opts).await.unwrap_err();
        assert!(matches!(err, RelayError::TaskFailed { ref reason, .. } if reason == "reverted"));
        assert!(matches!(failed.status(), RelayTaskStatus::Failed { .. }));

        let mut executed = RelayTask::new("0x02".into(), H256::zero());
        executed.advance(RelayTaskStatus::Executed {
            tx_hash: H256::repeat_byte(4),
        });
        let tx = client.wait_for_task(&mut executed, &opts).await.unwrap();
        assert_eq!(tx, H256::repeat_byte(4));
    }

    #[tokio::test]
    #[traced_test]
    async fn success_without_a_hash_keeps_polling() {
        let (api, polls) = scripted(vec![
            status(TaskState::ExecSuccess, None, None),
            status(
                TaskState::ExecSuccess,
                None,
                Some("0x0505050505050505050505050505050505050505050505050505050505050505"),
            ),
        ]);
        let client = client(api, Arc::new(ManualClock::default()), RelayKind::Basic);
        let mut task = RelayTask::new("0x01".into(), H256::zero());
        let tx = client
            .wait_for_task(&mut task, &PollOptions::every(Duration::from_secs(2)))
            .await
            .unwrap();
        assert_eq!(tx, H256::repeat_byte(5));
        assert_eq!(polls.load(Ordering::SeqCst), 2);
        assert!(logs_contain("without a transaction hash"));
    }

    /// A relay network whose status endpoint never answers
    #[derive(Debug)]
    struct StalledApi;

    #[async_trait]
    impl RelayApi for StalledApi {
        async fn create_task(&self, _args: &CreateTaskArgs) -> Result<CreateTaskResult, GelatoError> {
            std::future::pending().await
        }

        async fn task_status(&self, _task_id: &str) -> Result<TaskStatusResult, GelatoError> {
            std::future::pending().await
        }

        async fn supported_chains(&self) -> Result<Vec<u64>, GelatoError> {
            std::future::pending().await
        }

        async fn estimate_fee(
            &self,
            _chain_id: u64,
            _payment_token: Address,
            _gas_limit: U256,
        ) -> Result<U256, GelatoError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_bounds_a_stalled_status_call() {
        let clock = Arc::new(TokioClock::new());
        let client = RelayClient::new(
            Arc::new(StalledApi),
            clock.clone(),
            10,
            Address::repeat_byte(0x22),
            RelayKind::Basic,
        );
        let mut task = RelayTask::new("0x01".into(), H256::zero());
        let opts = PollOptions::every(Duration::from_secs(2)).with_timeout(Duration::from_secs(3));
        let err = client.wait_for_task(&mut task, &opts).await.unwrap_err();
        assert!(matches!(err, RelayError::RelayTimeout { .. }));
        assert!(clock.elapsed() < Duration::from_secs(4));
        assert_eq!(task.status(), &RelayTaskStatus::Submitted);
    }
}
