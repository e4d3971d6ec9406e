//! Deployment orchestration.
//!
//! [`DeployService`] drives one deployment end to end: authenticate the
//! signed request, gate on asset-holder eligibility, check the signed
//! message matches the submitted config, submit the deployment, then
//! record the receipt. Submission is irrevocable, so everything that can
//! reject a request runs before it, and nothing after it may turn a
//! deployed token into a client-visible failure. Recording runs on its
//! own task so a dropped request future cannot abandon it.

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::authenticator::RequestAuthenticator;
use crate::auth::message::{MessageMismatch, validate_binding};
use crate::auth::{AuthError, AuthRequest};
use crate::eligibility::{EligibilityChecker, EligibilityError, EligibilityReport};
use crate::models::{DeploymentStatus, NewDeployment, TokenConfig};
use crate::store::{DeploymentRecorder, RecordError};

/// Errors talking to the deployment backend.
#[derive(Debug, Error)]
pub enum DeployerError {
    /// The backend could not be reached.
    #[error("deployment backend unreachable: {0}")]
    Transport(String),

    /// The backend answered but refused the deployment.
    #[error("deployment rejected: {0}")]
    Rejected(String),

    /// The backend's answer could not be interpreted.
    #[error("malformed deployment response: {0}")]
    Decode(String),
}

/// A successfully submitted deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployed {
    /// Address of the token contract that now exists on chain.
    pub token_address: Address,
    /// Transaction that created it.
    pub tx_hash: B256,
}

/// Outcome of a dry-run deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulatedDeployment {
    pub estimated_address: Option<Address>,
    pub gas_estimate: Option<String>,
}

/// Submits token deployments to the chain.
#[async_trait]
pub trait TokenDeployer: Send + Sync {
    /// Deploy a token on behalf of `deployed_by`. One attempt; a success
    /// means the token exists on chain.
    async fn submit(
        &self,
        config: &TokenConfig,
        deployed_by: Address,
    ) -> Result<Deployed, DeployerError>;

    /// Dry-run a deployment without touching the chain.
    async fn simulate(
        &self,
        config: &TokenConfig,
        deployed_by: Address,
    ) -> Result<SimulatedDeployment, DeployerError>;
}

/// Errors that reject a deployment request before anything is deployed.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The caller's asset balance is below the deployment threshold.
    #[error("insufficient balance: {} held, {} required", .report.balance, .report.min_required)]
    InsufficientBalance { report: EligibilityReport },

    #[error(transparent)]
    Eligibility(#[from] EligibilityError),

    /// The signed message does not match the submitted request.
    #[error(transparent)]
    MessageMismatch(#[from] MessageMismatch),

    /// Submission to the deployment backend failed; no token was deployed.
    #[error(transparent)]
    DeploymentFailed(#[from] DeployerError),
}

/// Receipt for a deployment that was submitted successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReceipt {
    pub deployment_id: Uuid,
    pub token_address: Address,
    pub tx_hash: B256,
}

/// What happened after a successful submission.
#[derive(Debug)]
pub enum DeployOutcome {
    /// Deployed and durably recorded.
    Recorded(DeploymentReceipt),

    /// Deployed, but the record write failed. The token exists on chain;
    /// the receipt carries everything needed to reconcile by hand.
    RecordedPartially {
        receipt: DeploymentReceipt,
        record_error: RecordError,
    },
}

impl DeployOutcome {
    /// The receipt, regardless of whether recording succeeded.
    pub fn receipt(&self) -> &DeploymentReceipt {
        match self {
            DeployOutcome::Recorded(receipt) => receipt,
            DeployOutcome::RecordedPartially { receipt, .. } => receipt,
        }
    }
}

/// Orchestrates authentication, eligibility, submission and recording.
pub struct DeployService {
    authenticator: Arc<RequestAuthenticator>,
    eligibility: Arc<EligibilityChecker>,
    deployer: Arc<dyn TokenDeployer>,
    recorder: Arc<dyn DeploymentRecorder>,
}

impl DeployService {
    pub fn new(
        authenticator: Arc<RequestAuthenticator>,
        eligibility: Arc<EligibilityChecker>,
        deployer: Arc<dyn TokenDeployer>,
        recorder: Arc<dyn DeploymentRecorder>,
    ) -> Self {
        Self {
            authenticator,
            eligibility,
            deployer,
            recorder,
        }
    }

    /// Run one deployment end to end.
    ///
    /// Every rejection exit happens before submission. Once the deployer
    /// reports success this returns `Ok`: a recording failure downgrades
    /// the outcome to [`DeployOutcome::RecordedPartially`], never to an
    /// error. The recording tail is spawned onto the runtime, so it runs
    /// to completion even when the caller drops this future mid-flight
    /// (as an HTTP server does when the client disconnects).
    pub async fn deploy(
        &self,
        request: &AuthRequest,
        config: &TokenConfig,
    ) -> Result<DeployOutcome, DeployError> {
        self.authenticator.authenticate(request).await?;

        let report = self.eligibility.check(request.caller_address).await?;
        if !report.is_qualified {
            warn!(
                caller = %request.caller_address,
                balance = %report.balance,
                min_required = %report.min_required,
                "deployment rejected: insufficient balance"
            );
            return Err(DeployError::InsufficientBalance { report });
        }

        validate_binding(
            &request.message,
            config,
            request.caller_address,
            request.timestamp,
        )
        .map_err(|mismatch| {
            warn!(
                caller = %request.caller_address,
                %mismatch,
                "deployment rejected: signed message does not match request"
            );
            mismatch
        })?;

        let deployed = self
            .deployer
            .submit(config, request.caller_address)
            .await?;

        // Point of no return: the token exists on chain from here on.
        // No await may sit between here and the spawn below, or a dropped
        // future could still abandon the record write.
        let deployment_id = Uuid::now_v7();
        info!(
            %deployment_id,
            caller = %request.caller_address,
            token_address = %deployed.token_address,
            tx_hash = %deployed.tx_hash,
            "token deployed"
        );

        let receipt = DeploymentReceipt {
            deployment_id,
            token_address: deployed.token_address,
            tx_hash: deployed.tx_hash,
        };
        let record = NewDeployment {
            id: deployment_id,
            token_address: deployed.token_address,
            deployed_by: request.caller_address,
            tx_hash: deployed.tx_hash,
            config: config.clone(),
            status: DeploymentStatus::Completed,
        };

        let recorder = Arc::clone(&self.recorder);
        let task_receipt = receipt.clone();
        let tail = tokio::spawn(async move {
            match recorder.record(&record, &report).await {
                Ok(()) => DeployOutcome::Recorded(task_receipt),
                Err(record_error) => {
                    error!(
                        %deployment_id,
                        token_address = %record.token_address,
                        tx_hash = %record.tx_hash,
                        %record_error,
                        "token deployed but recording failed; reconcile from the chain"
                    );
                    DeployOutcome::RecordedPartially {
                        receipt: task_receipt,
                        record_error,
                    }
                }
            }
        });

        // Dropping a join handle detaches the task, so the write above
        // outlives a cancelled request.
        match tail.await {
            Ok(outcome) => Ok(outcome),
            Err(join_error) => {
                error!(
                    %deployment_id,
                    token_address = %receipt.token_address,
                    tx_hash = %receipt.tx_hash,
                    %join_error,
                    "token deployed but the recording task died; reconcile from the chain"
                );
                Ok(DeployOutcome::RecordedPartially {
                    receipt,
                    record_error: RecordError::Unavailable(format!(
                        "recording task failed: {join_error}"
                    )),
                })
            }
        }
    }

    /// Dry-run a deployment. Gated on eligibility like the real thing, but
    /// requires no signature and records nothing.
    pub async fn simulate(
        &self,
        caller: Address,
        config: &TokenConfig,
    ) -> Result<SimulatedDeployment, DeployError> {
        let report = self.eligibility.check(caller).await?;
        if !report.is_qualified {
            return Err(DeployError::InsufficientBalance { report });
        }
        Ok(self.deployer.simulate(config, caller).await?)
    }
}
