use {
    crate::{
        artifact::{self, ArtifactPair},
        node::{Confirmation, CreationRequest, Node},
    },
    alloy::primitives::{Address, TxHash},
    std::{fmt, io::Write},
    tracing::instrument,
};

/// Progress of a deployment. Every stage can end the run with an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Submitting,
    PendingConfirmation,
    Confirmed,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::PendingConfirmation => "pending confirmation",
            Self::Confirmed => "confirmed",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// A confirmed contract deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub address: Address,
    pub transaction: TxHash,
    pub block: Option<u64>,
    pub gas_used: u64,
}

/// Submits one contract-creation transaction and follows it until it is
/// confirmed. Nothing is retried: every call is a new deployment at a new
/// address.
pub struct Runner<N> {
    node: N,
    confirmation: Confirmation,
}

impl<N: Node> Runner<N> {
    pub fn new(node: N, confirmation: Confirmation) -> Self {
        Self { node, confirmation }
    }

    /// Deploys the contract, writing the human readable progress report to
    /// `out`:
    ///
    /// ```text
    /// Address will be 0x…
    /// Please wait...
    /// Successfully deployed!
    /// ```
    ///
    /// The address is known, and printed, before the transaction is mined
    /// since it only depends on the sender and its nonce.
    #[instrument(skip_all)]
    pub async fn deploy(
        &self,
        artifacts: &ArtifactPair,
        constructor_args: &[String],
        out: &mut impl Write,
    ) -> Result<Deployment, Error> {
        // Everything that can be checked locally is checked before the node is
        // contacted.
        let code = artifacts.creation_code(constructor_args)?;

        let stage = Stage::Submitting;
        let from = self.node.sender();
        let nonce = self.node.nonce(from).await.map_err(Error::Submission)?;
        let predicted = from.create(nonce);
        tracing::debug!(%stage, ?from, nonce, bytes = code.len(), "submitting contract creation");
        let transaction = self
            .node
            .submit(CreationRequest { from, nonce, code })
            .await
            .map_err(Error::Submission)?;

        let stage = Stage::PendingConfirmation;
        tracing::info!(%stage, ?transaction, address = ?predicted, "transaction accepted");
        report(out, stage, format_args!("Address will be {predicted}"))?;
        report(out, stage, format_args!("Please wait..."))?;

        let receipt = self
            .node
            .confirm(transaction, self.confirmation)
            .await
            .map_err(Error::Confirmation)?;
        if !receipt.success {
            return Err(Error::Reverted { transaction });
        }
        let address = receipt
            .contract_address
            .ok_or(Error::MissingContractAddress { transaction })?;
        if address != predicted {
            return Err(Error::AddressMismatch {
                expected: predicted,
                actual: address,
            });
        }

        let stage = Stage::Confirmed;
        tracing::info!(%stage, ?address, block = ?receipt.block, gas_used = receipt.gas_used, "contract deployed");
        report(out, stage, format_args!("Successfully deployed!"))?;
        tracing::debug!(stage = %Stage::Done, "deployment finished");

        Ok(Deployment {
            address,
            transaction,
            block: receipt.block,
            gas_used: receipt.gas_used,
        })
    }
}

fn report(out: &mut impl Write, stage: Stage, line: fmt::Arguments<'_>) -> Result<(), Error> {
    writeln!(out, "{line}")
        .and_then(|()| out.flush())
        .map_err(|source| Error::Report { stage, source })
}

/// Broad classes of failures, for callers that want to react differently to
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The signing credential could not be constructed.
    Configuration,
    /// An artifact file is missing or unreadable.
    ArtifactIo,
    /// An artifact is malformed, or the constructor arguments don't fit it.
    ArtifactFormat,
    /// The node could not be reached or refused the transaction.
    Submission,
    /// The transaction was accepted but never confirmed as a successful
    /// deployment.
    Confirmation,
    /// The progress report could not be written.
    Output,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid signing credential")]
    Credential(#[source] anyhow::Error),
    #[error(transparent)]
    Artifact(#[from] artifact::Error),
    #[error("failed to submit the deployment transaction")]
    Submission(#[source] anyhow::Error),
    #[error("failed to confirm the deployment transaction")]
    Confirmation(#[source] anyhow::Error),
    #[error("deployment transaction {transaction} reverted")]
    Reverted { transaction: TxHash },
    #[error("receipt of transaction {transaction} has no contract address")]
    MissingContractAddress { transaction: TxHash },
    #[error("contract was deployed at {actual} instead of the expected {expected}")]
    AddressMismatch { expected: Address, actual: Address },
    #[error("failed to write the deployment report while {stage}")]
    Report {
        stage: Stage,
        source: std::io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Credential(_) => ErrorKind::Configuration,
            Self::Artifact(err) if err.is_io() => ErrorKind::ArtifactIo,
            Self::Artifact(_) => ErrorKind::ArtifactFormat,
            Self::Submission(_) => ErrorKind::Submission,
            Self::Confirmation(_)
            | Self::Reverted { .. }
            | Self::MissingContractAddress { .. }
            | Self::AddressMismatch { .. } => ErrorKind::Confirmation,
            Self::Report { .. } => ErrorKind::Output,
        }
    }

    /// The stage the deployment was in when it failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Credential(_) | Self::Artifact(_) => Stage::Idle,
            Self::Submission(_) => Stage::Submitting,
            Self::Confirmation(_)
            | Self::Reverted { .. }
            | Self::MissingContractAddress { .. }
            | Self::AddressMismatch { .. } => Stage::PendingConfirmation,
            Self::Report { stage, .. } => *stage,
        }
    }
}
