use {
    crate::{
        artifact::ArtifactPair,
        cli,
        deployment::{self, Deployment, Runner},
        node::{self, Confirmation},
    },
    anyhow::Context,
    clap::Parser,
    std::{io::Write, process::ExitCode},
};

/// Parses the command line, deploys the contract and maps the outcome to the
/// process exit status.
pub async fn start(args: impl Iterator<Item = String>) -> ExitCode {
    let args = cli::Args::parse_from(args);
    observe::tracing::initialize(&observe::Config::new(
        &args.logging.log_filter,
        args.logging.use_json_logs,
    ));
    tracing::info!("running contract deployer with arguments:\n{args}");

    let outcome = run(&args, &mut std::io::stdout()).await;
    exit_code(outcome, &mut std::io::stdout())
}

/// Reports a failed deployment as a single `error:` line on `out`.
fn exit_code(outcome: Result<Deployment, deployment::Error>, out: &mut impl Write) -> ExitCode {
    match outcome {
        Ok(deployment) => {
            tracing::debug!(?deployment, "finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(kind = ?err.kind(), stage = %err.stage(), "deployment failed");
            // Shows the whole chain of causes.
            let err = anyhow::Error::new(err);
            if let Err(write) = writeln!(out, "error: {err:#}").and_then(|()| out.flush()) {
                tracing::warn!(?write, "failed to report deployment error");
            }
            ExitCode::FAILURE
        }
    }
}

/// Loads the artifacts and deploys them with the configured credential,
/// writing the progress report to `out`.
pub async fn run(args: &cli::Args, out: &mut impl Write) -> Result<Deployment, deployment::Error> {
    let artifacts = ArtifactPair::load(&args.bytecode, &args.abi)?;

    let signer = args
        .credential()
        .context("no signing credential configured")
        .and_then(|credential| credential.signer())
        .map_err(deployment::Error::Credential)?;
    let sender = signer.address();
    tracing::info!(?sender, node = %args.node_url.host_str().unwrap_or_default(), "connecting");
    let provider = ethrpc::alloy::provider_with_signer(&args.node_url, "deployer", signer);

    let confirmation = Confirmation {
        confirmations: args.confirmations,
        timeout: args.confirmation_timeout,
    };
    Runner::new(node::Ethereum::new(provider, sender), confirmation)
        .deploy(&artifacts, &args.constructor_args, out)
        .await
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::deployment::ErrorKind,
        alloy::primitives::{B256, address},
        tempfile::NamedTempFile,
    };

    #[tokio::test]
    async fn missing_artifact_prints_one_error_line() {
        let mut abi = NamedTempFile::new().unwrap();
        abi.write_all(b"[]").unwrap();
        let args = cli::Args::parse_from([
            "deploy-contract",
            "--bytecode",
            "/nonexistent/Contract.bin",
            "--abi",
            abi.path().to_str().unwrap(),
            "--node-url",
            "http://127.0.0.1:9",
            "--private-key",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        ]);

        let mut out = Vec::new();
        let outcome = run(&args, &mut out).await;
        assert!(matches!(&outcome, Err(err) if err.kind() == ErrorKind::ArtifactIo));
        let code = exit_code(outcome, &mut out);

        assert_eq!(code, ExitCode::FAILURE);
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("error: failed to read"), "{out}");
        assert!(out.contains("/nonexistent/Contract.bin"), "{out}");
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn confirmed_deployment_exits_successfully() {
        let deployment = Deployment {
            address: address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            transaction: B256::repeat_byte(1),
            block: Some(1),
            gas_used: 53_000,
        };

        let mut out = Vec::new();
        assert_eq!(exit_code(Ok(deployment), &mut out), ExitCode::SUCCESS);
        assert!(out.is_empty());
    }
}
