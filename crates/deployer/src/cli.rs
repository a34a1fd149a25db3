//! CLI arguments for the `deploy-contract` binary.

use {
    clap::ArgGroup,
    ethrpc::alloy::wallet::Credential,
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
        time::Duration,
    },
    url::Url,
};

/// Deploy a compiled contract and report its address
#[derive(Debug, clap::Parser)]
#[command(version)]
#[command(group(
    ArgGroup::new("credential")
        .required(true)
        .args(["private_key", "mnemonic"])
))]
pub struct Args {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    /// Path to the hex encoded contract bytecode, as written by `solc --bin`.
    #[clap(long, env)]
    pub bytecode: PathBuf,

    /// Path to the contract JSON ABI, as written by `solc --abi`.
    #[clap(long, env)]
    pub abi: PathBuf,

    /// A constructor argument in its textual form, e.g. `42`, `0xf39F…`,
    /// `[1,2]`. Repeat the flag once per argument, in declaration order.
    #[clap(long = "constructor-arg")]
    pub constructor_args: Vec<String>,

    /// The node RPC API endpoint.
    #[clap(long, env, default_value = "http://localhost:8545")]
    pub node_url: Url,

    /// The private key used to sign the deployment. Expects a 32-byte hex
    /// encoded string. This can't be specified along with --mnemonic, exactly
    /// one of them must be specified.
    #[clap(long, env, hide_env_values = true)]
    pub private_key: Option<String>,

    /// A BIP-39 mnemonic the signing key is derived from. This can't be
    /// specified along with --private-key, exactly one of them must be
    /// specified.
    #[clap(long, env, hide_env_values = true)]
    pub mnemonic: Option<String>,

    /// The account index used with --mnemonic.
    #[clap(long, env, default_value = "0")]
    pub mnemonic_index: u32,

    /// How many blocks, including the one containing the deployment, must be
    /// mined before it counts as confirmed.
    #[clap(
        long,
        env,
        default_value = "1",
        value_parser = clap::value_parser!(u64).range(1..),
    )]
    pub confirmations: u64,

    /// Give up waiting for confirmation after this long (e.g. `90s`, `5m`).
    /// Waits indefinitely when unset.
    #[clap(long, env, value_parser = humantime::parse_duration)]
    pub confirmation_timeout: Option<Duration>,
}

impl Args {
    /// The configured signing credential, if any.
    pub fn credential(&self) -> Option<Credential> {
        match (&self.private_key, &self.mnemonic) {
            (Some(key), _) => Some(Credential::PrivateKey(key.clone())),
            (None, Some(phrase)) => Some(Credential::Mnemonic {
                phrase: phrase.clone(),
                index: self.mnemonic_index,
            }),
            (None, None) => None,
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct LoggingArguments {
    /// The log filter.
    #[clap(long, env, default_value = "warn,deployer=info")]
    pub log_filter: String,

    /// Output log events as JSON.
    #[clap(long, env)]
    pub use_json_logs: bool,
}

/// Arg types have custom `Display` impls instead of relying on `Debug` to avoid
/// accidentally printing secrets. Secret values are printed as "SECRET".
impl Display for Args {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            logging,
            bytecode,
            abi,
            constructor_args,
            node_url: _,
            private_key,
            mnemonic,
            mnemonic_index,
            confirmations,
            confirmation_timeout,
        } = self;

        write!(f, "{logging}")?;
        writeln!(f, "bytecode: {bytecode:?}")?;
        writeln!(f, "abi: {abi:?}")?;
        writeln!(f, "constructor_args: {constructor_args:?}")?;
        writeln!(f, "node_url: SECRET")?;
        display_secret_option(f, "private_key", private_key)?;
        display_secret_option(f, "mnemonic", mnemonic)?;
        writeln!(f, "mnemonic_index: {mnemonic_index}")?;
        writeln!(f, "confirmations: {confirmations}")?;
        writeln!(f, "confirmation_timeout: {confirmation_timeout:?}")
    }
}

impl Display for LoggingArguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "log_filter: {}", self.log_filter)?;
        writeln!(f, "use_json_logs: {}", self.use_json_logs)
    }
}

fn display_secret_option<T>(f: &mut Formatter<'_>, name: &str, option: &Option<T>) -> fmt::Result {
    match option {
        Some(_) => writeln!(f, "{name}: SECRET"),
        None => writeln!(f, "{name}: None"),
    }
}
