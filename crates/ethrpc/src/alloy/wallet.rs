use {
    alloy::signers::local::{MnemonicBuilder, PrivateKeySigner, coins_bip39::English},
    anyhow::{Context, Result},
    std::fmt::{self, Debug, Formatter},
};

/// Key material used to author transactions.
#[derive(Clone)]
pub enum Credential {
    /// A hex encoded 32 byte secp256k1 private key, with or without `0x`.
    PrivateKey(String),
    /// A BIP-39 phrase and the account index on the default Ethereum
    /// derivation path (`m/44'/60'/0'/0/{index}`).
    Mnemonic { phrase: String, index: u32 },
}

impl Credential {
    pub fn signer(&self) -> Result<PrivateKeySigner> {
        match self {
            Self::PrivateKey(key) => key
                .trim()
                .parse::<PrivateKeySigner>()
                .context("invalid private key"),
            Self::Mnemonic { phrase, index } => MnemonicBuilder::<English>::default()
                .phrase(phrase.trim())
                .index(*index)
                .context("invalid mnemonic derivation index")?
                .build()
                .context("invalid mnemonic"),
        }
    }
}

/// Never prints key material.
impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrivateKey(_) => f.write_str("PrivateKey(SECRET)"),
            Self::Mnemonic { index, .. } => write!(f, "Mnemonic(SECRET, index: {index})"),
        }
    }
}
