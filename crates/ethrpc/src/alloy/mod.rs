mod instrumentation;
pub mod wallet;

pub use instrumentation::InstrumentationLayer;
use {
    crate::AlloyProvider,
    alloy::{
        network::EthereumWallet,
        providers::{Provider, ProviderBuilder},
        rpc::client::ClientBuilder,
        signers::local::PrivateKeySigner,
    },
    url::Url,
};

/// Creates a provider that talks to the node at `url` and signs every
/// transaction it sends with `signer`.
///
/// The provider fills in nonce, gas and chain ID for requests that leave them
/// unset.
pub fn provider_with_signer(url: &Url, label: &str, signer: PrivateKeySigner) -> AlloyProvider {
    let rpc = ClientBuilder::default()
        .layer(InstrumentationLayer::new(label))
        .http(url.clone());
    let wallet = EthereumWallet::new(signer);

    ProviderBuilder::new()
        .wallet(wallet)
        .connect_client(rpc)
        .erased()
}
