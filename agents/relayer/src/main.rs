//! The relayer mints teleports on the target domain without the receiver
//! paying gas there.
//!
//! For every source transaction hash given on the command line it waits for
//! an oracle quorum, quotes the bridge and relay fees, signs the receiver's
//! authorization and hands the `relay()` call to the relay network.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

mod relayer;
mod settings;

use eyre::{Result, WrapErr};
use prometheus::Registry;
use tokio_util::sync::CancellationToken;
use tracing::info;

use teleport_base::CoreMetrics;
use teleport_core::H256;

use crate::{relayer::Relayer, settings::RelayerSettings as Settings};

async fn _main() -> Result<()> {
    color_eyre::install()?;

    let settings = Settings::load()?;
    let metrics = CoreMetrics::new(Relayer::AGENT_NAME, Registry::new())?;
    settings.base.tracing.start_tracing(&metrics)?;

    let tx_hashes = std::env::args()
        .skip(1)
        .map(|arg| {
            arg.parse::<H256>()
                .wrap_err_with(|| format!("invalid transaction hash {arg}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let agent = Relayer::from_settings(&settings, &metrics)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping");
            on_signal.cancel();
        }
    });

    agent.run(tx_hashes, cancel).await
}

fn main() -> Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(_main())
}
