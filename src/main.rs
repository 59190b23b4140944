use std::sync::Arc;

use porter::bootstrap;
use porter::config::Config;
use porter::server;
use porter::site::Site;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    bootstrap::check_interpreter(&cfg);
    bootstrap::prepare_document_root(&cfg)?;

    let site = Arc::new(Site::new(&cfg)?);

    tokio::select! {
        res = server::listener::run(&cfg, site) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
