use anyhow::Result;
use replwatch_core::store::default_connector;
use replwatch_core::{Report, run_check};
use tracing::info;

use crate::cli::Cli;
use crate::config::Config;

/// Load configuration and run one check on a single-threaded runtime
pub fn run(cli: &Cli) -> Result<Report> {
    let cfg = Config::load(cli.config.as_deref())?;
    let request = cfg.check_request(cli);
    let connector = default_connector(cfg.connect_options());

    info!(
        replica = %request.replica,
        warning = request.thresholds.warning,
        critical = request.thresholds.critical,
        "starting replication check"
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    Ok(rt.block_on(run_check(connector.as_ref(), &request)))
}
