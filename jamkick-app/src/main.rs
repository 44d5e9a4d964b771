use anyhow::Result;
use clap::Parser;
use cli::Cli;
use jamkick_common::observability::init_logging;
use jamkick_pager::Query;
use std::sync::Arc;
use terminal::TerminalView;

mod cli;
mod terminal;
mod wiring;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Config: file < env < command line
    let cfg = cli.load_config()?;
    let log_path = init_logging(wiring::log_config(&cfg.logging))?;
    tracing::debug!(log_path = %log_path.display(), "logging.ready");

    // 2) One fetcher, one terminal view
    let view = Arc::new(TerminalView::new(cli.raw));
    let fetcher = Arc::new(wiring::build_fetcher(&cfg, view.clone())?);

    // 3) ctrl-c aborts the running sequence
    let interrupt = {
        let fetcher = fetcher.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                fetcher.cancel();
            }
        })
    };

    let query = Query::new(cli.username, cli.location);
    let result = fetcher.start_search(query).await;
    interrupt.abort();

    let shown = view.render();
    if !shown.is_empty() {
        println!("{shown}");
    }

    let report = result?;
    tracing::info!(pages = report.pages, "jamkick.done");
    Ok(())
}
