// src/main.rs

use linkflow::engine::FlowState;
use linkflow::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("linkflow error: {err:?}");
            std::process::exit(1);
        }
    }
}

/// Returns whether the flow ended successfully.
async fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    let report = run(args).await?;
    Ok(report.is_none_or(|r| r.state == FlowState::Completed))
}
