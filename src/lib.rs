// src/lib.rs

pub mod behavior;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod expr;
pub mod flow;
pub mod logging;
pub mod model;

use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{FlowFile, load_and_validate};
use crate::engine::{CoreRuntime, FlowReport, Runtime, RuntimeEvent};
use crate::exec::RealExecutorBackend;
use crate::flow::FlowGraph;

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the flow, then runs one instance of it to a final
/// state. Returns `None` for `--dry-run`.
pub async fn run(args: CliArgs) -> Result<Option<FlowReport>> {
    let flow_path = PathBuf::from(&args.flow);
    let flow = load_and_validate(&flow_path)?;

    if args.dry_run {
        print_dry_run(&flow);
        return Ok(None);
    }

    let graph = FlowGraph::from_flow(&flow);
    info!(
        flow = %graph.name(),
        tasks = graph.tasks().count(),
        links = graph.links().len(),
        "flow loaded"
    );

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = RealExecutorBackend::new(rt_tx.clone());

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let core = CoreRuntime::new(graph);
    let runtime = Runtime::new(core, rt_rx, rt_tx, executor);
    let report = runtime.run().await?;

    print_report(&report);
    Ok(Some(report))
}

/// Print the final status of every task.
fn print_report(report: &FlowReport) {
    println!("flow '{}' {}", report.flow, report.state);
    for (task, status) in &report.tasks {
        println!("  {task}: {status}");
    }
}

/// Simple dry-run output: print tasks, links and repeat policies.
fn print_dry_run(flow: &FlowFile) {
    println!("linkflow dry-run: {}", flow.flow.name);
    println!();

    println!("tasks ({}):", flow.task.len());
    for (name, task) in &flow.task {
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
        if !task.retriable_exit_codes.is_empty() {
            println!("      retriable_exit_codes: {:?}", task.retriable_exit_codes);
        }
        if let Some(ref expect) = task.expect_stdout {
            println!("      expect_stdout: {expect}");
        }
        if let Some(ref r) = task.repeat_on_error {
            println!("      repeat_on_error: count={} interval_ms={}", r.count, r.interval_ms);
        }
        if let Some(ref r) = task.repeat_while {
            println!(
                "      repeat_while: condition={:?} count={} interval_ms={}",
                r.condition, r.count, r.interval_ms
            );
        }
    }

    println!();
    println!("links ({}):", flow.link.len());
    for link in &flow.link {
        match link.condition {
            Some(ref c) => println!("  - {} -> {} [{}: {c}]", link.from, link.to, link.link_type),
            None => println!("  - {} -> {} [{}]", link.from, link.to, link.link_type),
        }
    }

    debug!("dry-run complete (no execution)");
}
