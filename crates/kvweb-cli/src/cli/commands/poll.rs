//! `kvweb poll`: poll the server and export finished jobs.

use anyhow::{Context, Result};
use kvweb_core::context::KvContext;
use kvweb_core::poller::{CycleReport, PollOutcome};

fn print_report(report: &CycleReport) {
    if let Some(err) = &report.list_error {
        println!("cannot read job store: {}", err);
        return;
    }
    for entry in &report.entries {
        let line = match &entry.outcome {
            PollOutcome::StillPending(status) => format!("{}", status),
            PollOutcome::Exported { job, artifacts, .. } => {
                format!("{}, results in {}", job.status(), artifacts.directory.display())
            }
            PollOutcome::ExportFailed(e) => format!("export failed: {}", e),
            PollOutcome::Failed => "failed on server, dropped".to_string(),
            PollOutcome::Vanished => "unknown to server, dropped".to_string(),
            PollOutcome::Unreachable(e) => format!("server unreachable ({})", e),
            PollOutcome::Skipped(e) => format!("skipped: {}", e),
        };
        println!("{:<22} {}", entry.id, line);
    }
}

pub async fn run_poll(ctx: &KvContext, once: bool, until_idle: Option<u32>) -> Result<()> {
    let mut config = ctx.config().poll_config();
    if once {
        let report = ctx.poller(config).poll_once().await;
        if report.is_idle() {
            println!("No pending jobs.");
        }
        print_report(&report);
        return Ok(());
    }

    if until_idle.is_some() {
        config.idle_cycles_to_stop = until_idle;
    }
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = ctx.poller(config).spawn(Some(tx));

    loop {
        tokio::select! {
            report = rx.recv() => match report {
                Some(report) => print_report(&report),
                // Poller finished on its own (idle limit reached).
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!("Stopping after the current request...");
                handle.stop();
                break;
            }
        }
    }
    let cycles = handle.join().await.context("poller task join")?;
    tracing::info!(cycles, "poll finished");
    Ok(())
}
