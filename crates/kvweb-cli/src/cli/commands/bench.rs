//! `kvweb bench <pdb>...`: parameter sweep with timing statistics.

use anyhow::Result;
use clap::Args;
use kvweb_core::bench::{BatchOptions, BatchRunner, BatchSummary, PdbAtomCounter, StatsFile, Sweep};
use kvweb_core::context::KvContext;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::SettingsArgs;

#[derive(Debug, Args)]
pub struct BenchArgs {
    /// Structure files (PDB).
    #[arg(required = true)]
    pub pdbs: Vec<PathBuf>,
    /// Results go to <OUTPUT_DIR>/<ID>/.
    #[arg(long, value_name = "DIR", default_value = "results")]
    pub output_dir: PathBuf,
    /// Tab-separated statistics file (appended).
    #[arg(long, value_name = "FILE", default_value = "results/time-statistics.txt")]
    pub stats: PathBuf,
    /// Number of server workers, recorded in every row.
    #[arg(long, value_name = "N", default_value = "1")]
    pub workers: u32,
    /// Probe Out values to sweep (comma separated).
    #[arg(long = "sweep-probe-out", value_name = "Å,...", value_delimiter = ',')]
    pub sweep_probe_out: Vec<f64>,
    /// Removal distance values to sweep (comma separated).
    #[arg(long = "sweep-removal-distance", value_name = "Å,...", value_delimiter = ',')]
    pub sweep_removal_distance: Vec<f64>,
    /// Submit each structure once with the given settings instead of sweeping.
    #[arg(long, conflicts_with_all = ["sweep_probe_out", "sweep_removal_distance"])]
    pub single: bool,
    #[command(flatten)]
    pub settings: SettingsArgs,
}

impl BenchArgs {
    pub fn sweep(&self) -> Sweep {
        if self.single {
            Sweep::single()
        } else if self.sweep_probe_out.is_empty() && self.sweep_removal_distance.is_empty() {
            Sweep::default()
        } else {
            Sweep::from_axes(&self.sweep_probe_out, &self.sweep_removal_distance)
        }
    }
}

fn print_summary(s: &BatchSummary, stats: &StatsFile) {
    println!("  Submitted:        {}", s.submitted);
    println!("  Submit failures:  {}", s.submit_failed);
    println!("  Already finished: {}", s.already_finished);
    println!("  Exported:         {}", s.exported);
    println!("  Export failures:  {}", s.export_failed);
    println!("  Lost:             {}", s.lost);
    println!("  Poll cycles:      {}", s.cycles);
    println!("  {} row(s) appended to {}", s.rows_written, stats.path().display());
}

pub async fn run_bench(ctx: &KvContext, args: BenchArgs) -> Result<()> {
    let sweep = args.sweep();
    let stats = StatsFile::open(&args.stats)?;
    let options = BatchOptions {
        output_directory: args.output_dir.clone(),
        base_settings: args.settings.to_settings(false)?,
        n_workers: args.workers,
        poll: ctx.config().poll_config(),
    };
    let runner = BatchRunner::new(
        ctx.submitter().clone(),
        ctx.exporter().clone(),
        Arc::new(PdbAtomCounter),
        stats.clone(),
        options,
    );
    println!(
        "Running {} structure(s) x {} sweep point(s)",
        args.pdbs.len(),
        sweep.len()
    );
    let summary = runner.run(&args.pdbs, &sweep).await?;
    print_summary(&summary, &stats);
    Ok(())
}
