//! sparkify-etl binary.
//!
//! Reads `sparkify.toml` (or the path given with `--config`), then either
//! runs the full ETL into a partitioned parquet store or prints the warehouse
//! schema.
//!
//! ```text
//! sparkify-etl run --input data --output lake --report run.json
//! SPARKIFY_JOIN_POLICY=left sparkify-etl run
//! sparkify-etl schema --drop
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sparkify_etl::{Overrides, Pipeline, load_config, warehouse_ddl};
use sparkify_store_parquet::ParquetStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Sparkify star-schema ETL")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Rebuild every table from the input corpus.
  Run {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "sparkify.toml")]
    config: PathBuf,

    /// Input root holding `song_data/` and `log_data/`.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output root for the partitioned tables.
    #[arg(long)]
    output: Option<PathBuf>,

    /// What to do with plays that match no song or time row.
    #[arg(long, value_parser = ["inner", "left"])]
    join_policy: Option<String>,

    /// Write a JSON run report to this path.
    #[arg(long)]
    report: Option<PathBuf>,
  },

  /// Print warehouse DDL for the star schema.
  Schema {
    /// Print `DROP TABLE` statements instead.
    #[arg(long)]
    drop: bool,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  match Cli::parse().command {
    Command::Schema { drop } => {
      println!("{}", warehouse_ddl(drop));
      Ok(())
    }
    Command::Run { config, input, output, join_policy, report } => {
      let cfg = load_config(&config, Overrides {
        input_root: input,
        output_root: output,
        join_policy,
      })
      .context("failed to load configuration")?;

      if let Some(workers) = cfg.workers {
        rayon::ThreadPoolBuilder::new()
          .num_threads(workers)
          .build_global()
          .context("failed to size the worker pool")?;
      }

      let store = ParquetStore::open(&cfg.output_root)
        .await
        .with_context(|| format!("failed to open output root {:?}", cfg.output_root))?;

      let run_report = Pipeline::new(Arc::new(store), cfg)
        .run()
        .await
        .context("ETL run failed")?;

      if let Some(path) = report {
        run_report
          .write_json(&path)
          .with_context(|| format!("failed to write report to {path:?}"))?;
        tracing::info!(path = %path.display(), "wrote run report");
      }
      Ok(())
    }
  }
}
