//! Acoustic Feature Pipeline - Main Entry Point

use anyhow::Context;
use clap::Parser;
use dataset::{accuracy, Classifier, NearestCentroid, PartitionKind};
use pipeline::{init_logging, load_recording, Pipeline, PipelineConfig};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "noise-pipeline", version, about = "Acoustic feature extraction and dataset preparation")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory receiving the partition matrices and normalization parameters
    #[arg(short, long, default_value = "out")]
    output: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    info!("=== Acoustic Feature Pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    let config = PipelineConfig::load(args.config.as_deref()).context("loading configuration")?;
    if config.recordings.is_empty() {
        anyhow::bail!("no recordings configured");
    }
    let pipeline = Pipeline::new(&config)?;

    let mut recordings = Vec::with_capacity(config.recordings.len());
    for source in &config.recordings {
        let recording = load_recording(source, pipeline.sanitizer())
            .with_context(|| format!("loading {}", source.path.display()))?;
        recordings.push(recording);
    }

    let output = pipeline.run(&recordings)?;

    fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    for kind in PartitionKind::ALL {
        let path = args.output.join(format!("{}.json", kind.as_str()));
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        output.prepared.matrix(kind).write_json(BufWriter::new(file))?;
        info!("Wrote {} rows to {}", output.prepared.matrix(kind).len(), path.display());
    }

    let params_path = args.output.join("normalization.bin");
    fs::write(&params_path, output.prepared.params.to_bytes()?)
        .with_context(|| format!("writing {}", params_path.display()))?;
    info!("Wrote normalization parameters to {}", params_path.display());

    // Baseline so a run can be sanity-checked without an external learner
    let mut baseline = NearestCentroid::new();
    baseline.fit(&output.prepared.train)?;
    for kind in [PartitionKind::Validation, PartitionKind::Test] {
        let matrix = output.prepared.matrix(kind);
        if matrix.is_empty() {
            warn!("{} partition is empty, no accuracy reported", kind);
            continue;
        }
        let predicted = baseline.predict(&matrix.rows)?;
        info!(
            "Nearest-centroid {} accuracy: {:.3} over {} rows",
            kind,
            accuracy(&predicted, &matrix.labels),
            matrix.len()
        );
    }

    Ok(())
}
