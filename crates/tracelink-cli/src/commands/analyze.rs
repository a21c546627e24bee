//! Analyze command implementation.

use crate::cli::AnalyzeArgs;
use crate::config::Config;
use crate::error::Result;
use crate::input::{read_artifacts, read_links};
use crate::output::{write_json, Formatter};
use crate::pipeline::{build_index, Pipeline};

/// Execute the analyze command.
pub async fn execute_analyze(
    args: AnalyzeArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let artifacts = read_artifacts(&args.artifacts)?;
    let links = read_links(&args.links)?;
    let index = build_index(&artifacts)?;
    let pipeline = Pipeline::new(config.clone())?;
    let report = pipeline.analyze(&artifacts, &links, &index, args.explain).await?;

    write_json(&report, args.out.as_deref())?;

    formatter.emit(&formatter.analysis_summary(&report));
    if let Some(warning) = formatter.critical_warning(&report) {
        formatter.emit(&warning);
    }
    if let Some(out) = &args.out {
        formatter.emit(&formatter.success(&format!("Wrote report to {}", out.display())));
    }
    Ok(())
}
