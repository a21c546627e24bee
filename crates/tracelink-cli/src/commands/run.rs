//! Run command implementation: decompose, link, then analyze.

use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::Result;
use crate::input::read_artifacts;
use crate::output::{write_json, Formatter};
use crate::pipeline::{build_index, Pipeline};

/// Execute the run command.
pub async fn execute_run(args: RunArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut config = config.clone();
    if let Some(preset) = args.preset {
        config.apply_preset(preset);
    }

    let mut artifacts = read_artifacts(&args.artifacts)?;
    let pipeline = Pipeline::new(config)?;

    let decomposition = pipeline.decompose(&mut artifacts).await?;
    formatter.emit(&formatter.decomposition_summary(&decomposition));
    if let Some(artifacts_out) = &args.artifacts_out {
        write_json(&artifacts, Some(artifacts_out))?;
        formatter.emit(&formatter.success(&format!(
            "Wrote {} artifacts to {}",
            artifacts.len(),
            artifacts_out.display()
        )));
    }

    let index = build_index(&artifacts)?;
    let mut run = pipeline.link(&artifacts, &index).await?;
    run.api_calls.merge(&decomposition.api_calls);
    formatter.emit("");
    formatter.emit(&formatter.link_summary(&run));
    if let Some(links_out) = &args.links_out {
        write_json(&run.links, Some(links_out))?;
        formatter.emit(&formatter.success(&format!(
            "Wrote {} links to {}",
            run.links.len(),
            links_out.display()
        )));
    }

    let report = pipeline
        .analyze(&artifacts, &run.links, &index, args.explain)
        .await?;
    write_json(&report, args.out.as_deref())?;

    formatter.emit("");
    formatter.emit(&formatter.analysis_summary(&report));
    if let Some(warning) = formatter.critical_warning(&report) {
        formatter.emit(&warning);
    }
    if let Some(out) = &args.out {
        formatter.emit(&formatter.success(&format!("Wrote report to {}", out.display())));
    }
    Ok(())
}
