//! Decompose command implementation.

use crate::cli::DecomposeArgs;
use crate::config::Config;
use crate::error::Result;
use crate::input::read_artifacts;
use crate::output::{write_json, Formatter};
use crate::pipeline::Pipeline;

/// Execute the decompose command.
pub async fn execute_decompose(
    args: DecomposeArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let mut artifacts = read_artifacts(&args.artifacts)?;
    let pipeline = Pipeline::new(config.clone())?;
    let run = pipeline.decompose(&mut artifacts).await?;

    write_json(&artifacts, args.out.as_deref())?;

    formatter.emit(&formatter.decomposition_summary(&run));
    if let Some(out) = &args.out {
        formatter.emit(&formatter.success(&format!(
            "Wrote {} artifacts to {}",
            artifacts.len(),
            out.display()
        )));
    }
    Ok(())
}
