//! Link command implementation.

use crate::cli::LinkArgs;
use crate::config::Config;
use crate::error::Result;
use crate::input::read_artifacts;
use crate::output::{write_json, Formatter};
use crate::pipeline::{build_index, Pipeline};

/// Execute the link command.
pub async fn execute_link(args: LinkArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut config = config.clone();
    if let Some(preset) = args.preset {
        config.apply_preset(preset);
    }

    let artifacts = read_artifacts(&args.artifacts)?;
    let index = build_index(&artifacts)?;
    let pipeline = Pipeline::new(config)?;
    let run = pipeline.link(&artifacts, &index).await?;

    write_json(&run.links, args.out.as_deref())?;

    formatter.emit(&formatter.link_summary(&run));
    if let Some(out) = &args.out {
        formatter.emit(&formatter.success(&format!(
            "Wrote {} links to {}",
            run.links.len(),
            out.display()
        )));
    }
    Ok(())
}
