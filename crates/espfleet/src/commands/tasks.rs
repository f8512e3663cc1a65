//! Supported task type listing.

use std::sync::Arc;

use tabled::Tabled;

use espfleet_core::{AppManifest, TaskTypeCatalog};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "Task type")]
    task: String,
}

pub fn handle(manifest: AppManifest, global: &GlobalOpts) -> Result<(), CliError> {
    let catalog = TaskTypeCatalog::new(Arc::new(manifest));

    let rendered = output::render_list(
        global.output,
        catalog.supported_tasks(),
        |t| TaskRow { task: t.clone() },
        Clone::clone,
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
