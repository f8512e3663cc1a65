//! Capability catalog handlers.

use serde::Serialize;
use tabled::Tabled;

use espfleet_config::Config;
use espfleet_core::{AppManifest, CapabilityDescriptor, CapabilityRegistry};

use crate::cli::{CapabilitiesArgs, CapabilitiesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct CapabilityRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Get")]
    getable: String,
    #[tabled(rename = "Set")]
    setable: String,
    #[tabled(rename = "Range")]
    range: String,
}

/// A catalog entry as rendered: the id next to its descriptor.
#[derive(Serialize)]
struct CapabilityEntry<'a> {
    id: &'a str,
    #[serde(flatten)]
    descriptor: &'a CapabilityDescriptor,
}

fn range(d: &CapabilityDescriptor) -> String {
    match (d.min, d.max) {
        (None, None) => String::new(),
        (min, max) => format!(
            "{} .. {}",
            min.map_or_else(|| "-".into(), |v| v.to_string()),
            max.map_or_else(|| "-".into(), |v| v.to_string())
        ),
    }
}

fn detail(entry: &CapabilityEntry<'_>, language: &str) -> String {
    let d = entry.descriptor;
    [
        format!("ID:       {}", entry.id),
        format!("Title:    {}", d.title.resolve(language)),
        format!("Type:     {}", d.kind),
        format!("Getable:  {}", d.getable),
        format!("Setable:  {}", d.setable),
        format!("Min:      {}", d.min.map_or_else(|| "-".into(), |v| v.to_string())),
        format!("Max:      {}", d.max.map_or_else(|| "-".into(), |v| v.to_string())),
        format!("UI:       {}", d.ui_component.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    args: CapabilitiesArgs,
    cfg: &Config,
    manifest: &AppManifest,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let registry = CapabilityRegistry::with_builtin_baseline(&manifest.capabilities)?;
    let language = cfg.fleet.language.as_str();

    let rendered = match args.command {
        CapabilitiesCommand::List => {
            let color = output::should_color(global.color);
            let entries: Vec<CapabilityEntry<'_>> = registry
                .get_capabilities()
                .iter()
                .map(|(id, descriptor)| CapabilityEntry { id, descriptor })
                .collect();

            output::render_list(
                global.output,
                &entries,
                |e| CapabilityRow {
                    id: e.id.to_owned(),
                    title: e.descriptor.title.resolve(language),
                    kind: e.descriptor.kind.to_string(),
                    getable: output::flag(e.descriptor.getable, color),
                    setable: output::flag(e.descriptor.setable, color),
                    range: range(e.descriptor),
                },
                |e| e.id.to_owned(),
            )?
        }

        CapabilitiesCommand::Get { id } => {
            let descriptor = registry
                .get_capability(&id)
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "capability".into(),
                    identifier: id.clone(),
                    list_command: "capabilities list".into(),
                })?;
            let entry = CapabilityEntry {
                id: &id,
                descriptor,
            };

            output::render_single(
                global.output,
                &entry,
                |e| detail(e, language),
                |e| e.descriptor.title.resolve(language),
            )?
        }
    };

    output::print_output(&rendered, global.quiet);
    Ok(())
}
