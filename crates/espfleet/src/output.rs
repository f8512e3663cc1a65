//! `--output` rendering.
//!
//! Tables for people, JSON for tools, and a plain mode that prints one
//! value per line for shell pipelines.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color ────────────────────────────────────────────────────────────

/// `auto` colors only an interactive stdout, and honours `NO_COLOR`.
pub fn should_color(mode: ColorMode) -> bool {
    mode == ColorMode::Always
        || (mode == ColorMode::Auto
            && std::env::var_os("NO_COLOR").is_none()
            && io::stdout().is_terminal())
}

/// Render a yes/no flag, green or dimmed when color is on.
pub fn flag(value: bool, color: bool) -> String {
    match (value, color) {
        (true, true) => "yes".green().to_string(),
        (false, true) => "no".dimmed().to_string(),
        (true, false) => "yes".into(),
        (false, false) => "no".into(),
    }
}

/// Highlight a status word when color is on.
pub fn status(text: &str, ok: bool, color: bool) -> String {
    match (ok, color) {
        (true, true) => text.green().bold().to_string(),
        (false, true) => text.yellow().to_string(),
        (_, false) => text.to_owned(),
    }
}

// ── Rendering ────────────────────────────────────────────────────────

/// A collection: `to_row` feeds the table, `plain_fn` gives each line of
/// plain output, JSON serializes `items` as they are.
pub fn render_list<T, R>(
    format: OutputFormat,
    items: &[T],
    to_row: impl Fn(&T) -> R,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    if let Some(json) = structured(format, items)? {
        return Ok(json);
    }
    Ok(if format == OutputFormat::Table {
        Table::new(items.iter().map(to_row))
            .with(Style::rounded())
            .to_string()
    } else {
        items.iter().map(plain_fn).collect::<Vec<_>>().join("\n")
    })
}

/// One item: `detail_fn` renders the human view, `plain_fn` the
/// scripting view.
pub fn render_single<T>(
    format: OutputFormat,
    item: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    if let Some(json) = structured(format, item)? {
        return Ok(json);
    }
    Ok(if format == OutputFormat::Table {
        detail_fn(item)
    } else {
        plain_fn(item)
    })
}

/// JSON rendering, or `None` for the human formats.
fn structured<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<Option<String>, CliError> {
    Ok(match format {
        OutputFormat::Json => Some(serde_json::to_string_pretty(data)?),
        OutputFormat::JsonCompact => Some(serde_json::to_string(data)?),
        OutputFormat::Table | OutputFormat::Plain => None,
    })
}

/// Write to stdout unless `--quiet`. Empty output prints nothing.
pub fn print_output(rendered: &str, quiet: bool) {
    if quiet || rendered.is_empty() {
        return;
    }
    let _ = writeln!(io::stdout().lock(), "{rendered}");
}
