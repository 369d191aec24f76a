//! CLI logic for the Schemata schema diagram tool.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use log::{info, warn};

use schemata::{CanvasBuilder, SchemataError, config::AppConfig, store::FileStore};

/// Run the Schemata CLI application
///
/// Loads the schema file, lays it out and writes the resulting SVG to the
/// output file. With `--persist-positions`, layout-computed positions are
/// written back to the schema file.
///
/// # Errors
///
/// Returns `SchemataError` for:
/// - Configuration loading errors
/// - Schema file I/O, parse and validation errors
/// - Positions the schema file rejected
/// - Rendering errors
pub fn run(args: &Args) -> Result<(), SchemataError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing schema"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        app_config = AppConfig::new(
            app_config.layout().clone().with_seed(seed),
            app_config.style().clone(),
        );
    }

    let store = FileStore::open(&args.input)?;
    let builder = CanvasBuilder::new(app_config);
    let mut canvas = builder.build(store)?;

    if args.persist_positions {
        let persisted = canvas.persist_layout_positions();
        let failures: Vec<String> = canvas
            .take_notifications()
            .iter()
            .map(|notification| notification.message().to_string())
            .collect();
        if !failures.is_empty() {
            warn!(failed = failures.len(); "Some positions were not saved");
            return Err(SchemataError::Unsaved(failures));
        }
        info!(persisted; "Layout positions saved to schema file");
    }

    builder.write_svg(&canvas, &args.output)?;

    info!(output_file = args.output; "SVG exported successfully");

    Ok(())
}
