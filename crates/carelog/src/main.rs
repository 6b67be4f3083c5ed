use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use records::LocalApi;
use serde_json::json;

use carelog::{App, Cli, Cmd, config, errors, logging};
use carelog::components::popups::form::registry;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    match args.cmd {
        Some(Cmd::Fields { entity, json }) => print_fields(&entity, json),
        Some(Cmd::Run) | None => run_tui().await,
    }
}

async fn run_tui() -> Result<()> {
    errors::init()?;
    config::ensure_data_and_config_dirs_exist()?;
    logging::init()?;

    let config = config::Config::new()?;
    let mut app = App::new(config, Arc::new(LocalApi::new()))?;
    app.run().await?;
    Ok(())
}

/// Print an entity's field configuration. An unknown entity prints nothing
/// and exits cleanly; callers degrade to "no fields", they don't crash.
fn print_fields(entity: &str, as_json: bool) -> Result<()> {
    let fields = registry::fields_for_tag(entity);
    if as_json {
        let rows: Vec<_> = fields
            .iter()
            .map(|f| {
                json!({
                    "name": f.name,
                    "label": f.label,
                    "kind": f.kind.tag(),
                    "required": f.required,
                    "span": f.resolved_span(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!(rows))?);
    } else {
        for f in &fields {
            println!(
                "{:<22} {:<12} span {:>2}{}",
                f.name,
                f.kind.tag(),
                f.resolved_span(),
                if f.required { "  required" } else { "" }
            );
        }
    }
    Ok(())
}
