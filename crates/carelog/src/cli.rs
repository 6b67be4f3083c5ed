// src/cli.rs
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "carelog", version, about = "Personal medical-records terminal client")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Run the interactive TUI (the default)
    Run,
    /// Print the field configuration for an entity kind
    Fields {
        /// Entity kind in snake_case, e.g. medication, lab_result
        entity: String,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}
