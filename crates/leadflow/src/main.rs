// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Leadflow - a qualification funnel and flow automation bot.
//!
//! This is the binary entry point for the Leadflow bot.

use clap::{Parser, Subcommand};

mod adapters;
mod admin;
mod serve;
mod status;

/// Leadflow - a qualification funnel and flow automation bot.
#[derive(Parser, Debug)]
#[command(name = "leadflow", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Leadflow bot server.
    Serve,
    /// Show storage health and row counts.
    Status {
        /// Emit structured JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// List sessions currently in human handoff.
    Handoffs,
    /// Reset a handed-off session back to the welcome state.
    ResetHandoff {
        /// Customer identifier (phone number).
        customer_id: String,
    },
    /// Set a lead's status and fire matching automation flows.
    SetStatus {
        /// Customer identifier (phone number).
        customer_id: String,
        /// The new lead status.
        status: String,
    },
    /// Inspect and control flow executions.
    Executions {
        #[command(subcommand)]
        action: ExecutionCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ExecutionCommands {
    /// List executions for a customer.
    List { customer_id: String },
    /// Pause an active execution.
    Pause { id: String },
    /// Resume a paused execution.
    Resume { id: String },
    /// Cancel an active execution.
    Cancel { id: String },
}

impl From<ExecutionCommands> for admin::ExecutionAction {
    fn from(cmd: ExecutionCommands) -> Self {
        match cmd {
            ExecutionCommands::List { customer_id } => admin::ExecutionAction::List { customer_id },
            ExecutionCommands::Pause { id } => admin::ExecutionAction::Pause { id },
            ExecutionCommands::Resume { id } => admin::ExecutionAction::Resume { id },
            ExecutionCommands::Cancel { id } => admin::ExecutionAction::Cancel { id },
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match leadflow_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            leadflow_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json }) => status::run_status(&config, json).await,
        Some(Commands::Handoffs) => admin::run_handoffs(&config).await,
        Some(Commands::ResetHandoff { customer_id }) => {
            admin::run_reset_handoff(&config, &customer_id).await
        }
        Some(Commands::SetStatus {
            customer_id,
            status,
        }) => admin::run_set_status(&config, &customer_id, &status).await,
        Some(Commands::Executions { action }) => {
            admin::run_executions(&config, action.into()).await
        }
        None => {
            println!("leadflow: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
