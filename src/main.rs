//! rdlc CLI - Research Data Lifecycle dashboard.

use clap::Parser;
use rdlc::cli::{Cli, Commands, StageCommands, SubstageCommands, ToolCommands};
use rdlc::commands::{self, Output};
use rdlc::config::{ConfigOverrides, OutputFormat, ResolvedConfig, resolve_config};
use rdlc::models::{NewTool, ToolUpdate};
use std::env;
use std::path::PathBuf;
use std::process;

fn main() {
    let cli = Cli::parse();

    let mut overrides = ConfigOverrides::new();
    if let Some(ref db) = cli.database {
        overrides = overrides.with_database(db.clone());
    }
    if let Some(ref level) = cli.log_level {
        overrides = overrides.with_log_level(level.clone());
    }
    if cli.human_readable {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }
    #[cfg(feature = "gui")]
    if let Some(Commands::Serve { port, host }) = &cli.command {
        if let Some(port) = *port {
            overrides = overrides.with_port(port);
        }
        if let Some(host) = host {
            overrides = overrides.with_host(host.clone());
        }
    }

    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = match resolve_config(cli.config.as_deref(), &cwd, &overrides) {
        Ok(config) => config,
        Err(e) => exit_with_error(&e, cli.human_readable),
    };
    let human = config.human();

    rdlc::logging::init(config.log_level());
    tracing::debug!(
        database = %config.database().display(),
        source = %config.database.source,
        "resolved configuration"
    );

    if let Err(e) = run_command(cli.command, &config, human) {
        exit_with_error(&e, human);
    }
}

fn run_command(
    command: Option<Commands>,
    config: &ResolvedConfig,
    human: bool,
) -> Result<(), rdlc::Error> {
    let db = config.database();

    match command {
        Some(Commands::Init { csv, force }) => {
            let result = commands::init(db, csv.as_deref(), force)?;
            output(&result, human);
        }

        Some(Commands::Import { csv, replace }) => {
            let result = commands::import(db, &csv, replace)?;
            output(&result, human);
        }

        Some(Commands::Status) | None => {
            let result = commands::status(db)?;
            output(&result, human);
        }

        Some(Commands::Stage { command }) => match command {
            StageCommands::List => {
                let result = commands::stage_list(db)?;
                output(&result, human);
            }
            StageCommands::Show { name } => {
                let result = commands::stage_show(db, &name)?;
                output(&result, human);
            }
        },

        Some(Commands::Graph { select }) => {
            let result = commands::graph(db, select.as_deref());
            output(&result, human);
        }

        Some(Commands::Substage { command }) => match command {
            SubstageCommands::List { stage } => {
                let result = commands::substage_list(db, stage.as_deref())?;
                output(&result, human);
            }
            SubstageCommands::Exemplars { id } => {
                let result = commands::exemplars(db, id)?;
                output(&result, human);
            }
        },

        Some(Commands::Tool { command }) => match command {
            ToolCommands::List { stage } => {
                let result = commands::tool_list(db, stage.as_deref())?;
                output(&result, human);
            }
            ToolCommands::Add {
                name,
                stage,
                description,
                link,
                provider,
            } => {
                let tool = NewTool {
                    name,
                    description,
                    link,
                    provider,
                    stage,
                };
                let result = commands::tool_add(db, tool)?;
                output(&result, human);
            }
            ToolCommands::Show { id } => {
                let result = commands::tool_show(db, id)?;
                output(&result, human);
            }
            ToolCommands::Update {
                id,
                name,
                stage,
                description,
                link,
                provider,
            } => {
                let update = ToolUpdate {
                    name,
                    description,
                    link,
                    provider,
                    stage,
                };
                let result = commands::tool_update(db, id, update)?;
                output(&result, human);
            }
            ToolCommands::Delete { id } => {
                let result = commands::tool_delete(db, id)?;
                output(&result, human);
            }
        },

        #[cfg(feature = "gui")]
        Some(Commands::Serve { .. }) => {
            run_gui(config)?;
        }
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

fn exit_with_error(e: &rdlc::Error, human: bool) -> ! {
    if human {
        eprintln!("Error: {}", e);
    } else {
        eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
    }
    process::exit(1);
}

/// Run the dashboard server
#[cfg(feature = "gui")]
fn run_gui(config: &ResolvedConfig) -> Result<(), rdlc::Error> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| rdlc::Error::Other(format!("Failed to create runtime: {}", e)))?
        .block_on(rdlc::gui::start_server(
            config.database(),
            config.host(),
            config.port(),
            config.title(),
        ))
}
