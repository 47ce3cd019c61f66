mod commands;
mod config;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;

use crate::commands::{
    cmd_check, cmd_food_add, cmd_food_list, cmd_history, cmd_limit_set, cmd_limit_show, cmd_log,
    cmd_login, cmd_logout, cmd_plan_create, cmd_plan_list, cmd_register, cmd_show, cmd_whoami,
};
use crate::config::Config;
use sugarwise_core::SugarService;

#[derive(Parser)]
#[command(
    name = "sugarwise",
    version,
    about = "A simple sugar intake tracker CLI",
    long_about = "Track daily sugar intake against a personal limit.\n\
                  Data stays on this machine."
)]
struct Cli {
    /// Log debug output to stderr (overridden by SUGARWISE_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in (local placeholder identity)
    Login {
        email: String,
        #[arg(long)]
        password: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a local user and sign in
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sign out
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the signed-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Browse and extend the food catalog
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Log today's intake from catalog foods
    Log {
        /// Food names or catalog ids
        foods: Vec<String>,
        /// Inline food not in the catalog, as NAME=GRAMS (repeatable)
        #[arg(long, value_name = "NAME=GRAMS")]
        custom: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show all entries, newest first
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single entry
    Show {
        /// Entry id (a unique prefix is enough)
        entry_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change the daily sugar limit
    Limit {
        #[command(subcommand)]
        command: LimitCommands,
    },
    /// Manage saved meal plans
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Check whether adding a food would cross the daily limit
    Check {
        /// Sugar already selected, in grams
        current_total: f64,
        /// Food name or catalog id
        food: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// List/search the food catalog
    List {
        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,
        /// Only foods marked healthy
        #[arg(long)]
        healthy_only: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a food to the catalog
    Add {
        name: String,
        /// Sugar per serving in grams
        #[arg(long)]
        sugar: f64,
        /// Mark the food as healthy
        #[arg(long)]
        healthy: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum LimitCommands {
    /// Show the daily limit
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the daily limit in grams
    Set {
        grams: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// List saved meal plans
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save a named meal plan (does not log anything)
    Create {
        name: String,
        /// Food names or catalog ids
        foods: Vec<String>,
        /// Inline food not in the catalog, as NAME=GRAMS (repeatable)
        #[arg(long, value_name = "NAME=GRAMS")]
        custom: Vec<String>,
        /// Keep foods that would exceed the limit without asking
        #[arg(short, long)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("SUGARWISE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.verbose)?;
    let config = Config::load()?;
    let mut svc = SugarService::open(&config.db_path)?;

    match cli.command {
        Commands::Login {
            email,
            password,
            json,
        } => cmd_login(&mut svc, &email, &password, json),
        Commands::Register {
            username,
            email,
            password,
            json,
        } => cmd_register(&mut svc, &username, &email, &password, json),
        Commands::Logout { json } => cmd_logout(&mut svc, json),
        Commands::Whoami { json } => cmd_whoami(&svc, json),
        Commands::Food { command } => match command {
            FoodCommands::List {
                search,
                healthy_only,
                json,
            } => cmd_food_list(&svc, search.as_deref(), healthy_only, json),
            FoodCommands::Add {
                name,
                sugar,
                healthy,
                json,
            } => cmd_food_add(&mut svc, &name, sugar, healthy, json),
        },
        Commands::Log {
            foods,
            custom,
            json,
        } => cmd_log(&mut svc, &foods, &custom, json),
        Commands::History { json } => cmd_history(&svc, json),
        Commands::Show { entry_id, json } => cmd_show(&svc, &entry_id, json),
        Commands::Limit { command } => match command {
            LimitCommands::Show { json } => cmd_limit_show(&svc, json),
            LimitCommands::Set { grams, json } => cmd_limit_set(&mut svc, grams, json),
        },
        Commands::Plan { command } => match command {
            PlanCommands::List { json } => cmd_plan_list(&svc, json),
            PlanCommands::Create {
                name,
                foods,
                custom,
                force,
                json,
            } => cmd_plan_create(&mut svc, &name, &foods, &custom, force, json),
        },
        Commands::Check {
            current_total,
            food,
            json,
        } => cmd_check(&svc, current_total, &food, json),
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let (api_key, new_api_key) = if no_auth {
                (None, false)
            } else {
                let (key, new) = config.load_or_create_api_key()?;
                (Some(key), new)
            };
            server::start_server(svc, port, &bind, api_key, new_api_key).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_log_with_custom_foods() {
        let cli = Cli::try_parse_from([
            "sugarwise",
            "log",
            "Apple",
            "Banana",
            "--custom",
            "Granola bar=12",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Log { foods, custom, json } => {
                assert_eq!(foods, vec!["Apple", "Banana"]);
                assert_eq!(custom, vec!["Granola bar=12"]);
                assert!(json);
            }
            _ => panic!("expected log"),
        }
    }

    #[test]
    fn test_parse_plan_create() {
        let cli = Cli::try_parse_from(["sugarwise", "-v", "plan", "create", "Lunch", "Apple"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Plan {
                command: PlanCommands::Create { .. }
            }
        ));
    }

    #[test]
    fn test_parse_limit_set_rejects_text() {
        assert!(Cli::try_parse_from(["sugarwise", "limit", "set", "lots"]).is_err());
    }
}
