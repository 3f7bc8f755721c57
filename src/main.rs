use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use ormherit::config::{CliConfig, OrmConfig};
use ormherit::model_catalog::{ModelFileConfig, ModelRegistry, OrderingTerm};
use ormherit::sql_generator::{migration_sql, select_by_pk_sql, select_sql};
use ormherit::storage::{migrate, MemoryEngine};

/// ormherit - inspect and migrate inheritance-mapped models
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML model file (overrides ORMHERIT_MODELS_PATH)
    #[arg(long, global = true)]
    models: Option<String>,

    /// Table-name prefix (overrides ORMHERIT_APP_LABEL)
    #[arg(long, global = true)]
    app_label: Option<String>,

    /// YAML configuration file used instead of environment variables
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the CREATE TABLE statements for every model
    Migrate {
        /// Emit plain CREATE TABLE (no IF NOT EXISTS)
        #[arg(long)]
        strict: bool,
    },
    /// Print the query plan and SELECT for one model
    Plan {
        model: String,
        /// Comma-separated ordering, e.g. `-created,title`
        #[arg(long, value_delimiter = ',')]
        order_by: Vec<String>,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// List models with their strategy, state and storage tables
    Inspect {
        #[arg(long)]
        json: bool,
    },
}

impl From<&Cli> for CliConfig {
    fn from(cli: &Cli) -> Self {
        CliConfig {
            app_label: cli.app_label.clone(),
            models_path: cli.models.clone(),
            strict_create: matches!(cli.command, Command::Migrate { strict: true }),
        }
    }
}

fn load_registry(config: &OrmConfig) -> anyhow::Result<ModelRegistry> {
    let Some(path) = config.models_path.as_deref() else {
        bail!("no model file given (use --models or set ORMHERIT_MODELS_PATH)");
    };
    let file = ModelFileConfig::from_yaml_file(path)
        .with_context(|| format!("loading models from {}", path))?;
    Ok(file.to_registry(&config.app_label)?)
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize logger - defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => OrmConfig::from_yaml_file(path)?,
        None => OrmConfig::from_env()?,
    };
    let config = OrmConfig::from_cli(CliConfig::from(&cli), &base)?;
    let mut registry = load_registry(&config)?;

    match cli.command {
        Command::Migrate { .. } => {
            let mut engine = MemoryEngine::new();
            let tables = migrate(&mut registry, &mut engine)?;
            println!("{}", migration_sql(&tables, config.ddl_if_not_exists)?);
        }
        Command::Plan {
            model,
            order_by,
            json,
        } => {
            let ordering: Vec<OrderingTerm> =
                order_by.iter().map(|t| OrderingTerm::parse(t)).collect();
            let plan = registry.resolve_query_plan(
                &model,
                (!ordering.is_empty()).then_some(ordering.as_slice()),
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                println!("-- tables: {}", plan.table_names().join(", "));
                println!("{}\n", select_sql(&plan)?);
                println!("{}", select_by_pk_sql(&plan)?);
            }
        }
        Command::Inspect { json } => {
            let mut engine = MemoryEngine::new();
            migrate(&mut registry, &mut engine)?;
            let mut models = Vec::new();
            for name in registry.model_names() {
                let resolved = registry.resolved(name)?;
                models.push(serde_json::json!({
                    "name": name,
                    "strategy": resolved.strategy,
                    "abstract": resolved.is_abstract,
                    "state": registry.state(name)?,
                    "table": resolved.table.as_ref().map(|t| t.name.as_str()),
                    "storage": resolved.storage,
                    "ordering": resolved.ordering,
                }));
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&models)?);
            } else {
                for m in &models {
                    println!(
                        "{:<16} {:<15} {:<11} {}",
                        m["name"].as_str().unwrap_or_default(),
                        m["strategy"].as_str().unwrap_or_default(),
                        m["state"].as_str().unwrap_or_default(),
                        m["table"].as_str().unwrap_or("-")
                    );
                }
            }
        }
    }
    Ok(())
}
