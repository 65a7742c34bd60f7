//! `reposync` command-line tool.
//!
//! - `reposync validate <file> --rules <json>`: run the validation engine on
//!   a workbook and print the result as JSON; exits with status 1 when the
//!   workbook fails.
//! - `reposync collection create|rules|list`: manage collections.
//! - `reposync upload <file> --collection <id> | --document <id>`: store a
//!   new document or a new version of one and print the outcome.
//! - `reposync checkout|checkin <document>`: take or release the lock.
//! - `reposync status|history <document>`, `reposync list <collection>`.
//! - `reposync config`: print the effective configuration.
//!
//! Vault commands open the database at `DATABASE_URL`, apply migrations and
//! store content under `STORAGE_PATH`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use reposync_core::rule_set::RuleSet;
use reposync_core::types::DbId;
use reposync_core::upload::validate_size;
use reposync_core::validation::ValidationEngine;
use reposync_db::models::collection::CreateCollection;
use reposync_events::{EventBus, EventLogger};
use reposync_storage::LocalStorage;
use reposync_vault::{DocumentService, VaultConfig};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// RepoSync - version-controlled spreadsheets with structural validation
#[derive(Parser, Debug)]
#[command(name = "reposync")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a workbook against a rule set
    Validate {
        /// Workbook to validate (.xlsx, .xlsm, .xls)
        file: PathBuf,

        #[command(flatten)]
        rules: RulesArgs,
    },

    /// Manage collections
    #[command(subcommand)]
    Collection(CollectionCommand),

    /// Upload a new document or a new version of one
    Upload {
        /// Workbook to upload
        file: PathBuf,

        /// Create a new document in this collection
        #[arg(long, required_unless_present = "document", conflicts_with = "document")]
        collection: Option<DbId>,

        /// Add a version to this document (requires the checkout)
        #[arg(long)]
        document: Option<DbId>,

        /// Commit message describing the change
        #[arg(short, long)]
        message: String,

        #[arg(long)]
        user: DbId,
    },

    /// Check a document out for editing
    Checkout {
        document: DbId,
        #[arg(long)]
        user: DbId,
    },

    /// Release a checkout
    Checkin {
        document: DbId,
        #[arg(long)]
        user: DbId,
    },

    /// Show a document's status and lock holder
    Status { document: DbId },

    /// Show a document's versions, newest first
    History { document: DbId },

    /// List the documents of a collection
    List { collection: DbId },

    /// Print the configuration loaded from the environment
    Config,
}

#[derive(Subcommand, Debug)]
enum CollectionCommand {
    /// Create a collection
    Create {
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        user: DbId,

        #[command(flatten)]
        rules: RulesArgs,
    },

    /// Replace a collection's rule set
    Rules {
        collection: DbId,

        #[arg(long)]
        user: DbId,

        #[command(flatten)]
        rules: RulesArgs,
    },

    /// List all collections
    List,
}

/// Rule set given inline or as a file; empty when neither is given.
#[derive(Args, Debug, Default)]
struct RulesArgs {
    /// Rule set as inline JSON
    #[arg(long, conflicts_with = "rules_file")]
    rules: Option<String>,

    /// Path to a JSON file holding the rule set
    #[arg(long)]
    rules_file: Option<PathBuf>,
}

impl RulesArgs {
    async fn json(&self) -> anyhow::Result<Option<String>> {
        match (&self.rules, &self.rules_file) {
            (Some(json), _) => Ok(Some(json.clone())),
            (None, Some(path)) => tokio::fs::read_to_string(path)
                .await
                .map(Some)
                .with_context(|| format!("Failed to read rules from {}", path.display())),
            (None, None) => Ok(None),
        }
    }

    async fn load(&self) -> anyhow::Result<RuleSet> {
        Ok(match self.json().await? {
            Some(json) => RuleSet::from_json_str(&json)?,
            None => RuleSet::default(),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reposync=info,reposync_vault=info,reposync_events=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = VaultConfig::from_env().context("Invalid configuration")?;

    match Cli::parse().command {
        Command::Validate { file, rules } => validate(&config, file, rules).await,
        Command::Config => {
            println!("database_url = {}", config.database_url);
            println!("storage_path = {}", config.storage_path.display());
            println!("max_file_size = {}", config.max_file_size);
            println!("allowed_extensions = {}", config.allowed_extensions.join(","));
            Ok(ExitCode::SUCCESS)
        }
        command => {
            let bus = Arc::new(EventBus::default());
            let logger = tokio::spawn(EventLogger::run(bus.subscribe()));

            let service = open_vault(config, Arc::clone(&bus)).await?;
            let code = run(&service, command).await;

            // Closing the bus lets the logger drain and exit.
            drop(service);
            drop(bus);
            if let Ok(logged) = logger.await {
                tracing::debug!(logged, "Event logger finished");
            }
            code
        }
    }
}

/// Connect, migrate and assemble the document service.
async fn open_vault(
    config: VaultConfig,
    bus: Arc<EventBus>,
) -> anyhow::Result<DocumentService<LocalStorage>> {
    if let Some(parent) = sqlite_file(&config.database_url).and_then(|p| p.parent().map(Path::to_path_buf)) {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(&parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let pool = reposync_db::create_pool(&config.database_url)
        .await
        .context("Failed to open database")?;
    tracing::info!("Database connection pool created");

    reposync_db::health_check(&pool)
        .await
        .context("Database health check failed")?;

    reposync_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let storage = Arc::new(LocalStorage::new(config.storage_path.clone()));
    Ok(DocumentService::new(pool, storage, bus, config))
}

/// File path of a `sqlite:` URL, `None` for in-memory databases.
fn sqlite_file(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

async fn run(service: &DocumentService<LocalStorage>, command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Collection(CollectionCommand::Create {
            name,
            description,
            user,
            rules,
        }) => {
            let input = CreateCollection {
                name,
                description,
                created_by: user,
                rules: Some(rules.load().await?),
            };
            print_json(&service.create_collection(&input).await?)?;
        }
        Command::Collection(CollectionCommand::Rules {
            collection,
            user,
            rules,
        }) => {
            let json = rules.json().await?.unwrap_or_else(|| "{}".to_string());
            let value: serde_json::Value =
                serde_json::from_str(&json).context("Rules are not valid JSON")?;
            print_json(&service.update_collection_rules(collection, user, &value).await?)?;
        }
        Command::Collection(CollectionCommand::List) => {
            print_json(&service.list_collections().await?)?;
        }
        Command::Upload {
            file,
            collection,
            document,
            message,
            user,
        } => {
            let filename = file
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("{} has no usable file name", file.display()))?
                .to_string();
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let outcome = match (document, collection) {
                (Some(document), _) => {
                    service
                        .upload_version(document, user, &filename, &message, content)
                        .await?
                }
                (None, Some(collection)) => {
                    service
                        .upload_new(collection, user, &filename, &message, content)
                        .await?
                }
                (None, None) => anyhow::bail!("Either --collection or --document is required"),
            };
            print_json(&outcome)?;
            if !outcome.validation.passed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Checkout { document, user } => {
            print_json(&service.checkout(document, user).await?)?;
        }
        Command::Checkin { document, user } => {
            print_json(&service.checkin(document, user).await?)?;
        }
        Command::Status { document } => {
            print_json(&service.summary(document).await?)?;
        }
        Command::History { document } => {
            print_json(&service.history(document).await?)?;
        }
        Command::List { collection } => {
            print_json(&service.list_documents(collection).await?)?;
        }
        Command::Validate { .. } | Command::Config => anyhow::bail!("Command does not use the vault"),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn validate(config: &VaultConfig, file: PathBuf, rules: RulesArgs) -> anyhow::Result<ExitCode> {
    let rules = rules.load().await?;

    let content = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    validate_size(content.len() as u64, config.max_file_size)?;

    tracing::info!(file = %file.display(), bytes = content.len(), "Validating workbook");
    let result = tokio::task::spawn_blocking(move || ValidationEngine::new().validate(&content, &rules))
        .await
        .context("Validation task failed")?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    if result.passed {
        Ok(ExitCode::SUCCESS)
    } else {
        tracing::warn!(errors = result.errors.len(), "Workbook failed validation");
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_validate_with_inline_rules() {
        let cli = Cli::try_parse_from([
            "reposync",
            "validate",
            "book.xlsx",
            "--rules",
            r#"{"required_sheets":["Data"]}"#,
        ])
        .unwrap();
        match cli.command {
            Command::Validate { file, rules } => {
                assert_eq!(file, PathBuf::from("book.xlsx"));
                assert!(rules.rules.is_some());
                assert!(rules.rules_file.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn inline_and_file_rules_conflict() {
        let result = Cli::try_parse_from([
            "reposync",
            "validate",
            "book.xlsx",
            "--rules",
            "{}",
            "--rules-file",
            "rules.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_upload_of_a_new_document() {
        let cli = Cli::try_parse_from([
            "reposync", "upload", "q3.xlsx", "--collection", "2", "-m", "Initial", "--user", "7",
        ])
        .unwrap();
        match cli.command {
            Command::Upload {
                collection,
                document,
                message,
                user,
                ..
            } => {
                assert_eq!(collection, Some(2));
                assert_eq!(document, None);
                assert_eq!(message, "Initial");
                assert_eq!(user, 7);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn upload_needs_exactly_one_target() {
        let neither = Cli::try_parse_from(["reposync", "upload", "a.xlsx", "-m", "x", "--user", "1"]);
        assert!(neither.is_err());

        let both = Cli::try_parse_from([
            "reposync", "upload", "a.xlsx", "--collection", "1", "--document", "2", "-m", "x", "--user", "1",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn parses_checkout_and_collection_rules() {
        let cli = Cli::try_parse_from(["reposync", "checkout", "5", "--user", "3"]).unwrap();
        assert!(matches!(cli.command, Command::Checkout { document: 5, user: 3 }));

        let cli = Cli::try_parse_from([
            "reposync", "collection", "rules", "4", "--user", "1", "--rules-file", "rules.json",
        ])
        .unwrap();
        match cli.command {
            Command::Collection(CollectionCommand::Rules { collection, rules, .. }) => {
                assert_eq!(collection, 4);
                assert_eq!(rules.rules_file, Some(PathBuf::from("rules.json")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn sqlite_urls_resolve_to_files() {
        assert_eq!(
            sqlite_file("sqlite://storage/reposync.db"),
            Some(PathBuf::from("storage/reposync.db"))
        );
        assert_eq!(
            sqlite_file("sqlite:data.db?mode=rwc"),
            Some(PathBuf::from("data.db"))
        );
        assert_eq!(sqlite_file("sqlite::memory:"), None);
        assert_eq!(sqlite_file("postgres://localhost/db"), None);
    }
}
