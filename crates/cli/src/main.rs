//! gpoctl - Group Policy Object retrieval from the command line

mod logging;
mod output;
mod settings;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};

use gpoctl_core::application::{
    ExecutionMode, RetrievalEngine, RetrievalOutcome, RetrievalRequest,
};
use gpoctl_core::domain::{Credential, PolicyReport};
use gpoctl_core::port::{RemoteTarget, SecretStore};
use gpoctl_infra_system::{
    KeyringSecretStore, PowerShellDirectory, PowerShellRemoting, ScriptRunner,
};

use output::OutputFormat;
use settings::Settings;

#[derive(Parser)]
#[command(name = "gpoctl")]
#[command(about = "Retrieve Group Policy Objects locally or over PowerShell remoting", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Extra configuration file, layered over the user gpoctl.toml
    #[arg(long, global = true, env = "GPOCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args)]
struct Selection {
    /// GPO display names; `*` and `?` are wildcards. Omit for every GPO.
    names: Vec<String>,

    /// Domain to query (defaults to default_domain, then the current domain)
    #[arg(short, long)]
    domain: Option<String>,

    /// Run the query on this host through PowerShell remoting
    #[arg(short, long)]
    computer: Option<String>,

    /// Stored credential to use with --computer
    #[arg(long, requires = "computer")]
    credential: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List GPOs matching the given names
    Get {
        #[command(flatten)]
        selection: Selection,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Summarize GPOs matching the given names
    Report {
        #[command(flatten)]
        selection: Selection,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Manage stored credentials for remote hosts
    Credential {
        #[command(subcommand)]
        action: CredentialAction,
    },
}

#[derive(Subcommand)]
enum CredentialAction {
    /// Store a credential (password from --password, the environment, or stdin)
    Set {
        name: String,

        #[arg(short, long)]
        username: String,

        #[arg(long, env = "GPOCTL_CREDENTIAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Show the username stored under a name
    Get { name: String },

    /// List stored credential names
    List,

    /// Delete a stored credential
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;
    let _log_guard = logging::init(settings.log_format, settings.log_dir.as_deref(), cli.verbose);
    debug!(version = gpoctl_core::VERSION, "gpoctl starting");

    match cli.command {
        Commands::Get { selection, format } => {
            let outcome = retrieve(&settings, selection).await?;
            output::print_outcome(&outcome, format)?;
            Ok(exit_code(&outcome))
        }

        Commands::Report { selection, format } => {
            let outcome = retrieve(&settings, selection).await?;
            let report = PolicyReport::from_records(&outcome.records);
            output::print_report(&report, &outcome.errors, format)?;
            Ok(exit_code(&outcome))
        }

        Commands::Credential { action } => {
            let store = secret_store(&settings);
            run_credential(&store, action).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(outcome: &RetrievalOutcome) -> ExitCode {
    if outcome.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn secret_store(settings: &Settings) -> KeyringSecretStore {
    KeyringSecretStore::new(settings.keyring_service.as_str())
}

async fn retrieve(settings: &Settings, selection: Selection) -> Result<RetrievalOutcome> {
    let runner = ScriptRunner::powershell(&settings.powershell_path, settings.timeout());
    let engine = RetrievalEngine::new(
        Arc::new(PowerShellDirectory::new(runner.clone())),
        Arc::new(PowerShellRemoting::new(runner)),
    );

    let mode = match selection.computer {
        Some(host) => {
            let mut target = RemoteTarget::new(host);
            if let Some(name) = &selection.credential {
                let credential = secret_store(settings)
                    .get(name)
                    .await?
                    .with_context(|| format!("No stored credential named '{}'", name))?;
                target = target.with_credential(credential);
            }
            ExecutionMode::Remote(target)
        }
        None => ExecutionMode::Local,
    };

    let request = RetrievalRequest {
        selectors: selection.names,
        domain: selection.domain.or_else(|| settings.default_domain.clone()),
        mode,
    };
    info!(mode = %request.mode, selectors = request.selectors.len(), "Retrieving GPOs");

    engine.retrieve(request).await.map_err(|e| {
        let code = e.code();
        anyhow::Error::new(e).context(format!("GPO retrieval failed ({})", code))
    })
}

async fn run_credential(store: &impl SecretStore, action: CredentialAction) -> Result<()> {
    match action {
        CredentialAction::Set {
            name,
            username,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => read_password_line()?,
            };
            store
                .put(&name, &Credential::new(username, password))
                .await
                .context("Failed to store credential")?;
            println!("{}", format!("✓ Credential '{}' stored", name).green().bold());
        }

        CredentialAction::Get { name } => match store.get(&name).await? {
            Some(credential) => {
                println!("  {} {}", "Name:".bold(), name);
                println!("  {} {}", "Username:".bold(), credential.username);
            }
            None => anyhow::bail!("No stored credential named '{}'", name),
        },

        CredentialAction::List => {
            let names = store.list().await?;
            if names.is_empty() {
                println!("{}", "No stored credentials".yellow());
            }
            for name in names {
                println!("{}", name);
            }
        }

        CredentialAction::Remove { name } => {
            if store.delete(&name).await? {
                println!("{}", format!("✓ Credential '{}' removed", name).green().bold());
            } else {
                anyhow::bail!("No stored credential named '{}'", name);
            }
        }
    }
    Ok(())
}

fn read_password_line() -> Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Empty password; pass --password or pipe it on stdin");
    }
    Ok(password)
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
    fn test_parse_remote_get() {
        let cli = Cli::try_parse_from([
            "gpoctl", "get", "PROD-*", "GPO-1", "--computer", "dc01", "--credential", "dc01-admin",
            "--format", "json",
        ])
        .unwrap();

        match cli.command {
            Commands::Get { selection, format } => {
                assert_eq!(selection.names, vec!["PROD-*", "GPO-1"]);
                assert_eq!(selection.computer.as_deref(), Some("dc01"));
                assert_eq!(selection.credential.as_deref(), Some("dc01-admin"));
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected get"),
        }
    }

    #[test]
    fn test_credential_requires_computer() {
        let result = Cli::try_parse_from(["gpoctl", "get", "--credential", "dc01-admin"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_exit_code_reflects_item_errors() {
        let clean = RetrievalOutcome::default();
        assert_eq!(exit_code(&clean), ExitCode::SUCCESS);

        let mut dirty = RetrievalOutcome::default();
        dirty.errors.push(gpoctl_core::application::RetrievalError::IdentityNotFound {
            selector: "X".to_string(),
        });
        assert_eq!(exit_code(&dirty), ExitCode::FAILURE);
    }
}
