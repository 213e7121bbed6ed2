// crates/client-records-cli/src/main.rs
// ============================================================================
// Module: Client Records CLI Entry Point
// Description: Command dispatcher for the record service and form client.
// Purpose: Serve the Record Service, validate config, and drive the form flow.
// Dependencies: clap, client-records-config, client-records-server, tokio.
// ============================================================================

//! ## Overview
//! `client-records` runs the Record Service (`serve`), checks configuration
//! (`config validate`), and performs the form client's two interactions from
//! the terminal: pulling the directory and submitting a meeting outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use client_records_cli::ClientSelector;
use client_records_cli::DEFAULT_TIMEOUT;
use client_records_cli::DirectoryClient;
use client_records_cli::OutcomeSubmission;
use client_records_cli::WebhookClient;
use client_records_cli::resolve_client;
use client_records_config::ClientRecordsConfig;
use client_records_core::Timestamp;
use client_records_server::RecordService;
use client_records_server::init_logging;
use thiserror::Error;
use tracing::info;

// ============================================================================
// SECTION: CLI Definitions
// ============================================================================

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(name = "client-records", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to `CLIENT_RECORDS_CONFIG` or
    /// `client-records.toml`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Command to run.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the Record Service until SIGINT or SIGTERM.
    Serve,
    /// Configuration utilities.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Client directory utilities.
    Directory {
        /// Directory subcommand.
        #[command(subcommand)]
        command: DirectoryCommand,
    },
    /// Meeting outcome utilities.
    Outcome {
        /// Outcome subcommand.
        #[command(subcommand)]
        command: OutcomeCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Parse and validate the configuration.
    Validate,
}

/// Directory subcommands.
#[derive(Subcommand, Debug)]
enum DirectoryCommand {
    /// Fetch the directory and print it as JSON.
    Pull(ServiceArgs),
}

/// Outcome subcommands.
#[derive(Subcommand, Debug)]
enum OutcomeCommand {
    /// Submit a meeting outcome for a directory client.
    Submit(SubmitArgs),
}

/// Record service location override.
#[derive(Args, Debug)]
struct ServiceArgs {
    /// Record service base URL (overrides `form.service_url`).
    #[arg(long, value_name = "URL")]
    url: Option<String>,
}

/// Outcome submission arguments.
#[derive(Args, Debug)]
struct SubmitArgs {
    /// Record service location.
    #[command(flatten)]
    service: ServiceArgs,
    /// Directory key derived from the client's name (e.g. `johnsmith`).
    #[arg(long, value_name = "KEY", conflicts_with = "client_id", required_unless_present = "client_id")]
    client: Option<String>,
    /// Business identifier (e.g. `TB-001`).
    #[arg(long = "client-id", value_name = "ID")]
    client_id: Option<String>,
    /// Meeting outcome.
    #[arg(long, value_name = "TEXT")]
    outcome: String,
    /// Free-text meeting notes.
    #[arg(long, value_name = "TEXT", default_value = "")]
    details: String,
    /// Webhook URL (overrides `form.webhook_url`).
    #[arg(long, value_name = "URL")]
    webhook: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = ClientRecordsConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    match cli.command {
        Commands::Serve => command_serve(config).await,
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(),
        Commands::Directory {
            command: DirectoryCommand::Pull(args),
        } => command_directory_pull(&config, &args).await,
        Commands::Outcome {
            command: OutcomeCommand::Submit(args),
        } => command_outcome_submit(&config, args).await,
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs the Record Service.
async fn command_serve(config: ClientRecordsConfig) -> CliResult<ExitCode> {
    init_logging(&config.logging).map_err(|err| CliError::new(err.to_string()))?;
    let service = tokio::task::spawn_blocking(move || RecordService::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("service init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("service init failed: {err}")))?;
    service.serve().await.map_err(|err| CliError::new(format!("service failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Reports a successfully loaded and validated config.
fn command_config_validate() -> CliResult<ExitCode> {
    write_stdout_line("ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Pulls the directory and prints it as JSON.
async fn command_directory_pull(
    config: &ClientRecordsConfig,
    args: &ServiceArgs,
) -> CliResult<ExitCode> {
    init_logging(&config.logging).map_err(|err| CliError::new(err.to_string()))?;
    let service_url = args.url.as_deref().unwrap_or(&config.form.service_url);
    let client = DirectoryClient::new(service_url, DEFAULT_TIMEOUT)
        .map_err(|err| CliError::new(err.to_string()))?;
    let snapshot = client.pull().await.map_err(|err| CliError::new(err.to_string()))?;
    info!(entries = snapshot.len(), "directory pulled");
    let rendered = serde_json::to_string_pretty(&snapshot)
        .map_err(|err| CliError::new(format!("failed to render directory: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Resolves a client from a fresh directory pull and submits an outcome.
async fn command_outcome_submit(
    config: &ClientRecordsConfig,
    args: SubmitArgs,
) -> CliResult<ExitCode> {
    init_logging(&config.logging).map_err(|err| CliError::new(err.to_string()))?;
    let webhook_url = args
        .webhook
        .or_else(|| config.form.webhook_url.clone())
        .ok_or_else(|| CliError::new("webhook url required: set form.webhook_url or --webhook".to_string()))?;
    let selector = match (args.client, args.client_id) {
        (Some(key), _) => ClientSelector::Key(key),
        (None, Some(client_id)) => ClientSelector::ClientId(client_id),
        (None, None) => {
            return Err(CliError::new("one of --client or --client-id is required".to_string()));
        }
    };
    let service_url = args.service.url.as_deref().unwrap_or(&config.form.service_url);
    let directory = DirectoryClient::new(service_url, DEFAULT_TIMEOUT)
        .map_err(|err| CliError::new(err.to_string()))?;
    let snapshot = directory.pull().await.map_err(|err| CliError::new(err.to_string()))?;
    let entry = resolve_client(&snapshot, &selector).map_err(|err| CliError::new(err.to_string()))?;
    let submission = OutcomeSubmission::for_entry(
        entry,
        &args.outcome,
        &args.details,
        &config.form.source,
        Timestamp::now(),
    )
    .map_err(|err| CliError::new(err.to_string()))?;
    let webhook =
        WebhookClient::new(&webhook_url, DEFAULT_TIMEOUT).map_err(|err| CliError::new(err.to_string()))?;
    let receipt = webhook
        .submit(&submission)
        .await
        .map_err(|err| CliError::new(format!("outcome submission failed: {err}")))?;
    info!(client_id = %submission.client_id, status = receipt.status, "outcome submitted");
    write_stdout_line(&format!("submitted outcome for {}", submission.client_id))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream failure.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn submit_requires_a_client_selector() {
        let parsed = Cli::try_parse_from(["client-records", "outcome", "submit", "--outcome", "Booked"]);
        assert!(parsed.is_err());
        let parsed = Cli::try_parse_from([
            "client-records",
            "outcome",
            "submit",
            "--client",
            "johnsmith",
            "--client-id",
            "TB-001",
            "--outcome",
            "Booked",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_config_flag_parses_after_subcommand() {
        let cli = Cli::try_parse_from(["client-records", "config", "validate", "--config", "x.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommand::Validate
            }
        ));
    }
}
