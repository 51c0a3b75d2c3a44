// # dyndns - single-shot DNS updater
//
// Thin integration layer: all resolution, caching and decision logic lives
// in dyndns-core.
//
// The binary is responsible for:
// 1. Reading process settings from environment variables
// 2. Loading the YAML run configuration
// 3. Initializing logging and the runtime
// 4. Wiring the Hetzner directory, HTTP IP source and file cache
// 5. Running one reconciliation and mapping the result to an exit code
//
// ## Environment
//
// - `DYNDNS_CONFIG`: Path to the YAML configuration (default `config.yml`)
// - `DYNDNS_ACCESS_TOKEN`: Overrides `access_token` from the file
// - `DYNDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `DYNDNS_MODE`: `live` (default) or `dry-run`
//
// ## Example
//
// ```bash
// export DYNDNS_CONFIG=/etc/dyndns/config.yml
// export DYNDNS_ACCESS_TOKEN=your_token
// dyndns
// ```
//
// Meant to be run from cron or a systemd timer.

use anyhow::{Context, Result};
use dyndns_core::{
    Error, FileCacheStore, Operation, Outcome, ReconcileEvent, Reconciler, RunConfig,
};
use dyndns_ip_http::HttpIpSource;
use dyndns_provider_hetzner::HetznerDirectory;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the possible run results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DyndnsExitCode {
    /// Record already correct, mutated successfully, or dry run
    Success,
    /// Configuration error or startup failure
    ConfigError,
    /// Runtime error (transport, zone not found, IP lookup)
    RuntimeError,
    /// The server rejected a call; carries the status folded into a byte
    Rejected(u8),
}

impl DyndnsExitCode {
    fn for_error(err: &Error) -> Self {
        match err {
            Error::Config(_) => DyndnsExitCode::ConfigError,
            // Only the DNS API's status becomes the exit code
            Error::Rejected {
                operation: Operation::IpLookup,
                ..
            } => DyndnsExitCode::RuntimeError,
            Error::Rejected { status, .. } => match (status % 256) as u8 {
                0 => DyndnsExitCode::RuntimeError,
                code => DyndnsExitCode::Rejected(code),
            },
            _ => DyndnsExitCode::RuntimeError,
        }
    }
}

impl From<DyndnsExitCode> for ExitCode {
    fn from(code: DyndnsExitCode) -> Self {
        match code {
            DyndnsExitCode::Success => ExitCode::SUCCESS,
            DyndnsExitCode::ConfigError => ExitCode::from(1),
            DyndnsExitCode::RuntimeError => ExitCode::from(2),
            DyndnsExitCode::Rejected(code) => ExitCode::from(code),
        }
    }
}

/// Process settings taken from the environment
struct Settings {
    config_path: PathBuf,
    access_token: Option<String>,
    log_level: String,
    mode: String,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Self {
        Self {
            config_path: env::var("DYNDNS_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("config.yml")),
            access_token: env::var("DYNDNS_ACCESS_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            log_level: env::var("DYNDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            mode: env::var("DYNDNS_MODE").unwrap_or_else(|_| "live".to_string()),
        }
    }

    fn validate(&self) -> Result<()> {
        self.log_level()?;
        self.dry_run()?;
        Ok(())
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DYNDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    fn dry_run(&self) -> Result<bool> {
        match self.mode.to_lowercase().as_str() {
            "live" => Ok(false),
            "dry-run" => Ok(true),
            _ => anyhow::bail!(
                "DYNDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                self.mode
            ),
        }
    }

    /// Load and validate the run configuration
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = RunConfig::from_yaml_file(&self.config_path)?;
        if let Some(token) = &self.access_token {
            config = config.with_access_token(token.clone());
        }
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", self.config_path.display()))?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let settings = Settings::from_env();

    if let Err(e) = settings.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DyndnsExitCode::ConfigError.into();
    }

    let config = match settings.run_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DyndnsExitCode::ConfigError.into();
        }
    };

    let log_level = settings.log_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DyndnsExitCode::ConfigError.into();
    }

    let dry_run = settings.dry_run().unwrap_or(false);
    info!(
        "Reconciling {} in zone {} [mode: {}]",
        config.record_name,
        config.zone_name,
        if dry_run { "DRY-RUN" } else { "LIVE" }
    );

    let (reconciler, events) = match build_reconciler(config, dry_run) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Startup failed: {}", e);
            return DyndnsExitCode::for_error(&e).into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DyndnsExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(run(reconciler, events));
    code.into()
}

fn build_reconciler(
    config: RunConfig,
    dry_run: bool,
) -> dyndns_core::Result<(Reconciler, mpsc::Receiver<ReconcileEvent>)> {
    let ip_source = HttpIpSource::from_config(&config.ip_source)?;
    let directory = HetznerDirectory::from_config(&config)?;
    let cache = FileCacheStore::new(config.cache_directory.clone());

    let (reconciler, events) = Reconciler::new(
        Box::new(ip_source),
        Box::new(directory),
        Box::new(cache),
        config,
    )?;
    Ok((reconciler.with_dry_run(dry_run), events))
}

/// Run one reconciliation
async fn run(
    reconciler: Reconciler,
    mut events: mpsc::Receiver<ReconcileEvent>,
) -> DyndnsExitCode {
    let result = reconciler.run_once().await;

    while let Ok(event) = events.try_recv() {
        debug!("Event: {:?}", event);
    }

    match result {
        Ok(outcome) => {
            report(&outcome);
            DyndnsExitCode::Success
        }
        Err(e) => {
            error!("Run failed: {}", e);
            DyndnsExitCode::for_error(&e)
        }
    }
}

fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Unchanged { record_id, value } => {
            info!("Record {} already points to {}", record_id, value)
        }
        Outcome::Updated {
            record,
            previous_value,
        } => info!(
            "Record {} updated: {} -> {}",
            record.id, previous_value, record.value
        ),
        Outcome::Created { record } => {
            info!("Record {} created with {}", record.id, record.value)
        }
        Outcome::DryRun { action } => info!("[DRY-RUN] Decided {:?}, nothing sent", action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(log_level: &str, mode: &str) -> Settings {
        Settings {
            config_path: PathBuf::from("config.yml"),
            access_token: None,
            log_level: log_level.to_string(),
            mode: mode.to_string(),
        }
    }

    #[test]
    fn rejection_status_becomes_exit_code() {
        let err = Error::rejected(Operation::RecordUpdate, 422, "invalid");
        assert_eq!(DyndnsExitCode::for_error(&err), DyndnsExitCode::Rejected(166));

        let err = Error::rejected(Operation::ZoneLookup, 401, "unauthorized");
        assert_eq!(DyndnsExitCode::for_error(&err), DyndnsExitCode::Rejected(145));
    }

    #[test]
    fn rejection_folding_to_zero_is_runtime_error() {
        let err = Error::rejected(Operation::RecordCreate, 512, "bad gateway");
        assert_eq!(DyndnsExitCode::for_error(&err), DyndnsExitCode::RuntimeError);
    }

    #[test]
    fn ip_service_status_is_runtime_error() {
        let err = Error::rejected(Operation::IpLookup, 503, "Service Unavailable");
        assert_eq!(DyndnsExitCode::for_error(&err), DyndnsExitCode::RuntimeError);
    }

    #[test]
    fn other_errors_map_to_fixed_codes() {
        assert_eq!(
            DyndnsExitCode::for_error(&Error::config("bad")),
            DyndnsExitCode::ConfigError
        );
        assert_eq!(
            DyndnsExitCode::for_error(&Error::zone_not_found("example.com")),
            DyndnsExitCode::RuntimeError
        );
        assert_eq!(
            DyndnsExitCode::for_error(&Error::transport(Operation::IpLookup, "timeout")),
            DyndnsExitCode::RuntimeError
        );
    }

    #[test]
    fn settings_validation() {
        assert!(settings("info", "live").validate().is_ok());
        assert!(settings("DEBUG", "dry-run").dry_run().unwrap());
        assert!(settings("verbose", "live").validate().is_err());
        assert!(settings("info", "test").validate().is_err());
    }

    #[test]
    fn env_token_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "zone_name: example.com\nrecord_name: home\n").unwrap();

        let mut settings = settings("info", "live");
        settings.config_path = path;
        assert!(settings.run_config().is_err(), "no token anywhere");

        settings.access_token = Some("from-env".to_string());
        let config = settings.run_config().unwrap();
        assert_eq!(config.access_token, "from-env");
    }
}
