//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::Settings;
use crate::endpoint::EndpointCatalog;
use crate::engine::{RunSummary, SyncConfig, SyncEngine};
use crate::error::Result;
use crate::http::HttpClient;
use crate::notify::{LogNotifier, Notification, Notifier, WebhookNotifier};
use crate::output::{ObjectStoreSink, StorageSink};
use crate::state::StateManager;
use crate::types::ErrorStrategy;
use crate::warehouse::DuckDbWarehouse;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

/// Arguments shared by the run commands
struct RunArgs<'a> {
    endpoints: &'a [String],
    grad_years: &'a [u16],
    error_strategy: ErrorStrategy,
    output: Option<&'a str>,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Sync {
                endpoints,
                grad_years,
                updated_after,
                incremental,
                error_strategy,
                output,
            } => {
                let args = RunArgs {
                    endpoints,
                    grad_years,
                    error_strategy: *error_strategy,
                    output: output.as_deref(),
                };
                self.sync(&args, *updated_after, *incremental).await
            }
            Commands::Reconcile {
                endpoints,
                grad_years,
                error_strategy,
                output,
            } => {
                let args = RunArgs {
                    endpoints,
                    grad_years,
                    error_strategy: *error_strategy,
                    output: output.as_deref(),
                };
                self.reconcile(&args).await
            }
            Commands::Endpoints => self.endpoints(),
            Commands::Validate => self.validate(),
        }
    }

    /// Load the catalog from `--catalog` or the built-in definition
    fn load_catalog(&self) -> Result<EndpointCatalog> {
        match &self.cli.catalog {
            Some(path) => EndpointCatalog::from_file(path),
            None => EndpointCatalog::builtin(),
        }
    }

    /// Load state from `--state`, or keep it in memory
    fn load_state(&self) -> Result<StateManager> {
        match &self.cli.state {
            Some(path) => StateManager::from_file(path),
            None => Ok(StateManager::in_memory()),
        }
    }

    fn run_config(settings: &Settings, args: &RunArgs<'_>) -> SyncConfig {
        SyncConfig::new()
            .with_grad_years(args.grad_years.iter().copied())
            .with_error_strategy(args.error_strategy)
            .with_page_config(settings.page_config())
    }

    fn build_engine(
        &self,
        settings: &Settings,
        args: &RunArgs<'_>,
        config: SyncConfig,
    ) -> Result<SyncEngine> {
        let catalog = self.load_catalog()?;
        let destination = match args.output {
            Some(output) => output,
            None => settings.require_bucket()?,
        };
        let sink: Arc<dyn StorageSink> = Arc::new(ObjectStoreSink::parse(destination)?);
        let client = HttpClient::with_config(settings.http_config())?;
        info!("Writing to {}", destination);

        Ok(SyncEngine::new(client, catalog, sink, self.load_state()?).with_config(config))
    }

    /// Sync command
    async fn sync(
        &self,
        args: &RunArgs<'_>,
        updated_after: Option<NaiveDate>,
        incremental: bool,
    ) -> Result<()> {
        let settings = Settings::from_env();
        let notifier = notifier_for(settings.as_ref().ok());
        let result = match settings {
            Ok(settings) => {
                self.run_sync(&settings, args, updated_after, incremental)
                    .await
            }
            Err(e) => Err(e),
        };
        finish(notifier.as_ref(), result).await
    }

    async fn run_sync(
        &self,
        settings: &Settings,
        args: &RunArgs<'_>,
        updated_after: Option<NaiveDate>,
        incremental: bool,
    ) -> Result<RunSummary> {
        let config = Self::run_config(settings, args)
            .with_updated_after(updated_after)
            .with_incremental(incremental);
        let mut engine = self.build_engine(settings, args, config)?;
        engine.sync(args.endpoints).await
    }

    /// Reconcile command
    async fn reconcile(&self, args: &RunArgs<'_>) -> Result<()> {
        let settings = Settings::from_env();
        let notifier = notifier_for(settings.as_ref().ok());
        let result = match settings {
            Ok(settings) => self.run_reconcile(&settings, args).await,
            Err(e) => Err(e),
        };
        finish(notifier.as_ref(), result).await
    }

    async fn run_reconcile(&self, settings: &Settings, args: &RunArgs<'_>) -> Result<RunSummary> {
        let mut engine = self.build_engine(settings, args, Self::run_config(settings, args))?;
        let warehouse = DuckDbWarehouse::open(
            settings.warehouse_path.as_deref(),
            settings.warehouse_tables(),
        )?;
        engine.reconcile(Arc::new(warehouse), args.endpoints).await
    }

    /// List catalog endpoints
    fn endpoints(&self) -> Result<()> {
        let catalog = self.load_catalog()?;
        for endpoint in catalog.endpoints() {
            let mut flags = Vec::new();
            if endpoint.has_grad_year {
                flags.push("grad_year");
            }
            if endpoint.supports_date_filter {
                flags.push("date_filter");
            }
            if endpoint.has_university_id {
                flags.push("university_id");
            }
            if endpoint.custom_field.is_some() {
                flags.push("custom_fields");
            }
            if endpoint.is_lookup() {
                flags.push("lookup");
            }
            println!(
                "{:<16} {:>3} fields  {}",
                endpoint.name,
                endpoint.fields.len(),
                flags.join(",")
            );
        }
        Ok(())
    }

    /// Validate the catalog
    fn validate(&self) -> Result<()> {
        let catalog = self.load_catalog()?;
        let source = self
            .cli
            .catalog
            .as_ref()
            .map_or_else(|| "built-in catalog".to_string(), |p| p.display().to_string());
        println!("✓ {} is valid ({} endpoints)", source, catalog.len());
        Ok(())
    }
}

/// Webhook notifier when one is configured, otherwise the log. Without
/// settings the failure still gets reported through the log.
fn notifier_for(settings: Option<&Settings>) -> Box<dyn Notifier> {
    let Some(url) = settings.and_then(|s| s.notify_webhook_url.as_ref()) else {
        return Box::new(LogNotifier);
    };
    match WebhookNotifier::new(url.clone()) {
        Ok(notifier) => Box::new(notifier),
        Err(e) => {
            warn!("Webhook notifier unavailable, logging instead: {}", e);
            Box::new(LogNotifier)
        }
    }
}

/// Print the summary, notify once, and hand the outcome back
async fn finish(notifier: &dyn Notifier, result: Result<RunSummary>) -> Result<()> {
    let notification = match &result {
        Ok(summary) => {
            println!("{}", summary.to_json_pretty()?);
            Notification::success(summary.clone())
        }
        Err(e) => Notification::failure(e),
    };

    if let Err(e) = notifier.notify(&notification).await {
        warn!("Failed to send notification: {}", e);
    }

    result.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ENV_API_KEY, ENV_NOTIFY_WEBHOOK_URL};
    use crate::engine::RunKind;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: &Notification) -> Result<()> {
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_settings_failure_is_reported_once() {
        let settings = Settings::from_lookup(|_| None);
        let notifier = RecordingNotifier::default();

        let err = finish(&notifier, settings.map(|_| RunSummary::start(RunKind::Sync)))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MissingConfigField { .. }));
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].is_failure());
    }

    #[tokio::test]
    async fn test_missing_settings_fall_back_to_log() {
        let notifier = notifier_for(None);
        let result: Result<RunSummary> = Err(Error::missing_field(ENV_API_KEY));
        assert!(finish(notifier.as_ref(), result).await.is_err());
    }

    #[tokio::test]
    async fn test_configured_webhook_receives_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(serde_json::json!({"status": "failure"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let hook = format!("{}/hook", server.uri());
        let settings = Settings::from_lookup(|key| match key {
            ENV_API_KEY => Some("k".to_string()),
            ENV_NOTIFY_WEBHOOK_URL => Some(hook.clone()),
            _ => None,
        })
        .unwrap();

        let notifier = notifier_for(Some(&settings));
        let result: Result<RunSummary> = Err(Error::storage("disk full"));
        assert!(finish(notifier.as_ref(), result).await.is_err());
    }
}
