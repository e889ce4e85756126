pub mod cli;
pub mod core;
pub mod schemas;
pub mod services;
pub mod tasks;
pub mod views;

#[cfg(test)]
mod test_support;

use clap::Parser;

use crate::core::{config::Settings, telemetry};

pub use crate::schemas::{BatchGradingResponse, FileRecord, FileType, GradingResponse, UploadFile};
pub use crate::services::{ApiClient, BatchGradingService, ClientError, SupabaseClient};
pub use crate::tasks::{BatchFlow, BatchFlowReport, BatchPoller, PollOutcome, PollState};
pub use crate::views::{FileSelection, ResultsView};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = cli::Cli::parse();
    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    tracing::debug!(
        environment = %settings.runtime().environment.as_str(),
        api_url = %settings.api().base_url(),
        poll_interval_ms = settings.polling().interval().as_millis() as u64,
        "Configuration loaded"
    );

    let result = cli::execute(cli, &settings).await;

    if let Some(snapshot) = core::metrics::render() {
        eprintln!("{snapshot}");
    }

    result
}
