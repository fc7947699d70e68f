use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vigil_cache::QueryCache;
use vigil_client::TelemetryClient;
use vigil_views::{AlertsView, HbtView, IncidentsView, LogsView, OverviewView, SettingsForm};

mod config;
mod render;

use config::DashboardConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = DashboardConfig::from_env();
    tracing::info!(api_url = %config.api_url, "Loaded dashboard configuration");

    // --- Client and cache ---
    let client = Arc::new(TelemetryClient::new(config.api_url.clone())?);
    let cache = Arc::new(QueryCache::new());

    // --- View models ---
    let overview = OverviewView::new(Arc::clone(&cache), Arc::clone(&client));
    let mut alerts = AlertsView::new(Arc::clone(&cache), Arc::clone(&client));
    let mut logs = LogsView::new(Arc::clone(&cache), Arc::clone(&client));
    let incidents_view = IncidentsView::new(Arc::clone(&cache), Arc::clone(&client));
    let mut hbt = HbtView::new(Arc::clone(&cache), Arc::clone(&client));

    // Analyzer configuration is read once at startup; the form itself is
    // only exercised interactively.
    let mut settings = SettingsForm::new(Arc::clone(&client));
    settings.load().await;
    if let Some(notice) = settings.take_notice() {
        tracing::warn!(?notice, "Analyzer configuration unavailable");
    } else if !settings.config().is_complete() {
        tracing::warn!(
            missing = ?settings.config().missing_fields(),
            "Analyzer configuration incomplete; incident analyses will stay pending"
        );
    }

    // --- Render loop ---
    let mut ticker = tokio::time::interval(Duration::from_secs(config.render_interval_secs));
    tracing::info!(
        interval_secs = config.render_interval_secs,
        "Dashboard started"
    );
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT (Ctrl-C), shutting down");
                break;
            }
            _ = ticker.tick() => {
                // Pump auto-selection before reading state.
                alerts.sync();
                logs.sync();
                hbt.sync();

                let mut frame = String::new();
                frame.push_str(&render::overview_section(&overview.state()));
                frame.push_str(&render::alerts_section(&alerts.state()));
                frame.push_str(&render::logs_section(&logs.state()));
                frame.push_str(&render::incidents_section(&incidents_view.state()));
                frame.push_str(&render::hbt_section(&hbt.panel_state(), hbt.tree()));
                println!("{frame}");
            }
        }
    }

    Ok(())
}
