// Climate workload runner

use tracing_subscriber::EnvFilter;

use climate_workload::{
    app_state::AppState,
    config::{Config, SummaryFormat},
    error::AppError,
    workload::{build_plan, Workload},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; logs go to stderr so stdout carries only results
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let app_state = AppState::new(Config::from_env()?).await?;
    let config = &app_state.config;
    tracing::info!(target_db = %config.database.display_target(), "starting climate workload");

    let tasks = build_plan(&config.workload, &mut rand::rng());
    let workload = Workload::new(app_state.store.clone(), &config.workload);
    let summary = workload
        .run(tasks, |report| println!("{}", report))
        .await?;

    if let Some(total) = summary.final_count {
        println!("FINAL COUNT rows={}", total);
    }

    match config.workload.summary_format {
        SummaryFormat::Text => println!("{}", summary.render_text()),
        SummaryFormat::Json => println!("{}", summary.render_json()?),
    }

    if !summary.is_success() {
        return Err(AppError::WorkloadFailed {
            failed: summary.failed,
            total: summary.submitted,
        }
        .into());
    }

    Ok(())
}
