use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use rfiv_core::{
    config::{flag_from_env_value, millis_from_env_value, store_path_from_env_value},
    constants::{DEFAULT_LOCATION_WINDOW_MS, DEFAULT_STORE_TIMEOUT_MS},
    CoreConfig, PatientService, PatientStore,
};

/// Main entry point for the RFIV application
///
/// Opens the patient store and serves the REST API until the process is stopped.
///
/// # Environment Variables
/// - `RFIV_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PATIENT_DATA_DIR`: Directory holding `patients.json` (default: "patient_data"; empty
///   keeps patients in memory only)
/// - `RFIV_STORE_TIMEOUT_MS`: Upper bound for a single store call (default: 5000)
/// - `RFIV_REQUIRE_TAG_ID`: Whether `tagId` is required on create (default: true)
/// - `RFIV_LOCATION_WINDOW_MS`: Heartbeat window for repeated locations (default: 120000)
///
/// # Errors
/// Returns an error, aborting the process, if:
/// - the logging/tracing configuration cannot be initialised,
/// - any of the variables above is invalid or the data directory is missing,
/// - the patient store file cannot be read or is inconsistent,
/// - the server address cannot be bound, or the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rfiv_run=info".parse()?)
                .add_directive("rfiv_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("RFIV_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let store_path = store_path_from_env_value(std::env::var("PATIENT_DATA_DIR").ok())?;
    let store_timeout = millis_from_env_value(
        "RFIV_STORE_TIMEOUT_MS",
        std::env::var("RFIV_STORE_TIMEOUT_MS").ok(),
        DEFAULT_STORE_TIMEOUT_MS,
    )?;
    let require_tag_id = flag_from_env_value(
        "RFIV_REQUIRE_TAG_ID",
        std::env::var("RFIV_REQUIRE_TAG_ID").ok(),
        true,
    )?;
    let location_window = millis_from_env_value(
        "RFIV_LOCATION_WINDOW_MS",
        std::env::var("RFIV_LOCATION_WINDOW_MS").ok(),
        DEFAULT_LOCATION_WINDOW_MS as u64,
    )?;
    let location_window = i64::try_from(location_window)
        .map_err(|_| anyhow::anyhow!("RFIV_LOCATION_WINDOW_MS is too large"))?;

    let cfg = Arc::new(CoreConfig::new(
        store_path,
        Duration::from_millis(store_timeout),
        require_tag_id,
        location_window,
    )?);

    let store = match cfg.store_path() {
        Some(path) => {
            let open = PatientStore::open(path.to_path_buf());
            tokio::time::timeout(cfg.store_timeout(), open)
                .await
                .map_err(|_| anyhow::anyhow!("timed out opening {}", path.display()))??
        }
        None => {
            tracing::warn!("PATIENT_DATA_DIR is empty; patients are kept in memory only");
            PatientStore::in_memory()
        }
    };

    let state = AppState::new(PatientService::new(cfg, store));
    let app = api_rest::router(state);

    tracing::info!("++ Starting RFIV REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
