use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use cluster_inventory_helper::io::background_updater;
use cluster_inventory_helper::{AppConfig, AppState};
use std::env;
use std::path::Path;
use tracing::info;

const CONFIG_PATH: &str = "config.json";

fn init_default_config(config_path: &Path) -> anyhow::Result<()> {
    let default_config = AppConfig::default();

    let config_json = serde_json::to_string_pretty(&default_config)?;

    std::fs::write(config_path, config_json)?;

    info!("Wrote default configuration to {:?}", config_path);

    Ok(())
}

fn init_app_state() -> AppState {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| CONFIG_PATH.to_string());

    let config_path = Path::new(config_path.as_str());

    let app_config = if config_path.exists() {
        let file = std::fs::File::open(config_path).unwrap_or_else(|e| {
            panic!("Failed to open configuration file {:?}: {:?}", config_path, e);
        });

        let config = serde_json::from_reader(file).unwrap_or_else(|e| {
            panic!("Failed to load configuration from {:?}: {:?}", config_path, e);
        });

        info!("Loaded configuration from {:?}", config_path);

        config
    } else {
        info!(
            "Configuration file {:?} does not exist. Using default configuration.",
            config_path
        );

        if let Err(e) = init_default_config(config_path) {
            panic!("Failed to write default configuration to {:?}: {:?}", config_path, e);
        }

        AppConfig::default()
    };

    AppState {
        config: std::sync::Arc::new(app_config),
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let app_state = init_app_state();

    let update_task_app_state = app_state.clone();

    tokio::spawn(async move {
        background_updater(update_task_app_state).await;
    });

    let app = Router::new()
        .route(&app_state.config.inventory_endpoint, get(get_inventory_json))
        .route(&app_state.config.zones_endpoint, get(get_zones_json))
        .with_state(app_state.clone());

    let listener = tokio::net::TcpListener::bind(&app_state.config.listen_address).await?;

    info!("Listening on: {}", &app_state.config.listen_address);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn get_inventory_json(State(state): State<AppState>) -> Response<Body> {
    let data = match state.inventory_data.read() {
        Ok(data) => data,
        Err(_) => {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    (
        [("Content-Type", "application/json")],
        data.json_content.clone(),
    )
        .into_response()
}

async fn get_zones_json(State(state): State<AppState>) -> Response<Body> {
    let data = match state.zone_data.read() {
        Ok(data) => data,
        Err(_) => {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    (
        [("Content-Type", "application/json")],
        data.json_content.clone(),
    )
        .into_response()
}
