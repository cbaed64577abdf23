use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use transit_server::distance::{MatrixClient, MatrixClientConfig};
use transit_server::provider::{
    DynamicWalkingProvider, EdgeProvider, ScheduleProvider, StaticWalkingProvider, WalkingConfig,
    WalkingTable,
};
use transit_server::timetable::load_timetable;
use transit_server::web::{create_router, AppState};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Timetable is mandatory; everything else degrades gracefully.
    let timetable_path = PathBuf::from(
        std::env::var("TRANSIT_TIMETABLE").expect("TRANSIT_TIMETABLE must point at a timetable file"),
    );
    let timetable = Arc::new(load_timetable(&timetable_path).expect("failed to load timetable"));
    let stops = timetable.stop_names();
    tracing::info!(stops = stops.len(), "loaded timetable");

    let walking_config = match std::env::var("TRANSIT_MAX_WALK_MINS") {
        Ok(minutes) => WalkingConfig::with_max_minutes(
            minutes.parse().expect("TRANSIT_MAX_WALK_MINS must be a number"),
        ),
        Err(_) => WalkingConfig::default(),
    };

    let mut providers: Vec<Arc<dyn EdgeProvider>> =
        vec![Arc::new(ScheduleProvider::new(Arc::clone(&timetable)))];

    // Precomputed walking pairs, if a table was supplied.
    if let Ok(path) = std::env::var("TRANSIT_WALKING_TABLE") {
        let table = WalkingTable::load(&PathBuf::from(path)).expect("failed to load walking table");
        tracing::info!(pairs = table.len(), "loaded walking table");
        providers.push(Arc::new(StaticWalkingProvider::new(
            Arc::new(table),
            walking_config.clone(),
        )));
    }

    // On-demand walking times for arbitrary origins and destinations, if a
    // matrix API is configured.
    if let (Ok(url), Ok(key)) = (
        std::env::var("TRANSIT_MATRIX_URL"),
        std::env::var("TRANSIT_MATRIX_KEY"),
    ) {
        let client = MatrixClient::new(MatrixClientConfig::new(url, key))
            .expect("failed to create matrix client");
        providers.push(Arc::new(DynamicWalkingProvider::new(
            client,
            stops,
            walking_config,
        )));
        tracing::info!("dynamic walking provider enabled");
    }

    let state = AppState::new(providers);
    let app = create_router(state);

    let addr: SocketAddr = std::env::var("TRANSIT_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
        .parse()
        .expect("TRANSIT_ADDR must be a socket address");

    // The matrix client is a blocking HTTP client, so it is built before
    // the async runtime starts; the runtime is entered only to serve.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to start runtime");
    runtime.block_on(async move {
        tracing::info!(%addr, "transit planner listening");
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("failed to bind");
        axum::serve(listener, app).await.expect("server error");
    });
}
