#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use campusflow::{CalendarStore, http_api, open_store};

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let addr: SocketAddr = std::env::var("CAMPUSFLOW_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;
    let data = std::env::var("CAMPUSFLOW_DATA").unwrap_or_else(|_| "events_data.json".to_string());

    let store: Arc<dyn CalendarStore + Send + Sync> = Arc::from(open_store(&data)?);
    let calendars = store.load_calendars()?.unwrap_or_default();
    tracing::info!(data = %data, calendars = calendars.len(), "calendars loaded");

    println!("campusflow HTTP API listening on http://{addr}");
    let state = http_api::AppState::new(calendars).with_store(store);
    http_api::serve(addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
