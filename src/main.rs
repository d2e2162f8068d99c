use std::env;
use time_block_clicks::{
    load_page, persist_page, resolve_page_path, BinderConfig, ClickHandlerBinder, HttpTransport,
    SharedPage,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = BinderConfig::from_env();
    if config.time_block_path.is_none() {
        warn!("TIME_BLOCK_PATH is not set, start clicks will be rejected");
    }

    let page_path = resolve_page_path();
    let page = load_page(&page_path).await?;
    info!(path = %page_path.display(), elements = page.elements.len(), "page loaded");

    let transport = HttpTransport::new(config.base_url.as_deref())?;
    let binder = ClickHandlerBinder::new(config, transport);
    let bound = binder.bind(SharedPage::new(page)).await?;

    let mut in_flight = Vec::new();
    for selector in env::args().skip(1) {
        for index in bound.select(&selector).await? {
            match bound.click(index).await {
                Ok(Some(request)) => in_flight.push(request),
                Ok(None) => info!(%selector, index, "no handler bound, click ignored"),
                Err(err) => error!(%selector, index, "click rejected: {err}"),
            }
        }
    }

    for request in in_flight {
        let element = request.element.clone();
        let clicked_at = request.clicked_at;
        match request.outcome().await {
            Ok(outcome) => info!(%element, %clicked_at, ?outcome, "click completed"),
            Err(err) => error!(%element, %clicked_at, "click failed: {err}"),
        }
    }

    persist_page(&page_path, &bound.page().snapshot().await).await?;
    info!(path = %page_path.display(), "page saved");

    Ok(())
}
