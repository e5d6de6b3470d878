use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use url::Url;

use versed::args::Args;
use versed::generate::OllamaPoet;
use versed::geocode::LocationResolver;
use versed::orchestrator::PoemService;
use versed::poem_cache::PoemCache;
use versed::rate_limit::RateLimiter;
use versed::{logger, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let http = reqwest::Client::builder()
        .user_agent(concat!("versed/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let resolver = LocationResolver::new(http, Url::parse(&args.geocode_url)?);
    let generator = Arc::new(OllamaPoet::new(&args.ollama_url, args.model.clone())?);
    let cache = PoemCache::new(Duration::from_secs(args.poem_cache_ttl_secs));
    let limiter = RateLimiter::new(
        Duration::from_millis(args.rate_limit_window_ms),
        args.rate_limit_max,
    );
    let svc = Arc::new(PoemService::new(
        resolver,
        generator,
        cache,
        limiter,
        args.model.clone(),
    ));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, model = %args.model, "serving poems");
    axum::serve(
        listener,
        server::router(svc).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
