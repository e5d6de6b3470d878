use clap::Parser;

/// Command line arguments for the versed binary.
#[derive(Parser, Clone)]
pub struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
    #[arg(long = "ollama-url", default_value = "http://localhost:11434")]
    pub ollama_url: String,
    #[arg(long, default_value = "poem-generator")]
    pub model: String,
    #[arg(long = "geocode-url", default_value = "https://nominatim.openstreetmap.org")]
    pub geocode_url: String,
    /// Length of the fixed rate-limit window in milliseconds.
    #[arg(long = "rate-limit-window-ms", default_value_t = 60_000)]
    pub rate_limit_window_ms: u64,
    /// Maximum number of requests per client within one window.
    #[arg(long = "rate-limit-max", default_value_t = 60)]
    pub rate_limit_max: u32,
    /// How long a cached poem stays fresh.
    #[arg(long = "poem-cache-ttl-secs", default_value_t = 3600)]
    pub poem_cache_ttl_secs: u64,
}
