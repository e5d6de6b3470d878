pub mod args;
pub mod context;
pub mod fallback;
pub mod generate;
pub mod geocode;
pub mod logger;
pub mod orchestrator;
pub mod poem_cache;
pub mod rate_limit;
pub mod server;

pub use context::{PoemContext, Season, TimeOfDay, derive_context};
pub use fallback::compose_fallback;
pub use generate::{GenerateError, OllamaPoet, PoemGenerator, build_prompt};
pub use geocode::{LocationResolver, UNKNOWN_LOCATION};
pub use orchestrator::{PoemRequest, PoemService, ServeError};
pub use poem_cache::PoemCache;
pub use rate_limit::RateLimiter;
pub use server::router;
