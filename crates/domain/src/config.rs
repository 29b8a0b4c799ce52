pub mod cache;
pub mod errors;
pub mod lists;
pub mod logging;
pub mod rewrite;
pub mod root;
pub mod server;
pub mod upstream;

pub use cache::CacheConfig;
pub use errors::ConfigError;
pub use lists::ListsConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use rewrite::RewriteConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use upstream::UpstreamConfig;
