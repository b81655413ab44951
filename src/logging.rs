use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_DIRECTIVES: &str = "collage_studio=info,collage_server=info,tower_http=info";

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `default_directives`. Calling this twice
/// is harmless: the second subscriber is simply not installed.
pub fn init(default_directives: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init();
}
