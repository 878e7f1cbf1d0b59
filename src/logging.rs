use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs a stderr subscriber when `RUST_LOG` is set, e.g.
/// `RUST_LOG=zero=trace` to see every executed line. Later calls do nothing.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
                .with(filter)
                .init();
        }
    });
}
