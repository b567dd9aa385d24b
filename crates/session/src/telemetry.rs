//! Logging initialization

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the global tracing subscriber. Call once at startup.
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[cfg(test)]
mod tests {
    use super::*;

    // The only test in this binary that installs the global
    // subscriber; a second install must be rejected.
    #[test]
    fn test_init_logging_installs_global_subscriber() {
        init_logging();
        let second = FmtSubscriber::builder().finish();
        assert!(tracing::subscriber::set_global_default(second).is_err());
        tracing::info!("logging smoke test");
    }
}
