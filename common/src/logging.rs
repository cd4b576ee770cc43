//! Common logging initializer
//!

use eyre::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_tree::HierarchicalLayer;

/// Set up the tracing subscriber stack.
///
/// Filters come from the environment (`RUST_LOG`).  `use_tree` switches the
/// console output to hierarchical span display, `use_file` adds an hourly
/// rolling file appender in the given directory.
///
pub fn init_logging(name: &'static str, use_tree: bool, use_file: Option<String>) -> Result<()> {
    // Initialise logging early
    //
    // Load filters from environment
    //
    let filter = EnvFilter::from_default_env();

    // Do we want hierarchical output?
    //
    let tree = if use_tree {
        Some(
            HierarchicalLayer::new(2)
                .with_ansi(true)
                .with_span_retrace(true)
                .with_span_modes(true)
                .with_targets(true)
                .with_bracketed_fields(true),
        )
    } else {
        None
    };

    // Log to file?
    //
    let file = use_file.map(|dir| {
        // Basic append-only rolling file for all traces.
        //
        let file_appender = tracing_appender::rolling::hourly(dir, name);
        tracing_subscriber::fmt::layer().with_writer(file_appender)
    });

    // Combine filters & outputs
    //
    tracing_subscriber::registry()
        .with(filter)
        .with(tree)
        .with(file)
        .init();

    Ok(())
}
