//! Log sink construction
//!
//! [`dispatch`] builds a `tracing` dispatcher that the binary installs
//! globally and hands to [`Unpacker::with_log_dispatch`](crate::Unpacker::with_log_dispatch).
//!
//! `RUST_LOG` controls levels at runtime:
//! ```bash
//! RUST_LOG=debug ole-unpack -i doc.doc -o out/            # Everything
//! RUST_LOG=ole_unpack::extraction=debug ole-unpack ...    # Extractors only
//! ```

use clap::ValueEnum;
use tracing::Dispatch;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "ole_unpack=info";

/// Output format of the log sink
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Single-line human readable records on stderr
    #[default]
    Compact,
    /// One JSON object per record on stdout
    Json,
}

/// Build a log dispatcher for `format`
pub fn dispatch(format: LogFormat) -> Dispatch {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Compact => Dispatch::new(
            registry.with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            ),
        ),
        LogFormat::Json => Dispatch::new(
            registry.with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stdout),
            ),
        ),
    }
}

/// Install the dispatcher for `format` as the process default and return it
///
/// Installing twice keeps the first dispatcher.
pub fn init(format: LogFormat) -> Dispatch {
    let dispatch = dispatch(format);
    let _ = tracing::dispatcher::set_global_default(dispatch.clone());
    dispatch
}
