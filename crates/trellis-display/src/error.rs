//! Output discovery errors.
//!
//! All of these are fatal at initialization: a host that cannot discover
//! an output has no surface to lay out into. They are deliberately
//! separate from `trellis_core::LayoutError`, which covers layout-time
//! failures only.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("sysfs read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("no DRM connectors found")]
    NoConnectors,

    #[error("no connected output with at least one mode")]
    NoConnectedOutput,

    #[error("unparseable mode line: {value:?}")]
    InvalidMode { value: String },
}
