//! DRM output discovery over sysfs.
//!
//! Reads `/sys/class/drm` to find connectors and their advertised modes,
//! then picks the output whose preferred mode seeds the root layout
//! surface. Everything here is plain file I/O against the kernel's sysfs
//! view of DRM; no device nodes are opened and no ioctls are issued.
//!
//! Errors are fatal by design: a host with no usable output cannot lay
//! anything out, so failures surface at initialization rather than being
//! papered over with a default resolution.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let connectors = trellis_display::discover(Path::new("/sys/class/drm"))?;
//! let output = trellis_display::primary_output(&connectors)?;
//! let surface = output.surface_size();
//! # Ok::<(), trellis_display::OutputError>(())
//! ```

pub mod connector;
pub mod discover;
pub mod error;

pub use connector::{Connector, ConnectorKind, ConnectorStatus, Mode};
pub use discover::{discover, primary_output, Output};
pub use error::OutputError;
