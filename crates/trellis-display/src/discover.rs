//! Sysfs scanning and primary-output selection.

use std::fs;
use std::path::Path;

use trellis_core::Size;

use crate::connector::{Connector, ConnectorStatus, Mode};
use crate::error::OutputError;

/// Scan a sysfs DRM class directory (normally `/sys/class/drm`) for
/// connectors.
///
/// Entries that are not connectors (`cardN`, `renderD*`, `version`) are
/// skipped; a directory that looks like a connector but cannot be read is
/// a fatal I/O error. Results are sorted by card then entry name so
/// discovery order is deterministic.
pub fn discover(root: &Path) -> Result<Vec<Connector>, OutputError> {
    let mut connectors = Vec::new();

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some((card, kind, index)) = Connector::parse_entry_name(name) else {
            continue;
        };

        let dir = entry.path();
        let status = ConnectorStatus::from_sysfs(&fs::read_to_string(dir.join("status"))?);
        let modes = read_modes(&dir.join("modes"))?;

        tracing::debug!(
            connector = name,
            ?status,
            modes = modes.len(),
            "discovered connector"
        );
        connectors.push(Connector {
            card,
            name: name.to_string(),
            kind,
            index,
            status,
            modes,
        });
    }

    if connectors.is_empty() {
        return Err(OutputError::NoConnectors);
    }
    connectors.sort_by(|a, b| (a.card, &a.name).cmp(&(b.card, &b.name)));
    Ok(connectors)
}

// The kernel lists the preferred mode first; a disconnected connector has
// an empty modes file.
fn read_modes(path: &Path) -> Result<Vec<Mode>, OutputError> {
    let raw = fs::read_to_string(path)?;
    let mut modes = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut mode: Mode = line.parse()?;
        mode.preferred = modes.is_empty();
        modes.push(mode);
    }
    Ok(modes)
}

/// A selected output: one connector plus the mode to drive it at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub connector: Connector,
    pub mode: Mode,
}

impl Output {
    /// The root surface size for this output, for `LayoutTree::set_root`.
    pub fn surface_size(&self) -> Size {
        self.mode.size()
    }
}

/// Pick the output to drive: the first connected connector that advertises
/// at least one mode, at its preferred mode.
pub fn primary_output(connectors: &[Connector]) -> Result<Output, OutputError> {
    connectors
        .iter()
        .filter(|c| c.status == ConnectorStatus::Connected)
        .find_map(|c| {
            c.preferred_mode().map(|mode| Output {
                connector: c.clone(),
                mode: *mode,
            })
        })
        .ok_or(OutputError::NoConnectedOutput)
}
