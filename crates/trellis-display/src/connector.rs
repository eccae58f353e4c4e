//! Connector and mode types.

use std::fmt;
use std::str::FromStr;

use trellis_core::Size;

use crate::error::OutputError;

/// The DRM connector types the kernel names in sysfs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorKind {
    None,
    Vga,
    DviI,
    DviD,
    DviA,
    Composite,
    SVideo,
    Lvds,
    Component,
    Din,
    DisplayPort,
    HdmiA,
    HdmiB,
    Tv,
    Edp,
    Virtual,
    Dsi,
    /// A type name this crate does not know; carried through untouched so
    /// discovery never fails on a newer kernel.
    Unknown,
}

impl ConnectorKind {
    /// The sysfs type name, as it appears in `cardN-<type>-<index>`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorKind::None => "None",
            ConnectorKind::Vga => "VGA",
            ConnectorKind::DviI => "DVI-I",
            ConnectorKind::DviD => "DVI-D",
            ConnectorKind::DviA => "DVI-A",
            ConnectorKind::Composite => "Composite",
            ConnectorKind::SVideo => "S-Video",
            ConnectorKind::Lvds => "LVDS",
            ConnectorKind::Component => "Component",
            ConnectorKind::Din => "DIN",
            ConnectorKind::DisplayPort => "DisplayPort",
            ConnectorKind::HdmiA => "HDMI-A",
            ConnectorKind::HdmiB => "HDMI-B",
            ConnectorKind::Tv => "TV",
            ConnectorKind::Edp => "eDP",
            ConnectorKind::Virtual => "Virtual",
            ConnectorKind::Dsi => "DSI",
            ConnectorKind::Unknown => "Unknown",
        }
    }

    fn from_type_name(name: &str) -> Self {
        match name {
            "None" => ConnectorKind::None,
            "VGA" => ConnectorKind::Vga,
            "DVI-I" => ConnectorKind::DviI,
            "DVI-D" => ConnectorKind::DviD,
            "DVI-A" => ConnectorKind::DviA,
            "Composite" => ConnectorKind::Composite,
            "S-Video" => ConnectorKind::SVideo,
            "LVDS" => ConnectorKind::Lvds,
            "Component" => ConnectorKind::Component,
            "DIN" => ConnectorKind::Din,
            "DisplayPort" | "DP" => ConnectorKind::DisplayPort,
            "HDMI-A" => ConnectorKind::HdmiA,
            "HDMI-B" => ConnectorKind::HdmiB,
            "TV" => ConnectorKind::Tv,
            "eDP" => ConnectorKind::Edp,
            "Virtual" => ConnectorKind::Virtual,
            "DSI" => ConnectorKind::Dsi,
            _ => ConnectorKind::Unknown,
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connector link status, from the sysfs `status` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorStatus {
    Connected,
    Disconnected,
    Unknown,
}

impl ConnectorStatus {
    pub(crate) fn from_sysfs(value: &str) -> Self {
        match value.trim() {
            "connected" => ConnectorStatus::Connected,
            "disconnected" => ConnectorStatus::Disconnected,
            _ => ConnectorStatus::Unknown,
        }
    }
}

/// A display mode advertised by a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub width: u32,
    pub height: u32,
    /// The kernel lists its preferred mode first.
    pub preferred: bool,
}

impl Mode {
    /// The mode resolution as a layout surface size.
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

impl FromStr for Mode {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OutputError::InvalidMode {
            value: s.to_string(),
        };
        // "1920x1080", optionally with an interlace suffix ("1920x1080i").
        let line = s.trim().trim_end_matches('i');
        let (width, height) = line.split_once('x').ok_or_else(invalid)?;
        Ok(Mode {
            width: width.parse().map_err(|_| invalid())?,
            height: height.parse().map_err(|_| invalid())?,
            preferred: false,
        })
    }
}

/// One DRM connector as discovered from sysfs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    /// The card number (`0` for `card0-HDMI-A-1`).
    pub card: u32,
    /// The full sysfs entry name (`card0-HDMI-A-1`).
    pub name: String,
    pub kind: ConnectorKind,
    /// The per-type connector index (the trailing `1` in `card0-HDMI-A-1`).
    pub index: u32,
    pub status: ConnectorStatus,
    /// Advertised modes, kernel-preferred first.
    pub modes: Vec<Mode>,
}

impl Connector {
    /// Parse `cardN-<type>-<index>` into its parts, or `None` when the
    /// entry is not a connector (e.g. the bare `cardN` device or `renderD*`).
    pub(crate) fn parse_entry_name(name: &str) -> Option<(u32, ConnectorKind, u32)> {
        let rest = name.strip_prefix("card")?;
        let (card, rest) = rest.split_once('-')?;
        let card = card.parse().ok()?;
        let (type_name, index) = rest.rsplit_once('-')?;
        let index = index.parse().ok()?;
        Some((card, ConnectorKind::from_type_name(type_name), index))
    }

    /// The preferred mode, if the connector advertises any mode at all.
    pub fn preferred_mode(&self) -> Option<&Mode> {
        self.modes.iter().find(|m| m.preferred).or_else(|| self.modes.first())
    }
}
