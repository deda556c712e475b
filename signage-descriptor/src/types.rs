//! Configuration snapshot types consumed by the descriptor builder.
//!
//! Every value here is an immutable snapshot copied out of the player
//! record store for the duration of one build call.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Baseline refresh interval when a player has none configured (seconds).
pub const DEFAULT_REFRESH_SECONDS: u64 = 900;

/// Default canvas size for players without a configured resolution.
pub const DEFAULT_CANVAS_WIDTH: u32 = 1920;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1080;

/// Playlist layout mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaylistMode {
    /// One region spanning the whole canvas.
    #[default]
    SingleZone,
    /// One region per configured zone.
    Multizone,
}

/// Unit used when exporting zone geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportUnit {
    /// Geometry values are percentages of the canvas.
    #[default]
    Percent,
    /// Geometry values are absolute device pixels.
    Pixel,
}

/// Device model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerModel {
    /// Model not reported by the device.
    #[default]
    Unknown,
    /// IAdea XMP-120/130 media appliances.
    IadeaXmp1x0,
    /// IAdea XMP-320/330/340 media appliances.
    IadeaXmp3x0,
    /// IAdea XDS signboards.
    IadeaXds,
    /// Garlic software player.
    Garlic,
    /// IDS SoC displays.
    Ids,
    /// QBIC tablets.
    Qbic,
    /// Spinetix HMP players.
    Spinetix,
    /// Any other SMIL-compatible player.
    Compatible,
}

impl PlayerModel {
    /// Whether the model honours wallclock standby scheduling.
    ///
    /// Only the IAdea family does; every other model ignores screen times.
    pub fn supports_standby(self) -> bool {
        matches!(
            self,
            PlayerModel::IadeaXmp1x0 | PlayerModel::IadeaXmp3x0 | PlayerModel::IadeaXds
        )
    }

    /// Get display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlayerModel::Unknown => "Unknown",
            PlayerModel::IadeaXmp1x0 => "IAdea XMP-1x0",
            PlayerModel::IadeaXmp3x0 => "IAdea XMP-3x0",
            PlayerModel::IadeaXds => "IAdea XDS",
            PlayerModel::Garlic => "Garlic",
            PlayerModel::Ids => "IDS",
            PlayerModel::Qbic => "QBIC",
            PlayerModel::Spinetix => "Spinetix",
            PlayerModel::Compatible => "SMIL compatible",
        }
    }
}

/// Command queued for a player; passed through into the descriptor untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerCommand {
    UpdateConfiguration,
    Reboot,
    UpdateFirmware,
    ClearCache,
    ClearWebcache,
    UpdateUrlsList,
}

impl PlayerCommand {
    /// Name used for the command on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            PlayerCommand::UpdateConfiguration => "update_configuration",
            PlayerCommand::Reboot => "reboot",
            PlayerCommand::UpdateFirmware => "update_firmware",
            PlayerCommand::ClearCache => "clear_cache",
            PlayerCommand::ClearWebcache => "clear_webcache",
            PlayerCommand::UpdateUrlsList => "update_urls_list",
        }
    }
}

impl fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDimension {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// A geometry value as stored: numeric, percent string or symbolic.
///
/// Stores accept both `top = 10` and `top = "10%"`, so the raw value is
/// normalised into its textual form on load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawDimension", into = "String")]
pub struct Dimension(String);

impl Dimension {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the stored value already carries a `%` suffix.
    pub fn is_percent(&self) -> bool {
        self.0.ends_with('%')
    }

    /// Render the value for the given export unit.
    ///
    /// Percent export appends `%` unless it is already present; pixel
    /// export leaves the stored value as is.
    pub fn with_unit(&self, unit: ExportUnit) -> String {
        match unit {
            ExportUnit::Percent if !self.is_percent() => format!("{}%", self.0),
            _ => self.0.clone(),
        }
    }
}

impl From<RawDimension> for Dimension {
    fn from(raw: RawDimension) -> Self {
        match raw {
            RawDimension::Integer(v) => Dimension(v.to_string()),
            RawDimension::Float(v) => Dimension(v.to_string()),
            RawDimension::Text(s) => Dimension::new(s),
        }
    }
}

impl From<Dimension> for String {
    fn from(value: Dimension) -> Self {
        value.0
    }
}

impl From<&str> for Dimension {
    fn from(value: &str) -> Self {
        Dimension::new(value)
    }
}

impl From<u32> for Dimension {
    fn from(value: u32) -> Self {
        Dimension(value.to_string())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One rectangular sub-region of a multi-zone canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone identifier, used as the region name.
    pub id: String,
    pub top: Dimension,
    pub left: Dimension,
    pub width: Dimension,
    pub height: Dimension,
    #[serde(default)]
    pub z_index: i32,
    /// Background colour; transparent when unset.
    #[serde(default)]
    pub background_color: Option<String>,
}

/// A single standby period within a weekday, as `HH:MM` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Screen goes dark at this time.
    pub start: String,
    /// Screen wakes at this time; `"00:00"` means dark until midnight.
    pub end: String,
}

impl Period {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Standby periods for one weekday (0 = Sunday .. 6 = Saturday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdaySchedule {
    pub weekday: u8,
    #[serde(default)]
    pub periods: Vec<Period>,
}

/// A set of category tags assigned to a player.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryGroup {
    pub tags: BTreeSet<String>,
}

impl CategoryGroup {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if every tag of this group is contained in `required`.
    ///
    /// An empty group never matches.
    pub fn matches(&self, required: &BTreeSet<String>) -> bool {
        !self.tags.is_empty() && self.tags.is_subset(required)
    }
}

fn default_refresh() -> u64 {
    DEFAULT_REFRESH_SECONDS
}

fn default_canvas_width() -> Dimension {
    Dimension::from(DEFAULT_CANVAS_WIDTH)
}

fn default_canvas_height() -> Dimension {
    Dimension::from(DEFAULT_CANVAS_HEIGHT)
}

/// Read-only player configuration snapshot passed into a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfiguration {
    /// Current playlist total duration (seconds).
    #[serde(default)]
    pub duration_seconds: u64,
    /// Configured baseline refresh interval (seconds).
    #[serde(default = "default_refresh")]
    pub refresh_seconds: u64,
    #[serde(default = "default_canvas_width")]
    pub canvas_width: Dimension,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: Dimension,
    #[serde(default)]
    pub playlist_mode: PlaylistMode,
    #[serde(default)]
    pub export_unit: ExportUnit,
    /// Zones; only meaningful in multi-zone mode.
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub categories: Vec<CategoryGroup>,
    /// Weekly standby table; empty means always on.
    #[serde(default)]
    pub screen_times: Vec<WeekdaySchedule>,
    #[serde(default)]
    pub model: PlayerModel,
    #[serde(default)]
    pub commands: Vec<PlayerCommand>,
}

impl Default for PlayerConfiguration {
    fn default() -> Self {
        Self {
            duration_seconds: 0,
            refresh_seconds: DEFAULT_REFRESH_SECONDS,
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            playlist_mode: PlaylistMode::SingleZone,
            export_unit: ExportUnit::Percent,
            zones: Vec::new(),
            categories: Vec::new(),
            screen_times: Vec::new(),
            model: PlayerModel::Unknown,
            commands: Vec::new(),
        }
    }
}

impl PlayerConfiguration {
    /// The configured zones, in display order.
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }
}
