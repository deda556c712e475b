//! Root canvas and playback region geometry.

use quick_xml::escape::escape;
use serde::Serialize;

use crate::types::{PlayerConfiguration, PlaylistMode};

/// Region name used by single-zone playlists.
pub const SINGLE_REGION_NAME: &str = "screen";

/// Background for regions without a configured colour.
pub const TRANSPARENT: &str = "transparent";

/// One rectangular playback region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub name: String,
    pub top: String,
    pub left: String,
    pub width: String,
    pub height: String,
    pub z_index: i32,
    pub background_color: String,
}

/// Canvas size plus its playback regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub canvas_width: String,
    pub canvas_height: String,
    pub regions: Vec<Region>,
}

/// Compute the layout for a player.
///
/// Single-zone players always get exactly one full-canvas region, whatever
/// zone data the snapshot carries. Multi-zone players get one region per
/// zone; an empty zone list yields an empty canvas.
pub fn compute(config: &PlayerConfiguration) -> Layout {
    let canvas_width = config.canvas_width.to_string();
    let canvas_height = config.canvas_height.to_string();

    let regions = match config.playlist_mode {
        PlaylistMode::SingleZone => vec![Region {
            name: SINGLE_REGION_NAME.to_string(),
            top: "0".to_string(),
            left: "0".to_string(),
            width: canvas_width.clone(),
            height: canvas_height.clone(),
            z_index: 0,
            background_color: TRANSPARENT.to_string(),
        }],
        PlaylistMode::Multizone => config
            .zones()
            .iter()
            .map(|zone| Region {
                name: zone.id.clone(),
                top: zone.top.with_unit(config.export_unit),
                left: zone.left.with_unit(config.export_unit),
                width: zone.width.with_unit(config.export_unit),
                height: zone.height.with_unit(config.export_unit),
                z_index: zone.z_index,
                background_color: zone
                    .background_color
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .unwrap_or(TRANSPARENT)
                    .to_string(),
            })
            .collect(),
    };

    Layout {
        canvas_width,
        canvas_height,
        regions,
    }
}

impl Layout {
    /// Render the `<layout>` element.
    pub fn to_smil(&self) -> String {
        let mut out = String::from("<layout>\n");
        out.push_str(&format!(
            "    <root-layout width=\"{}\" height=\"{}\" />\n",
            escape(self.canvas_width.as_str()),
            escape(self.canvas_height.as_str())
        ));
        for region in &self.regions {
            out.push_str(&format!(
                "    <region regionName=\"{}\" top=\"{}\" left=\"{}\" width=\"{}\" height=\"{}\" z-index=\"{}\" backgroundColor=\"{}\" />\n",
                escape(region.name.as_str()),
                escape(region.top.as_str()),
                escape(region.left.as_str()),
                escape(region.width.as_str()),
                escape(region.height.as_str()),
                region.z_index,
                escape(region.background_color.as_str())
            ));
        }
        out.push_str("</layout>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dimension, ExportUnit, Zone};

    fn zone(id: &str, top: &str, left: &str, width: &str, height: &str) -> Zone {
        Zone {
            id: id.to_string(),
            top: Dimension::from(top),
            left: Dimension::from(left),
            width: Dimension::from(width),
            height: Dimension::from(height),
            z_index: 1,
            background_color: None,
        }
    }

    #[test]
    fn test_single_zone_spans_canvas() {
        let config = PlayerConfiguration {
            canvas_width: Dimension::from("1280"),
            canvas_height: Dimension::from("720"),
            zones: vec![zone("left", "0", "0", "50", "100")],
            ..Default::default()
        };
        let layout = compute(&config);
        assert_eq!(layout.regions.len(), 1);
        let region = &layout.regions[0];
        assert_eq!(region.name, "screen");
        assert_eq!((region.top.as_str(), region.left.as_str()), ("0", "0"));
        assert_eq!((region.width.as_str(), region.height.as_str()), ("1280", "720"));
        assert_eq!(region.z_index, 0);
        assert_eq!(region.background_color, "transparent");
    }

    #[test]
    fn test_multizone_percent_geometry() {
        let mut right = zone("right", "0", "50", "50%", "100");
        right.background_color = Some("#000000".to_string());
        right.z_index = 2;
        let config = PlayerConfiguration {
            playlist_mode: PlaylistMode::Multizone,
            zones: vec![zone("left", "0", "0", "50", "100"), right],
            ..Default::default()
        };
        let layout = compute(&config);
        assert_eq!(layout.regions.len(), 2);
        assert_eq!(layout.regions[0].width, "50%");
        assert_eq!(layout.regions[0].background_color, "transparent");
        assert_eq!(layout.regions[1].left, "50%");
        assert_eq!(layout.regions[1].width, "50%");
        assert_eq!(layout.regions[1].z_index, 2);
        assert_eq!(layout.regions[1].background_color, "#000000");
    }

    #[test]
    fn test_multizone_pixel_geometry() {
        let config = PlayerConfiguration {
            playlist_mode: PlaylistMode::Multizone,
            export_unit: ExportUnit::Pixel,
            zones: vec![zone("ticker", "980", "0", "1920", "100")],
            ..Default::default()
        };
        let region = &compute(&config).regions[0];
        assert_eq!(region.top, "980");
        assert_eq!(region.width, "1920");
    }

    #[test]
    fn test_multizone_without_zones_is_blank() {
        let config = PlayerConfiguration {
            playlist_mode: PlaylistMode::Multizone,
            ..Default::default()
        };
        let layout = compute(&config);
        assert!(layout.regions.is_empty());
        assert_eq!(
            layout.to_smil(),
            "<layout>\n    <root-layout width=\"1920\" height=\"1080\" />\n</layout>"
        );
    }

    #[test]
    fn test_to_smil_escapes_attributes() {
        let mut z = zone("a\"b", "0", "0", "10", "10");
        z.background_color = Some("<red>".to_string());
        let config = PlayerConfiguration {
            playlist_mode: PlaylistMode::Multizone,
            zones: vec![z],
            ..Default::default()
        };
        let smil = compute(&config).to_smil();
        assert!(smil.contains("regionName=\"a&quot;b\""));
        assert!(smil.contains("backgroundColor=\"&lt;red&gt;\""));
    }
}
