use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Instantané nommé de tous les paramètres.
///
/// Sérialisé en JSON à plat : métadonnées et champs des [`Settings`]
/// au même niveau. Les champs absents d'un fichier reprennent leur défaut.
///
/// # Example
/// ```
/// use rutt_core::{Preset, Settings};
/// let mut live = Settings::default();
/// live.contrast = 2.0;
/// let p = Preset::capture(&live, "dense");
/// let mut other = Settings::default();
/// p.apply_to(&mut other);
/// assert_eq!(other.contrast, 2.0);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub settings: Settings,
}

impl Preset {
    /// Preset horodaté portant les valeurs données.
    #[must_use]
    pub fn new(name: impl Into<String>, settings: Settings) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            created_at: Utc::now(),
            settings,
        }
    }

    /// Capture l'état courant. Un nom vide devient `Preset_HHMMSS`.
    #[must_use]
    pub fn capture(settings: &Settings, name: &str) -> Self {
        let now = Utc::now();
        let name = if name.trim().is_empty() {
            format!("Preset_{}", now.format("%H%M%S"))
        } else {
            name.to_string()
        };
        Self {
            name,
            description: String::new(),
            created_at: now,
            settings: settings.clone(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Applique le preset. La résolution de grille de `target` est conservée :
    /// un preset décrit un look, pas une topologie.
    pub fn apply_to(&self, target: &mut Settings) {
        let (h, v) = (target.horizontal_resolution, target.vertical_resolution);
        *target = self.settings.clone();
        target.horizontal_resolution = h;
        target.vertical_resolution = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    fn tweaked() -> Settings {
        Settings {
            brightness: -0.2,
            gamma: 1.7,
            posterize: 3,
            invert_displacement: true,
            rotation_y: 45.0,
            scan_line_skip: 2,
            show_vertical_lines: true,
            primary_color: Rgba::new(1.0, 0.0, 0.5, 1.0),
            scanline_flicker: 0.1,
            ..Settings::default()
        }
    }

    #[test]
    fn capture_apply_roundtrip_is_identity() {
        let live = tweaked();
        let mut target = live.clone();
        Preset::capture(&live, "x").apply_to(&mut target);
        assert_eq!(target, live);
    }

    #[test]
    fn apply_keeps_grid_resolution() {
        let p = Preset::capture(&tweaked(), "x");
        let mut target = Settings {
            horizontal_resolution: 32,
            vertical_resolution: 16,
            ..Settings::default()
        };
        p.apply_to(&mut target);
        assert_eq!(target.horizontal_resolution, 32);
        assert_eq!(target.vertical_resolution, 16);
        assert_eq!(target.gamma, 1.7);
    }

    #[test]
    fn empty_name_is_timestamped() {
        let p = Preset::capture(&Settings::default(), "  ");
        assert!(p.name.starts_with("Preset_"));
        assert_eq!(p.name.len(), "Preset_".len() + 6);
    }

    #[test]
    fn json_is_flat_and_roundtrips() {
        let p = Preset::capture(&tweaked(), "Flat").with_description("test");
        let json = serde_json::to_string_pretty(&p).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "Flat");
        assert_eq!(value["posterize"], 3);
        let back: Preset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let back: Preset = serde_json::from_str(r#"{"name":"Sparse","contrast":2.0}"#).unwrap();
        assert_eq!(back.settings.contrast, 2.0);
        assert_eq!(back.settings.gamma, 1.0);
        assert!(back.description.is_empty());
    }
}
