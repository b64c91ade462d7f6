use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::settings::Settings;

/// Préfixe des adresses OSC.
pub const OSC_PREFIX: &str = "/rutt/";

/// Paramètre adressable par nom, OSC, MIDI ou LFO.
///
/// Chaque clé se lit et s'écrit comme un `f32` : les booléens valent 0 ou 1,
/// les entiers sont arrondis, les teintes pilotent la couleur correspondante.
///
/// # Example
/// ```
/// use rutt_core::{ParamKey, Settings};
/// let mut s = Settings::default();
/// let key = ParamKey::from_osc_address("/rutt/hwave").unwrap();
/// key.set(&mut s, 0.8);
/// assert_eq!(s.horizontal_wave, 0.8);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ParamKey {
    HorizontalResolution,
    VerticalResolution,
    Brightness,
    Contrast,
    Threshold,
    Gamma,
    EdgeDetect,
    Posterize,
    DisplacementStrength,
    DisplacementSmoothing,
    DisplacementOffset,
    InvertDisplacement,
    ZModulation,
    ZModFrequency,
    HorizontalPosition,
    VerticalPosition,
    HorizontalScale,
    VerticalScale,
    MeshScale,
    RotationX,
    RotationY,
    RotationZ,
    KeystoneH,
    KeystoneV,
    BarrelDistortion,
    ScanLineSkip,
    ShowHorizontalLines,
    ShowVerticalLines,
    Interlace,
    HorizontalWave,
    VerticalWave,
    WaveFrequency,
    WaveSpeed,
    LineWidth,
    LineTaper,
    GlowIntensity,
    PrimaryHue,
    SecondaryHue,
    ColorBlend,
    UseSourceColor,
    NoiseAmount,
    Persistence,
    ScanlineFlicker,
    Bloom,
    RandomizerEnabled,
    RandomizerSpeed,
    RandomizerIntensity,
    RandomizerSnapToBeats,
    PaletteAuto,
    PaletteInterval,
    PaletteTransition,
}

impl ParamKey {
    /// Toutes les clés, dans l'ordre de l'enregistrement.
    pub const ALL: [Self; 51] = [
        Self::HorizontalResolution,
        Self::VerticalResolution,
        Self::Brightness,
        Self::Contrast,
        Self::Threshold,
        Self::Gamma,
        Self::EdgeDetect,
        Self::Posterize,
        Self::DisplacementStrength,
        Self::DisplacementSmoothing,
        Self::DisplacementOffset,
        Self::InvertDisplacement,
        Self::ZModulation,
        Self::ZModFrequency,
        Self::HorizontalPosition,
        Self::VerticalPosition,
        Self::HorizontalScale,
        Self::VerticalScale,
        Self::MeshScale,
        Self::RotationX,
        Self::RotationY,
        Self::RotationZ,
        Self::KeystoneH,
        Self::KeystoneV,
        Self::BarrelDistortion,
        Self::ScanLineSkip,
        Self::ShowHorizontalLines,
        Self::ShowVerticalLines,
        Self::Interlace,
        Self::HorizontalWave,
        Self::VerticalWave,
        Self::WaveFrequency,
        Self::WaveSpeed,
        Self::LineWidth,
        Self::LineTaper,
        Self::GlowIntensity,
        Self::PrimaryHue,
        Self::SecondaryHue,
        Self::ColorBlend,
        Self::UseSourceColor,
        Self::NoiseAmount,
        Self::Persistence,
        Self::ScanlineFlicker,
        Self::Bloom,
        Self::RandomizerEnabled,
        Self::RandomizerSpeed,
        Self::RandomizerIntensity,
        Self::RandomizerSnapToBeats,
        Self::PaletteAuto,
        Self::PaletteInterval,
        Self::PaletteTransition,
    ];

    /// Nom canonique (snake_case).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::HorizontalResolution => "horizontal_resolution",
            Self::VerticalResolution => "vertical_resolution",
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Threshold => "threshold",
            Self::Gamma => "gamma",
            Self::EdgeDetect => "edge_detect",
            Self::Posterize => "posterize",
            Self::DisplacementStrength => "displacement_strength",
            Self::DisplacementSmoothing => "displacement_smoothing",
            Self::DisplacementOffset => "displacement_offset",
            Self::InvertDisplacement => "invert_displacement",
            Self::ZModulation => "z_modulation",
            Self::ZModFrequency => "z_mod_frequency",
            Self::HorizontalPosition => "horizontal_position",
            Self::VerticalPosition => "vertical_position",
            Self::HorizontalScale => "horizontal_scale",
            Self::VerticalScale => "vertical_scale",
            Self::MeshScale => "mesh_scale",
            Self::RotationX => "rotation_x",
            Self::RotationY => "rotation_y",
            Self::RotationZ => "rotation_z",
            Self::KeystoneH => "keystone_h",
            Self::KeystoneV => "keystone_v",
            Self::BarrelDistortion => "barrel_distortion",
            Self::ScanLineSkip => "scan_line_skip",
            Self::ShowHorizontalLines => "show_horizontal_lines",
            Self::ShowVerticalLines => "show_vertical_lines",
            Self::Interlace => "interlace",
            Self::HorizontalWave => "horizontal_wave",
            Self::VerticalWave => "vertical_wave",
            Self::WaveFrequency => "wave_frequency",
            Self::WaveSpeed => "wave_speed",
            Self::LineWidth => "line_width",
            Self::LineTaper => "line_taper",
            Self::GlowIntensity => "glow_intensity",
            Self::PrimaryHue => "primary_hue",
            Self::SecondaryHue => "secondary_hue",
            Self::ColorBlend => "color_blend",
            Self::UseSourceColor => "use_source_color",
            Self::NoiseAmount => "noise_amount",
            Self::Persistence => "persistence",
            Self::ScanlineFlicker => "scanline_flicker",
            Self::Bloom => "bloom",
            Self::RandomizerEnabled => "randomizer_enabled",
            Self::RandomizerSpeed => "randomizer_speed",
            Self::RandomizerIntensity => "randomizer_intensity",
            Self::RandomizerSnapToBeats => "randomizer_snap_to_beats",
            Self::PaletteAuto => "palette_auto",
            Self::PaletteInterval => "palette_interval",
            Self::PaletteTransition => "palette_transition",
        }
    }

    /// Alias courts acceptés en plus du nom canonique (forme normalisée).
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::HorizontalResolution => &["hres"],
            Self::VerticalResolution => &["vres"],
            Self::DisplacementStrength => &["displacement"],
            Self::DisplacementSmoothing => &["smoothing"],
            Self::DisplacementOffset => &["offset"],
            Self::InvertDisplacement => &["invert"],
            Self::ZModulation => &["zmod"],
            Self::ZModFrequency => &["zmodfreq"],
            Self::HorizontalPosition => &["hposition"],
            Self::VerticalPosition => &["vposition"],
            Self::HorizontalScale => &["hscale"],
            Self::VerticalScale => &["vscale"],
            Self::MeshScale => &["scale"],
            Self::BarrelDistortion => &["barrel"],
            Self::ScanLineSkip => &["skip", "scanskip"],
            Self::ShowHorizontalLines => &["hlines"],
            Self::ShowVerticalLines => &["vlines"],
            Self::HorizontalWave => &["hwave"],
            Self::VerticalWave => &["vwave"],
            Self::GlowIntensity => &["glow"],
            Self::UseSourceColor => &["sourcecolor"],
            Self::NoiseAmount => &["noise"],
            Self::ScanlineFlicker => &["flicker"],
            Self::RandomizerEnabled => &["randomizer", "randomize"],
            Self::RandomizerSnapToBeats => &["snaptobeats"],
            _ => &[],
        }
    }

    /// Résout un nom (canonique ou alias), insensible à la casse,
    /// aux `_` et aux `-`.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownParam`] if nothing matches.
    ///
    /// # Example
    /// ```
    /// use rutt_core::ParamKey;
    /// assert_eq!(ParamKey::from_name("HorizontalWave").unwrap(), ParamKey::HorizontalWave);
    /// assert_eq!(ParamKey::from_name("hwave").unwrap(), ParamKey::HorizontalWave);
    /// assert!(ParamKey::from_name("warp").is_err());
    /// ```
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        let wanted = normalize(name);
        Self::ALL
            .into_iter()
            .find(|k| normalize(k.name()) == wanted || k.aliases().contains(&wanted.as_str()))
            .ok_or_else(|| CoreError::UnknownParam {
                name: name.to_string(),
            })
    }

    /// Résout une adresse `/rutt/<param>`.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownParam`] for a foreign prefix or an unknown parameter.
    pub fn from_osc_address(address: &str) -> Result<Self, CoreError> {
        let lower = address.to_ascii_lowercase();
        match lower.strip_prefix(OSC_PREFIX) {
            Some(rest) if !rest.is_empty() => Self::from_name(rest),
            _ => Err(CoreError::UnknownParam {
                name: address.to_string(),
            }),
        }
    }

    /// `true` pour les paramètres booléens (écrits via `value > 0.5`).
    #[must_use]
    pub fn is_toggle(self) -> bool {
        matches!(
            self,
            Self::EdgeDetect
                | Self::InvertDisplacement
                | Self::ShowHorizontalLines
                | Self::ShowVerticalLines
                | Self::Interlace
                | Self::UseSourceColor
                | Self::RandomizerEnabled
                | Self::RandomizerSnapToBeats
                | Self::PaletteAuto
        )
    }

    /// Plage valide, identique à [`Settings::clamp_all`].
    #[must_use]
    pub fn range(self) -> (f32, f32) {
        match self {
            Self::HorizontalResolution => (16.0, 512.0),
            Self::VerticalResolution => (8.0, 256.0),
            Self::Brightness
            | Self::DisplacementOffset
            | Self::KeystoneH
            | Self::KeystoneV => (-1.0, 1.0),
            Self::Contrast
            | Self::Gamma
            | Self::HorizontalScale
            | Self::VerticalScale
            | Self::MeshScale => (0.1, 3.0),
            Self::Posterize | Self::ScanLineSkip => (1.0, 8.0),
            Self::DisplacementStrength
            | Self::ZModFrequency
            | Self::WaveSpeed
            | Self::PaletteTransition => (0.0, 5.0),
            Self::HorizontalPosition | Self::VerticalPosition => (-10.0, 10.0),
            Self::RotationX | Self::RotationY | Self::RotationZ => (-180.0, 180.0),
            Self::BarrelDistortion => (-0.5, 0.5),
            Self::HorizontalWave | Self::VerticalWave | Self::GlowIntensity => (0.0, 2.0),
            Self::WaveFrequency => (0.0, 10.0),
            Self::LineWidth => (0.001, 0.05),
            Self::RandomizerSpeed => (0.01, 1.0),
            Self::PaletteInterval => (5.0, 60.0),
            _ => (0.0, 1.0),
        }
    }

    /// Lit la valeur courante.
    #[must_use]
    pub fn get(self, s: &Settings) -> f32 {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            Self::HorizontalResolution => s.horizontal_resolution as f32,
            Self::VerticalResolution => s.vertical_resolution as f32,
            Self::Brightness => s.brightness,
            Self::Contrast => s.contrast,
            Self::Threshold => s.threshold,
            Self::Gamma => s.gamma,
            Self::EdgeDetect => flag(s.edge_detect),
            Self::Posterize => s.posterize as f32,
            Self::DisplacementStrength => s.displacement_strength,
            Self::DisplacementSmoothing => s.displacement_smoothing,
            Self::DisplacementOffset => s.displacement_offset,
            Self::InvertDisplacement => flag(s.invert_displacement),
            Self::ZModulation => s.z_modulation,
            Self::ZModFrequency => s.z_mod_frequency,
            Self::HorizontalPosition => s.horizontal_position,
            Self::VerticalPosition => s.vertical_position,
            Self::HorizontalScale => s.horizontal_scale,
            Self::VerticalScale => s.vertical_scale,
            Self::MeshScale => s.mesh_scale,
            Self::RotationX => s.rotation_x,
            Self::RotationY => s.rotation_y,
            Self::RotationZ => s.rotation_z,
            Self::KeystoneH => s.keystone_h,
            Self::KeystoneV => s.keystone_v,
            Self::BarrelDistortion => s.barrel_distortion,
            Self::ScanLineSkip => s.scan_line_skip as f32,
            Self::ShowHorizontalLines => flag(s.show_horizontal_lines),
            Self::ShowVerticalLines => flag(s.show_vertical_lines),
            Self::Interlace => flag(s.interlace),
            Self::HorizontalWave => s.horizontal_wave,
            Self::VerticalWave => s.vertical_wave,
            Self::WaveFrequency => s.wave_frequency,
            Self::WaveSpeed => s.wave_speed,
            Self::LineWidth => s.line_width,
            Self::LineTaper => s.line_taper,
            Self::GlowIntensity => s.glow_intensity,
            Self::PrimaryHue => s.primary_color.hue(),
            Self::SecondaryHue => s.secondary_color.hue(),
            Self::ColorBlend => s.color_blend,
            Self::UseSourceColor => flag(s.use_source_color),
            Self::NoiseAmount => s.noise_amount,
            Self::Persistence => s.persistence,
            Self::ScanlineFlicker => s.scanline_flicker,
            Self::Bloom => s.bloom,
            Self::RandomizerEnabled => flag(s.randomizer_enabled),
            Self::RandomizerSpeed => s.randomizer_speed,
            Self::RandomizerIntensity => s.randomizer_intensity,
            Self::RandomizerSnapToBeats => flag(s.randomizer_snap_to_beats),
            Self::PaletteAuto => flag(s.palette_auto),
            Self::PaletteInterval => s.palette_interval,
            Self::PaletteTransition => s.palette_transition,
        }
    }

    /// Écrit `value` clampée dans [`ParamKey::range`]. NaN est ignoré.
    pub fn set(self, s: &mut Settings, value: f32) {
        if value.is_nan() {
            log::warn!("{} : valeur NaN ignorée", self.name());
            return;
        }
        let (lo, hi) = self.range();
        let v = value.clamp(lo, hi);
        let on = value > 0.5;
        let int = v.round() as u32;
        match self {
            Self::HorizontalResolution => s.horizontal_resolution = int,
            Self::VerticalResolution => s.vertical_resolution = int,
            Self::Brightness => s.brightness = v,
            Self::Contrast => s.contrast = v,
            Self::Threshold => s.threshold = v,
            Self::Gamma => s.gamma = v,
            Self::EdgeDetect => s.edge_detect = on,
            Self::Posterize => s.posterize = int,
            Self::DisplacementStrength => s.displacement_strength = v,
            Self::DisplacementSmoothing => s.displacement_smoothing = v,
            Self::DisplacementOffset => s.displacement_offset = v,
            Self::InvertDisplacement => s.invert_displacement = on,
            Self::ZModulation => s.z_modulation = v,
            Self::ZModFrequency => s.z_mod_frequency = v,
            Self::HorizontalPosition => s.horizontal_position = v,
            Self::VerticalPosition => s.vertical_position = v,
            Self::HorizontalScale => s.horizontal_scale = v,
            Self::VerticalScale => s.vertical_scale = v,
            Self::MeshScale => s.mesh_scale = v,
            Self::RotationX => s.rotation_x = v,
            Self::RotationY => s.rotation_y = v,
            Self::RotationZ => s.rotation_z = v,
            Self::KeystoneH => s.keystone_h = v,
            Self::KeystoneV => s.keystone_v = v,
            Self::BarrelDistortion => s.barrel_distortion = v,
            Self::ScanLineSkip => s.scan_line_skip = int,
            Self::ShowHorizontalLines => s.show_horizontal_lines = on,
            Self::ShowVerticalLines => s.show_vertical_lines = on,
            Self::Interlace => s.interlace = on,
            Self::HorizontalWave => s.horizontal_wave = v,
            Self::VerticalWave => s.vertical_wave = v,
            Self::WaveFrequency => s.wave_frequency = v,
            Self::WaveSpeed => s.wave_speed = v,
            Self::LineWidth => s.line_width = v,
            Self::LineTaper => s.line_taper = v,
            Self::GlowIntensity => s.glow_intensity = v,
            Self::PrimaryHue => s.primary_color = s.primary_color.with_hue(value),
            Self::SecondaryHue => s.secondary_color = s.secondary_color.with_hue(value),
            Self::ColorBlend => s.color_blend = v,
            Self::UseSourceColor => s.use_source_color = on,
            Self::NoiseAmount => s.noise_amount = v,
            Self::Persistence => s.persistence = v,
            Self::ScanlineFlicker => s.scanline_flicker = v,
            Self::Bloom => s.bloom = v,
            Self::RandomizerEnabled => s.randomizer_enabled = on,
            Self::RandomizerSpeed => s.randomizer_speed = v,
            Self::RandomizerIntensity => s.randomizer_intensity = v,
            Self::RandomizerSnapToBeats => s.randomizer_snap_to_beats = on,
            Self::PaletteAuto => s.palette_auto = on,
            Self::PaletteInterval => s.palette_interval = v,
            Self::PaletteTransition => s.palette_transition = v,
        }
    }

    /// Inverse un booléen ; sans effet sur les paramètres continus.
    pub fn toggle(self, s: &mut Settings) {
        if self.is_toggle() {
            let current = self.get(s);
            self.set(s, 1.0 - current);
        }
    }
}

impl std::fmt::Display for ParamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ParamKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl Settings {
    /// Lecture par nom.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownParam`] if `name` resolves to no key.
    pub fn get_param(&self, name: &str) -> Result<f32, CoreError> {
        Ok(ParamKey::from_name(name)?.get(self))
    }

    /// Écriture par nom, clampée.
    ///
    /// # Errors
    /// Returns [`CoreError::UnknownParam`] if `name` resolves to no key.
    pub fn set_param(&mut self, name: &str, value: f32) -> Result<(), CoreError> {
        ParamKey::from_name(name)?.set(self, value);
        Ok(())
    }
}
