use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;

/// Plus petite grille valide (division par `res - 1`).
pub const MIN_RESOLUTION: u32 = 2;

/// Enregistrement complet des paramètres du synthétiseur, lu à chaque tick.
///
/// Les plages sont clampées à la frontière (UI, TOML, OSC, MIDI) par
/// [`Settings::clamp_all`], jamais en interne : le moteur de déplacement
/// se protège lui-même contre les échelles et largeurs dégénérées.
///
/// # Example
/// ```
/// use rutt_core::Settings;
/// let s = Settings::default();
/// assert_eq!(s.horizontal_resolution, 128);
/// assert_eq!(s.vertical_resolution, 64);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    // === Résolution ===
    /// Colonnes de la grille [16, 512].
    pub horizontal_resolution: u32,
    /// Lignes de la grille [8, 256].
    pub vertical_resolution: u32,

    // === Signal d'entrée ===
    /// Offset de luminance [-1.0, 1.0].
    pub brightness: f32,
    /// Gain de luminance [0.1, 3.0].
    pub contrast: f32,
    /// Luminance ≤ seuil forcée à 0 [0.0, 1.0].
    pub threshold: f32,
    /// Exposant gamma [0.1, 3.0].
    pub gamma: f32,
    /// Remplace la luminance par un gradient 4-voisins.
    pub edge_detect: bool,
    /// Nombre de niveaux de postérisation. 1 = désactivé.
    pub posterize: u32,

    // === Déplacement ===
    /// Multiplicateur Z [0.0, 5.0].
    pub displacement_strength: f32,
    /// Lissage temporel [0.0, 1.0]. 1 = figé, 0 = instantané.
    pub displacement_smoothing: f32,
    /// Ajouté à la luminance avant multiplication [-1.0, 1.0].
    pub displacement_offset: f32,
    pub invert_displacement: bool,
    /// Amplitude de l'oscillation Z globale [0.0, 1.0].
    pub z_modulation: f32,
    pub z_mod_frequency: f32,

    // === Transformation raster ===
    pub horizontal_position: f32,
    pub vertical_position: f32,
    pub horizontal_scale: f32,
    pub vertical_scale: f32,
    pub mesh_scale: f32,
    /// Rotations en degrés.
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub rotation_z: f32,
    pub keystone_h: f32,
    pub keystone_v: f32,
    /// > 0 = barillet, < 0 = coussinet.
    pub barrel_distortion: f32,

    // === Lignes de balayage ===
    /// Pas entre lignes visibles [1, 8].
    pub scan_line_skip: u32,
    pub show_horizontal_lines: bool,
    pub show_vertical_lines: bool,
    /// Une ligne sur deux invisible, alternée à chaque frame.
    pub interlace: bool,

    // === Ondulation ===
    pub horizontal_wave: f32,
    pub vertical_wave: f32,
    pub wave_frequency: f32,
    pub wave_speed: f32,

    // === Style de ligne ===
    pub line_width: f32,
    pub line_taper: f32,
    pub glow_intensity: f32,

    // === Couleur ===
    pub primary_color: Rgba,
    pub secondary_color: Rgba,
    pub color_blend: f32,
    pub use_source_color: bool,
    /// Fond transmis au renderer avec le style de ligne.
    pub background_color: Rgba,

    // === Post ===
    pub noise_amount: f32,
    pub persistence: f32,
    pub scanline_flicker: f32,
    pub bloom: f32,

    // === Dérive aléatoire ===
    pub randomizer_enabled: bool,
    /// Vitesse de parcours du bruit [0.01, 1.0].
    pub randomizer_speed: f32,
    /// Intensité globale de la dérive [0.0, 1.0].
    pub randomizer_intensity: f32,
    /// La dérive ne bouge qu'aux beats.
    pub randomizer_snap_to_beats: bool,

    // === Palettes ===
    /// Passe à la palette suivante toutes les `palette_interval` secondes.
    pub palette_auto: bool,
    /// Secondes entre deux palettes automatiques [5.0, 60.0].
    pub palette_interval: f32,
    /// Durée des transitions de palette [0.0, 5.0]. 0 = instantané.
    pub palette_transition: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            horizontal_resolution: 128,
            vertical_resolution: 64,
            brightness: 0.0,
            contrast: 1.0,
            threshold: 0.0,
            gamma: 1.0,
            edge_detect: false,
            posterize: 1,
            displacement_strength: 1.0,
            displacement_smoothing: 0.5,
            displacement_offset: 0.0,
            invert_displacement: false,
            z_modulation: 0.0,
            z_mod_frequency: 1.0,
            horizontal_position: 0.0,
            vertical_position: 0.0,
            horizontal_scale: 1.0,
            vertical_scale: 1.0,
            mesh_scale: 1.0,
            rotation_x: 0.0,
            rotation_y: 0.0,
            rotation_z: 0.0,
            keystone_h: 0.0,
            keystone_v: 0.0,
            barrel_distortion: 0.0,
            scan_line_skip: 1,
            show_horizontal_lines: true,
            show_vertical_lines: false,
            interlace: false,
            horizontal_wave: 0.0,
            vertical_wave: 0.0,
            wave_frequency: 1.0,
            wave_speed: 1.0,
            line_width: 0.01,
            line_taper: 0.0,
            glow_intensity: 0.5,
            primary_color: Rgba::GREEN,
            secondary_color: Rgba::CYAN,
            color_blend: 0.5,
            use_source_color: false,
            background_color: Rgba::BLACK,
            noise_amount: 0.0,
            persistence: 0.0,
            scanline_flicker: 0.0,
            bloom: 0.0,
            randomizer_enabled: false,
            randomizer_speed: 0.1,
            randomizer_intensity: 0.5,
            randomizer_snap_to_beats: false,
            palette_auto: false,
            palette_interval: 15.0,
            palette_transition: 2.0,
        }
    }
}

impl Settings {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization and by external writers.
    pub fn clamp_all(&mut self) {
        self.horizontal_resolution = self.horizontal_resolution.clamp(16, 512);
        self.vertical_resolution = self.vertical_resolution.clamp(8, 256);

        self.brightness = self.brightness.clamp(-1.0, 1.0);
        self.contrast = self.contrast.clamp(0.1, 3.0);
        self.threshold = self.threshold.clamp(0.0, 1.0);
        self.gamma = self.gamma.clamp(0.1, 3.0);
        self.posterize = self.posterize.clamp(1, 8);

        self.displacement_strength = self.displacement_strength.clamp(0.0, 5.0);
        self.displacement_smoothing = self.displacement_smoothing.clamp(0.0, 1.0);
        self.displacement_offset = self.displacement_offset.clamp(-1.0, 1.0);
        self.z_modulation = self.z_modulation.clamp(0.0, 1.0);
        self.z_mod_frequency = self.z_mod_frequency.clamp(0.0, 5.0);

        self.horizontal_position = self.horizontal_position.clamp(-10.0, 10.0);
        self.vertical_position = self.vertical_position.clamp(-10.0, 10.0);
        self.horizontal_scale = self.horizontal_scale.clamp(0.1, 3.0);
        self.vertical_scale = self.vertical_scale.clamp(0.1, 3.0);
        self.mesh_scale = self.mesh_scale.clamp(0.1, 3.0);
        self.rotation_x = self.rotation_x.clamp(-180.0, 180.0);
        self.rotation_y = self.rotation_y.clamp(-180.0, 180.0);
        self.rotation_z = self.rotation_z.clamp(-180.0, 180.0);
        self.keystone_h = self.keystone_h.clamp(-1.0, 1.0);
        self.keystone_v = self.keystone_v.clamp(-1.0, 1.0);
        self.barrel_distortion = self.barrel_distortion.clamp(-0.5, 0.5);

        self.scan_line_skip = self.scan_line_skip.clamp(1, 8);

        self.horizontal_wave = self.horizontal_wave.clamp(0.0, 2.0);
        self.vertical_wave = self.vertical_wave.clamp(0.0, 2.0);
        self.wave_frequency = self.wave_frequency.clamp(0.0, 10.0);
        self.wave_speed = self.wave_speed.clamp(0.0, 5.0);

        self.line_width = self.line_width.clamp(0.001, 0.05);
        self.line_taper = self.line_taper.clamp(0.0, 1.0);
        self.glow_intensity = self.glow_intensity.clamp(0.0, 2.0);
        self.color_blend = self.color_blend.clamp(0.0, 1.0);

        self.noise_amount = self.noise_amount.clamp(0.0, 1.0);
        self.persistence = self.persistence.clamp(0.0, 1.0);
        self.scanline_flicker = self.scanline_flicker.clamp(0.0, 1.0);
        self.bloom = self.bloom.clamp(0.0, 1.0);

        self.randomizer_speed = self.randomizer_speed.clamp(0.01, 1.0);
        self.randomizer_intensity = self.randomizer_intensity.clamp(0.0, 1.0);
        self.palette_interval = self.palette_interval.clamp(5.0, 60.0);
        self.palette_transition = self.palette_transition.clamp(0.0, 5.0);
    }

    /// Résolution effective de la grille, jamais sous 2×2.
    ///
    /// # Example
    /// ```
    /// use rutt_core::Settings;
    /// let mut s = Settings::default();
    /// s.horizontal_resolution = 1;
    /// assert_eq!(s.grid_size(), (2, 64));
    /// ```
    #[must_use]
    pub fn grid_size(&self) -> (u32, u32) {
        (
            self.horizontal_resolution.max(MIN_RESOLUTION),
            self.vertical_resolution.max(MIN_RESOLUTION),
        )
    }
}

/// Échantillonnage source → grille.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum Sampling {
    /// Interpolation bilinéaire (défaut).
    #[default]
    Bilinear,
    /// Plus proche voisin.
    Nearest,
}

/// Paramètres fixes du moteur, hors de l'enregistrement modulable.
///
/// # Example
/// ```
/// use rutt_core::settings::MeshConfig;
/// let m = MeshConfig::default();
/// assert_eq!((m.mesh_width, m.mesh_height), (16.0, 9.0));
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Largeur du plan de base en unités monde.
    pub mesh_width: f32,
    /// Hauteur du plan de base en unités monde.
    pub mesh_height: f32,
    pub sampling: Sampling,
    /// Graine du RNG (flicker, glitch).
    pub seed: u64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            mesh_width: 16.0,
            mesh_height: 9.0,
            sampling: Sampling::Bilinear,
            seed: 0x5EED_CAFE,
        }
    }
}

/// Configuration complète issue d'un fichier TOML.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuttConfig {
    pub settings: Settings,
    pub mesh: MeshConfig,
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    input: Option<InputSection>,
    displacement: Option<DisplacementSection>,
    raster: Option<RasterSection>,
    scan: Option<ScanSection>,
    wave: Option<WaveSection>,
    line: Option<LineSection>,
    color: Option<ColorSection>,
    post: Option<PostSection>,
    randomizer: Option<RandomizerSection>,
    palette: Option<PaletteSection>,
    mesh: Option<MeshSection>,
}

#[derive(Deserialize)]
struct InputSection {
    brightness: Option<f32>,
    contrast: Option<f32>,
    threshold: Option<f32>,
    gamma: Option<f32>,
    edge_detect: Option<bool>,
    posterize: Option<u32>,
}

#[derive(Deserialize)]
struct DisplacementSection {
    strength: Option<f32>,
    smoothing: Option<f32>,
    offset: Option<f32>,
    invert: Option<bool>,
    z_modulation: Option<f32>,
    z_mod_frequency: Option<f32>,
}

#[derive(Deserialize)]
struct RasterSection {
    horizontal_position: Option<f32>,
    vertical_position: Option<f32>,
    horizontal_scale: Option<f32>,
    vertical_scale: Option<f32>,
    scale: Option<f32>,
    rotation_x: Option<f32>,
    rotation_y: Option<f32>,
    rotation_z: Option<f32>,
    keystone_h: Option<f32>,
    keystone_v: Option<f32>,
    barrel: Option<f32>,
}

#[derive(Deserialize)]
struct ScanSection {
    skip: Option<u32>,
    show_horizontal: Option<bool>,
    show_vertical: Option<bool>,
    interlace: Option<bool>,
}

#[derive(Deserialize)]
struct WaveSection {
    horizontal: Option<f32>,
    vertical: Option<f32>,
    frequency: Option<f32>,
    speed: Option<f32>,
}

#[derive(Deserialize)]
struct LineSection {
    width: Option<f32>,
    taper: Option<f32>,
    glow: Option<f32>,
}

#[derive(Deserialize)]
struct ColorSection {
    primary: Option<Rgba>,
    secondary: Option<Rgba>,
    blend: Option<f32>,
    use_source: Option<bool>,
    background: Option<Rgba>,
}

#[derive(Deserialize)]
struct PostSection {
    noise: Option<f32>,
    persistence: Option<f32>,
    flicker: Option<f32>,
    bloom: Option<f32>,
}

#[derive(Deserialize)]
struct RandomizerSection {
    enabled: Option<bool>,
    speed: Option<f32>,
    intensity: Option<f32>,
    snap_to_beats: Option<bool>,
}

#[derive(Deserialize)]
struct PaletteSection {
    auto: Option<bool>,
    interval: Option<f32>,
    transition: Option<f32>,
}

#[derive(Deserialize)]
struct MeshSection {
    horizontal_resolution: Option<u32>,
    vertical_resolution: Option<u32>,
    width: Option<f32>,
    height: Option<f32>,
    sampling: Option<Sampling>,
    seed: Option<u64>,
}

/// Copie chaque champ `Some` de la section vers sa cible.
macro_rules! merge {
    ($dst:expr, $src:expr; $($from:ident => $to:ident),* $(,)?) => {
        $(
            if let Some(v) = $src.$from {
                $dst.$to = v;
            }
        )*
    };
}

/// Parse un document TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the document is not valid TOML for this layout.
///
/// # Example
/// ```
/// use rutt_core::settings::parse_config;
/// let cfg = parse_config("[wave]\nhorizontal = 0.5\n", "inline").unwrap();
/// assert_eq!(cfg.settings.horizontal_wave, 0.5);
/// ```
pub fn parse_config(content: &str, origin: &str) -> Result<RuttConfig> {
    let file: ConfigFile = toml::from_str(content)
        .with_context(|| format!("Erreur de parsing TOML dans {origin}"))?;

    let mut s = Settings::default();
    let mut mesh = MeshConfig::default();

    if let Some(sec) = file.input {
        merge!(s, sec;
            brightness => brightness,
            contrast => contrast,
            threshold => threshold,
            gamma => gamma,
            edge_detect => edge_detect,
            posterize => posterize,
        );
    }
    if let Some(sec) = file.displacement {
        merge!(s, sec;
            strength => displacement_strength,
            smoothing => displacement_smoothing,
            offset => displacement_offset,
            invert => invert_displacement,
            z_modulation => z_modulation,
            z_mod_frequency => z_mod_frequency,
        );
    }
    if let Some(sec) = file.raster {
        merge!(s, sec;
            horizontal_position => horizontal_position,
            vertical_position => vertical_position,
            horizontal_scale => horizontal_scale,
            vertical_scale => vertical_scale,
            scale => mesh_scale,
            rotation_x => rotation_x,
            rotation_y => rotation_y,
            rotation_z => rotation_z,
            keystone_h => keystone_h,
            keystone_v => keystone_v,
            barrel => barrel_distortion,
        );
    }
    if let Some(sec) = file.scan {
        merge!(s, sec;
            skip => scan_line_skip,
            show_horizontal => show_horizontal_lines,
            show_vertical => show_vertical_lines,
            interlace => interlace,
        );
    }
    if let Some(sec) = file.wave {
        merge!(s, sec;
            horizontal => horizontal_wave,
            vertical => vertical_wave,
            frequency => wave_frequency,
            speed => wave_speed,
        );
    }
    if let Some(sec) = file.line {
        merge!(s, sec;
            width => line_width,
            taper => line_taper,
            glow => glow_intensity,
        );
    }
    if let Some(sec) = file.color {
        merge!(s, sec;
            primary => primary_color,
            secondary => secondary_color,
            blend => color_blend,
            use_source => use_source_color,
            background => background_color,
        );
    }
    if let Some(sec) = file.post {
        merge!(s, sec;
            noise => noise_amount,
            persistence => persistence,
            flicker => scanline_flicker,
            bloom => bloom,
        );
    }
    if let Some(sec) = file.randomizer {
        merge!(s, sec;
            enabled => randomizer_enabled,
            speed => randomizer_speed,
            intensity => randomizer_intensity,
            snap_to_beats => randomizer_snap_to_beats,
        );
    }
    if let Some(sec) = file.palette {
        merge!(s, sec;
            auto => palette_auto,
            interval => palette_interval,
            transition => palette_transition,
        );
    }
    if let Some(sec) = file.mesh {
        merge!(s, sec;
            horizontal_resolution => horizontal_resolution,
            vertical_resolution => vertical_resolution,
        );
        merge!(mesh, sec;
            width => mesh_width,
            height => mesh_height,
            sampling => sampling,
            seed => seed,
        );
    }

    let before = s.clone();
    s.clamp_all();
    if s != before {
        log::warn!("{origin} : valeurs hors plage clampées");
    }
    if !(mesh.mesh_width > 0.0 && mesh.mesh_height > 0.0) {
        log::warn!(
            "{origin} : plan {}×{} invalide, retour au défaut",
            mesh.mesh_width,
            mesh.mesh_height
        );
        let d = MeshConfig::default();
        mesh.mesh_width = d.mesh_width;
        mesh.mesh_height = d.mesh_height;
    }

    Ok(RuttConfig { settings: s, mesh })
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use rutt_core::settings::load_config;
/// use std::path::Path;
/// let cfg = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<RuttConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content, &path.display().to_string())
}

/// Raccourci de [`load_config`] qui ne garde que les [`Settings`].
///
/// # Errors
/// Same as [`load_config`].
pub fn load_settings(path: &Path) -> Result<Settings> {
    load_config(path).map(|c| c.settings)
}

/// Poignée partagée sur les [`Settings`] courants.
///
/// Les écrivains (UI, OSC, MIDI, animateur) publient une nouvelle version
/// complète ; le moteur prend un instantané par tick et ne voit jamais
/// d'état à moitié écrit.
///
/// # Example
/// ```
/// use rutt_core::SettingsHandle;
/// let handle = SettingsHandle::default();
/// handle.update(|s| s.displacement_strength = 2.0);
/// assert_eq!(handle.snapshot().displacement_strength, 2.0);
/// ```
#[derive(Clone, Debug)]
pub struct SettingsHandle {
    inner: Arc<ArcSwap<Settings>>,
}

impl Default for SettingsHandle {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SettingsHandle {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(settings)),
        }
    }

    /// Instantané immuable pour la durée d'un tick.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Settings> {
        self.inner.load_full()
    }

    /// Remplace l'enregistrement complet.
    pub fn store(&self, settings: Settings) {
        self.inner.store(Arc::new(settings));
    }

    /// Read-copy-update : `f` peut être rejouée si un autre écrivain passe entre-temps.
    pub fn update<F>(&self, f: F)
    where
        F: Fn(&mut Settings),
    {
        self.inner.rcu(|current| {
            let mut next = Settings::clone(current);
            f(&mut next);
            next
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_within_ranges() {
        let d = Settings::default();
        let mut c = d.clone();
        c.clamp_all();
        assert_eq!(d, c);
    }

    #[test]
    fn clamp_pulls_out_of_range_values_back() {
        let mut s = Settings {
            contrast: 10.0,
            line_width: 0.0,
            scan_line_skip: 0,
            horizontal_resolution: 4,
            barrel_distortion: -3.0,
            ..Settings::default()
        };
        s.clamp_all();
        assert_eq!(s.contrast, 3.0);
        assert_eq!(s.line_width, 0.001);
        assert_eq!(s.scan_line_skip, 1);
        assert_eq!(s.horizontal_resolution, 16);
        assert_eq!(s.barrel_distortion, -0.5);
    }

    #[test]
    fn sections_merge_over_defaults() {
        let toml = r#"
            [input]
            gamma = 2.0
            posterize = 4

            [displacement]
            strength = 3.0
            invert = true

            [raster]
            scale = 1.5
            barrel = 0.2

            [scan]
            skip = 2
            show_vertical = true

            [color]
            primary = { r = 1.0, g = 0.0, b = 0.0, a = 1.0 }

            [randomizer]
            enabled = true
            speed = 4.0

            [palette]
            auto = true
            interval = 30.0

            [mesh]
            horizontal_resolution = 64
            width = 8.0
            sampling = "Nearest"
            seed = 7
        "#;
        let cfg = parse_config(toml, "test").unwrap();
        let s = &cfg.settings;
        assert_eq!(s.gamma, 2.0);
        assert_eq!(s.posterize, 4);
        assert_eq!(s.displacement_strength, 3.0);
        assert!(s.invert_displacement);
        assert_eq!(s.mesh_scale, 1.5);
        assert_eq!(s.barrel_distortion, 0.2);
        assert_eq!(s.scan_line_skip, 2);
        assert!(s.show_vertical_lines);
        assert_eq!(s.primary_color, Rgba::RED);
        assert!(s.randomizer_enabled);
        assert_eq!(s.randomizer_speed, 1.0);
        assert!(s.palette_auto);
        assert_eq!(s.palette_interval, 30.0);
        assert_eq!(s.palette_transition, 2.0);
        assert_eq!(s.horizontal_resolution, 64);
        // Champs absents : valeurs par défaut.
        assert_eq!(s.vertical_resolution, 64);
        assert_eq!(s.contrast, 1.0);
        assert_eq!(cfg.mesh.mesh_width, 8.0);
        assert_eq!(cfg.mesh.mesh_height, 9.0);
        assert_eq!(cfg.mesh.sampling, Sampling::Nearest);
        assert_eq!(cfg.mesh.seed, 7);
    }

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = parse_config("", "empty").unwrap();
        assert_eq!(cfg, RuttConfig::default());
    }

    #[test]
    fn unknown_section_is_rejected() {
        assert!(parse_config("[bogus]\nx = 1\n", "bad").is_err());
    }

    #[test]
    fn invalid_mesh_plane_falls_back() {
        let cfg = parse_config("[mesh]\nwidth = -1.0\n", "neg").unwrap();
        assert_eq!(cfg.mesh.mesh_width, 16.0);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rutt.toml");
        std::fs::write(&path, "[wave]\nspeed = 2.5\n").unwrap();
        let s = load_settings(&path).unwrap();
        assert_eq!(s.wave_speed, 2.5);
        assert!(load_settings(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn handle_snapshots_are_stable() {
        let handle = SettingsHandle::default();
        let before = handle.snapshot();
        handle.update(|s| s.brightness = 0.5);
        assert_eq!(before.brightness, 0.0);
        assert_eq!(handle.snapshot().brightness, 0.5);
        handle.store(Settings::default());
        assert_eq!(handle.snapshot().brightness, 0.0);
    }
}
