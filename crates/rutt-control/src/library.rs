use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fastrand::Rng;
use rutt_core::color::Rgba;
use rutt_core::{Preset, Settings};

/// Extension des fichiers de preset.
pub const PRESET_EXTENSION: &str = "json";

/// Remplace les caractères interdits dans un nom de fichier par `_`.
///
/// # Example
/// ```
/// use rutt_control::library::sanitize_filename;
/// assert_eq!(sanitize_filename("a/b:c?"), "a_b_c_");
/// assert_eq!(sanitize_filename(""), "_");
/// ```
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() { "_".to_string() } else { cleaned }
}

/// Les cinq looks fournis quand le répertoire est vide.
#[must_use]
pub fn default_presets() -> Vec<Preset> {
    let base = Settings::default();
    vec![
        Preset::new(
            "Classic Green",
            Settings {
                primary_color: Rgba::GREEN,
                secondary_color: Rgba::CYAN,
                ..base.clone()
            },
        )
        .with_description("Vert phosphore, lignes horizontales"),
        Preset::new(
            "Neon Pink",
            Settings {
                brightness: 0.2,
                contrast: 1.5,
                threshold: 0.1,
                gamma: 0.8,
                displacement_strength: 2.0,
                horizontal_wave: 0.3,
                vertical_wave: 0.2,
                wave_frequency: 3.0,
                primary_color: Rgba::rgb(1.0, 0.0, 0.5),
                secondary_color: Rgba::YELLOW,
                show_vertical_lines: true,
                line_width: 0.015,
                glow_intensity: 1.5,
                bloom: 0.3,
                ..base.clone()
            },
        ),
        Preset::new(
            "Minimal White",
            Settings {
                contrast: 2.0,
                threshold: 0.3,
                displacement_strength: 0.5,
                primary_color: Rgba::WHITE,
                secondary_color: Rgba::GRAY,
                line_width: 0.005,
                glow_intensity: 0.2,
                scan_line_skip: 2,
                ..base.clone()
            },
        ),
        Preset::new(
            "Psychedelic",
            Settings {
                contrast: 1.2,
                displacement_strength: 3.0,
                horizontal_wave: 1.0,
                vertical_wave: 0.8,
                wave_frequency: 5.0,
                wave_speed: 2.0,
                primary_color: Rgba::RED,
                secondary_color: Rgba::BLUE,
                color_blend: 1.0,
                show_vertical_lines: true,
                line_width: 0.02,
                glow_intensity: 1.0,
                keystone_h: 0.2,
                barrel_distortion: 0.1,
                ..base.clone()
            },
        ),
        Preset::new(
            "Retro CRT",
            Settings {
                brightness: -0.1,
                contrast: 1.3,
                gamma: 1.2,
                displacement_strength: 1.5,
                horizontal_wave: 0.05,
                primary_color: Rgba::rgb(0.3, 1.0, 0.3),
                secondary_color: Rgba::rgb(0.0, 0.5, 0.0),
                line_width: 0.012,
                glow_intensity: 0.8,
                noise_amount: 0.05,
                scanline_flicker: 0.1,
                ..base
            },
        ),
    ]
}

/// Répertoire de presets JSON, un fichier par preset.
///
/// # Example
/// ```
/// use rutt_control::library::PresetLibrary;
/// let dir = tempfile::tempdir().unwrap();
/// let mut lib = PresetLibrary::open(dir.path()).unwrap();
/// assert_eq!(lib.len(), 5);
/// let first = lib.next().map(|p| p.name.clone());
/// assert_eq!(first.as_deref(), Some("Classic Green"));
/// ```
#[derive(Debug)]
pub struct PresetLibrary {
    dir: PathBuf,
    presets: Vec<Preset>,
    current: Option<usize>,
}

impl PresetLibrary {
    /// Ouvre (ou crée) le répertoire et charge les presets.
    /// Un répertoire vide reçoit les presets par défaut.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or read,
    /// or if the default presets cannot be written.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Impossible de créer {}", dir.display()))?;
        let mut lib = Self {
            dir: dir.to_path_buf(),
            presets: Vec::new(),
            current: None,
        };
        lib.load_all()?;
        if lib.presets.is_empty() {
            for preset in default_presets() {
                lib.save(preset)?;
            }
            log::info!("{} presets par défaut créés dans {}", lib.len(), dir.display());
        }
        Ok(lib)
    }

    /// Recharge tous les `*.json`, triés par nom de fichier.
    /// Un fichier illisible est ignoré avec un avertissement.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be listed.
    pub fn load_all(&mut self) -> Result<usize> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Impossible de lire {}", self.dir.display()))?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(std::result::Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == PRESET_EXTENSION))
            .collect();
        paths.sort();

        self.presets.clear();
        self.current = None;
        for path in paths {
            match load_preset(&path) {
                Ok(preset) => self.presets.push(preset),
                Err(e) => log::warn!("Preset ignoré {} : {e:#}", path.display()),
            }
        }
        log::info!("{} presets chargés", self.presets.len());
        Ok(self.presets.len())
    }

    /// Écrit le preset sur disque et l'ajoute (ou remplace celui du même nom).
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save(&mut self, preset: Preset) -> Result<PathBuf> {
        let path = self.path_for(&preset.name);
        let json = serde_json::to_string_pretty(&preset).context("Sérialisation du preset")?;
        fs::write(&path, json).with_context(|| format!("Écriture de {}", path.display()))?;
        log::info!("Preset sauvegardé : {}", path.display());
        match self.presets.iter_mut().find(|p| p.name == preset.name) {
            Some(slot) => *slot = preset,
            None => self.presets.push(preset),
        }
        Ok(path)
    }

    /// Capture `settings` sous `name` et sauvegarde.
    ///
    /// # Errors
    /// Same as [`PresetLibrary::save`].
    pub fn save_current(&mut self, settings: &Settings, name: &str) -> Result<PathBuf> {
        self.save(Preset::capture(settings, name))
    }

    /// Retire le preset et son fichier. `false` si le nom est inconnu.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be removed.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        let Some(pos) = self.presets.iter().position(|p| p.name == name) else {
            return Ok(false);
        };
        self.presets.remove(pos);
        self.current = match self.current {
            Some(c) if c == pos => None,
            Some(c) if c > pos => Some(c - 1),
            other => other,
        };
        let path = self.path_for(name);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Suppression de {}", path.display()))?;
        }
        Ok(true)
    }

    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{PRESET_EXTENSION}", sanitize_filename(name)))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    /// Sélectionne par nom.
    pub fn select(&mut self, name: &str) -> Option<&Preset> {
        let index = self.presets.iter().position(|p| p.name == name)?;
        self.select_index(index)
    }

    /// Sélectionne par index.
    pub fn select_index(&mut self, index: usize) -> Option<&Preset> {
        let preset = self.presets.get(index)?;
        self.current = Some(index);
        Some(preset)
    }

    /// Preset suivant, en boucle. Sans sélection, le premier.
    pub fn next(&mut self) -> Option<&Preset> {
        let n = self.presets.len();
        if n == 0 {
            return None;
        }
        let index = self.current.map_or(0, |i| (i + 1) % n);
        self.select_index(index)
    }

    /// Preset précédent, en boucle. Sans sélection, le dernier.
    pub fn previous(&mut self) -> Option<&Preset> {
        let n = self.presets.len();
        if n == 0 {
            return None;
        }
        let index = self.current.map_or(n - 1, |i| (i + n - 1) % n);
        self.select_index(index)
    }

    /// Preset tiré au hasard.
    pub fn random(&mut self, rng: &mut Rng) -> Option<&Preset> {
        if self.presets.is_empty() {
            return None;
        }
        let index = rng.usize(..self.presets.len());
        self.select_index(index)
    }
}

fn load_preset(path: &Path) -> Result<Preset> {
    let json = fs::read_to_string(path).with_context(|| format!("Lecture de {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("JSON invalide dans {}", path.display()))
}
