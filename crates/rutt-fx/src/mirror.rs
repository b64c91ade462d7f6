use std::fmt;
use std::str::FromStr;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::FxError;

/// Pliage de base des UV.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum MirrorMode {
    #[default]
    None,
    /// Moitié droite = reflet de la gauche.
    Horizontal,
    /// Moitié haute = reflet de la basse.
    Vertical,
    Both,
    /// Pli sur l'anti-diagonale (`u + v > 1`).
    Diagonal,
    /// Pli sur la diagonale (`u > v`).
    DiagonalReverse,
}

impl fmt::Display for MirrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "None",
            Self::Horizontal => "Horizontal",
            Self::Vertical => "Vertical",
            Self::Both => "Both",
            Self::Diagonal => "Diagonal",
            Self::DiagonalReverse => "DiagonalReverse",
        };
        f.write_str(s)
    }
}

impl FromStr for MirrorMode {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], "").as_str() {
            "none" | "off" => Ok(Self::None),
            "horizontal" | "h" => Ok(Self::Horizontal),
            "vertical" | "v" => Ok(Self::Vertical),
            "both" => Ok(Self::Both),
            "diagonal" => Ok(Self::Diagonal),
            "diagonalreverse" => Ok(Self::DiagonalReverse),
            _ => Err(FxError::UnknownMirrorMode(s.to_string())),
        }
    }
}

/// Réglages miroir / kaléidoscope / symétrie radiale / miroir ondulant.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MirrorParams {
    pub mode: MirrorMode,

    pub kaleidoscope: bool,
    /// Nombre de secteurs [2, 12].
    pub segments: u32,
    /// Rotation en degrés [0, 360).
    pub rotation: f32,
    pub animate_rotation: bool,
    /// Degrés par seconde.
    pub rotation_speed: f32,

    pub radial_symmetry: bool,
    pub radial_copies: u32,
    /// Fraction de tour ajoutée [0, 1].
    pub radial_offset: f32,

    pub wave_mirror: bool,
    pub wave_amount: f32,
    pub wave_frequency: f32,
}

impl Default for MirrorParams {
    fn default() -> Self {
        Self {
            mode: MirrorMode::None,
            kaleidoscope: false,
            segments: 6,
            rotation: 0.0,
            animate_rotation: false,
            rotation_speed: 10.0,
            radial_symmetry: false,
            radial_copies: 4,
            radial_offset: 0.0,
            wave_mirror: false,
            wave_amount: 0.5,
            wave_frequency: 2.0,
        }
    }
}

/// Remappage UV symétrique, appliqué au Z du mesh sans dupliquer la géométrie.
///
/// # Example
/// ```
/// use rutt_fx::mirror::{Mirror, MirrorMode, MirrorParams};
/// use glam::Vec2;
/// let m = Mirror::new(MirrorParams { mode: MirrorMode::Horizontal, ..Default::default() });
/// assert_eq!(m.transform_uv(Vec2::new(0.8, 0.3)), Vec2::new(0.2, 0.3));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Mirror {
    pub params: MirrorParams,
    time: f32,
}

impl Mirror {
    #[must_use]
    pub fn new(params: MirrorParams) -> Self {
        Self { params, time: 0.0 }
    }

    /// `true` si au moins un remappage UV est actif.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.params.mode != MirrorMode::None || self.params.kaleidoscope || self.params.wave_mirror
    }

    /// Avance l'horloge interne et la rotation animée.
    pub fn update(&mut self, dt: f32) {
        self.time += dt;
        let p = &mut self.params;
        if p.animate_rotation && p.kaleidoscope {
            p.rotation = (p.rotation + p.rotation_speed * dt) % 360.0;
        }
    }

    /// Compose pli miroir → kaléidoscope → miroir ondulant.
    #[must_use]
    pub fn transform_uv(&self, uv: Vec2) -> Vec2 {
        let mut out = uv;
        if self.params.mode != MirrorMode::None {
            out = fold(self.params.mode, out);
        }
        if self.params.kaleidoscope {
            out = self.kaleidoscope(out);
        }
        if self.params.wave_mirror {
            out = self.wave_fold(out);
        }
        out
    }

    fn kaleidoscope(&self, uv: Vec2) -> Vec2 {
        let centered = uv - Vec2::splat(0.5);
        let segment = 360.0 / self.params.segments.max(1) as f32;
        let mut angle = centered.y.atan2(centered.x).to_degrees() + self.params.rotation;
        let dist = centered.length();

        angle = (angle % segment).abs();
        if angle > segment / 2.0 {
            angle = segment - angle;
        }
        let rad = angle.to_radians();
        Vec2::new(0.5 + rad.cos() * dist, 0.5 + rad.sin() * dist)
    }

    fn wave_fold(&self, mut uv: Vec2) -> Vec2 {
        let wave = (uv.y * self.params.wave_frequency * std::f32::consts::TAU + self.time * 2.0).sin();
        let threshold = 0.5 + wave * self.params.wave_amount * 0.5;
        if uv.x > threshold {
            uv.x = threshold - (uv.x - threshold);
        }
        uv
    }

    /// Copie, dans l'ordre des index, le Z de la cellule source désignée
    /// par l'UV transformée. Les cellules déjà réécrites peuvent servir de source.
    pub fn apply_to_mesh(&self, vertices: &mut [Vec3], width: u32, height: u32) {
        if !self.is_active() || width < 2 || height < 2 {
            return;
        }
        let (w, h) = (width as usize, height as usize);
        let (fw, fh) = ((width - 1) as f32, (height - 1) as f32);
        let count = vertices.len().min(w * h);

        for i in 0..count {
            let x = i % w;
            let y = i / w;
            let uv = self.transform_uv(Vec2::new(x as f32 / fw, y as f32 / fh));
            let sx = to_cell(uv.x, fw, w);
            let sy = to_cell(uv.y, fh, h);
            let src = sy * w + sx;
            if src != i && src < count {
                vertices[i].z = vertices[src].z;
            }
        }
    }

    /// Symétrie radiale : fait tourner `vertex` autour de l'axe Y passant
    /// par `center`, dans le secteur `index % radial_copies`.
    ///
    /// # Example
    /// ```
    /// use rutt_fx::mirror::{Mirror, MirrorParams};
    /// use glam::Vec3;
    /// let m = Mirror::new(MirrorParams { radial_symmetry: true, radial_copies: 2, ..Default::default() });
    /// let v = m.transform_vertex(Vec3::new(1.0, 0.5, 0.0), Vec3::ZERO, 1);
    /// assert!((v.x + 1.0).abs() < 1e-5 && (v.y - 0.5).abs() < 1e-6);
    /// ```
    #[must_use]
    pub fn transform_vertex(&self, vertex: Vec3, center: Vec3, index: usize) -> Vec3 {
        let p = &self.params;
        if !p.radial_symmetry {
            return vertex;
        }
        let copies = p.radial_copies.max(1);
        let to_vertex = vertex - center;
        let base = to_vertex.x.atan2(to_vertex.z).to_degrees();
        let dist = Vec2::new(to_vertex.x, to_vertex.z).length();
        let sector = (index % copies as usize) as f32;
        let angle = (base + sector * (360.0 / copies as f32) + p.radial_offset * 360.0).to_radians();
        Vec3::new(
            center.x + angle.sin() * dist,
            vertex.y,
            center.z + angle.cos() * dist,
        )
    }

    /// Description lisible des modes actifs.
    ///
    /// # Example
    /// ```
    /// use rutt_fx::mirror::{Mirror, MirrorMode, MirrorParams};
    /// let m = Mirror::new(MirrorParams { mode: MirrorMode::Both, kaleidoscope: true, ..Default::default() });
    /// assert_eq!(m.describe(), "Both Mirror + 6-way Kaleidoscope");
    /// assert_eq!(Mirror::default().describe(), "None");
    /// ```
    #[must_use]
    pub fn describe(&self) -> String {
        let p = &self.params;
        let mut parts = Vec::new();
        if p.mode != MirrorMode::None {
            parts.push(format!("{} Mirror", p.mode));
        }
        if p.kaleidoscope {
            parts.push(format!("{}-way Kaleidoscope", p.segments));
        }
        if p.radial_symmetry {
            parts.push(format!("{}x Radial", p.radial_copies));
        }
        if p.wave_mirror {
            parts.push("Wave Mirror".to_string());
        }
        if parts.is_empty() {
            "None".to_string()
        } else {
            parts.join(" + ")
        }
    }
}

fn fold(mode: MirrorMode, mut uv: Vec2) -> Vec2 {
    match mode {
        MirrorMode::None => {}
        MirrorMode::Horizontal => {
            if uv.x > 0.5 {
                uv.x = 1.0 - uv.x;
            }
        }
        MirrorMode::Vertical => {
            if uv.y > 0.5 {
                uv.y = 1.0 - uv.y;
            }
        }
        MirrorMode::Both => {
            if uv.x > 0.5 {
                uv.x = 1.0 - uv.x;
            }
            if uv.y > 0.5 {
                uv.y = 1.0 - uv.y;
            }
        }
        MirrorMode::Diagonal => {
            if uv.x + uv.y > 1.0 {
                uv = Vec2::new(1.0 - uv.y, 1.0 - uv.x);
            }
        }
        MirrorMode::DiagonalReverse => {
            if uv.x > uv.y {
                uv = Vec2::new(uv.y, uv.x);
            }
        }
    }
    uv
}

/// UV → index de cellule, arrondi au pair le plus proche puis clampé.
#[inline(always)]
fn to_cell(u: f32, span: f32, count: usize) -> usize {
    let c = (u * span).round_ties_even();
    if c.is_nan() || c <= 0.0 {
        0
    } else {
        (c as usize).min(count - 1)
    }
}
