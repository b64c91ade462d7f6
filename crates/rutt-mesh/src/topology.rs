use glam::{Vec2, Vec3};
use rutt_core::settings::Settings;

/// Entrées qui déclenchent une reconstruction complète du mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TopologyKey {
    pub width: u32,
    pub height: u32,
    pub scan_skip: u32,
    pub show_horizontal: bool,
    pub show_vertical: bool,
}

impl TopologyKey {
    /// Résolution ramenée à au moins 2×2, pas de scanline au moins 1.
    #[must_use]
    pub fn from_settings(s: &Settings) -> Self {
        let (width, height) = s.grid_size();
        Self {
            width,
            height,
            scan_skip: s.scan_line_skip.max(1),
            show_horizontal: s.show_horizontal_lines,
            show_vertical: s.show_vertical_lines,
        }
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Position de repos de la cellule (x, y), ligne 0 en bas, plan centré.
///
/// # Example
/// ```
/// use rutt_mesh::topology::base_position;
/// use glam::Vec2;
/// let p = base_position(0, 0, 4, 4, Vec2::new(16.0, 9.0));
/// assert_eq!((p.x, p.y, p.z), (-8.0, -4.5, 0.0));
/// ```
#[inline(always)]
#[must_use]
pub fn base_position(x: u32, y: u32, width: u32, height: u32, plane: Vec2) -> Vec3 {
    let nx = x as f32 / (width.max(2) - 1) as f32;
    let ny = y as f32 / (height.max(2) - 1) as f32;
    Vec3::new(nx * plane.x - plane.x * 0.5, ny * plane.y - plane.y * 0.5, 0.0)
}

/// Grille de base et listes de segments (paires d'indices).
///
/// Reconstruit uniquement quand la [`TopologyKey`] change.
///
/// # Example
/// ```
/// use rutt_mesh::topology::{MeshTopology, TopologyKey};
/// let mut topo = MeshTopology::default();
/// let key = TopologyKey { width: 8, height: 8, scan_skip: 2, show_horizontal: true, show_vertical: false };
/// assert!(topo.rebuild_if_needed(key));
/// assert!(!topo.rebuild_if_needed(key));
/// assert_eq!(topo.active_indices().len(), 4 * 7 * 2);
/// ```
#[derive(Clone, Debug)]
pub struct MeshTopology {
    key: Option<TopologyKey>,
    plane: Vec2,
    base: Vec<Vec3>,
    horizontal: Vec<u32>,
    vertical: Vec<u32>,
    active: Vec<u32>,
    rebuilds: u64,
}

impl Default for MeshTopology {
    fn default() -> Self {
        Self::new(Vec2::new(16.0, 9.0))
    }
}

impl MeshTopology {
    #[must_use]
    pub fn new(plane: Vec2) -> Self {
        Self {
            key: None,
            plane,
            base: Vec::new(),
            horizontal: Vec::new(),
            vertical: Vec::new(),
            active: Vec::new(),
            rebuilds: 0,
        }
    }

    #[must_use]
    pub fn key(&self) -> Option<TopologyKey> {
        self.key
    }

    #[must_use]
    pub fn plane(&self) -> Vec2 {
        self.plane
    }

    /// Change la taille du plan ; la prochaine passe reconstruit.
    pub fn set_plane(&mut self, plane: Vec2) {
        if plane != self.plane {
            self.plane = plane;
            self.key = None;
        }
    }

    /// Reconstruit si `key` diffère de la dernière construction.
    pub fn rebuild_if_needed(&mut self, key: TopologyKey) -> bool {
        if self.key == Some(key) {
            return false;
        }
        self.rebuild(key);
        true
    }

    /// Reconstruction inconditionnelle.
    pub fn rebuild(&mut self, key: TopologyKey) {
        let TopologyKey {
            width: w,
            height: h,
            scan_skip,
            ..
        } = key;
        let skip = scan_skip.max(1) as usize;

        self.base.clear();
        self.base.reserve(key.vertex_count());
        for y in 0..h {
            for x in 0..w {
                self.base.push(base_position(x, y, w, h, self.plane));
            }
        }

        self.horizontal.clear();
        for y in (0..h).step_by(skip) {
            for x in 0..w.saturating_sub(1) {
                let i = y * w + x;
                self.horizontal.extend_from_slice(&[i, i + 1]);
            }
        }

        self.vertical.clear();
        for x in (0..w).step_by(skip) {
            for y in 0..h.saturating_sub(1) {
                self.vertical.extend_from_slice(&[y * w + x, (y + 1) * w + x]);
            }
        }

        self.active.clear();
        if key.show_horizontal {
            self.active.extend_from_slice(&self.horizontal);
        }
        if key.show_vertical {
            self.active.extend_from_slice(&self.vertical);
        }

        self.key = Some(key);
        self.rebuilds += 1;
        log::info!(
            "Mesh reconstruit : {w}×{h}, skip {skip}, {} segments",
            self.active.len() / 2
        );
    }

    #[must_use]
    pub fn base_vertices(&self) -> &[Vec3] {
        &self.base
    }

    #[must_use]
    pub fn horizontal_indices(&self) -> &[u32] {
        &self.horizontal
    }

    #[must_use]
    pub fn vertical_indices(&self) -> &[u32] {
        &self.vertical
    }

    /// Buffer d'indices actif : horizontales puis verticales.
    #[must_use]
    pub fn active_indices(&self) -> &[u32] {
        &self.active
    }

    #[must_use]
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }
}
