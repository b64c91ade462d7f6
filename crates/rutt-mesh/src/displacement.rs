use std::f32::consts::TAU;

use fastrand::Rng;
use glam::{EulerRot, Quat, Vec2, Vec3};
use rayon::prelude::*;
use rutt_core::color::Rgba;
use rutt_core::settings::Settings;
use rutt_source::GridSample;

/// Échelle minimale appliquée par axe (évite un mesh dégénéré).
pub const MIN_SCALE: f32 = 0.01;

/// En dessous, barrel et keystone sont ignorés.
pub const DISTORTION_EPSILON: f32 = 0.001;

/// Compteurs partagés par toutes les cellules d'un tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameParams {
    /// Phase cumulée des ondes (s × wave_speed).
    pub wave_time: f32,
    pub frame_count: u64,
    /// Scalaire de flicker du tick, dans [1 - flicker/2, 1].
    pub flicker: f32,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            wave_time: 0.0,
            frame_count: 0,
            flicker: 1.0,
        }
    }
}

impl FrameParams {
    /// Tire le flicker du tick : exactement 1 si `amount <= 0`.
    ///
    /// # Example
    /// ```
    /// use rutt_mesh::displacement::FrameParams;
    /// let mut rng = fastrand::Rng::with_seed(3);
    /// assert_eq!(FrameParams::draw_flicker(0.0, &mut rng), 1.0);
    /// let f = FrameParams::draw_flicker(1.0, &mut rng);
    /// assert!((0.5..=1.0).contains(&f));
    /// ```
    #[must_use]
    pub fn draw_flicker(amount: f32, rng: &mut Rng) -> f32 {
        if amount > 0.0 {
            1.0 - rng.f32() * amount * 0.5
        } else {
            1.0
        }
    }
}

#[inline(always)]
fn safe_scale(v: f32) -> f32 {
    if v.is_finite() { v.max(MIN_SCALE) } else { 1.0 }
}

/// Transformation luminance → position/couleur, figée pour un tick.
///
/// Ordre : distorsions, ondes, Z, échelle, rotation, translation.
///
/// # Example
/// ```
/// use rutt_mesh::displacement::{Displacer, FrameParams};
/// use rutt_core::Settings;
/// use glam::{Vec2, Vec3};
///
/// let s = Settings::default();
/// let d = Displacer::new(&s, Vec2::new(16.0, 9.0), 4, 4, &FrameParams::default());
/// let p = d.position(Vec3::new(-8.0, -4.5, 0.0), 0, 0, 0.5);
/// assert!((p.z - 0.5).abs() < 1e-6);
/// ```
#[derive(Clone, Debug)]
pub struct Displacer {
    width: u32,
    height: u32,
    plane: Vec2,
    barrel: f32,
    keystone_h: f32,
    keystone_v: f32,
    h_wave: f32,
    v_wave: f32,
    wave_freq: f32,
    wave_time: f32,
    offset: f32,
    strength: f32,
    flicker: f32,
    z_mod: f32,
    taper: f32,
    scale: Vec3,
    rotation: Quat,
    translation: Vec2,
    interlace: bool,
    frame_count: u64,
    use_source_color: bool,
    primary: Rgba,
    secondary: Rgba,
    blend: f32,
}

impl Displacer {
    #[must_use]
    pub fn new(s: &Settings, plane: Vec2, width: u32, height: u32, frame: &FrameParams) -> Self {
        let z_mod = if s.z_modulation > 0.0 {
            (frame.wave_time * s.z_mod_frequency * TAU).sin() * s.z_modulation
        } else {
            0.0
        };
        let mesh_scale = safe_scale(s.mesh_scale);
        Self {
            width: width.max(2),
            height: height.max(2),
            plane,
            barrel: s.barrel_distortion,
            keystone_h: s.keystone_h,
            keystone_v: s.keystone_v,
            h_wave: s.horizontal_wave,
            v_wave: s.vertical_wave,
            wave_freq: s.wave_frequency,
            wave_time: frame.wave_time,
            offset: s.displacement_offset,
            strength: s.displacement_strength,
            flicker: frame.flicker,
            z_mod,
            taper: s.line_taper,
            scale: Vec3::new(
                safe_scale(s.horizontal_scale) * mesh_scale,
                safe_scale(s.vertical_scale) * mesh_scale,
                mesh_scale,
            ),
            rotation: Quat::from_euler(
                EulerRot::YXZ,
                s.rotation_y.to_radians(),
                s.rotation_x.to_radians(),
                s.rotation_z.to_radians(),
            ),
            translation: Vec2::new(s.horizontal_position, s.vertical_position),
            interlace: s.interlace,
            frame_count: frame.frame_count,
            use_source_color: s.use_source_color,
            primary: s.primary_color,
            secondary: s.secondary_color,
            blend: s.color_blend,
        }
    }

    /// Ligne masquée par l'entrelacement ce tick-ci.
    #[inline(always)]
    #[must_use]
    pub fn is_hidden(&self, y: u32) -> bool {
        self.interlace && (u64::from(y) + self.frame_count) % 2 == 0
    }

    /// Position déplacée de la cellule (x, y) à partir de sa position de repos.
    #[inline(always)]
    #[must_use]
    pub fn position(&self, base: Vec3, x: u32, y: u32, lum: f32) -> Vec3 {
        let nx = x as f32 / (self.width - 1) as f32;
        let ny = y as f32 / (self.height - 1) as f32;
        let cx = nx - 0.5;
        let cy = ny - 0.5;
        let mut pos = base;

        if self.barrel.abs() > DISTORTION_EPSILON {
            let r2 = cx * cx + cy * cy;
            let distort = 1.0 + self.barrel * r2 * 4.0;
            pos.x = cx * distort * self.plane.x;
            pos.y = cy * distort * self.plane.y;
        }
        if self.keystone_h.abs() > DISTORTION_EPSILON {
            pos.x *= 1.0 + self.keystone_h * cy * 2.0;
        }
        if self.keystone_v.abs() > DISTORTION_EPSILON {
            pos.y *= 1.0 + self.keystone_v * cx * 2.0;
        }

        if self.h_wave > 0.0 {
            pos.x += (ny * self.wave_freq * TAU + self.wave_time).sin() * self.h_wave;
        }
        if self.v_wave > 0.0 {
            pos.y += (nx * self.wave_freq * TAU + self.wave_time).sin() * self.v_wave;
        }

        let mut z = (lum + self.offset) * self.strength * self.flicker + self.z_mod;
        if self.taper > 0.0 {
            z *= (1.0 - cx.abs() * 2.0 * self.taper).clamp(0.0, 1.0);
        }
        pos.z = z;

        pos *= self.scale;
        pos = self.rotation * pos;
        pos.x += self.translation.x;
        pos.y += self.translation.y;
        pos
    }

    /// Couleur de la cellule, flicker appliqué aux quatre canaux.
    #[inline(always)]
    #[must_use]
    pub fn color(&self, lum: f32, source: Rgba) -> Rgba {
        let c = if self.use_source_color {
            source
        } else {
            Rgba::lerp(self.primary, self.secondary, lum * self.blend)
        };
        c.scaled(self.flicker)
    }

    /// Déplace toute la grille, ligne par ligne en parallèle.
    ///
    /// Les lignes masquées gardent leur position précédente et passent
    /// en transparent. Une valeur non finie conserve la dernière valeur valide.
    pub fn apply(
        &self,
        base: &[Vec3],
        field: &[f32],
        source: Option<&GridSample>,
        positions: &mut [Vec3],
        colors: &mut [Rgba],
    ) {
        let w = self.width as usize;
        let n = w * self.height as usize;
        if base.len() < n || field.len() < n || positions.len() < n || colors.len() < n {
            log::debug!("Buffers trop courts pour la grille {}×{}", self.width, self.height);
            return;
        }

        positions[..n]
            .par_chunks_exact_mut(w)
            .zip(colors[..n].par_chunks_exact_mut(w))
            .enumerate()
            .for_each(|(y, (pos_row, color_row))| {
                let y = y as u32;
                if self.is_hidden(y) {
                    color_row.fill(Rgba::CLEAR);
                    return;
                }
                let row_start = y as usize * w;
                for (x, (pos, color)) in pos_row.iter_mut().zip(color_row.iter_mut()).enumerate() {
                    let i = row_start + x;
                    let lum = field[i];
                    let p = self.position(base[i], x as u32, y, lum);
                    if p.is_finite() {
                        *pos = p;
                    }
                    let src = source.map_or(Rgba::BLACK, |s| s.color(x as u32, y));
                    let c = self.color(lum, src);
                    if c.is_finite() {
                        *color = c;
                    }
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{MeshTopology, TopologyKey};

    const PLANE: Vec2 = Vec2::new(16.0, 9.0);

    fn grid(w: u32, h: u32) -> MeshTopology {
        let mut topo = MeshTopology::new(PLANE);
        topo.rebuild(TopologyKey {
            width: w,
            height: h,
            scan_skip: 1,
            show_horizontal: true,
            show_vertical: false,
        });
        topo
    }

    fn run(s: &Settings, w: u32, h: u32, frame: &FrameParams, field: &[f32]) -> (Vec<Vec3>, Vec<Rgba>) {
        let topo = grid(w, h);
        let mut positions = topo.base_vertices().to_vec();
        let mut colors = vec![Rgba::WHITE; (w * h) as usize];
        Displacer::new(s, PLANE, w, h, frame).apply(
            topo.base_vertices(),
            field,
            None,
            &mut positions,
            &mut colors,
        );
        (positions, colors)
    }

    #[test]
    fn half_field_lifts_flat_grid() {
        let s = Settings::default();
        let (positions, _) = run(&s, 4, 4, &FrameParams::default(), &[0.5; 16]);
        let base = grid(4, 4);
        for (p, b) in positions.iter().zip(base.base_vertices()) {
            assert!((p.z - 0.5).abs() < 1e-6);
            assert!((p.x - b.x).abs() < 1e-5);
            assert!((p.y - b.y).abs() < 1e-5);
        }
    }

    #[test]
    fn interlace_hides_rows_matching_parity() {
        let s = Settings {
            interlace: true,
            ..Settings::default()
        };
        let field = [0.5; 16];
        let frame = FrameParams {
            frame_count: 2,
            ..FrameParams::default()
        };
        let (_, colors) = run(&s, 4, 4, &frame, &field);
        for y in 0..4 {
            let alpha = colors[y * 4].a;
            if y % 2 == 0 {
                assert_eq!(alpha, 0.0);
            } else {
                assert!(alpha > 0.0);
            }
        }
        let next = FrameParams {
            frame_count: 3,
            ..frame
        };
        let (_, colors) = run(&s, 4, 4, &next, &field);
        assert!(colors[0].a > 0.0);
        assert_eq!(colors[4].a, 0.0);
    }

    #[test]
    fn hidden_rows_keep_previous_positions() {
        let s = Settings {
            interlace: true,
            ..Settings::default()
        };
        let topo = grid(2, 2);
        let mut positions = vec![Vec3::splat(7.0); 4];
        let mut colors = vec![Rgba::WHITE; 4];
        let frame = FrameParams::default();
        Displacer::new(&s, PLANE, 2, 2, &frame).apply(
            topo.base_vertices(),
            &[1.0; 4],
            None,
            &mut positions,
            &mut colors,
        );
        assert_eq!(positions[0], Vec3::splat(7.0));
        assert!((positions[2].z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn flicker_scales_z_and_alpha() {
        let s = Settings::default();
        let frame = FrameParams {
            flicker: 0.5,
            ..FrameParams::default()
        };
        let (positions, colors) = run(&s, 2, 2, &frame, &[1.0; 4]);
        assert!((positions[0].z - 0.5).abs() < 1e-6);
        assert!((colors[0].a - 0.5).abs() < 1e-6);
    }

    #[test]
    fn color_blends_primary_to_secondary() {
        let s = Settings {
            primary_color: Rgba::BLACK,
            secondary_color: Rgba::WHITE,
            color_blend: 1.0,
            ..Settings::default()
        };
        let d = Displacer::new(&s, PLANE, 2, 2, &FrameParams::default());
        let c = d.color(0.25, Rgba::RED);
        assert!((c.r - 0.25).abs() < 1e-6);
        let src = Displacer::new(
            &Settings {
                use_source_color: true,
                ..s
            },
            PLANE,
            2,
            2,
            &FrameParams::default(),
        );
        assert_eq!(src.color(0.25, Rgba::RED), Rgba::RED);
    }

    #[test]
    fn barrel_pushes_corners_out() {
        let s = Settings {
            barrel_distortion: 0.5,
            displacement_strength: 0.0,
            ..Settings::default()
        };
        let (positions, _) = run(&s, 3, 3, &FrameParams::default(), &[0.0; 9]);
        // Coin : r² = 0.5, facteur 1 + 0.5·0.5·4 = 2.
        assert!((positions[0].x - (-16.0)).abs() < 1e-4);
        assert!((positions[0].y - (-9.0)).abs() < 1e-4);
        // Centre inchangé.
        assert!(positions[4].length() < 1e-5);
    }

    #[test]
    fn keystone_and_wave_follow_rows() {
        let s = Settings {
            keystone_h: 0.5,
            displacement_strength: 0.0,
            ..Settings::default()
        };
        let (positions, _) = run(&s, 2, 2, &FrameParams::default(), &[0.0; 4]);
        // Ligne du bas cy = -0.5 : x *= 0.5 ; ligne du haut : x *= 1.5.
        assert!((positions[0].x - (-4.0)).abs() < 1e-5);
        assert!((positions[2].x - (-12.0)).abs() < 1e-5);

        let s = Settings {
            horizontal_wave: 1.0,
            wave_frequency: 0.25,
            displacement_strength: 0.0,
            ..Settings::default()
        };
        let (positions, _) = run(&s, 2, 2, &FrameParams::default(), &[0.0; 4]);
        // ny = 1 : sin(0.25·2π) = 1.
        assert!((positions[2].x - (-7.0)).abs() < 1e-5);
        assert!((positions[0].x - (-8.0)).abs() < 1e-5);
    }

    #[test]
    fn keystone_v_follows_columns() {
        let s = Settings {
            keystone_v: 0.5,
            displacement_strength: 0.0,
            ..Settings::default()
        };
        let (positions, _) = run(&s, 2, 2, &FrameParams::default(), &[0.0; 4]);
        // Colonne gauche cx = -0.5 : y *= 0.5 ; colonne droite : y *= 1.5.
        assert!((positions[0].y - (-2.25)).abs() < 1e-5);
        assert!((positions[1].y - (-6.75)).abs() < 1e-5);
        assert!((positions[3].y - 6.75).abs() < 1e-5);
        assert!((positions[1].x - 8.0).abs() < 1e-5);
    }

    #[test]
    fn vertical_wave_follows_columns() {
        let s = Settings {
            vertical_wave: 1.0,
            wave_frequency: 0.25,
            displacement_strength: 0.0,
            ..Settings::default()
        };
        let (positions, _) = run(&s, 2, 2, &FrameParams::default(), &[0.0; 4]);
        // nx = 1 : sin(0.25·2π) = 1.
        assert!((positions[1].y - (-3.5)).abs() < 1e-5);
        assert!((positions[3].y - 5.5).abs() < 1e-5);
        assert!((positions[0].y - (-4.5)).abs() < 1e-5);
        assert!((positions[1].x - 8.0).abs() < 1e-5);
    }

    #[test]
    fn z_modulation_offsets_every_cell() {
        let s = Settings {
            z_modulation: 0.3,
            z_mod_frequency: 1.0,
            ..Settings::default()
        };
        // sin(0.25·1·2π) = 1 : tout le plan monte de z_modulation.
        let frame = FrameParams {
            wave_time: 0.25,
            ..FrameParams::default()
        };
        let (positions, _) = run(&s, 2, 2, &frame, &[0.5; 4]);
        let base = grid(2, 2);
        for (p, b) in positions.iter().zip(base.base_vertices()) {
            assert!((p.z - 0.8).abs() < 1e-5);
            assert!((p.x - b.x).abs() < 1e-5);
            assert!((p.y - b.y).abs() < 1e-5);
        }

        let (flat, _) = run(&s, 2, 2, &FrameParams::default(), &[0.5; 4]);
        assert!(flat.iter().all(|p| (p.z - 0.5).abs() < 1e-6));
    }

    #[test]
    fn taper_fades_edges() {
        let s = Settings {
            line_taper: 1.0,
            ..Settings::default()
        };
        let (positions, _) = run(&s, 3, 2, &FrameParams::default(), &[1.0; 6]);
        assert!(positions[0].z.abs() < 1e-6);
        assert!((positions[1].z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rotation_then_translation() {
        let s = Settings {
            rotation_z: 90.0,
            horizontal_position: 1.0,
            displacement_strength: 0.0,
            ..Settings::default()
        };
        let (positions, _) = run(&s, 2, 2, &FrameParams::default(), &[0.0; 4]);
        // (8, -4.5) tourné de 90° autour de Z → (4.5, 8), puis x + 1.
        assert!((positions[1].x - 5.5).abs() < 1e-4);
        assert!((positions[1].y - 8.0).abs() < 1e-4);
    }

    #[test]
    fn degenerate_scale_is_clamped() {
        let s = Settings {
            mesh_scale: 0.0,
            horizontal_scale: f32::NAN,
            ..Settings::default()
        };
        let (positions, _) = run(&s, 2, 2, &FrameParams::default(), &[0.0; 4]);
        assert!(positions.iter().all(|p| p.is_finite()));
        assert!((positions[0].x - (-8.0 * MIN_SCALE)).abs() < 1e-6);
    }

    #[test]
    fn non_finite_keeps_last_good() {
        let s = Settings {
            displacement_offset: f32::INFINITY,
            displacement_strength: 0.0,
            ..Settings::default()
        };
        let topo = grid(2, 2);
        let mut positions = vec![Vec3::ONE; 4];
        let mut colors = vec![Rgba::WHITE; 4];
        Displacer::new(&s, PLANE, 2, 2, &FrameParams::default()).apply(
            topo.base_vertices(),
            &[0.5; 4],
            None,
            &mut positions,
            &mut colors,
        );
        assert!(positions.iter().all(|&p| p == Vec3::ONE));
    }

    #[test]
    fn same_inputs_same_output() {
        let s = Settings {
            horizontal_wave: 0.4,
            vertical_wave: 0.2,
            z_modulation: 0.3,
            rotation_x: 20.0,
            ..Settings::default()
        };
        let field: Vec<f32> = (0..64).map(|i| (i as f32 * 0.37).fract()).collect();
        let frame = FrameParams {
            wave_time: 1.7,
            frame_count: 9,
            flicker: 0.9,
        };
        let a = run(&s, 8, 8, &frame, &field);
        let b = run(&s, 8, 8, &frame, &field);
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
    }
}
