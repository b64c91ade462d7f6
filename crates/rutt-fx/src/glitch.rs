use fastrand::Rng;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Nombre de décalages de bloc persistants.
pub const BLOCK_SLOTS: usize = 100;

/// Réglages du glitch numérique.
///
/// # Example
/// ```
/// use rutt_fx::glitch::GlitchParams;
/// let p = GlitchParams::default();
/// assert_eq!(p.block_size, 5);
/// assert!(!p.wave_corrupt);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GlitchParams {
    /// Interrupteur maître.
    pub enabled: bool,
    /// Multiplicateur global [0.0, 1.0].
    pub intensity: f32,

    pub vertex_glitch: bool,
    pub vertex_amount: f32,
    /// Vitesse de défilement de la perturbation de balayage.
    pub vertex_speed: f32,
    /// Probabilité par cellule [0.0, 1.0].
    pub vertex_chance: f32,

    pub scan_disrupt: bool,
    pub scan_amount: f32,
    pub scan_frequency: f32,

    pub block_glitch: bool,
    pub block_amount: f32,
    /// Côté d'un bloc en cellules [1, 20].
    pub block_size: u32,
    pub block_chance: f32,

    pub wave_corrupt: bool,
    pub wave_amount: f32,
    pub wave_frequency: f32,

    pub time_stretch: bool,
    pub time_stretch_amount: f32,

    /// Tirage à pile ou face toutes les `trigger_interval` secondes.
    pub auto_trigger: bool,
    pub trigger_interval: f32,
    pub trigger_duration: f32,
    /// Déclenché par les beats ; désactive le tirage automatique.
    pub glitch_on_beat: bool,
}

impl Default for GlitchParams {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 0.5,
            vertex_glitch: true,
            vertex_amount: 0.3,
            vertex_speed: 5.0,
            vertex_chance: 0.1,
            scan_disrupt: true,
            scan_amount: 0.2,
            scan_frequency: 10.0,
            block_glitch: true,
            block_amount: 0.3,
            block_size: 5,
            block_chance: 0.05,
            wave_corrupt: false,
            wave_amount: 0.5,
            wave_frequency: 2.0,
            time_stretch: false,
            time_stretch_amount: 0.3,
            auto_trigger: true,
            trigger_interval: 1.0,
            trigger_duration: 0.2,
            glitch_on_beat: false,
        }
    }
}

/// État de la machine à déclenchement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GlitchPhase {
    Idle,
    Glitching { elapsed: f32, duration: f32 },
}

/// Corruption de vertices, active uniquement en phase `Glitching`.
///
/// Les quatre sous-effets (vertex, balayage, blocs, onde) sont tous
/// soumis à la machine à états.
///
/// # Example
/// ```
/// use rutt_fx::glitch::Glitch;
/// use glam::Vec3;
///
/// let mut rng = fastrand::Rng::with_seed(1);
/// let mut g = Glitch::default();
/// let mut verts = vec![Vec3::ZERO; 16];
/// g.apply(&mut verts, 4, 4, 0.0, &mut rng);
/// assert!(verts.iter().all(|v| *v == Vec3::ZERO)); // Idle
///
/// g.trigger(0.5, &mut rng);
/// assert!(g.is_glitching());
/// ```
#[derive(Clone, Debug)]
pub struct Glitch {
    pub params: GlitchParams,
    phase: GlitchPhase,
    trigger_timer: f32,
    block_offsets: [Vec3; BLOCK_SLOTS],
    time_offset: f32,
}

impl Default for Glitch {
    fn default() -> Self {
        Self::new(GlitchParams::default())
    }
}

#[inline(always)]
fn symmetric(rng: &mut Rng) -> f32 {
    rng.f32() * 2.0 - 1.0
}

impl Glitch {
    #[must_use]
    pub fn new(params: GlitchParams) -> Self {
        Self {
            params,
            phase: GlitchPhase::Idle,
            trigger_timer: 0.0,
            block_offsets: [Vec3::ZERO; BLOCK_SLOTS],
            time_offset: 0.0,
        }
    }

    #[must_use]
    pub fn phase(&self) -> GlitchPhase {
        self.phase
    }

    #[must_use]
    pub fn is_glitching(&self) -> bool {
        matches!(self.phase, GlitchPhase::Glitching { .. })
    }

    /// Avancement [0, 1] du glitch courant, 0 au repos.
    #[must_use]
    pub fn progress(&self) -> f32 {
        match self.phase {
            GlitchPhase::Glitching { elapsed, duration } if duration > 0.0 => {
                (elapsed / duration).min(1.0)
            }
            _ => 0.0,
        }
    }

    /// Décalage temporel accumulé par l'étirement (0 si désactivé).
    #[must_use]
    pub fn time_offset(&self) -> f32 {
        if self.params.time_stretch {
            self.time_offset
        } else {
            0.0
        }
    }

    /// Décalages de bloc courants.
    #[must_use]
    pub fn block_offsets(&self) -> &[Vec3; BLOCK_SLOTS] {
        &self.block_offsets
    }

    /// Entre en phase `Glitching` et re-tire les décalages de bloc.
    pub fn trigger(&mut self, duration: f32, rng: &mut Rng) {
        let duration = duration.max(0.0);
        self.phase = GlitchPhase::Glitching {
            elapsed: 0.0,
            duration,
        };
        for slot in &mut self.block_offsets {
            *slot = Vec3::new(symmetric(rng), symmetric(rng), symmetric(rng));
        }
        log::info!("Glitch déclenché pour {duration:.2}s");
    }

    /// Beat détecté : déclenche si `glitch_on_beat`.
    pub fn on_beat(&mut self, rng: &mut Rng) {
        if self.params.enabled && self.params.glitch_on_beat {
            self.trigger(self.params.trigger_duration, rng);
        }
    }

    /// Avance la machine à états de `dt` secondes.
    pub fn update(&mut self, dt: f32, rng: &mut Rng) {
        if !self.params.enabled {
            return;
        }

        if self.params.auto_trigger && !self.params.glitch_on_beat {
            self.trigger_timer += dt;
            if self.trigger_timer >= self.params.trigger_interval {
                self.trigger_timer = 0.0;
                if rng.f32() < 0.5 {
                    self.trigger(self.params.trigger_duration, rng);
                }
            }
        }

        if let GlitchPhase::Glitching { elapsed, duration } = &mut self.phase {
            *elapsed += dt;
            if *elapsed >= *duration {
                self.phase = GlitchPhase::Idle;
            }
        }

        if self.params.time_stretch && self.is_glitching() {
            self.time_offset += dt * self.params.time_stretch_amount * symmetric(rng);
        }
    }

    /// Corrompt `vertices` (grille `width × height`, row-major).
    ///
    /// `time` pilote la perturbation de balayage et l'onde.
    /// Parcours séquentiel : l'ordre de tirage du RNG est stable.
    pub fn apply(&self, vertices: &mut [Vec3], width: u32, height: u32, time: f32, rng: &mut Rng) {
        if !self.params.enabled || !self.is_glitching() {
            return;
        }
        let p = &self.params;
        let intensity = p.intensity;
        let block_size = p.block_size.max(1);
        let blocks_per_row = width / block_size + 1;

        for y in 0..height {
            for x in 0..width {
                let index = (y * width + x) as usize;
                let Some(vertex) = vertices.get_mut(index) else {
                    continue;
                };
                let mut offset = Vec3::ZERO;

                if p.vertex_glitch && rng.f32() < p.vertex_chance {
                    offset += Vec3::new(symmetric(rng), symmetric(rng), symmetric(rng))
                        * p.vertex_amount
                        * intensity;
                }

                if p.scan_disrupt {
                    let phase = (y as f32 * p.scan_frequency + time * p.vertex_speed).sin();
                    if phase.abs() > 0.9 {
                        offset.x += p.scan_amount * intensity * phase.signum();
                    }
                }

                if p.block_glitch {
                    let bx = x / block_size;
                    let by = y / block_size;
                    let block = ((by * blocks_per_row + bx) as usize) % BLOCK_SLOTS;
                    // Toujours en phase Glitching ici : un bloc sur trois est forcé.
                    if rng.f32() < p.block_chance || block % 3 == 0 {
                        offset += self.block_offsets[block] * p.block_amount * intensity;
                    }
                }

                if p.wave_corrupt {
                    let wave = (x as f32 * p.wave_frequency + time * 3.0).sin()
                        + (y as f32 * p.wave_frequency * 0.7 + time * 2.0).sin();
                    offset.z += wave * p.wave_amount * intensity * 0.5;
                }

                *vertex += offset;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> GlitchParams {
        GlitchParams {
            vertex_glitch: false,
            scan_disrupt: false,
            block_glitch: false,
            wave_corrupt: false,
            auto_trigger: false,
            ..GlitchParams::default()
        }
    }

    #[test]
    fn idle_leaves_vertices_untouched() {
        let mut rng = Rng::with_seed(3);
        let g = Glitch::new(GlitchParams {
            wave_corrupt: true,
            ..GlitchParams::default()
        });
        let mut verts = vec![Vec3::ONE; 64];
        g.apply(&mut verts, 8, 8, 1.3, &mut rng);
        assert!(verts.iter().all(|v| *v == Vec3::ONE));
    }

    #[test]
    fn trigger_expires_after_duration() {
        let mut rng = Rng::with_seed(3);
        let mut g = Glitch::new(quiet());
        g.trigger(0.2, &mut rng);
        g.update(0.1, &mut rng);
        assert!(g.is_glitching());
        assert!((g.progress() - 0.5).abs() < 1e-6);
        g.update(0.1, &mut rng);
        assert!(!g.is_glitching());
        assert_eq!(g.progress(), 0.0);
    }

    #[test]
    fn auto_trigger_only_fires_on_interval() {
        let mut g = Glitch::new(GlitchParams {
            auto_trigger: true,
            trigger_interval: 1.0,
            ..quiet()
        });
        let mut fired = 0;
        let mut was_glitching = false;
        let mut rng = Rng::with_seed(11);
        // ~100 intervalles, une chance sur deux chacun.
        for _ in 0..2000 {
            g.update(0.05, &mut rng);
            if g.is_glitching() && !was_glitching {
                fired += 1;
            }
            was_glitching = g.is_glitching();
        }
        assert!(fired > 25 && fired < 75, "fired {fired}");
    }

    #[test]
    fn beat_mode_disables_auto_trigger() {
        let mut g = Glitch::new(GlitchParams {
            auto_trigger: true,
            glitch_on_beat: true,
            trigger_interval: 0.1,
            ..quiet()
        });
        let mut rng = Rng::with_seed(5);
        for _ in 0..50 {
            g.update(0.1, &mut rng);
            assert!(!g.is_glitching());
        }
        g.on_beat(&mut rng);
        assert!(g.is_glitching());
    }

    #[test]
    fn wave_corruption_touches_only_z() {
        let mut rng = Rng::with_seed(1);
        let mut g = Glitch::new(GlitchParams {
            wave_corrupt: true,
            ..quiet()
        });
        g.trigger(1.0, &mut rng);
        let mut verts = vec![Vec3::ZERO; 16];
        g.apply(&mut verts, 4, 4, 0.7, &mut rng);
        assert!(verts.iter().all(|v| v.x == 0.0 && v.y == 0.0));
        assert!(verts.iter().any(|v| v.z != 0.0));
        let p = &g.params;
        let expected = ((1.0 * p.wave_frequency + 0.7 * 3.0).sin()
            + (0.0f32 * p.wave_frequency * 0.7 + 0.7 * 2.0).sin())
            * p.wave_amount
            * p.intensity
            * 0.5;
        assert!((verts[1].z - expected).abs() < 1e-6);
    }

    #[test]
    fn block_zero_is_forced_while_glitching() {
        let mut rng = Rng::with_seed(9);
        let mut g = Glitch::new(GlitchParams {
            block_glitch: true,
            block_chance: 0.0,
            ..quiet()
        });
        g.trigger(1.0, &mut rng);
        let mut verts = vec![Vec3::ZERO; 4];
        g.apply(&mut verts, 2, 2, 0.0, &mut rng);
        let expected = g.block_offsets()[0] * g.params.block_amount * g.params.intensity;
        for v in &verts {
            assert!((*v - expected).length() < 1e-6);
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let run = || {
            let mut rng = Rng::with_seed(42);
            let mut g = Glitch::default();
            g.trigger(1.0, &mut rng);
            let mut verts = vec![Vec3::ZERO; 100];
            g.apply(&mut verts, 10, 10, 0.25, &mut rng);
            verts
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn time_stretch_accumulates_only_while_glitching() {
        let mut rng = Rng::with_seed(2);
        let mut g = Glitch::new(GlitchParams {
            time_stretch: true,
            ..quiet()
        });
        g.update(0.5, &mut rng);
        assert_eq!(g.time_offset(), 0.0);
        g.trigger(10.0, &mut rng);
        g.update(0.5, &mut rng);
        assert_ne!(g.time_offset(), 0.0);
    }
}
