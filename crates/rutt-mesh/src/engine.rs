use fastrand::Rng;
use glam::{Vec2, Vec3};
use rutt_core::color::Rgba;
use rutt_core::frame::FrameBuffer;
use rutt_core::mesh::{LineStyle, MeshBuffers};
use rutt_core::settings::{MeshConfig, Settings};
use rutt_core::traits::{FrameSource, MeshSink};
use rutt_fx::{EffectChain, EffectContext};
use rutt_source::GridSampler;

use crate::displacement::{Displacer, FrameParams};
use crate::luminance::{LuminanceProcessor, SignalParams};
use crate::topology::{MeshTopology, TopologyKey};

/// État du signal d'entrée au dernier tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignalStatus {
    /// Dernière frame traitée avec succès.
    Live,
    /// Pas de frame exploitable : le mesh précédent est conservé.
    #[default]
    NoSignal,
}

/// Orchestration d'un tick : échantillonnage, luminance, displacement,
/// overlays puis émission vers le sink.
///
/// # Example
/// ```
/// use rutt_mesh::{Engine, SignalStatus};
/// use rutt_core::{FrameBuffer, Settings};
/// use rutt_core::settings::MeshConfig;
///
/// let mut engine = Engine::new(MeshConfig::default());
/// let settings = Settings { horizontal_resolution: 16, vertical_resolution: 8, ..Settings::default() };
/// let frame = FrameBuffer::filled(64, 32, [255, 255, 255, 255]);
/// assert_eq!(engine.on_frame(&frame, &settings), SignalStatus::Live);
/// assert_eq!(engine.mesh().vertices.len(), 16 * 8);
/// ```
pub struct Engine {
    config: MeshConfig,
    topology: MeshTopology,
    luminance: LuminanceProcessor,
    sampler: GridSampler,
    chain: EffectChain,
    rng: Rng,
    /// Positions après displacement, avant overlays.
    displaced: Vec<Vec3>,
    mesh: MeshBuffers,
    sink: Option<Box<dyn MeshSink>>,
    wave_time: f32,
    frame_count: u64,
    elapsed: f32,
    status: SignalStatus,
    clamp_warned: bool,
}

impl Engine {
    #[must_use]
    pub fn new(config: MeshConfig) -> Self {
        Self {
            topology: MeshTopology::new(Vec2::new(config.mesh_width, config.mesh_height)),
            luminance: LuminanceProcessor::default(),
            sampler: GridSampler::new(config.sampling),
            chain: EffectChain::new(),
            rng: Rng::with_seed(config.seed),
            displaced: Vec::new(),
            mesh: MeshBuffers::default(),
            sink: None,
            wave_time: 0.0,
            frame_count: 0,
            elapsed: 0.0,
            status: SignalStatus::NoSignal,
            clamp_warned: false,
            config,
        }
    }

    #[must_use]
    pub fn with_chain(mut self, chain: EffectChain) -> Self {
        self.chain = chain;
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: impl MeshSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn set_sink(&mut self, sink: Option<Box<dyn MeshSink>>) {
        self.sink = sink;
    }

    #[must_use]
    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Change le plan, l'échantillonnage ou la graine.
    pub fn set_config(&mut self, config: MeshConfig) {
        self.topology
            .set_plane(Vec2::new(config.mesh_width, config.mesh_height));
        self.sampler.set_sampling(config.sampling);
        if config.seed != self.config.seed {
            self.rng.seed(config.seed);
        }
        self.config = config;
    }

    #[must_use]
    pub fn chain(&self) -> &EffectChain {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut EffectChain {
        &mut self.chain
    }

    /// Dernier mesh produit.
    #[must_use]
    pub fn mesh(&self) -> &MeshBuffers {
        &self.mesh
    }

    #[must_use]
    pub fn topology(&self) -> &MeshTopology {
        &self.topology
    }

    #[must_use]
    pub fn luminance(&self) -> &LuminanceProcessor {
        &self.luminance
    }

    #[must_use]
    pub fn status(&self) -> SignalStatus {
        self.status
    }

    #[must_use]
    pub fn wave_time(&self) -> f32 {
        self.wave_time
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Propage un beat (glitch on beat).
    pub fn on_beat(&mut self) {
        self.chain.on_beat(&mut self.rng);
    }

    /// Déclenche un glitch si l'overlay est installé.
    pub fn trigger_glitch(&mut self, duration: f32) -> bool {
        match self.chain.glitch_mut() {
            Some(g) => {
                g.trigger(duration, &mut self.rng);
                true
            }
            None => false,
        }
    }

    pub fn reset_depth_range(&mut self) {
        if let Some(d) = self.chain.depth_mut() {
            d.reset_range();
        }
    }

    /// Avance les horloges : phase des ondes, compteur de frames, overlays.
    pub fn advance(&mut self, dt: f32, settings: &Settings) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let speed = if settings.wave_speed.is_finite() {
            settings.wave_speed
        } else {
            0.0
        };
        self.wave_time += dt * speed;
        self.frame_count = self.frame_count.wrapping_add(1);
        self.elapsed += dt;
        self.chain.update(dt, &mut self.rng);
    }

    /// Tick complet : horloges puis frame suivante de `source`.
    ///
    /// Sans frame, le mesh précédent reste en place et le statut
    /// passe à [`SignalStatus::NoSignal`].
    pub fn tick(&mut self, dt: f32, settings: &Settings, source: &mut dyn FrameSource) -> SignalStatus {
        self.advance(dt, settings);
        match source.next_frame() {
            Some(frame) => self.on_frame(&frame, settings),
            None => {
                if self.status == SignalStatus::Live {
                    log::warn!("Plus de signal, mesh conservé");
                }
                self.status = SignalStatus::NoSignal;
                self.status
            }
        }
    }

    /// Traite une frame et émet le mesh résultant.
    pub fn on_frame(&mut self, frame: &FrameBuffer, settings: &Settings) -> SignalStatus {
        if frame.is_empty() {
            log::debug!("Frame vide {}×{} ignorée", frame.width, frame.height);
            self.status = SignalStatus::NoSignal;
            return self.status;
        }

        self.ensure_topology(settings);
        let key = self.topology.key();
        let Some(TopologyKey { width, height, .. }) = key else {
            return self.status;
        };

        let sample = match self.sampler.sample(frame, width, height) {
            Ok(sample) => sample,
            Err(e) => {
                log::warn!("Échantillonnage impossible : {e:#}");
                self.status = SignalStatus::NoSignal;
                return self.status;
            }
        };

        self.luminance.process(sample, &SignalParams::from_settings(settings));

        let params = FrameParams {
            wave_time: self.wave_time + self.chain.time_offset(),
            frame_count: self.frame_count,
            flicker: FrameParams::draw_flicker(settings.scanline_flicker, &mut self.rng),
        };
        let plane = self.topology.plane();
        let displacer = Displacer::new(settings, plane, width, height, &params);
        displacer.apply(
            self.topology.base_vertices(),
            self.luminance.field(),
            settings.use_source_color.then_some(sample),
            &mut self.displaced,
            &mut self.mesh.colors,
        );

        self.mesh.vertices.copy_from_slice(&self.displaced);
        if !self.chain.is_empty() {
            let mut ctx = EffectContext {
                width,
                height,
                elapsed: self.elapsed,
                displacement_strength: settings.displacement_strength,
                rng: &mut self.rng,
            };
            self.chain
                .apply(&mut self.mesh.vertices, &mut self.mesh.colors, &mut ctx);
        }
        self.mesh.style = LineStyle::from_settings(settings);

        if let Some(sink) = self.sink.as_mut() {
            sink.on_mesh_updated(&self.mesh);
        }
        if self.status != SignalStatus::Live {
            log::info!("Signal actif ({}×{})", frame.width, frame.height);
        }
        self.status = SignalStatus::Live;
        self.status
    }

    fn ensure_topology(&mut self, settings: &Settings) {
        let key = TopologyKey::from_settings(settings);
        let clamped = key.width != settings.horizontal_resolution
            || key.height != settings.vertical_resolution;
        if clamped && !self.clamp_warned {
            log::warn!(
                "Résolution {}×{} invalide, ramenée à {}×{}",
                settings.horizontal_resolution,
                settings.vertical_resolution,
                key.width,
                key.height
            );
        }
        self.clamp_warned = clamped;

        if !self.topology.rebuild_if_needed(key) {
            return;
        }
        self.luminance.resize(key.width, key.height);
        let base = self.topology.base_vertices();
        self.displaced.clear();
        self.displaced.extend_from_slice(base);
        self.mesh.vertices.clear();
        self.mesh.vertices.extend_from_slice(base);
        self.mesh.colors.clear();
        self.mesh.colors.resize(base.len(), Rgba::CLEAR);
        self.mesh.indices.clear();
        self.mesh
            .indices
            .extend_from_slice(self.topology.active_indices());
        self.mesh.width = key.width;
        self.mesh.height = key.height;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use rutt_fx::glitch::{Glitch, GlitchParams};
    use rutt_source::{Pattern, PatternSource};

    struct Silent;

    impl FrameSource for Silent {
        fn next_frame(&mut self) -> Option<Arc<FrameBuffer>> {
            None
        }
        fn native_size(&self) -> (u32, u32) {
            (0, 0)
        }
        fn is_live(&self) -> bool {
            true
        }
    }

    fn settings(w: u32, h: u32) -> Settings {
        Settings {
            horizontal_resolution: w,
            vertical_resolution: h,
            displacement_smoothing: 0.0,
            ..Settings::default()
        }
    }

    #[test]
    fn mesh_matches_grid_for_many_sizes() {
        let frame = FrameBuffer::filled(40, 30, [200, 100, 50, 255]);
        let mut engine = Engine::new(MeshConfig::default());
        for (w, h) in [(2, 2), (16, 8), (33, 17), (128, 64)] {
            let mut s = settings(w, h);
            s.show_vertical_lines = true;
            engine.on_frame(&frame, &s);
            let mesh = engine.mesh();
            let n = (w * h) as usize;
            assert_eq!(mesh.vertices.len(), n);
            assert_eq!(mesh.colors.len(), n);
            assert!(mesh.indices.iter().all(|&i| (i as usize) < n));
        }
    }

    #[test]
    fn gray_frame_lifts_every_vertex() {
        let mut engine = Engine::new(MeshConfig::default());
        let frame = FrameBuffer::filled(4, 4, [128, 128, 128, 255]);
        engine.on_frame(&frame, &settings(4, 4));
        let expected = 128.0 / 255.0;
        for (v, b) in engine.mesh().vertices.iter().zip(engine.topology().base_vertices()) {
            assert!((v.z - expected).abs() < 1e-3);
            assert!((v.x - b.x).abs() < 1e-5 && (v.y - b.y).abs() < 1e-5);
        }
    }

    #[test]
    fn no_signal_holds_mesh() {
        let mut engine = Engine::new(MeshConfig::default());
        let s = settings(8, 4);
        let mut source = PatternSource::new(Pattern::Gradient, 32, 16);
        assert_eq!(engine.tick(1.0 / 60.0, &s, &mut source), SignalStatus::Live);
        let before = engine.mesh().vertices.clone();
        assert_eq!(engine.tick(1.0 / 60.0, &s, &mut Silent), SignalStatus::NoSignal);
        assert_eq!(engine.mesh().vertices, before);
        assert_eq!(engine.status(), SignalStatus::NoSignal);
    }

    #[test]
    fn empty_frame_is_no_signal() {
        let mut engine = Engine::new(MeshConfig::default());
        let status = engine.on_frame(&FrameBuffer::new(0, 0), &settings(4, 4));
        assert_eq!(status, SignalStatus::NoSignal);
    }

    #[test]
    fn empty_frame_during_resize_keeps_mesh() {
        let mut engine = Engine::new(MeshConfig::default());
        let frame = FrameBuffer::filled(16, 16, [128, 128, 128, 255]);
        engine.on_frame(&frame, &settings(8, 4));
        let before = engine.mesh().clone();

        let status = engine.on_frame(&FrameBuffer::new(0, 0), &settings(16, 8));
        assert_eq!(status, SignalStatus::NoSignal);
        assert_eq!((engine.mesh().width, engine.mesh().height), (8, 4));
        assert_eq!(engine.mesh().vertices, before.vertices);
        assert_eq!(engine.mesh().indices, before.indices);
        assert_eq!(engine.topology().rebuild_count(), 1);

        engine.on_frame(&frame, &settings(16, 8));
        assert_eq!(engine.mesh().vertex_count(), 128);
        assert_eq!(engine.topology().rebuild_count(), 2);
    }

    #[test]
    fn sub_minimum_resolution_is_clamped() {
        // Le warning de clamp doit sortir une seule fois (RUST_LOG=warn).
        let _ = env_logger::builder().is_test(true).try_init();
        let mut engine = Engine::new(MeshConfig::default());
        let frame = FrameBuffer::filled(8, 8, [255, 255, 255, 255]);
        engine.on_frame(&frame, &settings(1, 1));
        assert_eq!((engine.mesh().width, engine.mesh().height), (2, 2));
        assert!(engine.mesh().vertices.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn rebuild_only_when_topology_changes() {
        let mut engine = Engine::new(MeshConfig::default());
        let frame = FrameBuffer::filled(8, 8, [90, 90, 90, 255]);
        let mut s = settings(8, 8);
        engine.on_frame(&frame, &s);
        engine.on_frame(&frame, &s);
        s.displacement_strength = 3.0;
        engine.on_frame(&frame, &s);
        assert_eq!(engine.topology().rebuild_count(), 1);
        s.scan_line_skip = 2;
        engine.on_frame(&frame, &s);
        assert_eq!(engine.topology().rebuild_count(), 2);
    }

    #[test]
    fn wave_time_accumulates_with_speed() {
        let mut engine = Engine::new(MeshConfig::default());
        let s = Settings {
            wave_speed: 2.0,
            ..Settings::default()
        };
        engine.advance(0.5, &s);
        engine.advance(0.25, &s);
        assert!((engine.wave_time() - 1.5).abs() < 1e-6);
        assert_eq!(engine.frame_count(), 2);
        engine.advance(f32::NAN, &s);
        assert!((engine.wave_time() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn interlace_flips_each_tick() {
        let mut engine = Engine::new(MeshConfig::default());
        let s = Settings {
            interlace: true,
            ..settings(4, 4)
        };
        let mut source = PatternSource::new(Pattern::Gradient, 16, 16);
        engine.tick(0.016, &s, &mut source);
        let parity = engine.frame_count() % 2;
        let hidden_row = usize::from(parity != 0);
        assert_eq!(engine.mesh().colors[hidden_row * 4].a, 0.0);
        assert!(engine.mesh().colors[(1 - hidden_row) * 4].a > 0.0);
        engine.tick(0.016, &s, &mut source);
        assert!(engine.mesh().colors[hidden_row * 4].a > 0.0);
        assert_eq!(engine.mesh().colors[(1 - hidden_row) * 4].a, 0.0);
    }

    #[test]
    fn sink_receives_each_mesh() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let mut engine = Engine::new(MeshConfig::default()).with_sink(move |m: &MeshBuffers| {
            if let Ok(mut l) = log.lock() {
                l.push(m.vertex_count());
            }
        });
        let frame = FrameBuffer::filled(8, 8, [10, 20, 30, 255]);
        engine.on_frame(&frame, &settings(4, 2));
        engine.on_frame(&FrameBuffer::new(0, 0), &settings(4, 2));
        engine.on_frame(&frame, &settings(4, 2));
        assert_eq!(*seen.lock().unwrap(), vec![8, 8]);
    }

    #[test]
    fn same_seed_same_mesh() {
        let run = || {
            let mut chain = EffectChain::new();
            chain.insert(Glitch::new(GlitchParams {
                auto_trigger: true,
                trigger_interval: 0.1,
                ..GlitchParams::default()
            }));
            let mut engine = Engine::new(MeshConfig::default()).with_chain(chain);
            let s = Settings {
                scanline_flicker: 0.8,
                horizontal_wave: 0.3,
                ..settings(16, 8)
            };
            let mut source = PatternSource::new(Pattern::Rings, 64, 32);
            for _ in 0..30 {
                engine.tick(1.0 / 30.0, &s, &mut source);
            }
            engine.mesh().clone()
        };
        let a = run();
        let b = run();
        assert_eq!(a.vertices, b.vertices);
        assert_eq!(a.colors, b.colors);
    }

    #[test]
    fn overlays_do_not_accumulate_on_hidden_rows() {
        let mut chain = EffectChain::new();
        chain.insert(Glitch::new(GlitchParams {
            vertex_chance: 1.0,
            ..GlitchParams::default()
        }));
        let mut engine = Engine::new(MeshConfig::default()).with_chain(chain);
        let s = Settings {
            interlace: true,
            ..settings(4, 4)
        };
        let frame = FrameBuffer::filled(4, 4, [0, 0, 0, 255]);
        engine.trigger_glitch(100.0);
        for _ in 0..20 {
            engine.advance(0.01, &s);
            engine.on_frame(&frame, &s);
        }
        // Une seule passe de glitch par tick au-dessus de la grille de repos.
        let mesh = engine.mesh();
        for (v, b) in mesh.vertices.iter().zip(engine.topology().base_vertices()) {
            assert!(v.distance(*b) < 1.0, "{v} vs {b}");
        }
    }
}
