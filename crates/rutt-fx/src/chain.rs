use fastrand::Rng;
use glam::Vec3;
use rutt_core::color::Rgba;

use crate::depth::DepthColorizer;
use crate::glitch::Glitch;
use crate::mirror::Mirror;

/// Contexte partagé par les overlays pendant une passe.
pub struct EffectContext<'a> {
    pub width: u32,
    pub height: u32,
    /// Temps écoulé depuis le démarrage du moteur (s).
    pub elapsed: f32,
    /// Multiplicateur de profondeur pour la coloration.
    pub displacement_strength: f32,
    pub rng: &'a mut Rng,
}

/// Ordre d'exécution fixe : glitch, miroir, profondeur.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverlayKind {
    Glitch,
    Mirror,
    Depth,
}

/// Overlay installé dans la chaîne.
#[derive(Clone, Debug)]
pub enum Overlay {
    Glitch(Glitch),
    Mirror(Mirror),
    Depth(DepthColorizer),
}

impl Overlay {
    #[must_use]
    pub fn kind(&self) -> OverlayKind {
        match self {
            Self::Glitch(_) => OverlayKind::Glitch,
            Self::Mirror(_) => OverlayKind::Mirror,
            Self::Depth(_) => OverlayKind::Depth,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Glitch(_) => "glitch",
            Self::Mirror(_) => "mirror",
            Self::Depth(_) => "depth",
        }
    }

    /// Avance l'état interne (timers, animations).
    pub fn update(&mut self, dt: f32, rng: &mut Rng) {
        match self {
            Self::Glitch(g) => g.update(dt, rng),
            Self::Mirror(m) => m.update(dt),
            Self::Depth(d) => d.update(dt),
        }
    }

    /// Modifie les buffers du tick courant.
    pub fn apply(&mut self, vertices: &mut [Vec3], colors: &mut [Rgba], ctx: &mut EffectContext<'_>) {
        match self {
            Self::Glitch(g) => g.apply(vertices, ctx.width, ctx.height, ctx.elapsed, ctx.rng),
            Self::Mirror(m) => m.apply_to_mesh(vertices, ctx.width, ctx.height),
            Self::Depth(d) => d.apply(vertices, colors, ctx.displacement_strength),
        }
    }
}

impl From<Glitch> for Overlay {
    fn from(g: Glitch) -> Self {
        Self::Glitch(g)
    }
}

impl From<Mirror> for Overlay {
    fn from(m: Mirror) -> Self {
        Self::Mirror(m)
    }
}

impl From<DepthColorizer> for Overlay {
    fn from(d: DepthColorizer) -> Self {
        Self::Depth(d)
    }
}

/// Liste ordonnée d'overlays optionnels. Un overlay absent est simplement sauté.
///
/// # Example
/// ```
/// use rutt_fx::{EffectChain, Overlay, OverlayKind};
/// use rutt_fx::depth::DepthColorizer;
/// use rutt_fx::mirror::Mirror;
///
/// let mut chain = EffectChain::new();
/// chain.insert(DepthColorizer::default());
/// chain.insert(Mirror::default());
/// let order: Vec<_> = chain.iter().map(Overlay::kind).collect();
/// assert_eq!(order, vec![OverlayKind::Mirror, OverlayKind::Depth]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct EffectChain {
    overlays: Vec<Overlay>,
}

impl EffectChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installe un overlay, en remplaçant celui du même type.
    pub fn insert(&mut self, overlay: impl Into<Overlay>) {
        let overlay = overlay.into();
        let kind = overlay.kind();
        log::info!("Overlay {} installé", overlay.name());
        match self.overlays.iter_mut().find(|o| o.kind() == kind) {
            Some(slot) => *slot = overlay,
            None => {
                self.overlays.push(overlay);
                self.overlays.sort_by_key(Overlay::kind);
            }
        }
    }

    pub fn remove(&mut self, kind: OverlayKind) -> Option<Overlay> {
        let pos = self.overlays.iter().position(|o| o.kind() == kind)?;
        Some(self.overlays.remove(pos))
    }

    #[must_use]
    pub fn contains(&self, kind: OverlayKind) -> bool {
        self.overlays.iter().any(|o| o.kind() == kind)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Overlay> {
        self.overlays.iter()
    }

    pub fn glitch_mut(&mut self) -> Option<&mut Glitch> {
        self.overlays.iter_mut().find_map(|o| match o {
            Overlay::Glitch(g) => Some(g),
            _ => None,
        })
    }

    pub fn mirror_mut(&mut self) -> Option<&mut Mirror> {
        self.overlays.iter_mut().find_map(|o| match o {
            Overlay::Mirror(m) => Some(m),
            _ => None,
        })
    }

    pub fn depth_mut(&mut self) -> Option<&mut DepthColorizer> {
        self.overlays.iter_mut().find_map(|o| match o {
            Overlay::Depth(d) => Some(d),
            _ => None,
        })
    }

    #[must_use]
    pub fn glitch(&self) -> Option<&Glitch> {
        self.overlays.iter().find_map(|o| match o {
            Overlay::Glitch(g) => Some(g),
            _ => None,
        })
    }

    /// Décalage temporel du glitch (étirement), 0 sans glitch.
    #[must_use]
    pub fn time_offset(&self) -> f32 {
        self.glitch().map_or(0.0, Glitch::time_offset)
    }

    /// Propage un beat aux overlays qui y réagissent.
    pub fn on_beat(&mut self, rng: &mut Rng) {
        if let Some(g) = self.glitch_mut() {
            g.on_beat(rng);
        }
    }

    pub fn update(&mut self, dt: f32, rng: &mut Rng) {
        for o in &mut self.overlays {
            o.update(dt, rng);
        }
    }

    /// Applique chaque overlay dans l'ordre glitch → miroir → profondeur.
    pub fn apply(&mut self, vertices: &mut [Vec3], colors: &mut [Rgba], ctx: &mut EffectContext<'_>) {
        for o in &mut self.overlays {
            o.apply(vertices, colors, ctx);
        }
    }
}
