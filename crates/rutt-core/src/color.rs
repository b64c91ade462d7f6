use serde::{Deserialize, Serialize};

/// Couleur RGBA linéaire, composantes f32 nominalement dans [0.0, 1.0].
///
/// # Example
/// ```
/// use rutt_core::color::Rgba;
/// let c = Rgba::lerp(Rgba::BLACK, Rgba::WHITE, 0.5);
/// assert!((c.r - 0.5).abs() < 1e-6);
/// assert_eq!(c.a, 1.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Rgba {
    /// Rouge.
    pub r: f32,
    /// Vert.
    pub g: f32,
    /// Bleu.
    pub b: f32,
    /// Alpha (0.0 = transparent).
    pub a: f32,
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Rgba {
    pub const CLEAR: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const GRAY: Self = Self::rgb(0.5, 0.5, 0.5);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    pub const CYAN: Self = Self::rgb(0.0, 1.0, 1.0);
    pub const MAGENTA: Self = Self::rgb(1.0, 0.0, 1.0);
    /// Jaune "chaud" (pas 1,1,0) pour rester fidèle aux palettes historiques.
    pub const YELLOW: Self = Self::rgb(1.0, 0.92, 0.016);

    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Convertit un pixel RGBA8 en couleur normalisée.
    #[inline(always)]
    #[must_use]
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: f32::from(r) / 255.0,
            g: f32::from(g) / 255.0,
            b: f32::from(b) / 255.0,
            a: f32::from(a) / 255.0,
        }
    }

    /// Interpolation linéaire, `t` clampé dans [0, 1].
    #[inline(always)]
    #[must_use]
    pub fn lerp(from: Self, to: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: from.r + (to.r - from.r) * t,
            g: from.g + (to.g - from.g) * t,
            b: from.b + (to.b - from.b) * t,
            a: from.a + (to.a - from.a) * t,
        }
    }

    /// Multiplie les quatre composantes (alpha inclus) par `k`.
    #[inline(always)]
    #[must_use]
    pub fn scaled(self, k: f32) -> Self {
        Self {
            r: self.r * k,
            g: self.g * k,
            b: self.b * k,
            a: self.a * k,
        }
    }

    #[inline(always)]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    /// RGB → HSV. H ∈ [0.0, 1.0), S ∈ [0.0, 1.0], V ∈ [0.0, 1.0].
    ///
    /// # Example
    /// ```
    /// use rutt_core::color::Rgba;
    /// let (h, s, v) = Rgba::RED.to_hsv();
    /// assert!(h.abs() < 0.01);
    /// assert!((s - 1.0).abs() < 0.01);
    /// assert!((v - 1.0).abs() < 0.01);
    /// ```
    #[must_use]
    pub fn to_hsv(self) -> (f32, f32, f32) {
        let (r, g, b) = (self.r, self.g, self.b);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let v = max;
        let s = if max <= 0.0 { 0.0 } else { delta / max };
        let h = if delta <= 0.0 {
            0.0
        } else if (max - r).abs() < f32::EPSILON {
            (((g - b) / delta) % 6.0) / 6.0
        } else if (max - g).abs() < f32::EPSILON {
            ((b - r) / delta + 2.0) / 6.0
        } else {
            ((r - g) / delta + 4.0) / 6.0
        };
        let h = if h < 0.0 { h + 1.0 } else { h };

        (h, s, v)
    }

    /// HSV → RGB opaque. `h` est ramené dans [0, 1).
    ///
    /// # Example
    /// ```
    /// use rutt_core::color::Rgba;
    /// let c = Rgba::from_hsv(1.0 / 3.0, 1.0, 1.0);
    /// assert!((c.g - 1.0).abs() < 1e-4);
    /// assert!(c.r.abs() < 1e-4);
    /// ```
    #[must_use]
    pub fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        let h = h.rem_euclid(1.0) * 6.0;
        let i = h.floor() as u32;
        let f = h - i as f32;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        let (r, g, b) = match i % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Self::rgb(r, g, b)
    }

    /// Remplace la teinte en conservant saturation, valeur et alpha.
    #[must_use]
    pub fn with_hue(self, hue: f32) -> Self {
        let (_, s, v) = self.to_hsv();
        let mut out = Self::from_hsv(hue, s, v);
        out.a = self.a;
        out
    }

    /// Teinte courante dans [0, 1).
    #[must_use]
    pub fn hue(self) -> f32 {
        self.to_hsv().0
    }
}
