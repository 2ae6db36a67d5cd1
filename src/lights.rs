//! Dynamic lighting model.
//!
//! A [`Lights`] implementation turns a source pixel value (1-255) and a
//! screen position into a light intensity in 0-1, which the
//! [`Indexizer`](crate::shader::Indexizer) then maps to an indexed
//! color. The common model is a [`LightSet`]: global offset/scale
//! bounds plus any number of point sources tracking application
//! objects.

use std::sync::{Arc, Weak};

/// Calculates light intensity at a given point of the screen.
///
/// Implementations are shared across rasterizer workers, so they must
/// be pure reads. Mutation (source reclamation) happens through
/// [`LightSet::prune`], outside the parallel region.
pub trait Lights: Send + Sync {
    /// Intensity (0-1) for a source pixel value at a screen position.
    fn light(&self, val: u8, x: i32, y: i32) -> f64;
}

/// A single light source contributing to a [`LightSet`].
///
/// The most common implementation is a point source whose light
/// diminishes with distance. A source reporting `alive() == false` is
/// dropped on the next [`LightSet::prune`].
pub trait LightSource: Send + Sync {
    /// Offset and scale contributions at a screen position.
    fn offset_scale(&self, x: i32, y: i32) -> (f64, f64);

    fn alive(&self) -> bool;
}

/// An application object a light source can follow.
///
/// The engine holds only a weak back-reference; the application keeps
/// ownership. Dropping the object, or returning `false` from `alive`,
/// unregisters the source on the next prune.
pub trait Tracked: Send + Sync {
    /// Current position in screen coordinates.
    fn pos(&self) -> (f64, f64);

    fn alive(&self) -> bool;

    /// Momentary multiplier applied to the squared fall radius.
    fn size_mod(&self) -> f64;
}

/// A lighting model with per-source accumulation and global bounds.
///
/// Accumulation starts at `(min_offset, min_scale)`, sums every
/// source's contribution, then clamps once. Offset is added to the
/// original intensity (scaled to 0-1) before multiplying by scale.
/// The single final clamp is deliberate: many weak sources saturate
/// the same way a few strong ones do.
#[derive(Clone)]
pub struct LightSet {
    pub sources: Vec<Arc<dyn LightSource>>,
    pub min_scale: f64,
    pub max_scale: f64,
    pub min_offset: f64,
    pub max_offset: f64,
}

impl Default for LightSet {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            min_scale: 0.0,
            max_scale: 1.0,
            min_offset: 0.0,
            max_offset: 1.0,
        }
    }
}

impl LightSet {
    /// Register a circle light source tied to a tracked object.
    pub fn track_circle<T: Tracked + 'static>(
        &mut self,
        tracked: &Arc<T>,
        intensity: f64,
        fall_radius: f64,
    ) {
        let tracked = Arc::downgrade(tracked);
        self.sources.push(Arc::new(CircleSource {
            tracked,
            intensity,
            fall_radius,
        }));
    }

    /// Drop dead sources. Call once per frame, before issuing draw
    /// calls; `light` itself never mutates the set. Removal order is
    /// unstable.
    pub fn prune(&mut self) {
        let mut i = 0;
        while i < self.sources.len() {
            if self.sources[i].alive() {
                i += 1;
            } else {
                self.sources.swap_remove(i);
            }
        }
    }
}

impl Lights for LightSet {
    fn light(&self, val: u8, x: i32, y: i32) -> f64 {
        let mut offs = self.min_offset;
        let mut scale = self.min_scale;

        for source in &self.sources {
            let (of, sc) = source.offset_scale(x, y);
            offs += of;
            scale += sc;
        }
        let offs = offs.clamp(self.min_offset, self.max_offset);
        let scale = scale.clamp(self.min_scale, self.max_scale);

        (val as f64 / 255.0 + offs) * scale
    }
}

/// A point light source with a circular falloff area, following a
/// tracked object's position, size and liveness.
///
/// At the fall radius the intensity halves (with `size_mod == 1`); the
/// falloff is quadratic, softened by a factor of 10.
pub struct CircleSource {
    pub tracked: Weak<dyn Tracked>,
    pub intensity: f64,
    pub fall_radius: f64,
}

impl LightSource for CircleSource {
    fn offset_scale(&self, x: i32, y: i32) -> (f64, f64) {
        let Some(tracked) = self.tracked.upgrade() else {
            return (0.0, 0.0);
        };
        let (tx, ty) = tracked.pos();
        let dx = x as f64 - tx;
        let dy = y as f64 - ty;
        let d2 = dx * dx + dy * dy;
        let fr2 = self.fall_radius * self.fall_radius * tracked.size_mod();
        (0.0, self.intensity * fr2 / (d2 * 10.0 + fr2))
    }

    fn alive(&self) -> bool {
        self.tracked.upgrade().is_some_and(|t| t.alive())
    }
}

/// A constant light level regardless of screen position.
///
/// Intensity 1 reproduces the image intensity, lower values dim it.
/// This implements [`Lights`] directly and is never composited through
/// a [`LightSet`]'s offset/scale accumulation.
#[derive(Debug, Clone, Copy)]
pub struct FixedLight {
    pub intensity: f64,
}

impl Lights for FixedLight {
    fn light(&self, val: u8, _x: i32, _y: i32) -> f64 {
        self.intensity * val as f64 / 255.0
    }
}

/// A perfectly lit environment.
pub const FULL_LIGHT: FixedLight = FixedLight { intensity: 1.0 };

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Lamp {
        x: f64,
        y: f64,
        alive: AtomicBool,
    }

    impl Lamp {
        fn at(x: f64, y: f64) -> Arc<Self> {
            Arc::new(Self {
                x,
                y,
                alive: AtomicBool::new(true),
            })
        }
    }

    impl Tracked for Lamp {
        fn pos(&self) -> (f64, f64) {
            (self.x, self.y)
        }

        fn alive(&self) -> bool {
            self.alive.load(Ordering::Relaxed)
        }

        fn size_mod(&self) -> f64 {
            1.0
        }
    }

    #[test]
    fn fixed_light_scales_value() {
        assert_eq!(FULL_LIGHT.light(255, 0, 0), 1.0);
        assert_eq!(FULL_LIGHT.light(0, 3, 7), 0.0);
        let dim = FixedLight { intensity: 0.5 };
        assert!((dim.light(255, 0, 0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn circle_source_halves_at_fall_radius() {
        let lamp = Lamp::at(0.0, 0.0);
        let mut set = LightSet {
            min_scale: 0.0,
            max_scale: 10.0,
            ..Default::default()
        };
        set.track_circle(&lamp, 1.0, 10.0);

        let (_, at_center) = set.sources[0].offset_scale(0, 0);
        assert!((at_center - 1.0).abs() < 1e-12);

        // Quadratic falloff softened by 10: at d == r the scale is
        // r^2 / (10 r^2 + r^2) = 1/11.
        let (_, at_radius) = set.sources[0].offset_scale(10, 0);
        assert!((at_radius - 1.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn light_output_respects_bounds() {
        let mut set = LightSet {
            min_scale: 0.2,
            max_scale: 1.0,
            min_offset: 0.0,
            max_offset: 0.5,
            ..Default::default()
        };
        let lamps: Vec<_> = (0..20).map(|_| Lamp::at(0.0, 0.0)).collect();
        for lamp in &lamps {
            set.track_circle(lamp, 5.0, 100.0);
        }

        // 20 sources at full strength would push scale to 100+;
        // the final clamp holds it at max_scale.
        let lit = set.light(255, 0, 0);
        assert!((lit - (1.0 + 0.0) * 1.0).abs() < 1e-12);

        // Far away every source contributes next to nothing; the
        // accumulated scale sits a hair above min_scale.
        let dark = set.light(255, 1_000_000, 1_000_000);
        assert!(dark <= 0.2 + 1e-6);
    }

    #[test]
    fn track_circle_accepts_any_tracked_impl() {
        struct Pinned;

        impl Tracked for Pinned {
            fn pos(&self) -> (f64, f64) {
                (3.0, 4.0)
            }

            fn alive(&self) -> bool {
                true
            }

            fn size_mod(&self) -> f64 {
                1.0
            }
        }

        let mut set = LightSet::default();
        let lamp = Lamp::at(0.0, 0.0);
        set.track_circle(&lamp, 1.0, 10.0);
        set.track_circle(&Arc::new(Pinned), 1.0, 10.0);
        assert_eq!(set.sources.len(), 2);
        assert!(set.sources[0].alive());
        // The second source dies immediately: its Arc was temporary.
        assert!(!set.sources[1].alive());
    }

    #[test]
    fn prune_removes_dead_and_dropped_sources() {
        let mut set = LightSet::default();
        let keep = Lamp::at(0.0, 0.0);
        let dying = Lamp::at(1.0, 1.0);
        let dropped = Lamp::at(2.0, 2.0);
        set.track_circle(&keep, 1.0, 10.0);
        set.track_circle(&dying, 1.0, 10.0);
        set.track_circle(&dropped, 1.0, 10.0);

        dying.alive.store(false, Ordering::Relaxed);
        drop(dropped);

        set.prune();
        assert_eq!(set.sources.len(), 1);
        assert!(set.sources[0].alive());
    }

    #[test]
    fn light_is_pure_even_with_dead_sources() {
        let mut set = LightSet::default();
        let lamp = Lamp::at(0.0, 0.0);
        set.track_circle(&lamp, 1.0, 10.0);
        drop(lamp);

        // A dead source contributes nothing but is only removed by
        // prune, never by light().
        let _ = set.light(128, 0, 0);
        assert_eq!(set.sources.len(), 1);
    }
}
