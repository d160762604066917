//! The render pipeline.
//!
//! Workers render pixels into [`Fragment`]s and send them over one bounded
//! channel; the calling thread drains it into the framebuffer. Fragments
//! arrive in any order and carry their own coordinates.

use std::thread;
use std::time::Instant;

use flume::Sender;
use kdray_core::sampling::fnv32a;
use kdray_core::{Camera, Fragment, Image, RenderState, Scene, SceneError};
use kdray_math::{DifferentialRay, Vector};
use serde::{Deserialize, Serialize};

use crate::integrator::Integrator;
use crate::output::RenderError;

/// Edge length of the square blocks handed to workers.
pub const BLOCK_DIM: usize = 32;

/// Fragments buffered between workers and the framebuffer.
const FRAGMENT_BUFFER: usize = 100;

/// How pixels are divided between threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One thread, row by row
    Simple,
    /// Workers pull blocks from a queue
    #[default]
    Block,
    /// Each worker takes an equal band of rows
    Worker,
}

/// Render configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub strategy: Strategy,
    /// Worker threads; defaults to the available parallelism
    pub workers: Option<usize>,
}

impl RenderConfig {
    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|&n| n > 0)
            .unwrap_or_else(|| thread::available_parallelism().map_or(1, |n| n.get()))
    }
}

/// Render one pixel.
///
/// The companion rays through `(x + 1, y)` and `(x, y + 1)` give the ray
/// differentials; on the last column or row they fall just past the image.
pub fn render_pixel(scene: &Scene, camera: &dyn Camera, integrator: &dyn Integrator, x: usize, y: usize) -> Fragment {
    let (w, h) = camera.resolution();
    let mut state = RenderState::new();
    state.pixel_number = y * w + x;
    state.sampling_offset = fnv32a(state.pixel_number as u32);
    state.screen_pos = Vector::new(
        2.0 * x as f64 / w as f64 - 1.0,
        -2.0 * y as f64 / h as f64 + 1.0,
        0.0,
    );

    let (fx, fy) = (x as f64, y as f64);
    let (ray, _) = camera.shoot_ray(fx, fy, 0.0, 0.0);
    let (ray_x, _) = camera.shoot_ray(fx + 1.0, fy, 0.0, 0.0);
    let (ray_y, _) = camera.shoot_ray(fx, fy + 1.0, 0.0, 0.0);

    let color = integrator.integrate(scene, &mut state, &DifferentialRay::new(ray, &ray_x, &ray_y));
    Fragment { x, y, color }
}

/// Render every pixel of the camera's image into `tx` with the configured
/// strategy. Returns when all workers have finished.
pub fn integrate(scene: &Scene, camera: &dyn Camera, integrator: &dyn Integrator, config: &RenderConfig, tx: Sender<Fragment>) {
    match config.strategy {
        Strategy::Simple => simple_integrate(scene, camera, integrator, &tx),
        Strategy::Block => block_integrate(scene, camera, integrator, config.worker_count(), &tx),
        Strategy::Worker => worker_integrate(scene, camera, integrator, config.worker_count(), &tx),
    }
}

fn simple_integrate(scene: &Scene, camera: &dyn Camera, integrator: &dyn Integrator, tx: &Sender<Fragment>) {
    let (w, h) = camera.resolution();
    for y in 0..h {
        for x in 0..w {
            if tx.send(render_pixel(scene, camera, integrator, x, y)).is_err() {
                return;
            }
        }
    }
}

fn block_integrate(scene: &Scene, camera: &dyn Camera, integrator: &dyn Integrator, workers: usize, tx: &Sender<Fragment>) {
    let (w, h) = camera.resolution();
    let (block_tx, block_rx) = flume::bounded::<(usize, usize)>(0);

    thread::scope(|s| {
        s.spawn(move || {
            for by in (0..h).step_by(BLOCK_DIM) {
                for bx in (0..w).step_by(BLOCK_DIM) {
                    if block_tx.send((bx, by)).is_err() {
                        return;
                    }
                }
            }
        });

        for _ in 0..workers {
            let block_rx = block_rx.clone();
            let tx = tx.clone();
            s.spawn(move || {
                for (bx, by) in block_rx.iter() {
                    log::debug!("Block ({bx:4}, {by:4})");
                    for y in by..(by + BLOCK_DIM).min(h) {
                        for x in bx..(bx + BLOCK_DIM).min(w) {
                            if tx.send(render_pixel(scene, camera, integrator, x, y)).is_err() {
                                return;
                            }
                        }
                    }
                }
            });
        }
    });
}

fn worker_integrate(scene: &Scene, camera: &dyn Camera, integrator: &dyn Integrator, workers: usize, tx: &Sender<Fragment>) {
    let (w, h) = camera.resolution();
    if h < workers {
        simple_integrate(scene, camera, integrator, tx);
        return;
    }
    // Every band but the last gets `rows` rows; the last takes the rest.
    let rows = h.div_ceil(workers);
    let bands = h.div_ceil(rows);

    thread::scope(|s| {
        for band in 0..bands {
            let tx = tx.clone();
            let start = band * rows;
            s.spawn(move || {
                for y in start..(start + rows).min(h) {
                    for x in 0..w {
                        if tx.send(render_pixel(scene, camera, integrator, x, y)).is_err() {
                            return;
                        }
                    }
                }
            });
        }
    });
}

/// Update the scene and render a full frame.
pub fn render(scene: &mut Scene, integrator: &mut dyn Integrator, config: &RenderConfig) -> Result<Image, RenderError> {
    scene.update()?;
    integrator.preprocess(scene);

    let scene: &Scene = scene;
    let integrator: &dyn Integrator = integrator;
    let camera = scene.camera().ok_or(SceneError::NoCamera)?;
    let (w, h) = camera.resolution();
    log::info!("Rendering {w}x{h} ({:?}, {} workers)", config.strategy, config.worker_count());

    let start = Instant::now();
    let mut image = Image::new(w, h);
    let (tx, rx) = flume::bounded(FRAGMENT_BUFFER);
    let written = thread::scope(|s| {
        s.spawn(move || integrate(scene, camera, integrator, config, tx));
        image.acquire(rx)
    });
    log::info!("Rendered {written} pixels in {:.2?}", start.elapsed());
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PerspectiveCamera;
    use crate::integrator::Trivial;
    use kdray_core::{PrimitiveObject, Sphere};
    use kdray_math::Rgba;

    /// Reports what the pipeline handed to the integrator.
    struct Probe;

    impl Integrator for Probe {
        fn integrate(&self, _scene: &Scene, state: &mut RenderState, ray: &DifferentialRay) -> Rgba {
            let finite = ray.has_differentials
                && ray.dir_x.is_finite()
                && ray.dir_y.is_finite()
                && ray.from_x.is_finite()
                && ray.from_y.is_finite();
            Rgba::new(
                state.pixel_number as f64,
                state.screen_pos.x,
                state.screen_pos.y,
                if finite { 1.0 } else { 0.0 },
            )
        }
    }

    fn camera(w: usize, h: usize) -> PerspectiveCamera {
        PerspectiveCamera::new(Vector::new(0.0, 0.0, 5.0), Vector::ZERO, Vector::new(0.0, 1.0, 5.0), w, h, 1.0, 1.0)
    }

    fn probe_scene(w: usize, h: usize) -> Scene {
        let mut scene = Scene::default();
        scene.set_camera(Box::new(camera(w, h)));
        scene
    }

    fn check_probe_image(img: &Image) {
        let (w, h) = (img.width(), img.height());
        for y in 0..h {
            for x in 0..w {
                let p = img.pixel(x, y).unwrap();
                assert_eq!(p.r, (y * w + x) as f64);
                assert!((p.g - (2.0 * x as f64 / w as f64 - 1.0)).abs() < 1e-12);
                assert!((p.b - (1.0 - 2.0 * y as f64 / h as f64)).abs() < 1e-12);
                assert_eq!(p.a, 1.0, "bad differentials at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_every_strategy_covers_the_image() {
        let configs = [
            RenderConfig {
                strategy: Strategy::Simple,
                workers: None,
            },
            RenderConfig {
                strategy: Strategy::Block,
                workers: Some(3),
            },
            RenderConfig {
                strategy: Strategy::Worker,
                workers: Some(3),
            },
            RenderConfig {
                strategy: Strategy::Worker,
                workers: Some(4),
            },
            // 45 = 13 * 3 + 6: the remainder outgrows an even share
            RenderConfig {
                strategy: Strategy::Worker,
                workers: Some(13),
            },
            // More workers than rows falls back to a single thread
            RenderConfig {
                strategy: Strategy::Worker,
                workers: Some(64),
            },
        ];
        for config in configs {
            let mut scene = probe_scene(70, 45);
            let img = render(&mut scene, &mut Probe, &config).unwrap();
            assert_eq!((img.width(), img.height()), (70, 45));
            check_probe_image(&img);
        }
    }

    /// Paints every pixel it is asked for.
    struct Opaque;

    impl Integrator for Opaque {
        fn integrate(&self, _scene: &Scene, _state: &mut RenderState, _ray: &DifferentialRay) -> Rgba {
            Rgba::new(1.0, 1.0, 1.0, 1.0)
        }
    }

    #[test]
    fn test_worker_bands_cover_uneven_rows() {
        // (rows, workers) with h % workers > h / workers
        for (h, workers) in [(7, 4), (30, 16), (11, 6), (5, 3)] {
            let mut scene = probe_scene(3, h);
            let config = RenderConfig {
                strategy: Strategy::Worker,
                workers: Some(workers),
            };
            let img = render(&mut scene, &mut Opaque, &config).unwrap();
            let missing: Vec<usize> = (0..h)
                .filter(|&y| (0..3).any(|x| img.pixel(x, y).unwrap().a != 1.0))
                .collect();
            assert!(missing.is_empty(), "{h} rows on {workers} workers missed rows {missing:?}");
        }
    }

    /// Reports the sample offset each pixel starts from.
    struct Offsets;

    impl Integrator for Offsets {
        fn integrate(&self, _scene: &Scene, state: &mut RenderState, _ray: &DifferentialRay) -> Rgba {
            Rgba::new(f64::from(state.sampling_offset), state.pixel_number as f64, 0.0, 1.0)
        }
    }

    #[test]
    fn test_pixels_get_distinct_sample_offsets() {
        let mut scene = probe_scene(4, 3);
        scene.update().unwrap();
        let cam = camera(4, 3);
        let mut seen = std::collections::HashSet::new();
        for y in 0..3 {
            for x in 0..4 {
                let frag = render_pixel(&scene, &cam, &Offsets, x, y);
                let offset = frag.color.r as u32;
                assert_ne!(offset, 0);
                assert_eq!(offset, fnv32a(frag.color.g as u32));
                seen.insert(offset);
            }
        }
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn test_integrate_fragment_count() {
        let mut scene = probe_scene(33, 2);
        scene.update().unwrap();
        let cam = camera(33, 2);
        let (tx, rx) = flume::unbounded();
        integrate(&scene, &cam, &Probe, &RenderConfig::default(), tx);
        let frags: Vec<Fragment> = rx.iter().collect();
        assert_eq!(frags.len(), 66);
        // Last pixel still gets finite differentials
        let last = frags.iter().find(|f| f.x == 32 && f.y == 1).unwrap();
        assert_eq!(last.color.a, 1.0);
    }

    #[test]
    fn test_render_sphere() {
        let mut scene = probe_scene(16, 16);
        scene.add_object(Box::new(PrimitiveObject::new(Sphere::new(Vector::ZERO, 1.0, None))));
        let img = render(&mut scene, &mut Trivial, &RenderConfig::default()).unwrap();
        assert_eq!(img.pixel(8, 8).unwrap(), Rgba::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(img.pixel(0, 0).unwrap(), Rgba::new(0.1, 0.1, 0.1, 0.0));
    }

    #[test]
    fn test_render_without_camera() {
        let mut scene = Scene::default();
        let err = render(&mut scene, &mut Trivial, &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, RenderError::Scene(SceneError::NoCamera)));
    }

    #[test]
    fn test_worker_count() {
        let config = RenderConfig {
            strategy: Strategy::Block,
            workers: Some(5),
        };
        assert_eq!(config.worker_count(), 5);
        assert!(RenderConfig::default().worker_count() >= 1);
        let zero = RenderConfig {
            workers: Some(0),
            ..Default::default()
        };
        assert!(zero.worker_count() >= 1);
    }
}
