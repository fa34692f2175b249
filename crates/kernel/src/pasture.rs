use glam::Vec3;
use paturage_common::Transform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{MAX_HERD_SIZE, PastureConfig};
use crate::cow::Cow;

/// An event recorded while the pasture runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PastureEvent {
    /// A grounded cow jumped on its own.
    Jumped { cow: usize, launch_speed: f32 },
    /// A cow touched the ground after being airborne.
    Landed { cow: usize },
    /// A cow reached the fence and turned to a new heading.
    HitBoundary { cow: usize, new_heading: f32 },
    /// The pasture was clicked; the field of view snapped to `fov`.
    Clicked { fov: f32 },
}

/// Camera transforms for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    pub projection: Transform,
    pub view: Transform,
    /// `projection * view`.
    pub view_projection: Transform,
    /// Field of view used for the projection, in radians.
    pub fov: f32,
    /// Seconds simulated in this frame.
    pub dt: f32,
}

/// Aggregate numbers for logging and debug output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PastureSummary {
    pub frame: u64,
    pub seed: u64,
    pub cow_count: usize,
    pub grounded: usize,
    pub mean_height: f32,
    pub fov: f32,
}

/// The whole scene: a fixed herd plus the orbiting camera.
///
/// Owns its RNG so a seeded pasture driven with the same frame times
/// reproduces the same herd motion.
#[derive(Debug, Clone)]
pub struct Pasture {
    config: PastureConfig,
    cows: Vec<Cow>,
    fov: f32,
    prev_time: Option<f64>,
    frame: u64,
    seed: u64,
    rng: StdRng,
    event_log: Vec<PastureEvent>,
}

impl Pasture {
    /// Create a pasture with a random seed. The seed is logged so the run
    /// can be reproduced with [`Pasture::with_seed`].
    pub fn new(config: PastureConfig) -> Self {
        let seed = rand::random();
        tracing::info!(seed, "seeding pasture");
        Self::with_seed(config, seed)
    }

    /// Create a pasture with a fixed seed.
    pub fn with_seed(config: PastureConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let total = config.herd_size();
        let mut cows = Vec::with_capacity(total.min(MAX_HERD_SIZE) as usize);

        if total > 0 {
            let base_age = 7.0 + 160.0 / total as f32;
            for (&breed, &count) in &config.herd {
                for _ in 0..count {
                    let age = base_age * (rng.random::<f32>() / 2.0 + 0.5);
                    cows.push(Cow::new(breed, age, &config.physics, &mut rng));
                }
            }
        }
        tracing::debug!(cows = cows.len(), seed, "herd spawned");

        Self {
            fov: config.camera.initial_fov,
            config,
            cows,
            prev_time: None,
            frame: 0,
            seed,
            rng,
            event_log: Vec::new(),
        }
    }

    pub fn config(&self) -> &PastureConfig {
        &self.config
    }

    pub fn cows(&self) -> &[Cow] {
        &self.cows
    }

    pub fn cows_mut(&mut self) -> &mut [Cow] {
        &mut self.cows
    }

    /// Current field of view in radians.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Number of simulation steps taken.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[PastureEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<PastureEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Run one display frame at `now` seconds: ease the field of view, build
    /// the camera for this frame, then advance every cow.
    ///
    /// The first frame only establishes the clock and simulates nothing.
    /// `aspect` is the viewport width over its height.
    pub fn frame(&mut self, now: f64, aspect: f32) -> FrameView {
        let dt = match self.prev_time {
            Some(prev) => (now - prev).max(0.0) as f32,
            None => 0.0,
        };
        self.prev_time = Some(now);

        self.ease_fov(dt);
        let mut view = self.frame_view(now as f32, aspect);
        view.dt = dt;
        self.step(dt);
        view
    }

    /// Camera transforms at time `time` seconds with the current field of view.
    pub fn frame_view(&self, time: f32, aspect: f32) -> FrameView {
        let camera = &self.config.camera;

        let mut projection = Transform::identity();
        projection.perspective(self.fov, aspect, camera.near, camera.far);

        let mut view = Transform::identity();
        view.translate(0.0, 0.0, -camera.distance)
            .rotate_yaw_pitch(time * camera.orbit_rate, camera.pitch);

        FrameView {
            projection,
            view,
            view_projection: projection * view,
            fov: self.fov,
            dt: 0.0,
        }
    }

    /// Advance every cow by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        let _span = tracing::info_span!("pasture_step", frame = self.frame).entered();

        for (index, cow) in self.cows.iter_mut().enumerate() {
            let outcome = cow.update(dt, &self.config.physics, &mut self.rng);

            if let Some(launch_speed) = outcome.jumped {
                tracing::trace!(cow = index, launch_speed, "jumped");
                self.event_log.push(PastureEvent::Jumped {
                    cow: index,
                    launch_speed,
                });
            }
            if outcome.landed {
                self.event_log.push(PastureEvent::Landed { cow: index });
            }
            if let Some(new_heading) = outcome.hit_boundary {
                tracing::trace!(cow = index, new_heading, "hit boundary");
                self.event_log.push(PastureEvent::HitBoundary {
                    cow: index,
                    new_heading,
                });
            }
        }

        self.frame += 1;
    }

    /// React to a pointer click: snap the field of view and throw every cow
    /// into the air at a random height (or down, when gravity is inverted).
    pub fn click(&mut self) {
        let physics = &self.config.physics;
        self.fov = self.config.camera.click_fov;

        for cow in &mut self.cows {
            let u: f32 = self.rng.random();
            if physics.invert_gravity {
                cow.velocity.y = -u;
            } else {
                cow.force_jump(u * physics.jump_height * 2.0, physics);
            }
        }

        tracing::debug!(fov = self.fov, cows = self.cows.len(), "pasture clicked");
        self.event_log.push(PastureEvent::Clicked { fov: self.fov });
    }

    pub fn summary(&self) -> PastureSummary {
        let cow_count = self.cows.len();
        let mean_height = if cow_count == 0 {
            0.0
        } else {
            self.cows.iter().map(|c| c.position.y).sum::<f32>() / cow_count as f32
        };

        PastureSummary {
            frame: self.frame,
            seed: self.seed,
            cow_count,
            grounded: self.cows.iter().filter(|c| c.grounded).count(),
            mean_height,
            fov: self.fov,
        }
    }

    /// Mean cow position, handy for debug output.
    pub fn herd_centre(&self) -> Vec3 {
        if self.cows.is_empty() {
            return Vec3::ZERO;
        }
        self.cows.iter().map(|c| c.position).sum::<Vec3>() / self.cows.len() as f32
    }

    fn ease_fov(&mut self, dt: f32) {
        let target = self.config.camera.target_fov;
        let multiplier = dt * self.config.camera.fov_easing;

        if multiplier > 1.0 {
            self.fov = target;
        } else {
            self.fov += (target - self.fov) * multiplier;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Breed;
    use paturage_common::TAU;
    use std::collections::BTreeMap;

    fn pasture(seed: u64) -> Pasture {
        Pasture::with_seed(PastureConfig::default(), seed)
    }

    #[test]
    fn herd_follows_config() {
        let p = pasture(1);
        assert_eq!(p.cows().len(), 17);
        let holsteins = p.cows().iter().filter(|c| c.breed == Breed::Holstein).count();
        assert_eq!(holsteins, 9);
    }

    #[test]
    fn ages_scale_with_herd_size() {
        let p = pasture(2);
        let base = 7.0 + 160.0 / 17.0;
        for cow in p.cows() {
            assert!(cow.age >= base * 0.5 && cow.age <= base, "age {}", cow.age);
        }
    }

    #[test]
    fn empty_herd() {
        let config = PastureConfig {
            herd: BTreeMap::new(),
            ..PastureConfig::default()
        };
        let mut p = Pasture::with_seed(config, 3);
        p.frame(0.0, 1.0);
        p.frame(0.016, 1.0);
        p.click();
        assert_eq!(p.summary().cow_count, 0);
        assert_eq!(p.summary().mean_height, 0.0);
        assert_eq!(p.herd_centre(), Vec3::ZERO);
    }

    #[test]
    fn same_seed_same_motion() {
        let mut a = pasture(42);
        let mut b = pasture(42);
        for i in 0..300 {
            let now = i as f64 / 60.0;
            a.frame(now, 1.5);
            b.frame(now, 1.5);
            if i == 100 {
                a.click();
                b.click();
            }
        }
        assert_eq!(a.cows(), b.cows());
        assert_eq!(a.events(), b.events());
    }

    #[test]
    fn different_seeds_diverge() {
        let a = pasture(1);
        let b = pasture(2);
        assert_ne!(a.cows()[0].position, b.cows()[0].position);
    }

    #[test]
    fn first_frame_simulates_nothing() {
        let mut p = pasture(5);
        let before = p.cows().to_vec();
        let view = p.frame(1234.5, 1.0);
        assert_eq!(view.dt, 0.0);
        assert_eq!(p.cows()[0].position, before[0].position);
        assert_eq!(p.frame_count(), 1);
    }

    #[test]
    fn frame_dt_from_timestamps() {
        let mut p = pasture(5);
        p.frame(10.0, 1.0);
        let view = p.frame(10.25, 1.0);
        assert!((view.dt - 0.25).abs() < 1e-6);
    }

    #[test]
    fn fov_eases_toward_target() {
        let mut p = pasture(6);
        let target = p.config().camera.target_fov;
        assert_eq!(p.fov(), TAU / 5.0);

        p.frame(0.0, 1.0);
        p.frame(0.1, 1.0);
        let expected = TAU / 5.0 + (target - TAU / 5.0) * 0.5;
        assert!((p.fov() - expected).abs() < 1e-5);

        // A long stall snaps straight to the target.
        p.frame(5.0, 1.0);
        assert_eq!(p.fov(), target);
    }

    #[test]
    fn click_snaps_fov_and_launches_cows() {
        let mut p = pasture(7);
        for cow in p.cows_mut() {
            cow.velocity.y = 0.0;
        }
        p.click();
        assert_eq!(p.fov(), TAU / 4.3);
        let max_speed = (2.0 * 32.0 * 0.7 * 2.0_f32).sqrt();
        for cow in p.cows() {
            assert!(cow.velocity.y >= 0.0 && cow.velocity.y <= max_speed + 1e-4);
        }
        assert_eq!(p.events().last(), Some(&PastureEvent::Clicked { fov: TAU / 4.3 }));
    }

    #[test]
    fn click_with_inverted_gravity_pushes_down() {
        let mut config = PastureConfig::default();
        config.physics.invert_gravity = true;
        let mut p = Pasture::with_seed(config, 8);
        p.click();
        for cow in p.cows() {
            assert!(cow.velocity.y <= 0.0 && cow.velocity.y > -1.0);
        }
    }

    #[test]
    fn frame_view_composes_projection_and_view() {
        let p = pasture(9);
        let view = p.frame_view(2.0, 1.6);
        let expected = view.projection.to_mat4() * view.view.to_mat4();
        assert!(view.view_projection.to_mat4().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn camera_sees_pasture_centre() {
        let p = pasture(10);
        for time in [0.0, 1.0, 5.0, 20.0] {
            let view = p.frame_view(time, 1.0);
            let clip = view.view_projection.transform_point(Vec3::ZERO);
            assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0, "t={time}: {clip}");
            assert!(clip.z > -1.0 && clip.z < 1.0);
        }
    }

    #[test]
    fn herd_stays_in_pasture_over_time() {
        let mut p = pasture(11);
        let bounds = p.config().physics.bounds;
        for i in 0..1_000 {
            p.frame(i as f64 * 0.02, 1.0);
            if i % 250 == 0 {
                p.click();
            }
            for cow in p.cows() {
                assert!(cow.position.x.abs() <= bounds && cow.position.z.abs() <= bounds);
                assert!(cow.position.y >= 0.0);
            }
        }
        assert!(p.events().iter().any(|e| matches!(e, PastureEvent::Landed { .. })));
    }

    #[test]
    fn drain_events_clears_log() {
        let mut p = pasture(12);
        p.click();
        assert_eq!(p.drain_events().len(), 1);
        assert!(p.events().is_empty());
    }
}
