use glam::Vec3;
use paturage_common::{TAU, Transform};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

use crate::config::{Breed, PhysicsConfig};

/// Offset of the shadow above the ground, in world units.
const SHADOW_LIFT: f32 = 0.05;

/// Floor for the shadow intensity so a high cow still casts a faint shadow.
const MIN_SHADOW: f32 = 0.01;

/// What happened to a cow during one update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CowUpdate {
    /// Launch speed of a voluntary jump taken this update.
    pub jumped: Option<f32>,
    /// The cow touched the ground after being airborne.
    pub landed: bool,
    /// New target heading picked after hitting the fence.
    pub hit_boundary: Option<f32>,
}

/// A cow wandering the pasture.
///
/// Walks toward its target heading, jumps at random, and turns around at the
/// fence. `age` sets its size and how hard it pushes forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cow {
    pub breed: Breed,
    pub age: f32,
    pub position: Vec3,
    pub velocity: Vec3,
    pub heading: f32,
    pub target_heading: f32,
    pub grounded: bool,
    model: Transform,
    rotation: Transform,
}

/// Whichever of `x` and `y` is smaller in magnitude (`y` on ties).
fn abs_min(x: f32, y: f32) -> f32 {
    if x.abs() < y.abs() { x } else { y }
}

impl Cow {
    /// A cow at rest on a random spot of the pasture with a random heading.
    pub fn new<R: Rng + ?Sized>(
        breed: Breed,
        age: f32,
        physics: &PhysicsConfig,
        rng: &mut R,
    ) -> Self {
        let heading = rng.random::<f32>() * TAU;
        let bounds = physics.bounds;
        let position = Vec3::new(
            rng.random::<f32>() * bounds * 2.0 - bounds,
            0.0,
            rng.random::<f32>() * bounds * 2.0 - bounds,
        );
        Self::at(breed, age, position, heading)
    }

    /// A cow at a fixed position and heading, at rest and not yet grounded.
    pub fn at(breed: Breed, age: f32, position: Vec3, heading: f32) -> Self {
        let mut cow = Self {
            breed,
            age,
            position,
            velocity: Vec3::ZERO,
            heading,
            target_heading: heading,
            grounded: false,
            model: Transform::identity(),
            rotation: Transform::identity(),
        };
        cow.refresh_transforms();
        cow
    }

    /// Uniform scale derived from age.
    pub fn scale(&self) -> f32 {
        0.2 + self.age / 100.0
    }

    /// Model transform: position, heading and size.
    pub fn model(&self) -> &Transform {
        &self.model
    }

    /// Heading-only transform, used to rotate normals.
    pub fn rotation(&self) -> &Transform {
        &self.rotation
    }

    /// Launch upward so the apex is `height` above the launch point,
    /// grounded or not. Returns the launch speed.
    ///
    /// With inverted gravity there is no apex; the launch speed is zero.
    pub fn force_jump(&mut self, height: f32, physics: &PhysicsConfig) -> f32 {
        let speed = (-2.0 * physics.effective_gravity() * height).max(0.0).sqrt();
        self.velocity.y = speed;
        speed
    }

    /// Jump the configured height, only from the ground.
    pub fn jump(&mut self, physics: &PhysicsConfig) -> Option<f32> {
        if !self.grounded {
            return None;
        }
        Some(self.force_jump(physics.jump_height, physics))
    }

    /// Advance the cow by `dt` seconds.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        physics: &PhysicsConfig,
        rng: &mut R,
    ) -> CowUpdate {
        let mut outcome = CowUpdate::default();
        let was_grounded = self.grounded;

        if rng.random::<f32>() < physics.jump_rate * dt {
            outcome.jumped = self.jump(physics);
        }

        self.heading += (self.target_heading - self.heading) * dt * physics.heading_smoothing;

        let drag = if self.grounded {
            Vec3::splat(physics.ground_drag)
        } else {
            let vertical = if self.velocity.y > 0.0 { 0.0 } else { physics.fall_drag };
            Vec3::new(physics.air_drag, vertical, physics.air_drag)
        };

        // Always push forward along the target heading. The push scales with
        // drag, so a cow walks at the same pace on the ground and in the air.
        let push = dt * physics.speed() * self.age / 50.0;
        let direction = self.target_heading + FRAC_PI_2;
        self.velocity.x -= direction.cos() * drag.x * push;
        self.velocity.z += direction.sin() * drag.z * push;

        self.position += self.velocity * dt;
        self.velocity.y += physics.effective_gravity() * dt;

        let v = self.velocity;
        self.velocity = Vec3::new(
            v.x - abs_min(v.x * drag.x * dt, v.x),
            v.y - abs_min(v.y * drag.y * dt, v.y),
            v.z - abs_min(v.z * drag.z * dt, v.z),
        );

        // NaN height counts as ground contact.
        self.grounded = false;
        if self.position.y < 0.0 || self.position.y.is_nan() {
            self.position.y = 0.0;
            self.grounded = true;
            outcome.landed = !was_grounded;
        }

        let bounds = physics.bounds;
        if self.position.x.abs() > bounds || self.position.z.abs() > bounds {
            self.target_heading = rng.random::<f32>() * TAU;
            self.position.x = self.position.x.clamp(-bounds, bounds);
            self.position.z = self.position.z.clamp(-bounds, bounds);
            self.velocity = Vec3::ZERO;
            outcome.hit_boundary = Some(self.target_heading);
        }

        self.refresh_transforms();
        outcome
    }

    /// Darkness of the shadow: fades as the cow rises.
    pub fn shadow_intensity(&self, physics: &PhysicsConfig) -> f32 {
        (1.0 - self.position.y / physics.jump_height * self.scale()).max(MIN_SHADOW)
    }

    /// Model transform for the shadow: the cow's transform dropped back to
    /// just above the ground.
    pub fn shadow_model(&self) -> Transform {
        let mut model = self.model;
        model.translate(0.0, (-self.position.y + SHADOW_LIFT) / self.scale(), 0.0);
        model
    }

    fn refresh_transforms(&mut self) {
        let scale = self.scale();
        let p = self.position;

        self.model = Transform::identity();
        self.model
            .translate(p.x, p.y, p.z)
            .rotate(self.heading, Vec3::Y)
            .scale(scale, scale, scale);

        self.rotation = Transform::identity();
        self.rotation.rotate(self.heading, Vec3::Y);
    }
}
