//! Tunnel engine: owns the parameter snapshot, the camera driver and both
//! instance pools, and advances them once per tick.
//!
//! The engine never reallocates pools during a tick. Structural parameter
//! changes build a complete replacement pool first and swap it in, so a tick
//! only ever sees a whole old pool or a whole new one.

use crate::camera::{AdvanceMode, CameraDriver};
use crate::constants::CAMERA_START_DEPTH;
use crate::params::{ParameterSet, RebuildScope};
use crate::rings::RingTrack;
use crate::shapes::ShapeField;
use rand::prelude::*;
use std::time::Duration;

/// Derive a generator for one pool build from the engine seed.
fn pool_rng(seed: u64, generation: u64) -> StdRng {
    let mix = seed ^ generation.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(mix)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickStats {
    pub camera_depth: f64,
    pub ring_wraps: usize,
    pub shape_recycles: usize,
}

#[derive(Clone, Debug)]
pub struct TunnelEngine {
    params: ParameterSet,
    camera: CameraDriver,
    rings: RingTrack,
    shapes: ShapeField,
    seed: u64,
    generation: u64,
    elapsed_sec: f64,
    ticks: u64,
    paused: bool,
}

impl TunnelEngine {
    pub fn new(params: ParameterSet, seed: u64) -> Self {
        Self::with_mode(params, seed, AdvanceMode::default())
    }

    pub fn with_mode(params: ParameterSet, seed: u64, mode: AdvanceMode) -> Self {
        let params = params.sanitized();
        let generation = 0;
        let rings = RingTrack::build(&params);
        let shapes = ShapeField::build(&params, pool_rng(seed, generation));
        log::info!(
            "[engine] rings={} shapes={} kind={} seed={seed}",
            rings.len(),
            shapes.len(),
            params.shape_kind
        );
        Self {
            params,
            camera: CameraDriver::new(CAMERA_START_DEPTH, mode),
            rings,
            shapes,
            seed,
            generation,
            elapsed_sec: 0.0,
            ticks: 0,
            paused: false,
        }
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn camera(&self) -> &CameraDriver {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraDriver {
        &mut self.camera
    }

    pub fn rings(&self) -> &RingTrack {
        &self.rings
    }

    pub fn rings_mut(&mut self) -> &mut RingTrack {
        &mut self.rings
    }

    pub fn shapes(&self) -> &ShapeField {
        &self.shapes
    }

    pub fn shapes_mut(&mut self) -> &mut ShapeField {
        &mut self.shapes
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Incremented on every pool rebuild.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn elapsed_sec(&self) -> f64 {
        self.elapsed_sec
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_paused(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Replace the parameter snapshot, rebuilding only what the change requires.
    pub fn apply_params(&mut self, next: ParameterSet) -> RebuildScope {
        let next = next.sanitized();
        let scope = self.params.rebuild_scope(&next);
        self.params = next;
        if !scope.is_empty() {
            self.rebuild(scope);
        }
        scope
    }

    /// Rebuild the requested pools from the current parameters.
    pub fn rebuild(&mut self, scope: RebuildScope) {
        if scope.is_empty() {
            return;
        }
        let generation = self.generation + 1;
        let rings = scope.rings.then(|| RingTrack::build(&self.params));
        let shapes = scope
            .shapes
            .then(|| ShapeField::build(&self.params, pool_rng(self.seed, generation)));

        if let Some(rings) = rings {
            self.rings = rings;
        }
        if let Some(shapes) = shapes {
            self.shapes = shapes;
        }
        self.generation = generation;
        log::info!(
            "[engine] rebuilt rings={} shapes={} (ring_count={} shapes={}x{} kind={}) generation={}",
            scope.rings,
            scope.shapes,
            self.rings.len(),
            self.shapes.depth_segments(),
            self.shapes.shapes_per_ring(),
            self.shapes.kind(),
            generation
        );
    }

    /// Switch to a new seed (or a derived one) and rebuild both pools.
    pub fn reseed(&mut self, seed: Option<u64>) -> u64 {
        let new_seed = seed.unwrap_or_else(|| pool_rng(self.seed, self.generation + 1).gen());
        self.seed = new_seed;
        self.rebuild(RebuildScope::ALL);
        new_seed
    }

    /// One frame: advance the camera, then update rings and shapes against it.
    pub fn tick(&mut self, dt: Duration) -> TickStats {
        if self.paused {
            return TickStats {
                camera_depth: self.camera.depth(),
                ..TickStats::default()
            };
        }
        let camera_depth = self.camera.advance(dt, self.params.camera_advance_speed);
        self.elapsed_sec += dt.as_secs_f64();
        self.ticks += 1;

        let ring_wraps = self.rings.tick(camera_depth, &self.params);
        let shape_recycles = self.shapes.tick(camera_depth, self.elapsed_sec);
        TickStats {
            camera_depth,
            ring_wraps,
            shape_recycles,
        }
    }
}

/// Functional form of a tick: apply `params`, advance by `dt`, return the
/// successor state. Useful for harnesses that keep snapshots.
pub fn step(state: &TunnelEngine, dt: Duration, params: &ParameterSet) -> TunnelEngine {
    let mut next = state.clone();
    next.apply_params(params.clone());
    next.tick(dt);
    next
}
