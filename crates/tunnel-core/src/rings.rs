//! Outer ring track: `ring_count` torus instances recycled along the depth axis.
//!
//! Rings start at `-i * spacing` and never get reallocated. Every tick a ring
//! that has fallen more than one spacing behind the camera is pushed exactly
//! one track length further down the tunnel, so taken modulo the track length
//! the rings always tile it without gaps or overlaps.
//!
//! Depths are `f64`: the camera only ever moves one way, and an `f32` depth
//! stops resolving a per-tick step after a few hours of travel.

use crate::color::Color;
use crate::params::ParameterSet;

#[derive(Clone, Debug, PartialEq)]
pub struct RingInstance {
    /// Stable slot in the track.
    pub index: usize,
    pub depth: f64,
    pub rotation: f32,
    /// Interpolated along depth progress; recomputed every tick.
    pub color: Color,
}

#[derive(Clone, Debug)]
pub struct RingTrack {
    rings: Vec<RingInstance>,
    spacing: f32,
}

/// Normalised position of a ring along the visible track, in `[0, 1)`.
///
/// Returns `0.0` for a single-ring track and for degenerate lengths so that
/// no `NaN` reaches a rendered color.
pub fn ring_progress(depth: f64, camera_depth: f64, ring_count: usize, spacing: f32) -> f32 {
    let total = ring_count as f64 * spacing as f64;
    if ring_count <= 1 || !(total > f64::from(f32::EPSILON)) || !total.is_finite() {
        return 0.0;
    }
    let p = ((depth - camera_depth + total).rem_euclid(total) / total) as f32;
    // rem_euclid or the narrowing may round up to 1.0 for tiny negative offsets
    if p.is_finite() && p < 1.0 {
        p
    } else {
        0.0
    }
}

/// Move `depth` back by whole track lengths until it is no longer beyond
/// `threshold`, returning how many lengths it moved.
///
/// The plain recycle rule moves an instance exactly one track length per
/// tick. That is all a per-frame step ever needs, but after a camera jump
/// longer than the track (a time-scaled advance after a stall, a teleport)
/// one length would leave the instance still behind the camera for several
/// ticks. Here it catches up in a single tick instead, which goes beyond the
/// one-length rule while keeping the tiling modulo the track length.
pub(crate) fn wrap_behind(depth: &mut f64, threshold: f64, track_length: f64) -> usize {
    let n = ((*depth - threshold) / track_length).ceil().max(1.0);
    *depth -= n * track_length;
    let mut wraps = n as usize;
    if *depth > threshold {
        *depth -= track_length;
        wraps += 1;
    }
    wraps
}

impl RingTrack {
    /// Lay out a fresh track from the structural parameters.
    pub fn build(params: &ParameterSet) -> Self {
        let count = params.ring_count.max(1) as usize;
        let spacing = params.ring_spacing;
        let rings = (0..count)
            .map(|i| RingInstance {
                index: i,
                depth: -(i as f64) * spacing as f64,
                rotation: 0.0,
                color: params.color1,
            })
            .collect();
        Self { rings, spacing }
    }

    pub fn rings(&self) -> &[RingInstance] {
        &self.rings
    }

    /// Mutable access for harnesses that need to place rings directly.
    pub fn rings_mut(&mut self) -> &mut [RingInstance] {
        &mut self.rings
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn track_length(&self) -> f64 {
        self.rings.len() as f64 * self.spacing as f64
    }

    /// Rotate, recycle and recolor every ring. Returns how many wraps occurred.
    ///
    /// Only continuous parameters (rotation speed, colors) are read from
    /// `params`; count and spacing are those the track was built with.
    pub fn tick(&mut self, camera_depth: f64, params: &ParameterSet) -> usize {
        let count = self.rings.len();
        let spacing = self.spacing;
        let total = self.track_length();
        let threshold = camera_depth + spacing as f64;
        let mut wraps = 0;

        for ring in &mut self.rings {
            ring.rotation += params.ring_rotation_speed;

            if total > 0.0 && total.is_finite() && ring.depth > threshold {
                wraps += wrap_behind(&mut ring.depth, threshold, total);
            }

            let progress = ring_progress(ring.depth, camera_depth, count, spacing);
            ring.color = params.color1.lerp(params.color2, progress);
        }
        if wraps > 0 {
            log::trace!("[rings] {wraps} wraps at camera depth {camera_depth:.2}");
        }
        wraps
    }
}
