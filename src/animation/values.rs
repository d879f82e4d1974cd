use glam::{Quat, Vec3};
use smallvec::SmallVec;

use crate::animation::binding::TargetPath;

/// Morph target weights of one keyframe.
pub type Weights = SmallVec<[f32; 4]>;

pub trait Interpolatable: Clone {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self;
}

impl Interpolatable for f32 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start + (end - start) * t
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        start.lerp(*end, t)
    }
}

impl Interpolatable for Quat {
    /// Spherical interpolation along the shortest arc.
    ///
    /// `q` and `-q` describe the same rotation; flipping `end` into the same
    /// hemisphere as `start` keeps the interpolation on the short path.
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        let end = if start.dot(*end) < 0.0 { -*end } else { *end };
        start.slerp(end, t).normalize()
    }
}

impl Interpolatable for Weights {
    /// Component-wise lerp; a shorter list is padded with zeros.
    fn interpolate_linear(start: &Self, end: &Self, t: f32) -> Self {
        let len = start.len().max(end.len());
        (0..len)
            .map(|i| {
                let a = start.get(i).copied().unwrap_or(0.0);
                let b = end.get(i).copied().unwrap_or(0.0);
                a + (b - a) * t
            })
            .collect()
    }
}

/// The value of one node property produced by track evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Translation(Vec3),
    Rotation(Quat),
    Scale(Vec3),
    Weights(Weights),
}

impl PropertyValue {
    #[must_use]
    pub fn path(&self) -> TargetPath {
        match self {
            Self::Translation(_) => TargetPath::Translation,
            Self::Rotation(_) => TargetPath::Rotation,
            Self::Scale(_) => TargetPath::Scale,
            Self::Weights(_) => TargetPath::Weights,
        }
    }
}
