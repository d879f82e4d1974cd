use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3};

bitflags! {
    /// Which local pose slots are currently driven by animation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PoseSlots: u8 {
        const TRANSLATION = 1 << 0;
        const ROTATION    = 1 << 1;
        const SCALE       = 1 << 2;
    }
}

/// A node's local pose.
///
/// Translation, rotation and scale are kept as three independent matrices.
/// Each slot holds either the authored value or, while an animation channel
/// drives that property, the most recently evaluated value. Animated values
/// replace the authored slot instead of being composed on top of it, so a
/// property that is both authored and animated is applied exactly once.
#[derive(Debug, Clone)]
pub struct LocalPose {
    // === Authored values ===
    authored_translation: Vec3,
    authored_rotation: Quat,
    authored_scale: Vec3,

    // === Current slot matrices ===
    translation: Mat4,
    rotation: Mat4,
    scale: Mat4,

    animated: PoseSlots,
}

impl LocalPose {
    /// Identity pose.
    #[must_use]
    pub fn new() -> Self {
        Self::from_trs(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE)
    }

    /// Pose from explicit translation, rotation and scale.
    #[must_use]
    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            authored_translation: translation,
            authored_rotation: rotation,
            authored_scale: scale,
            translation: Mat4::from_translation(translation),
            rotation: Mat4::from_quat(rotation),
            scale: Mat4::from_scale(scale),
            animated: PoseSlots::empty(),
        }
    }

    /// Pose from a combined local matrix.
    ///
    /// The matrix is decomposed into scale, rotation and translation. Skew and
    /// perspective terms cannot be represented and are discarded.
    #[must_use]
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self::from_trs(translation, rotation.normalize(), scale)
    }

    // ========================================================================
    // Slot access
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn translation(&self) -> &Mat4 {
        &self.translation
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> &Mat4 {
        &self.rotation
    }

    #[inline]
    #[must_use]
    pub fn scale(&self) -> &Mat4 {
        &self.scale
    }

    /// Composed local matrix `T * R * S` from the current slots.
    #[inline]
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        self.translation * self.rotation * self.scale
    }

    #[inline]
    #[must_use]
    pub fn authored_translation(&self) -> Vec3 {
        self.authored_translation
    }

    #[inline]
    #[must_use]
    pub fn authored_rotation(&self) -> Quat {
        self.authored_rotation
    }

    #[inline]
    #[must_use]
    pub fn authored_scale(&self) -> Vec3 {
        self.authored_scale
    }

    /// Slots currently overridden by animation.
    #[inline]
    #[must_use]
    pub fn animated(&self) -> PoseSlots {
        self.animated
    }

    // ========================================================================
    // Animation overrides
    // ========================================================================

    pub fn set_animated_translation(&mut self, translation: Vec3) {
        self.translation = Mat4::from_translation(translation);
        self.animated |= PoseSlots::TRANSLATION;
    }

    pub fn set_animated_rotation(&mut self, rotation: Quat) {
        self.rotation = Mat4::from_quat(rotation);
        self.animated |= PoseSlots::ROTATION;
    }

    pub fn set_animated_scale(&mut self, scale: Vec3) {
        self.scale = Mat4::from_scale(scale);
        self.animated |= PoseSlots::SCALE;
    }

    /// Restores every animated slot to its authored value.
    pub fn clear_animation(&mut self) {
        if self.animated.contains(PoseSlots::TRANSLATION) {
            self.translation = Mat4::from_translation(self.authored_translation);
        }
        if self.animated.contains(PoseSlots::ROTATION) {
            self.rotation = Mat4::from_quat(self.authored_rotation);
        }
        if self.animated.contains(PoseSlots::SCALE) {
            self.scale = Mat4::from_scale(self.authored_scale);
        }
        self.animated = PoseSlots::empty();
    }
}

impl Default for LocalPose {
    fn default() -> Self {
        Self::new()
    }
}
