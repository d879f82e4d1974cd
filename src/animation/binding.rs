/// Defines the target property for animation data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation, // Maps to pose translation slot
    Rotation,    // Maps to pose rotation slot
    Scale,       // Maps to pose scale slot
    Weights,     // Maps to morph target weights (decoded, not applied)
}

impl TargetPath {
    /// Parses the document's path name. Unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "translation" => Some(Self::Translation),
            "rotation" => Some(Self::Rotation),
            "scale" => Some(Self::Scale),
            "weights" => Some(Self::Weights),
            _ => None,
        }
    }
}
