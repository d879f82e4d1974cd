use crate::scene::NodeIndex;

/// A named, ordered list of root nodes.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub name: String,
    pub roots: Vec<NodeIndex>,
}

impl Scene {
    #[must_use]
    pub fn new(name: impl Into<String>, roots: Vec<NodeIndex>) -> Self {
        Self {
            name: name.into(),
            roots,
        }
    }
}
