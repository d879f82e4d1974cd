use crate::assets::accessor::ComponentType;
use crate::render::backend::{GpuBackend, VertexArrayId};

/// Primitive topology of a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveMode {
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Points),
            1 => Some(Self::Lines),
            2 => Some(Self::LineLoop),
            3 => Some(Self::LineStrip),
            4 => Some(Self::Triangles),
            5 => Some(Self::TriangleStrip),
            6 => Some(Self::TriangleFan),
            _ => None,
        }
    }
}

/// Component type of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    U8,
    U16,
    U32,
}

impl IndexType {
    #[must_use]
    pub fn from_component_type(component_type: ComponentType) -> Option<Self> {
        match component_type {
            ComponentType::U8 => Some(Self::U8),
            ComponentType::U16 => Some(Self::U16),
            ComponentType::U32 => Some(Self::U32),
            _ => None,
        }
    }

    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// Attribute locations shared with the shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum AttributeSlot {
    Position = 0,
    Normal = 1,
    TexCoord0 = 2,
    Joints0 = 3,
    Weights0 = 4,
}

impl AttributeSlot {
    /// Slot for a vertex attribute semantic; unrecognized semantics yield `None`.
    #[must_use]
    pub fn from_semantic(semantic: &str) -> Option<Self> {
        match semantic {
            "POSITION" => Some(Self::Position),
            "NORMAL" => Some(Self::Normal),
            "TEXCOORD_0" => Some(Self::TexCoord0),
            "JOINTS_0" => Some(Self::Joints0),
            "WEIGHTS_0" => Some(Self::Weights0),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn location(self) -> u32 {
        self as u32
    }
}

/// How one attribute reads from its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeLayout {
    pub slot: AttributeSlot,
    /// Components per vertex (1..=4)
    pub components: u8,
    pub component_type: ComponentType,
    pub normalized: bool,
    /// Zero for tightly packed data
    pub stride: u32,
    /// Offset of the first element inside the buffer
    pub offset: u32,
}

/// Index data of an indexed draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBinding {
    pub index_type: IndexType,
    pub count: u32,
    pub byte_offset: u32,
}

/// A configured vertex array and the draw parameters that go with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexArray {
    pub id: VertexArrayId,
    pub mode: PrimitiveMode,
    pub indices: Option<IndexBinding>,
    /// Shared count of the bound attributes
    pub vertex_count: u32,
}

impl VertexArray {
    #[inline]
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Number of elements one draw of this array submits.
    #[must_use]
    pub fn element_count(&self) -> u32 {
        self.indices.map_or(self.vertex_count, |i| i.count)
    }
}

/// One draw call of a mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubMesh {
    pub vertex_array: VertexArray,
    /// `None` draws with the default material
    pub material: Option<usize>,
}

/// A named, ordered list of submeshes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mesh {
    pub name: String,
    pub submeshes: Vec<SubMesh>,
}

impl Mesh {
    /// Deletes the vertex arrays of every submesh. Buffers are owned by the
    /// asset's buffer cache and released separately.
    pub fn release<G: GpuBackend + ?Sized>(&mut self, gpu: &mut G) {
        for submesh in self.submeshes.drain(..) {
            gpu.delete_vertex_array(submesh.vertex_array.id);
        }
    }
}
