//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! Errors follow the lifecycle of a loaded asset:
//! - [`LoadError`]: the source could not be read or parsed. Fatal to that load.
//! - [`DecodeError`]: the document parsed, but a reference inside it is out of
//!   range or has an unsupported type. Fatal to that load, carried inside
//!   [`LoadError::Decode`].
//! - [`GraphError`]: the scene graph could not be traversed this frame. Fatal
//!   to that frame only.
//! - [`BackendError`]: a GPU backend call failed.
//!
//! Engine-level APIs return [`Result<T>`], an alias over [`MarionetteError`].
//!
//! Out-of-range playback time is never an error; it is always clamped.

use thiserror::Error;

use crate::animation::TargetPath;
use crate::assets::accessor::{ComponentType, ElementType};
use crate::scene::{NodeIndex, SceneIndex};

/// The main error type for engine-level operations.
#[derive(Error, Debug)]
pub enum MarionetteError {
    /// Loading an asset failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Traversing the scene graph failed.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A GPU backend call failed outside of asset loading.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Engine settings could not be read.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The handle no longer refers to a loaded asset.
    #[error("Stale or unknown asset handle")]
    StaleHandle,

    /// The asset was loaded from memory and has no file to reload from.
    #[error("Asset has no source file to reload from")]
    NotReloadable,
}

// ============================================================================
// Load & Decode Errors
// ============================================================================

/// Failure to produce a [`SceneAsset`](crate::assets::SceneAsset).
///
/// A failed load never exposes a partially built asset.
#[derive(Error, Debug)]
pub enum LoadError {
    /// File I/O error while reading the document or an external resource.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// The file that could not be read
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or does not match the glTF schema.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The binary container is malformed.
    #[error("GLB container error: {0}")]
    Glb(String),

    /// A buffer refers to the binary chunk but the container has none.
    #[error("Buffer {0} refers to a missing GLB binary chunk")]
    MissingBinaryChunk(usize),

    /// A `data:` URI could not be parsed.
    #[error("Data URI error: {0}")]
    DataUri(String),

    /// Base64 payload of a data URI could not be decoded.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// An image could not be decoded.
    #[error("Image decode error for image {image}: {message}")]
    Image {
        /// Image index in the document
        image: usize,
        /// Decoder message
        message: String,
    },

    /// The document declares an asset version this decoder does not read.
    #[error("Unsupported asset version {0}")]
    UnsupportedVersion(String),

    /// The document is well-formed but internally inconsistent.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A GPU call failed while uploading resources.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<gltf::Error> for LoadError {
    fn from(err: gltf::Error) -> Self {
        LoadError::Glb(err.to_string())
    }
}

/// An out-of-range or type-mismatched reference inside a parseable document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// A reference points past the end of its array.
    #[error("{kind} index {index} out of range (only {len} present)")]
    IndexOutOfRange {
        /// What kind of object was referenced
        kind: &'static str,
        /// The invalid index
        index: usize,
        /// Number of objects of that kind
        len: usize,
    },

    /// A buffer view does not fit inside its buffer.
    #[error(
        "Buffer view {view} spans {required} bytes but buffer {buffer} holds only {available}"
    )]
    BufferViewOutOfBounds {
        /// Buffer view index
        view: usize,
        /// Buffer index
        buffer: usize,
        /// End offset required by the view
        required: usize,
        /// Buffer length
        available: usize,
    },

    /// An accessor does not fit inside its buffer view.
    #[error("Accessor {accessor} needs {required} bytes but its buffer view holds only {available}")]
    AccessorOutOfBounds {
        /// Accessor index
        accessor: usize,
        /// End offset required by the accessor
        required: usize,
        /// Buffer view length
        available: usize,
    },

    /// A component type code is not part of the format.
    #[error("Accessor {accessor} has unknown component type {code}")]
    UnknownComponentType {
        /// Accessor index
        accessor: usize,
        /// Raw component type code
        code: u32,
    },

    /// An element type name is not part of the format.
    #[error("Accessor {accessor} has unknown element type {name:?}")]
    UnknownElementType {
        /// Accessor index
        accessor: usize,
        /// Raw element type name
        name: String,
    },

    /// The accessor's component type cannot be used for this purpose.
    #[error("Accessor {accessor} component type {component_type:?} is not supported for {usage}")]
    UnsupportedComponentType {
        /// Accessor index
        accessor: usize,
        /// Declared component type
        component_type: ComponentType,
        /// What the accessor was used for
        usage: AccessorUsage,
    },

    /// The accessor's element type cannot be used for this purpose.
    #[error("Accessor {accessor} element type {element_type:?} is not supported for {usage}")]
    UnsupportedElementType {
        /// Accessor index
        accessor: usize,
        /// Declared element type
        element_type: ElementType,
        /// What the accessor was used for
        usage: AccessorUsage,
    },

    /// An accessor without a buffer view was used where GPU data is needed.
    #[error("Accessor {accessor} has no buffer view and cannot be uploaded")]
    MissingBufferView {
        /// Accessor index
        accessor: usize,
    },

    /// Vertex attributes of one primitive disagree on their element count.
    #[error("Mesh {mesh} primitive {primitive}: attribute counts differ ({expected} vs {found})")]
    AttributeCountMismatch {
        /// Mesh index
        mesh: usize,
        /// Primitive index within the mesh
        primitive: usize,
        /// Count of the first recognized attribute
        expected: usize,
        /// Count of the mismatching attribute
        found: usize,
    },

    /// A primitive declares a topology outside the supported set.
    #[error("Mesh {mesh} primitive {primitive} has unknown mode {mode}")]
    UnknownPrimitiveMode {
        /// Mesh index
        mesh: usize,
        /// Primitive index within the mesh
        primitive: usize,
        /// Raw mode value
        mode: u32,
    },

    /// An animation sampler names an interpolation the decoder does not know.
    #[error("Animation {animation} sampler {sampler} has unknown interpolation {name:?}")]
    UnknownInterpolation {
        /// Animation index
        animation: usize,
        /// Sampler index
        sampler: usize,
        /// Raw interpolation name
        name: String,
    },

    /// Sampler input and output counts do not describe the same keyframes.
    #[error(
        "Animation {animation} channel {channel}: {inputs} keyframe times but {outputs} output values"
    )]
    KeyframeCountMismatch {
        /// Animation index
        animation: usize,
        /// Channel index
        channel: usize,
        /// Number of input (time) values
        inputs: usize,
        /// Number of output values
        outputs: usize,
    },

    /// A channel has no keyframes at all.
    #[error("Animation {animation} channel {channel} has no keyframes")]
    EmptyChannel {
        /// Animation index
        animation: usize,
        /// Channel index
        channel: usize,
    },

    /// Keyframe times are not finite or go backwards.
    #[error("Animation {animation} channel {channel}: keyframe {frame} time is out of order or not finite")]
    InvalidKeyframeTime {
        /// Animation index
        animation: usize,
        /// Channel index
        channel: usize,
        /// Offending keyframe
        frame: usize,
    },

    /// A sparse accessor was used where data is uploaded to the GPU as is.
    #[error("Accessor {accessor} is sparse, which is not supported for {usage}")]
    UnsupportedSparseAccessor {
        /// Accessor index
        accessor: usize,
        /// What the accessor was used for
        usage: AccessorUsage,
    },

    /// A sparse substitution targets an element past the accessor's count.
    #[error("Accessor {accessor} sparse index {index} out of range (count {count})")]
    SparseIndexOutOfRange {
        /// Accessor index
        accessor: usize,
        /// The invalid element index
        index: usize,
        /// Element count of the accessor
        count: usize,
    },

    /// A count or offset does not fit the 32-bit range the backend draws with.
    #[error("Accessor {accessor} {field} {value} exceeds the 32-bit range")]
    ValueTooLarge {
        /// Accessor index
        accessor: usize,
        /// Which property overflowed
        field: &'static str,
        /// The offending value
        value: usize,
    },

    /// A texture has no image source.
    #[error("Texture {texture} has no image source")]
    MissingTextureSource {
        /// Texture index
        texture: usize,
    },

    /// An image has neither a URI nor a buffer view.
    #[error("Image {image} has no data source")]
    MissingImageSource {
        /// Image index
        image: usize,
    },

    /// A node matrix has the wrong number of elements.
    #[error("Node {node} has a matrix with {len} elements, expected 16")]
    InvalidNodeMatrix {
        /// Node index
        node: usize,
        /// Number of elements found
        len: usize,
    },
}

/// What an accessor is being decoded for, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorUsage {
    /// Vertex attribute bound to a slot
    VertexAttribute,
    /// Index buffer
    Indices,
    /// Sparse substitution indices
    SparseIndices,
    /// Keyframe times
    KeyframeTimes,
    /// Keyframe values for a node property
    KeyframeValues(TargetPath),
}

impl std::fmt::Display for AccessorUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VertexAttribute => f.write_str("vertex attribute"),
            Self::Indices => f.write_str("indices"),
            Self::SparseIndices => f.write_str("sparse indices"),
            Self::KeyframeTimes => f.write_str("keyframe times"),
            Self::KeyframeValues(path) => write!(f, "{path:?} keyframes"),
        }
    }
}

// ============================================================================
// Graph Errors
// ============================================================================

/// A scene graph traversal failure.
///
/// Fatal only to the frame in which it occurs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A node appears on its own ancestor path.
    #[error("Cycle detected: node {node} is its own ancestor (path {path:?})")]
    Cycle {
        /// The node reached a second time
        node: NodeIndex,
        /// Ancestor path from the root down to the repeated node
        path: Vec<NodeIndex>,
    },

    /// A node index does not exist in the graph.
    #[error("Node index {node} out of range (only {len} nodes)")]
    NodeOutOfRange {
        /// The invalid node index
        node: NodeIndex,
        /// Number of nodes
        len: usize,
    },

    /// A scene index does not exist in the graph.
    #[error("Scene index {scene} out of range (only {len} scenes)")]
    SceneOutOfRange {
        /// The invalid scene index
        scene: SceneIndex,
        /// Number of scenes
        len: usize,
    },
}

// ============================================================================
// Backend & Settings Errors
// ============================================================================

/// A GPU backend call failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("GPU backend error during {operation}: {message}")]
pub struct BackendError {
    /// The backend operation that failed
    pub operation: &'static str,
    /// Backend-provided message
    pub message: String,
}

impl BackendError {
    #[must_use]
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Engine settings could not be read.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("IO error reading settings: {0}")]
    Io(#[from] std::io::Error),

    /// The settings are not valid JSON.
    #[error("Settings parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Alias for `Result<T, MarionetteError>`.
pub type Result<T> = std::result::Result<T, MarionetteError>;
