//! Binary Accessor Table
//!
//! Typed views into raw buffer blobs. Every buffer view and accessor of a
//! document is validated once, up front, by [`AccessorTable::new`]; the typed
//! readers afterwards only index memory that is known to be in bounds.
//!
//! Offsets and counts come straight from the document, so every bound is
//! computed with checked arithmetic. An overflowing bound is reported as out
//! of bounds with `required == usize::MAX`.

use crate::errors::{AccessorUsage, DecodeError};
use crate::resources::buffer::BufferTarget;

/// Storage type of one accessor component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ComponentType {
    /// Maps a GL component type code.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            5120 => Some(Self::I8),
            5121 => Some(Self::U8),
            5122 => Some(Self::I16),
            5123 => Some(Self::U16),
            5124 => Some(Self::I32),
            5125 => Some(Self::U32),
            5126 => Some(Self::F32),
            5130 => Some(Self::F64),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::I8 => 5120,
            Self::U8 => 5121,
            Self::I16 => 5122,
            Self::U16 => 5123,
            Self::I32 => 5124,
            Self::U32 => 5125,
            Self::F32 => 5126,
            Self::F64 => 5130,
        }
    }

    /// Size of one component in bytes.
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Whether a `normalized` accessor of this type maps to `[0, 1]` or `[-1, 1]`.
    #[must_use]
    pub fn is_normalizable(self) -> bool {
        matches!(self, Self::I8 | Self::U8 | Self::I16 | Self::U16)
    }
}

/// Shape of one accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl ElementType {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SCALAR" => Some(Self::Scalar),
            "VEC2" => Some(Self::Vec2),
            "VEC3" => Some(Self::Vec3),
            "VEC4" => Some(Self::Vec4),
            "MAT2" => Some(Self::Mat2),
            "MAT3" => Some(Self::Mat3),
            "MAT4" => Some(Self::Mat4),
            _ => None,
        }
    }

    /// Number of components per element.
    #[must_use]
    pub fn components(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }
}

/// Size in bytes of one element.
#[inline]
#[must_use]
pub fn element_size(component_type: ComponentType, element_type: ElementType) -> usize {
    component_type.size() * element_type.components()
}

/// Byte range of one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferView {
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    /// `None` means tightly packed
    pub byte_stride: Option<usize>,
    pub target: Option<BufferTarget>,
}

/// Typed logical view into a [`BufferView`].
#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    /// `None` for zero-filled accessors
    pub buffer_view: Option<usize>,
    pub byte_offset: usize,
    pub component_type: ComponentType,
    pub element_type: ElementType,
    pub count: usize,
    pub normalized: bool,
    pub min: Option<Vec<f32>>,
    pub max: Option<Vec<f32>>,
    /// Element substitutions applied after the dense data is read
    pub sparse: Option<SparseStorage>,
}

/// Where the sparse substitutions of an [`Accessor`] live.
///
/// Indices and values are tightly packed; values share the accessor's
/// component and element type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseStorage {
    pub count: usize,
    pub indices_view: usize,
    pub indices_offset: usize,
    /// `U8`, `U16` or `U32`
    pub index_type: ComponentType,
    pub values_view: usize,
    pub values_offset: usize,
}

impl Accessor {
    #[inline]
    #[must_use]
    pub fn element_size(&self) -> usize {
        element_size(self.component_type, self.element_type)
    }

    /// Distance in bytes between consecutive elements.
    #[must_use]
    pub fn stride(&self, view: &BufferView) -> usize {
        view.byte_stride
            .filter(|&s| s > 0)
            .unwrap_or_else(|| self.element_size())
    }

    /// Bytes of the buffer view this accessor needs, counted from the view start.
    ///
    /// `None` if the bound does not fit in `usize`.
    #[must_use]
    pub fn required_length(&self, view: &BufferView) -> Option<usize> {
        if self.count == 0 {
            return Some(self.byte_offset);
        }
        let span = match view.byte_stride.filter(|&s| s > 0) {
            Some(stride) => (self.count - 1)
                .checked_mul(stride)?
                .checked_add(self.element_size())?,
            None => self.count.checked_mul(self.element_size())?,
        };
        self.byte_offset.checked_add(span)
    }
}

/// Validated buffers, buffer views and accessors of one document.
#[derive(Debug, Clone, Copy)]
pub struct AccessorTable<'a> {
    buffers: &'a [Vec<u8>],
    views: &'a [BufferView],
    accessors: &'a [Accessor],
}

impl<'a> AccessorTable<'a> {
    /// Checks every view against its buffer and every accessor against its view.
    pub fn new(
        buffers: &'a [Vec<u8>],
        views: &'a [BufferView],
        accessors: &'a [Accessor],
    ) -> Result<Self, DecodeError> {
        for (index, view) in views.iter().enumerate() {
            let buffer = buffers.get(view.buffer).ok_or(DecodeError::IndexOutOfRange {
                kind: "buffer",
                index: view.buffer,
                len: buffers.len(),
            })?;
            let end = view.byte_offset.checked_add(view.byte_length);
            if end.is_none_or(|end| end > buffer.len()) {
                return Err(DecodeError::BufferViewOutOfBounds {
                    view: index,
                    buffer: view.buffer,
                    required: end.unwrap_or(usize::MAX),
                    available: buffer.len(),
                });
            }
        }

        for (index, accessor) in accessors.iter().enumerate() {
            // Every reader allocates `count` elements
            if accessor.count.checked_mul(accessor.element_size()).is_none() {
                return Err(DecodeError::AccessorOutOfBounds {
                    accessor: index,
                    required: usize::MAX,
                    available: 0,
                });
            }
            if let Some(view_index) = accessor.buffer_view {
                let view = lookup_view(views, view_index)?;
                check_span(index, accessor.required_length(view), view.byte_length)?;
            }
            if let Some(sparse) = &accessor.sparse {
                check_sparse(index, accessor, sparse, views)?;
            }
        }

        Ok(Self {
            buffers,
            views,
            accessors,
        })
    }

    pub fn accessor(&self, index: usize) -> Result<&'a Accessor, DecodeError> {
        self.accessors.get(index).ok_or(DecodeError::IndexOutOfRange {
            kind: "accessor",
            index,
            len: self.accessors.len(),
        })
    }

    pub fn view(&self, index: usize) -> Result<&'a BufferView, DecodeError> {
        self.views.get(index).ok_or(DecodeError::IndexOutOfRange {
            kind: "buffer view",
            index,
            len: self.views.len(),
        })
    }

    #[inline]
    #[must_use]
    pub fn views(&self) -> &'a [BufferView] {
        self.views
    }

    /// Bytes covered by buffer view `index`.
    pub fn view_bytes(&self, index: usize) -> Result<&'a [u8], DecodeError> {
        let view = self.view(index)?;
        // In bounds: checked in `new`
        let buffer = &self.buffers[view.buffer];
        Ok(&buffer[view.byte_offset..view.byte_offset + view.byte_length])
    }

    /// Every component of accessor `index` as `f32`, element after element.
    ///
    /// Normalized integers map to `[0, 1]` / `[-1, 1]`; other integers convert
    /// by value. Accessors without a buffer view read as zeros. Sparse
    /// substitutions are applied last.
    pub fn read_f32(&self, index: usize) -> Result<Vec<f32>, DecodeError> {
        let accessor = self.accessor(index)?;
        let components = accessor.element_type.components();
        let len = accessor
            .count
            .checked_mul(components)
            .ok_or(DecodeError::AccessorOutOfBounds {
                accessor: index,
                required: usize::MAX,
                available: 0,
            })?;

        let mut out = match accessor.buffer_view {
            None => vec![0.0; len],
            Some(view_index) => {
                let view = self.view(view_index)?;
                let bytes = self.view_bytes(view_index)?;
                let stride = accessor.stride(view);
                let size = accessor.component_type.size();

                // In bounds: `required_length` was checked in `new`
                let mut out = Vec::with_capacity(len);
                for element in 0..accessor.count {
                    let base = accessor.byte_offset + element * stride;
                    for c in 0..components {
                        let at = base + c * size;
                        out.push(read_component(
                            &bytes[at..at + size],
                            accessor.component_type,
                            accessor.normalized,
                        ));
                    }
                }
                out
            }
        };

        if let Some(sparse) = &accessor.sparse {
            self.apply_sparse(index, accessor, sparse, &mut out)?;
        }
        Ok(out)
    }

    fn apply_sparse(
        &self,
        index: usize,
        accessor: &Accessor,
        sparse: &SparseStorage,
        out: &mut [f32],
    ) -> Result<(), DecodeError> {
        let components = accessor.element_type.components();
        let size = accessor.component_type.size();
        let index_size = sparse.index_type.size();
        let element_size = accessor.element_size();

        // Both spans were checked in `new`
        let indices = &self.view_bytes(sparse.indices_view)?[sparse.indices_offset..];
        let values = &self.view_bytes(sparse.values_view)?[sparse.values_offset..];

        for i in 0..sparse.count {
            let target = read_index(&indices[i * index_size..(i + 1) * index_size]);
            if target >= accessor.count {
                return Err(DecodeError::SparseIndexOutOfRange {
                    accessor: index,
                    index: target,
                    count: accessor.count,
                });
            }
            let value = &values[i * element_size..(i + 1) * element_size];
            for c in 0..components {
                out[target * components + c] = read_component(
                    &value[c * size..(c + 1) * size],
                    accessor.component_type,
                    accessor.normalized,
                );
            }
        }
        Ok(())
    }

    /// Reads accessor `index` as `N`-component vectors after checking that
    /// its shape and type suit `usage`.
    pub fn read_vectors<const N: usize>(
        &self,
        index: usize,
        usage: AccessorUsage,
    ) -> Result<Vec<[f32; N]>, DecodeError> {
        let accessor = self.accessor(index)?;
        check_keyframe_accessor(index, accessor, usage, N)?;

        let flat = self.read_f32(index)?;
        Ok(flat
            .chunks_exact(N)
            .map(|chunk| {
                let mut v = [0.0; N];
                v.copy_from_slice(chunk);
                v
            })
            .collect())
    }

    /// Reads a scalar accessor whose element count is a multiple of its
    /// keyframe count (morph weights store several scalars per keyframe).
    pub fn read_scalars(&self, index: usize, usage: AccessorUsage) -> Result<Vec<f32>, DecodeError> {
        let accessor = self.accessor(index)?;
        check_keyframe_accessor(index, accessor, usage, 1)?;
        self.read_f32(index)
    }
}

fn lookup_view(views: &[BufferView], index: usize) -> Result<&BufferView, DecodeError> {
    views.get(index).ok_or(DecodeError::IndexOutOfRange {
        kind: "buffer view",
        index,
        len: views.len(),
    })
}

fn check_span(accessor: usize, required: Option<usize>, available: usize) -> Result<(), DecodeError> {
    match required {
        Some(required) if required <= available => Ok(()),
        _ => Err(DecodeError::AccessorOutOfBounds {
            accessor,
            required: required.unwrap_or(usize::MAX),
            available,
        }),
    }
}

fn check_sparse(
    index: usize,
    accessor: &Accessor,
    sparse: &SparseStorage,
    views: &[BufferView],
) -> Result<(), DecodeError> {
    if !matches!(
        sparse.index_type,
        ComponentType::U8 | ComponentType::U16 | ComponentType::U32
    ) {
        return Err(DecodeError::UnsupportedComponentType {
            accessor: index,
            component_type: sparse.index_type,
            usage: AccessorUsage::SparseIndices,
        });
    }

    let indices_view = lookup_view(views, sparse.indices_view)?;
    let indices_end = sparse
        .count
        .checked_mul(sparse.index_type.size())
        .and_then(|span| span.checked_add(sparse.indices_offset));
    check_span(index, indices_end, indices_view.byte_length)?;

    let values_view = lookup_view(views, sparse.values_view)?;
    let values_end = sparse
        .count
        .checked_mul(accessor.element_size())
        .and_then(|span| span.checked_add(sparse.values_offset));
    check_span(index, values_end, values_view.byte_length)
}

/// Accepted types for data decoded on the CPU for animation.
fn check_keyframe_accessor(
    index: usize,
    accessor: &Accessor,
    usage: AccessorUsage,
    components: usize,
) -> Result<(), DecodeError> {
    if accessor.element_type.components() != components
        || matches!(
            accessor.element_type,
            ElementType::Mat2 | ElementType::Mat3 | ElementType::Mat4
        )
    {
        return Err(DecodeError::UnsupportedElementType {
            accessor: index,
            element_type: accessor.element_type,
            usage,
        });
    }

    let component_ok = match usage {
        AccessorUsage::KeyframeValues(
            crate::animation::TargetPath::Rotation | crate::animation::TargetPath::Weights,
        ) => {
            accessor.component_type.is_float()
                || (accessor.normalized && accessor.component_type.is_normalizable())
        }
        _ => accessor.component_type.is_float(),
    };
    if !component_ok {
        return Err(DecodeError::UnsupportedComponentType {
            accessor: index,
            component_type: accessor.component_type,
            usage,
        });
    }
    Ok(())
}

/// Reads a little-endian unsigned index of 1, 2 or 4 bytes.
fn read_index(bytes: &[u8]) -> usize {
    match *bytes {
        [b] => usize::from(b),
        [a, b] => usize::from(u16::from_le_bytes([a, b])),
        [a, b, c, d] => u32::from_le_bytes([a, b, c, d]) as usize,
        _ => 0,
    }
}

fn read_component(bytes: &[u8], component_type: ComponentType, normalized: bool) -> f32 {
    match component_type {
        ComponentType::I8 => {
            let v = f32::from(i8::from_le_bytes([bytes[0]]));
            if normalized { (v / 127.0).max(-1.0) } else { v }
        }
        ComponentType::U8 => {
            let v = f32::from(bytes[0]);
            if normalized { v / 255.0 } else { v }
        }
        ComponentType::I16 => {
            let v = f32::from(i16::from_le_bytes([bytes[0], bytes[1]]));
            if normalized { (v / 32767.0).max(-1.0) } else { v }
        }
        ComponentType::U16 => {
            let v = f32::from(u16::from_le_bytes([bytes[0], bytes[1]]));
            if normalized { v / 65535.0 } else { v }
        }
        ComponentType::I32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
        ComponentType::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
        ComponentType::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        ComponentType::F64 => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[..8]);
            f64::from_le_bytes(raw) as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(buffer: usize, byte_offset: usize, byte_length: usize) -> BufferView {
        BufferView {
            buffer,
            byte_offset,
            byte_length,
            byte_stride: None,
            target: None,
        }
    }

    fn vec3_accessor(buffer_view: usize, count: usize) -> Accessor {
        Accessor {
            buffer_view: Some(buffer_view),
            byte_offset: 0,
            component_type: ComponentType::F32,
            element_type: ElementType::Vec3,
            count,
            normalized: false,
            min: None,
            max: None,
            sparse: None,
        }
    }

    #[test]
    fn accessor_past_view_end_is_rejected() {
        let buffers = vec![vec![0u8; 64]];
        let views = vec![view(0, 0, 24)];
        let accessors = vec![vec3_accessor(0, 3)];

        let err = AccessorTable::new(&buffers, &views, &accessors).unwrap_err();
        assert_eq!(
            err,
            DecodeError::AccessorOutOfBounds {
                accessor: 0,
                required: 36,
                available: 24
            }
        );
    }

    #[test]
    fn strided_bound_excludes_trailing_padding() {
        let mut v = view(0, 0, 28);
        v.byte_stride = Some(16);
        let accessor = vec3_accessor(0, 2);
        assert_eq!(accessor.required_length(&v), Some(28));
    }

    #[test]
    fn overflowing_view_end_is_rejected() {
        let buffers = vec![vec![0u8; 8]];
        let views = vec![view(0, usize::MAX, 2)];

        let err = AccessorTable::new(&buffers, &views, &[]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::BufferViewOutOfBounds {
                view: 0,
                buffer: 0,
                required: usize::MAX,
                available: 8
            }
        );
    }

    #[test]
    fn overflowing_count_is_rejected() {
        let buffers = vec![vec![0u8; 16]];
        let views = vec![view(0, 0, 16)];
        let accessors = vec![vec3_accessor(0, usize::MAX / 12 + 1)];

        assert!(matches!(
            AccessorTable::new(&buffers, &views, &accessors),
            Err(DecodeError::AccessorOutOfBounds {
                accessor: 0,
                required: usize::MAX,
                ..
            })
        ));
    }

    #[test]
    fn sparse_values_replace_dense_elements() {
        let mut bytes = Vec::new();
        for v in [1.0f32, 2.0, 3.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        // One u16 index (2), then padding and its replacement value
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&[0, 0]);
        bytes.extend_from_slice(&9.0f32.to_le_bytes());

        let buffers = vec![bytes];
        let views = vec![view(0, 0, 12), view(0, 12, 2), view(0, 16, 4)];
        let accessors = vec![Accessor {
            element_type: ElementType::Scalar,
            sparse: Some(SparseStorage {
                count: 1,
                indices_view: 1,
                indices_offset: 0,
                index_type: ComponentType::U16,
                values_view: 2,
                values_offset: 0,
            }),
            ..vec3_accessor(0, 3)
        }];

        let table = AccessorTable::new(&buffers, &views, &accessors).unwrap();
        assert_eq!(table.read_f32(0).unwrap(), vec![1.0, 2.0, 9.0]);
    }

    #[test]
    fn normalized_bytes_map_to_unit_range() {
        assert_eq!(read_component(&[255], ComponentType::U8, true), 1.0);
        assert_eq!(read_component(&[0x80], ComponentType::I8, true), -1.0);
        assert_eq!(read_component(&[7], ComponentType::U8, false), 7.0);
    }

    #[test]
    fn accessor_without_view_reads_zeros() {
        let accessors = vec![Accessor {
            buffer_view: None,
            ..vec3_accessor(0, 2)
        }];
        let table = AccessorTable::new(&[], &[], &accessors).unwrap();
        assert_eq!(table.read_f32(0).unwrap(), vec![0.0; 6]);
    }
}
