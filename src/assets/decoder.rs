//! Asset Decoder
//!
//! Builds a [`SceneAsset`] from an [`AssetSource`] in two phases:
//!
//! 1. **Decode.** Every reference in the document is resolved and checked,
//!    images are decoded and keyframes are unpacked into [`Frame`]s. No GPU
//!    call happens in this phase, so a malformed document leaves nothing
//!    behind.
//! 2. **Upload.** Buffer views used by primitives, vertex arrays and textures
//!    are created. If the backend fails midway, everything created so far is
//!    deleted before the error is returned.
//!
//! A failed load never yields a partially built asset.

use std::path::Path;

use glam::{Mat4, Quat, Vec3, Vec4};
use log::{debug, trace, warn};
use rustc_hash::FxHashMap;

use crate::animation::{Animation, AnimationChannel, Frame, Interpolation, TargetPath, Weights};
use crate::assets::SceneAsset;
use crate::assets::accessor::{
    Accessor, AccessorTable, BufferView, ComponentType, ElementType, SparseStorage,
};
use crate::assets::document::{self, Document};
use crate::assets::source::AssetSource;
use crate::errors::{AccessorUsage, BackendError, DecodeError, LoadError};
use crate::render::backend::GpuBackend;
use crate::resources::buffer::{BufferCache, BufferTarget};
use crate::resources::mesh::{
    AttributeLayout, AttributeSlot, IndexBinding, IndexType, Mesh, PrimitiveMode, SubMesh,
    VertexArray,
};
use crate::resources::texture::{FilterMode, MinFilter, Sampler, Texture2D, TextureImage, WrapMode};
use crate::resources::Material;
use crate::scene::{LocalPose, Node, Scene, SceneGraph};

/// Options that affect how resources are uploaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub generate_mipmaps: bool,
}

/// Loads the `.gltf` or `.glb` file at `path`.
pub fn load<G: GpuBackend + ?Sized>(
    path: impl AsRef<Path>,
    gpu: &mut G,
) -> Result<SceneAsset, LoadError> {
    load_with_options(path, gpu, LoadOptions::default())
}

pub fn load_with_options<G: GpuBackend + ?Sized>(
    path: impl AsRef<Path>,
    gpu: &mut G,
    options: LoadOptions,
) -> Result<SceneAsset, LoadError> {
    let source = AssetSource::from_path(path)?;
    decode(&source, gpu, options)
}

/// Loads a document held in memory; relative URIs resolve against `base_dir`.
pub fn load_from_slice<G: GpuBackend + ?Sized>(
    bytes: &[u8],
    base_dir: Option<&Path>,
    gpu: &mut G,
) -> Result<SceneAsset, LoadError> {
    let source = AssetSource::from_slice(bytes, base_dir)?;
    decode(&source, gpu, LoadOptions::default())
}

/// Decodes `source` and uploads its resources through `gpu`.
pub fn decode<G: GpuBackend + ?Sized>(
    source: &AssetSource,
    gpu: &mut G,
    options: LoadOptions,
) -> Result<SceneAsset, LoadError> {
    let decoded = DecodedAsset::new(source)?;
    debug!(
        "Decoded {}: {} meshes, {} nodes, {} scenes, {} animations",
        source.path().map_or_else(|| "<memory>".to_string(), |p| p.display().to_string()),
        decoded.meshes.len(),
        decoded.graph.nodes().len(),
        decoded.graph.scenes().len(),
        decoded.animations.len(),
    );
    decoded.upload(source, gpu, options)
}

// ============================================================================
// Phase 1: CPU decode
// ============================================================================

struct PrimitivePlan {
    mode: PrimitiveMode,
    material: Option<usize>,
    attributes: Vec<(usize, AttributeLayout)>,
    indices: Option<(usize, IndexBinding)>,
    vertex_count: u32,
}

struct MeshPlan {
    name: String,
    primitives: Vec<PrimitivePlan>,
}

struct TexturePlan {
    image_index: usize,
    image: TextureImage,
    sampler: Sampler,
}

/// A fully validated asset that has not touched the GPU yet.
struct DecodedAsset {
    buffers: Vec<Vec<u8>>,
    views: Vec<BufferView>,
    accessors: Vec<Accessor>,
    textures: Vec<TexturePlan>,
    materials: Vec<Material>,
    meshes: Vec<MeshPlan>,
    graph: SceneGraph,
    animations: Vec<Animation>,
}

impl DecodedAsset {
    fn new(source: &AssetSource) -> Result<Self, LoadError> {
        let doc = &source.document;
        let buffers = source.load_buffers()?;
        let views = convert_views(doc);
        let accessors = convert_accessors(doc)?;
        let table = AccessorTable::new(&buffers, &views, &accessors)?;

        let (textures, texture_map) = plan_textures(source, &buffers)?;
        let materials = convert_materials(doc, &texture_map)?;
        let meshes = doc
            .meshes
            .iter()
            .enumerate()
            .map(|(index, mesh)| plan_mesh(index, mesh, &table, doc.materials.len()))
            .collect::<Result<Vec<_>, _>>()?;
        let graph = build_graph(doc)?;
        let animations = doc
            .animations
            .iter()
            .enumerate()
            .map(|(index, anim)| decode_animation(index, anim, &table, doc.nodes.len()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            buffers,
            views,
            accessors,
            textures,
            materials,
            meshes,
            graph,
            animations,
        })
    }

    fn upload<G: GpuBackend + ?Sized>(
        self,
        source: &AssetSource,
        gpu: &mut G,
        options: LoadOptions,
    ) -> Result<SceneAsset, LoadError> {
        let mut asset = SceneAsset {
            source_path: source.path().map(Path::to_path_buf),
            materials: self.materials,
            graph: self.graph,
            animations: self.animations,
            ..SceneAsset::default()
        };

        let uploaded = upload_resources(
            &mut asset,
            gpu,
            &self.buffers,
            &self.views,
            self.textures,
            self.meshes,
            options,
        );
        if let Err(err) = uploaded {
            warn!("GPU upload failed, releasing partially created resources: {err}");
            asset.release(gpu);
            return Err(err.into());
        }

        asset.buffer_views = self.views;
        asset.accessors = self.accessors;
        Ok(asset)
    }
}

fn convert_views(doc: &Document) -> Vec<BufferView> {
    doc.buffer_views
        .iter()
        .map(|view| BufferView {
            buffer: view.buffer,
            byte_offset: view.byte_offset,
            byte_length: view.byte_length,
            byte_stride: view.byte_stride,
            target: view.target.and_then(BufferTarget::from_code),
        })
        .collect()
}

fn convert_accessors(doc: &Document) -> Result<Vec<Accessor>, DecodeError> {
    doc.accessors
        .iter()
        .enumerate()
        .map(|(index, accessor)| {
            let component_type = ComponentType::from_code(accessor.component_type).ok_or(
                DecodeError::UnknownComponentType {
                    accessor: index,
                    code: accessor.component_type,
                },
            )?;
            let element_type = ElementType::from_name(&accessor.element_type).ok_or_else(|| {
                DecodeError::UnknownElementType {
                    accessor: index,
                    name: accessor.element_type.clone(),
                }
            })?;
            let sparse = match &accessor.sparse {
                Some(sparse) => {
                    let code = sparse.indices.component_type;
                    Some(SparseStorage {
                        count: sparse.count,
                        indices_view: sparse.indices.buffer_view,
                        indices_offset: sparse.indices.byte_offset,
                        index_type: ComponentType::from_code(code).ok_or(
                            DecodeError::UnknownComponentType {
                                accessor: index,
                                code,
                            },
                        )?,
                        values_view: sparse.values.buffer_view,
                        values_offset: sparse.values.byte_offset,
                    })
                }
                None => None,
            };
            Ok(Accessor {
                buffer_view: accessor.buffer_view,
                byte_offset: accessor.byte_offset,
                component_type,
                element_type,
                count: accessor.count,
                normalized: accessor.normalized,
                min: accessor.min.clone(),
                max: accessor.max.clone(),
                sparse,
            })
        })
        .collect()
}

fn convert_sampler(sampler: &document::Sampler) -> Sampler {
    let defaults = Sampler::default();
    Sampler {
        mag_filter: match sampler.mag_filter {
            Some(9728) => FilterMode::Nearest,
            Some(9729) => FilterMode::Linear,
            _ => defaults.mag_filter,
        },
        min_filter: sampler
            .min_filter
            .and_then(MinFilter::from_code)
            .unwrap_or(defaults.min_filter),
        wrap_s: sampler.wrap_s.and_then(WrapMode::from_code).unwrap_or(defaults.wrap_s),
        wrap_t: sampler.wrap_t.and_then(WrapMode::from_code).unwrap_or(defaults.wrap_t),
    }
}

/// Decodes each image referenced by a texture once.
///
/// Returns the planned [`Texture2D`]s and, for every document texture, the
/// index of the planned texture that backs it.
fn plan_textures(
    source: &AssetSource,
    buffers: &[Vec<u8>],
) -> Result<(Vec<TexturePlan>, Vec<usize>), LoadError> {
    let doc = &source.document;
    let mut plans: Vec<TexturePlan> = Vec::new();
    let mut by_image: FxHashMap<usize, usize> = FxHashMap::default();
    let mut texture_map = Vec::with_capacity(doc.textures.len());

    for (index, texture) in doc.textures.iter().enumerate() {
        let image_index = texture
            .source
            .ok_or(DecodeError::MissingTextureSource { texture: index })?;
        if image_index >= doc.images.len() {
            return Err(DecodeError::IndexOutOfRange {
                kind: "image",
                index: image_index,
                len: doc.images.len(),
            }
            .into());
        }
        let sampler = match texture.sampler {
            Some(s) => convert_sampler(doc.samplers.get(s).ok_or(
                DecodeError::IndexOutOfRange {
                    kind: "sampler",
                    index: s,
                    len: doc.samplers.len(),
                },
            )?),
            None => Sampler::default(),
        };

        if let Some(&planned) = by_image.get(&image_index) {
            texture_map.push(planned);
            continue;
        }

        let bytes = source.image_bytes(image_index, buffers)?;
        let image = TextureImage::decode(&bytes).map_err(|err| LoadError::Image {
            image: image_index,
            message: err.to_string(),
        })?;
        trace!("Decoded image {image_index}: {}x{}", image.width, image.height);

        by_image.insert(image_index, plans.len());
        texture_map.push(plans.len());
        plans.push(TexturePlan {
            image_index,
            image,
            sampler,
        });
    }

    Ok((plans, texture_map))
}

fn convert_materials(doc: &Document, texture_map: &[usize]) -> Result<Vec<Material>, DecodeError> {
    doc.materials
        .iter()
        .enumerate()
        .map(|(index, material)| {
            let pbr = material.pbr_metallic_roughness.clone().unwrap_or_default();
            let base_texture = match pbr.base_color_texture {
                Some(info) => Some(*texture_map.get(info.index).ok_or(
                    DecodeError::IndexOutOfRange {
                        kind: "texture",
                        index: info.index,
                        len: texture_map.len(),
                    },
                )?),
                None => None,
            };
            Ok(Material {
                name: material
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("material_{index}")),
                base_color: pbr.base_color_factor.map_or(Vec4::ONE, Vec4::from_array),
                base_texture,
            })
        })
        .collect()
}

fn plan_mesh(
    mesh_index: usize,
    mesh: &document::Mesh,
    table: &AccessorTable<'_>,
    material_count: usize,
) -> Result<MeshPlan, DecodeError> {
    let mut primitives = Vec::with_capacity(mesh.primitives.len());

    for (primitive_index, primitive) in mesh.primitives.iter().enumerate() {
        let code = primitive.mode.unwrap_or(4);
        let mode = PrimitiveMode::from_code(code).ok_or(DecodeError::UnknownPrimitiveMode {
            mesh: mesh_index,
            primitive: primitive_index,
            mode: code,
        })?;

        if let Some(material) = primitive.material
            && material >= material_count
        {
            return Err(DecodeError::IndexOutOfRange {
                kind: "material",
                index: material,
                len: material_count,
            });
        }

        let mut attributes = Vec::new();
        let mut vertex_count: Option<usize> = None;
        for (semantic, &accessor_index) in &primitive.attributes {
            let Some(slot) = AttributeSlot::from_semantic(semantic) else {
                trace!("Mesh {mesh_index}: skipping unsupported attribute {semantic}");
                continue;
            };
            let accessor = table.accessor(accessor_index)?;
            if accessor.sparse.is_some() {
                return Err(DecodeError::UnsupportedSparseAccessor {
                    accessor: accessor_index,
                    usage: AccessorUsage::VertexAttribute,
                });
            }
            let view = accessor
                .buffer_view
                .ok_or(DecodeError::MissingBufferView {
                    accessor: accessor_index,
                })?;

            if !matches!(
                accessor.element_type,
                ElementType::Scalar | ElementType::Vec2 | ElementType::Vec3 | ElementType::Vec4
            ) {
                return Err(DecodeError::UnsupportedElementType {
                    accessor: accessor_index,
                    element_type: accessor.element_type,
                    usage: AccessorUsage::VertexAttribute,
                });
            }
            if accessor.component_type == ComponentType::F64 {
                return Err(DecodeError::UnsupportedComponentType {
                    accessor: accessor_index,
                    component_type: accessor.component_type,
                    usage: AccessorUsage::VertexAttribute,
                });
            }

            match vertex_count {
                None => vertex_count = Some(accessor.count),
                Some(expected) if expected != accessor.count => {
                    return Err(DecodeError::AttributeCountMismatch {
                        mesh: mesh_index,
                        primitive: primitive_index,
                        expected,
                        found: accessor.count,
                    });
                }
                Some(_) => {}
            }

            let stride = table.view(view)?.byte_stride.unwrap_or(0);
            attributes.push((
                view,
                AttributeLayout {
                    slot,
                    components: accessor.element_type.components() as u8,
                    component_type: accessor.component_type,
                    normalized: accessor.normalized,
                    stride: to_u32(accessor_index, "byte stride", stride)?,
                    offset: to_u32(accessor_index, "byte offset", accessor.byte_offset)?,
                },
            ));
            to_u32(accessor_index, "count", accessor.count)?;
        }

        let indices = match primitive.indices {
            Some(accessor_index) => Some(plan_indices(table, accessor_index)?),
            None => None,
        };

        primitives.push(PrimitivePlan {
            mode,
            material: primitive.material,
            attributes,
            indices,
            // Every attribute count was range-checked above
            vertex_count: vertex_count.map_or(0, |count| count as u32),
        });
    }

    Ok(MeshPlan {
        name: mesh
            .name
            .clone()
            .unwrap_or_else(|| format!("mesh_{mesh_index}")),
        primitives,
    })
}

fn plan_indices(
    table: &AccessorTable<'_>,
    accessor_index: usize,
) -> Result<(usize, IndexBinding), DecodeError> {
    let accessor = table.accessor(accessor_index)?;
    if accessor.sparse.is_some() {
        return Err(DecodeError::UnsupportedSparseAccessor {
            accessor: accessor_index,
            usage: AccessorUsage::Indices,
        });
    }
    let view = accessor.buffer_view.ok_or(DecodeError::MissingBufferView {
        accessor: accessor_index,
    })?;
    if accessor.element_type != ElementType::Scalar {
        return Err(DecodeError::UnsupportedElementType {
            accessor: accessor_index,
            element_type: accessor.element_type,
            usage: AccessorUsage::Indices,
        });
    }
    let index_type = IndexType::from_component_type(accessor.component_type).ok_or(
        DecodeError::UnsupportedComponentType {
            accessor: accessor_index,
            component_type: accessor.component_type,
            usage: AccessorUsage::Indices,
        },
    )?;

    Ok((
        view,
        IndexBinding {
            index_type,
            count: to_u32(accessor_index, "count", accessor.count)?,
            byte_offset: to_u32(accessor_index, "byte offset", accessor.byte_offset)?,
        },
    ))
}

/// Narrows a document value to the 32-bit range the backend draws with.
fn to_u32(accessor: usize, field: &'static str, value: usize) -> Result<u32, DecodeError> {
    u32::try_from(value).map_err(|_| DecodeError::ValueTooLarge {
        accessor,
        field,
        value,
    })
}

/// Source rotations are stored `(x, y, z, w)`. This is the only place that
/// converts them.
fn quat_from_xyzw(xyzw: [f32; 4]) -> Quat {
    Quat::from_vec4(Vec4::from_array(xyzw).try_normalize().unwrap_or(Vec4::W))
}

fn node_pose(index: usize, node: &document::Node) -> Result<LocalPose, DecodeError> {
    if let Some(matrix) = &node.matrix {
        let cols: &[f32; 16] = matrix
            .as_slice()
            .try_into()
            .map_err(|_| DecodeError::InvalidNodeMatrix {
                node: index,
                len: matrix.len(),
            })?;
        return Ok(LocalPose::from_matrix(Mat4::from_cols_array(cols)));
    }

    Ok(LocalPose::from_trs(
        node.translation.map_or(Vec3::ZERO, Vec3::from_array),
        node.rotation.map_or(Quat::IDENTITY, quat_from_xyzw),
        node.scale.map_or(Vec3::ONE, Vec3::from_array),
    ))
}

fn build_graph(doc: &Document) -> Result<SceneGraph, DecodeError> {
    let node_count = doc.nodes.len();
    let check_node = |index: usize| {
        if index < node_count {
            Ok(index)
        } else {
            Err(DecodeError::IndexOutOfRange {
                kind: "node",
                index,
                len: node_count,
            })
        }
    };

    let mut graph = SceneGraph::new();
    for (index, source) in doc.nodes.iter().enumerate() {
        let mut node = Node::new(
            source
                .name
                .clone()
                .unwrap_or_else(|| format!("node_{index}")),
        )
        .with_pose(node_pose(index, source)?);

        if let Some(mesh) = source.mesh {
            if mesh >= doc.meshes.len() {
                return Err(DecodeError::IndexOutOfRange {
                    kind: "mesh",
                    index: mesh,
                    len: doc.meshes.len(),
                });
            }
            node = node.with_mesh(mesh);
        }
        for &child in &source.children {
            node.push_child(check_node(child)?);
        }
        if let Some(weights) = &source.weights {
            node.weights = weights.iter().copied().collect();
        }
        graph.add_node(node);
    }

    for (index, scene) in doc.scenes.iter().enumerate() {
        let roots = scene
            .nodes
            .iter()
            .map(|&root| check_node(root))
            .collect::<Result<Vec<_>, _>>()?;
        let name = scene
            .name
            .clone()
            .unwrap_or_else(|| format!("scene_{index}"));
        graph.add_scene(Scene::new(name, roots));
    }

    if let Some(scene) = doc.scene
        && scene >= doc.scenes.len()
    {
        return Err(DecodeError::IndexOutOfRange {
            kind: "scene",
            index: scene,
            len: doc.scenes.len(),
        });
    }
    graph.set_default_scene(doc.scene);

    Ok(graph)
}

// ============================================================================
// Animation decoding
// ============================================================================

fn decode_animation(
    animation_index: usize,
    animation: &document::Animation,
    table: &AccessorTable<'_>,
    node_count: usize,
) -> Result<Animation, DecodeError> {
    let mut channels = Vec::with_capacity(animation.channels.len());

    for (channel_index, channel) in animation.channels.iter().enumerate() {
        let sampler = animation
            .samplers
            .get(channel.sampler)
            .ok_or(DecodeError::IndexOutOfRange {
                kind: "animation sampler",
                index: channel.sampler,
                len: animation.samplers.len(),
            })?;

        let Some(path) = TargetPath::from_name(&channel.target.path) else {
            warn!(
                "Animation {animation_index} channel {channel_index}: unsupported target path {:?}, skipping",
                channel.target.path
            );
            continue;
        };
        let Some(node) = channel.target.node else {
            warn!("Animation {animation_index} channel {channel_index} has no target node, skipping");
            continue;
        };
        if node >= node_count {
            return Err(DecodeError::IndexOutOfRange {
                kind: "node",
                index: node,
                len: node_count,
            });
        }

        let (interpolation, cubic) = match sampler.interpolation.as_deref() {
            None | Some("LINEAR") => (Interpolation::Linear, false),
            Some("STEP") => (Interpolation::Step, false),
            Some("CUBICSPLINE") => {
                warn!(
                    "Animation {animation_index} sampler {}: cubic spline evaluated linearly",
                    channel.sampler
                );
                (Interpolation::Linear, true)
            }
            Some(other) => {
                return Err(DecodeError::UnknownInterpolation {
                    animation: animation_index,
                    sampler: channel.sampler,
                    name: other.to_string(),
                });
            }
        };

        let times = table.read_scalars(sampler.input, AccessorUsage::KeyframeTimes)?;
        if times.is_empty() {
            return Err(DecodeError::EmptyChannel {
                animation: animation_index,
                channel: channel_index,
            });
        }
        let mut previous = f32::NEG_INFINITY;
        for (frame, &time) in times.iter().enumerate() {
            if !time.is_finite() || time < previous {
                return Err(DecodeError::InvalidKeyframeTime {
                    animation: animation_index,
                    channel: channel_index,
                    frame,
                });
            }
            previous = time;
        }

        let keyframes = KeyframeLayout {
            animation: animation_index,
            channel: channel_index,
            inputs: times.len(),
            cubic,
        };
        let usage = AccessorUsage::KeyframeValues(path);
        let frames: Vec<Frame> = match path {
            TargetPath::Translation => keyframes
                .select(table.read_vectors::<3>(sampler.output, usage)?)?
                .zip(&times)
                .map(|(v, &t)| Frame::translation(t, Vec3::from_array(v)))
                .collect(),
            TargetPath::Scale => keyframes
                .select(table.read_vectors::<3>(sampler.output, usage)?)?
                .zip(&times)
                .map(|(v, &t)| Frame::scale(t, Vec3::from_array(v)))
                .collect(),
            TargetPath::Rotation => keyframes
                .select(table.read_vectors::<4>(sampler.output, usage)?)?
                .zip(&times)
                .map(|(v, &t)| Frame::rotation(t, quat_from_xyzw(v)))
                .collect(),
            TargetPath::Weights => {
                let values = table.read_scalars(sampler.output, usage)?;
                let groups = keyframes.group_weights(&values)?;
                groups
                    .zip(&times)
                    .map(|(w, &t)| Frame::weights(t, Weights::from_slice(w)))
                    .collect()
            }
        };

        channels.push(AnimationChannel::new(node, path, interpolation, frames));
    }

    let name = animation
        .name
        .clone()
        .unwrap_or_else(|| format!("animation_{animation_index}"));
    let animation = Animation::new(name, channels);
    debug!(
        "Animation {animation_index} {:?}: {} channels, {:.3}s",
        animation.name,
        animation.channels.len(),
        animation.duration()
    );
    Ok(animation)
}

/// How sampler outputs line up with keyframe times.
struct KeyframeLayout {
    animation: usize,
    channel: usize,
    inputs: usize,
    /// Cubic spline outputs store `(in_tangent, value, out_tangent)` per keyframe
    cubic: bool,
}

impl KeyframeLayout {
    fn mismatch(&self, outputs: usize) -> DecodeError {
        DecodeError::KeyframeCountMismatch {
            animation: self.animation,
            channel: self.channel,
            inputs: self.inputs,
            outputs,
        }
    }

    fn per_keyframe(&self) -> usize {
        if self.cubic { 3 } else { 1 }
    }

    /// One output value per keyframe, dropping cubic spline tangents.
    fn select<T>(&self, values: Vec<T>) -> Result<impl Iterator<Item = T>, DecodeError> {
        let per_keyframe = self.per_keyframe();
        if values.len() != self.inputs * per_keyframe {
            return Err(self.mismatch(values.len()));
        }
        let skip = usize::from(self.cubic);
        Ok(values.into_iter().skip(skip).step_by(per_keyframe))
    }

    /// Splits morph weights into one group per keyframe.
    fn group_weights<'v>(
        &self,
        values: &'v [f32],
    ) -> Result<impl Iterator<Item = &'v [f32]>, DecodeError> {
        let per_keyframe = self.per_keyframe();
        let slots = self.inputs * per_keyframe;
        if values.is_empty() || values.len() % slots != 0 {
            return Err(self.mismatch(values.len()));
        }
        let targets = values.len() / slots;
        let skip = usize::from(self.cubic);
        Ok(values
            .chunks_exact(targets)
            .skip(skip)
            .step_by(per_keyframe))
    }
}

// ============================================================================
// Phase 2: GPU upload
// ============================================================================

fn upload_resources<G: GpuBackend + ?Sized>(
    asset: &mut SceneAsset,
    gpu: &mut G,
    buffers: &[Vec<u8>],
    views: &[BufferView],
    textures: Vec<TexturePlan>,
    meshes: Vec<MeshPlan>,
    options: LoadOptions,
) -> Result<(), BackendError> {
    for plan in textures {
        let texture = Texture2D::upload(
            gpu,
            Some(plan.image_index),
            plan.image,
            plan.sampler,
            options.generate_mipmaps,
        )?;
        asset.textures.push(texture);
    }

    for plan in meshes {
        let mut submeshes = Vec::with_capacity(plan.primitives.len());
        for primitive in plan.primitives {
            let uploaded = upload_primitive(&mut asset.buffers, gpu, buffers, views, &primitive);
            match uploaded {
                Ok(vertex_array) => submeshes.push(SubMesh {
                    vertex_array,
                    material: primitive.material,
                }),
                Err(err) => {
                    // Hand the finished submeshes to the asset so they are released with it
                    asset.meshes.push(Mesh {
                        name: plan.name,
                        submeshes,
                    });
                    return Err(err);
                }
            }
        }
        asset.meshes.push(Mesh {
            name: plan.name,
            submeshes,
        });
    }

    debug!(
        "Uploaded {} buffers, {} textures",
        asset.buffers.len(),
        asset.textures.len()
    );
    Ok(())
}

/// Creates and configures the vertex array of one primitive. The vertex
/// array is deleted again if any step fails.
fn upload_primitive<G: GpuBackend + ?Sized>(
    cache: &mut BufferCache,
    gpu: &mut G,
    buffers: &[Vec<u8>],
    views: &[BufferView],
    primitive: &PrimitivePlan,
) -> Result<VertexArray, BackendError> {
    let id = gpu.create_vertex_array()?;

    let mut configure = || -> Result<(), BackendError> {
        for (view, layout) in &primitive.attributes {
            let data = view_slice(buffers, views, *view);
            let buffer = cache.get_or_upload(gpu, *view, BufferTarget::Array, data)?;
            gpu.configure_attribute(id, buffer.id, layout)?;
        }
        if let Some((view, _)) = &primitive.indices {
            let data = view_slice(buffers, views, *view);
            let buffer = cache.get_or_upload(gpu, *view, BufferTarget::ElementArray, data)?;
            gpu.bind_index_buffer(id, buffer.id)?;
        }
        Ok(())
    };
    if let Err(err) = configure() {
        gpu.delete_vertex_array(id);
        return Err(err);
    }

    Ok(VertexArray {
        id,
        mode: primitive.mode,
        indices: primitive.indices.map(|(_, binding)| binding),
        vertex_count: primitive.vertex_count,
    })
}

/// Bytes of a buffer view. `AccessorTable::new` has checked that the end
/// offset neither overflows nor passes the end of the buffer.
fn view_slice<'b>(buffers: &'b [Vec<u8>], views: &[BufferView], view: usize) -> &'b [u8] {
    let view = &views[view];
    &buffers[view.buffer][view.byte_offset..view.byte_offset + view.byte_length]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_rejects_values_past_u32() {
        assert_eq!(to_u32(0, "count", 7), Ok(7));
        assert_eq!(to_u32(0, "count", u32::MAX as usize), Ok(u32::MAX));
        assert_eq!(
            to_u32(4, "byte offset", u32::MAX as usize + 1),
            Err(DecodeError::ValueTooLarge {
                accessor: 4,
                field: "byte offset",
                value: u32::MAX as usize + 1,
            })
        );
    }
}
