//! Shared fixtures: small glTF documents with embedded base64 buffers.

#![allow(dead_code)]

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

pub const EPSILON: f32 = 1e-5;

/// Routes `log` output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

pub fn data_uri(bytes: &[u8]) -> String {
    format!("data:application/octet-stream;base64,{}", STANDARD.encode(bytes))
}

pub fn to_bytes(doc: &Value) -> Vec<u8> {
    serde_json::to_vec(doc).expect("fixture serializes")
}

/// Byte layout of [`scenario_buffer`].
pub mod layout {
    /// 3 x VEC3<f32> positions
    pub const POSITIONS: (usize, usize) = (0, 36);
    /// 3 x u16 indices
    pub const INDICES: (usize, usize) = (36, 6);
    /// 2 x f32 keyframe times, after 2 bytes of padding
    pub const TIMES: (usize, usize) = (44, 8);
    /// 2 x VEC3<f32> translations
    pub const TRANSLATIONS: (usize, usize) = (52, 24);
    pub const TOTAL: usize = 76;
}

/// One triangle, its indices and a translation track from `(0,0,0)` at
/// `t=0` to `(0,5,0)` at `t=2`.
pub fn scenario_buffer() -> Vec<u8> {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let indices: [u16; 4] = [0, 1, 2, 0];
    let times: [f32; 2] = [0.0, 2.0];
    let translations: [f32; 6] = [0.0, 0.0, 0.0, 0.0, 5.0, 0.0];

    let mut bytes = Vec::with_capacity(layout::TOTAL);
    bytes.extend_from_slice(bytemuck::cast_slice(&positions[..]));
    bytes.extend_from_slice(bytemuck::cast_slice(&indices[..]));
    bytes.extend_from_slice(bytemuck::cast_slice(&times[..]));
    bytes.extend_from_slice(bytemuck::cast_slice(&translations[..]));
    assert_eq!(bytes.len(), layout::TOTAL);
    bytes
}

/// Root node at `(2,0,0)` with an animated child that carries the mesh.
pub fn scenario_document() -> Value {
    let buffer = scenario_buffer();
    json!({
        "asset": { "version": "2.0", "generator": "fixture" },
        "buffers": [{ "uri": data_uri(&buffer), "byteLength": buffer.len() }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": layout::POSITIONS.0, "byteLength": layout::POSITIONS.1, "target": 34962 },
            { "buffer": 0, "byteOffset": layout::INDICES.0, "byteLength": layout::INDICES.1, "target": 34963 },
            { "buffer": 0, "byteOffset": layout::TIMES.0, "byteLength": layout::TIMES.1 },
            { "buffer": 0, "byteOffset": layout::TRANSLATIONS.0, "byteLength": layout::TRANSLATIONS.1 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" },
            { "bufferView": 2, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0.0], "max": [2.0] },
            { "bufferView": 3, "componentType": 5126, "count": 2, "type": "VEC3" }
        ],
        "materials": [
            { "name": "red", "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] } }
        ],
        "meshes": [
            { "name": "triangle", "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }] }
        ],
        "nodes": [
            { "name": "root", "translation": [2.0, 0.0, 0.0], "children": [1] },
            { "name": "child", "mesh": 0 }
        ],
        "scenes": [{ "name": "main", "nodes": [0] }],
        "scene": 0,
        "animations": [{
            "name": "rise",
            "channels": [{ "sampler": 0, "target": { "node": 1, "path": "translation" } }],
            "samplers": [{ "input": 2, "output": 3, "interpolation": "LINEAR" }]
        }]
    })
}

/// A 2x2 opaque PNG.
pub fn png_bytes(rgba: [u8; 4]) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(2, 2, image::Rgba(rgba));
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("png encodes");
    bytes
}

/// [`scenario_document`] with a textured second material used by a second
/// primitive, and a second texture sharing the same image.
pub fn textured_document() -> Value {
    let mut doc = scenario_document();
    let png = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes([0, 255, 0, 255])));

    doc["images"] = json!([{ "uri": png }]);
    doc["samplers"] = json!([{ "magFilter": 9728, "wrapS": 33071 }]);
    doc["textures"] = json!([{ "source": 0, "sampler": 0 }, { "source": 0 }]);
    doc["materials"]
        .as_array_mut()
        .expect("materials array")
        .push(json!({
            "name": "textured",
            "pbrMetallicRoughness": { "baseColorTexture": { "index": 1 } }
        }));
    doc["meshes"][0]["primitives"]
        .as_array_mut()
        .expect("primitives array")
        .push(json!({ "attributes": { "POSITION": 0, "COLOR_0": 0 }, "material": 1 }));
    doc
}
