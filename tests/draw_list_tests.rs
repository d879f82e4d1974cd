//! Draw List Tests
//!
//! Tests for:
//! - One command per submesh of every posed node with a mesh
//! - Default material and default texture fallback
//! - Submission order on the shader backend

mod common;

use std::num::NonZeroU32;

use glam::{Mat4, Vec3, Vec4};
use serde_json::json;

use marionette::assets::{self, SceneAsset};
use marionette::render::backend::ProgramId;
use marionette::render::{
    BackendCall, DrawCall, HeadlessBackend, UniformNames, produce, submit,
};
use marionette::resources::{DefaultMaterial, IndexType, PrimitiveMode};
use marionette::scene::compute_world_transforms;

use common::{EPSILON, scenario_document, textured_document, to_bytes};

fn load(doc: &serde_json::Value, gpu: &mut HeadlessBackend) -> SceneAsset {
    assets::load_from_slice(&to_bytes(doc), None, gpu).unwrap()
}

fn program() -> ProgramId {
    ProgramId(NonZeroU32::new(7).unwrap())
}

// ============================================================================
// Production
// ============================================================================

#[test]
fn emits_one_command_per_submesh() {
    let mut gpu = HeadlessBackend::new();
    let defaults = DefaultMaterial::create(&mut gpu).unwrap();
    let asset = load(&textured_document(), &mut gpu);

    let world = compute_world_transforms(asset.graph()).unwrap();
    let list = produce(&asset, &world, &defaults);
    assert_eq!(list.len(), 2);

    let first = &list.commands()[0];
    assert_eq!(first.node, 1);
    assert_eq!(first.mesh, 0);
    assert_eq!(first.submesh, 0);
    assert_eq!(first.material, Some(0));
    assert_eq!(first.base_color, Vec4::new(1.0, 0.0, 0.0, 1.0));
    assert_eq!(first.texture, defaults.texture_id());
    assert!(first.world.abs_diff_eq(Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)), EPSILON));
    assert_eq!(
        first.draw,
        DrawCall::Indexed {
            mode: PrimitiveMode::Triangles,
            index_type: IndexType::U16,
            count: 3,
            byte_offset: 0,
        }
    );

    let second = &list.commands()[1];
    assert_eq!(second.submesh, 1);
    assert_eq!(second.material, Some(1));
    assert_eq!(second.texture, asset.textures()[0].id);
    assert_eq!(
        second.draw,
        DrawCall::Arrays {
            mode: PrimitiveMode::Triangles,
            first: 0,
            count: 3,
        }
    );
}

#[test]
fn missing_material_uses_default() {
    let mut doc = scenario_document();
    doc["meshes"][0]["primitives"][0]
        .as_object_mut()
        .unwrap()
        .remove("material");

    let mut gpu = HeadlessBackend::new();
    let defaults = DefaultMaterial::create(&mut gpu).unwrap();
    let asset = load(&doc, &mut gpu);

    let world = compute_world_transforms(asset.graph()).unwrap();
    let list = produce(&asset, &world, &defaults);
    let command = &list.commands()[0];
    assert_eq!(command.material, None);
    assert_eq!(command.base_color, Vec4::ONE);
    assert_eq!(command.texture, defaults.texture_id());
}

#[test]
fn node_in_two_scenes_is_drawn_twice() {
    let mut doc = scenario_document();
    doc["scenes"] = json!([{ "nodes": [0] }, { "nodes": [1] }]);

    let mut gpu = HeadlessBackend::new();
    let defaults = DefaultMaterial::create(&mut gpu).unwrap();
    let asset = load(&doc, &mut gpu);

    let world = compute_world_transforms(asset.graph()).unwrap();
    let list = produce(&asset, &world, &defaults);
    assert_eq!(list.len(), 2);

    let origins: Vec<Vec3> = list.iter().map(|c| c.world.w_axis.truncate()).collect();
    assert!(origins[0].abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), EPSILON));
    assert!(origins[1].abs_diff_eq(Vec3::ZERO, EPSILON));
    assert_eq!(list.commands()[0].scene, 0);
    assert_eq!(list.commands()[1].scene, 1);
}

#[test]
fn production_is_restartable() {
    let mut gpu = HeadlessBackend::new();
    let defaults = DefaultMaterial::create(&mut gpu).unwrap();
    let asset = load(&textured_document(), &mut gpu);
    let world = compute_world_transforms(asset.graph()).unwrap();

    let a = produce(&asset, &world, &defaults);
    let b = produce(&asset, &world, &defaults);
    assert_eq!(a.commands(), b.commands());
    assert_eq!((&a).into_iter().count(), a.iter().count());
}

// ============================================================================
// Submission
// ============================================================================

#[test]
fn submit_replays_commands_in_order() {
    let mut gpu = HeadlessBackend::new();
    let defaults = DefaultMaterial::create(&mut gpu).unwrap();
    let asset = load(&textured_document(), &mut gpu);
    let world = compute_world_transforms(asset.graph()).unwrap();
    let list = produce(&asset, &world, &defaults);

    gpu.clear_calls();
    let uniforms = UniformNames::default();
    let issued = submit(&mut gpu, program(), &list, &uniforms).unwrap();
    assert_eq!(issued, 2);

    let calls = gpu.calls();
    assert_eq!(calls.len(), 1 + 2 * 5);
    assert_eq!(calls[0], BackendCall::BindProgram(program()));

    for (command, chunk) in list.iter().zip(calls[1..].chunks(5)) {
        assert_eq!(
            chunk[0],
            BackendCall::SetUniformMat4 {
                name: "u_model".to_string(),
                value: command.world,
            }
        );
        assert_eq!(
            chunk[1],
            BackendCall::SetUniformVec4 {
                name: "u_base_color".to_string(),
                value: command.base_color,
            }
        );
        assert_eq!(
            chunk[2],
            BackendCall::BindTextureSlot {
                slot: 0,
                texture: command.texture,
            }
        );
        assert_eq!(
            chunk[3],
            BackendCall::SetUniformInt {
                name: "tex_slot".to_string(),
                value: 0,
            }
        );
        assert!(chunk[4].is_draw());
    }

    let draws: Vec<&BackendCall> = gpu.draws().collect();
    assert!(matches!(draws[0], BackendCall::DrawIndexed { count: 3, .. }));
    assert!(matches!(draws[1], BackendCall::DrawArrays { first: 0, count: 3, .. }));
}

#[test]
fn submit_uses_configured_uniform_names() {
    let mut gpu = HeadlessBackend::new();
    let defaults = DefaultMaterial::create(&mut gpu).unwrap();
    let asset = load(&scenario_document(), &mut gpu);
    let world = compute_world_transforms(asset.graph()).unwrap();
    let list = produce(&asset, &world, &defaults);

    let uniforms = UniformNames {
        model: "model".to_string(),
        base_color: "color".to_string(),
        texture_slot: "albedo".to_string(),
    };
    submit(&mut gpu, program(), &list, &uniforms).unwrap();

    assert!(gpu.calls().iter().any(|c| matches!(
        c,
        BackendCall::SetUniformMat4 { name, .. } if name == "model"
    )));
    assert!(gpu.calls().iter().any(|c| matches!(
        c,
        BackendCall::SetUniformInt { name, .. } if name == "albedo"
    )));
}

#[test]
fn submit_stops_at_first_backend_error() {
    let mut gpu = HeadlessBackend::new();
    let defaults = DefaultMaterial::create(&mut gpu).unwrap();
    let asset = load(&textured_document(), &mut gpu);
    let world = compute_world_transforms(asset.graph()).unwrap();
    let list = produce(&asset, &world, &defaults);

    gpu.fail_on("draw_indexed", 0);
    let err = submit(&mut gpu, program(), &list, &UniformNames::default()).unwrap_err();
    assert_eq!(err.operation, "draw_indexed");
    assert_eq!(gpu.draws().count(), 0);
}
