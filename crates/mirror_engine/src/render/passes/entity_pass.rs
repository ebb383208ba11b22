//! Per-entity draw dispatch shared by the reflection and main passes

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::context::RenderMode;
use crate::render::device::{GraphicsDevice, Primitive, TextureId, TextureKind, UniformValue};
use crate::render::shader::{BindingPlan, StreamSource, UniformSemantic, ENVIRONMENT_TEXTURE_UNIT};
use crate::render::ShaderRegistry;
use crate::scene::{Entity, EntityTraits, Scene};

/// Which pass is drawing the entity list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityPass {
    /// Cubemap capture: non-reflective entities are skipped
    Reflection,
    /// Offscreen main pass: environment-mapped entities get the cubemap
    Main,
}

/// Attribute slots cleared after every entity
const STREAM_SLOTS: [u32; 3] = [0, 1, 2];

/// Point size used in point mode
const POINT_SIZE: f32 = 2.0;

/// Camera and light values shared by every entity of one pass
struct PassUniforms {
    view: Mat4,
    background_view: Mat4,
    projection: Mat4,
    eye: Vec3,
    light: Vec3,
}

impl PassUniforms {
    fn capture(scene: &Scene) -> Self {
        let camera = scene.cameras.active();
        let view = camera.view_matrix();
        Self {
            background_view: view.rotation_only(),
            view,
            projection: camera.projection_matrix(),
            eye: camera.position,
            light: scene.light_position(),
        }
    }
}

/// Draw every eligible entity once, in scene order, with the active camera
pub(crate) fn draw_entities(
    device: &mut dyn GraphicsDevice,
    scene: &Scene,
    shaders: &ShaderRegistry,
    mode: RenderMode,
    pass: EntityPass,
    environment: TextureId,
) {
    let uniforms = PassUniforms::capture(scene);

    for entity in scene.entities() {
        if pass == EntityPass::Reflection && !entity.is_reflective() {
            continue;
        }
        let Some(shader) = shaders.get(entity.shader()) else {
            log::trace!("Skipping '{}': shader slot {} not loaded", entity.name(), entity.shader());
            continue;
        };
        let background = entity.traits().contains(EntityTraits::BACKGROUND_LAYER);

        if background {
            device.set_depth_mask(false);
        }
        device.use_program(shader.program());
        upload_uniforms(device, shader.plan(), entity, &uniforms, background);
        bind_streams(device, shader.plan(), entity);

        if let Some(texture) = entity.texture() {
            device.bind_texture(0, texture.kind, Some(texture.id));
        }
        if pass == EntityPass::Main && entity.traits().contains(EntityTraits::ENVIRONMENT_MAPPED) {
            device.bind_texture(ENVIRONMENT_TEXTURE_UNIT, TextureKind::Cubemap, Some(environment));
        }

        let count = entity.vertex_count();
        if background {
            device.draw_arrays(Primitive::Triangles, 0, count);
            device.set_depth_mask(true);
        } else {
            match mode {
                RenderMode::Wireframe => device.draw_arrays(Primitive::Lines, 0, count),
                RenderMode::Points => {
                    device.set_point_size(POINT_SIZE);
                    device.draw_arrays(Primitive::Points, 0, count);
                }
                RenderMode::Shaded => device.draw_arrays(entity.primitive(), 0, count),
            }
        }

        for slot in STREAM_SLOTS {
            device.disable_stream(slot);
        }
    }
}

fn upload_uniforms(
    device: &mut dyn GraphicsDevice,
    plan: &BindingPlan,
    entity: &Entity,
    uniforms: &PassUniforms,
    background: bool,
) {
    for &(semantic, location) in &plan.uniforms {
        let value = match semantic {
            UniformSemantic::ModelMatrix => UniformValue::mat4(entity.model_matrix()),
            UniformSemantic::ViewMatrix if background => UniformValue::mat4(&uniforms.background_view),
            UniformSemantic::ViewMatrix => UniformValue::mat4(&uniforms.view),
            UniformSemantic::ProjectionMatrix => UniformValue::mat4(&uniforms.projection),
            UniformSemantic::LightPosition => UniformValue::vec3(&uniforms.light),
            UniformSemantic::EyePosition => UniformValue::vec3(&uniforms.eye),
        };
        device.set_uniform(location, value);
    }
}

fn bind_streams(device: &mut dyn GraphicsDevice, plan: &BindingPlan, entity: &Entity) {
    let buffers = entity.buffers();
    for stream in &plan.streams {
        let buffer = match stream.source {
            StreamSource::Vertex => buffers.vertex,
            StreamSource::Secondary => buffers.secondary,
            StreamSource::Normal => buffers.normal,
        };
        if let Some(buffer) = buffer {
            device.enable_stream(stream.slot, buffer, stream.components);
        }
    }
}
