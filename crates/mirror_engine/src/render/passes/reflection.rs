//! Reflection cubemap capture

use crate::render::context::RenderMode;
use crate::render::device::{
    Attachment, AttachTarget, ClearFlags, CubeFace, GraphicsDevice, TextureId, TextureKind, Viewport,
};
use crate::render::passes::entity_pass::{draw_entities, EntityPass};
use crate::render::shader::ENVIRONMENT_TEXTURE_UNIT;
use crate::render::targets::ReflectionTarget;
use crate::render::ShaderRegistry;
use crate::scene::{CameraSet, EntityTraits, Orientation, Scene};

/// Reflection camera orientation (roll, yaw, pitch) for each face, in capture order
pub const CUBE_FACE_ORIENTATIONS: [(CubeFace, Orientation); 6] = [
    (CubeFace::PositiveX, Orientation::new(0.0, 0.0, 0.0)),
    (CubeFace::NegativeX, Orientation::new(0.0, 180.0, 0.0)),
    (CubeFace::PositiveY, Orientation::new(0.0, -90.0, 90.0)),
    (CubeFace::NegativeY, Orientation::new(0.0, -90.0, -90.0)),
    (CubeFace::PositiveZ, Orientation::new(0.0, 90.0, 0.0)),
    (CubeFace::NegativeZ, Orientation::new(0.0, 270.0, 0.0)),
];

/// Render the reflective entities into all six faces from the reflection camera
///
/// The environment unit holds the sky cubemap (or nothing) while the faces
/// are drawn, never the cubemap being written. Restores the primary camera
/// and the screen viewport before returning.
pub(crate) fn capture(
    device: &mut dyn GraphicsDevice,
    scene: &mut Scene,
    shaders: &ShaderRegistry,
    target: &ReflectionTarget,
    mode: RenderMode,
    clear_color: [f32; 4],
    screen: Viewport,
) {
    if scene.cameras.get(CameraSet::REFLECTION).is_none() {
        log::warn!("No reflection camera; skipping cubemap capture");
        return;
    }

    scene.cameras.set_active(CameraSet::REFLECTION);
    device.bind_texture(ENVIRONMENT_TEXTURE_UNIT, TextureKind::Cubemap, sky_cubemap(scene));
    device.bind_framebuffer(Some(target.framebuffer));
    device.set_viewport(Viewport::sized(target.resolution, target.resolution));

    for (face, orientation) in CUBE_FACE_ORIENTATIONS {
        log::trace!("Capturing reflection face {face:?}");
        device.attach_texture(Attachment::Color0, AttachTarget::Cube(face), target.cubemap);
        device.clear(ClearFlags::COLOR | ClearFlags::DEPTH, clear_color);
        if let Some(camera) = scene.cameras.get_mut(CameraSet::REFLECTION) {
            camera.set_orientation(orientation);
        }
        draw_entities(device, scene, shaders, mode, EntityPass::Reflection, target.cubemap);
    }

    device.set_viewport(screen);
    scene.cameras.set_active(CameraSet::PRIMARY);
}

fn sky_cubemap(scene: &Scene) -> Option<TextureId> {
    scene
        .entities()
        .iter()
        .filter(|entity| entity.traits().contains(EntityTraits::BACKGROUND_LAYER))
        .find_map(|entity| entity.texture().filter(|texture| texture.kind == TextureKind::Cubemap))
        .map(|texture| texture.id)
}
