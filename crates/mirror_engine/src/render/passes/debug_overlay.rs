//! Bounding volume overlay drawn through one scratch buffer

use crate::foundation::math::{Mat4, Point3};
use crate::render::context::DebugVolumes;
use crate::render::device::{BufferId, GraphicsDevice, Primitive, UniformValue};
use crate::render::shader::ShaderProgram;
use crate::render::RenderResult;
use crate::scene::{great_circles, BoundingVolumes, Camera, Entity};

/// Color of each debug volume
pub const VOLUME_COLORS: [(DebugVolumes, [f32; 3]); 8] = [
    (DebugVolumes::OBJECT_BOX, [1.0, 0.0, 0.0]),
    (DebugVolumes::EXTERNAL_AABB, [0.0, 1.0, 0.0]),
    (DebugVolumes::INTERNAL_AABB, [0.0, 0.0, 1.0]),
    (DebugVolumes::MIDPOINT_AABB, [0.0, 1.0, 1.0]),
    (DebugVolumes::TIGHT_AABB, [1.0, 0.0, 1.0]),
    (DebugVolumes::INTERNAL_SPHERE, [1.0, 1.0, 0.0]),
    (DebugVolumes::EXTERNAL_SPHERE, [1.0, 0.5, 0.0]),
    (DebugVolumes::TIGHT_SPHERE, [0.5, 1.0, 0.0]),
];

/// Color of persistent overlay lines
pub const PERSISTENT_LINE_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// Line list for one kind of volume
fn volume_lines(kind: DebugVolumes, bounds: &BoundingVolumes, center: &Point3, segments: u32) -> Vec<f32> {
    if kind == DebugVolumes::OBJECT_BOX {
        bounds.object_box.edge_lines()
    } else if kind == DebugVolumes::EXTERNAL_AABB {
        bounds.external_aabb.edge_lines()
    } else if kind == DebugVolumes::INTERNAL_AABB {
        bounds.internal_aabb.edge_lines()
    } else if kind == DebugVolumes::MIDPOINT_AABB {
        bounds.midpoint_aabb.edge_lines()
    } else if kind == DebugVolumes::TIGHT_AABB {
        bounds.tight_aabb.edge_lines()
    } else if kind == DebugVolumes::INTERNAL_SPHERE {
        great_circles(center, bounds.internal_sphere, segments)
    } else if kind == DebugVolumes::EXTERNAL_SPHERE {
        great_circles(center, bounds.external_sphere, segments)
    } else {
        great_circles(center, bounds.tight_sphere, segments)
    }
}

/// Scratch buffer plus line data that outlives a single frame
#[derive(Debug)]
pub(crate) struct DebugOverlay {
    scratch: BufferId,
    sphere_segments: u32,
    persistent_lines: Vec<f32>,
}

impl DebugOverlay {
    pub(crate) fn new(device: &mut dyn GraphicsDevice, sphere_segments: u32) -> RenderResult<Self> {
        Ok(Self {
            scratch: device.create_buffer()?,
            sphere_segments,
            persistent_lines: Vec::new(),
        })
    }

    pub(crate) fn set_persistent_lines(&mut self, lines: Vec<f32>) {
        self.persistent_lines = lines;
    }

    /// Draw every enabled volume of every entity, one draw call each
    pub(crate) fn draw_volumes<'a>(
        &self,
        device: &mut dyn GraphicsDevice,
        entities: impl IntoIterator<Item = &'a Entity>,
        shader: &ShaderProgram,
        camera: &Camera,
        enabled: DebugVolumes,
    ) {
        if enabled.is_empty() {
            return;
        }
        for entity in entities {
            let bounds = entity.bounds();
            let center = Point3::from(entity.world_position());
            for (flag, color) in VOLUME_COLORS {
                if !enabled.contains(flag) {
                    continue;
                }
                let lines = volume_lines(flag, bounds, &center, self.sphere_segments);
                self.draw_lines(device, shader, camera, &lines, color);
            }
        }
    }

    /// Re-bind the scratch buffer and draw the persistent lines, if any
    pub(crate) fn reset(&self, device: &mut dyn GraphicsDevice, shader: &ShaderProgram, camera: &Camera) {
        device.bind_array_buffer(Some(self.scratch));
        if !self.persistent_lines.is_empty() {
            self.draw_lines(device, shader, camera, &self.persistent_lines, PERSISTENT_LINE_COLOR);
        }
    }

    /// Upload `lines` into the scratch buffer and draw them as a line list
    fn draw_lines(
        &self,
        device: &mut dyn GraphicsDevice,
        shader: &ShaderProgram,
        camera: &Camera,
        lines: &[f32],
        color: [f32; 3],
    ) {
        device.upload_buffer(self.scratch, lines);
        device.use_program(shader.program());

        let values = [
            ("modelMatrix", UniformValue::mat4(&Mat4::identity())),
            ("viewMatrix", UniformValue::mat4(&camera.view_matrix())),
            ("projectionMatrix", UniformValue::mat4(&camera.projection_matrix())),
            ("color", UniformValue::Vec3(color)),
        ];
        for (name, value) in values {
            if let Some(location) = shader.location(name) {
                device.set_uniform(location, value);
            }
        }

        device.enable_stream(0, self.scratch, 3);
        device.draw_arrays(Primitive::Lines, 0, (lines.len() / 3) as u32);
        device.disable_stream(0);
    }

    pub(crate) fn destroy(&self, device: &mut dyn GraphicsDevice) {
        device.delete_buffer(self.scratch);
    }
}
