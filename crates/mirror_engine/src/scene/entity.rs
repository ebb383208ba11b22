//! Entities: drawable objects with their own geometry buffers
//!
//! Geometry stays on the CPU after upload so bounding volumes can be derived
//! from it. Volumes are computed on first request and dropped whenever the
//! transform changes; the model matrix is rebuilt eagerly on every mutation.

use std::cell::OnceCell;

use bitflags::bitflags;

use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::render::device::{BufferId, GraphicsDevice, Primitive, TextureId, TextureKind};
use crate::render::RenderResult;
use crate::scene::bounds::BoundingVolumes;

bitflags! {
    /// Capabilities that change how the passes treat an entity
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntityTraits: u32 {
        /// Drawn behind everything: depth writes off, view translation stripped,
        /// always rasterized as triangles
        const BACKGROUND_LAYER = 1 << 0;
        /// Samples the reflection cubemap in the main pass
        const ENVIRONMENT_MAPPED = 1 << 1;
    }
}

/// Second per-vertex stream, sharing attribute slot 1
#[derive(Debug, Clone, PartialEq)]
pub enum SecondaryStream {
    /// Texture coordinates, two floats per vertex
    Uv(Vec<f32>),
    /// Vertex colors, three floats per vertex
    Color(Vec<f32>),
}

impl SecondaryStream {
    /// Raw floats of the stream
    pub fn data(&self) -> &[f32] {
        match self {
            Self::Uv(data) | Self::Color(data) => data,
        }
    }
}

/// CPU-side vertex data in flat, de-indexed form
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    /// Positions, three floats per vertex
    pub positions: Vec<f32>,
    /// Optional UV or color stream
    pub secondary: Option<SecondaryStream>,
    /// Optional normals, three floats per vertex
    pub normals: Option<Vec<f32>>,
}

impl Geometry {
    /// Geometry with positions only
    pub fn from_positions(positions: Vec<f32>) -> Self {
        Self { positions, ..Self::default() }
    }

    /// Number of vertices described by the position stream
    pub fn vertex_count(&self) -> u32 {
        (self.positions.len() / 3) as u32
    }
}

/// GPU buffers owned by one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityBuffers {
    /// Position buffer
    pub vertex: Option<BufferId>,
    /// UV or color buffer
    pub secondary: Option<BufferId>,
    /// Normal buffer
    pub normal: Option<BufferId>,
}

/// Texture bound to unit 0 when the entity is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityTexture {
    /// Texture handle
    pub id: TextureId,
    /// Binding target
    pub kind: TextureKind,
}

/// A named drawable object
#[derive(Debug)]
pub struct Entity {
    name: String,
    geometry: Geometry,
    buffers: EntityBuffers,
    transform: Transform,
    model_matrix: Mat4,
    shader: usize,
    texture: Option<EntityTexture>,
    primitive: Primitive,
    traits: EntityTraits,
    reflective: bool,
    volumes: OnceCell<BoundingVolumes>,
}

impl Entity {
    /// New reflective triangle-list entity using shader slot 0
    pub fn new(name: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            name: name.into(),
            geometry,
            buffers: EntityBuffers::default(),
            transform: Transform::identity(),
            model_matrix: Mat4::identity(),
            shader: 0,
            texture: None,
            primitive: Primitive::Triangles,
            traits: EntityTraits::empty(),
            reflective: true,
            volumes: OnceCell::new(),
        }
    }

    /// Use registry slot `shader`
    #[must_use]
    pub fn with_shader(mut self, shader: usize) -> Self {
        self.shader = shader;
        self
    }

    /// Declared primitive for shaded rendering
    #[must_use]
    pub fn with_primitive(mut self, primitive: Primitive) -> Self {
        self.primitive = primitive;
        self
    }

    /// Add capability tags
    #[must_use]
    pub fn with_traits(mut self, traits: EntityTraits) -> Self {
        self.traits |= traits;
        self
    }

    /// Attach a texture
    #[must_use]
    pub fn with_texture(mut self, texture: EntityTexture) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Whether the entity shows up in the reflection cubemap
    #[must_use]
    pub fn reflective(mut self, reflective: bool) -> Self {
        self.reflective = reflective;
        self
    }

    /// Create the entity's buffers and upload its geometry
    ///
    /// Streams that are absent (or empty) get no buffer.
    pub fn upload(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        self.release(device);

        self.buffers.vertex = upload_stream(device, &self.geometry.positions)?;
        if let Some(secondary) = &self.geometry.secondary {
            self.buffers.secondary = upload_stream(device, secondary.data())?;
        }
        if let Some(normals) = &self.geometry.normals {
            self.buffers.normal = upload_stream(device, normals)?;
        }

        log::debug!(
            "Uploaded entity '{}' ({} vertices, shader {})",
            self.name,
            self.vertex_count(),
            self.shader
        );
        Ok(())
    }

    /// Release the entity's buffers and texture
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        self.release(device);
        if let Some(texture) = self.texture.take() {
            device.delete_texture(texture.id);
        }
    }

    fn release(&mut self, device: &mut dyn GraphicsDevice) {
        let buffers = std::mem::take(&mut self.buffers);
        for buffer in [buffers.vertex, buffers.secondary, buffers.normal].into_iter().flatten() {
            device.delete_buffer(buffer);
        }
    }

    /// Unique name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// CPU-side geometry
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Uploaded buffers
    pub fn buffers(&self) -> EntityBuffers {
        self.buffers
    }

    /// Vertices drawn per draw call
    pub fn vertex_count(&self) -> u32 {
        self.geometry.vertex_count()
    }

    /// Registry slot of the entity's shader
    pub fn shader(&self) -> usize {
        self.shader
    }

    /// Attached texture
    pub fn texture(&self) -> Option<EntityTexture> {
        self.texture
    }

    /// Declared primitive
    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    /// Capability tags
    pub fn traits(&self) -> EntityTraits {
        self.traits
    }

    /// Whether the entity is drawn into the reflection cubemap
    pub fn is_reflective(&self) -> bool {
        self.reflective
    }

    /// Change reflection eligibility
    pub fn set_reflective(&mut self, reflective: bool) {
        self.reflective = reflective;
    }

    /// Current transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Model matrix of the current transform
    pub fn model_matrix(&self) -> &Mat4 {
        &self.model_matrix
    }

    /// World-space position
    pub fn world_position(&self) -> Vec3 {
        self.transform.position
    }

    /// Bounding volumes under the current transform, computed on first use
    pub fn bounds(&self) -> &BoundingVolumes {
        self.volumes.get_or_init(|| {
            BoundingVolumes::compute(&self.geometry.positions, &self.model_matrix, &self.transform.position)
        })
    }

    /// Move by `delta` in world space
    pub fn translate(&mut self, delta: Vec3) {
        self.transform.position += delta;
        self.transform_changed();
    }

    /// Move to `position`
    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
        self.transform_changed();
    }

    /// Multiply the scale uniformly
    pub fn scale_uniform(&mut self, factor: f32) {
        self.transform.scale *= factor;
        self.transform_changed();
    }

    /// Rotate by Euler angles in degrees
    pub fn rotate_degrees(&mut self, x: f32, y: f32, z: f32) {
        self.transform.rotate_degrees(x, y, z);
        self.transform_changed();
    }

    /// Translate vertically so the lowest point of the external box sits at y = 0
    ///
    /// Only the Y axis moves; the entity keeps its X and Z placement. Scene
    /// setup calls this after positioning, so a shift along all three axes
    /// would undo the horizontal layout.
    pub fn rest_on_ground(&mut self) {
        let lowest = self.bounds().external_aabb.min().y;
        self.translate(Vec3::new(0.0, -lowest, 0.0));
    }

    fn transform_changed(&mut self) {
        self.model_matrix = self.transform.to_matrix();
        self.volumes = OnceCell::new();
    }
}

fn upload_stream(device: &mut dyn GraphicsDevice, data: &[f32]) -> RenderResult<Option<BufferId>> {
    if data.is_empty() {
        return Ok(None);
    }
    let buffer = device.create_buffer()?;
    device.upload_buffer(buffer, data);
    Ok(Some(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::RecordingDevice;
    use approx::assert_relative_eq;

    fn unit_cube() -> Geometry {
        Geometry::from_positions(vec![
            -1.0, -1.0, -1.0,
            1.0, 1.0, 1.0,
            1.0, -1.0, 1.0,
        ])
    }

    #[test]
    fn test_model_matrix_tracks_mutations() {
        let mut entity = Entity::new("box", unit_cube());
        entity.translate(Vec3::new(0.0, -5.0, -10.0));
        entity.scale_uniform(2.0);
        assert_eq!(*entity.model_matrix(), entity.transform().to_matrix());
        assert_relative_eq!(entity.model_matrix()[(1, 3)], -5.0);
        assert_relative_eq!(entity.model_matrix()[(0, 0)], 2.0);
    }

    #[test]
    fn test_bounds_invalidated_by_transform() {
        let mut entity = Entity::new("box", unit_cube());
        assert_relative_eq!(entity.bounds().external_aabb.max().x, 1.0);

        entity.translate(Vec3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(entity.bounds().external_aabb.max().x, 11.0);
    }

    #[test]
    fn test_rest_on_ground() {
        let mut entity = Entity::new("man2", unit_cube());
        entity.scale_uniform(0.7);
        entity.rest_on_ground();
        assert_relative_eq!(entity.bounds().external_aabb.min().y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(entity.world_position().y, 0.7, epsilon = 1e-6);
    }

    #[test]
    fn test_rest_on_ground_keeps_horizontal_placement() {
        let mut entity = Entity::new("jacket", unit_cube());
        entity.translate(Vec3::new(-3.0, -4.0, 2.5));
        entity.rest_on_ground();
        assert_relative_eq!(entity.world_position(), Vec3::new(-3.0, 1.0, 2.5), epsilon = 1e-6);
    }

    #[test]
    fn test_upload_skips_absent_streams() {
        let mut device = RecordingDevice::new();
        let mut entity = Entity::new("light", Geometry::from_positions(vec![0.0, 0.0, 0.0]))
            .with_primitive(Primitive::Points);
        entity.upload(&mut device).unwrap();

        let buffers = entity.buffers();
        assert!(buffers.vertex.is_some());
        assert!(buffers.secondary.is_none());
        assert!(buffers.normal.is_none());
        assert_eq!(entity.vertex_count(), 1);

        entity.destroy(&mut device);
        assert_eq!(device.live_buffer_count(), 0);
    }

    #[test]
    fn test_vertex_count_ignores_secondary_stream_width() {
        let geometry = Geometry {
            positions: vec![0.0; 18],
            secondary: Some(SecondaryStream::Color(vec![1.0; 18])),
            normals: None,
        };
        let entity = Entity::new("axis", geometry);
        assert_eq!(entity.vertex_count(), 6);
    }
}
