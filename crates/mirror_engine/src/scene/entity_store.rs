//! Ordered entity store with the scene light and cameras

use crate::foundation::math::Vec3;
use crate::render::device::GraphicsDevice;
use crate::render::RenderResult;
use crate::scene::{CameraSet, Entity};

/// Entities in draw order plus the cameras that view them
#[derive(Debug)]
pub struct Scene {
    entities: Vec<Entity>,
    light: Option<usize>,
    /// Cameras; the renderer reads and switches the active slot
    pub cameras: CameraSet,
}

impl Scene {
    /// Empty scene viewed through `cameras`
    pub fn new(cameras: CameraSet) -> Self {
        Self { entities: Vec::new(), light: None, cameras }
    }

    /// Append an entity and return its index
    ///
    /// Names must be unique; a duplicate is still stored but only the first
    /// one is reachable by name.
    pub fn add_entity(&mut self, entity: Entity) -> usize {
        if self.index_of(entity.name()).is_some() {
            debug_assert!(false, "duplicate entity name '{}'", entity.name());
            log::warn!("Duplicate entity name '{}'", entity.name());
        }
        self.entities.push(entity);
        self.entities.len() - 1
    }

    /// Mark the entity at `index` as the scene light
    pub fn set_light(&mut self, index: usize) {
        if index < self.entities.len() {
            self.light = Some(index);
        } else {
            debug_assert!(false, "light index {index} out of range");
            log::warn!("Ignoring out of range light index {index}");
        }
    }

    /// World position of the light, or the origin when there is none
    pub fn light_position(&self) -> Vec3 {
        self.light
            .and_then(|index| self.entities.get(index))
            .map_or_else(Vec3::zeros, Entity::world_position)
    }

    /// Entities in draw order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Position of the entity called `name`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entities.iter().position(|entity| entity.name() == name)
    }

    /// Entity called `name`
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.name() == name)
    }

    /// Mutable entity called `name`
    pub fn entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.name() == name)
    }

    /// Upload every entity's geometry
    pub fn upload(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        for entity in &mut self.entities {
            entity.upload(device)?;
        }
        log::info!("Uploaded {} entities", self.entities.len());
        Ok(())
    }

    /// Release all GPU resources held by entities
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        for entity in &mut self.entities {
            entity.destroy(device);
        }
    }
}
