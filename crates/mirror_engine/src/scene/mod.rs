//! Scene data
//!
//! The scene is a flat, ordered entity list plus the camera set. It is
//! populated once at startup; afterwards only transforms and flags change.
//!
//! ## Architecture
//!
//! ```text
//! Scene
//!  ├── Entity store (ordered, names unique)
//!  │     └── Entity: geometry, buffers, transform, shader slot, texture, traits
//!  ├── Light reference (index into the store)
//!  └── CameraSet (primary + reflection, one active slot)
//! ```

mod bounds;
mod camera;
mod entity;
mod entity_store;

pub use bounds::{great_circles, BoundingBox, BoundingVolumes, BOX_EDGES};
pub use camera::{Camera, CameraSet, Orientation};
pub use entity::{Entity, EntityBuffers, EntityTexture, EntityTraits, Geometry, SecondaryStream};
pub use entity_store::Scene;
