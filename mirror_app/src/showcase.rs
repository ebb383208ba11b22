//! The showcase scene
//!
//! Thirteen entities covering every shader: skybox, axis gizmo, light
//! marker, textured and lit models, and the reflective and refractive models
//! that sample the captured environment.

use std::path::Path;

use mirror_engine::assets::{load_cubemap_faces, load_texture_image, primitives, ObjLoader};
use mirror_engine::core::config::AssetConfig;
use mirror_engine::foundation::math::Vec3;
use mirror_engine::render::device::{GraphicsDevice, Primitive, TextureImage, TextureKind};
use mirror_engine::render::ShaderRegistry;
use mirror_engine::scene::{CameraSet, Entity, EntityTexture, EntityTraits, Geometry, Scene};

use crate::AppError;

/// Entity the reflection camera is attached to
pub const MIRROR_SUBJECT: &str = "man";

const GRID_TEXTURE: &str = "textures/fi_uv_4096__display_grid_8x8_32x32_128x128_by_fisholith-d786zt5.png";
const JACKET_TEXTURE: &str = "textures/black leather jacket/Main Texture/[Albedo].jpg";
const SKYBOX_DIRECTORY: &str = "textures/skybox/Epic_BlueSunset";

/// Loads models and textures, substituting built-in stand-ins for missing files
struct SceneBuilder<'a> {
    device: &'a mut dyn GraphicsDevice,
    shaders: &'a ShaderRegistry,
    assets: &'a AssetConfig,
}

impl SceneBuilder<'_> {
    fn shader(&self, name: &str) -> Result<usize, AppError> {
        Ok(self.shaders.index_of(name)?)
    }

    fn model(&self, file: &str) -> Geometry {
        let path = self.assets.resolve(Path::new("models").join(file));
        match ObjLoader::load_obj(&path) {
            Ok(geometry) => geometry,
            Err(error) => {
                log::warn!("Using a stand-in sphere for {}: {error}", path.display());
                primitives::uv_sphere(1.0, 16, 32)
            }
        }
    }

    fn texture(&mut self, file: &str) -> Result<EntityTexture, AppError> {
        let path = self.assets.resolve(file);
        let image = load_texture_image(&path).unwrap_or_else(|error| {
            log::warn!("Using a flat texture for {}: {error}", path.display());
            TextureImage::solid(1, 1, [200, 200, 200, 255])
        });
        let id = self.device.create_texture_2d(&image)?;
        Ok(EntityTexture { id, kind: TextureKind::Texture2D })
    }

    fn skybox(&mut self) -> Result<EntityTexture, AppError> {
        let directory = self.assets.resolve(SKYBOX_DIRECTORY);
        let faces = load_cubemap_faces(&directory).unwrap_or_else(|error| {
            log::warn!("Using a flat sky for {}: {error}", directory.display());
            std::array::from_fn(|_| TextureImage::solid(1, 1, [110, 150, 210, 255]))
        });
        let id = self.device.create_cubemap(&faces)?;
        Ok(EntityTexture { id, kind: TextureKind::Cubemap })
    }
}

/// Build and upload the showcase scene
pub fn build(
    device: &mut dyn GraphicsDevice,
    shaders: &ShaderRegistry,
    assets: &AssetConfig,
    aspect: f32,
) -> Result<Scene, AppError> {
    let mut builder = SceneBuilder { device, shaders, assets };
    let mut scene = Scene::new(CameraSet::standard(aspect));

    let sky = builder.skybox()?;
    scene.add_entity(
        Entity::new("skybox", primitives::skybox_cube())
            .with_shader(builder.shader("skybox")?)
            .with_texture(sky)
            .with_traits(EntityTraits::BACKGROUND_LAYER),
    );

    scene.add_entity(
        Entity::new("axis", primitives::axis_lines(100.0))
            .with_shader(builder.shader("vertex_color")?)
            .with_primitive(Primitive::Lines),
    );

    let mut light = Entity::new("light", primitives::point())
        .with_shader(builder.shader("light_source")?)
        .with_primitive(Primitive::Points);
    light.translate(Vec3::new(60.0, 10.0, 0.0));
    let light = scene.add_entity(light);
    scene.set_light(light);

    let grid = builder.texture(GRID_TEXTURE)?;
    let mut crate_box = Entity::new("box", builder.model("box2.obj"))
        .with_shader(builder.shader("basic")?)
        .with_texture(grid);
    crate_box.translate(Vec3::new(0.0, -5.0, -10.0));
    scene.add_entity(crate_box);

    let mut walnut = Entity::new("walnut", builder.model("walnut.obj")).with_shader(builder.shader("toon")?);
    walnut.rest_on_ground();
    walnut.translate(Vec3::new(-10.0, 0.0, 0.0));
    scene.add_entity(walnut);

    let mut monkey = Entity::new("monkey", builder.model("monkeyTex2.obj"))
        .with_shader(builder.shader("glass")?)
        .with_traits(EntityTraits::ENVIRONMENT_MAPPED);
    monkey.translate(Vec3::new(0.0, 0.0, 10.0));
    scene.add_entity(monkey);

    let mut man = Entity::new(MIRROR_SUBJECT, builder.model("sphere7.obj"))
        .with_shader(builder.shader("reflection")?)
        .with_traits(EntityTraits::ENVIRONMENT_MAPPED)
        .reflective(false);
    man.scale_uniform(1.7);
    scene.add_entity(man);

    let mut man2 = Entity::new("man2", builder.model("guy.obj")).with_shader(builder.shader("reflection")?);
    man2.scale_uniform(0.7);
    man2.rest_on_ground();
    scene.add_entity(man2);

    let mut man3 = Entity::new("man3", builder.model("guy.obj")).with_shader(builder.shader("toon")?);
    man3.scale_uniform(0.7);
    man3.rest_on_ground();
    man3.translate(Vec3::new(12.0, 0.0, 0.0));
    scene.add_entity(man3);

    let leather = builder.texture(JACKET_TEXTURE)?;
    let mut jacket = Entity::new("jacket", builder.model("blj.obj"))
        .with_shader(builder.shader("lit_textured")?)
        .with_texture(leather);
    jacket.rest_on_ground();
    jacket.translate(Vec3::new(0.0, 0.0, 50.0));
    scene.add_entity(jacket);

    let mut map = Entity::new("map", builder.model("dust2_.obj")).with_shader(builder.shader("lit")?);
    map.translate(Vec3::new(0.0, -20.0, 0.0));
    scene.add_entity(map);

    let mut manaya = Entity::new("manaya", builder.model("manaya6.obj")).with_shader(builder.shader("reflection")?);
    manaya.scale_uniform(0.01);
    manaya.translate(Vec3::new(0.0, 20.0, 3.0));
    manaya.rotate_degrees(0.0, 270.0, 0.0);
    scene.add_entity(manaya);

    let mut enemy = Entity::new("genshinEnemy", builder.model("genshinEnemy.obj"))
        .with_shader(builder.shader("toon")?);
    enemy.translate(Vec3::new(0.0, -5.0, 0.0));
    scene.add_entity(enemy);

    scene.upload(&mut *builder.device)?;
    follow_mirror_subject(&mut scene);
    log::info!("Showcase scene ready with {} entities", scene.entities().len());
    Ok(scene)
}

/// Move the reflection camera to the mirror subject's world position
pub fn follow_mirror_subject(scene: &mut Scene) {
    let Some(position) = scene.entity(MIRROR_SUBJECT).map(Entity::world_position) else {
        return;
    };
    if let Some(camera) = scene.cameras.get_mut(CameraSet::REFLECTION) {
        camera.set_position(position);
    }
}
