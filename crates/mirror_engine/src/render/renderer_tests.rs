//! Pipeline tests for the Renderer against the recording device

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::assets::{primitives, ShaderSource};
    use crate::core::config::RendererConfig;
    use crate::foundation::math::{utils, Mat4Ext, Vec3};
    use crate::render::device::{
        AttachTarget, CubeFace, Primitive, TextureImage, TextureKind, UniformValue, Viewport,
    };
    use crate::render::passes::CUBE_FACE_ORIENTATIONS;
    use crate::scene::{CameraSet, Entity, EntityTexture, EntityTraits, Geometry, Scene};
    use approx::assert_relative_eq;

    const WIDTH: u32 = 800;
    const HEIGHT: u32 = 600;

    const TRANSFORMS: &str = "in vec3 vertex;\n\
        uniform mat4 modelMatrix;\n\
        uniform mat4 viewMatrix;\n\
        uniform mat4 projectionMatrix;\n";

    fn scene_sources() -> Vec<ShaderSource> {
        vec![
            ShaderSource::new("basic", format!("{TRANSFORMS}in vec2 uv;"), "uniform sampler2D tex;"),
            ShaderSource::new("debug", TRANSFORMS, "uniform vec3 color;"),
            ShaderSource::new(
                "skybox",
                "in vec3 vertex; uniform mat4 viewMatrix; uniform mat4 projectionMatrix;",
                "uniform samplerCube skybox;",
            ),
            ShaderSource::new(
                "reflection",
                format!("{TRANSFORMS}in vec3 normal;"),
                "uniform vec3 eyePosition; uniform samplerCube environmentMap;",
            ),
            ShaderSource::new(
                "lit",
                format!("{TRANSFORMS}in vec3 normal;"),
                "uniform vec3 lightPosition; uniform vec3 eyePosition;",
            ),
        ]
    }

    fn post_shaders(device: &mut RecordingDevice) -> PostShaders {
        let vertex = "in vec2 position; in vec2 uv;";
        PostShaders {
            screen: ShaderProgram::load(
                device,
                &ShaderSource::new("screen", vertex, "uniform sampler2DMS screenTexture; uniform int samples;"),
            )
            .unwrap(),
            depth: ShaderProgram::load(
                device,
                &ShaderSource::new("depth", vertex, "uniform sampler2DMS depthTexture; uniform int samples;"),
            )
            .unwrap(),
        }
    }

    /// Skybox, a reflective box and a non-reflective environment-mapped sphere
    struct Fixture {
        device: RecordingDevice,
        renderer: Renderer,
        scene: Scene,
        context: RenderContext,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_device(RecordingDevice::new(), &RendererConfig::default().with_reflection_resolution(256))
        }

        fn with_device(mut device: RecordingDevice, config: &RendererConfig) -> Self {
            let shaders = ShaderRegistry::from_sources(&mut device, &scene_sources()).unwrap();
            let basic = shaders.index_of("basic").unwrap();
            let skybox_shader = shaders.index_of("skybox").unwrap();
            let reflection = shaders.index_of("reflection").unwrap();

            let post = post_shaders(&mut device);
            let renderer = Renderer::new(&mut device, shaders, post, config, WIDTH, HEIGHT).unwrap();

            let faces = std::array::from_fn(|_| TextureImage::solid(1, 1, [40, 80, 160, 255]));
            let cubemap = device.create_cubemap(&faces).unwrap();

            let mut scene = Scene::new(CameraSet::standard(WIDTH as f32 / HEIGHT as f32));
            scene.add_entity(
                Entity::new("skybox", primitives::skybox_cube())
                    .with_shader(skybox_shader)
                    .with_traits(EntityTraits::BACKGROUND_LAYER)
                    .with_texture(EntityTexture { id: cubemap, kind: TextureKind::Cubemap }),
            );
            scene.add_entity(Entity::new("box", primitives::cube(1.0)).with_shader(basic));
            scene.add_entity(
                Entity::new("man", primitives::uv_sphere(1.0, 8, 16))
                    .with_shader(reflection)
                    .with_traits(EntityTraits::ENVIRONMENT_MAPPED)
                    .reflective(false),
            );
            if let Some(man) = scene.entity_mut("man") {
                man.translate(Vec3::new(5.0, 0.0, 0.0));
            }
            scene.upload(&mut device).unwrap();
            device.clear_commands();

            Self { device, renderer, scene, context: RenderContext::new(WIDTH, HEIGHT) }
        }

        fn render(&mut self) {
            self.renderer.render(&mut self.device, &mut self.scene, &mut self.context).unwrap();
        }

        fn program(&self, name: &str) -> device::ProgramId {
            let shaders = self.renderer.shaders();
            shaders.get(shaders.index_of(name).unwrap()).unwrap().program()
        }

        fn uploads_to(&self, program: &str, uniform: &str) -> Vec<UniformValue> {
            let location = self.device.location_of(self.program(program), uniform).unwrap();
            self.device
                .commands()
                .iter()
                .filter_map(|command| match command {
                    GpuCommand::SetUniform { location: l, value } if *l == location => Some(*value),
                    _ => None,
                })
                .collect()
        }

        /// Upload `entity` and append it to the scene
        fn add_uploaded(&mut self, mut entity: Entity) {
            entity.upload(&mut self.device).unwrap();
            self.scene.add_entity(entity);
            self.device.clear_commands();
        }

        fn buffers_of(&self, name: &str) -> Vec<device::BufferId> {
            let buffers = self.scene.entity(name).unwrap().buffers();
            [buffers.vertex, buffers.secondary, buffers.normal].into_iter().flatten().collect()
        }
    }

    #[test]
    fn test_reflection_pass_skips_non_reflective_entities() {
        let mut fixture = Fixture::new();
        let man_buffers = fixture.buffers_of("man");
        let man_program = fixture.program("reflection");

        fixture.renderer.render_reflection_cubemap(&mut fixture.device, &mut fixture.scene, &fixture.context);

        for command in fixture.device.commands() {
            match command {
                GpuCommand::EnableStream { buffer, .. } => assert!(!man_buffers.contains(buffer)),
                GpuCommand::UseProgram(program) => assert_ne!(*program, man_program),
                _ => {}
            }
        }
        // Skybox and box on each of the six faces
        assert_eq!(fixture.device.draw_calls().count(), 12);
    }

    #[test]
    fn test_reflection_faces_follow_orientation_table() {
        let mut fixture = Fixture::new();
        fixture.renderer.render_reflection_cubemap(&mut fixture.device, &mut fixture.scene, &fixture.context);

        let faces: Vec<CubeFace> = fixture
            .device
            .commands()
            .iter()
            .filter_map(|command| match command {
                GpuCommand::AttachTexture { target: AttachTarget::Cube(face), .. } => Some(*face),
                _ => None,
            })
            .collect();
        assert_eq!(faces, CubeFace::ALL);

        let box_view = fixture.device.location_of(fixture.program("basic"), "viewMatrix").unwrap();
        let uploaded: Vec<UniformValue> = fixture
            .device
            .commands()
            .iter()
            .filter_map(|command| match command {
                GpuCommand::SetUniform { location, value } if *location == box_view => Some(*value),
                _ => None,
            })
            .collect();

        let mut camera = fixture.scene.cameras.get(CameraSet::REFLECTION).unwrap().clone();
        let expected: Vec<UniformValue> = CUBE_FACE_ORIENTATIONS
            .iter()
            .map(|(_, orientation)| {
                camera.set_orientation(*orientation);
                UniformValue::mat4(&camera.view_matrix())
            })
            .collect();
        assert_eq!(uploaded, expected);
    }

    #[test]
    fn test_reflection_pass_restores_primary_camera_and_viewport() {
        let mut fixture = Fixture::new();
        fixture.renderer.render_reflection_cubemap(&mut fixture.device, &mut fixture.scene, &fixture.context);

        assert_eq!(fixture.scene.cameras.active_index(), CameraSet::PRIMARY);
        let last_viewport = fixture.device.commands().iter().rev().find_map(|command| match command {
            GpuCommand::SetViewport(viewport) => Some(*viewport),
            _ => None,
        });
        assert_eq!(last_viewport, Some(Viewport::sized(WIDTH, HEIGHT)));
        assert!(fixture.device.commands().contains(&GpuCommand::SetViewport(Viewport::sized(256, 256))));
    }

    #[test]
    fn test_skybox_drawn_as_triangles_without_depth_writes_in_every_mode() {
        let mut fixture = Fixture::new();
        let skybox_count = fixture.scene.entity("skybox").unwrap().vertex_count();

        for mode in [RenderMode::Shaded, RenderMode::Wireframe, RenderMode::Points] {
            fixture.device.clear_commands();
            fixture.renderer.render_entities(&mut fixture.device, &fixture.scene, mode, EntityPass::Main);

            let commands = fixture.device.commands();
            let mask_off = commands.iter().position(|c| *c == GpuCommand::SetDepthMask(false)).unwrap();
            let draw = commands
                .iter()
                .position(|c| {
                    *c == GpuCommand::DrawArrays { primitive: Primitive::Triangles, first: 0, count: skybox_count }
                })
                .unwrap();
            let mask_on = commands.iter().position(|c| *c == GpuCommand::SetDepthMask(true)).unwrap();
            assert!(mask_off < draw && draw < mask_on, "mode {mode:?}");
        }
    }

    #[test]
    fn test_wireframe_draws_box_as_line_list() {
        let mut fixture = Fixture::new();
        fixture.context.render_mode = RenderMode::Wireframe;
        fixture.renderer.render_entities(&mut fixture.device, &fixture.scene, RenderMode::Wireframe, EntityPass::Main);

        let box_count = fixture.scene.entity("box").unwrap().vertex_count();
        let draws: Vec<_> = fixture.device.draw_calls().collect();
        assert_eq!(draws[1], (Primitive::Lines, box_count));
    }

    #[test]
    fn test_environment_cubemap_bound_only_in_main_pass() {
        let mut fixture = Fixture::new();
        let cubemap = fixture.renderer.reflection_target().cubemap;
        let environment_bind = GpuCommand::BindTexture {
            unit: shader::ENVIRONMENT_TEXTURE_UNIT,
            kind: TextureKind::Cubemap,
            texture: Some(cubemap),
        };

        fixture.renderer.render_entities(&mut fixture.device, &fixture.scene, RenderMode::Shaded, EntityPass::Main);
        assert!(fixture.device.commands().contains(&environment_bind));

        fixture.device.clear_commands();
        fixture.scene.entity_mut("man").unwrap().set_reflective(true);
        fixture.renderer.render_entities(&mut fixture.device, &fixture.scene, RenderMode::Shaded, EntityPass::Reflection);
        assert!(!fixture.device.commands().contains(&environment_bind));
    }

    #[test]
    fn test_resize_refits_projection_and_releases_old_target() {
        let mut fixture = Fixture::new();
        let old = *fixture.renderer.offscreen();

        fixture.context.notify_resize(1600, 900);
        fixture.render();

        let projection = fixture.scene.cameras.primary().projection_matrix();
        let focal = 1.0 / utils::deg_to_rad(22.5).tan();
        assert_relative_eq!(projection[(1, 1)], focal, epsilon = 1e-5);
        assert_relative_eq!(projection[(0, 0)], focal / (1600.0 / 900.0), epsilon = 1e-5);

        assert!(!fixture.device.texture_alive(old.color));
        assert!(!fixture.device.texture_alive(old.depth));
        assert!(!fixture.device.framebuffer_alive(old.framebuffer));

        let new = fixture.renderer.offscreen();
        assert_eq!((new.width, new.height), (1600, 900));
        assert!(fixture.device.texture_alive(new.color));
    }

    #[test]
    fn test_zero_sized_resize_is_ignored() {
        let mut fixture = Fixture::new();
        let old = *fixture.renderer.offscreen();

        fixture.context.notify_resize(0, 0);
        fixture.render();

        assert_eq!(*fixture.renderer.offscreen(), old);
    }

    #[test]
    fn test_identical_frames_record_identical_commands() {
        let mut fixture = Fixture::new();
        fixture.context.reflections_enabled = true;
        fixture.context.toggle_debug_volume(DebugVolumes::OBJECT_BOX | DebugVolumes::TIGHT_SPHERE);

        fixture.render();
        let first = fixture.device.take_commands();
        fixture.render();
        let second = fixture.device.take_commands();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_samples_clamped_to_device_maximum() {
        let config = RendererConfig::default().with_samples(16).with_reflection_resolution(256);
        let fixture = Fixture::with_device(RecordingDevice::with_max_samples(4), &config);

        assert_eq!(fixture.renderer.samples(), 4);
        assert_eq!(fixture.renderer.offscreen().samples, 4);
    }

    #[test]
    fn test_depth_view_sets_samples_on_bound_shader() {
        let mut fixture = Fixture::new();
        fixture.context.show_depth_buffer = true;
        fixture.render();

        let depth_texture = fixture.renderer.offscreen().depth;
        let commands = fixture.device.commands();
        let bind = commands
            .iter()
            .position(|c| {
                *c == GpuCommand::BindTexture { unit: 0, kind: TextureKind::Multisample2D, texture: Some(depth_texture) }
            })
            .unwrap();

        let samples = fixture.renderer.samples() as i32;
        let upload = commands[bind..].iter().find_map(|c| match c {
            GpuCommand::SetUniform { location, value: UniformValue::Int(value) } => Some((*location, *value)),
            _ => None,
        });
        let (location, value) = upload.unwrap();
        assert_eq!(value, samples);

        let bound_program = commands[..bind]
            .iter()
            .rev()
            .find_map(|c| match c {
                GpuCommand::UseProgram(program) => Some(*program),
                _ => None,
            })
            .unwrap();
        assert_eq!(fixture.device.location_of(bound_program, "samples"), Some(location));
    }

    #[test]
    fn test_bounding_volumes_drawn_per_entity() {
        let mut fixture = Fixture::new();
        let volumes = DebugVolumes::EXTERNAL_AABB | DebugVolumes::INTERNAL_SPHERE;
        fixture.renderer.display_bounding_volumes(&mut fixture.device, &fixture.scene, volumes);

        let draws: Vec<_> = fixture.device.draw_calls().collect();
        let segments = RendererConfig::default().sphere_segments;
        assert_eq!(draws.len(), 2 * fixture.scene.entities().len());
        assert_eq!(draws[0], (Primitive::Lines, 24));
        assert_eq!(draws[1], (Primitive::Lines, 3 * segments * 2));

        let debug = fixture.program("debug");
        let color = fixture.device.location_of(debug, "color").unwrap();
        assert!(fixture.device.commands().contains(&GpuCommand::SetUniform {
            location: color,
            value: UniformValue::Vec3([0.0, 1.0, 0.0]),
        }));
    }

    #[test]
    fn test_persistent_lines_drawn_after_resolve() {
        let mut fixture = Fixture::new();
        fixture
            .renderer
            .set_persistent_lines(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        fixture.render();

        assert_eq!(fixture.device.draw_calls().last(), Some((Primitive::Lines, 4)));
    }

    #[test]
    fn test_validate_scene_rejects_unknown_shader_slot() {
        let mut fixture = Fixture::new();
        assert!(fixture.renderer.validate_scene(&fixture.scene).is_ok());

        fixture.scene.add_entity(Entity::new("stray", primitives::point()).with_shader(42));
        assert!(matches!(
            fixture.renderer.validate_scene(&fixture.scene),
            Err(RenderError::InvalidShaderIndex { index: 42, .. })
        ));
    }

    #[test]
    fn test_reflection_faces_never_sample_the_cubemap_being_written() {
        let mut fixture = Fixture::new();
        let reflection = fixture.renderer.shaders().index_of("reflection").unwrap();
        let mut man2 = Entity::new("man2", primitives::uv_sphere(1.0, 8, 16))
            .with_shader(reflection)
            .with_traits(EntityTraits::ENVIRONMENT_MAPPED);
        man2.translate(Vec3::new(-4.0, 0.0, 0.0));
        fixture.add_uploaded(man2);
        fixture.context.reflections_enabled = true;

        // The first frame leaves the cubemap bound on the environment unit
        fixture.render();
        fixture.device.clear_commands();
        fixture.render();

        let target = *fixture.renderer.reflection_target();
        let sky = fixture.scene.entity("skybox").unwrap().texture().unwrap().id;
        let mut framebuffer = None;
        let mut environment = None;
        let mut capture_draws = 0;
        for command in fixture.device.commands() {
            match command {
                GpuCommand::BindFramebuffer(bound) => framebuffer = *bound,
                GpuCommand::BindTexture { unit: shader::ENVIRONMENT_TEXTURE_UNIT, texture, .. } => {
                    environment = *texture;
                }
                GpuCommand::DrawArrays { .. } if framebuffer == Some(target.framebuffer) => {
                    assert_ne!(environment, Some(target.cubemap));
                    assert_eq!(environment, Some(sky));
                    capture_draws += 1;
                }
                _ => {}
            }
        }
        // Skybox, box and man2 on each face
        assert_eq!(capture_draws, 18);
    }

    #[test]
    fn test_points_mode_sets_point_size_before_drawing() {
        let mut fixture = Fixture::new();
        fixture.renderer.render_entities(&mut fixture.device, &fixture.scene, RenderMode::Points, EntityPass::Main);

        let box_count = fixture.scene.entity("box").unwrap().vertex_count();
        let commands = fixture.device.commands();
        let draw = commands
            .iter()
            .position(|c| *c == GpuCommand::DrawArrays { primitive: Primitive::Points, first: 0, count: box_count })
            .unwrap();
        assert_eq!(commands[draw - 1], GpuCommand::SetPointSize(2.0));
        assert_eq!(fixture.device.draw_calls().filter(|(primitive, _)| *primitive == Primitive::Points).count(), 2);
    }

    #[test]
    fn test_stream_slots_disabled_after_every_entity() {
        let mut fixture = Fixture::new();
        fixture.renderer.render_entities(&mut fixture.device, &fixture.scene, RenderMode::Shaded, EntityPass::Main);

        let commands = fixture.device.commands();
        let draws: Vec<usize> = commands
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, GpuCommand::DrawArrays { .. }))
            .map(|(index, _)| index)
            .collect();
        assert_eq!(draws.len(), fixture.scene.entities().len());

        for draw in draws {
            let mut next = draw + 1;
            if commands[next] == GpuCommand::SetDepthMask(true) {
                next += 1;
            }
            assert_eq!(
                commands[next..next + 3],
                [GpuCommand::DisableStream(0), GpuCommand::DisableStream(1), GpuCommand::DisableStream(2)]
            );
        }
    }

    #[test]
    fn test_uniform_values_follow_camera_light_and_entity() {
        let mut fixture = Fixture::new();
        let lit = fixture.renderer.shaders().index_of("lit").unwrap();
        let mut teapot = Entity::new("teapot", primitives::uv_sphere(1.0, 8, 16)).with_shader(lit);
        teapot.translate(Vec3::new(0.0, 2.0, -3.0));
        teapot.rotate_degrees(0.0, 30.0, 0.0);
        fixture.add_uploaded(teapot);
        let light = fixture.scene.index_of("man").unwrap();
        fixture.scene.set_light(light);

        fixture.renderer.render_entities(&mut fixture.device, &fixture.scene, RenderMode::Shaded, EntityPass::Main);

        let camera = fixture.scene.cameras.primary().clone();
        let teapot = fixture.scene.entity("teapot").unwrap();
        assert_eq!(fixture.uploads_to("lit", "lightPosition"), [UniformValue::Vec3([5.0, 0.0, 0.0])]);
        assert_eq!(fixture.uploads_to("lit", "eyePosition"), [UniformValue::vec3(&camera.position)]);
        assert_eq!(fixture.uploads_to("lit", "modelMatrix"), [UniformValue::mat4(teapot.model_matrix())]);
        assert_eq!(fixture.uploads_to("lit", "viewMatrix"), [UniformValue::mat4(&camera.view_matrix())]);

        // The background keeps only the rotation of the view
        let sky_view = camera.view_matrix().rotation_only();
        assert_eq!(fixture.uploads_to("skybox", "viewMatrix"), [UniformValue::mat4(&sky_view)]);
        assert_ne!(sky_view, camera.view_matrix());
    }

    #[test]
    fn test_midpoint_box_uploaded_to_scratch_buffer() {
        let mut fixture = Fixture::new();

        // Rotated 45 degrees about Y this box has an internal AABB of
        // [-1, 1] and an external AABB of [-2, 2] on X and Z, and spans
        // [-1.5, 1.5] on Y.
        let (hx, hy, hz) = (1.5 * std::f32::consts::SQRT_2, 1.5, 0.5 * std::f32::consts::SQRT_2);
        let mut crate_box = Entity::new(
            "crate",
            Geometry::from_positions(vec![-hx, -hy, -hz, hx, hy, hz, hx, -hy, -hz, -hx, hy, hz]),
        );
        crate_box.rotate_degrees(0.0, 45.0, 0.0);
        let mut scene = Scene::new(CameraSet::standard(WIDTH as f32 / HEIGHT as f32));
        scene.add_entity(crate_box);

        fixture.renderer.display_bounding_volumes(&mut fixture.device, &scene, DebugVolumes::MIDPOINT_AABB);

        let uploaded: Vec<&Vec<f32>> = fixture
            .device
            .commands()
            .iter()
            .filter_map(|command| match command {
                GpuCommand::UploadBuffer { data, .. } => Some(data),
                _ => None,
            })
            .collect();
        assert_eq!(uploaded.len(), 1);
        let data = uploaded[0];
        assert_eq!(data.len(), 24 * 3);
        assert_relative_eq!(data[0], -1.5, epsilon = 1e-5);
        assert_relative_eq!(data[1], -1.5, epsilon = 1e-5);
        assert_relative_eq!(data[2], -1.5, epsilon = 1e-5);
        assert_eq!(fixture.device.draw_calls().collect::<Vec<_>>(), [(Primitive::Lines, 24)]);
    }

    #[test]
    fn test_destroy_releases_everything() {
        let Fixture { mut device, renderer, mut scene, .. } = Fixture::new();
        renderer.destroy(&mut device);
        scene.destroy(&mut device);

        assert_eq!(device.live_texture_count(), 0);
        assert_eq!(device.live_buffer_count(), 0);
        assert_eq!(device.live_renderbuffer_count(), 0);
    }
}
