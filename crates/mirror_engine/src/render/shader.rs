//! Shader programs and the shader registry
//!
//! Each program keeps its declared uniforms and vertex attributes in source
//! order. At load time those names are resolved once into a [`BindingPlan`];
//! per-frame dispatch only walks the plan.

use std::path::Path;

use crate::assets::ShaderSource;
use crate::render::device::{GraphicsDevice, ProgramId, UniformLocation, UniformValue};
use crate::render::{RenderError, RenderResult};

/// Texture unit the reflection cubemap is bound to
pub const ENVIRONMENT_TEXTURE_UNIT: u32 = 1;

/// Sampler uniform that reads the reflection cubemap
pub const ENVIRONMENT_SAMPLER: &str = "environmentMap";

/// Per-draw values a uniform can be fed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformSemantic {
    /// `modelMatrix`: entity model matrix
    ModelMatrix,
    /// `viewMatrix`: active camera view
    ViewMatrix,
    /// `projectionMatrix`: active camera projection
    ProjectionMatrix,
    /// `lightPosition`: world position of the scene light
    LightPosition,
    /// `eyePosition`: active camera position
    EyePosition,
}

impl UniformSemantic {
    /// Semantic for a declared uniform name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "modelMatrix" => Some(Self::ModelMatrix),
            "viewMatrix" => Some(Self::ViewMatrix),
            "projectionMatrix" => Some(Self::ProjectionMatrix),
            "lightPosition" => Some(Self::LightPosition),
            "eyePosition" => Some(Self::EyePosition),
            _ => None,
        }
    }
}

/// Entity buffer an attribute stream reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamSource {
    /// Position buffer
    Vertex,
    /// UV or color buffer
    Secondary,
    /// Normal buffer
    Normal,
}

/// Resolved attribute stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamBinding {
    /// Buffer the stream reads
    pub source: StreamSource,
    /// Attribute slot
    pub slot: u32,
    /// Floats per vertex
    pub components: u32,
}

impl StreamBinding {
    /// Binding for a declared attribute name
    pub fn from_name(name: &str) -> Option<Self> {
        let (source, slot, components) = match name {
            "vertex" => (StreamSource::Vertex, 0, 3),
            "uv" => (StreamSource::Secondary, 1, 2),
            "color" => (StreamSource::Secondary, 1, 3),
            "normal" => (StreamSource::Normal, 2, 3),
            _ => return None,
        };
        Some(Self { source, slot, components })
    }
}

/// Uniform uploads and stream binds resolved once per shader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingPlan {
    /// Uniform uploads in declaration order
    pub uniforms: Vec<(UniformSemantic, UniformLocation)>,
    /// Stream binds in declaration order
    pub streams: Vec<StreamBinding>,
}

impl BindingPlan {
    /// Build a plan from resolved descriptors; unknown names are skipped
    pub fn resolve(uniforms: &[UniformDescriptor], layouts: &[String]) -> Self {
        Self {
            uniforms: uniforms
                .iter()
                .filter_map(|u| Some((UniformSemantic::from_name(&u.name)?, u.location?)))
                .collect(),
            streams: layouts.iter().filter_map(|name| StreamBinding::from_name(name)).collect(),
        }
    }
}

/// Declared uniform and its location in the linked program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformDescriptor {
    /// Declared name
    pub name: String,
    /// Location, `None` when the linker dropped the uniform
    pub location: Option<UniformLocation>,
}

/// Linked vertex + fragment program with its interface
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    name: String,
    program: ProgramId,
    uniforms: Vec<UniformDescriptor>,
    layouts: Vec<String>,
    plan: BindingPlan,
}

impl ShaderProgram {
    /// Compile `source` and resolve its interface
    ///
    /// An `environmentMap` sampler is pointed at
    /// [`ENVIRONMENT_TEXTURE_UNIT`] here, once.
    pub fn load(device: &mut dyn GraphicsDevice, source: &ShaderSource) -> RenderResult<Self> {
        let program = device.compile_program(&source.vertex, &source.fragment)?;
        let interface = source.interface();

        let uniforms: Vec<UniformDescriptor> = interface
            .uniforms
            .into_iter()
            .map(|name| {
                let location = device.uniform_location(program, &name);
                UniformDescriptor { name, location }
            })
            .collect();
        let plan = BindingPlan::resolve(&uniforms, &interface.attributes);

        let shader = Self {
            name: source.name.clone(),
            program,
            uniforms,
            layouts: interface.attributes,
            plan,
        };

        if let Some(location) = shader.location(ENVIRONMENT_SAMPLER) {
            device.use_program(program);
            device.set_uniform(location, UniformValue::Int(ENVIRONMENT_TEXTURE_UNIT as i32));
        }

        log::debug!(
            "Loaded shader '{}': {} uniforms, {} layouts, plan {}+{}",
            shader.name,
            shader.uniforms.len(),
            shader.layouts.len(),
            shader.plan.uniforms.len(),
            shader.plan.streams.len()
        );
        Ok(shader)
    }

    /// Registry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Program handle
    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Declared uniforms in order
    pub fn uniforms(&self) -> &[UniformDescriptor] {
        &self.uniforms
    }

    /// Declared vertex attributes in order
    pub fn layouts(&self) -> &[String] {
        &self.layouts
    }

    /// Precomputed binding plan
    pub fn plan(&self) -> &BindingPlan {
        &self.plan
    }

    /// Location of a declared uniform
    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.iter().find(|u| u.name == name).and_then(|u| u.location)
    }

    /// Release the program
    pub fn destroy(&self, device: &mut dyn GraphicsDevice) {
        device.delete_program(self.program);
    }
}

/// Shaders addressed by slot, loaded once at startup
#[derive(Debug, Default)]
pub struct ShaderRegistry {
    shaders: Vec<ShaderProgram>,
}

impl ShaderRegistry {
    /// Slot of the flat-color line shader used by the debug overlay
    pub const DEBUG_SLOT: usize = 1;

    /// Scene shaders in slot order
    pub const STANDARD_SHADERS: [&'static str; 10] = [
        "basic",
        "debug",
        "vertex_color",
        "lit",
        "lit_textured",
        "light_source",
        "skybox",
        "reflection",
        "glass",
        "toon",
    ];

    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the named shaders from `directory` in order
    pub fn load<P: AsRef<Path>>(
        device: &mut dyn GraphicsDevice,
        directory: P,
        names: &[&str],
    ) -> RenderResult<Self> {
        let mut registry = Self::new();
        for name in names {
            let source = ShaderSource::load(directory.as_ref(), name)?;
            registry.push(ShaderProgram::load(device, &source)?);
        }
        log::info!("Loaded {} shaders", registry.len());
        Ok(registry)
    }

    /// Compile sources in order
    pub fn from_sources(device: &mut dyn GraphicsDevice, sources: &[ShaderSource]) -> RenderResult<Self> {
        let mut registry = Self::new();
        for source in sources {
            registry.push(ShaderProgram::load(device, source)?);
        }
        Ok(registry)
    }

    /// Append a shader and return its slot
    pub fn push(&mut self, shader: ShaderProgram) -> usize {
        self.shaders.push(shader);
        self.shaders.len() - 1
    }

    /// Shader in `slot`
    pub fn get(&self, slot: usize) -> Option<&ShaderProgram> {
        self.shaders.get(slot)
    }

    /// Slot of the shader called `name`
    pub fn index_of(&self, name: &str) -> RenderResult<usize> {
        self.shaders
            .iter()
            .position(|shader| shader.name() == name)
            .ok_or_else(|| RenderError::MissingShader(name.to_owned()))
    }

    /// Number of loaded shaders
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    /// Whether no shader is loaded
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// Release every program
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        for shader in self.shaders.drain(..) {
            shader.destroy(device);
        }
    }
}
