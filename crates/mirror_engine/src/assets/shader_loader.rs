//! GLSL source loading and interface extraction
//!
//! Shaders live in `<shader_dir>/<name>/shader.vert` and `shader.frag`. The
//! declared uniforms (both stages, declaration order, deduplicated) and the
//! vertex stage `in` attributes are read from the source text.

use std::path::Path;

use crate::assets::{AssetError, AssetResult};

/// Vertex and fragment source of one shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    /// Registry name
    pub name: String,
    /// Vertex stage GLSL
    pub vertex: String,
    /// Fragment stage GLSL
    pub fragment: String,
}

impl ShaderSource {
    /// Source from in-memory strings
    pub fn new(name: impl Into<String>, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self { name: name.into(), vertex: vertex.into(), fragment: fragment.into() }
    }

    /// Read `<directory>/<name>/shader.vert` and `shader.frag`
    pub fn load<P: AsRef<Path>>(directory: P, name: &str) -> AssetResult<Self> {
        let base = directory.as_ref().join(name);
        let read = |file: &str| {
            let path = base.join(file);
            std::fs::read_to_string(&path).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => AssetError::NotFound(path),
                _ => AssetError::Io(e),
            })
        };
        let source = Self::new(name, read("shader.vert")?, read("shader.frag")?);
        log::debug!("Read shader sources for '{name}' from {:?}", base);
        Ok(source)
    }

    /// Declared interface of this source
    pub fn interface(&self) -> ShaderInterface {
        parse_interface(&self.vertex, &self.fragment)
    }
}

/// Names a shader declares, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    /// Uniform names across both stages
    pub uniforms: Vec<String>,
    /// Vertex input attribute names
    pub attributes: Vec<String>,
}

/// Extract uniform and vertex attribute names from GLSL text
pub fn parse_interface(vertex: &str, fragment: &str) -> ShaderInterface {
    let mut interface = ShaderInterface::default();
    for (stage, source) in [(Stage::Vertex, vertex), (Stage::Fragment, fragment)] {
        for statement in strip_directives(&strip_comments(source)).split(';') {
            let Some((qualifier, names)) = declaration(statement) else { continue };
            let target = match (qualifier, stage) {
                ("uniform", _) => &mut interface.uniforms,
                ("in" | "attribute", Stage::Vertex) => &mut interface.attributes,
                _ => continue,
            };
            for name in names {
                if !target.contains(&name) {
                    target.push(name);
                }
            }
        }
    }
    interface
}

#[derive(Clone, Copy)]
enum Stage {
    Vertex,
    Fragment,
}

/// Storage qualifier and variable names of one declaration statement
fn declaration(statement: &str) -> Option<(&str, Vec<String>)> {
    if statement.contains('{') || (statement.contains('(') && !statement.trim_start().starts_with("layout")) {
        return None;
    }
    let statement = skip_layout(statement.trim());

    let mut tokens = statement.split_whitespace().peekable();
    let qualifier = tokens.find(|t| matches!(*t, "uniform" | "in" | "attribute"))?;
    while tokens
        .peek()
        .is_some_and(|t| matches!(*t, "lowp" | "mediump" | "highp" | "flat" | "smooth" | "noperspective"))
    {
        tokens.next();
    }
    let _type_name = tokens.next()?;

    let rest: String = tokens.collect::<Vec<_>>().join(" ");
    let names = rest
        .split(',')
        .filter_map(|part| {
            let name = part.split(['=', '[']).next()?.trim();
            (!name.is_empty()).then(|| name.to_owned())
        })
        .collect::<Vec<_>>();
    (!names.is_empty()).then_some((qualifier, names))
}

fn skip_layout(statement: &str) -> &str {
    if let Some(rest) = statement.strip_prefix("layout") {
        if let Some(end) = rest.find(')') {
            return rest[end + 1..].trim_start();
        }
    }
    statement
}

fn strip_directives(source: &str) -> String {
    source
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    loop {
        let line = rest.find("//");
        let block = rest.find("/*");
        match (line, block) {
            (Some(l), b) if b.map_or(true, |b| l < b) => {
                out.push_str(&rest[..l]);
                rest = rest[l..].find('\n').map_or("", |end| &rest[l + end..]);
            }
            (_, Some(b)) => {
                out.push_str(&rest[..b]);
                out.push(' ');
                rest = rest[b + 2..].find("*/").map_or("", |end| &rest[b + 2 + end + 2..]);
            }
            _ => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r"
#version 330 core
layout(location = 0) in vec3 vertex;
layout(location = 1) in vec2 uv;
layout (location = 2) in vec3 normal;

uniform mat4 modelMatrix;
uniform mat4 viewMatrix, projectionMatrix;
// uniform vec3 commentedOut;
out vec2 fragUv;

void main() {
    fragUv = uv;
    gl_Position = projectionMatrix * viewMatrix * modelMatrix * vec4(vertex, 1.0);
}
";

    const FRAGMENT: &str = r"
#version 330 core
in vec2 fragUv;
/* uniform float hidden; */
uniform sampler2D textureSampler;
uniform highp vec3 lightPosition;
uniform mat4 modelMatrix;
uniform float weights[4];
out vec4 color;
void main() { color = texture(textureSampler, fragUv); }
";

    #[test]
    fn test_uniforms_in_declaration_order() {
        let interface = parse_interface(VERTEX, FRAGMENT);
        assert_eq!(
            interface.uniforms,
            vec![
                "modelMatrix",
                "viewMatrix",
                "projectionMatrix",
                "textureSampler",
                "lightPosition",
                "weights",
            ]
        );
    }

    #[test]
    fn test_only_vertex_inputs_are_attributes() {
        let interface = parse_interface(VERTEX, FRAGMENT);
        assert_eq!(interface.attributes, vec!["vertex", "uv", "normal"]);
    }

    #[test]
    fn test_missing_shader_directory() {
        let error = ShaderSource::load("no/such/dir", "basic").unwrap_err();
        assert!(matches!(error, AssetError::NotFound(_)));
    }
}
