use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

use paneconfig::{EditConfig, PaneSection, PANE_COUNT};
use scheduler::{Pacing, PaneId};

use crate::shaders;

/// Where a shader stage's GLSL text comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShaderSource {
    /// Read from disk, whole file, every time the pane realizes.
    File(PathBuf),
    /// Compiled into the binary.
    Embedded {
        name: &'static str,
        source: &'static str,
    },
}

impl ShaderSource {
    pub fn load(&self) -> std::io::Result<Cow<'_, str>> {
        match self {
            ShaderSource::File(path) => std::fs::read_to_string(path).map(Cow::Owned),
            ShaderSource::Embedded { source, .. } => Ok(Cow::Borrowed(source)),
        }
    }
}

impl fmt::Display for ShaderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderSource::File(path) => write!(f, "{}", path.display()),
            ShaderSource::Embedded { name, .. } => write!(f, "builtin:{name}"),
        }
    }
}

/// Everything a pane needs to realize and render.
#[derive(Clone, Debug, PartialEq)]
pub struct PaneSpec {
    pub label: String,
    pub vertex_shader: ShaderSource,
    pub fragment_shader: ShaderSource,
    pub background: [f32; 4],
}

impl PaneSpec {
    /// Resolves a config section, falling back to the pane's built-in shader
    /// pair for any stage left unset.
    pub fn from_section(pane: PaneId, section: &PaneSection) -> Self {
        let (builtin_vertex, builtin_fragment) = shaders::builtin_sources(pane);
        Self {
            label: section.label.clone(),
            vertex_shader: section
                .vertex_shader
                .clone()
                .map(ShaderSource::File)
                .unwrap_or(builtin_vertex),
            fragment_shader: section
                .fragment_shader
                .clone()
                .map(ShaderSource::File)
                .unwrap_or(builtin_fragment),
            background: section.background.components(),
        }
    }
}

/// Shader compilation backend requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderCompiler {
    /// Compile GLSL through shaderc into SPIR-V.
    Shaderc,
    /// Hand GLSL to naga's built-in frontend.
    NagaGlsl,
}

impl Default for ShaderCompiler {
    fn default() -> Self {
        if cfg!(feature = "shaderc") {
            ShaderCompiler::Shaderc
        } else {
            ShaderCompiler::NagaGlsl
        }
    }
}

impl fmt::Display for ShaderCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderCompiler::Shaderc => f.write_str("shaderc"),
            ShaderCompiler::NagaGlsl => f.write_str("naga"),
        }
    }
}

/// Immutable configuration handed to the edit window at construction.
#[derive(Clone, Debug)]
pub struct EditWindowConfig {
    /// Window title.
    pub title: String,
    /// Initial inner size in physical pixels.
    pub surface_size: (u32, u32),
    /// Render gate, configure settle and repaint timer intervals.
    pub pacing: Pacing,
    /// Left and right pane, in layout order.
    pub panes: [PaneSpec; PANE_COUNT],
    /// Shader compiler used by the GPU backend.
    pub shader_compiler: ShaderCompiler,
}

impl EditWindowConfig {
    pub fn from_config(config: &EditConfig, shader_compiler: ShaderCompiler) -> Self {
        let sections = config.resolved_panes();
        Self {
            title: config.window.title.clone(),
            surface_size: (config.window.width, config.window.height),
            pacing: Pacing::from_config(&config.timing),
            panes: PaneId::ALL.map(|pane| PaneSpec::from_section(pane, &sections[pane.index()])),
            shader_compiler,
        }
    }
}

impl Default for EditWindowConfig {
    fn default() -> Self {
        Self::from_config(&EditConfig::default(), ShaderCompiler::default())
    }
}
