//! GL-flavoured command surface shared by the pane lifecycle and the GPU
//! backends.
//!
//! The pane code only talks to [`GraphicsApi`]; the `wgpu` implementation lives
//! in `gpu::backend` and tests drive a recording fake. Object handles are
//! non-zero ids, so "no handle" is spelled `None` rather than `0`.

use std::fmt;
use std::num::NonZeroU32;

use scheduler::PaneId;

/// Shader pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU32);

        impl $name {
            pub fn new(raw: u32) -> Option<Self> {
                NonZeroU32::new(raw).map(Self)
            }

            pub fn get(self) -> u32 {
                self.0.get()
            }
        }
    };
}

object_id!(
    /// Compiled (or compiling) shader object.
    ShaderId
);
object_id!(
    /// Program object: attached shader stages plus the linked pipeline.
    ProgramId
);
object_id!(
    /// Vertex-array object describing the vertex input state.
    VertexArrayId
);

/// Error latched by a pane's graphics context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("graphics context error: {0}")]
pub struct ContextError(pub String);

/// Minimal set of graphics operations the edit panes rely on.
///
/// Calls between [`make_current`](GraphicsApi::make_current) and
/// [`flush`](GraphicsApi::flush) target the current pane. Deleting an unknown
/// handle is a no-op, matching GL semantics.
pub trait GraphicsApi {
    /// Selects the pane whose context receives subsequent commands.
    fn make_current(&mut self, pane: PaneId) -> Result<(), ContextError>;

    /// Reports the error latched on the pane's context, if any.
    fn context_error(&self, pane: PaneId) -> Option<ContextError>;

    fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId>;
    fn shader_source(&mut self, shader: ShaderId, source: &str);
    /// Compiles the shader's source; returns the compile status.
    fn compile_shader(&mut self, shader: ShaderId) -> bool;
    fn shader_info_log(&self, shader: ShaderId) -> String;
    fn delete_shader(&mut self, shader: ShaderId);

    fn create_program(&mut self) -> Option<ProgramId>;
    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId);
    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId);
    /// Links the attached stages; returns the link status.
    fn link_program(&mut self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;
    fn delete_program(&mut self, program: ProgramId);

    fn create_vertex_array(&mut self) -> Option<VertexArrayId>;
    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>);
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId);

    fn clear_color(&mut self, rgba: [f32; 4]);
    fn use_program(&mut self, program: Option<ProgramId>);
    /// Draws `count` vertices starting at `first` as a triangle list.
    fn draw_triangles(&mut self, first: u32, count: u32);

    /// Submits whatever the current pane recorded since it was made current.
    fn flush(&mut self);
}
