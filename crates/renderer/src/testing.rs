//! Recording [`GraphicsApi`] used by unit tests.

use std::collections::{BTreeMap, BTreeSet};

use scheduler::PaneId;

use crate::graphics::{
    ContextError, GraphicsApi, ProgramId, ShaderId, ShaderStage, VertexArrayId,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    MakeCurrent(PaneId),
    CreateShader(ShaderStage),
    ShaderSource(ShaderId, String),
    CompileShader(ShaderId),
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    AttachShader(ProgramId, ShaderId),
    DetachShader(ProgramId, ShaderId),
    LinkProgram(ProgramId),
    DeleteProgram(ProgramId),
    CreateVertexArray(VertexArrayId),
    BindVertexArray(Option<VertexArrayId>),
    DeleteVertexArray(VertexArrayId),
    ClearColor([f32; 4]),
    UseProgram(Option<ProgramId>),
    DrawTriangles(u32, u32),
    Flush,
}

/// Compiles anything without an `#error` directive and links unless told not to.
pub(crate) struct RecordingGraphics {
    calls: Vec<Call>,
    next_id: u32,
    shaders: BTreeMap<ShaderId, String>,
    programs: BTreeSet<ProgramId>,
    vertex_arrays: BTreeSet<VertexArrayId>,
    context_errors: BTreeMap<PaneId, String>,
    fail_links: bool,
}

impl RecordingGraphics {
    pub(crate) fn new() -> Self {
        Self {
            calls: Vec::new(),
            next_id: 0,
            shaders: BTreeMap::new(),
            programs: BTreeSet::new(),
            vertex_arrays: BTreeSet::new(),
            context_errors: BTreeMap::new(),
            fail_links: false,
        }
    }

    pub(crate) fn fail_links(&mut self, fail: bool) {
        self.fail_links = fail;
    }

    pub(crate) fn set_context_error(&mut self, pane: PaneId, message: &str) {
        self.context_errors.insert(pane, message.to_string());
    }

    pub(crate) fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub(crate) fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub(crate) fn live_shaders(&self) -> Vec<ShaderId> {
        self.shaders.keys().copied().collect()
    }

    pub(crate) fn live_programs(&self) -> Vec<ProgramId> {
        self.programs.iter().copied().collect()
    }

    pub(crate) fn live_vertex_arrays(&self) -> Vec<VertexArrayId> {
        self.vertex_arrays.iter().copied().collect()
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl GraphicsApi for RecordingGraphics {
    fn make_current(&mut self, pane: PaneId) -> Result<(), ContextError> {
        self.calls.push(Call::MakeCurrent(pane));
        match self.context_error(pane) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn context_error(&self, pane: PaneId) -> Option<ContextError> {
        self.context_errors
            .get(&pane)
            .map(|message| ContextError(message.clone()))
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Option<ShaderId> {
        self.calls.push(Call::CreateShader(stage));
        let id = ShaderId::new(self.allocate())?;
        self.shaders.insert(id, String::new());
        Some(id)
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        self.calls.push(Call::ShaderSource(shader, source.to_string()));
        if let Some(slot) = self.shaders.get_mut(&shader) {
            *slot = source.to_string();
        }
    }

    fn compile_shader(&mut self, shader: ShaderId) -> bool {
        self.calls.push(Call::CompileShader(shader));
        self.shaders
            .get(&shader)
            .is_some_and(|source| !source.contains("#error"))
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        format!("0:1: error: shader {} rejected", shader.get())
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.calls.push(Call::DeleteShader(shader));
        self.shaders.remove(&shader);
    }

    fn create_program(&mut self) -> Option<ProgramId> {
        let id = ProgramId::new(self.allocate())?;
        self.calls.push(Call::CreateProgram(id));
        self.programs.insert(id);
        Some(id)
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        self.calls.push(Call::AttachShader(program, shader));
    }

    fn detach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        self.calls.push(Call::DetachShader(program, shader));
    }

    fn link_program(&mut self, program: ProgramId) -> bool {
        self.calls.push(Call::LinkProgram(program));
        !self.fail_links
    }

    fn program_info_log(&self, _program: ProgramId) -> String {
        "error: varying mismatch".to_string()
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.calls.push(Call::DeleteProgram(program));
        self.programs.remove(&program);
    }

    fn create_vertex_array(&mut self) -> Option<VertexArrayId> {
        let id = VertexArrayId::new(self.allocate())?;
        self.calls.push(Call::CreateVertexArray(id));
        self.vertex_arrays.insert(id);
        Some(id)
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.calls.push(Call::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.calls.push(Call::DeleteVertexArray(vertex_array));
        self.vertex_arrays.remove(&vertex_array);
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        self.calls.push(Call::ClearColor(rgba));
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.calls.push(Call::UseProgram(program));
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        self.calls.push(Call::DrawTriangles(first, count));
    }

    fn flush(&mut self) {
        self.calls.push(Call::Flush);
    }
}
