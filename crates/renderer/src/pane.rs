use std::time::Instant;

use scheduler::{FrameGate, PaneId};
use tracing::{debug, trace};

use crate::compile::build_program;
use crate::graphics::{GraphicsApi, ProgramId, VertexArrayId};
use crate::types::PaneSpec;

/// Result of a render callback, mirroring the toolkit's "handled" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Handled,
    Declined,
}

/// Owning record for one pane's GPU resources and render clock.
#[derive(Debug)]
pub struct PaneState {
    id: PaneId,
    spec: PaneSpec,
    program: Option<ProgramId>,
    vertex_array: Option<VertexArrayId>,
    gate: FrameGate,
}

impl PaneState {
    pub fn new(id: PaneId, spec: PaneSpec, gate: FrameGate) -> Self {
        Self {
            id,
            spec,
            program: None,
            vertex_array: None,
            gate,
        }
    }

    pub fn id(&self) -> PaneId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.spec.label
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    pub fn vertex_array(&self) -> Option<VertexArrayId> {
        self.vertex_array
    }

    pub fn last_render(&self) -> Option<Instant> {
        self.gate.last_render()
    }

    /// Builds the pane's program and vertex array.
    ///
    /// Leaves the pane inert when its context reports an error. A failed
    /// program build still allocates the vertex array.
    pub fn realize<G>(&mut self, gfx: &mut G)
    where
        G: GraphicsApi + ?Sized,
    {
        if let Err(err) = gfx.make_current(self.id) {
            debug!(pane = %self.spec.label, "skipping realize: {err}");
            return;
        }

        self.program = build_program(gfx, &self.spec.vertex_shader, &self.spec.fragment_shader);

        self.vertex_array = gfx.create_vertex_array();
        gfx.bind_vertex_array(self.vertex_array);

        debug!(
            pane = %self.spec.label,
            vertex = %self.spec.vertex_shader,
            fragment = %self.spec.fragment_shader,
            program = ?self.program.map(ProgramId::get),
            vertex_array = ?self.vertex_array.map(VertexArrayId::get),
            "pane realized"
        );
    }

    /// Releases this pane's program and vertex array, and nothing else.
    pub fn unrealize<G>(&mut self, gfx: &mut G)
    where
        G: GraphicsApi + ?Sized,
    {
        if let Err(err) = gfx.make_current(self.id) {
            debug!(pane = %self.spec.label, "skipping unrealize: {err}");
            return;
        }

        if let Some(vertex_array) = self.vertex_array.take() {
            gfx.delete_vertex_array(vertex_array);
        }
        if let Some(program) = self.program.take() {
            gfx.delete_program(program);
        }
        debug!(pane = %self.spec.label, "pane unrealized");
    }

    /// Clears to the background colour and draws the triangle, at most once
    /// per render interval.
    pub fn render<G>(&mut self, gfx: &mut G, now: Instant) -> RenderOutcome
    where
        G: GraphicsApi + ?Sized,
    {
        if gfx.context_error(self.id).is_some() {
            return RenderOutcome::Declined;
        }

        if !self.gate.admit(now) {
            trace!(pane = %self.spec.label, "render debounced");
            return RenderOutcome::Declined;
        }

        gfx.clear_color(self.spec.background);

        if let Some(program) = self.program {
            gfx.use_program(Some(program));
            gfx.draw_triangles(0, 3);
        }

        RenderOutcome::Handled
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::{Call, RecordingGraphics};
    use crate::types::ShaderSource;

    fn spec(fragment: &'static str) -> PaneSpec {
        PaneSpec {
            label: "left".into(),
            vertex_shader: ShaderSource::Embedded {
                name: "v",
                source: "void main() {}",
            },
            fragment_shader: ShaderSource::Embedded {
                name: "f",
                source: fragment,
            },
            background: [1.0, 0.0, 0.0, 1.0],
        }
    }

    fn pane(fragment: &'static str) -> PaneState {
        PaneState::new(
            PaneId::LEFT,
            spec(fragment),
            FrameGate::new(Duration::from_millis(40)),
        )
    }

    #[test]
    fn realize_builds_program_and_vertex_array() {
        let mut gfx = RecordingGraphics::new();
        let mut state = pane("void main() {}");
        state.realize(&mut gfx);

        let program = state.program().expect("program");
        let vertex_array = state.vertex_array().expect("vertex array");
        assert_eq!(gfx.live_programs(), vec![program]);
        assert_eq!(gfx.live_vertex_arrays(), vec![vertex_array]);
        assert!(gfx
            .calls()
            .contains(&Call::BindVertexArray(Some(vertex_array))));
    }

    #[test]
    fn realize_with_context_error_leaves_pane_inert() {
        let mut gfx = RecordingGraphics::new();
        gfx.set_context_error(PaneId::LEFT, "no GL 3.2 core profile");
        let mut state = pane("void main() {}");
        state.realize(&mut gfx);

        assert!(state.program().is_none());
        assert!(state.vertex_array().is_none());
        assert_eq!(gfx.calls(), &[Call::MakeCurrent(PaneId::LEFT)]);
    }

    #[test]
    fn unrealize_releases_both_handles() {
        let mut gfx = RecordingGraphics::new();
        let mut state = pane("void main() {}");
        state.realize(&mut gfx);
        state.unrealize(&mut gfx);

        assert!(state.program().is_none());
        assert!(state.vertex_array().is_none());
        assert!(gfx.live_programs().is_empty());
        assert!(gfx.live_vertex_arrays().is_empty());
    }

    #[test]
    fn unrealize_with_context_error_keeps_resources() {
        let mut gfx = RecordingGraphics::new();
        let mut state = pane("void main() {}");
        state.realize(&mut gfx);
        gfx.set_context_error(PaneId::LEFT, "context lost");
        state.unrealize(&mut gfx);

        assert!(state.program().is_some());
        assert_eq!(gfx.live_programs().len(), 1);
    }

    #[test]
    fn render_is_debounced() {
        let mut gfx = RecordingGraphics::new();
        let mut state = pane("void main() {}");
        state.realize(&mut gfx);
        gfx.clear_calls();

        let start = Instant::now();
        assert_eq!(state.render(&mut gfx, start), RenderOutcome::Handled);
        let program = state.program();
        assert_eq!(
            gfx.calls(),
            &[
                Call::ClearColor([1.0, 0.0, 0.0, 1.0]),
                Call::UseProgram(program),
                Call::DrawTriangles(0, 3),
            ]
        );

        gfx.clear_calls();
        let soon = start + Duration::from_millis(20);
        assert_eq!(state.render(&mut gfx, soon), RenderOutcome::Declined);
        assert!(gfx.calls().is_empty());
        assert_eq!(state.last_render(), Some(start));

        let later = start + Duration::from_millis(40);
        assert_eq!(state.render(&mut gfx, later), RenderOutcome::Handled);
        assert_eq!(state.last_render(), Some(later));
    }

    #[test]
    fn render_declines_on_context_error() {
        let mut gfx = RecordingGraphics::new();
        let mut state = pane("void main() {}");
        state.realize(&mut gfx);
        gfx.set_context_error(PaneId::LEFT, "device lost");
        gfx.clear_calls();

        assert_eq!(state.render(&mut gfx, Instant::now()), RenderOutcome::Declined);
        assert!(gfx.calls().is_empty());
        assert!(state.last_render().is_none());
    }

    #[test]
    fn failed_program_still_clears_without_drawing() {
        let mut gfx = RecordingGraphics::new();
        let mut state = pane("#error broken");
        state.realize(&mut gfx);
        assert!(state.program().is_none());
        assert!(state.vertex_array().is_some());
        gfx.clear_calls();

        assert_eq!(state.render(&mut gfx, Instant::now()), RenderOutcome::Handled);
        assert_eq!(gfx.calls(), &[Call::ClearColor([1.0, 0.0, 0.0, 1.0])]);
    }
}
