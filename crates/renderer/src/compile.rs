use tracing::warn;

use crate::graphics::{GraphicsApi, ProgramId, ShaderId, ShaderStage};
use crate::types::ShaderSource;

/// Creates and compiles a single shader stage.
///
/// On failure the driver log is emitted as a warning, the shader object is
/// released and `None` is returned. Never propagates an error.
pub(crate) fn create_shader<G>(gfx: &mut G, stage: ShaderStage, source: &str) -> Option<ShaderId>
where
    G: GraphicsApi + ?Sized,
{
    let shader = gfx.create_shader(stage)?;
    gfx.shader_source(shader, source);

    if !gfx.compile_shader(shader) {
        let log = gfx.shader_info_log(shader);
        warn!(%stage, "compile failure in {stage} shader:\n{log}");
        gfx.delete_shader(shader);
        return None;
    }

    Some(shader)
}

/// Loads both sources, compiles them and links the result into a program.
///
/// The fragment source is not touched when the vertex stage fails. Both
/// shader objects are deleted before returning, whether linking succeeded or
/// not; on success they are detached first.
pub(crate) fn build_program<G>(
    gfx: &mut G,
    vertex_source: &ShaderSource,
    fragment_source: &ShaderSource,
) -> Option<ProgramId>
where
    G: GraphicsApi + ?Sized,
{
    let vertex = compile_from(gfx, ShaderStage::Vertex, vertex_source)?;

    let Some(fragment) = compile_from(gfx, ShaderStage::Fragment, fragment_source) else {
        gfx.delete_shader(vertex);
        return None;
    };

    let program = link(gfx, vertex, fragment);

    gfx.delete_shader(vertex);
    gfx.delete_shader(fragment);

    program
}

fn compile_from<G>(gfx: &mut G, stage: ShaderStage, source: &ShaderSource) -> Option<ShaderId>
where
    G: GraphicsApi + ?Sized,
{
    let text = match source.load() {
        Ok(text) => text,
        Err(err) => {
            warn!(%stage, source = %source, "failed to read {stage} shader source: {err}");
            return None;
        }
    };
    create_shader(gfx, stage, &text)
}

fn link<G>(gfx: &mut G, vertex: ShaderId, fragment: ShaderId) -> Option<ProgramId>
where
    G: GraphicsApi + ?Sized,
{
    let program = gfx.create_program()?;
    gfx.attach_shader(program, vertex);
    gfx.attach_shader(program, fragment);

    if !gfx.link_program(program) {
        let log = gfx.program_info_log(program);
        warn!("linking failure:\n{log}");
        gfx.delete_program(program);
        return None;
    }

    gfx.detach_shader(program, vertex);
    gfx.detach_shader(program, fragment);
    Some(program)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::testing::{Call, RecordingGraphics};

    fn embedded(source: &'static str) -> ShaderSource {
        ShaderSource::Embedded {
            name: "test",
            source,
        }
    }

    #[test]
    fn failed_compile_releases_shader() {
        let mut gfx = RecordingGraphics::new();
        let shader = create_shader(&mut gfx, ShaderStage::Vertex, "#error broken");
        assert!(shader.is_none());
        assert!(gfx.live_shaders().is_empty());
        assert!(gfx
            .calls()
            .iter()
            .any(|call| matches!(call, Call::DeleteShader(_))));
    }

    #[test]
    fn successful_build_detaches_and_deletes_shaders() {
        let mut gfx = RecordingGraphics::new();
        let program = build_program(&mut gfx, &embedded("void main() {}"), &embedded("void main() {}"))
            .expect("program");

        assert!(gfx.live_programs().contains(&program));
        assert!(gfx.live_shaders().is_empty());
        let detaches = gfx
            .calls()
            .iter()
            .filter(|call| matches!(call, Call::DetachShader(..)))
            .count();
        assert_eq!(detaches, 2);
    }

    #[test]
    fn vertex_failure_skips_fragment_stage() {
        let mut gfx = RecordingGraphics::new();
        let program = build_program(
            &mut gfx,
            &embedded("#error vertex"),
            &ShaderSource::File("/never/read.frag".into()),
        );
        assert!(program.is_none());
        assert_eq!(
            gfx.calls()
                .iter()
                .filter(|call| matches!(call, Call::CreateShader(_)))
                .count(),
            1
        );
        assert!(gfx.live_shaders().is_empty());
    }

    #[test]
    fn fragment_failure_releases_vertex_shader() {
        let mut gfx = RecordingGraphics::new();
        let program = build_program(&mut gfx, &embedded("void main() {}"), &embedded("#error frag"));
        assert!(program.is_none());
        assert!(gfx.live_shaders().is_empty());
        assert!(gfx.live_programs().is_empty());
        assert!(!gfx
            .calls()
            .iter()
            .any(|call| matches!(call, Call::CreateProgram(_))));
    }

    #[test]
    fn link_failure_deletes_program_and_shaders() {
        let mut gfx = RecordingGraphics::new();
        gfx.fail_links(true);
        let program = build_program(&mut gfx, &embedded("void main() {}"), &embedded("void main() {}"));
        assert!(program.is_none());
        assert!(gfx.live_programs().is_empty());
        assert!(gfx.live_shaders().is_empty());
        assert!(!gfx
            .calls()
            .iter()
            .any(|call| matches!(call, Call::DetachShader(..))));
    }

    #[test]
    fn reads_sources_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let vertex = dir.path().join("pane.vert");
        let fragment = dir.path().join("pane.frag");
        fs::write(&vertex, "void main() {}").unwrap();
        fs::write(&fragment, "#error not today").unwrap();

        let mut gfx = RecordingGraphics::new();
        let program = build_program(
            &mut gfx,
            &ShaderSource::File(vertex),
            &ShaderSource::File(fragment),
        );
        assert!(program.is_none());
        assert!(gfx
            .calls()
            .iter()
            .any(|call| matches!(call, Call::ShaderSource(_, text) if text == "#error not today")));
    }

    #[test]
    fn unreadable_source_counts_as_compile_failure() {
        let mut gfx = RecordingGraphics::new();
        let program = build_program(
            &mut gfx,
            &ShaderSource::File("/missing/pane.vert".into()),
            &embedded("void main() {}"),
        );
        assert!(program.is_none());
        assert!(gfx.calls().is_empty());
    }
}
