//! Built-in GLSL used when a pane's config leaves a stage unset.
//!
//! Both vertex shaders position the triangle from `gl_VertexIndex`; no vertex
//! buffer is ever bound.

use scheduler::PaneId;

use crate::types::ShaderSource;

const PANE0_VERTEX: &str = r"#version 450

const vec2 positions[3] = vec2[3](
    vec2(-0.6, -0.6),
    vec2(0.6, -0.6),
    vec2(0.0, 0.6)
);

void main() {
    gl_Position = vec4(positions[gl_VertexIndex], 0.0, 1.0);
}
";

const PANE0_FRAGMENT: &str = r"#version 450
layout(location = 0) out vec4 outColor;

void main() {
    outColor = vec4(1.0, 1.0, 1.0, 1.0);
}
";

const PANE1_VERTEX: &str = r"#version 450
layout(location = 0) out vec3 v_color;

const vec2 positions[3] = vec2[3](
    vec2(-0.6, -0.6),
    vec2(0.6, -0.6),
    vec2(0.0, 0.6)
);

const vec3 colors[3] = vec3[3](
    vec3(1.0, 0.0, 0.0),
    vec3(0.0, 1.0, 0.0),
    vec3(1.0, 1.0, 0.0)
);

void main() {
    v_color = colors[gl_VertexIndex];
    gl_Position = vec4(positions[gl_VertexIndex], 0.0, 1.0);
}
";

const PANE1_FRAGMENT: &str = r"#version 450
layout(location = 0) in vec3 v_color;
layout(location = 0) out vec4 outColor;

void main() {
    outColor = vec4(v_color, 1.0);
}
";

/// Vertex and fragment source for the given pane.
pub(crate) fn builtin_sources(pane: PaneId) -> (ShaderSource, ShaderSource) {
    if pane == PaneId::LEFT {
        (
            ShaderSource::Embedded {
                name: "pane0.vert",
                source: PANE0_VERTEX,
            },
            ShaderSource::Embedded {
                name: "pane0.frag",
                source: PANE0_FRAGMENT,
            },
        )
    } else {
        (
            ShaderSource::Embedded {
                name: "pane1.vert",
                source: PANE1_VERTEX,
            },
            ShaderSource::Embedded {
                name: "pane1.frag",
                source: PANE1_FRAGMENT,
            },
        )
    }
}

/// Full-screen triangle used by the compositor to blit a pane target.
pub(crate) const COMPOSITE_VERTEX: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    vec2 pos = positions[gl_VertexIndex];
    v_uv = vec2(pos.x * 0.5 + 0.5, 0.5 - pos.y * 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

pub(crate) const COMPOSITE_FRAGMENT: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(set = 0, binding = 0) uniform texture2D pane_texture;
layout(set = 0, binding = 1) uniform sampler pane_sampler;

void main() {
    outColor = texture(sampler2D(pane_texture, pane_sampler), v_uv);
}
";
