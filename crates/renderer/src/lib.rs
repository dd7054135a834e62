//! Renderer crate for panedit, the two-pane shader edit window.
//!
//! Each pane clears to its own background colour and draws a single triangle
//! with its own shader program. The overall flow is:
//!
//! ```text
//!   panedit CLI
//!        │ EditWindowConfig
//!        ▼
//!   Renderer::run ──▶ winit event loop ──▶ EditWindow ──▶ PaneState × 2
//!                          │                   │
//!                          │                   └─▶ GraphicsApi (WgpuGraphics)
//!                          └─▶ AboutToWait ──▶ render_timeout()
//! ```
//!
//! `EditWindow` holds the lifecycle and pacing logic and never touches winit
//! or wgpu directly; `window` forwards events into it and `gpu` implements
//! [`GraphicsApi`] on top of wgpu. Renders are debounced per pane, and after a
//! resize a periodic timer requests catch-up repaints once the window settles.

mod compile;
mod edit;
mod gpu;
mod graphics;
mod pane;
mod shaders;
#[cfg(test)]
mod testing;
mod types;
mod window;

use anyhow::Result;

pub use edit::EditWindow;
pub use graphics::{ContextError, GraphicsApi, ProgramId, ShaderId, ShaderStage, VertexArrayId};
pub use pane::{PaneState, RenderOutcome};
pub use types::{EditWindowConfig, PaneSpec, ShaderCompiler, ShaderSource};

/// Entry point that owns the window configuration.
pub struct Renderer {
    config: EditWindowConfig,
}

impl Renderer {
    pub fn new(config: EditWindowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EditWindowConfig {
        &self.config
    }

    /// Opens the window and blocks until it is closed.
    pub fn run(self) -> Result<()> {
        window::run(self.config)
    }
}
