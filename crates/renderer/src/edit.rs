//! The two-pane edit window, independent of any windowing system.
//!
//! `window.rs` forwards winit events into the callbacks below; tests call them
//! directly with a recording graphics backend and synthetic timestamps.

use std::time::Instant;

use paneconfig::PANE_COUNT;
use scheduler::{PaneId, Scheduler};
use tracing::trace;

use crate::graphics::GraphicsApi;
use crate::pane::{PaneState, RenderOutcome};
use crate::types::EditWindowConfig;

pub struct EditWindow {
    panes: [PaneState; PANE_COUNT],
    scheduler: Scheduler,
    pending: [bool; PANE_COUNT],
}

impl EditWindow {
    pub fn new(config: &EditWindowConfig, now: Instant) -> Self {
        let scheduler = Scheduler::new(config.pacing, now);
        let panes = PaneId::ALL.map(|pane| {
            PaneState::new(
                pane,
                config.panes[pane.index()].clone(),
                scheduler.frame_gate(),
            )
        });
        Self {
            panes,
            scheduler,
            pending: [false; PANE_COUNT],
        }
    }

    pub fn pane(&self, pane: PaneId) -> &PaneState {
        &self.panes[pane.index()]
    }

    pub fn panes(&self) -> &[PaneState; PANE_COUNT] {
        &self.panes
    }

    pub fn realize<G>(&mut self, pane: PaneId, gfx: &mut G)
    where
        G: GraphicsApi + ?Sized,
    {
        self.panes[pane.index()].realize(gfx);
    }

    pub fn unrealize<G>(&mut self, pane: PaneId, gfx: &mut G)
    where
        G: GraphicsApi + ?Sized,
    {
        self.panes[pane.index()].unrealize(gfx);
    }

    /// Resize notification. Only records the settle deadline; the event keeps
    /// propagating to the caller.
    pub fn configure(&mut self, now: Instant) {
        self.scheduler.configure(now);
        trace!(deadline = ?self.scheduler.configure_deadline(), "window configured");
    }

    /// Both pane targets were reallocated and lost their content. Queues both
    /// panes and records a configure, so a paint the debounce declines now is
    /// caught up by the timer once the settle window has passed.
    pub fn invalidate(&mut self, now: Instant) {
        self.configure(now);
        for pane in PaneId::ALL {
            self.queue_repaint(pane);
        }
    }

    /// Marks a pane for repaint. Returns `false` when a request was already
    /// outstanding for it.
    pub fn queue_repaint(&mut self, pane: PaneId) -> bool {
        let slot = &mut self.pending[pane.index()];
        let newly_queued = !*slot;
        *slot = true;
        newly_queued
    }

    pub fn has_pending(&self) -> bool {
        self.pending.iter().any(|pending| *pending)
    }

    /// Drains outstanding repaint requests in pane order.
    pub fn take_pending(&mut self) -> Vec<PaneId> {
        PaneId::ALL
            .into_iter()
            .filter(|pane| std::mem::take(&mut self.pending[pane.index()]))
            .collect()
    }

    /// Paint cycle for one pane: make its context current, run the render
    /// callback, and submit if it handled the frame.
    pub fn paint<G>(&mut self, pane: PaneId, gfx: &mut G, now: Instant) -> RenderOutcome
    where
        G: GraphicsApi + ?Sized,
    {
        if gfx.make_current(pane).is_err() {
            return RenderOutcome::Declined;
        }
        let outcome = self.panes[pane.index()].render(gfx, now);
        if outcome == RenderOutcome::Handled {
            gfx.flush();
        }
        outcome
    }

    /// Periodic driver. Queues a repaint for every pane whose last render
    /// predates the configure deadline and returns the newly queued panes.
    pub fn render_timeout(&mut self, now: Instant) -> Vec<PaneId> {
        let last_renders = self.panes.each_ref().map(|pane| (pane.id(), pane.last_render()));
        let due = self.scheduler.tick(now, last_renders);
        due.into_iter()
            .filter(|pane| self.queue_repaint(*pane))
            .collect()
    }

    /// When the event loop should wake up for the next timer tick.
    pub fn next_timer_deadline(&self) -> Instant {
        self.scheduler.next_deadline()
    }
}
