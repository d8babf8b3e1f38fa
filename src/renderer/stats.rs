//! Per-frame counters

use crate::resources::RenderQueue;
use std::collections::BTreeMap;
use std::fmt;

/// What the renderer did during one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Visible mesh objects considered for drawing
    pub objects_visited: usize,
    /// Objects rejected by frustum culling
    pub objects_culled: usize,
    /// Submeshes dropped for a missing mesh, material or shader
    pub submeshes_skipped: usize,
    pub draw_calls: usize,
    pub triangles: usize,
    pub program_switches: usize,
    pub material_binds: usize,
    pub blend_changes: usize,
    pub depth_changes: usize,
    pub cull_changes: usize,
    pub buffer_binds: usize,
    /// Draw calls per render queue
    pub queue_draws: BTreeMap<RenderQueue, usize>,
}

impl FrameStats {
    pub fn draws_in_queue(&self, queue: RenderQueue) -> usize {
        self.queue_draws.get(&queue).copied().unwrap_or(0)
    }

    /// Total state changes issued to the backend
    pub fn state_changes(&self) -> usize {
        self.program_switches
            + self.material_binds
            + self.blend_changes
            + self.depth_changes
            + self.cull_changes
    }
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} draws ({} tris), {} visited, {} culled, {} programs, {} materials, {} blend, {} depth",
            self.draw_calls,
            self.triangles,
            self.objects_visited,
            self.objects_culled,
            self.program_switches,
            self.material_binds,
            self.blend_changes,
            self.depth_changes
        )
    }
}
