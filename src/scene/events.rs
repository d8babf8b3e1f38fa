//! Change notifications emitted by the scene graph

use super::object::ObjectId;

/// A change to the scene graph, queued until [`SceneGraph::drain_events`](super::SceneGraph::drain_events)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    Added(ObjectId),
    /// Emitted for every object of a removed subtree, children first
    Removed(ObjectId),
    Reparented {
        object: ObjectId,
        old_parent: Option<ObjectId>,
        new_parent: Option<ObjectId>,
    },
    Reordered(ObjectId),
    /// The object's local transform was replaced or edited
    TransformChanged(ObjectId),
    VisibilityChanged(ObjectId),
    /// The cached world bounds of the object changed
    BoundsChanged(ObjectId),
}

impl SceneEvent {
    pub fn object(&self) -> ObjectId {
        match *self {
            SceneEvent::Added(id)
            | SceneEvent::Removed(id)
            | SceneEvent::Reordered(id)
            | SceneEvent::TransformChanged(id)
            | SceneEvent::VisibilityChanged(id)
            | SceneEvent::BoundsChanged(id) => id,
            SceneEvent::Reparented { object, .. } => object,
        }
    }
}

#[derive(Debug)]
pub(crate) struct EventQueue {
    events: Vec<SceneEvent>,
    enabled: bool,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            enabled: true,
        }
    }
}

impl EventQueue {
    pub fn push(&mut self, event: SceneEvent) {
        if self.enabled {
            self.events.push(event);
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.events.clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn drain(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
