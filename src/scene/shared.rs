//! Scene graph shared between the UI thread and the preview render thread

use super::graph::SceneGraph;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Cloneable handle to a scene graph behind a read/write lock
#[derive(Debug, Clone, Default)]
pub struct SharedScene {
    inner: Arc<RwLock<SceneGraph>>,
}

impl SharedScene {
    pub fn new(graph: SceneGraph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    /// Shared access for rendering and picking
    pub fn read(&self) -> RwLockReadGuard<'_, SceneGraph> {
        self.inner.read()
    }

    /// Exclusive access for edits
    pub fn write(&self) -> RwLockWriteGuard<'_, SceneGraph> {
        self.inner.write()
    }

    /// Run an edit under the write lock
    pub fn edit<R>(&self, f: impl FnOnce(&mut SceneGraph) -> R) -> R {
        f(&mut self.inner.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Transform;

    #[test]
    fn edits_visible_from_clones() {
        let shared = SharedScene::default();
        let other = shared.clone();
        let id = shared
            .edit(|graph| graph.add_empty("group", Transform::IDENTITY, None))
            .unwrap();

        let handle = std::thread::spawn(move || other.read().contains(id));
        assert!(handle.join().unwrap());
    }
}
