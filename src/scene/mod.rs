//! Scene management

mod bounds;
mod camera;
mod events;
mod frustum;
mod graph;
mod object;
mod ray;
mod shared;
mod transform;

pub use bounds::*;
pub use camera::*;
pub use events::SceneEvent;
pub use frustum::*;
pub use graph::*;
pub use object::*;
pub use ray::*;
pub use shared::*;
pub use transform::*;
