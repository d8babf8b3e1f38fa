//! Backend abstraction layer
//!
//! Provides the trait the renderer drives and a recording implementation for
//! headless use.

pub mod recording;
pub mod traits;
pub mod types;

pub use recording::*;
pub use traits::*;
pub use types::*;
