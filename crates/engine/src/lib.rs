pub mod chunk;
pub mod config;
pub mod cursors;
pub mod error;
pub mod merge;
pub mod normalize;
pub mod resolver;
pub mod router;
pub mod state;
pub mod sync;
pub mod template;
pub mod windows;
