pub mod classify;
pub mod config;
pub mod geo;
pub mod render;
pub mod text;
pub mod transit;
pub mod types;

// Keep the public surface small and intentional.
pub use classify::*;
pub use config::*;
pub use geo::*;
pub use render::*;
pub use text::*;
pub use transit::*;
pub use types::*;
