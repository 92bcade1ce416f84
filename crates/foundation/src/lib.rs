pub mod math;
pub mod position;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use position::*;
pub use time::*;
