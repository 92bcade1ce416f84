pub mod animator;
pub mod config;
pub mod fade;
pub mod flight;
pub mod view;

pub use animator::*;
pub use config::*;
pub use fade::*;
pub use flight::*;
pub use view::*;
