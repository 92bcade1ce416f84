pub mod access;
pub mod geolocation;
pub mod mock;
pub mod orientation;
pub mod platform;
pub mod position;
pub mod simulator;

pub use access::*;
pub use geolocation::*;
pub use orientation::*;
pub use platform::*;
pub use position::*;
pub use simulator::*;
