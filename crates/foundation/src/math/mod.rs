pub mod easing;
pub mod geo;
pub mod mercator;
pub mod vec;

pub use easing::*;
pub use geo::*;
pub use mercator::*;
pub use vec::*;
