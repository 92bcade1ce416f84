pub mod layer;
pub mod position;
pub mod raster;
pub mod symbology;
pub mod vector;

pub use layer::*;
