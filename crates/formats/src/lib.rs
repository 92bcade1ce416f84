pub mod geojson;
pub mod search;
pub mod select;

pub use geojson::*;
pub use search::*;
pub use select::*;
