pub mod app;
pub mod config;
pub mod locale;
pub mod prefs;
pub mod route;
pub mod store;
pub mod window;

pub use app::*;
pub use config::*;
pub use locale::*;
pub use prefs::*;
pub use route::*;
pub use store::*;
pub use window::*;
