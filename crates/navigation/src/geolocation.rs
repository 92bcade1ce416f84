use std::future::Future;
use std::pin::Pin;

use foundation::Position;
use serde::{Deserialize, Serialize};

pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Request knobs understood by the platform geolocation API.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    pub max_age_ms: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WatchId(pub u32);

pub const PERMISSION_DENIED: u16 = 1;
pub const POSITION_UNAVAILABLE: u16 = 2;
pub const TIMEOUT: u16 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum GeolocationError {
    /// No geolocation API on this platform.
    Unavailable,
    PermissionDenied(String),
    PositionUnavailable(String),
    Timeout(String),
}

impl GeolocationError {
    /// Maps a platform error code (1, 2, 3) onto the matching variant.
    /// Unknown codes are treated as an unavailable position.
    pub fn from_code(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            PERMISSION_DENIED => GeolocationError::PermissionDenied(message),
            TIMEOUT => GeolocationError::Timeout(message),
            _ => GeolocationError::PositionUnavailable(message),
        }
    }

    pub fn code(&self) -> Option<u16> {
        match self {
            GeolocationError::Unavailable => None,
            GeolocationError::PermissionDenied(_) => Some(PERMISSION_DENIED),
            GeolocationError::PositionUnavailable(_) => Some(POSITION_UNAVAILABLE),
            GeolocationError::Timeout(_) => Some(TIMEOUT),
        }
    }
}

impl std::fmt::Display for GeolocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeolocationError::Unavailable => write!(f, "Geolocation API not available"),
            GeolocationError::PermissionDenied(m)
            | GeolocationError::PositionUnavailable(m)
            | GeolocationError::Timeout(m) => write!(f, "{m}"),
        }
    }
}

impl std::error::Error for GeolocationError {}

/// Platform geolocation capability.
///
/// One-shot requests are async. Watches are installed synchronously and
/// deliver fixes out of band: the host forwards them to
/// [`crate::PositionService::handle_fix`].
pub trait Geolocation {
    fn is_available(&self) -> bool;

    fn current_position<'a>(
        &'a self,
        options: PositionOptions,
    ) -> LocalBoxFuture<'a, Result<Position, GeolocationError>>;

    fn watch_position(&mut self, options: PositionOptions) -> Result<WatchId, GeolocationError>;

    fn clear_watch(&mut self, id: WatchId);
}

#[cfg(test)]
mod tests {
    use super::GeolocationError;

    #[test]
    fn codes_round_trip() {
        for code in [1, 2, 3] {
            assert_eq!(GeolocationError::from_code(code, "x").code(), Some(code));
        }
        assert_eq!(GeolocationError::Unavailable.code(), None);
        assert_eq!(
            GeolocationError::from_code(1, "User denied Geolocation").to_string(),
            "User denied Geolocation"
        );
    }
}
