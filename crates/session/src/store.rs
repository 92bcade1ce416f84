use foundation::Position;
use navigation::{AccessDecision, HeadingSample};
use serde::Serialize;

use crate::route::Route;

/// Caller-driven GPS availability; the type itself enforces no ordering.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub enum GpsState {
    #[default]
    Disabled,
    Enabled,
    Tracking,
}

/// Application-wide UI state mirrored to the shell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppStore {
    pub dark_enabled: bool,
    pub home_page: bool,
    pub gps: GpsState,
    pub access: Option<AccessDecision>,
    pub position: Option<Position>,
    pub heading: Option<HeadingSample>,
    pub locale: String,
}

impl Default for AppStore {
    fn default() -> Self {
        Self {
            dark_enabled: true,
            home_page: true,
            gps: GpsState::Disabled,
            access: None,
            position: None,
            heading: None,
            locale: crate::locale::FALLBACK_LOCALE.to_string(),
        }
    }
}

impl AppStore {
    pub fn set_dark_enabled(&mut self, value: bool) {
        self.dark_enabled = value;
    }

    pub fn toggle_dark_enabled(&mut self) -> bool {
        self.dark_enabled = !self.dark_enabled;
        self.dark_enabled
    }

    /// Applies route-derived flags and returns the dark-mode decision.
    pub fn update_from_route(&mut self, route: &Route) -> bool {
        self.home_page = route.is_home();
        self.dark_enabled = route.wants_dark_map();
        self.dark_enabled
    }

    pub fn has_gps_access(&self) -> bool {
        self.access.as_ref().is_some_and(AccessDecision::is_granted)
    }

    pub fn set_access(&mut self, decision: AccessDecision) {
        self.gps = if decision.is_granted() {
            match self.gps {
                GpsState::Tracking => GpsState::Tracking,
                _ => GpsState::Enabled,
            }
        } else {
            GpsState::Disabled
        };
        self.access = Some(decision);
    }

    pub fn set_gps_state(&mut self, state: GpsState) {
        self.gps = state;
    }
}
