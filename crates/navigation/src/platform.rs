use serde::Serialize;

const MOBILE_MARKERS: [&str; 4] = ["mobi", "android", "iphone", "ipad"];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DeviceProfile {
    pub is_mobile: bool,
}

impl DeviceProfile {
    pub const DESKTOP: DeviceProfile = DeviceProfile { is_mobile: false };
    pub const MOBILE: DeviceProfile = DeviceProfile { is_mobile: true };

    /// Case-insensitive match on the usual handheld user-agent markers.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        Self {
            is_mobile: MOBILE_MARKERS.iter().any(|m| ua.contains(m)),
        }
    }
}
