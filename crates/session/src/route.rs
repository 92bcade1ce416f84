use serde::Serialize;

/// Application routes the core reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", content = "story_id", rename_all = "snake_case")]
pub enum Route {
    Home,
    Game,
    GameStory(String),
    PresentationStory(String),
    Other(String),
}

impl Route {
    /// Parses a location path. Query strings, fragments and a trailing slash
    /// are ignored.
    pub fn parse(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] | ["index"] => Route::Home,
            ["game"] => Route::Game,
            ["game", story] => Route::GameStory((*story).to_string()),
            ["presentation", story] => Route::PresentationStory((*story).to_string()),
            _ => Route::Other(format!("/{}", segments.join("/"))),
        }
    }

    pub fn is_home(&self) -> bool {
        matches!(self, Route::Home)
    }

    /// Home routes show the dark, animated map.
    pub fn wants_dark_map(&self) -> bool {
        self.is_home()
    }

    pub fn story_id(&self) -> Option<&str> {
        match self {
            Route::GameStory(id) | Route::PresentationStory(id) => Some(id),
            _ => None,
        }
    }
}
