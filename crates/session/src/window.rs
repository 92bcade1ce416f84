use foundation::Millis;
use runtime::{EventBus, Timer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowKind {
    Game,
    ProjectInfo,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize)]
pub enum WindowState {
    #[default]
    None,
    Game,
    ProjectInfo,
}

impl From<WindowKind> for WindowState {
    fn from(kind: WindowKind) -> Self {
        match kind {
            WindowKind::Game => WindowState::Game,
            WindowKind::ProjectInfo => WindowState::ProjectInfo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// How long the `replaced` flag stays up after one window replaces another.
    pub replace_flag_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { replace_flag_ms: 50 }
    }
}

/// Exclusive modal windows (game card, project-info dialog).
#[derive(Debug)]
pub struct WindowMachine {
    config: WindowConfig,
    state: WindowState,
    replaced: Timer,
    game_card_visible: bool,
    project_info_visible: bool,
    project_info_dismissed: bool,
    pub changes: EventBus<WindowState>,
}

impl WindowMachine {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            state: WindowState::None,
            replaced: Timer::idle(),
            game_card_visible: false,
            project_info_visible: false,
            project_info_dismissed: false,
            changes: EventBus::new(),
        }
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    /// True only inside the short window after a replacement, whether or not
    /// the machine has been ticked since.
    pub fn replaced(&self, now: Millis) -> bool {
        self.replaced.deadline().is_some_and(|until| now < until)
    }

    pub fn game_card_visible(&self) -> bool {
        self.game_card_visible
    }

    pub fn project_info_visible(&self) -> bool {
        self.project_info_visible
    }

    pub fn project_info_dismissed(&self) -> bool {
        self.project_info_dismissed
    }

    pub fn set_project_info_dismissed(&mut self, dismissed: bool) {
        self.project_info_dismissed = dismissed;
    }

    /// Activates `kind`, closing any other open window first.
    /// Opening the window that is already active does nothing.
    pub fn open(&mut self, kind: WindowKind, now: Millis) -> bool {
        let target = WindowState::from(kind);
        if self.state == target {
            return false;
        }
        if self.state != WindowState::None {
            self.replaced.arm_once(now, self.config.replace_flag_ms);
            self.hide_active();
            tracing::debug!(from = ?self.state, to = ?target, "window replaced");
        }
        self.state = target;
        match kind {
            WindowKind::Game => self.game_card_visible = true,
            WindowKind::ProjectInfo => self.project_info_visible = true,
        }
        self.changes.emit(&self.state);
        true
    }

    /// Opens the project-info dialog unless the user dismissed it before.
    pub fn auto_open_project_info(&mut self, now: Millis) -> bool {
        if self.project_info_dismissed {
            return false;
        }
        self.open(WindowKind::ProjectInfo, now)
    }

    /// Deactivates whatever is open. Idempotent.
    pub fn close(&mut self) -> bool {
        if self.state == WindowState::None {
            return false;
        }
        self.hide_active();
        self.state = WindowState::None;
        self.changes.emit(&self.state);
        true
    }

    pub fn tick(&mut self, now: Millis) {
        self.replaced.poll(now);
    }

    pub fn poll_at(&self) -> Option<Millis> {
        self.replaced.deadline()
    }

    fn hide_active(&mut self) {
        match self.state {
            WindowState::Game => self.game_card_visible = false,
            WindowState::ProjectInfo => self.project_info_visible = false,
            WindowState::None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{WindowConfig, WindowKind, WindowMachine, WindowState};
    use foundation::Millis;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn replacing_raises_flag_briefly() {
        let mut w = WindowMachine::new(WindowConfig::default());
        assert!(w.open(WindowKind::Game, Millis(0)));
        assert!(!w.replaced(Millis(0)));

        assert!(w.open(WindowKind::ProjectInfo, Millis(1_000)));
        assert_eq!(w.state(), WindowState::ProjectInfo);
        assert!(!w.game_card_visible());
        assert!(w.project_info_visible());
        assert!(w.replaced(Millis(1_000)));

        w.tick(Millis(1_049));
        assert!(w.replaced(Millis(1_049)));
        w.tick(Millis(1_050));
        assert!(!w.replaced(Millis(1_050)));
    }

    #[test]
    fn replaced_flag_expires_without_tick() {
        let mut w = WindowMachine::new(WindowConfig::default());
        w.open(WindowKind::Game, Millis(0));
        w.open(WindowKind::ProjectInfo, Millis(1_000));
        assert!(w.replaced(Millis(1_010)));
        assert!(!w.replaced(Millis(1_050)));
        assert!(!w.replaced(Millis(3_000)));
    }

    #[test]
    fn close_clears_visibility_and_is_idempotent() {
        let mut w = WindowMachine::new(WindowConfig::default());
        w.open(WindowKind::Game, Millis(0));
        assert!(w.close());
        assert!(!w.close());
        assert_eq!(w.state(), WindowState::None);
        assert!(!w.game_card_visible());
        assert!(!w.replaced(Millis(0)));
    }

    #[test]
    fn reopening_active_window_is_noop() {
        let mut w = WindowMachine::new(WindowConfig::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            w.changes.subscribe(move |s| seen.borrow_mut().push(*s));
        }
        w.open(WindowKind::Game, Millis(0));
        assert!(!w.open(WindowKind::Game, Millis(10)));
        assert!(!w.replaced(Millis(10)));
        assert_eq!(*seen.borrow(), vec![WindowState::Game]);
    }

    #[test]
    fn dismissed_dialog_is_not_auto_opened() {
        let mut w = WindowMachine::new(WindowConfig::default());
        w.set_project_info_dismissed(true);
        assert!(!w.auto_open_project_info(Millis(0)));
        assert_eq!(w.state(), WindowState::None);
        assert!(w.open(WindowKind::ProjectInfo, Millis(0)));
    }
}
