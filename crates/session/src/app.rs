use std::cell::RefCell;
use std::rc::Rc;

use formats::{Feature, FeatureSource};
use foundation::math::LonLat;
use foundation::{Millis, Position};
use navigation::{
    AccessDecision, DeviceProfile, Geolocation, GeolocationError, HeadingSample, OrientationEvent,
    OrientationSource, OrientationTracker, PositionService, TrackingPlan, WatchId,
};
use runtime::{Metrics, MetricsSnapshot, SubscriptionId, earliest};
use serde::Serialize;
use view::{ModeChange, ViewAnimator, ViewSnapshot};

use crate::config::AppConfig;
use crate::locale::{LocaleCatalog, persist_locale, resolve_initial_locale};
use crate::prefs::{LOCALE_KEY, PROJECT_INFO_DISMISSED_KEY, PrefsError, PrefsStore};
use crate::route::Route;
use crate::store::{AppStore, GpsState};
use crate::window::{WindowKind, WindowMachine, WindowState};

/// Session context owning every navigation and view component.
///
/// Hosts feed platform events and time in; the app routes position and
/// heading updates into the animator and the store.
pub struct App {
    config: AppConfig,
    device: DeviceProfile,
    prefs: Box<dyn PrefsStore>,
    locales: LocaleCatalog,
    route: Route,
    store: AppStore,
    position: PositionService,
    orientation: OrientationTracker,
    animator: ViewAnimator,
    windows: WindowMachine,
    inbox: Rc<RefCell<Vec<Position>>>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("device", &self.device)
            .field("route", &self.route)
            .field("store", &self.store)
            .field("windows", &self.windows.state())
            .finish()
    }
}

impl App {
    pub fn new(config: AppConfig, device: DeviceProfile, prefs: Box<dyn PrefsStore>) -> Self {
        let mut position = PositionService::new(config.tracking.clone(), config.simulator.clone());
        let inbox = Rc::new(RefCell::new(Vec::new()));
        {
            let inbox = inbox.clone();
            position
                .positions
                .subscribe(move |p: &Position| inbox.borrow_mut().push(*p));
        }

        let mut windows = WindowMachine::new(config.window.clone());
        match prefs.get_bool(PROJECT_INFO_DISMISSED_KEY) {
            Ok(dismissed) => windows.set_project_info_dismissed(dismissed.unwrap_or(false)),
            Err(e) => tracing::warn!(error = %e, "could not read project info flag"),
        }

        Self {
            orientation: OrientationTracker::new(config.orientation.clone()),
            animator: ViewAnimator::new(config.animator.clone(), config.flight.clone()),
            config,
            device,
            prefs,
            locales: LocaleCatalog::new([crate::locale::FALLBACK_LOCALE]),
            route: Route::Home,
            store: AppStore::default(),
            position,
            windows,
            inbox,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn device(&self) -> DeviceProfile {
        self.device
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn store(&self) -> &AppStore {
        &self.store
    }

    pub fn position(&self) -> &PositionService {
        &self.position
    }

    pub fn orientation(&self) -> &OrientationTracker {
        &self.orientation
    }

    pub fn animator(&self) -> &ViewAnimator {
        &self.animator
    }

    pub fn windows(&self) -> &WindowMachine {
        &self.windows
    }

    pub fn subscribe_positions(&mut self, f: impl FnMut(&Position) + 'static) -> SubscriptionId {
        self.position.positions.subscribe(f)
    }

    pub fn subscribe_headings(&mut self, f: impl FnMut(&HeadingSample) + 'static) -> SubscriptionId {
        self.orientation.headings.subscribe(f)
    }

    pub fn subscribe_windows(&mut self, f: impl FnMut(&WindowState) + 'static) -> SubscriptionId {
        self.windows.changes.subscribe(f)
    }

    // --- routing ---

    /// Applies a navigation: home/dark flags, map mode, and window closing
    /// on home routes or on `/game` without GPS access.
    pub fn navigate(&mut self, path: &str, now: Millis) -> ModeChange {
        let route = Route::parse(path);
        let dark = self.store.update_from_route(&route);
        if route.is_home() || (route == Route::Game && !self.store.has_gps_access()) {
            self.windows.close();
        }
        tracing::debug!(?route, dark, "navigated");
        self.route = route;
        self.animator.set_mode(dark, now)
    }

    // --- locale ---

    pub fn load_locales(&mut self, catalog: LocaleCatalog, browser_language: Option<&str>) -> &str {
        let stored = self.prefs.get(LOCALE_KEY).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read stored locale");
            None
        });
        self.store.locale = resolve_initial_locale(stored.as_deref(), browser_language, &catalog);
        self.locales = catalog;
        &self.store.locale
    }

    pub fn set_locale(&mut self, locale: &str) -> Result<bool, PrefsError> {
        let accepted = persist_locale(locale, &self.locales, self.prefs.as_mut())?;
        if accepted {
            self.store.locale = locale.to_string();
        }
        Ok(accepted)
    }

    // --- position ---

    pub fn apply_access(&mut self, decision: AccessDecision) {
        self.store.set_access(decision);
    }

    pub fn tracking_plan(&self) -> TrackingPlan {
        self.position.plan(self.device)
    }

    pub fn watch(&mut self, geo: &mut dyn Geolocation) -> Result<WatchId, GeolocationError> {
        let id = self.position.watch(geo)?;
        self.store.set_gps_state(GpsState::Tracking);
        Ok(id)
    }

    pub fn begin_simulation(&mut self, seed: Option<Position>, now: Millis) -> bool {
        let running = self.position.begin_simulation(seed, now);
        if running {
            self.store.set_gps_state(GpsState::Tracking);
        }
        self.route_positions();
        running
    }

    pub fn handle_fix(&mut self, fix: Position) -> bool {
        let accepted = self.position.handle_fix(fix);
        self.route_positions();
        accepted
    }

    pub fn handle_watch_error(&mut self, err: GeolocationError) {
        self.position.handle_watch_error(err);
    }

    /// Stops both the watch and the simulator and removes the marker.
    pub fn stop_tracking(&mut self, geo: &mut dyn Geolocation) {
        self.position.stop_tracking(geo);
        self.position.stop_simulation();
        self.inbox.borrow_mut().clear();
        self.animator.clear_position();
        self.store.position = None;
        let state = if self.store.has_gps_access() {
            GpsState::Enabled
        } else {
            GpsState::Disabled
        };
        self.store.set_gps_state(state);
    }

    // --- heading ---

    /// Starts heading tracking towards `target`, or the configured target
    /// when none is given.
    pub fn start_heading(
        &mut self,
        target: Option<LonLat>,
        source: &mut dyn OrientationSource,
    ) -> bool {
        self.orientation.start(target.or(self.config.target), source)
    }

    pub fn handle_orientation(&mut self, ev: &OrientationEvent) -> Option<HeadingSample> {
        let current = self.position.current();
        let sample = self.orientation.handle_event(ev, current.as_ref())?;
        self.store.heading = Some(sample);
        Some(sample)
    }

    pub fn stop_heading(&mut self, source: &mut dyn OrientationSource) {
        self.orientation.stop(source);
        self.store.heading = None;
    }

    // --- view ---

    pub fn set_mode(&mut self, dark: bool, now: Millis) -> ModeChange {
        self.store.set_dark_enabled(dark);
        self.animator.set_mode(dark, now)
    }

    pub fn show_geometry(&mut self, payload: &str, source: FeatureSource) -> Option<Feature> {
        self.animator.show_geometry(payload, source)
    }

    pub fn show_feature(&mut self, feature: &Feature) {
        self.animator.show_feature(feature);
    }

    pub fn clear_overlay(&mut self) {
        self.animator.clear_overlay();
    }

    pub fn fit_overlay(&mut self, now: Millis) -> bool {
        self.animator.fit_overlay(now)
    }

    pub fn center_on(&mut self, lat: f64, lon: f64, zoom: Option<f64>, offset_px: f64, now: Millis) {
        self.animator.center_on(lat, lon, zoom, offset_px, now);
    }

    /// Centers on the device position if one is known.
    pub fn center_on_position(&mut self, zoom: Option<f64>, offset_px: f64, now: Millis) -> bool {
        let Some(p) = self.position.current() else {
            return false;
        };
        self.animator
            .center_on(p.latitude, p.longitude, zoom, offset_px, now);
        true
    }

    pub fn set_viewport(&mut self, width_px: f64, height_px: f64) {
        self.animator.set_viewport(width_px, height_px);
    }

    // --- windows ---

    pub fn open_window(&mut self, kind: WindowKind, now: Millis) -> bool {
        self.windows.open(kind, now)
    }

    pub fn close_window(&mut self) -> bool {
        self.windows.close()
    }

    pub fn auto_open_project_info(&mut self, now: Millis) -> bool {
        self.windows.auto_open_project_info(now)
    }

    /// Closes the dialog and remembers not to auto-open it again.
    pub fn dismiss_project_info(&mut self) -> Result<(), PrefsError> {
        if self.windows.state() == WindowState::ProjectInfo {
            self.windows.close();
        }
        self.windows.set_project_info_dismissed(true);
        self.prefs.set_bool(PROJECT_INFO_DISMISSED_KEY, true)
    }

    // --- driving ---

    /// Advances timers and animations. Returns whether the view changed.
    pub fn tick(&mut self, now: Millis) -> bool {
        self.position.tick(now);
        self.windows.tick(now);
        let moved = self.route_positions();
        self.animator.tick(now) || moved
    }

    pub fn poll_at(&self) -> Option<Millis> {
        earliest([
            self.position.poll_at(),
            self.windows.poll_at(),
            self.animator.poll_at(),
        ])
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    pub fn metrics(&self) -> Metrics {
        let mut m = Metrics::new();
        m.merge(self.position.metrics());
        m.merge(self.orientation.metrics());
        m.merge(self.animator.metrics());
        m
    }

    pub fn snapshot(&self, now: Millis) -> AppSnapshot {
        AppSnapshot {
            route: self.route.clone(),
            store: self.store.clone(),
            window: self.windows.state(),
            window_replaced: self.windows.replaced(now),
            game_card_visible: self.windows.game_card_visible(),
            project_info_visible: self.windows.project_info_visible(),
            view: self.animator.snapshot(),
            metrics: self.metrics().snapshot(),
        }
    }

    fn route_positions(&mut self) -> bool {
        let batch: Vec<Position> = self.inbox.borrow_mut().drain(..).collect();
        let Some(last) = batch.last().copied() else {
            return false;
        };
        self.animator.show_position(&last);
        self.store.position = Some(last);
        true
    }
}

/// Everything the UI shell renders from, in one serializable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppSnapshot {
    pub route: Route,
    pub store: AppStore,
    pub window: WindowState,
    pub window_replaced: bool,
    pub game_card_visible: bool,
    pub project_info_visible: bool,
    pub view: ViewSnapshot,
    pub metrics: MetricsSnapshot,
}

#[cfg(test)]
mod tests {
    use super::App;
    use crate::config::AppConfig;
    use crate::locale::LocaleCatalog;
    use crate::prefs::{InMemoryPrefsStore, PROJECT_INFO_DISMISSED_KEY, PrefsStore};
    use crate::store::GpsState;
    use crate::window::{WindowKind, WindowState};
    use foundation::math::LonLat;
    use foundation::{Millis, Position};
    use navigation::mock::{MockGeolocation, MockOrientationSource};
    use navigation::{
        AccessDecision, DeviceProfile, EventFamily, OrientationEvent, TrackingPlan, check_access,
    };
    use std::cell::RefCell;
    use std::rc::Rc;
    use view::ModeChange;

    fn config() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.simulator.rng_seed = Some(3);
        cfg.flight.rng_seed = Some(4);
        cfg.target = Some(LonLat::new(16.63, 50.70));
        cfg
    }

    fn app(device: DeviceProfile) -> App {
        App::new(config(), device, Box::new(InMemoryPrefsStore::new()))
    }

    #[test]
    fn home_route_fades_dark_and_closes_windows() {
        let mut a = app(DeviceProfile::MOBILE);
        a.navigate("/game/1", Millis(0));
        a.open_window(WindowKind::Game, Millis(0));
        assert_eq!(a.navigate("/", Millis(10)), ModeChange::Started);
        assert_eq!(a.windows().state(), WindowState::None);
        assert!(a.store().home_page);
        a.tick(Millis(710));
        assert!(a.animator().is_dark());
    }

    #[test]
    fn game_route_without_access_closes_windows() {
        let mut a = app(DeviceProfile::MOBILE);
        a.open_window(WindowKind::Game, Millis(0));
        a.navigate("/game", Millis(0));
        assert_eq!(a.windows().state(), WindowState::None);

        a.apply_access(AccessDecision::Granted {
            accuracy_m: 5.0,
            is_mobile: true,
        });
        a.open_window(WindowKind::Game, Millis(0));
        a.navigate("/game", Millis(0));
        assert_eq!(a.windows().state(), WindowState::Game);
    }

    #[test]
    fn watch_fixes_reach_marker_and_store() {
        let mut a = app(DeviceProfile::MOBILE);
        let mut geo = MockGeolocation::new();
        geo.push_fix(Position::new(50.69, 16.62, 40.0));
        let decision = pollster::block_on(check_access(&geo, &a.config().access, a.device()));
        a.apply_access(decision);
        assert_eq!(a.store().gps, GpsState::Enabled);

        assert_eq!(a.tracking_plan(), TrackingPlan::Watch);
        a.watch(&mut geo).expect("watch");
        assert!(a.handle_fix(Position::new(50.69, 16.62, 9.0)));
        assert_eq!(a.store().gps, GpsState::Tracking);
        assert_eq!(a.store().position, Some(Position::new(50.69, 16.62, 9.0)));
        assert!(a.animator().position_layer().is_shown());

        a.stop_tracking(&mut geo);
        assert!(!a.animator().position_layer().is_shown());
        assert_eq!(a.store().position, None);
        assert_eq!(a.store().gps, GpsState::Enabled);
    }

    #[test]
    fn desktop_simulation_runs_on_ticks() {
        let mut a = app(DeviceProfile::DESKTOP);
        assert_eq!(a.tracking_plan(), TrackingPlan::Simulate);
        assert!(a.begin_simulation(None, Millis(0)));
        assert_eq!(
            a.store().position.map(|p| (p.latitude, p.longitude)),
            Some((50.5, 19.5))
        );
        assert_eq!(a.poll_at(), Some(Millis(15_000)));
        a.tick(Millis(15_000));
        assert_eq!(a.metrics().counter("position.updates"), 2);
    }

    #[test]
    fn heading_uses_current_position() {
        let mut a = app(DeviceProfile::MOBILE);
        let mut geo = MockGeolocation::new();
        let mut source = MockOrientationSource::new();
        a.start_heading(None, &mut source);
        let ev = OrientationEvent {
            family: EventFamily::DeviceOrientationAbsolute,
            webkit_compass_heading: None,
            alpha: Some(315.0),
            absolute: true,
        };
        let sample = a.handle_orientation(&ev).expect("sample");
        assert_eq!(sample.arrow_angle_deg, None);

        a.watch(&mut geo).expect("watch");
        a.handle_fix(Position::new(50.69, 16.62, 5.0));
        let sample = a.handle_orientation(&ev).expect("sample");
        assert_eq!(sample.heading_deg, 45.0);
        assert!(sample.arrow_angle_deg.is_some());
        assert_eq!(a.store().heading, Some(sample));

        a.stop_heading(&mut source);
        assert!(a.store().heading.is_none());
    }

    #[test]
    fn explicit_heading_target_reaches_subscribers() {
        let mut a = App::new(
            AppConfig::default(),
            DeviceProfile::MOBILE,
            Box::new(InMemoryPrefsStore::new()),
        );
        let hits = Rc::new(RefCell::new(Vec::new()));
        {
            let hits = hits.clone();
            a.subscribe_headings(move |s| hits.borrow_mut().push(*s));
        }
        let mut geo = MockGeolocation::new();
        let mut source = MockOrientationSource::new();
        assert!(a.start_heading(Some(LonLat::new(16.63, 50.70)), &mut source));
        a.watch(&mut geo).expect("watch");
        a.handle_fix(Position::new(50.69, 16.62, 5.0));

        let ev = OrientationEvent {
            family: EventFamily::DeviceOrientation,
            webkit_compass_heading: Some(45.0),
            alpha: None,
            absolute: false,
        };
        let sample = a.handle_orientation(&ev).expect("sample");
        assert!(sample.bearing_deg.is_some());
        assert!(sample.arrow_angle_deg.is_some());
        assert_eq!(*hits.borrow(), vec![sample]);
    }

    #[test]
    fn snapshot_replaced_flag_expires_without_tick() {
        let mut a = app(DeviceProfile::DESKTOP);
        a.open_window(WindowKind::Game, Millis(0));
        a.open_window(WindowKind::ProjectInfo, Millis(1_000));
        assert!(a.snapshot(Millis(1_020)).window_replaced);
        assert!(!a.snapshot(Millis(3_000)).window_replaced);
    }

    #[test]
    fn dismissed_project_info_is_persisted() {
        let mut prefs = InMemoryPrefsStore::new();
        prefs.set_bool(PROJECT_INFO_DISMISSED_KEY, true).expect("set");
        let mut a = App::new(config(), DeviceProfile::DESKTOP, Box::new(prefs));
        assert!(!a.auto_open_project_info(Millis(0)));

        let mut fresh = app(DeviceProfile::DESKTOP);
        assert!(fresh.auto_open_project_info(Millis(0)));
        fresh.dismiss_project_info().expect("dismiss");
        assert_eq!(fresh.windows().state(), WindowState::None);
        assert!(!fresh.auto_open_project_info(Millis(10)));
    }

    #[test]
    fn locale_resolution_and_persistence() {
        let mut a = app(DeviceProfile::DESKTOP);
        let catalog = LocaleCatalog::new(["en", "pl", "es"]);
        assert_eq!(a.load_locales(catalog, Some("es-ES")), "es");
        assert_eq!(a.set_locale("pl"), Ok(true));
        assert_eq!(a.set_locale("xx"), Ok(false));
        assert_eq!(a.store().locale, "pl");
    }

    #[test]
    fn snapshot_serializes() {
        let mut a = app(DeviceProfile::DESKTOP);
        a.begin_simulation(None, Millis(0));
        let json = serde_json::to_value(a.snapshot(Millis(0))).expect("json");
        assert_eq!(json["store"]["gps"], "Tracking");
        assert_eq!(json["window"], "None");
        assert!(json["view"]["position"].is_object());
    }
}
