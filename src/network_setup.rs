//! Network page: lists nearby WiFi networks, connects to one and keeps
//! track of whether the machine is online.

use std::collections::HashSet;
use std::time::Duration;

use eframe::egui;

use crate::config::NetworkTimings;
use crate::dbus::{CONNECTIVITY_FULL, DEVICE_STATE_ACTIVATED, NetworkBackend};
use crate::error::{Error, Result};
use crate::models::{AccessPointInfo, ConnectionSettings, ConnectivityState};
use crate::scheduler::{Clock, Scheduler};
use crate::viewstep::{JobList, ViewStep};

const GREY: egui::Color32 = egui::Color32::from_rgb(0x9e, 0x9e, 0x9e);
const AMBER: egui::Color32 = egui::Color32::from_rgb(0xff, 0xc1, 0x07);
const GREEN: egui::Color32 = egui::Color32::from_rgb(0x4c, 0xaf, 0x50);

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Phase {
    #[default]
    Idle,
    Scanning,
    ConnectivityCheck,
    Connecting,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Indicator {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl Indicator {
    fn color(self) -> egui::Color32 {
        match self {
            Indicator::Disconnected => GREY,
            Indicator::Connecting => AMBER,
            Indicator::Connected => GREEN,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum PageTask {
    Scan,
    LoadAccessPoints,
    CheckConnection,
}

/// Strongest first, one entry per SSID.
pub fn rank_access_points(mut access_points: Vec<AccessPointInfo>) -> Vec<AccessPointInfo> {
    access_points.sort_by(|a, b| b.strength.cmp(&a.strength));
    let mut seen = HashSet::new();
    access_points.retain(|ap| seen.insert(ap.ssid.clone()));
    access_points
}

/// Global connectivity decides first; the WiFi device's own state is the
/// fallback. Failing lookups count as not connected, and a connection whose
/// name cannot be read is still connected.
pub fn determine_connectivity(
    backend: &dyn NetworkBackend,
    device: Option<&str>,
) -> ConnectivityState {
    match backend.connectivity() {
        Ok(CONNECTIVITY_FULL) => {
            let connection_name = backend.primary_connection_id().unwrap_or_else(|err| {
                tracing::debug!("primary connection name unavailable: {err}");
                None
            });
            return ConnectivityState {
                connected: true,
                connection_name,
            };
        }
        Ok(_) => {}
        Err(err) => tracing::debug!("connectivity query failed: {err}"),
    }

    let Some(device) = device else {
        return ConnectivityState::disconnected();
    };

    match backend.device_state(device) {
        Ok(DEVICE_STATE_ACTIVATED) => {
            let connection_name = backend.active_access_point_ssid(device).unwrap_or_else(|err| {
                tracing::debug!("active access point unavailable: {err}");
                None
            });
            ConnectivityState {
                connected: true,
                connection_name,
            }
        }
        Ok(_) => ConnectivityState::disconnected(),
        Err(err) => {
            tracing::debug!("device state query failed: {err}");
            ConnectivityState::disconnected()
        }
    }
}

/// NetworkManager's own explanation when it rejected the call.
fn failure_message(err: Error) -> String {
    match err {
        Error::Bus(zbus::Error::MethodError(_, Some(detail), _)) => detail,
        other => other.to_string(),
    }
}

pub struct NetworkSetupPage {
    backend: Box<dyn NetworkBackend>,
    clock: Box<dyn Clock>,
    scheduler: Scheduler<PageTask>,
    timings: NetworkTimings,
    device: Option<String>,
    networks: Vec<AccessPointInfo>,
    selected: Option<usize>,
    phase: Phase,
    connectivity: ConnectivityState,
    indicator: Indicator,
    status_text: String,
    scan_busy: bool,
    /// Secured network waiting for its password.
    pending: Option<AccessPointInfo>,
    password: String,
    show_password: bool,
    last_error: Option<String>,
}

impl NetworkSetupPage {
    /// Finds the WiFi device, reads the current connectivity and queues the
    /// first scan plus the recurring connectivity check.
    pub fn new(
        backend: Box<dyn NetworkBackend>,
        clock: Box<dyn Clock>,
        timings: NetworkTimings,
    ) -> Self {
        let mut page = Self {
            backend,
            clock,
            scheduler: Scheduler::new(),
            timings,
            device: None,
            networks: Vec::new(),
            selected: None,
            phase: Phase::Idle,
            connectivity: ConnectivityState::disconnected(),
            indicator: Indicator::Disconnected,
            status_text: "Not connected".to_string(),
            scan_busy: false,
            pending: None,
            password: String::new(),
            show_password: false,
            last_error: None,
        };

        page.find_wireless_device();
        page.check_connection();

        let now = page.clock.now();
        page.scheduler
            .schedule_once(now, page.timings.scan_settle(), PageTask::Scan);
        page.scheduler.schedule_every(
            now,
            page.timings.connectivity_interval(),
            PageTask::CheckConnection,
        );
        page
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn networks(&self) -> &[AccessPointInfo] {
        &self.networks
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.connectivity.connected
    }

    pub fn connectivity(&self) -> &ConnectivityState {
        &self.connectivity
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn is_scanning(&self) -> bool {
        self.scan_busy
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    pub fn awaiting_credential(&self) -> Option<&AccessPointInfo> {
        self.pending.as_ref()
    }

    pub fn selected(&self) -> Option<&AccessPointInfo> {
        self.selected.and_then(|i| self.networks.get(i))
    }

    pub fn select(&mut self, index: usize) {
        if index < self.networks.len() {
            self.selected = Some(index);
        }
    }

    /// Runs due tasks. Returns the time until the next one.
    pub fn tick(&mut self) -> Option<Duration> {
        let now = self.clock.now();
        for task in self.scheduler.take_due(now) {
            match task {
                PageTask::Scan => self.scan(),
                PageTask::LoadAccessPoints => self.load_access_points(),
                PageTask::CheckConnection => self.check_connection(),
            }
        }
        self.scheduler
            .next_deadline()
            .map(|at| at.saturating_sub(self.clock.now()))
    }

    fn find_wireless_device(&mut self) {
        match self.backend.wireless_device() {
            Ok(Some(path)) => self.device = Some(path),
            Ok(None) => tracing::warn!("no WiFi device found"),
            Err(err) => tracing::warn!("could not enumerate network devices: {err}"),
        }
    }

    /// Asks for a scan and reads the results after a fixed wait; the scan's
    /// own completion is not observed.
    pub fn scan(&mut self) {
        let Some(device) = self.device.clone() else {
            self.status_text = "No WiFi adapter found".to_string();
            return;
        };

        self.scan_busy = true;
        match self.backend.request_scan(&device) {
            Ok(()) => {
                if self.phase != Phase::Connecting {
                    self.phase = Phase::Scanning;
                }
                let now = self.clock.now();
                self.scheduler
                    .schedule_once(now, self.timings.scan_wait(), PageTask::LoadAccessPoints);
            }
            Err(err) => {
                tracing::warn!("scan request failed: {err}");
                self.scan_busy = false;
            }
        }
    }

    fn load_access_points(&mut self) {
        self.scan_busy = false;
        self.phase = Phase::Idle;

        let Some(device) = self.device.clone() else {
            return;
        };

        let fetched = match self.backend.access_points(&device) {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!("could not list access points: {err}");
                return;
            }
        };

        let previous = self.selected().map(|ap| ap.ssid.clone());
        self.networks = rank_access_points(fetched);
        self.selected = previous.and_then(|ssid| self.networks.iter().position(|ap| ap.ssid == ssid));

        self.check_connection();
    }

    fn check_connection(&mut self) {
        let resume = self.phase;
        self.phase = Phase::ConnectivityCheck;
        let state = determine_connectivity(self.backend.as_ref(), self.device.as_deref());
        self.phase = resume;

        if state.connected != self.connectivity.connected {
            tracing::info!(connected = state.connected, "connection state changed");
        }

        if state.connected {
            self.indicator = Indicator::Connected;
            self.status_text = state.label();
        } else if self.phase == Phase::Connecting {
            self.indicator = Indicator::Connecting;
            self.status_text = "Connecting...".to_string();
        } else {
            self.indicator = Indicator::Disconnected;
            self.status_text = state.label();
        }
        self.connectivity = state;
    }

    /// Connects to the selected network. Open networks connect right away;
    /// secured ones wait for [`Self::submit_credential`].
    pub fn request_connect(&mut self) {
        let Some(target) = self.selected().cloned() else {
            return;
        };

        if target.secured {
            self.password.clear();
            self.show_password = false;
            self.pending = Some(target);
        } else {
            self.dispatch_connect(target, None);
        }
    }

    /// Answer to the password prompt. `None` or an empty password drops the
    /// attempt without contacting NetworkManager.
    pub fn submit_credential(&mut self, credential: Option<String>) {
        let Some(target) = self.pending.take() else {
            return;
        };
        self.password.clear();

        match credential {
            Some(psk) if !psk.is_empty() => self.dispatch_connect(target, Some(psk)),
            _ => tracing::debug!(ssid = %target.ssid, "password prompt dismissed"),
        }
    }

    fn dispatch_connect(&mut self, target: AccessPointInfo, psk: Option<String>) {
        let Some(device) = self.device.clone() else {
            self.status_text = "No WiFi adapter found".to_string();
            return;
        };

        self.phase = Phase::Connecting;
        self.indicator = Indicator::Connecting;
        self.status_text = "Connecting...".to_string();

        let settings = ConnectionSettings::wireless(&target.ssid, psk.as_deref());
        match self
            .backend
            .add_and_activate_connection(&settings, &device, &target.path)
        {
            Ok(()) => {
                tracing::info!(ssid = %target.ssid, "connection activated");
                let now = self.clock.now();
                self.scheduler.schedule_once(
                    now,
                    self.timings.connect_settle(),
                    PageTask::LoadAccessPoints,
                );
            }
            Err(err) => {
                tracing::warn!(ssid = %target.ssid, "connect failed: {err}");
                self.last_error = Some(failure_message(err));
                self.phase = Phase::Idle;
                self.indicator = Indicator::Disconnected;
                self.status_text = "Connection failed".to_string();
            }
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui) {
        ui.heading(egui::RichText::new("Network Setup").size(18.0).strong());
        ui.label("A network connection is required to download packages during setup.");
        ui.add_space(10.0);

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("\u{2B24}").color(self.indicator.color()));
            ui.label(self.status_text.as_str());
        });

        ui.add_space(10.0);
        ui.label("Available networks:");

        let mut clicked = None;
        let mut activated = false;
        egui::ScrollArea::vertical()
            .min_scrolled_height(200.0)
            .max_height(320.0)
            .show(ui, |ui| {
                for (i, ap) in self.networks.iter().enumerate() {
                    let text = format!(
                        "{}  {}  ({})",
                        ap.strength_bars(),
                        ap.ssid,
                        ap.security_label()
                    );
                    let response = ui.selectable_label(self.selected == Some(i), text);
                    if response.clicked() {
                        clicked = Some(i);
                    }
                    if response.double_clicked() {
                        clicked = Some(i);
                        activated = true;
                    }
                }
            });

        ui.horizontal(|ui| {
            let scan_label = if self.scan_busy { "Scanning..." } else { "Scan" };
            if ui
                .add_enabled(!self.scan_busy, egui::Button::new(scan_label))
                .clicked()
            {
                self.scan();
            }
            if ui.button("Connect").clicked() {
                activated = true;
            }
        });

        if let Some(i) = clicked {
            self.select(i);
        }
        if activated {
            self.request_connect();
        }

        self.draw_password_prompt(ui.ctx());
        self.draw_error(ui.ctx());
    }

    fn draw_password_prompt(&mut self, ctx: &egui::Context) {
        let Some(ssid) = self.pending.as_ref().map(|ap| ap.ssid.clone()) else {
            return;
        };

        let mut answer = None;
        egui::Window::new("WiFi Password")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.strong(ssid.as_str());
                let show = self.show_password;
                let edit = ui.add(
                    egui::TextEdit::singleline(&mut self.password)
                        .password(!show)
                        .hint_text("Enter password"),
                );
                if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    answer = Some(Some(self.password.clone()));
                }
                ui.checkbox(&mut self.show_password, "Show password");
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() {
                        answer = Some(Some(self.password.clone()));
                    }
                    if ui.button("Cancel").clicked() {
                        answer = Some(None);
                    }
                });
            });

        if let Some(credential) = answer {
            self.submit_credential(credential);
        }
    }

    fn draw_error(&mut self, ctx: &egui::Context) {
        let Some(message) = self.last_error.clone() else {
            return;
        };

        let mut dismissed = false;
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message.as_str());
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });

        if dismissed {
            self.dismiss_error();
        }
    }
}

/// Installer step around [`NetworkSetupPage`]; moving on requires a
/// working connection.
pub struct NetworkSetupStep {
    page: NetworkSetupPage,
}

impl NetworkSetupStep {
    pub fn new(page: NetworkSetupPage) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &NetworkSetupPage {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut NetworkSetupPage {
        &mut self.page
    }
}

impl ViewStep for NetworkSetupStep {
    fn pretty_name(&self) -> String {
        "Network".to_string()
    }

    fn pretty_status(&self) -> String {
        self.page.status_text().to_string()
    }

    fn ui(&mut self, ui: &mut egui::Ui) {
        self.page.ui(ui);
    }

    fn is_next_enabled(&self) -> bool {
        self.page.is_connected()
    }

    fn is_back_enabled(&self) -> bool {
        true
    }

    fn is_at_beginning(&self) -> bool {
        true
    }

    fn is_at_end(&self) -> bool {
        true
    }

    // Connecting happens immediately on the page.
    fn jobs(&self) -> JobList {
        Vec::new()
    }

    fn set_configuration_map(&mut self, _config: &serde_yaml::Value) -> Result<()> {
        Ok(())
    }

    fn tick(&mut self) -> Option<Duration> {
        self.page.tick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AP_FLAGS_PRIVACY, SettingValue};
    use crate::scheduler::ManualClock;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct FakeState {
        device: Option<String>,
        access_points: Vec<AccessPointInfo>,
        connectivity: u32,
        primary_id: Option<String>,
        device_state: u32,
        active_ssid: Option<String>,
        fail_queries: bool,
        fail_name_lookup: bool,
        fail_scan: bool,
        fail_connect: Option<Error>,
        scans: usize,
        connects: Vec<(ConnectionSettings, String, String)>,
    }

    #[derive(Clone, Debug, Default)]
    struct FakeBackend(Rc<RefCell<FakeState>>);

    impl FakeBackend {
        fn with_device() -> Self {
            let fake = Self::default();
            fake.0.borrow_mut().device = Some("/dev/wlan0".to_string());
            fake
        }

        fn state(&self) -> std::cell::RefMut<'_, FakeState> {
            self.0.borrow_mut()
        }
    }

    impl NetworkBackend for FakeBackend {
        fn wireless_device(&self) -> Result<Option<String>> {
            Ok(self.0.borrow().device.clone())
        }

        fn request_scan(&self, _device: &str) -> Result<()> {
            let mut state = self.0.borrow_mut();
            if state.fail_scan {
                return Err(Error::BusUnavailable);
            }
            state.scans += 1;
            Ok(())
        }

        fn access_points(&self, _device: &str) -> Result<Vec<AccessPointInfo>> {
            Ok(self.0.borrow().access_points.clone())
        }

        fn connectivity(&self) -> Result<u32> {
            let state = self.0.borrow();
            if state.fail_queries {
                return Err(Error::BusUnavailable);
            }
            Ok(state.connectivity)
        }

        fn primary_connection_id(&self) -> Result<Option<String>> {
            let state = self.0.borrow();
            if state.fail_queries || state.fail_name_lookup {
                return Err(Error::BusUnavailable);
            }
            Ok(state.primary_id.clone())
        }

        fn device_state(&self, _device: &str) -> Result<u32> {
            let state = self.0.borrow();
            if state.fail_queries {
                return Err(Error::BusUnavailable);
            }
            Ok(state.device_state)
        }

        fn active_access_point_ssid(&self, _device: &str) -> Result<Option<String>> {
            let state = self.0.borrow();
            if state.fail_queries || state.fail_name_lookup {
                return Err(Error::BusUnavailable);
            }
            Ok(state.active_ssid.clone())
        }

        fn add_and_activate_connection(
            &self,
            settings: &ConnectionSettings,
            device: &str,
            access_point: &str,
        ) -> Result<()> {
            let mut state = self.0.borrow_mut();
            state.connects.push((
                settings.clone(),
                device.to_string(),
                access_point.to_string(),
            ));
            match state.fail_connect.take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    fn method_error(name: &str, detail: &str) -> Error {
        let reply = zbus::Message::method_call(
            "/org/freedesktop/NetworkManager",
            "AddAndActivateConnection",
        )
        .unwrap()
        .build(&())
        .unwrap();
        Error::Bus(zbus::Error::MethodError(
            zbus::names::OwnedErrorName::try_from(name).unwrap(),
            Some(detail.to_string()),
            reply,
        ))
    }

    fn ap(path: &str, ssid: &str, strength: u8, flags: u32) -> AccessPointInfo {
        AccessPointInfo::new(path, ssid, strength, flags, 0, 0)
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn page(fake: &FakeBackend, clock: &ManualClock) -> NetworkSetupPage {
        NetworkSetupPage::new(
            Box::new(fake.clone()),
            Box::new(clock.clone()),
            NetworkTimings::default(),
        )
    }

    /// Page with the access points already loaded.
    fn loaded_page(fake: &FakeBackend, clock: &ManualClock) -> NetworkSetupPage {
        let mut page = page(fake, clock);
        clock.advance(ms(500));
        page.tick();
        clock.advance(ms(3000));
        page.tick();
        page
    }

    #[test]
    fn duplicate_ssid_keeps_strongest() {
        let ranked = rank_access_points(vec![ap("/ap/1", "A", 30, 0), ap("/ap/2", "A", 80, 0)]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].strength, 80);
        assert_eq!(ranked[0].path, "/ap/2");
    }

    #[test]
    fn ranking_sorts_by_strength_and_is_stable_under_rerun() {
        let fetched = vec![
            ap("/ap/1", "cafe", 40, 0),
            ap("/ap/2", "home", 90, AP_FLAGS_PRIVACY),
            ap("/ap/3", "cafe", 70, 0),
            ap("/ap/4", "office", 55, AP_FLAGS_PRIVACY),
        ];
        let ranked = rank_access_points(fetched.clone());
        let ssids: Vec<&str> = ranked.iter().map(|ap| ap.ssid.as_str()).collect();
        assert_eq!(ssids, ["home", "cafe", "office"]);
        assert_eq!(ranked[1].strength, 70);

        assert_eq!(rank_access_points(fetched), ranked);
        assert_eq!(rank_access_points(ranked.clone()), ranked);
    }

    #[test]
    fn global_connectivity_wins_over_inactive_device() {
        let fake = FakeBackend::with_device();
        {
            let mut s = fake.state();
            s.connectivity = CONNECTIVITY_FULL;
            s.device_state = 30;
            s.primary_id = Some("Wired connection 1".to_string());
        }
        let state = determine_connectivity(&fake, Some("/dev/wlan0"));
        assert!(state.connected);
        assert_eq!(state.label(), "Connected: Wired connection 1");
    }

    #[test]
    fn activated_device_counts_as_connected() {
        let fake = FakeBackend::with_device();
        {
            let mut s = fake.state();
            s.connectivity = 2;
            s.device_state = DEVICE_STATE_ACTIVATED;
            s.active_ssid = Some("home".to_string());
        }
        let state = determine_connectivity(&fake, Some("/dev/wlan0"));
        assert!(state.connected);
        assert_eq!(state.connection_name.as_deref(), Some("home"));
    }

    #[test]
    fn unreadable_primary_connection_is_still_connected() {
        let fake = FakeBackend::with_device();
        {
            let mut s = fake.state();
            s.connectivity = CONNECTIVITY_FULL;
            s.primary_id = Some("Wired connection 1".to_string());
            s.fail_name_lookup = true;
        }
        let state = determine_connectivity(&fake, Some("/dev/wlan0"));
        assert!(state.connected);
        assert_eq!(state.connection_name, None);
        assert_eq!(state.label(), "Connected");
    }

    #[test]
    fn unreadable_active_access_point_is_still_connected() {
        let fake = FakeBackend::with_device();
        {
            let mut s = fake.state();
            s.connectivity = 2;
            s.device_state = DEVICE_STATE_ACTIVATED;
            s.active_ssid = Some("home".to_string());
            s.fail_name_lookup = true;
        }
        let state = determine_connectivity(&fake, Some("/dev/wlan0"));
        assert!(state.connected);
        assert_eq!(state.label(), "Connected");
    }

    #[test]
    fn failing_queries_mean_disconnected() {
        let fake = FakeBackend::with_device();
        fake.state().fail_queries = true;
        assert_eq!(
            determine_connectivity(&fake, Some("/dev/wlan0")),
            ConnectivityState::disconnected()
        );
        assert_eq!(
            determine_connectivity(&FakeBackend::default(), None),
            ConnectivityState::disconnected()
        );
    }

    #[test]
    fn startup_scans_after_settle_then_loads_after_wait() {
        let fake = FakeBackend::with_device();
        fake.state().access_points = vec![ap("/ap/1", "A", 30, 0), ap("/ap/2", "A", 80, 0)];
        let clock = ManualClock::new();
        let mut page = page(&fake, &clock);

        clock.advance(ms(499));
        page.tick();
        assert_eq!(fake.state().scans, 0);

        clock.advance(ms(1));
        page.tick();
        assert_eq!(fake.state().scans, 1);
        assert_eq!(page.phase(), Phase::Scanning);
        assert!(page.is_scanning());
        assert!(page.networks().is_empty());

        clock.advance(ms(3000));
        page.tick();
        assert_eq!(page.phase(), Phase::Idle);
        assert!(!page.is_scanning());
        assert_eq!(page.networks().len(), 1);
        assert_eq!(page.networks()[0].strength, 80);
    }

    #[test]
    fn periodic_check_notices_new_connection() {
        let fake = FakeBackend::with_device();
        let clock = ManualClock::new();
        let mut page = page(&fake, &clock);
        assert!(!page.is_connected());
        assert_eq!(page.status_text(), "Not connected");

        fake.state().connectivity = CONNECTIVITY_FULL;
        clock.advance(ms(1999));
        page.tick();
        assert!(!page.is_connected());

        clock.advance(ms(1));
        page.tick();
        assert!(page.is_connected());
        assert_eq!(page.indicator(), Indicator::Connected);
        assert_eq!(page.status_text(), "Connected");
    }

    #[test]
    fn tick_reports_time_to_next_task() {
        let fake = FakeBackend::with_device();
        let clock = ManualClock::new();
        let mut page = page(&fake, &clock);
        assert_eq!(page.tick(), Some(ms(500)));
        clock.advance(ms(200));
        assert_eq!(page.tick(), Some(ms(300)));
    }

    #[test]
    fn missing_adapter_skips_scan() {
        let fake = FakeBackend::default();
        let clock = ManualClock::new();
        let mut page = page(&fake, &clock);
        page.scan();
        assert_eq!(fake.state().scans, 0);
        assert_eq!(page.status_text(), "No WiFi adapter found");
        assert!(!page.is_scanning());
    }

    #[test]
    fn failed_scan_reenables_button() {
        let fake = FakeBackend::with_device();
        fake.state().fail_scan = true;
        let clock = ManualClock::new();
        let mut page = page(&fake, &clock);
        page.scan();
        assert!(!page.is_scanning());
        assert_eq!(page.phase(), Phase::Idle);
    }

    #[test]
    fn open_network_connects_directly() {
        let fake = FakeBackend::with_device();
        fake.state().access_points = vec![ap("/ap/7", "cafe", 60, 0)];
        let clock = ManualClock::new();
        let mut page = loaded_page(&fake, &clock);

        page.select(0);
        page.request_connect();

        {
            let state = fake.state();
            assert_eq!(state.connects.len(), 1);
            let (settings, device, ap_path) = &state.connects[0];
            assert_eq!(device, "/dev/wlan0");
            assert_eq!(ap_path, "/ap/7");
            assert!(!settings.has_section("802-11-wireless-security"));
            assert_eq!(
                settings.get("connection", "id"),
                Some(&SettingValue::Str("cafe".into()))
            );
        }
        assert_eq!(page.phase(), Phase::Connecting);
        assert_eq!(page.indicator(), Indicator::Connecting);

        fake.state().connectivity = CONNECTIVITY_FULL;
        clock.advance(ms(3000));
        page.tick();
        assert_eq!(page.phase(), Phase::Idle);
        assert!(page.is_connected());
    }

    #[test]
    fn secured_network_waits_for_password() {
        let fake = FakeBackend::with_device();
        fake.state().access_points = vec![ap("/ap/9", "home", 80, AP_FLAGS_PRIVACY)];
        let clock = ManualClock::new();
        let mut page = loaded_page(&fake, &clock);

        page.select(0);
        page.request_connect();
        assert_eq!(page.awaiting_credential().map(|ap| ap.ssid.as_str()), Some("home"));
        assert!(fake.state().connects.is_empty());

        page.submit_credential(Some("hunter22".to_string()));
        let state = fake.state();
        assert_eq!(state.connects.len(), 1);
        assert_eq!(
            state.connects[0].0.get("802-11-wireless-security", "psk"),
            Some(&SettingValue::Str("hunter22".into()))
        );
    }

    #[test]
    fn empty_or_dismissed_password_never_connects() {
        let fake = FakeBackend::with_device();
        fake.state().access_points = vec![ap("/ap/9", "home", 80, AP_FLAGS_PRIVACY)];
        let clock = ManualClock::new();
        let mut page = loaded_page(&fake, &clock);
        page.select(0);

        page.request_connect();
        page.submit_credential(Some(String::new()));
        assert!(page.awaiting_credential().is_none());

        page.request_connect();
        page.submit_credential(None);

        assert!(fake.state().connects.is_empty());
        assert_eq!(page.phase(), Phase::Idle);
    }

    #[test]
    fn connect_failure_surfaces_message_without_retry() {
        let fake = FakeBackend::with_device();
        {
            let mut s = fake.state();
            s.access_points = vec![ap("/ap/7", "cafe", 60, 0)];
            s.fail_connect = Some(method_error(
                "org.freedesktop.NetworkManager.Device.Failed",
                "Secrets were required, but not provided",
            ));
        }
        let clock = ManualClock::new();
        let mut page = loaded_page(&fake, &clock);

        page.select(0);
        page.request_connect();

        assert_eq!(
            page.last_error(),
            Some("Secrets were required, but not provided")
        );
        assert_eq!(page.indicator(), Indicator::Disconnected);
        assert_eq!(page.status_text(), "Connection failed");
        assert_eq!(page.phase(), Phase::Idle);
        assert!(!page.is_connected());

        clock.advance(ms(10_000));
        page.tick();
        assert_eq!(fake.state().connects.len(), 1);

        page.dismiss_error();
        assert!(page.last_error().is_none());
    }

    #[test]
    fn connect_failure_without_detail_keeps_error_text() {
        let fake = FakeBackend::with_device();
        {
            let mut s = fake.state();
            s.access_points = vec![ap("/ap/7", "cafe", 60, 0)];
            s.fail_connect = Some(Error::BusUnavailable);
        }
        let clock = ManualClock::new();
        let mut page = loaded_page(&fake, &clock);

        page.select(0);
        page.request_connect();

        assert_eq!(page.last_error(), Some("D-Bus system bus is not connected"));
        assert_eq!(page.status_text(), "Connection failed");
    }

    #[test]
    fn selection_follows_ssid_across_reloads() {
        let fake = FakeBackend::with_device();
        fake.state().access_points = vec![ap("/ap/1", "a", 90, 0), ap("/ap/2", "b", 50, 0)];
        let clock = ManualClock::new();
        let mut page = loaded_page(&fake, &clock);
        page.select(1);

        fake.state().access_points = vec![ap("/ap/1", "a", 10, 0), ap("/ap/2", "b", 50, 0)];
        page.scan();
        clock.advance(ms(3000));
        page.tick();

        assert_eq!(page.selected().map(|ap| ap.ssid.as_str()), Some("b"));
        assert_eq!(page.networks()[0].ssid, "b");
    }

    #[test]
    fn step_follows_connectivity() {
        let fake = FakeBackend::with_device();
        let clock = ManualClock::new();
        let mut step = NetworkSetupStep::new(page(&fake, &clock));
        assert_eq!(step.pretty_name(), "Network");
        assert!(!step.is_next_enabled());
        assert!(step.is_back_enabled());
        assert!(step.jobs().is_empty());

        fake.state().connectivity = CONNECTIVITY_FULL;
        clock.advance(ms(2000));
        step.tick();
        assert!(step.is_next_enabled());
        assert_eq!(step.pretty_status(), "Connected");
    }
}
