use std::env;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use installer_steps::app::InstallerApp;
use installer_steps::config::Settings;
use installer_steps::dbus::NmDbus;
use installer_steps::de_packages::DePackagesStep;
use installer_steps::network_setup::{NetworkSetupPage, NetworkSetupStep};
use installer_steps::scheduler::MonotonicClock;
use installer_steps::store::{GlobalStorage, KEY_USERNAME};
use installer_steps::viewstep::ViewStep;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let settings = match args.get(1) {
        Some(path) => Settings::load(Path::new(path))
            .with_context(|| format!("failed to load settings from {path}"))?,
        None => Settings::default(),
    };

    let mut gs = GlobalStorage::new();
    if let Some(username) = &settings.username {
        gs.insert(KEY_USERNAME, username.as_str());
    }
    let storage = gs.shared();

    let page = NetworkSetupPage::new(
        Box::new(NmDbus::new()),
        Box::new(MonotonicClock::new()),
        settings.network,
    );
    let mut network = NetworkSetupStep::new(page);
    if let Err(err) = network.set_configuration_map(&settings.network_setup) {
        tracing::warn!("ignoring network_setup configuration: {err}");
    }

    let mut desktop = DePackagesStep::new(
        Some(storage.clone()),
        settings.flag_files.clone(),
        settings.branding.clone(),
    );
    if let Err(err) = desktop.set_configuration_map(&settings.de_packages) {
        tracing::warn!("ignoring de_packages configuration, using defaults: {err}");
    }

    let steps: Vec<Box<dyn ViewStep>> = vec![Box::new(network), Box::new(desktop)];

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "installer-steps",
        options,
        Box::new(move |cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(InstallerApp::new(steps, storage)))
        }),
    )
    .map_err(|err| anyhow!("failed to start GUI: {err}"))
}
