//! Step that turns the chosen desktop into a package install operation.

use eframe::egui;
use serde::Deserialize;
use serde_json::json;

use crate::branding::Branding;
use crate::desktops;
use crate::error::{Error, Result};
use crate::flags::FlagFiles;
use crate::models::{DesktopChoice, DesktopConfig};
use crate::store::{
    KEY_DISPLAY_MANAGER, KEY_PACKAGE_OPERATIONS, KEY_SELECTION, KEY_USERNAME, SharedStorage,
};
use crate::viewstep::{JobList, ViewStep};

const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(0xc6, 0x28, 0x28);
const OK_COLOR: egui::Color32 = egui::Color32::from_rgb(0x2e, 0x7d, 0x32);

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DePackagesConfig {
    items: Vec<DesktopChoice>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Status {
    message: String,
    is_error: bool,
}

#[derive(Debug)]
pub struct DePackagesStep {
    storage: Option<SharedStorage>,
    flags: FlagFiles,
    branding: Branding,
    /// `None` until the configuration lists at least one item.
    configured: Option<Vec<DesktopChoice>>,
    last_selection: Option<String>,
    status: Status,
    can_proceed: bool,
}

impl DePackagesStep {
    pub fn new(storage: Option<SharedStorage>, flags: FlagFiles, branding: Branding) -> Self {
        Self {
            storage,
            flags,
            branding,
            configured: None,
            last_selection: None,
            status: Status {
                message: "Select a desktop to continue.".to_string(),
                is_error: true,
            },
            can_proceed: false,
        }
    }

    /// Configured choices, or every known desktop when nothing is configured.
    pub fn choices(&self) -> Vec<DesktopChoice> {
        match &self.configured {
            Some(choices) => choices.clone(),
            None => desktops::ids()
                .map(|id| DesktopChoice {
                    id: id.to_string(),
                    name: id.to_string(),
                    ..DesktopChoice::default()
                })
                .collect(),
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.last_selection.as_deref()
    }

    pub fn status_message(&self) -> &str {
        &self.status.message
    }

    pub fn status_is_error(&self) -> bool {
        self.status.is_error
    }

    /// The user picked `id` on this page.
    pub fn select(&mut self, id: &str) -> Result<&'static DesktopConfig> {
        self.apply_selection(id)
    }

    /// Validates `id` against the desktop table and, when it is known,
    /// records the install operation, display manager and selection.
    /// An unknown id leaves storage untouched and blocks progression.
    pub fn apply_selection(&mut self, id: &str) -> Result<&'static DesktopConfig> {
        let Some(storage) = self.storage.clone() else {
            return Err(self.storage_unavailable());
        };

        let Some(config) = desktops::lookup(id) else {
            tracing::warn!(desktop = id, "unknown desktop selection");
            self.set_status(format!("{id} is not a supported desktop choice."), true);
            self.can_proceed = false;
            return Err(Error::UnknownDesktop(id.to_string()));
        };

        let username = {
            let mut gs = storage.borrow_mut();
            gs.insert(KEY_SELECTION, id);
            gs.insert(
                KEY_PACKAGE_OPERATIONS,
                json!([{ "install": config.packages }]),
            );
            gs.insert(KEY_DISPLAY_MANAGER, config.display_manager);
            gs.string(KEY_USERNAME)
        };

        self.flags
            .write_selection(id, config.display_manager, Some(username.as_str()));

        self.last_selection = Some(id.to_string());

        tracing::debug!(
            desktop = id,
            packages = ?config.packages,
            display_manager = config.display_manager,
            "desktop selection applied"
        );

        self.set_status(
            format!("{id} will install: {}.", config.packages.join(", ")),
            false,
        );
        self.can_proceed = true;
        Ok(config)
    }

    fn update_selection(&mut self) {
        let Some(storage) = self.storage.clone() else {
            self.storage_unavailable();
            return;
        };

        let selection = storage.borrow().string(KEY_SELECTION);
        if selection.is_empty() {
            self.set_status("Select a desktop to continue.", true);
            self.can_proceed = false;
            self.last_selection = None;
            return;
        }

        if self.last_selection.as_deref() == Some(selection.as_str()) && !self.status.is_error {
            self.can_proceed = true;
            return;
        }

        if let Err(err) = self.apply_selection(&selection) {
            tracing::debug!("stored desktop selection rejected: {err}");
        }
    }

    fn storage_unavailable(&mut self) -> Error {
        tracing::warn!("global storage unavailable");
        self.set_status("Unable to access installer storage.", true);
        self.can_proceed = false;
        Error::StorageUnavailable
    }

    fn set_status(&mut self, message: impl Into<String>, is_error: bool) {
        self.status = Status {
            message: message.into(),
            is_error,
        };
    }

    fn draw_choice(&mut self, ui: &mut egui::Ui, choice: &DesktopChoice) {
        let selected = self.selected() == Some(choice.id.as_str());
        let visuals = ui.visuals().clone();
        let (stroke_width, stroke_color) = if selected {
            (2.0, visuals.selection.stroke.color)
        } else {
            (1.0, visuals.widgets.noninteractive.bg_stroke.color)
        };

        let mut frame = egui::Frame::group(ui.style())
            .stroke(egui::Stroke::new(stroke_width, stroke_color))
            .inner_margin(egui::Margin::symmetric(14, 12));
        if selected {
            frame = frame.fill(visuals.selection.bg_fill.gamma_multiply(0.2));
        }

        frame.show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                match self.branding.resolve_screenshot(&choice.screenshot) {
                    Some(path) => {
                        ui.add(
                            egui::Image::new(format!("file://{}", path.display()))
                                .max_size(egui::vec2(140.0, 100.0)),
                        );
                    }
                    None => {
                        egui::Frame::group(ui.style()).show(ui, |ui| {
                            ui.add_sized(
                                [140.0, 100.0],
                                egui::Label::new(
                                    egui::RichText::new(&choice.name).strong().size(14.0),
                                ),
                            );
                        });
                    }
                }

                ui.vertical(|ui| {
                    if ui.radio(selected, choice.name.as_str()).clicked() && !selected {
                        if let Err(err) = self.select(&choice.id) {
                            tracing::debug!("selection rejected: {err}");
                        }
                    }
                    if !choice.description.is_empty() {
                        ui.label(choice.description.as_str());
                    }
                });
            });
        });
    }
}

impl ViewStep for DePackagesStep {
    fn pretty_name(&self) -> String {
        "Desktop Packages".to_string()
    }

    fn pretty_status(&self) -> String {
        self.status.message.clone()
    }

    fn ui(&mut self, ui: &mut egui::Ui) {
        ui.heading(egui::RichText::new("Desktop Packages").size(18.0).strong());
        ui.label("Your desktop selection determines which packages will be installed.");
        ui.add_space(10.0);

        let color = if self.status.is_error {
            ERROR_COLOR
        } else {
            OK_COLOR
        };
        ui.label(egui::RichText::new(&self.status.message).color(color));

        ui.add_space(15.0);
        ui.label("Select a desktop environment to install:");

        let choices = self.choices();
        egui::ScrollArea::vertical().show(ui, |ui| {
            if choices.is_empty() {
                ui.label("No desktop environments are available.");
            }
            for choice in &choices {
                self.draw_choice(ui, choice);
                ui.add_space(10.0);
            }
        });
    }

    fn is_next_enabled(&self) -> bool {
        self.can_proceed
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

    fn jobs(&self) -> JobList {
        Vec::new()
    }

    fn set_configuration_map(&mut self, config: &serde_yaml::Value) -> Result<()> {
        let config: DePackagesConfig = if config.is_null() {
            DePackagesConfig::default()
        } else {
            serde_yaml::from_value(config.clone())?
        };

        let items: Vec<DesktopChoice> = config
            .items
            .into_iter()
            .filter(|item| !item.id.is_empty())
            .map(|mut item| {
                if item.name.is_empty() {
                    item.name = item.id.clone();
                }
                item
            })
            .collect();

        if items.is_empty() {
            self.configured = None;
            return Ok(());
        }

        let known = items
            .into_iter()
            .filter(|item| {
                let known = desktops::contains(&item.id);
                if !known {
                    tracing::warn!(desktop = %item.id, "configuration references unknown desktop");
                }
                known
            })
            .collect();
        self.configured = Some(known);
        Ok(())
    }

    fn on_activate(&mut self) {
        if self.choices().is_empty() {
            self.set_status("No desktops are configured for installation.", true);
            self.can_proceed = false;
            return;
        }
        self.update_selection();
    }
}
