//! What the installer host needs from a step.

use std::time::Duration;

use eframe::egui;

use crate::error::Result;

/// Deferred work the host runs after the last step.
pub trait Job {
    fn pretty_name(&self) -> String;
    fn exec(&mut self) -> Result<()>;
}

pub type JobList = Vec<Box<dyn Job>>;

pub trait ViewStep {
    fn pretty_name(&self) -> String;

    fn pretty_status(&self) -> String {
        String::new()
    }

    /// Draws the step's page.
    fn ui(&mut self, ui: &mut egui::Ui);

    fn is_next_enabled(&self) -> bool;
    fn is_back_enabled(&self) -> bool;
    fn is_at_beginning(&self) -> bool;
    fn is_at_end(&self) -> bool;

    fn jobs(&self) -> JobList;

    fn set_configuration_map(&mut self, config: &serde_yaml::Value) -> Result<()>;

    /// Called each time the step becomes the current one.
    fn on_activate(&mut self) {}

    /// Runs scheduled work that is due and returns how long until the next
    /// task, if any.
    fn tick(&mut self) -> Option<Duration> {
        None
    }
}
