use std::time::Duration;

use eframe::egui;

use crate::store::SharedStorage;
use crate::viewstep::ViewStep;

/// Minimal installer shell: shows the steps in order and moves between them
/// as their predicates allow.
pub struct InstallerApp {
    steps: Vec<Box<dyn ViewStep>>,
    current: usize,
    storage: SharedStorage,
    activated: bool,
    finished: bool,
}

impl InstallerApp {
    pub fn new(steps: Vec<Box<dyn ViewStep>>, storage: SharedStorage) -> Self {
        Self {
            steps,
            current: 0,
            storage,
            activated: false,
            finished: false,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn current_step(&self) -> Option<&dyn ViewStep> {
        self.steps.get(self.current).map(|s| s.as_ref())
    }

    fn activate_current(&mut self) {
        if let Some(step) = self.steps.get_mut(self.current) {
            step.on_activate();
        }
    }

    pub fn can_go_next(&self) -> bool {
        !self.finished
            && self
                .current_step()
                .is_some_and(|s| s.is_next_enabled() && s.is_at_end())
    }

    pub fn can_go_back(&self) -> bool {
        !self.finished
            && self.current > 0
            && self
                .current_step()
                .is_some_and(|s| s.is_back_enabled() && s.is_at_beginning())
    }

    pub fn go_next(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        if self.current + 1 < self.steps.len() {
            self.current += 1;
            self.activate_current();
        } else {
            self.finish();
        }
        true
    }

    pub fn go_back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.current -= 1;
        self.activate_current();
        true
    }

    fn finish(&mut self) {
        for step in &self.steps {
            for mut job in step.jobs() {
                if let Err(err) = job.exec() {
                    tracing::warn!(job = %job.pretty_name(), "job failed: {err}");
                }
            }
        }
        self.finished = true;
        tracing::info!(storage = %self.storage.borrow().to_json(), "all steps complete");
    }

    /// Drives every step's timers, visible or not.
    pub fn tick(&mut self) -> Option<Duration> {
        self.steps
            .iter_mut()
            .filter_map(|step| step.tick())
            .min()
    }
}

impl eframe::App for InstallerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.activated {
            self.activated = true;
            self.activate_current();
        }

        if let Some(wake) = self.tick() {
            ctx.request_repaint_after(wake);
        }

        egui::SidePanel::left("steps_panel").show(ctx, |ui| {
            for (i, step) in self.steps.iter().enumerate() {
                let name = egui::RichText::new(step.pretty_name());
                if i == self.current && !self.finished {
                    ui.label(name.strong());
                } else {
                    ui.label(name.weak());
                }
            }
        });

        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let status = self
                    .current_step()
                    .map(|s| s.pretty_status())
                    .unwrap_or_default();
                ui.label(status);

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let last = self.current + 1 == self.steps.len();
                    let next_label = if last { "Done" } else { "Next" };
                    if ui
                        .add_enabled(self.can_go_next(), egui::Button::new(next_label))
                        .clicked()
                    {
                        self.go_next();
                    }
                    if ui
                        .add_enabled(self.can_go_back(), egui::Button::new("Back"))
                        .clicked()
                    {
                        self.go_back();
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.finished {
                ui.heading("All steps are complete.");
                return;
            }
            if let Some(step) = self.steps.get_mut(self.current) {
                step.ui(ui);
            }
        });
    }
}
