use super::state::Toast;
use super::DocUploader;
use crate::upload::{NotificationLevel, Phase, ACCEPTED_EXTENSIONS, MAX_BYTES};
use crate::utils::format_size;
use eframe::egui::{self, Align2, Color32, RichText};
use rfd::FileDialog;
use std::time::Instant;

const ACCENT: Color32 = Color32::from_rgb(161, 89, 225);
const SUCCESS: Color32 = Color32::from_rgb(0, 180, 0);
const ERROR: Color32 = Color32::from_rgb(220, 50, 50);
const MUTED: Color32 = Color32::from_rgb(150, 150, 150);

enum Action {
    Pick,
    Upload,
    ToggleStatus,
    Cancel,
    Reset,
    Dismiss(u64),
}

impl DocUploader {
    pub fn render(&mut self, ctx: &egui::Context) {
        let mut action = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(20.0);
                ui.vertical_centered(|ui| {
                    ui.heading("Document Summarizer");
                    ui.add_space(5.0);
                    ui.label(
                        RichText::new("Upload a PDF, PNG or JPG and we'll summarize it")
                            .color(ui.visuals().text_color().gamma_multiply(0.7)),
                    );
                });
                ui.add_space(20.0);

                self.render_file_picker(ui, &mut action);
                ui.add_space(20.0);
                self.render_actions(ui, &mut action);
                ui.add_space(20.0);
                self.render_progress(ui);
            });
        });

        self.render_toasts(ctx, &mut action);

        match action {
            Some(Action::Pick) => {
                let picked = FileDialog::new()
                    .add_filter("Documents", &ACCEPTED_EXTENSIONS)
                    .pick_file();
                if let Some(path) = picked {
                    self.choose_file(&path);
                }
            }
            Some(Action::Upload) => self.start_upload(),
            Some(Action::ToggleStatus) => self.toggle_status(),
            Some(Action::Cancel) => self.cancel(),
            Some(Action::Reset) => self.reset(),
            Some(Action::Dismiss(id)) => self.toasts.dismiss(id),
            None => {}
        }
    }

    fn render_file_picker(&self, ui: &mut egui::Ui, action: &mut Option<Action>) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                let can_pick = !self.state.is_uploading();
                if ui
                    .add_enabled(can_pick, egui::Button::new("📄 Choose File"))
                    .clicked()
                {
                    *action = Some(Action::Pick);
                }

                match &self.state.selected_file {
                    Some(file) => {
                        ui.label(format!("{} ({})", file.name, format_size(file.size_bytes)));
                    }
                    None => {
                        ui.colored_label(
                            MUTED,
                            format!("PDF, PNG or JPG up to {}", format_size(MAX_BYTES)),
                        );
                    }
                }
            });

            if let Some(error) = &self.pick_error {
                ui.colored_label(ERROR, error);
            }
            for message in &self.state.validation_errors {
                ui.colored_label(ERROR, format!("• {}", message));
            }
        });
    }

    fn render_actions(&self, ui: &mut egui::Ui, action: &mut Option<Action>) {
        ui.vertical_centered(|ui| {
            let can_upload = !self.state.is_uploading() && self.state.selected_file.is_some();
            ui.add_enabled_ui(can_upload, |ui| {
                let button = egui::Button::new("📤 Upload").min_size(egui::vec2(200.0, 40.0));
                if ui.add(button).clicked() {
                    *action = Some(Action::Upload);
                }
            });

            ui.add_space(5.0);
            ui.horizontal(|ui| {
                if self.state.document_id.is_some() {
                    let label = if self.state.show_status {
                        "Hide status"
                    } else {
                        "Check status"
                    };
                    if ui.button(label).clicked() {
                        *action = Some(Action::ToggleStatus);
                    }
                }
                let polling = self.state.phase == Phase::Processing && !self.state.cancelled;
                if polling && ui.button("⏹ Stop checking").clicked() {
                    *action = Some(Action::Cancel);
                }
                let dirty = self.state.phase != Phase::Idle || self.state.selected_file.is_some();
                if dirty && ui.button("🗑 Clear").clicked() {
                    *action = Some(Action::Reset);
                }
            });
        });
    }

    fn render_progress(&self, ui: &mut egui::Ui) {
        let state = &self.state;

        if state.is_uploading() {
            ui.group(|ui| {
                if let Some(file) = &state.selected_file {
                    ui.label(format!("📤 Uploading: {}", file.name));
                }
                let progress_bar = egui::ProgressBar::new(state.progress_percent as f32 / 100.0)
                    .show_percentage()
                    .animate(false)
                    .fill(ACCENT);
                ui.add(progress_bar);
            });
        }

        if state.just_uploaded {
            ui.colored_label(
                SUCCESS,
                "✅ Upload finished. We'll process your document in the background.",
            );
        }

        if state.show_status {
            ui.add_space(10.0);
            ui.group(|ui| {
                let status = state.backend_status.as_deref().unwrap_or(state.phase.label());
                ui.horizontal(|ui| {
                    ui.label("Status:");
                    let color = match state.phase {
                        Phase::Done => SUCCESS,
                        Phase::Failed => ERROR,
                        _ => MUTED,
                    };
                    ui.colored_label(color, status);
                    if state.phase == Phase::Processing && !state.cancelled {
                        ui.spinner();
                    }
                });
                if let Some(id) = &state.document_id {
                    ui.colored_label(MUTED, format!("Document #{}", id));
                }
                if state.cancelled && state.phase == Phase::Processing {
                    ui.colored_label(MUTED, "No longer checking for updates.");
                }

                if let Some(summary) = &state.summary {
                    ui.add_space(8.0);
                    let text = match summary {
                        serde_json::Value::String(text) => text.clone(),
                        other => serde_json::to_string_pretty(other).unwrap_or_default(),
                    };
                    egui::ScrollArea::vertical()
                        .id_source("summary")
                        .max_height(250.0)
                        .show(ui, |ui| {
                            egui::Frame::none()
                                .fill(ui.style().visuals.extreme_bg_color)
                                .inner_margin(8.0)
                                .show(ui, |ui| {
                                    ui.label(RichText::new(text).monospace());
                                });
                        });
                }
            });
        }

        if let Some(error) = &state.error_message {
            ui.add_space(5.0);
            ui.vertical_centered(|ui| {
                ui.colored_label(ERROR, error);
            });
        }
    }

    fn render_toasts(&self, ctx: &egui::Context, action: &mut Option<Action>) {
        let toasts = self.toasts.visible(Instant::now());
        if toasts.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("toasts"))
            .anchor(Align2::RIGHT_TOP, [-12.0, 12.0])
            .show(ctx, |ui| {
                for toast in &toasts {
                    if render_toast(ui, toast) {
                        *action = Some(Action::Dismiss(toast.id));
                    }
                    ui.add_space(6.0);
                }
            });
    }
}

/// Draws one toast. Returns true when it was clicked away.
fn render_toast(ui: &mut egui::Ui, toast: &Toast) -> bool {
    let (icon, color) = match toast.notification.level {
        NotificationLevel::Success => ("✅", SUCCESS),
        NotificationLevel::Info => ("📄", ACCENT),
        NotificationLevel::Error => ("❌", ERROR),
    };

    let response = egui::Frame::popup(ui.style())
        .show(ui, |ui| {
            ui.set_max_width(280.0);
            ui.horizontal(|ui| {
                ui.label(icon);
                ui.colored_label(color, RichText::new(&toast.notification.title).strong());
            });
            if let Some(description) = &toast.notification.description {
                ui.label(description);
            }
        })
        .response;

    response.interact(egui::Sense::click()).clicked()
}
