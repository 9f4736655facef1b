use eframe::egui;

use crate::common::EngineState;
use crate::ui::state::AppState;

pub fn render(ui: &mut egui::Ui, state: &AppState) {
    ui.heading("Relay");
    ui.separator();

    let (color, label) = match state.connection {
        EngineState::Connected => (egui::Color32::GREEN, "Connected"),
        EngineState::Connecting => (egui::Color32::YELLOW, "Connecting..."),
        EngineState::Disconnected => (egui::Color32::RED, "Disconnected"),
        EngineState::Idle => (egui::Color32::GRAY, "Idle"),
    };
    ui.horizontal(|ui| {
        ui.colored_label(color, "●");
        ui.label(label);
    });

    ui.label(format!("{} messages", state.messages.len()));

    if state.missed.is_empty() {
        return;
    }

    ui.separator();
    ui.label(format!("While you were away ({}):", state.missed.len()));
    for message in state.missed.iter().rev().take(5) {
        ui.label(
            egui::RichText::new(format!("[{}] {}", message.time, message.text)).weak(),
        );
    }
}
