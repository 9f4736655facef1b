use eframe::egui;

use crate::common::Message;

const INPUT_BAR_HEIGHT: f32 = 36.0;

pub fn render(ui: &mut egui::Ui, messages: &[Message]) {
    let max_height = (ui.available_height() - INPUT_BAR_HEIGHT).max(0.0);
    egui::ScrollArea::vertical()
        .max_height(max_height)
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            if messages.is_empty() {
                ui.label(egui::RichText::new("No messages yet").weak());
                return;
            }
            for message in messages {
                bubble(ui, message);
            }
        });
}

/// Tin nhắn của mình nằm bên phải, của peer bên trái.
fn bubble(ui: &mut egui::Ui, message: &Message) {
    let layout = if message.is_local() {
        egui::Layout::right_to_left(egui::Align::TOP)
    } else {
        egui::Layout::left_to_right(egui::Align::TOP)
    };

    ui.with_layout(layout, |ui| {
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.label(&message.text);
            ui.label(egui::RichText::new(&message.time).small().weak());
        });
    });
}
