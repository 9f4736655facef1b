use eframe::egui;

pub fn render(ui: &mut egui::Ui, input_text: &mut String) -> Option<String> {
    let mut send = false;
    ui.horizontal(|ui| {
        let response = ui.add(egui::TextEdit::singleline(input_text).hint_text("Message"));
        if ui.button("Send").clicked() {
            send = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = true;
            response.request_focus();
        }
    });

    // blank input stays in the box and is never submitted
    if send && !input_text.trim().is_empty() {
        return Some(std::mem::take(input_text));
    }

    None
}
