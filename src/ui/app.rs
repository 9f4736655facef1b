use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use eframe::egui;

use crate::sync::EngineHandle;

use super::components::{chat_area, input_bar, status_panel};
use super::notifier::NoticeBoard;
use super::state::AppState;

pub struct ChatApp {
    state: AppState,
    engine: EngineHandle,
    foreground: Arc<AtomicBool>,
    notices: NoticeBoard,
}

impl ChatApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        engine: EngineHandle,
        foreground: Arc<AtomicBool>,
        notices: NoticeBoard,
    ) -> Self {
        notices.attach(&cc.egui_ctx);
        spawn_repaint_on_change(&cc.egui_ctx, &engine);

        Self {
            state: AppState::new(),
            engine,
            foreground,
            notices,
        }
    }

    /// Foreground = focused and not minimized.
    fn track_foreground(&mut self, ctx: &egui::Context) {
        let (focused, minimized) = ctx.input(|i| {
            let viewport = i.viewport();
            (
                viewport.focused.unwrap_or(true),
                viewport.minimized.unwrap_or(false),
            )
        });
        let visible = focused && !minimized;
        self.foreground.store(visible, Ordering::Relaxed);

        self.state.record_missed(self.notices.take());
        if visible {
            self.state.clear_missed();
        }
    }
}

/// Log và trạng thái kết nối thay đổi thì vẽ lại, không cần poll.
fn spawn_repaint_on_change(ctx: &egui::Context, engine: &EngineHandle) {
    let ctx = ctx.clone();
    let mut log = engine.subscribe();
    let mut state = engine.watch_state();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = log.changed() => if changed.is_err() { break },
                changed = state.changed() => if changed.is_err() { break },
            }
            ctx.request_repaint();
        }
    });
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.track_foreground(ctx);
        self.state.sync_from(&self.engine);

        egui::SidePanel::left("status_sidebar").show(ctx, |ui| {
            status_panel::render(ui, &self.state);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Relay Chat");
            ui.separator();
            chat_area::render(ui, &self.state.messages);

            ui.separator();
            if let Some(content) = input_bar::render(ui, &mut self.state.input_text) {
                self.engine.submit(&content);
            }
        });
    }
}
