mod common;
mod config;
mod error;
mod headless;
mod network;
mod sync;
mod ui;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use network::{ConnectionManager, MessageCodec};
use sync::SyncEngine;
use ui::{ChatApp, DesktopNotifier, NoticeBoard};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(
    name = "relay_chat",
    version,
    about = "Minimal real-time chat client for a Socket.IO relay"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Relay endpoint, overrides the config file and RELAY_ENDPOINT
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Run in the terminal (stdin lines are sent, the log is printed)
    Headless,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    config::resolve_endpoint(&mut app_config, cli.endpoint);

    if cli.mode == Some(Mode::Headless) {
        headless::run(app_config).await?;
        return Ok(());
    }

    run_desktop(app_config).await?;
    Ok(())
}

async fn run_desktop(app_config: AppConfig) -> Result<(), eframe::Error> {
    // 1. Collaborators mà host cung cấp cho Sync Engine
    let foreground = Arc::new(AtomicBool::new(true));
    let notices = NoticeBoard::default();
    let notifier = DesktopNotifier::new(notices.clone(), app_config.notifications);

    // 2. Khởi chạy Sync Engine (chạy ngầm, sở hữu kết nối relay)
    let relay = ConnectionManager::new(app_config.endpoint.clone(), app_config.reconnect_policy());
    let engine = SyncEngine::start(
        relay,
        MessageCodec::new(app_config.sender_tags()),
        foreground.clone(),
        Arc::new(notifier),
    );
    let handle = engine.handle();

    // 3. Khởi chạy UI (Chạy trên Main Thread)
    let options = eframe::NativeOptions::default();
    log::info!("Client started against {}", app_config.endpoint);

    let result = eframe::run_native(
        "Relay Chat",
        options,
        Box::new(move |cc| Ok(Box::new(ChatApp::new(cc, handle, foreground, notices)))),
    );

    engine.shutdown().await;
    result
}
