use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use crate::common::{Message, Sender};
use crate::config::AppConfig;
use crate::network::{ConnectionManager, MessageCodec};
use crate::sync::{LogNotifier, SyncEngine};

/// Chế độ terminal: mỗi dòng stdin là một tin nhắn, log được in ra stdout.
pub async fn run(config: AppConfig) -> std::io::Result<()> {
    let relay = ConnectionManager::new(config.endpoint.clone(), config.reconnect_policy());
    // the terminal is where the user is looking
    let foreground = Arc::new(AtomicBool::new(true));
    let engine = SyncEngine::start(
        relay,
        MessageCodec::new(config.sender_tags()),
        foreground,
        Arc::new(LogNotifier),
    );

    let printer = tokio::spawn(print_log(engine.subscribe()));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => engine.submit(&line),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    printer.abort();
    log::info!("Session ended with {} messages", engine.snapshot().len());
    engine.shutdown().await;
    Ok(())
}

async fn print_log(mut log: watch::Receiver<Vec<Message>>) {
    let mut printed: Vec<Message> = Vec::new();

    while log.changed().await.is_ok() {
        let entries = log.borrow_and_update().clone();
        let fresh = if entries.starts_with(&printed) {
            &entries[printed.len()..]
        } else {
            println!("--- history ---");
            &entries[..]
        };
        for message in fresh {
            println!("{}", format_line(message));
        }
        printed = entries;
    }
}

pub fn format_line(message: &Message) -> String {
    let who = match message.sender {
        Sender::LocalUser => "you",
        Sender::RemotePeer => "peer",
    };
    format!("[{}] {who}: {}", message.time, message.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_by_sender() {
        let message = Message {
            id: 1,
            text: "hi".to_string(),
            sender: Sender::RemotePeer,
            time: "10:00".to_string(),
        };
        assert_eq!(format_line(&message), "[10:00] peer: hi");

        let mine = Message {
            sender: Sender::LocalUser,
            ..message
        };
        assert_eq!(format_line(&mine), "[10:00] you: hi");
    }
}
