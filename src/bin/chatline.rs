//! Interactive terminal client for the chat service.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a local backend
//! chatline
//!
//! # Talk through a tunnel with a shared secret
//! chatline --api-base https://example.trycloudflare.com --auth my-secret-key
//!
//! # A relative base resolved against an origin
//! chatline --api-base /api --origin http://chat.local:8000
//! ```
//!
//! # Commands
//!
//! - `/attach <file>` - Attach an image to the next message
//! - `/detach` - Remove the attached image
//! - `/reload` - Reload the conversation history
//! - `/session` - Show the session identifier
//! - `/quit` - Exit the application

use std::path::Path;
use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use chatline::commands::{ChatCommand, help_text, parse_command};
use chatline::{
    ChatArgs, ChatClient, ChatController, ClientConfig, FileSessionStore, LogReporter,
    MemorySessionStore, PlainTextRenderer, SendOutcome, SessionStore,
};

/// Main entry point for the chatline application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let (args, _) = ChatArgs::from_command_line_relaxed("chatline [OPTIONS]");
    let config = ClientConfig::from(args).with_auth_from_env();
    let use_color = config.use_color;

    let client = ChatClient::new(&config)?;
    let base_url = client.base_url().clone();
    let (store, storage_label) = open_store(&config);
    let controller = ChatController::new(
        client,
        config,
        store.as_ref(),
        Box::new(PlainTextRenderer::with_color(use_color)),
        Arc::new(LogReporter),
    );
    let mut rl = DefaultEditor::new()?;

    println!("chatline ({base_url})");
    println!("Type /help for commands, /quit to exit\n");

    controller.load_history().await;

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = rl.add_history_entry(trimmed);
                }

                if let Some(cmd) = parse_command(trimmed) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Attach(path) => {
                            match controller.select_file(Some(Path::new(&path))) {
                                Ok(_) => {}
                                Err(err) => controller.error(&format!("Cannot attach {path}: {err}")),
                            }
                        }
                        ChatCommand::Detach => {
                            controller.clear_attachment();
                            controller.info("Attachment removed.");
                        }
                        ChatCommand::Reload => {
                            controller.load_history().await;
                        }
                        ChatCommand::Session => {
                            controller.info(&format!("Session: {}", controller.session_id()));
                            if controller.is_session_persistent() {
                                controller.info(&format!("Stored in: {storage_label}"));
                            } else {
                                controller.info("Stored in: (not persisted)");
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            controller.error(&message);
                        }
                    }
                    continue;
                }

                if controller.send(trimmed).await == SendOutcome::Busy {
                    controller.error("A message is already being sent.");
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                controller.error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn open_store(config: &ClientConfig) -> (Box<dyn SessionStore>, String) {
    if config.ephemeral {
        return (Box::new(MemorySessionStore::new()), "(memory)".to_string());
    }
    match config
        .storage_path
        .clone()
        .or_else(FileSessionStore::default_path)
    {
        Some(path) => {
            let label = path.display().to_string();
            (Box::new(FileSessionStore::new(path)), label)
        }
        None => {
            log::warn!("no storage path and no HOME; session will not persist");
            (Box::new(MemorySessionStore::new()), "(memory)".to_string())
        }
    }
}
