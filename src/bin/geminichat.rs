//! Interactive terminal client for the geminichat bridge server.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a server on localhost:3000
//! geminichat
//!
//! # Talk to another server, without colors
//! geminichat --server http://chat.example.com/ --no-color
//! ```
//!
//! # Commands
//!
//! - `/new` - Start a new chat
//! - `/list` - Show all chats
//! - `/select <n>`, `/delete <n>`, `/menu <n>` - Sidebar actions
//! - `/attach <path>` - Attach an image to the next message
//! - `/clear` - Clear the current chat
//! - `/quit` - Exit the application

use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

use geminichat::Attachment;
use geminichat::chat::{
    ChatCommand, ChatController, ClientArgs, ClientConfig, HttpTransport, SidebarEntry,
    SubmitOutcome, TerminalSurface, help_text, parse_command,
};

const DEFAULT_LOG_FILTER: &str = "warn";

/// Main entry point for the geminichat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ClientArgs::from_command_line_relaxed("geminichat [OPTIONS]");
    let config = ClientConfig::from(args);

    let transport = HttpTransport::new(&config.server)?;
    let controller = ChatController::new(transport);
    let mut surface = TerminalSurface::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    // Ctrl+C while waiting on the server abandons the wait.
    let interrupt = Arc::new(Notify::new());
    let interrupt_clone = Arc::clone(&interrupt);
    ctrlc::set_handler(move || {
        interrupt_clone.notify_waiters();
    })?;

    controller.draw(&mut surface).await;
    println!("Gemini Chat (server: {})", config.server);
    println!("Type /help for commands, /quit to exit\n");

    loop {
        let readline = rl.readline("> ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    let _ = rl.add_history_entry(line);
                }

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::New => {
                            let index = controller.new_chat().await;
                            controller.draw(&mut surface).await;
                            print_info(&format!("Started chat {}.", index + 1));
                        }
                        ChatCommand::Select(index) => match controller.select_chat(index).await {
                            Ok(()) => controller.draw(&mut surface).await,
                            Err(err) => print_error(&err.to_string()),
                        },
                        ChatCommand::Delete(index) => match controller.delete_chat(index).await {
                            Ok(()) => {
                                controller.draw(&mut surface).await;
                                print_info(&format!("Deleted chat {}.", index + 1));
                            }
                            Err(err) => print_error(&err.to_string()),
                        },
                        ChatCommand::Menu(index) => match controller.toggle_menu(index).await {
                            Ok(()) => print_sidebar(&controller.snapshot().await.sidebar),
                            Err(err) => print_error(&err.to_string()),
                        },
                        ChatCommand::Clear => {
                            controller.clear_chat().await;
                            controller.draw(&mut surface).await;
                        }
                        ChatCommand::Attach(path) => match Attachment::from_path(&path) {
                            Ok(attachment) => {
                                let name = attachment.file_name.clone();
                                controller.attach(attachment).await;
                                print_info(&format!(
                                    "Attached {name}. Send a message, or press enter to have it described."
                                ));
                            }
                            Err(err) => print_error(&format!("Failed to read {path}: {err}")),
                        },
                        ChatCommand::List => {
                            print_sidebar(&controller.snapshot().await.sidebar);
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            print_error(&message);
                        }
                    }
                    continue;
                }

                let outcome = tokio::select! {
                    outcome = controller.submit(line) => Some(outcome),
                    _ = interrupt.notified() => None,
                };
                match outcome {
                    Some(SubmitOutcome::Sent) => controller.draw(&mut surface).await,
                    Some(SubmitOutcome::Busy) => print_info("Still waiting for the last reply."),
                    Some(SubmitOutcome::Ignored) => {}
                    None => {
                        controller.draw(&mut surface).await;
                        println!("[interrupted]");
                    }
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
                print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_sidebar(entries: &[SidebarEntry]) {
    println!("    Chats:");
    for entry in entries {
        let marker = if entry.active { '*' } else { ' ' };
        println!("    {marker} {}. {}", entry.index + 1, entry.label);
        if entry.menu_open {
            println!("         [delete: /delete {}]", entry.index + 1);
        }
    }
}

fn print_info(info: &str) {
    println!("{info}");
}

fn print_error(error: &str) {
    eprintln!("Error: {error}");
}
