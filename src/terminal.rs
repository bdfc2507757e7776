use kalenterichat::components::chat::ChatController;
use kalenterichat::components::events_panel::EventsPanelHandle;
use kalenterichat::components::page::render_page;
use kalenterichat::error::ChatResult;
use rust_i18n::t;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Message(String),
    Events,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Command {
    match line.trim() {
        "/events" => Command::Events,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Message(line.to_string()),
    }
}

/// Interactive terminal front-end over the chat controller and events panel
pub struct Session {
    chat: Arc<ChatController>,
    events: EventsPanelHandle,
    export_html: Option<PathBuf>,
    printed: usize,
}

impl Session {
    pub fn new(chat: Arc<ChatController>, events: EventsPanelHandle, export_html: Option<PathBuf>) -> Self {
        Self {
            chat,
            events,
            export_html,
            printed: 0,
        }
    }

    fn print_new_messages(&mut self) {
        for message in self.chat.messages_since(self.printed) {
            println!("{}", message.render_plain());
            self.printed += 1;
        }
    }

    /// Write the rendered page, if an export path is configured
    async fn export(&self) {
        let Some(path) = &self.export_html else {
            return;
        };

        let html = match render_page(
            &self.chat.transcript(),
            &self.chat.submit_button(),
            &self.chat.draft(),
            &self.events.state(),
        ) {
            Ok(html) => html,
            Err(e) => {
                error!("Failed to render page: {}", e);
                return;
            }
        };
        match tokio::fs::write(path, html).await {
            Ok(()) => debug!("Exported page to {}", path.display()),
            Err(e) => error!("Failed to export page to {}: {}", path.display(), e),
        }
    }

    /// Export the page once and open it in the default browser
    pub async fn open_in_browser(&self) -> ChatResult<()> {
        match &self.export_html {
            Some(path) => {
                self.export().await;
                webbrowser::open(&path.to_string_lossy())?;
                info!("Opened {} in browser", path.display());
            }
            None => warn!("Nothing to open: no export path configured"),
        }
        Ok(())
    }

    /// Read lines until end of input, `/quit` or a shutdown signal
    pub async fn run(&mut self, backend_url: &str, mut shutdown: oneshot::Receiver<()>) -> ChatResult<()> {
        println!("{}", t!("session_welcome", url = backend_url));

        let mut updates = self.events.subscribe();
        let mut chat_updates = self.chat.subscribe();
        // Initial load, as on page open
        let _ = self.events.refresh_after(Duration::ZERO);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut turn: Option<JoinHandle<()>> = None;
        let mut end_of_input = false;
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        end_of_input = true;
                        break;
                    };
                    match parse_command(&line) {
                        Command::Quit => break,
                        Command::Help => println!("{}", t!("session_help")),
                        Command::Events => {
                            let _ = self.events.refresh_after(Duration::ZERO);
                        }
                        Command::Message(text) => {
                            // Not awaited; the chat branch below prints and exports each step
                            let chat = Arc::clone(&self.chat);
                            turn = Some(tokio::spawn(async move {
                                let outcome = chat.submit(&text).await;
                                debug!("Chat turn finished: {:?}", outcome);
                            }));
                        }
                    }
                }
                changed = chat_updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    chat_updates.borrow_and_update();
                    self.print_new_messages();
                    self.export().await;
                }
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = updates.borrow_and_update().clone();
                    if !state.is_loading() {
                        println!("{}", state.render_plain());
                    }
                    self.export().await;
                }
                _ = &mut shutdown => break,
            }
        }

        // Piped input: let the last reply arrive before leaving
        if let Some(turn) = turn.filter(|_| end_of_input) {
            if let Err(e) = turn.await {
                warn!("Chat turn did not finish: {}", e);
            }
            self.print_new_messages();
            self.export().await;
        }

        println!("{}", t!("session_goodbye"));
        Ok(())
    }
}
