use anyhow::Result;
use tokio::sync::mpsc;

use bookbot::app::App;
use bookbot::chat::ChatClient;
use bookbot::config::Config;
use bookbot::{handler, tui, ui};

/// Diagnostics go to a file next to the config; the alternate screen owns
/// the terminal while the app runs.
fn init_tracing() {
    let Some(dir) = dirs::config_dir() else {
        return;
    };
    let dir = dir.join("bookbot");
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }

    if let Ok(file) = std::fs::File::create(dir.join("bookbot.log")) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .try_init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::load().unwrap_or_default();
    let client = ChatClient::new(&config.resolved_endpoint());

    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
    let mut app = App::new(client, reply_tx);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(event) => handler::handle_event(&mut app, event),
                    None => break,
                }
            }
            Some(line) = reply_rx.recv() => {
                app.resolve_reply(line);
            }
        }
    }

    tui::restore()?;
    Ok(())
}
