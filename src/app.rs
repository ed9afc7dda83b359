use ratatui::widgets::ListState;
use tokio::sync::mpsc;
use tracing::warn;

use crate::chat::ChatClient;
use crate::sidebar::{course_sidebar, visible_rows, DocRef, SidebarItem, SidebarRow};

/// Verbatim fallback shown when the backend cannot be reached, the body is
/// not JSON, or the `answer` field is missing. All failures look the same
/// to the user.
pub const FALLBACK_REPLY: &str =
    "Bot: Backend not reachable. Make sure backend is running on port 8000!";

/// Greeting shown while the transcript is empty.
pub const WELCOME_LINE: &str = "Hi! Ask me anything about Physical AI & Humanoid Robotics!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Bot,
}

/// One transcript entry. `text` carries the display prefix ("You: " or
/// "Bot: ") exactly as it is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,

    // Chat panel state
    pub chat_open: bool,
    pub transcript: Vec<ChatMessage>,
    pub draft: String,
    pub draft_cursor: usize, // cursor position in draft, in chars
    pub pending: usize,      // sends still waiting for their reply
    pub chat_scroll: u16,
    pub chat_height: u16,    // inner height of the message area, set during render
    pub chat_width: u16,     // inner width of the message area, set during render
    pub animation_frame: u8, // 0-2 for the thinking ellipsis

    // Sidebar state
    pub sidebar: Vec<SidebarItem>,
    pub sidebar_state: ListState,
    pub selected_doc: Option<DocRef>,

    pub client: ChatClient,
    reply_tx: mpsc::UnboundedSender<String>,
}

impl App {
    /// Resolved bot lines come back through `reply_tx`; the caller owns the
    /// receiving end and feeds completions to [`App::resolve_reply`].
    pub fn new(client: ChatClient, reply_tx: mpsc::UnboundedSender<String>) -> Self {
        let mut sidebar_state = ListState::default();
        sidebar_state.select(Some(0));

        Self {
            should_quit: false,

            chat_open: false,
            transcript: Vec::new(),
            draft: String::new(),
            draft_cursor: 0,
            pending: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,

            sidebar: course_sidebar(),
            sidebar_state,
            selected_doc: None,

            client,
            reply_tx,
        }
    }

    // Chat visibility. Pure flips: transcript and draft are untouched, and
    // in-flight requests are never cancelled.
    pub fn open_chat(&mut self) {
        self.chat_open = true;
    }

    pub fn close_chat(&mut self) {
        self.chat_open = false;
    }

    // Draft editing
    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.draft, self.draft_cursor);
        self.draft.insert(byte_pos, c);
        self.draft_cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.draft_cursor > 0 {
            self.draft_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.draft, self.draft_cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.draft_cursor = self.draft_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.draft_cursor < self.draft.chars().count() {
            self.draft_cursor += 1;
        }
    }

    /// Submit the draft. An empty or whitespace-only draft is a no-op.
    /// Otherwise the user line is appended immediately, the draft is
    /// cleared, and one background task is spawned that resolves to exactly
    /// one bot line: the backend's answer, or the fallback on any failure.
    /// The input stays live while requests are in flight; overlapping sends
    /// each resolve independently, in whatever order their replies arrive.
    pub fn send(&mut self) {
        let question = self.draft.trim().to_string();
        if question.is_empty() {
            return;
        }

        self.transcript.push(ChatMessage {
            role: ChatRole::User,
            text: format!("You: {}", question),
        });
        self.draft.clear();
        self.draft_cursor = 0;
        self.pending += 1;
        self.scroll_chat_to_bottom();

        let client = self.client.clone();
        let tx = self.reply_tx.clone();
        tokio::spawn(async move {
            let line = match client.ask(&question).await {
                Ok(answer) => format!("Bot: {}", answer),
                Err(err) => {
                    warn!(error = %err, endpoint = client.endpoint(), "chat request failed");
                    FALLBACK_REPLY.to_string()
                }
            };
            // Receiver gone means the app is shutting down.
            let _ = tx.send(line);
        });
    }

    /// Append a settled bot line to the transcript.
    pub fn resolve_reply(&mut self, line: String) {
        self.transcript.push(ChatMessage {
            role: ChatRole::Bot,
            text: line,
        });
        self.pending = self.pending.saturating_sub(1);
        self.scroll_chat_to_bottom();
    }

    /// Scroll the chat view so the most recent entry is visible. Called on
    /// every transcript change.
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 40 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            40
        };

        let mut total_lines: u16 = 0;

        for msg in &self.transcript {
            for line in msg.text.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count.saturating_sub(1) / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.pending > 0 {
            total_lines += 1; // "Thinking..." line
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            10
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines - visible_height;
        } else {
            self.chat_scroll = 0;
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.pending > 0 {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Sidebar navigation
    pub fn sidebar_rows(&self) -> Vec<SidebarRow> {
        visible_rows(&self.sidebar)
    }

    pub fn nav_down(&mut self) {
        let len = self.sidebar_rows().len();
        if len > 0 {
            let i = self.sidebar_state.selected().unwrap_or(0);
            self.sidebar_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn nav_up(&mut self) {
        let i = self.sidebar_state.selected().unwrap_or(0);
        self.sidebar_state.select(Some(i.saturating_sub(1)));
    }

    /// Enter on a category toggles its collapsed state; Enter on a doc
    /// selects it for the content pane.
    pub fn nav_activate(&mut self) {
        let rows = self.sidebar_rows();
        let Some(selected) = self.sidebar_state.selected() else {
            return;
        };

        match rows.get(selected) {
            Some(SidebarRow::Category { index, .. }) => {
                if let SidebarItem::Category {
                    collapsible,
                    collapsed,
                    ..
                } = &mut self.sidebar[*index]
                {
                    if *collapsible {
                        *collapsed = !*collapsed;
                    }
                }
            }
            Some(SidebarRow::Doc(doc)) | Some(SidebarRow::Child(doc)) => {
                self.selected_doc = Some(*doc);
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> (App, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        // Unit tests here never wait for a reply, so the endpoint is inert.
        let app = App::new(ChatClient::new("http://127.0.0.1:9/chat"), tx);
        (app, rx)
    }

    #[test]
    fn toggling_chat_leaves_transcript_alone() {
        let (mut app, _rx) = test_app();
        app.transcript.push(ChatMessage {
            role: ChatRole::Bot,
            text: "Bot: hello".to_string(),
        });

        assert!(!app.chat_open);
        app.open_chat();
        app.close_chat();
        app.open_chat();

        assert!(app.chat_open);
        assert_eq!(app.transcript.len(), 1);
    }

    #[tokio::test]
    async fn empty_send_is_a_noop() {
        let (mut app, _rx) = test_app();
        app.send();
        assert!(app.transcript.is_empty());

        app.draft = "   \t ".to_string();
        app.draft_cursor = app.draft.chars().count();
        app.send();

        assert!(app.transcript.is_empty());
        assert_eq!(app.draft, "   \t ");
        assert_eq!(app.pending, 0);
    }

    #[tokio::test]
    async fn send_appends_user_line_and_clears_draft() {
        let (mut app, _rx) = test_app();
        app.draft = "  What is ROS 2?  ".to_string();
        app.draft_cursor = app.draft.chars().count();

        app.send();

        assert_eq!(app.transcript.len(), 1);
        assert_eq!(app.transcript[0].role, ChatRole::User);
        assert_eq!(app.transcript[0].text, "You: What is ROS 2?");
        assert!(app.draft.is_empty());
        assert_eq!(app.draft_cursor, 0);
        assert_eq!(app.pending, 1);
    }

    #[test]
    fn draft_editing_is_utf8_safe() {
        let (mut app, _rx) = test_app();
        for c in "ros²".chars() {
            app.insert_char(c);
        }
        app.cursor_left();
        app.delete_char(); // removes the 's'
        app.insert_char('b');

        assert_eq!(app.draft, "rob²");
        assert_eq!(app.draft_cursor, 3);
    }

    #[test]
    fn activating_a_category_toggles_collapse() {
        let (mut app, _rx) = test_app();
        let before = app.sidebar_rows().len();

        // Row 1 is the first chapter category (expanded by default).
        app.sidebar_state.select(Some(1));
        app.nav_activate();
        assert_eq!(app.sidebar_rows().len(), before - 1);

        app.nav_activate();
        assert_eq!(app.sidebar_rows().len(), before);
    }

    #[test]
    fn activating_a_doc_selects_it() {
        let (mut app, _rx) = test_app();
        app.sidebar_state.select(Some(0));
        app.nav_activate();
        assert_eq!(app.selected_doc.map(|d| d.id), Some("intro"));
    }
}
