use crate::conversation::Conversation;
use crate::reveal::run_reveal;
use crate::transcript::{ChatTurn, TurnId};
use crate::types::Role;
use comrak::{ComrakOptions, markdown_to_html as render_markdown};
use dioxus::prelude::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

pub const TRANSCRIPT_ELEMENT_ID: &str = "chat-messages";
pub const COMPOSER_ELEMENT_ID: &str = "chat-composer";
const COMPOSER_MAX_HEIGHT_PX: u32 = 120;

static MARKDOWN_OPTIONS: Lazy<ComrakOptions> = Lazy::new(|| {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.autolink = true;
    options
});

/// Raw HTML in answers is escaped, not passed through.
pub fn markdown_to_html(md: &str) -> String {
    render_markdown(md, &MARKDOWN_OPTIONS)
}

/// Settled assistant text is shown as Markdown; everything else stays plain.
pub fn renders_as_markdown(turn: &ChatTurn) -> bool {
    turn.role == Role::Assistant && turn.is_settled()
}

/// Rendered HTML per turn. A turn is rendered again only when its text
/// changes.
#[derive(Debug, Default)]
pub struct MarkdownCache {
    entries: HashMap<TurnId, (String, Rc<str>)>,
}

impl MarkdownCache {
    pub fn render(&mut self, id: TurnId, text: &str) -> Rc<str> {
        if let Some((source, html)) = self.entries.get(&id) {
            if source == text {
                return html.clone();
            }
        }
        let html: Rc<str> = markdown_to_html(text).into();
        self.entries.insert(id, (text.to_string(), html.clone()));
        html
    }

    /// Forgets turns that are no longer in the transcript.
    pub fn retain(&mut self, keep: impl Fn(TurnId) -> bool) {
        self.entries.retain(|id, _| keep(*id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

pub fn format_message_timestamp(timestamp: Option<OffsetDateTime>) -> Option<String> {
    let mut datetime = timestamp?;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime.format(MESSAGE_TIME_FORMAT).ok()
}

fn composer_resize_script() -> String {
    format!(
        "requestAnimationFrame(() => {{ const el = document.getElementById('{COMPOSER_ELEMENT_ID}'); if (el) {{ el.style.height = 'auto'; el.style.height = Math.min(el.scrollHeight, {COMPOSER_MAX_HEIGHT_PX}) + 'px'; }} }});"
    )
}

/// Grows the composer with its content, up to a fixed cap.
pub fn fit_composer_height() {
    let _ = document::eval(&composer_resize_script());
}

pub fn scroll_transcript_to_bottom() {
    let script = format!(
        "const el = document.getElementById('{TRANSCRIPT_ELEMENT_ID}'); if (el) {{ el.scrollTop = el.scrollHeight; }}"
    );
    let _ = document::eval(&script);
}

/// Types out turn `id` on the current scope. The task ends by itself once the
/// turn is settled or gone, and is dropped with the scope.
pub fn spawn_reveal(mut conversation: Signal<Conversation>, id: TurnId, tick: Duration) {
    spawn(async move {
        run_reveal(tick, || {
            let step = conversation.with_mut(|c| c.transcript_mut().advance_reveal(id));
            scroll_transcript_to_bottom();
            step
        })
        .await;
    });
}

pub fn copy_to_clipboard(text: String) {
    #[cfg(not(target_arch = "wasm32"))]
    {
        match arboard::Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(err) = clipboard.set_text(text) {
                    tracing::warn!(error = %err, "failed to copy answer");
                }
            }
            Err(err) => tracing::warn!(error = %err, "clipboard unavailable"),
        }
    }
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(&text) {
            Ok(literal) => {
                let _ = document::eval(&format!("navigator.clipboard.writeText({literal});"));
            }
            Err(err) => tracing::warn!(error = %err, "failed to encode answer for clipboard"),
        }
    }
}
