use crate::config::ClientConfig;
use crate::conversation::Conversation;
use crate::views::ChatView;
use crate::views::shared::spawn_reveal;
use dioxus::prelude::*;

const APP_CSS: Asset = asset!("/assets/ragchat.css");

fn load_config() -> ClientConfig {
    match ClientConfig::load() {
        Ok(config) => {
            tracing::info!(api_base = %config.api_base, "loaded configuration");
            config
        }
        Err(err) => {
            tracing::error!("falling back to default configuration: {err:#}");
            ClientConfig::default()
        }
    }
}

#[component]
pub fn App() -> Element {
    let config = use_context_provider(load_config);
    let conversation = use_signal(Conversation::new);

    rsx! {
        document::Link { rel: "stylesheet", href: APP_CSS }
        AppHeader { conversation, config }
        ChatView { conversation }
    }
}

#[component]
fn AppHeader(conversation: Signal<Conversation>, config: ClientConfig) -> Element {
    let mut conversation = conversation;
    let tick = config.reveal_interval;
    // Reveal ticks rewrite the conversation; the header only tracks the session.
    let session = use_memo(move || conversation.read().session().to_string())();
    let session_short = session.get(..8).unwrap_or(&session).to_string();

    rsx! {
        div { class: "header",
            div { class: "header-content",
                h1 { class: "header-title", "Document Q&A" }
                span { class: "session-id", title: "{session}", "session {session_short}" }
                button {
                    class: "btn btn-ghost",
                    r#type: "button",
                    onclick: move |_| {
                        let welcome = conversation.with_mut(|c| c.reset_session());
                        spawn_reveal(conversation, welcome, tick);
                    },
                    "New chat"
                }
            }
        }
    }
}
