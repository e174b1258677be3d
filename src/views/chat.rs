use crate::api::{RagBackend, RagClient, UploadFile};
use crate::config::ClientConfig;
use crate::conversation::{Conversation, REWRITE_STYLES};
use crate::transcript::{ChatTurn, TurnId, TurnOrigin, TurnState};
use crate::types::Role;
use crate::views::shared::{
    COMPOSER_ELEMENT_ID, MarkdownCache, TRANSCRIPT_ELEMENT_ID, copy_to_clipboard,
    fit_composer_height, format_message_timestamp, renders_as_markdown,
    scroll_transcript_to_bottom, spawn_reveal,
};
use dioxus::events::Key;
use dioxus::prelude::*;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

#[component]
pub fn ChatView(conversation: Signal<Conversation>) -> Element {
    let config = use_context::<ClientConfig>();
    let tick = config.reveal_interval;
    let client = use_hook(|| Rc::new(RagClient::from_config(&config)));
    let markdown = use_hook(|| Rc::new(RefCell::new(MarkdownCache::default())));
    let mut input = use_signal(String::new);
    let mut selected_file = use_signal(|| Option::<UploadFile>::None);

    // Reveal whatever the conversation started with (the welcome turn).
    use_hook(move || {
        for id in conversation.peek().transcript().revealing_ids() {
            spawn_reveal(conversation, id, tick);
        }
    });

    let ask = {
        let client = client.clone();
        let mut conversation = conversation;
        use_callback(move |text: String| {
            let Some(pending) = conversation.with_mut(|c| c.begin_ask(&text)) else {
                return;
            };
            input.set(String::new());
            fit_composer_height();
            scroll_transcript_to_bottom();

            let client = client.clone();
            spawn(async move {
                let outcome = client.ask(pending.session(), pending.question()).await;
                if let Some(id) = conversation.with_mut(|c| c.complete_ask(pending, outcome)) {
                    spawn_reveal(conversation, id, tick);
                }
            });
        })
    };

    let rewrite = {
        let client = client.clone();
        let mut conversation = conversation;
        use_callback(move |(turn, style): (TurnId, String)| {
            let Some(pending) = conversation.with_mut(|c| c.begin_rewrite(turn, &style)) else {
                return;
            };
            scroll_transcript_to_bottom();

            let client = client.clone();
            spawn(async move {
                let outcome = client
                    .rewrite(pending.session(), pending.answer(), pending.style())
                    .await;
                if let Some(id) = conversation.with_mut(|c| c.complete_rewrite(pending, outcome)) {
                    spawn_reveal(conversation, id, tick);
                }
            });
        })
    };

    let upload = {
        let client = client.clone();
        let mut conversation = conversation;
        use_callback(move |_: ()| {
            let Some(file) = selected_file() else {
                return;
            };
            let Some(pending) = conversation.with_mut(|c| c.begin_upload(file)) else {
                return;
            };

            let client = client.clone();
            spawn(async move {
                let outcome = client.upload(pending.session(), pending.file()).await;
                if let Some(id) = conversation.with_mut(|c| c.complete_upload(pending, outcome)) {
                    spawn_reveal(conversation, id, tick);
                }
            });
        })
    };

    let (rows, awaiting, upload_status, indexed_chunks) = {
        let snapshot = conversation.read();
        let turns = snapshot.transcript().turns();
        let mut cache = markdown.borrow_mut();
        let live: HashSet<TurnId> = turns.iter().map(|turn| turn.id).collect();
        cache.retain(|id| live.contains(&id));
        let rows: Vec<(ChatTurn, Option<Rc<str>>)> = turns
            .iter()
            .map(|turn| {
                let html = renders_as_markdown(turn).then(|| cache.render(turn.id, &turn.text));
                (turn.clone(), html)
            })
            .collect();
        (
            rows,
            snapshot.is_awaiting(),
            snapshot.upload_status().label(),
            snapshot.indexed_chunks(),
        )
    };

    rsx! {
        div { class: "main-container",
            form {
                class: "upload-row",
                onsubmit: move |ev| {
                    ev.prevent_default();
                    upload.call(());
                },
                input {
                    r#type: "file",
                    accept: ".pdf,.txt",
                    onchange: move |ev: FormEvent| async move {
                        let Some(engine) = ev.files() else {
                            selected_file.set(None);
                            return;
                        };
                        let names = engine.files();
                        if names.len() > 1 {
                            tracing::warn!(count = names.len(), "only the first selected file is uploaded");
                        }
                        let Some(name) = names.into_iter().next() else {
                            selected_file.set(None);
                            return;
                        };
                        match engine.read_file(&name).await {
                            Some(bytes) => selected_file.set(Some(UploadFile::new(name, bytes))),
                            None => {
                                tracing::warn!(file = %name, "could not read selected file");
                                selected_file.set(None);
                            }
                        }
                    },
                }
                button {
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: selected_file.read().is_none(),
                    "Upload"
                }
                span { class: "upload-status", "{upload_status}" }
                if indexed_chunks > 0 {
                    span { class: "indexed-count", "{indexed_chunks} chunks indexed this session" }
                }
            }

            div { id: TRANSCRIPT_ELEMENT_ID, class: "chat-list",
                for (turn, html) in rows {
                    TurnRow {
                        key: "{turn.id}",
                        rewrite_enabled: !awaiting,
                        on_rewrite: rewrite,
                        html: html.clone(),
                        turn: turn.clone(),
                    }
                }
            }

            form {
                class: "composer",
                onsubmit: move |ev| {
                    ev.prevent_default();
                    ask.call(input());
                },
                div { class: "composer-inner",
                    textarea {
                        id: COMPOSER_ELEMENT_ID,
                        rows: "1",
                        placeholder: "Ask a question about your documents…",
                        value: "{input}",
                        oninput: move |ev| {
                            input.set(ev.value());
                            fit_composer_height();
                        },
                        onkeydown: move |ev| {
                            if ev.key() == Key::Enter && !ev.modifiers().shift() {
                                ev.prevent_default();
                                ask.call(input());
                            }
                        },
                    }
                    button {
                        class: "btn btn-primary",
                        r#type: "submit",
                        disabled: awaiting || input().trim().is_empty(),
                        "Ask"
                    }
                }
            }
        }
    }
}

#[component]
fn TurnRow(
    turn: ChatTurn,
    #[props(!optional)] html: Option<Rc<str>>,
    rewrite_enabled: bool,
    on_rewrite: EventHandler<(TurnId, String)>,
) -> Element {
    let role_class = turn.role.css_class();
    let show_actions = turn.role == Role::Assistant
        && turn.origin == TurnOrigin::Answer
        && turn.state == TurnState::Settled;
    let id = turn.id;
    let copy_payload = turn.text.clone();

    let body = match (&turn.state, &html) {
        (TurnState::Typing, _) => rsx! {
            div { class: "typing",
                div { class: "dot" }
                div { class: "dot" }
                div { class: "dot" }
            }
        },
        (_, Some(html)) => rsx! {
            div { class: "message-text md", dangerous_inner_html: "{html}" }
        },
        (_, None) => rsx! {
            div { class: "message-text", "{turn.text}" }
        },
    };

    rsx! {
        div { class: "message-row {role_class}",
            div { class: "avatar {role_class}-avatar", "{turn.role.avatar()}" }
            div { class: "message-bubble",
                div { class: "message-name", "{turn.role.display_name()}" }
                {body}
                if !turn.sources.is_empty() {
                    div { class: "sources-heading", "Sources:" }
                    ul { class: "sources",
                        for source in turn.sources.iter() {
                            li { "{source.label()}" }
                        }
                    }
                }
                if show_actions {
                    div { class: "bubble-controls",
                        button {
                            class: "action-btn",
                            r#type: "button",
                            title: "Copy answer",
                            onclick: move |_| copy_to_clipboard(copy_payload.clone()),
                            "Copy"
                        }
                        for style in REWRITE_STYLES.iter().copied() {
                            button {
                                class: "action-btn",
                                r#type: "button",
                                title: "Rewrite this answer",
                                disabled: !rewrite_enabled,
                                onclick: move |_| on_rewrite.call((id, style.to_string())),
                                "{style}"
                            }
                        }
                    }
                }
                if let Some(ts) = format_message_timestamp(turn.created_at) {
                    div { class: "message-meta", span { class: "message-timestamp", "{ts}" } }
                }
            }
        }
    }
}
