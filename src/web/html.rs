//! HTML shell and shared fragments.
//!
//! Pages are plain strings rendered on the server; interactivity comes from
//! HTMX attributes, so no client bundle beyond `/static/vendor` is required.

use std::fmt::Write as _;

use crate::chat::{ChatMessage, Conversation, Origin};
use crate::clients::{self, ClientRecord};

/// Escape text for use in element content and quoted attributes.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Full document around `content`.
#[must_use]
pub fn shell(title: &str, content: &str) -> String {
    let title = escape(title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en" class="dark">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Relationship memory for every account">
    <title>{title} - Relationship Memory</title>

    <script src="/static/vendor/htmx-2.0.8.min.js"></script>
    <link rel="stylesheet" href="/static/app.css">
</head>
<body class="min-h-screen bg-background text-foreground antialiased">
    <header class="sticky top-0 z-50 w-full border-b border-border bg-background/95 backdrop-blur">
        <div class="container mx-auto flex h-16 items-center justify-between px-6 max-w-7xl">
            <a href="/" class="font-semibold text-lg">Relationship Memory</a>
            <nav class="flex items-center gap-4 text-sm" hx-boost="true">
                <a href="/chatbot" class="text-muted-foreground hover:text-foreground">Chatbot</a>
                <a href="/knowledge-graph" class="text-muted-foreground hover:text-foreground">Knowledge Graph</a>
                <a href="/avatar" class="text-muted-foreground hover:text-foreground">Avatar</a>
                <a href="/reels" class="text-muted-foreground hover:text-foreground">Reels</a>
            </nav>
        </div>
    </header>
    <main id="app" class="container mx-auto px-6 py-12 max-w-7xl">
        {content}
    </main>
</body>
</html>"#
    )
}

/// "Back to Home" button.
#[must_use]
pub fn back_home() -> &'static str {
    r#"<a href="/" class="btn btn-outline mb-8 inline-block">← Back to Home</a>"#
}

/// Client/project card linking to the detail page.
#[must_use]
pub fn client_card(client: &ClientRecord) -> String {
    let band = client.health();
    let logo = client.logo.map_or_else(
        || r#"<span class="logo-placeholder" aria-hidden="true">🏢</span>"#.to_string(),
        |src| {
            format!(
                r#"<img src="{}" alt="{}" class="w-12 h-12 object-contain">"#,
                escape(src),
                escape(client.name)
            )
        },
    );

    format!(
        r#"<a href="/client/{id}" class="card client-card">
    <div class="w-16 h-16 rounded-lg bg-muted flex items-center justify-center">{logo}</div>
    <h3 class="text-2xl font-semibold">{name}</h3>
    <p class="text-sm text-muted-foreground">{points} data points captured</p>
    <div class="space-y-2">
        <div class="flex items-center justify-between text-sm">
            <span class="text-muted-foreground">Relationship Health</span>
            <span class="font-medium">{label}</span>
        </div>
        <div class="w-full h-2 bg-muted rounded-full overflow-hidden">
            <div class="h-full {bar}" style="width: {score}%"></div>
        </div>
        <p class="text-xs text-muted-foreground">{score}% complete</p>
    </div>
</a>"#,
        id = escape(client.id),
        name = escape(client.name),
        points = group_thousands(client.data_points),
        label = band.label(),
        bar = band.bar_class(),
        score = client.health_score,
    )
}

/// `1247` → `1,247`.
#[must_use]
pub fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn message_bubble(message: &ChatMessage) -> String {
    let (row, bubble) = match message.from {
        Origin::User => ("justify-end", "bg-foreground text-background"),
        Origin::System => ("justify-start", "bg-muted border border-dashed border-border"),
        Origin::Assistant => ("justify-start", "bg-muted border border-border"),
    };
    format!(
        r#"<div class="flex {row}"><div class="max-w-[80%] p-3 rounded-lg {bubble}"><div class="text-sm whitespace-pre-wrap">{}</div></div></div>"#,
        escape(&message.text)
    )
}

/// Messages plus input row for one conversation.
///
/// While an answer is pending the input is disabled and the fragment
/// re-fetches itself until the placeholder has been replaced.
#[must_use]
pub fn transcript(conversation: &Conversation) -> String {
    let id = escape(conversation.id());
    let pending = conversation.is_pending();

    let mut messages = String::new();
    for message in conversation.messages() {
        messages.push_str(&message_bubble(&message));
    }

    let poll = if pending {
        format!(r#" hx-get="/chat/{id}/transcript" hx-trigger="load delay:750ms" hx-swap="outerHTML""#)
    } else {
        String::new()
    };
    let disabled = if pending { " disabled" } else { "" };

    format!(
        r##"<div id="transcript-{id}" class="flex flex-col flex-1 min-h-0"{poll}>
    <div class="flex-1 overflow-y-auto p-4 space-y-4" aria-live="polite">{messages}</div>
    <form class="flex gap-2 border-t border-border p-4"
          hx-post="/chat/{id}/send"
          hx-target="#transcript-{id}"
          hx-swap="outerHTML">
        <input type="hidden" name="company_id" value="{context}">
        <input type="text" name="message" placeholder="Ask about this account..." autocomplete="off"
               class="flex-1 border border-border rounded-md bg-background text-sm px-3 py-2"{disabled}>
        <button type="submit" class="btn btn-primary text-sm px-4"{disabled}>Send</button>
    </form>
</div>"##,
        context = escape(conversation.context_id()),
    )
}

/// Chat panel: transcript plus the canned briefing/reel actions.
#[must_use]
pub fn chat_panel(conversation: &Conversation) -> String {
    format!(
        r#"<section id="chat-panel" class="flex flex-col h-[32rem] bg-card border border-border rounded-lg">
    {transcript}
    <div class="flex gap-2 px-4 pb-4">
        <details class="text-xs"><summary class="btn btn-outline">Brief Me</summary>{brief}</details>
        <details class="text-xs"><summary class="btn btn-outline">Play Reel</summary>{reel}</details>
    </div>
</section>"#,
        transcript = transcript(conversation),
        brief = bullet_list(clients::BRIEFING, "ul"),
        reel = bullet_list(clients::REEL, "ol"),
    )
}

fn bullet_list(items: &[&str], tag: &str) -> String {
    let mut out = format!("<{tag}>");
    for item in items {
        let _ = write!(out, "<li>{}</li>", escape(item));
    }
    let _ = write!(out, "</{tag}>");
    out
}
