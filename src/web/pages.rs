//! Page handlers.

use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::AppState;
use crate::clients::{self, ClientRecord};
use crate::context::resolve_context_id;

use super::html::{back_home, chat_panel, client_card, escape, group_thousands, shell};

/// Marketing/feature pages reachable with or without a client id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Chatbot,
    Avatar,
    KnowledgeGraph,
    Reels,
}

impl Feature {
    fn title(self) -> &'static str {
        match self {
            Self::Chatbot => "Chatbot",
            Self::Avatar => "Avatar",
            Self::KnowledgeGraph => "Knowledge Graph",
            Self::Reels => "Reels",
        }
    }

    /// Path segment under `/client/{id}/`.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Chatbot => "chatbot",
            Self::Avatar => "avatar",
            Self::KnowledgeGraph => "knowledge-graph",
            Self::Reels => "reels",
        }
    }

    fn tagline(self) -> &'static str {
        match self {
            Self::Chatbot => "Ask anything about your accounts and get answers grounded in every email, call, and meeting.",
            Self::Avatar => "Interact with an AI persona that embodies your account's knowledge and history.",
            Self::KnowledgeGraph => "See how people, decisions, and commitments connect across your relationships.",
            Self::Reels => "Short, focused highlight reels that bring anyone up to speed in minutes.",
        }
    }

    fn sections(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Chatbot => &[
                (
                    "Instant Answers",
                    "No more digging through inboxes or asking colleagues. Just ask the chatbot, and get the context you need in seconds.",
                ),
                (
                    "Full History",
                    "The chatbot understands the full history of your relationship: what was promised, what went wrong, and who cares about what.",
                ),
            ],
            Self::Avatar => &[
                (
                    "Human-Like Interactions",
                    "The Avatar doesn't just answer questions. It engages in natural conversations and understands context, tone, and nuance.",
                ),
                (
                    "Embodies Your Relationships",
                    "Every commitment and every escalation shapes how the Avatar speaks about an account.",
                ),
            ],
            Self::KnowledgeGraph => &[
                (
                    "Visual Exploration",
                    "Navigate through your relationship history visually. Click on nodes to explore deeper and trace decision paths.",
                ),
                (
                    "Hidden Connections",
                    "Discover how different aspects of your business connect, from a late PO to a pricing dispute.",
                ),
            ],
            Self::Reels => &[
                (
                    "Bite-Sized Context",
                    "Each reel distills weeks of correspondence into the few moments that matter.",
                ),
                (
                    "Onboard in Minutes",
                    "A new account owner can watch the reel before the first call and never ask the customer to repeat themselves.",
                ),
            ],
        }
    }
}

/// GET `/`
pub async fn index() -> Html<String> {
    let cards = |records: &[ClientRecord]| -> String {
        records.iter().map(client_card).collect::<Vec<_>>().join("\n")
    };

    let content = format!(
        r#"<section class="text-center space-y-8 pb-24">
    <h1 class="text-6xl md:text-8xl font-bold leading-none">Never lose the context of a relationship.</h1>
    <p class="text-2xl text-muted-foreground font-light max-w-4xl mx-auto">
        When a new buyer takes over an account, they start with zero context. We capture every email, call,
        and meeting and make it accessible as a Chatbot, Knowledge Graph, Avatar, or Reels.
    </p>
</section>
<section class="space-y-8 pb-16">
    <h2 class="text-4xl font-semibold">Clients</h2>
    <div class="grid md:grid-cols-2 lg:grid-cols-4 gap-6">
{clients}
    </div>
</section>
<section class="space-y-8">
    <h2 class="text-4xl font-semibold">Internal Projects</h2>
    <div class="grid md:grid-cols-3 gap-6">
{projects}
    </div>
</section>"#,
        clients = cards(clients::CLIENTS),
        projects = cards(clients::INTERNAL_PROJECTS),
    );

    Html(shell("Home", &content))
}

/// GET `/client/{id}`
pub async fn client_detail(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(client) = clients::find(&id) else {
        let content = format!(
            r#"<div class="flex flex-col items-center justify-center py-20 space-y-6">
    <h1 class="text-2xl font-bold">Client not found</h1>
    <p class="text-muted-foreground">No account with id "{}".</p>
    {}
</div>"#,
            escape(&id),
            back_home()
        );
        return (StatusCode::NOT_FOUND, Html(shell("Client not found", &content))).into_response();
    };

    let conversation = state.conversations.create(client.id);
    let band = client.health();

    let mut activity = String::new();
    for item in clients::RECENT_ACTIVITY {
        activity.push_str(&format!(
            r#"<li class="flex justify-between gap-4"><span>{}</span><span class="text-xs {}">{} · {}</span></li>"#,
            escape(item.text),
            item.accent,
            escape(item.source),
            escape(item.ago)
        ));
    }

    let links = [
        Feature::Chatbot,
        Feature::KnowledgeGraph,
        Feature::Avatar,
        Feature::Reels,
    ]
    .iter()
    .map(|f| {
        format!(
            r#"<a href="/client/{}/{}" class="btn btn-outline">{}</a>"#,
            escape(client.id),
            f.slug(),
            f.title()
        )
    })
    .collect::<Vec<_>>()
    .join("\n");

    let content = format!(
        r#"{back}
<div class="grid lg:grid-cols-[1fr_400px] gap-12">
    <div class="space-y-10">
        <h1 class="text-5xl md:text-6xl font-bold leading-tight">{name}</h1>
        <div class="grid grid-cols-2 gap-6">
            <div class="card p-6">
                <p class="text-sm text-muted-foreground">Relationship Health</p>
                <p class="text-2xl font-semibold {score_class}">{score}%</p>
                <p class="text-xs text-muted-foreground">{label}</p>
            </div>
            <div class="card p-6">
                <p class="text-sm text-muted-foreground">Data Points</p>
                <p class="text-2xl font-semibold">{points}</p>
            </div>
        </div>
        <div class="card p-6 space-y-4">
            <h2 class="text-xl font-semibold">Recent activity</h2>
            <ul class="space-y-3 text-sm">{activity}</ul>
        </div>
        <nav class="flex flex-wrap gap-3">{links}</nav>
    </div>
    <aside>{chat}</aside>
</div>"#,
        back = back_home(),
        name = escape(client.name),
        score_class = band.text_class(),
        score = client.health_score,
        label = band.label(),
        points = group_thousands(client.data_points),
        chat = chat_panel(&conversation),
    );

    Html(shell(client.name, &content)).into_response()
}

/// Render a feature page. The chatbot page embeds a chat panel scoped to
/// the resolved context identifier.
pub fn feature_page(
    state: &AppState,
    feature: Feature,
    client_id: Option<&str>,
    path: &str,
) -> Html<String> {
    let mut sections = String::new();
    for (heading, body) in feature.sections() {
        sections.push_str(&format!(
            r#"<div class="bg-card border border-border rounded-lg p-12">
    <h2 class="text-3xl font-semibold mb-6">{}</h2>
    <p class="text-xl text-muted-foreground font-light leading-relaxed">{}</p>
</div>"#,
            escape(heading),
            escape(body)
        ));
    }

    let chat = if feature == Feature::Chatbot {
        let context = resolve_context_id(client_id, path, &state.config.chat.default_company_id);
        let conversation = state.conversations.create(&context);
        format!(
            r#"<div id="chat-demo" class="grid lg:grid-cols-2 gap-12 pt-12"><div>{sections}</div>{panel}</div>"#,
            panel = chat_panel(&conversation)
        )
    } else {
        format!(r#"<div class="space-y-8 pt-12">{sections}</div>"#)
    };

    let content = format!(
        r#"{back}
<div class="space-y-12">
    <h1 class="text-6xl md:text-8xl font-bold">{title}</h1>
    <p class="text-2xl md:text-3xl text-muted-foreground font-light max-w-4xl">{tagline}</p>
    {chat}
</div>"#,
        back = back_home(),
        title = feature.title(),
        tagline = escape(feature.tagline()),
    );

    Html(shell(feature.title(), &content))
}

macro_rules! feature_handlers {
    ($($bare:ident, $scoped:ident => $feature:expr;)*) => {
        $(
            pub async fn $bare(
                State(state): State<AppState>,
                OriginalUri(uri): OriginalUri,
            ) -> Html<String> {
                feature_page(&state, $feature, None, uri.path())
            }

            pub async fn $scoped(
                State(state): State<AppState>,
                Path(id): Path<String>,
                OriginalUri(uri): OriginalUri,
            ) -> Html<String> {
                feature_page(&state, $feature, Some(&id), uri.path())
            }
        )*
    };
}

feature_handlers! {
    chatbot, client_chatbot => Feature::Chatbot;
    avatar, client_avatar => Feature::Avatar;
    knowledge_graph, client_knowledge_graph => Feature::KnowledgeGraph;
    reels, client_reels => Feature::Reels;
}

/// Catch-all 404 page.
pub async fn not_found() -> impl IntoResponse {
    let content = format!(
        r#"<div class="flex flex-col items-center justify-center py-20">
    <h1 class="text-4xl font-bold mb-4">404</h1>
    <p class="text-muted-foreground mb-6">Oops! Page not found</p>
    {}
</div>"#,
        back_home()
    );
    (StatusCode::NOT_FOUND, Html(shell("Not Found", &content)))
}
