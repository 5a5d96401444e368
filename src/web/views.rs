use askama::Template;
use pulldown_cmark::{html, Options, Parser};

use crate::config::UiConfig;
use crate::errors::RagChatResult;
use crate::session::transcript::Transcript;

pub const LOGIN_FAILED: &str = "Incorrect username or password.";

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate<'a> {
    error: Option<&'a str>,
}

struct EntryView<'a> {
    query: &'a str,
    asked_at: String,
    answer_html: String,
}

#[derive(Template)]
#[template(path = "chat.html")]
struct ChatTemplate<'a> {
    ui: &'a UiConfig,
    entries: Vec<EntryView<'a>>,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {}

pub fn login_page(error: Option<&str>) -> RagChatResult<String> {
    Ok(LoginTemplate { error }.render()?)
}

pub fn chat_page(ui: &UiConfig, transcript: &Transcript) -> RagChatResult<String> {
    let entries = transcript
        .all()
        .iter()
        .map(|e| EntryView {
            query: &e.query,
            asked_at: e.asked_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            answer_html: render_markdown(&e.answer),
        })
        .collect();
    Ok(ChatTemplate { ui, entries }.render()?)
}

pub fn error_page() -> RagChatResult<String> {
    Ok(ErrorTemplate {}.render()?)
}

/// Answers are Markdown from the LLM; the HTML is sanitized before it reaches the page.
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let mut out = String::new();
    html::push_html(&mut out, Parser::new_ext(text, options));
    ammonia::clean(&out)
}
