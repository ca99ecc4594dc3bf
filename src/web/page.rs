//! Research Page
//!
//! Server-rendered HTML for the single page: topic form, status notices,
//! the rendered notes, the run log and the download link. The page works
//! without JavaScript; the inline script shows the busy notice and disables
//! the button while a run is in flight.

use crate::web::markdown::{escape_html, markdown_to_html};
use std::fmt::Write as _;

pub const PAGE_TITLE: &str = "Research Assistant";
pub const BUSY_MESSAGE: &str = "Researching... This may take a few minutes.";
pub const SUCCESS_MESSAGE: &str = "Research complete!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Warning(String),
    Error(String),
}

impl Notice {
    fn class(&self) -> &'static str {
        match self {
            Notice::Success(_) => "notice success",
            Notice::Warning(_) => "notice warning",
            Notice::Error(_) => "notice error",
        }
    }

    fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Warning(m) | Notice::Error(m) => m,
        }
    }
}

/// The single research page in any of its states
#[derive(Debug, Clone, Default)]
pub struct ResearchPage {
    topic: String,
    notice: Option<Notice>,
    log: Option<String>,
    content_html: Option<String>,
    download: Option<(String, String)>,
}

impl ResearchPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the submitted topic in the input box
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    /// Captured run log, shown verbatim
    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = Some(log.into());
        self
    }

    /// Final markdown, rendered to HTML for the result panel
    pub fn with_markdown(mut self, markdown: &str) -> Self {
        self.content_html = Some(markdown_to_html(markdown));
        self
    }

    pub fn with_download(mut self, href: impl Into<String>, file_name: impl Into<String>) -> Self {
        self.download = Some((href.into(), file_name.into()));
        self
    }

    pub fn render(&self) -> String {
        let mut body = String::new();

        let _ = write!(
            body,
            r#"<h1>{title} &#x1F468;&#x200D;&#x1F393;</h1>
<form method="post" action="/research" id="research-form">
  <label for="topic">Enter your research topic:</label>
  <input id="topic" name="topic" type="text" value="{topic}" autocomplete="off" autofocus>
  <button type="submit">Start Research</button>
</form>
<div id="busy" class="busy" hidden><span class="spinner"></span> {busy}</div>
"#,
            title = PAGE_TITLE,
            topic = escape_html(&self.topic),
            busy = BUSY_MESSAGE,
        );

        if let Some(notice) = &self.notice {
            let _ = writeln!(
                body,
                r#"<div class="{}" role="status">{}</div>"#,
                notice.class(),
                escape_html(notice.message())
            );
        }

        if let Some(log) = &self.log {
            let _ = writeln!(
                body,
                r#"<section>
  <h2>Agent Thoughts and Process</h2>
  <textarea class="log" readonly rows="16" aria-label="Console Logs">{}</textarea>
</section>"#,
                escape_html(log)
            );
        }

        if let Some(html) = &self.content_html {
            let _ = writeln!(
                body,
                r#"<section>
  <h2>Organized Content</h2>
  <article class="markdown">{}</article>
</section>"#,
                html
            );
        }

        if let Some((href, file_name)) = &self.download {
            let _ = writeln!(
                body,
                r#"<a class="download" href="{}" download="{}">Download Markdown Notes</a>"#,
                escape_html(href),
                escape_html(file_name)
            );
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<main>
{body}</main>
<script>{script}</script>
</body>
</html>
"#,
            title = PAGE_TITLE,
            style = STYLE,
            body = body,
            script = SCRIPT,
        )
    }
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #fafafa; color: #262730; }
main { max-width: 46rem; margin: 0 auto; padding: 3rem 1rem; }
form { display: flex; flex-direction: column; gap: .5rem; }
input[type=text] { padding: .6rem; font-size: 1rem; border: 1px solid #ccc; border-radius: .4rem; }
button { align-self: flex-start; padding: .5rem 1rem; font-size: 1rem; border-radius: .4rem; border: 1px solid #ccc; background: #fff; cursor: pointer; }
button:disabled { opacity: .6; cursor: progress; }
.busy { margin: 1rem 0; }
.spinner { display: inline-block; width: 1rem; height: 1rem; border: 2px solid #ccc; border-top-color: #ff4b4b; border-radius: 50%; animation: spin 1s linear infinite; vertical-align: middle; }
@keyframes spin { to { transform: rotate(360deg); } }
.notice { margin: 1rem 0; padding: .8rem 1rem; border-radius: .4rem; white-space: pre-wrap; }
.success { background: #dff5e3; color: #17692b; }
.warning { background: #fff6d6; color: #7a5b00; }
.error { background: #fde2e2; color: #8a1c1c; }
.log { width: 100%; box-sizing: border-box; font-family: ui-monospace, monospace; font-size: .8rem; }
.markdown { background: #fff; padding: 1rem; border-radius: .4rem; border: 1px solid #eee; overflow-x: auto; }
.download { display: inline-block; margin-top: 1rem; padding: .5rem 1rem; border: 1px solid #ccc; border-radius: .4rem; text-decoration: none; color: inherit; background: #fff; }
"#;

const SCRIPT: &str = r#"
document.getElementById('research-form').addEventListener('submit', function () {
  document.getElementById('busy').hidden = false;
  this.querySelector('button').disabled = true;
});
"#;
