//! Server-rendered moderation page. The outer layout is injected so the
//! page can be restyled without rebuilding.

use std::fs;
use std::io;
use std::path::Path;

use crate::entity::comment::{self, CommentStatus};
use crate::repository::{total_pages, CommentFilter, CommentPage, StatusFilter};

const CONTENT_PLACEHOLDER: &str = "{{content}}";

const DEFAULT_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<title>iComment moderation</title>
<style>
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 2em; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ddd; padding: 6px; text-align: left; vertical-align: top; }
.pending { color: #b26a00; }
.approved { color: #2e7d32; }
.pager { margin-top: 1em; }
</style>
</head>
<body>
<h1>Comments</h1>
{{content}}
<script>
async function moderate(method, path) {
  const resp = await fetch(path, { method });
  if (resp.ok) { location.reload(); } else { alert('Request failed: ' + resp.status); }
}
</script>
</body>
</html>"#;

pub struct AdminPage {
    layout: String,
}

impl Default for AdminPage {
    fn default() -> Self {
        Self {
            layout: DEFAULT_LAYOUT.to_string(),
        }
    }
}

impl AdminPage {
    pub fn from_layout(layout: impl Into<String>) -> io::Result<Self> {
        let layout = layout.into();
        if !layout.contains(CONTENT_PLACEHOLDER) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("admin layout is missing the {} placeholder", CONTENT_PLACEHOLDER),
            ));
        }
        Ok(Self { layout })
    }

    /// Reads the layout from `path`, or uses the built-in one.
    pub fn load(path: Option<&Path>) -> io::Result<Self> {
        match path {
            Some(path) => Self::from_layout(fs::read_to_string(path)?),
            None => Ok(Self::default()),
        }
    }

    pub fn render(&self, filter: &CommentFilter, page: &CommentPage) -> String {
        let mut content = render_filter_form(filter);
        content.push_str(&format!(
            "<p>{} comment(s) matching</p>\n",
            page.total
        ));
        content.push_str(&render_table(&page.comments));
        content.push_str(&render_pager(filter, page.total));
        self.layout.replacen(CONTENT_PLACEHOLDER, &content, 1)
    }
}

fn render_filter_form(filter: &CommentFilter) -> String {
    let options = [StatusFilter::Pending, StatusFilter::Approved, StatusFilter::All]
        .iter()
        .map(|s| {
            let selected = if *s == filter.status { " selected" } else { "" };
            format!(r#"<option value="{v}"{selected}>{v}</option>"#, v = s.as_str())
        })
        .collect::<Vec<_>>()
        .join("");
    format!(
        r#"<form method="get" action="/">
<select name="status">{options}</select>
<input name="article_url" placeholder="article url prefix" value="{article}" />
<input name="email" placeholder="email" value="{email}" />
<button type="submit">Filter</button>
</form>
"#,
        options = options,
        article = html_attr_escape(&filter.article_url),
        email = html_attr_escape(&filter.email),
    )
}

fn render_table(comments: &[comment::Model]) -> String {
    if comments.is_empty() {
        return "<p>No comments.</p>\n".to_string();
    }
    let mut html = String::from(
        "<table>\n<tr><th>ID</th><th>Article</th><th>Reply to</th><th>Author</th><th>Content</th><th>Status</th><th>Created</th><th>Actions</th></tr>\n",
    );
    for c in comments {
        let (status_class, approve) = match c.status {
            CommentStatus::Pending => (
                "pending",
                format!(
                    r#"<button onclick="moderate('PATCH', '/comments/{}/approve')">Approve</button> "#,
                    c.id
                ),
            ),
            CommentStatus::Approved => ("approved", String::new()),
        };
        let author = match c.email.as_deref() {
            Some(email) => format!("{}<br/>{}", html_escape(&c.nickname), html_escape(email)),
            None => html_escape(&c.nickname),
        };
        html.push_str(&format!(
            r#"<tr><td>{id}</td><td>{article}</td><td>{parent}</td><td>{author}</td><td>{content}</td><td class="{class}">{class}</td><td>{created}</td><td>{approve}<button onclick="if (confirm('Delete comment {id}?')) moderate('DELETE', '/comments/{id}')">Delete</button></td></tr>
"#,
            id = c.id,
            article = html_escape(&c.article_url),
            parent = c.parent_id.map(|p| p.to_string()).unwrap_or_default(),
            author = author,
            content = html_escape(&c.content),
            class = status_class,
            created = c.created_at.format("%Y-%m-%d %H:%M:%S"),
            approve = approve,
        ));
    }
    html.push_str("</table>\n");
    html
}

fn render_pager(filter: &CommentFilter, total: u64) -> String {
    let pages = total_pages(total, filter.page_size);
    let link = |page: u64, label: &str| {
        format!(
            r#"<a href="/?status={}&amp;article_url={}&amp;email={}&amp;page={}">{}</a>"#,
            filter.status.as_str(),
            html_attr_escape(&urlencoding::encode(&filter.article_url)),
            html_attr_escape(&urlencoding::encode(&filter.email)),
            page,
            label
        )
    };
    let mut html = String::from(r#"<div class="pager">"#);
    if filter.page > 1 {
        html.push_str(&link(filter.page - 1, "&laquo; Prev"));
        html.push(' ');
    }
    html.push_str(&format!("Page {} of {}", filter.page, pages.max(1)));
    if filter.page < pages {
        html.push(' ');
        html.push_str(&link(filter.page + 1, "Next &raquo;"));
    }
    html.push_str("</div>\n");
    html
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn html_attr_escape(s: &str) -> String {
    html_escape(s).replace('"', "&quot;").replace('\'', "&#39;")
}
