use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::config::DashboardConfig;
use crate::pipeline::matcher::{CrossStageMatcher, MatchKind};
use crate::types::{CanonicalItem, DerivedArtifact, SocialPost, SummaryRecord};

/// One article with whatever derived artifacts could be joined to it
#[derive(Debug, Clone, Serialize)]
pub struct DashboardEntry {
    pub article: CanonicalItem,
    pub published_display: String,
    pub summary: Option<SummaryRecord>,
    pub summary_join: Option<String>,
    pub post: Option<SocialPost>,
}

/// Joins the three hand-off files and renders them as a static page
pub struct DashboardRenderer {
    matcher: CrossStageMatcher,
    config: DashboardConfig,
}

impl DashboardRenderer {
    pub fn new(matcher: CrossStageMatcher, config: DashboardConfig) -> Self {
        Self { matcher, config }
    }

    /// Summary by link with a title fallback; post by title only
    pub fn build_entries(
        &self,
        articles: &[CanonicalItem],
        summaries: &[SummaryRecord],
        posts: &[SocialPost],
    ) -> Vec<DashboardEntry> {
        articles
            .iter()
            .map(|article| {
                let (summary, summary_join) = match self.matcher.resolve(article, summaries) {
                    Some((s, MatchKind::Exact)) => (Some(s.clone()), Some("link".to_string())),
                    Some((s, MatchKind::Fuzzy(score))) => {
                        (Some(s.clone()), Some(format!("title {:.2}", score)))
                    }
                    None => (None, None),
                };
                let post = self.matcher.fuzzy(article, posts).map(|(p, _)| p.clone());
                DashboardEntry {
                    article: article.clone(),
                    published_display: self.format_published(article.published_at.as_deref()),
                    summary,
                    summary_join,
                    post,
                }
            })
            .collect()
    }

    /// RFC 3339 timestamps shifted to the display offset; anything else is
    /// shown as-is.
    pub fn format_published(&self, published_at: Option<&str>) -> String {
        let raw = match published_at {
            Some(raw) => raw,
            None => return "unknown".to_string(),
        };
        let offset = match FixedOffset::east_opt(self.config.display_offset_minutes * 60) {
            Some(offset) => offset,
            None => return raw.to_string(),
        };
        match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => dt.with_timezone(&offset).format(&self.config.time_format).to_string(),
            Err(_) => raw.to_string(),
        }
    }

    pub fn render_html(&self, entries: &[DashboardEntry]) -> String {
        let mut html = String::new();
        let title = escape_html(&self.config.title);
        let _ = write!(
            html,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\" />\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n\
             <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
             <p class=\"title\">{title}</p>\n<p class=\"subtitle\">Latest News</p>\n"
        );

        if entries.is_empty() {
            html.push_str("<div class=\"card\"><p>No articles yet. Run the discovery stage first.</p></div>\n");
        }

        for entry in entries {
            html.push_str("<div class=\"card\">\n");
            let _ = writeln!(html, "<h3 class=\"article-title\">{}</h3>", escape_html(&entry.article.title));
            let _ = writeln!(
                html,
                "<p class=\"meta\">Published: {}</p>",
                escape_html(&entry.published_display)
            );
            if let Some(link) = &entry.article.link {
                let _ = writeln!(
                    html,
                    "<p><a href=\"{}\" target=\"_blank\" rel=\"noopener\">Read full story</a></p>",
                    escape_html(link)
                );
            }

            let _ = writeln!(
                html,
                "<img src=\"{}\" alt=\"\" loading=\"lazy\" />",
                escape_html(&entry.article.image)
            );

            match &entry.summary {
                Some(summary) => {
                    render_artifact(&mut html, "Summary", summary);
                    if !summary.keywords.is_empty() {
                        let _ = writeln!(
                            html,
                            "<p class=\"hashtags\">Keywords: {}</p>",
                            escape_html(&summary.keywords.join(", "))
                        );
                    }
                }
                None => html.push_str("<p class=\"meta\">No summary available.</p>\n"),
            }

            if let Some(post) = &entry.post {
                render_artifact(&mut html, "Suggested caption", post);
                if !post.image.is_empty() {
                    let _ = writeln!(
                        html,
                        "<img class=\"post-image\" src=\"{}\" alt=\"\" loading=\"lazy\" />",
                        escape_html(&post.image)
                    );
                }
            }
            html.push_str("</div>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    pub fn render(
        &self,
        articles: &[CanonicalItem],
        summaries: &[SummaryRecord],
        posts: &[SocialPost],
    ) -> String {
        let entries = self.build_entries(articles, summaries, posts);
        self.render_html(&entries)
    }
}

/// Body with line breaks kept, then its tags when it has any
fn render_artifact<A: DerivedArtifact>(html: &mut String, label: &str, artifact: &A) {
    let _ = writeln!(
        html,
        "<p class=\"summary\"><strong>{}:</strong></p>\n<blockquote>{}</blockquote>",
        label,
        escape_html(artifact.body()).replace('\n', "<br />")
    );
    if let Some(tags) = artifact.tags().filter(|t| !t.is_empty()) {
        let _ = writeln!(
            html,
            "<p class=\"hashtags\">Hashtags: {}</p>",
            escape_html(&tags.join(" "))
        );
    }
}

const STYLE: &str = "body{font-family:Poppins,sans-serif;background:#1d2733;margin:0;padding:1rem 2rem}\
.title{font-size:42px;font-weight:700;color:#fff}\
.subtitle{font-size:20px;color:#f1f1f1}\
.card{background:rgba(255,255,255,.92);padding:20px 25px;border-radius:16px;margin-bottom:15px}\
.article-title{font-size:26px;font-weight:600;color:#2c3e50}\
.meta{font-size:14px;color:#7f8c8d}\
.summary{font-size:16px;color:#2c3e50;line-height:1.6}\
.hashtags{font-size:14px;font-weight:500;color:#117a65}\
img{max-width:100%;border-radius:8px}\
.post-image{max-width:320px;margin-top:8px}";

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::similarity::TokenRatio;

    fn renderer() -> DashboardRenderer {
        DashboardRenderer::new(
            CrossStageMatcher::new(Box::new(TokenRatio), 0.5),
            DashboardConfig::default(),
        )
    }

    fn article(title: &str, link: &str, published_at: Option<&str>) -> CanonicalItem {
        CanonicalItem {
            title: title.to_string(),
            link: Some(link.to_string()),
            published_at: published_at.map(str::to_string),
            image: "https://img.example/a.jpg".to_string(),
        }
    }

    #[test]
    fn test_entries_join_summary_by_link_and_post_by_title() {
        let articles = vec![
            article("Drone corridor approved in Bengaluru", "https://n.example/1", None),
            article("Farm drones subsidy extended", "https://n.example/2", None),
        ];
        let summaries = vec![SummaryRecord {
            title: "Renamed upstream".to_string(),
            link: Some("https://n.example/2".to_string()),
            published_at: None,
            summary: "Subsidy runs another year.".to_string(),
            hashtags: vec!["#Subsidy".to_string()],
            keywords: vec!["subsidy".to_string()],
        }];
        let posts = vec![SocialPost {
            title: "Drone corridor approved in Bengaluru!".to_string(),
            caption: "Caption".to_string(),
            image: String::new(),
        }];

        let entries = renderer().build_entries(&articles, &summaries, &posts);
        assert!(entries[0].summary.is_none());
        assert_eq!(entries[0].post.as_ref().unwrap().caption, "Caption");
        assert_eq!(entries[1].summary.as_ref().unwrap().summary, "Subsidy runs another year.");
        assert_eq!(entries[1].summary_join.as_deref(), Some("link"));
        assert!(entries[1].post.is_none());
    }

    #[test]
    fn test_published_converted_to_display_offset() {
        let r = renderer();
        assert_eq!(r.format_published(Some("2024-01-02T10:30:00Z")), "02-Jan-2024 04:00 PM");
        assert_eq!(r.format_published(Some("last tuesday")), "last tuesday");
        assert_eq!(r.format_published(None), "unknown");
    }

    #[test]
    fn test_render_escapes_markup() {
        let articles = vec![article("<script>alert(1)</script>", "https://n.example/1?a=1&b=2", None)];
        let html = renderer().render(&articles, &[], &[]);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("a=1&amp;b=2"));
        assert!(html.contains("No summary available."));
    }

    #[test]
    fn test_render_shows_summary_tags_and_post_image() {
        let articles = vec![article("Farm drones subsidy extended", "https://n.example/2", None)];
        let summaries = vec![SummaryRecord {
            title: "Farm drones subsidy extended".to_string(),
            link: Some("https://n.example/2".to_string()),
            published_at: None,
            summary: "Subsidy runs another year.".to_string(),
            hashtags: vec!["#Subsidy".to_string()],
            keywords: vec!["subsidy".to_string()],
        }];
        let posts = vec![
            SocialPost {
                title: "Farm drones subsidy extended".to_string(),
                caption: "Farm drones subsidy extended\n\n#Subsidy".to_string(),
                image: "https://img.example/post.jpg".to_string(),
            },
        ];

        let html = renderer().render(&articles, &summaries, &posts);
        assert!(html.contains("Subsidy runs another year."));
        assert!(html.contains("Hashtags: #Subsidy"));
        assert!(html.contains("Keywords: subsidy"));
        assert!(html.contains("Farm drones subsidy extended<br /><br />#Subsidy"));
        assert!(html.contains("class=\"post-image\" src=\"https://img.example/post.jpg\""));
    }

    #[test]
    fn test_post_without_image_renders_no_post_image() {
        let articles = vec![article("Farm drones subsidy extended", "https://n.example/2", None)];
        let posts = vec![SocialPost {
            title: "Farm drones subsidy extended".to_string(),
            caption: "c".to_string(),
            image: String::new(),
        }];
        let html = renderer().render(&articles, &[], &posts);
        assert!(html.contains("Suggested caption"));
        assert!(!html.contains("post-image\" src"));
    }

    #[test]
    fn test_render_empty_input() {
        let html = renderer().render(&[], &[], &[]);
        assert!(html.contains("No articles yet"));
    }
}
