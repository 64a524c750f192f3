use tracing::debug;

use crate::pipeline::enrich::is_error_marker;
use crate::pipeline::matcher::CrossStageMatcher;
use crate::types::{CanonicalItem, DerivedArtifact, SocialPost, SummaryRecord};

const ELLIPSIS: char = '…';

/// Builds social captions from stage 2 summaries
pub struct CaptionComposer {
    max_chars: usize,
    placeholder_image: String,
}

impl CaptionComposer {
    pub fn new(max_chars: usize, placeholder_image: &str) -> Self {
        Self {
            max_chars: max_chars.max(1),
            placeholder_image: placeholder_image.to_string(),
        }
    }

    /// Title, summary and hashtags separated by blank lines. Only the
    /// summary is shortened to fit; failed summaries are left out.
    pub fn caption(&self, summary: &SummaryRecord) -> String {
        let tags = summary.tags().unwrap_or_default().join(" ");
        let body = if is_error_marker(summary.body()) || summary.body() == summary.title {
            ""
        } else {
            summary.body()
        };

        let full = join_parts(&[&summary.title, body, &tags]);
        if full.chars().count() <= self.max_chars {
            return full;
        }

        let frame = join_parts(&[&summary.title, "", &tags]);
        // two separators ("\n\n") plus the ellipsis
        let frame_len = frame.chars().count() + 3;
        if !body.is_empty() && frame_len < self.max_chars {
            let room = self.max_chars - frame_len;
            let shortened = shorten(body, room);
            return join_parts(&[&summary.title, &shortened, &tags]);
        }

        truncate_chars(&frame, self.max_chars)
    }

    /// One post per summary; the image comes from the article the summary
    /// was made from, joined by link with a title fallback.
    pub fn compose_posts(
        &self,
        summaries: &[SummaryRecord],
        articles: &[CanonicalItem],
        matcher: &CrossStageMatcher,
    ) -> Vec<SocialPost> {
        summaries
            .iter()
            .map(|summary| {
                let image = match matcher.resolve(summary, articles) {
                    Some((article, kind)) => {
                        debug!("Caption image for '{}' joined via {:?}", summary.title, kind);
                        article.image.clone()
                    }
                    None => self.placeholder_image.clone(),
                };
                SocialPost {
                    title: summary.title.clone(),
                    caption: self.caption(summary),
                    image,
                }
            })
            .collect()
    }
}

fn join_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Cut at a word boundary within `room` chars and append the ellipsis
fn shorten(text: &str, room: usize) -> String {
    let mut out = String::new();
    for word in text.split_whitespace() {
        let extra = if out.is_empty() { word.chars().count() } else { word.chars().count() + 1 };
        if out.chars().count() + extra > room {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    if out.is_empty() {
        out = text.chars().take(room).collect();
    }
    out.push(ELLIPSIS);
    out
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push(ELLIPSIS);
    out
}
