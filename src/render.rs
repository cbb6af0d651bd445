//! Text rendering of a [`Ranking`].
//!
//! Both output formats carry exactly the same facts; they only differ in layout.

use crate::ranking::{Metric, RankedUser, Ranking, Standing};
use crate::types::EntityKind;
use crate::{LfCircleError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix removed from links when [`RenderOptions::truncate_scheme`] is set.
pub const TRUNCATED_PREFIX: &str = "https://www.";

const MARKDOWN_INDENT: &str = "   ";

/// Layout of the rendered report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned plain text that also reads fine as markdown
    #[default]
    Ascii,
    /// Markdown with inline links, as understood by chat clients
    Markdown,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Ascii => "ascii",
            OutputFormat::Markdown => "markdown",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = LfCircleError;

    /// Parse a format selector. `telegram` is accepted as an alias for `markdown`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ascii" => Ok(OutputFormat::Ascii),
            "markdown" | "telegram" => Ok(OutputFormat::Markdown),
            other => Err(LfCircleError::Configuration(format!(
                "unsupported output format '{other}' (expected 'ascii' or 'markdown')"
            ))),
        }
    }
}

/// Presentation options. None of these change which facts are reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Report header; empty for none
    pub header: String,
    /// Strip [`TRUNCATED_PREFIX`] from every link
    pub truncate_scheme: bool,
    /// Lowercase the whole document
    pub lowercase: bool,
    /// Also link the top artist, album and track
    pub all_the_links: bool,
    pub format: OutputFormat,
}

/// Remove [`TRUNCATED_PREFIX`] from a link; links without it are returned unchanged.
///
/// ```rust
/// use lfcircle::render::truncate_scheme;
///
/// assert_eq!(truncate_scheme("https://www.last.fm/user/x"), "last.fm/user/x");
/// assert_eq!(truncate_scheme("http://localhost/user/x"), "http://localhost/user/x");
/// ```
pub fn truncate_scheme(link: &str) -> &str {
    link.strip_prefix(TRUNCATED_PREFIX).unwrap_or(link)
}

/// Lowercase a rendered document.
pub fn lowercase(text: &str) -> String {
    text.to_lowercase()
}

/// Render a ranking as a single text document.
pub fn render(ranking: &Ranking, options: &RenderOptions) -> String {
    let renderer = Renderer {
        options,
        rank_width: format!("#{}", ranking.len()).len(),
    };

    let mut blocks: Vec<String> = Vec::new();

    if !options.header.is_empty() {
        match options.format {
            OutputFormat::Ascii => {
                blocks.push(options.header.clone());
                blocks.push("-".repeat(options.header.chars().count()));
                blocks.push(String::new());
            }
            OutputFormat::Markdown => blocks.push(format!("{}\n", options.header)),
        }
    }

    for user in ranking {
        let entry = match options.format {
            OutputFormat::Ascii => renderer.ascii_entry(user),
            OutputFormat::Markdown => renderer.markdown_entry(user),
        };
        blocks.push(format!("{entry}\n"));
    }

    let text = blocks.join("\n");

    if options.lowercase {
        lowercase(&text)
    } else {
        text
    }
}

struct Renderer<'a> {
    options: &'a RenderOptions,
    rank_width: usize,
}

impl Renderer<'_> {
    fn link<'u>(&self, url: &'u str) -> &'u str {
        if self.options.truncate_scheme {
            truncate_scheme(url)
        } else {
            url
        }
    }

    /// `user — Σ40h; 293s/d`, without the hours when they are unknown.
    fn strength(&self, user: &RankedUser, name: &str) -> String {
        match user.listening_hours {
            Some(hours) => format!("{name} — Σ{hours}h; {}s/d", user.daily_average),
            None => format!("{name} — {}s/d", user.daily_average),
        }
    }

    fn ascii_entry(&self, user: &RankedUser) -> String {
        let lead = format!("{}. ", user.position);
        let pad = " ".repeat(lead.chars().count());
        let badge = |rank: usize| format!("{:>width$}", format!("#{rank}"), width = self.rank_width);

        let mut lines = vec![
            format!("{lead}{}  ", self.strength(user, &user.user)),
            format!("{pad}<{}>\n", self.link(&user.report_url)),
        ];

        let scrobbles = format!("{} scrobbles", user.scrobbles.count);
        let width = scrobbles.chars().count();
        lines.push(format!("{pad}{scrobbles} ({})", badge(user.scrobbles.rank)));

        for (kind, standing) in entity_standings(user) {
            let count = format!("{} {}", standing.count, kind.plural());
            let left = format!("{pad}{count:<width$} ({})", badge(standing.rank));

            let Some(top) = &standing.top else {
                lines.push(left);
                continue;
            };

            let left = format!("{left} : ");
            let mut line = format!("{left}{}", top.label());
            if self.options.all_the_links {
                line.push('\n');
                line.push_str(&" ".repeat(left.chars().count()));
                line.push_str(&format!("<{}>", self.link(&top.url)));
            }
            lines.push(line);
        }

        lines.join("\n")
    }

    fn markdown_entry(&self, user: &RankedUser) -> String {
        let linked_name = format!("[{}]({})", user.user, self.link(&user.report_url));

        let mut lines = vec![
            format!("{}. {}  ", user.position, self.strength(user, &linked_name)),
            format!(
                "{MARKDOWN_INDENT}**{} scrobbles** (#{})",
                user.scrobbles.count, user.scrobbles.rank
            ),
        ];

        for (kind, standing) in entity_standings(user) {
            let left = format!(
                "{MARKDOWN_INDENT}{} {} (#{})",
                standing.count,
                kind.plural(),
                standing.rank
            );

            let line = match &standing.top {
                Some(top) if self.options.all_the_links => {
                    format!("{left}: [{}]({})", top.label(), self.link(&top.url))
                }
                Some(top) => format!("{left}: {}", top.label()),
                None => left,
            };
            lines.push(line);
        }

        lines.join("\n")
    }
}

/// Standings that come with a top entity, in report order.
fn entity_standings(user: &RankedUser) -> impl Iterator<Item = (EntityKind, &Standing)> + '_ {
    Metric::ALL
        .into_iter()
        .filter_map(|metric| Some((metric.entity_kind()?, user.standing(metric))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_selector_parsing() {
        assert_eq!("ascii".parse::<OutputFormat>().unwrap(), OutputFormat::Ascii);
        assert_eq!(" Markdown ".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("telegram".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);

        match "yaml".parse::<OutputFormat>() {
            Err(LfCircleError::Configuration(msg)) => assert!(msg.contains("yaml")),
            other => panic!("Expected configuration error, got: {other:?}"),
        }
    }

    #[test]
    fn test_truncate_only_strips_known_prefix() {
        assert_eq!(truncate_scheme("https://www.last.fm/music/Low"), "last.fm/music/Low");
        for link in ["last.fm/music/Low", "https://last.fm/x", "", "http://www.last.fm/"] {
            assert_eq!(truncate_scheme(link), link);
        }
    }

    #[test]
    fn test_lowercase_is_idempotent() {
        for text in ["Header\n------", "1. User — Σ3h; ÀÉÎ", "already lower", "İstanbul ΣΑΣ"] {
            let once = lowercase(text);
            assert_eq!(lowercase(&once), once);
        }
    }

    #[test]
    fn test_empty_ranking_without_header_renders_nothing() {
        let text = render(&Ranking::default(), &RenderOptions::default());
        assert_eq!(text, "");
    }

    #[test]
    fn test_header_only_ascii() {
        let options = RenderOptions {
            header: "Weekly".to_string(),
            ..Default::default()
        };
        assert_eq!(render(&Ranking::default(), &options), "Weekly\n------\n");
    }

    #[test]
    fn test_header_only_markdown() {
        let options = RenderOptions {
            header: "Weekly".to_string(),
            format: OutputFormat::Markdown,
            ..Default::default()
        };
        assert_eq!(render(&Ranking::default(), &options), "Weekly\n");
    }
}
