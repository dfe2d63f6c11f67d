//! Transcript projection
//!
//! Turns the store's transcript and status into something a front end can
//! draw: entries with role labels and citation chips, plus a flat list of
//! pre-wrapped lines so a view can scroll exactly to the latest line.

use crate::message::{Message, Role};
use crate::session::Status;

/// Label for citations that came back without a title
pub const UNTITLED_CHIP: &str = "Link";

/// Longest chip label before it is truncated
pub const CHIP_LABEL_MAX: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chip {
    pub label: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<'a> {
    pub role: Role,
    pub text: &'a str,
    pub chips: Vec<Chip>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptView<'a> {
    pub entries: Vec<Entry<'a>>,
    /// True only while a query is in flight. Not part of the transcript.
    pub awaiting: bool,
}

/// Heading above an answer's citation chips
pub const SOURCES_HEADER: &str = "Sources:";

/// Awaiting indicator; drawn with one to three trailing dots
pub const THINKING_TEXT: &str = "Thinking";

/// Columns before a chip's `[label]`
pub const CHIP_INDENT: usize = 2;

/// Columns before each row of a chip's URI
pub const LINK_INDENT: usize = 4;

/// One row of the laid-out transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewLine {
    Label(Role),
    Body(String),
    SourcesHeader,
    /// A chip's label, already fitted to the view width
    Chip(String),
    /// One width-sized piece of the URI belonging to the chip above it
    Link(String),
    Blank,
    Thinking,
}

impl ViewLine {
    /// Columns this row takes once drawn
    pub fn width(&self) -> usize {
        match self {
            ViewLine::Label(role) => role_label(*role).chars().count(),
            ViewLine::Body(text) => text.chars().count(),
            ViewLine::SourcesHeader => SOURCES_HEADER.chars().count(),
            ViewLine::Chip(label) => CHIP_INDENT + label.chars().count() + 2,
            ViewLine::Link(piece) => LINK_INDENT + piece.chars().count(),
            ViewLine::Blank => 0,
            ViewLine::Thinking => THINKING_TEXT.chars().count() + 3,
        }
    }
}

pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "You:",
        Role::Assistant => "AI:",
    }
}

pub fn project(transcript: &[Message], status: Status) -> TranscriptView<'_> {
    let entries = transcript
        .iter()
        .map(|msg| Entry {
            role: msg.role(),
            text: msg.text(),
            chips: msg
                .citations()
                .iter()
                .map(|c| Chip {
                    label: chip_label(&c.title),
                    uri: c.uri.clone(),
                })
                .collect(),
        })
        .collect();

    TranscriptView {
        entries,
        awaiting: status == Status::Awaiting,
    }
}

fn chip_label(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        return UNTITLED_CHIP.to_string();
    }
    truncate_chars(title, CHIP_LABEL_MAX)
}

/// Cut `text` to at most `max` chars, marking the cut with an ellipsis
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut cut: String = text.chars().take(max - 1).collect();
    cut.push('…');
    cut
}

/// Split `text` into pieces of at most `size` chars
fn chunk_chars(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size.max(1)).map(|piece| piece.iter().collect()).collect()
}

impl TranscriptView<'_> {
    /// Lay the view out as rows no wider than `width`. A width of 0 means
    /// the view size isn't known yet and nothing is wrapped.
    pub fn layout(&self, width: usize) -> Vec<ViewLine> {
        let mut lines = Vec::new();

        for entry in &self.entries {
            lines.push(ViewLine::Label(entry.role));
            for line in entry.text.lines() {
                lines.extend(wrap_text_to_width(line, width).into_iter().map(ViewLine::Body));
            }
            if !entry.chips.is_empty() {
                lines.push(ViewLine::SourcesHeader);
                for chip in &entry.chips {
                    lines.extend(chip_lines(chip, width));
                }
            }
            lines.push(ViewLine::Blank);
        }

        if self.awaiting {
            lines.push(ViewLine::Label(Role::Assistant));
            lines.push(ViewLine::Thinking);
        }

        lines
    }
}

/// A label row, then the full URI split across as many rows as it needs
fn chip_lines(chip: &Chip, width: usize) -> Vec<ViewLine> {
    if width == 0 {
        return vec![
            ViewLine::Chip(chip.label.clone()),
            ViewLine::Link(chip.uri.clone()),
        ];
    }

    let label_room = width.saturating_sub(CHIP_INDENT + 2);
    let mut lines = vec![ViewLine::Chip(truncate_chars(&chip.label, label_room))];
    lines.extend(
        chunk_chars(&chip.uri, width.saturating_sub(LINK_INDENT))
            .into_iter()
            .map(ViewLine::Link),
    );
    lines
}

/// Wrap text to fit within a given width, returning multiple lines.
///
/// Breaks on word boundaries and keeps the line's leading indentation on
/// every row, unless it would take more than half the width. Words longer
/// than a row are split into row-sized pieces.
pub fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    let text = text.trim_end();
    if width == 0 {
        return vec![text.to_string()];
    }

    let indent_len = text.chars().take_while(|c| c.is_whitespace()).count();
    let indent = if indent_len * 2 <= width {
        " ".repeat(indent_len)
    } else {
        String::new()
    };
    let room = width - indent.len();

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        for piece in chunk_chars(word, room) {
            let piece_len = piece.chars().count();

            if current_len == 0 {
                current_line = piece;
                current_len = piece_len;
            } else if current_len + 1 + piece_len <= room {
                current_line.push(' ');
                current_line.push_str(&piece);
                current_len += 1 + piece_len;
            } else {
                lines.push(std::mem::take(&mut current_line));
                current_line = piece;
                current_len = piece_len;
            }
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    // Blank input still occupies a row
    if lines.is_empty() {
        return vec![String::new()];
    }

    lines
        .into_iter()
        .map(|line| format!("{}{}", indent, line))
        .collect()
}

/// Scroll offset that puts the last line at the bottom of the viewport
pub fn bottom_offset(total_lines: usize, visible_height: usize) -> usize {
    total_lines.saturating_sub(visible_height)
}

/// Tracks (transcript length, awaiting) so the view can jump to the newest
/// line on every append and whenever the awaiting indicator appears or goes.
#[derive(Debug, Clone, Default)]
pub struct AutoScroll {
    last: Option<(usize, bool)>,
}

impl AutoScroll {
    /// Returns true when the key changed since the last call
    pub fn observe(&mut self, transcript_len: usize, status: Status) -> bool {
        let key = (transcript_len, status == Status::Awaiting);
        let changed = self.last != Some(key);
        self.last = Some(key);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Citation;

    #[test]
    fn test_no_citations_no_chips() {
        let transcript = vec![Message::assistant("hi")];
        let view = project(&transcript, Status::Idle);
        assert!(view.entries[0].chips.is_empty());
        assert!(!view.layout(40).contains(&ViewLine::SourcesHeader));
    }

    #[test]
    fn test_one_citation_one_chip() {
        let transcript = vec![Message::assistant_with_citations(
            "answer",
            vec![Citation::new("https://x", "X")],
        )];
        let view = project(&transcript, Status::Idle);
        assert_eq!(
            view.entries[0].chips,
            vec![Chip {
                label: "X".to_string(),
                uri: "https://x".to_string()
            }]
        );

        let chips: Vec<_> = view
            .layout(40)
            .into_iter()
            .filter(|line| matches!(line, ViewLine::Chip(_)))
            .collect();
        assert_eq!(chips.len(), 1);
    }

    #[test]
    fn test_chip_labels() {
        assert_eq!(chip_label("   "), UNTITLED_CHIP);
        assert_eq!(chip_label("github.com"), "github.com");

        let long = "a".repeat(CHIP_LABEL_MAX + 10);
        let label = chip_label(&long);
        assert_eq!(label.chars().count(), CHIP_LABEL_MAX);
        assert!(label.ends_with('…'));
    }

    #[test]
    fn test_awaiting_indicator_only_while_awaiting() {
        let transcript = vec![Message::assistant("hi"), Message::user("question")];

        let awaiting = project(&transcript, Status::Awaiting).layout(40);
        assert_eq!(awaiting.last(), Some(&ViewLine::Thinking));

        let idle = project(&transcript, Status::Idle).layout(40);
        assert!(!idle.contains(&ViewLine::Thinking));
        assert_eq!(awaiting.len(), idle.len() + 2);
    }

    #[test]
    fn test_layout_order_matches_transcript() {
        let transcript = vec![Message::assistant("one"), Message::user("two")];
        let lines = project(&transcript, Status::Idle).layout(40);
        assert_eq!(
            lines,
            vec![
                ViewLine::Label(Role::Assistant),
                ViewLine::Body("one".to_string()),
                ViewLine::Blank,
                ViewLine::Label(Role::User),
                ViewLine::Body("two".to_string()),
                ViewLine::Blank,
            ]
        );
    }

    #[test]
    fn test_wrap_text_to_width() {
        assert_eq!(
            wrap_text_to_width("the quick brown fox", 9),
            vec!["the quick", "brown fox"]
        );
        assert_eq!(wrap_text_to_width("", 10), vec![""]);
        assert_eq!(
            wrap_text_to_width("supercalifragilistic", 5),
            vec!["super", "calif", "ragil", "istic"]
        );
    }

    #[test]
    fn test_wrap_keeps_indentation() {
        assert_eq!(
            wrap_text_to_width("    let answer = compute(input);", 20),
            vec!["    let answer =", "    compute(input);"]
        );
        // Too deep for the view: dropped rather than eating the row
        assert_eq!(wrap_text_to_width("          deep", 8), vec!["deep"]);
    }

    #[test]
    fn test_no_line_wider_than_view() {
        let grounding_uri = format!(
            "https://vertexaisearch.cloud.google.com/grounding-api-redirect/{}",
            "AUZIYQ".repeat(25)
        );
        let long_url = format!("https://example.dev/{}", "x".repeat(120));
        let transcript = vec![
            Message::user("Where is your code?"),
            Message::assistant_with_citations(
                format!("See **GitHub** at {} for details.\n    fn main() {{}}", long_url),
                vec![
                    Citation::new(grounding_uri.clone(), "github.com"),
                    Citation::new("https://x", "a rather long page title that goes on"),
                ],
            ),
        ];

        for width in [12, 30, 80] {
            let lines = project(&transcript, Status::Awaiting).layout(width);
            for line in &lines {
                assert!(
                    line.width() <= width,
                    "{:?} is {} wide in a {}-column view",
                    line,
                    line.width(),
                    width
                );
            }

            // The URI survives intact across its rows
            let links: Vec<&str> = lines
                .iter()
                .filter_map(|line| match line {
                    ViewLine::Link(piece) => Some(piece.as_str()),
                    _ => None,
                })
                .collect();
            assert_eq!(links.concat(), format!("{}https://x", grounding_uri));
        }
    }

    #[test]
    fn test_bottom_offset() {
        assert_eq!(bottom_offset(30, 10), 20);
        assert_eq!(bottom_offset(5, 10), 0);
    }

    #[test]
    fn test_auto_scroll_fires_on_append_and_status_change() {
        let mut scroll = AutoScroll::default();
        assert!(scroll.observe(1, Status::Idle));
        assert!(!scroll.observe(1, Status::Idle));
        assert!(scroll.observe(2, Status::Awaiting));
        assert!(!scroll.observe(2, Status::Awaiting));
        assert!(scroll.observe(3, Status::Idle));
    }
}
