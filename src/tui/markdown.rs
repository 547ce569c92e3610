//! Markdown to ratatui `Text`.
//!
//! Covers what generated test suites actually contain: headings, emphasis,
//! nested lists, inline and fenced code, block quotes, rules and simple
//! tables. Everything else falls through as plain text or is skipped.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

const RULE_WIDTH: usize = 40;

/// Render `content` with `base_fg` as the default text color.
pub fn render(content: &str, base_fg: Color) -> Text<'static> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS;
    let mut renderer = Renderer::new(base_fg);
    for event in Parser::new_ext(content, options) {
        renderer.event(event);
    }
    renderer.finish()
}

struct Renderer {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    base: Style,
    /// Composed inline styles; the top is what new text gets
    styles: Vec<Style>,
    /// Prefix repeated on every line inside a block quote or code block
    prefixes: Vec<Span<'static>>,
    /// None for bullet lists, Some(next number) for ordered lists
    lists: Vec<Option<u64>>,
    in_code_block: bool,
    table_row: Vec<String>,
    table_cell: Option<String>,
    /// Blank line owed before the next block
    gap: bool,
}

impl Renderer {
    fn new(base_fg: Color) -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
            base: Style::default().fg(base_fg),
            styles: Vec::new(),
            prefixes: Vec::new(),
            lists: Vec::new(),
            in_code_block: false,
            table_row: Vec::new(),
            table_cell: None,
            gap: false,
        }
    }

    fn finish(mut self) -> Text<'static> {
        self.flush();
        Text::from(self.lines)
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or(self.base)
    }

    fn push_style(&mut self, overlay: Style) {
        let composed = self.style().patch(overlay);
        self.styles.push(composed);
    }

    /// Ends the line being built, if any.
    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let mut spans = self.prefixes.clone();
        spans.append(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn start_block(&mut self) {
        self.flush();
        if self.gap && !self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        self.gap = false;
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                if let Some(cell) = self.table_cell.as_mut() {
                    cell.push_str(&code);
                } else {
                    self.current.push(Span::styled(
                        code.to_string(),
                        Style::default().fg(Color::White).bg(Color::DarkGray),
                    ));
                }
            }
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.start_block();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(RULE_WIDTH),
                    Style::default().fg(Color::DarkGray),
                )));
                self.gap = true;
            }
            Event::TaskListMarker(done) => {
                self.current
                    .push(Span::styled(if done { "[x] " } else { "[ ] " }, self.style()));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                // paragraphs inside list items continue the item line
                if self.current.is_empty() {
                    self.start_block();
                }
            }
            Tag::Heading { level, .. } => {
                self.start_block();
                self.push_style(heading_style(level));
            }
            Tag::BlockQuote(_) => {
                self.start_block();
                self.prefixes
                    .push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
                self.push_style(Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM));
            }
            Tag::CodeBlock(_) => {
                self.start_block();
                let border = Style::default().fg(Color::DarkGray);
                self.lines.push(Line::from(Span::styled("┌──", border)));
                self.prefixes.push(Span::styled("│ ", border));
                self.in_code_block = true;
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.start_block();
                } else {
                    self.flush();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}{}. ", indent, n);
                        *n += 1;
                        marker
                    }
                    _ => format!("{}• ", indent),
                };
                self.current
                    .push(Span::styled(marker, Style::default().fg(Color::DarkGray)));
            }
            Tag::Table(_) => self.start_block(),
            Tag::TableRow | Tag::TableHead => self.table_row.clear(),
            Tag::TableCell => self.table_cell = Some(String::new()),
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { .. } => self.push_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::UNDERLINED),
            ),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.lists.is_empty() {
                    self.flush();
                    self.gap = true;
                }
            }
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.flush();
                self.gap = true;
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.prefixes.pop();
                self.styles.pop();
                self.gap = true;
            }
            TagEnd::CodeBlock => {
                self.flush();
                self.prefixes.pop();
                self.in_code_block = false;
                self.lines.push(Line::from(Span::styled(
                    "└──",
                    Style::default().fg(Color::DarkGray),
                )));
                self.gap = true;
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.gap = true;
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::TableCell => {
                if let Some(cell) = self.table_cell.take() {
                    self.table_row.push(cell.trim().to_string());
                }
            }
            TagEnd::TableHead => {
                let header = self.table_row.join(" │ ");
                let width = unicode_width::UnicodeWidthStr::width(header.as_str());
                self.lines.push(Line::from(Span::styled(
                    header,
                    self.base.add_modifier(Modifier::BOLD),
                )));
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(width),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            TagEnd::TableRow => {
                self.lines
                    .push(Line::from(Span::styled(self.table_row.join(" │ "), self.base)));
            }
            TagEnd::Table => self.gap = true,
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.styles.pop();
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        // ratatui draws '\t' as zero width
        let text = text.replace('\t', "    ");

        if let Some(cell) = self.table_cell.as_mut() {
            cell.push_str(&text);
            return;
        }

        if self.in_code_block {
            let style = Style::default().fg(Color::White);
            for line in text.lines() {
                self.current.push(Span::styled(line.to_string(), style));
                self.flush();
            }
            return;
        }

        let style = self.style();
        self.current.push(Span::styled(text, style));
    }
}

fn heading_style(level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        HeadingLevel::H2 => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        _ => Style::default().add_modifier(Modifier::BOLD),
    }
}
