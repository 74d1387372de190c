//! Greedy line breaking over one or more styled text runs.

use quire_style::FontSpec;
use quire_traits::TextMetrics;
use quire_types::Pt;

/// A run of text sharing one font and line height.
#[derive(Debug, Clone)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub font: FontSpec,
    pub line_height: Pt,
}

/// A contiguous piece of one run placed on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub run: usize,
    pub text: String,
    pub x: Pt,
    pub width: Pt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    pub items: Vec<LineItem>,
    pub width: Pt,
    pub height: Pt,
    /// The line ends at an explicit break or at the end of the text.
    pub hard_end: bool,
}

impl LineLayout {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn text(&self) -> String {
        self.items.iter().map(|i| i.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    Space(&'a str),
    Break,
}

/// Splits text into words, whitespace and explicit breaks. `\r\n`, `\n`
/// and `\r` each count as one break.
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        match c {
            '\r' => {
                if let Some((_, '\n')) = chars.peek() {
                    chars.next();
                }
                tokens.push(Token::Break);
            }
            '\n' => tokens.push(Token::Break),
            c if c.is_whitespace() => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, n)) = chars.peek() {
                    if !n.is_whitespace() || n == '\r' || n == '\n' {
                        break;
                    }
                    end = i + n.len_utf8();
                    chars.next();
                }
                tokens.push(Token::Space(&text[start..end]));
            }
            _ => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, n)) = chars.peek() {
                    if n.is_whitespace() {
                        break;
                    }
                    end = i + n.len_utf8();
                    chars.next();
                }
                tokens.push(Token::Word(&text[start..end]));
            }
        }
    }
    tokens
}

struct LineBreaker<'m> {
    metrics: &'m dyn TextMetrics,
    max_width: Option<Pt>,
    lines: Vec<LineLayout>,
    items: Vec<LineItem>,
    width: Pt,
    height: Pt,
    /// Height used when the line ends up empty.
    empty_height: Pt,
    pending_space: Option<(usize, String, Pt)>,
    after_soft_wrap: bool,
}

impl<'m> LineBreaker<'m> {
    fn fits(&self, extra: Pt) -> bool {
        match self.max_width {
            Some(max) => self.width + extra <= max,
            None => true,
        }
    }

    fn push_text(&mut self, run: usize, text: &str, width: Pt, line_height: Pt) {
        match self.items.last_mut() {
            Some(last) if last.run == run => {
                last.text.push_str(text);
                last.width += width;
            }
            _ => self.items.push(LineItem {
                run,
                text: text.to_string(),
                x: self.width,
                width,
            }),
        }
        self.width += width;
        self.height = self.height.max(line_height);
    }

    fn finish_line(&mut self, hard_end: bool) {
        let height = if self.items.is_empty() {
            self.empty_height
        } else {
            self.height
        };
        self.lines.push(LineLayout {
            items: std::mem::take(&mut self.items),
            width: self.width,
            height,
            hard_end,
        });
        self.width = Pt::ZERO;
        self.height = Pt::ZERO;
        self.pending_space = None;
        self.after_soft_wrap = !hard_end;
    }

    fn place_word(&mut self, index: usize, run: &TextRun<'_>, word: &str) {
        let word_width = self.metrics.text_width(word, &run.font);
        let space_width = self.pending_space.as_ref().map_or(Pt::ZERO, |(_, _, w)| *w);

        if !self.items.is_empty() && !self.fits(space_width + word_width) {
            self.finish_line(false);
        }
        if let Some((space_run, space, width)) = self.pending_space.take() {
            let height = if space_run == index { run.line_height } else { Pt::ZERO };
            self.push_text(space_run, &space, width, height);
        }
        if self.fits(word_width) {
            self.push_text(index, word, word_width, run.line_height);
            return;
        }

        // Wider than a whole line: break at character boundaries, at least
        // one character per line.
        let mut chunk_start = 0;
        let mut chunk_width = Pt::ZERO;
        for (i, c) in word.char_indices() {
            let char_width = self.metrics.text_width(&word[i..i + c.len_utf8()], &run.font);
            if i > chunk_start && !self.fits(chunk_width + char_width) {
                self.push_text(index, &word[chunk_start..i], chunk_width, run.line_height);
                self.finish_line(false);
                chunk_start = i;
                chunk_width = Pt::ZERO;
            } else if i == chunk_start && !self.items.is_empty() && !self.fits(char_width) {
                self.finish_line(false);
            }
            chunk_width += char_width;
        }
        self.push_text(index, &word[chunk_start..], chunk_width, run.line_height);
    }
}

/// Breaks `runs` into lines no wider than `max_width`. With `None` lines
/// only end at explicit breaks.
///
/// Every explicit break ends the current line, so leading and trailing
/// breaks produce empty lines carrying the line height of their run. Empty
/// input yields no lines.
pub fn break_lines(
    runs: &[TextRun<'_>],
    max_width: Option<Pt>,
    metrics: &dyn TextMetrics,
) -> Vec<LineLayout> {
    let mut breaker = LineBreaker {
        metrics,
        max_width,
        lines: Vec::new(),
        items: Vec::new(),
        width: Pt::ZERO,
        height: Pt::ZERO,
        empty_height: Pt::ZERO,
        pending_space: None,
        after_soft_wrap: false,
    };
    let mut saw_token = false;

    for (index, run) in runs.iter().enumerate() {
        if run.text.is_empty() {
            continue;
        }
        breaker.empty_height = breaker.empty_height.max(run.line_height);
        for token in tokenize(run.text) {
            saw_token = true;
            match token {
                Token::Break => {
                    breaker.empty_height = run.line_height;
                    breaker.finish_line(true);
                }
                Token::Space(space) => {
                    if breaker.items.is_empty() && breaker.after_soft_wrap {
                        continue;
                    }
                    let width = metrics.text_width(space, &run.font);
                    match &mut breaker.pending_space {
                        Some((_, text, w)) => {
                            text.push_str(space);
                            *w += width;
                        }
                        None => breaker.pending_space = Some((index, space.to_string(), width)),
                    }
                }
                Token::Word(word) => {
                    breaker.after_soft_wrap = false;
                    breaker.place_word(index, run, word);
                }
            }
        }
    }

    if saw_token {
        breaker.finish_line(true);
    }
    breaker.lines
}

/// Total height of a set of lines.
pub fn lines_height(lines: &[LineLayout]) -> Pt {
    lines.iter().map(|l| l.height).sum()
}
