use std::fmt::{Display, Formatter};
use std::ops::Range;

pub fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n')
}

/// Byte ranges of every physical line in `source`.
///
/// `\n`, `\r\n` and a lone `\r` all end a line. Empty lines are kept so that
/// `index + 1` is always the line number a user sees in an editor.
pub fn split_lines(source: &str) -> Vec<Range<usize>> {
    let bytes = source.as_bytes();
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                ranges.push(start..i);
                start = i + 1;
            }
            b'\r' => {
                ranges.push(start..i);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < bytes.len() {
        ranges.push(start..bytes.len());
    }
    ranges
}

/// Narrows `range` to the code on the line: leading blanks, a `#` comment and
/// trailing blanks are dropped.
pub fn strip_line(source: &str, range: Range<usize>) -> Range<usize> {
    let line = &source[range.clone()];
    let code = match line.find('#') {
        Some(hash) => &line[..hash],
        None => line,
    };
    let leading = code.len() - code.trim_start_matches(is_blank).len();
    let kept = code.trim_end_matches(is_blank).len();
    if kept <= leading {
        return range.start..range.start;
    }
    range.start + leading..range.start + kept
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    While,
    If,
    Return,
    Break,
    Continue,
    Print,
    Let,
    Func,
}

impl Keyword {
    /// Dispatch order. The first prefix that matches wins.
    pub const ALL: [Keyword; 8] = [
        Keyword::While,
        Keyword::If,
        Keyword::Return,
        Keyword::Break,
        Keyword::Continue,
        Keyword::Print,
        Keyword::Let,
        Keyword::Func,
    ];

    pub const END: &'static str = "end";

    pub fn prefix(self) -> &'static str {
        match self {
            Keyword::While => "while ",
            Keyword::If => "if ",
            Keyword::Return => "return ",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::Print => "print ",
            Keyword::Let => "let ",
            Keyword::Func => "func ",
        }
    }

    pub fn opens_block(self) -> bool {
        matches!(self, Keyword::While | Keyword::If | Keyword::Func)
    }

    /// Splits a trimmed line into its statement keyword and the rest of the
    /// line.
    pub fn split(line: &str) -> Option<(Keyword, &str)> {
        Keyword::ALL.into_iter().find_map(|keyword| {
            line.strip_prefix(keyword.prefix())
                .map(|rest| (keyword, rest))
        })
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix().trim_end())
    }
}
