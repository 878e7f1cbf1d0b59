use std::cell::OnceCell;
use std::ops::Range;

use thiserror::Error;
use tracing::debug;

use crate::lexical::{split_lines, strip_line, Keyword};
use crate::parse::{ParseError, Stmt};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("line {line}: `end` without a matching `while`, `if` or `func`")]
    UnexpectedEnd { line: usize },

    #[error("line {line}: `{keyword}` block is never closed with `end`")]
    UnclosedBlock { line: usize, keyword: Keyword },
}

/// Source split into trimmed lines, plus the opener/`end` pairing for every
/// block.
///
/// The table keeps one copy of the source and hands out slices of it; lines
/// are never copied individually. Each line is parsed into a `Stmt` the first
/// time it runs and kept, so loops and calls never re-enter the parser.
#[derive(Debug, Clone)]
pub struct LineTable {
    source: Box<str>,
    lines: Vec<Range<usize>>,
    /// `pairs[i] == i` for lines that neither open nor close a block.
    pairs: Vec<usize>,
    statements: Vec<OnceCell<Stmt>>,
}

impl PartialEq for LineTable {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.lines == other.lines && self.pairs == other.pairs
    }
}

impl Eq for LineTable {}

#[derive(Clone, Copy)]
enum Marker {
    Open(Keyword),
    Close,
    Plain,
}

impl Marker {
    fn classify(line: &str) -> Marker {
        match Keyword::split(line) {
            Some((keyword, _)) if keyword.opens_block() => Marker::Open(keyword),
            _ if line.starts_with(Keyword::END) => Marker::Close,
            _ => Marker::Plain,
        }
    }
}

impl LineTable {
    pub fn parse(source: &str) -> Result<LineTable, StructureError> {
        let lines: Vec<_> = split_lines(source)
            .into_iter()
            .map(|range| strip_line(source, range))
            .collect();
        let markers: Vec<_> = lines
            .iter()
            .map(|range| Marker::classify(&source[range.clone()]))
            .collect();

        let mut pairs: Vec<usize> = (0..lines.len()).collect();
        let mut open: Vec<(usize, Keyword)> = Vec::new();
        for (index, marker) in markers.into_iter().enumerate() {
            match marker {
                Marker::Open(keyword) => open.push((index, keyword)),
                Marker::Close => {
                    let Some((opener, _)) = open.pop() else {
                        return Err(StructureError::UnexpectedEnd { line: index + 1 });
                    };
                    pairs[opener] = index;
                    pairs[index] = opener;
                }
                Marker::Plain => {}
            }
        }
        if let Some(&(opener, keyword)) = open.last() {
            return Err(StructureError::UnclosedBlock {
                line: opener + 1,
                keyword,
            });
        }

        debug!(lines = lines.len(), "built line table");
        Ok(LineTable {
            source: source.into(),
            statements: vec![OnceCell::new(); lines.len()],
            lines,
            pairs,
        })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, index: usize) -> &str {
        &self.source[self.lines[index].clone()]
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        (0..self.len()).map(|index| self.line(index))
    }

    /// The other half of the block that starts or ends at `index`.
    pub fn partner(&self, index: usize) -> Option<usize> {
        self.pairs
            .get(index)
            .copied()
            .filter(|&partner| partner != index)
    }

    /// The `end` of the block opened at `opener`.
    ///
    /// Total for openers: `parse` rejects any source with an unclosed block.
    pub(crate) fn block_end(&self, opener: usize) -> usize {
        self.pairs[opener]
    }

    /// The statement on line `index`, parsed on first use.
    ///
    /// Parse failures are not cached; a bad line fails again each time it is
    /// reached.
    pub fn statement(&self, index: usize) -> Result<&Stmt, ParseError> {
        let cell = &self.statements[index];
        if let Some(stmt) = cell.get() {
            return Ok(stmt);
        }
        let stmt = Stmt::parse(self.line(index))?;
        Ok(cell.get_or_init(|| stmt))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const NESTED: &str = "\
let i = 3 # counter
while i > 0
  if i == 2
    print i
  end
  let i = i - 1
end

func add(a, b)
  return a + b
end
";

    #[test]
    fn trims_and_strips_comments() {
        let table = LineTable::parse(NESTED).unwrap();
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(
            lines,
            vec![
                "let i = 3",
                "while i > 0",
                "if i == 2",
                "print i",
                "end",
                "let i = i - 1",
                "end",
                "",
                "func add(a, b)",
                "return a + b",
                "end",
            ]
        );
    }

    #[test]
    fn pairs_are_symmetric() {
        let table = LineTable::parse(NESTED).unwrap();
        assert_eq!(table.partner(1), Some(6));
        assert_eq!(table.partner(6), Some(1));
        assert_eq!(table.partner(2), Some(4));
        assert_eq!(table.partner(4), Some(2));
        assert_eq!(table.partner(8), Some(10));
        assert_eq!(table.partner(0), None);
        assert_eq!(table.partner(99), None);
    }

    #[test]
    fn parsing_is_deterministic() {
        assert_eq!(
            LineTable::parse(NESTED).unwrap(),
            LineTable::parse(NESTED).unwrap()
        );
    }

    #[test]
    fn statements_are_parsed_once() {
        let table = LineTable::parse(NESTED).unwrap();
        let first = table.statement(9).unwrap();
        let second = table.statement(9).unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(matches!(first, Stmt::Return { .. }));
        assert_eq!(table, LineTable::parse(NESTED).unwrap());
    }

    #[test]
    fn bad_statements_fail_every_time() {
        let table = LineTable::parse("let x 1").unwrap();
        assert!(table.statement(0).is_err());
        assert!(table.statement(0).is_err());
    }

    #[test]
    fn block_end_of_openers() {
        let table = LineTable::parse(NESTED).unwrap();
        assert_eq!(table.block_end(1), 6);
        assert_eq!(table.block_end(8), 10);
    }

    #[test]
    fn empty_source_has_no_lines() {
        let table = LineTable::parse("").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn rejects_stray_end() {
        let error = LineTable::parse("print 1\nend\n").unwrap_err();
        assert_eq!(error, StructureError::UnexpectedEnd { line: 2 });
    }

    #[test]
    fn rejects_unclosed_block() {
        let error = LineTable::parse("if 1\n  while 1\n  end\n").unwrap_err();
        assert_eq!(
            error,
            StructureError::UnclosedBlock {
                line: 1,
                keyword: Keyword::If,
            }
        );
    }
}
