//! QDIMACS parser and writer for the QBF preprocessor.
//!
//! Unlike a parser that materializes its own formula type, this one drives an ingest sink
//! (see [`QdimacsSink`]) with the same four-operation event stream described by the QDIMACS
//! grammar: `declare_max_var_id`, `new_qblock`/`add_var_to_qblock`, and `add_literal`. This lets
//! `qbf-preprocess` own the actual formula representation while this crate stays a pure
//! syntax-to-events translator, mirroring how `varisat-dimacs` translates DIMACS CNF syntax into
//! `CnfFormula` builder calls.

use std::io;

use qbf_formula::QType;

use anyhow::Error;
use thiserror::Error;

/// The four ingest operations a QDIMACS parser drives. Implemented by the formula store that
/// consumes the parsed events (`qbf_preprocess::Preprocessor`), and by test doubles.
pub trait QdimacsSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn declare_max_var_id(&mut self, max_var: u32) -> Result<(), Self::Error>;
    fn new_qblock(&mut self, qtype: QType) -> Result<(), Self::Error>;
    fn add_var_to_qblock(&mut self, var: u32) -> Result<(), Self::Error>;
    fn add_literal(&mut self, lit: i64) -> Result<(), Self::Error>;
}

/// Possible errors while parsing a QDIMACS formula.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("line {}: unexpected character in QDIMACS input: '{}'", line, unexpected)]
    UnexpectedInput { line: usize, unexpected: char },
    #[error("line {}: literal index is too large: {}{}...", line, index, final_digit)]
    LiteralTooLarge {
        line: usize,
        index: usize,
        final_digit: usize,
    },
    #[error("line {}: invalid header syntax: {}", line, header)]
    InvalidHeader { line: usize, header: String },
    #[error("line {}: unterminated clause or prefix block", line)]
    Unterminated { line: usize },
    #[error(
        "formula has {} variables while the header specifies {} variables",
        var_count,
        header_var_count
    )]
    VarCount {
        var_count: usize,
        header_var_count: usize,
    },
    #[error(
        "formula has {} clauses while the header specifies {} clauses",
        clause_count,
        header_clause_count
    )]
    ClauseCount {
        clause_count: usize,
        header_clause_count: usize,
    },
    #[error("line {}: variable {} used in a prefix block more than once", line, var)]
    VariableAlreadyQuantified { line: usize, var: u32 },
    #[error("line {}: variable {} is not declared or not quantified", line, var)]
    UndeclaredVariable { line: usize, var: u32 },
    #[error("sink error: {0}")]
    Sink(#[source] anyhow::Error),
    #[error("parser invoked after a previous error")]
    PreviousError,
}

/// Variable and clause count present in a QDIMACS header.
#[derive(Copy, Clone, Debug)]
pub struct QdimacsHeader {
    pub var_count: usize,
    pub clause_count: usize,
}

/// What kind of line is currently being parsed, determined by its first non-whitespace byte.
#[derive(Copy, Clone, PartialEq, Eq)]
enum LineKind {
    Undetermined,
    Comment,
    Header,
    Prefix(PrefixKind),
    Clause,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum PrefixKind {
    Exists,
    Forall,
}

impl From<PrefixKind> for QType {
    fn from(kind: PrefixKind) -> QType {
        match kind {
            PrefixKind::Exists => QType::Exists,
            PrefixKind::Forall => QType::Forall,
        }
    }
}

/// Incremental QDIMACS parser driving a [`QdimacsSink`].
///
/// Feeds the sink exactly the four ingest operations from the QDIMACS grammar as it scans the
/// input byte by byte, so callers never need to materialize an intermediate formula.
pub struct QdimacsParser<S: QdimacsSink> {
    sink: S,

    header: Option<QdimacsHeader>,
    clause_count: usize,
    declared_max_var: bool,

    line_number: usize,
    partial_lit: usize,
    negate_next_lit: bool,

    in_lit: bool,
    in_comment_or_header: bool,
    start_of_line: bool,
    error: bool,

    line_kind: LineKind,
    header_line: Vec<u8>,
}

impl<S: QdimacsSink> QdimacsParser<S> {
    pub fn new(sink: S) -> Self {
        QdimacsParser {
            sink,
            header: None,
            clause_count: 0,
            declared_max_var: false,
            line_number: 1,
            partial_lit: 0,
            negate_next_lit: false,
            in_lit: false,
            in_comment_or_header: false,
            start_of_line: true,
            error: false,
            line_kind: LineKind::Undetermined,
            header_line: vec![],
        }
    }

    /// Parse the whole input, driving the sink, and check the header if present.
    pub fn parse(input: impl io::Read, sink: S) -> Result<S, Error> {
        use io::BufRead;

        let mut buffer = io::BufReader::new(input);
        let mut parser = Self::new(sink);

        loop {
            let data = buffer.fill_buf()?;
            if data.is_empty() {
                break;
            }
            parser.parse_chunk(data)?;
            let len = data.len();
            buffer.consume(len);
        }
        parser.eof()?;
        parser.check_header()?;

        Ok(parser.into_sink())
    }

    /// Parse a chunk of input. Call [`eof`](Self::eof) after the last chunk.
    pub fn parse_chunk(&mut self, chunk: &[u8]) -> Result<(), ParserError> {
        if self.error {
            return Err(ParserError::PreviousError);
        }
        for &byte in chunk.iter() {
            if byte == b'\n' {
                self.line_number += 1;
            }
            self.parse_byte(byte)?;
        }
        Ok(())
    }

    fn parse_byte(&mut self, byte: u8) -> Result<(), ParserError> {
        match byte {
            b'\n' | b'\r' if self.in_comment_or_header => {
                if self.line_kind == LineKind::Header {
                    self.parse_header_line()?;
                }
                self.in_comment_or_header = false;
                self.line_kind = LineKind::Undetermined;
                self.start_of_line = true;
            }
            _ if self.in_comment_or_header => {
                if self.line_kind == LineKind::Header {
                    self.header_line.push(byte);
                }
            }
            b'0'..=b'9' => {
                self.in_lit = true;
                let digit = (byte - b'0') as usize;

                const CAN_OVERFLOW: usize = u32::max_value() as usize / 10;
                const OVERFLOW_DIGIT: usize = u32::max_value() as usize % 10;

                if CAN_OVERFLOW <= self.partial_lit {
                    let carry = (digit <= OVERFLOW_DIGIT) as usize;
                    if CAN_OVERFLOW + carry <= self.partial_lit {
                        self.error = true;
                        return Err(ParserError::LiteralTooLarge {
                            line: self.line_number,
                            index: self.partial_lit,
                            final_digit: digit,
                        });
                    }
                }

                self.partial_lit = self.partial_lit * 10 + digit;
                self.start_of_line = false;
            }
            b'-' if !self.negate_next_lit && !self.in_lit => {
                self.negate_next_lit = true;
                self.start_of_line = false;
            }
            b' ' | b'\t' | b'\n' | b'\r' if !self.negate_next_lit || self.in_lit => {
                self.finish_token()?;
                self.negate_next_lit = false;
                self.in_lit = false;
                self.partial_lit = 0;
                self.start_of_line = byte != b' ' && byte != b'\t';
            }
            b'c' if self.start_of_line => {
                self.line_kind = LineKind::Comment;
                self.in_comment_or_header = true;
            }
            b'p' if self.start_of_line && self.header.is_none() => {
                self.line_kind = LineKind::Header;
                self.in_comment_or_header = true;
                self.header_line.clear();
                self.header_line.push(b'p');
            }
            b'e' if self.start_of_line => {
                self.line_kind = LineKind::Prefix(PrefixKind::Exists);
                self.sink
                    .new_qblock(QType::Exists)
                    .map_err(|e| ParserError::Sink(e.into()))?;
                self.start_of_line = false;
            }
            b'a' if self.start_of_line => {
                self.line_kind = LineKind::Prefix(PrefixKind::Forall);
                self.sink
                    .new_qblock(QType::Forall)
                    .map_err(|e| ParserError::Sink(e.into()))?;
                self.start_of_line = false;
            }
            _ => {
                self.error = true;
                return Err(ParserError::UnexpectedInput {
                    line: self.line_number,
                    unexpected: byte as char,
                });
            }
        }
        Ok(())
    }

    fn finish_token(&mut self) -> Result<(), ParserError> {
        if !self.in_lit {
            return Ok(());
        }
        match self.line_kind {
            LineKind::Prefix(_) => {
                if self.partial_lit == 0 {
                    self.sink
                        .add_literal(0)
                        .map_err(|e| ParserError::Sink(e.into()))?;
                } else {
                    self.sink
                        .add_var_to_qblock(self.partial_lit as u32)
                        .map_err(|e| ParserError::Sink(e.into()))?;
                }
            }
            _ => {
                // Clause line (or undetermined, which can only happen for a bare clause at the
                // very start of input with no preceding header).
                self.line_kind = LineKind::Clause;
                if self.partial_lit == 0 {
                    self.sink
                        .add_literal(0)
                        .map_err(|e| ParserError::Sink(e.into()))?;
                    self.clause_count += 1;
                } else {
                    let lit = self.partial_lit as i64 * if self.negate_next_lit { -1 } else { 1 };
                    self.sink
                        .add_literal(lit)
                        .map_err(|e| ParserError::Sink(e.into()))?;
                }
            }
        }
        Ok(())
    }

    /// Finish parsing the input.
    pub fn eof(&mut self) -> Result<(), ParserError> {
        if self.line_kind == LineKind::Header {
            self.parse_header_line()?;
        }
        self.finish_token()?;

        if self.in_lit {
            return Err(ParserError::Unterminated {
                line: self.line_number,
            });
        }

        Ok(())
    }

    /// Verify the header information against what was actually parsed, if a header was present.
    pub fn check_header(&self) -> Result<(), ParserError> {
        if let Some(header) = self.header {
            if self.clause_count != header.clause_count {
                return Err(ParserError::ClauseCount {
                    clause_count: self.clause_count,
                    header_clause_count: header.clause_count,
                });
            }
        }
        Ok(())
    }

    pub fn header(&self) -> Option<QdimacsHeader> {
        self.header
    }

    pub fn clause_count(&self) -> usize {
        self.clause_count
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn parse_header_line(&mut self) -> Result<(), ParserError> {
        let header_line = String::from_utf8_lossy(&self.header_line).into_owned();

        if !header_line.starts_with("p ") {
            return self.invalid_header(header_line);
        }

        let mut header_values = header_line[2..].split_whitespace();

        if header_values.next() != Some("cnf") {
            return self.invalid_header(header_line);
        }

        let var_count: usize = match header_values.next().and_then(|v| str::parse(v).ok()) {
            None => return self.invalid_header(header_line),
            Some(value) => value,
        };

        let clause_count: usize = match header_values.next().and_then(|v| str::parse(v).ok()) {
            None => return self.invalid_header(header_line),
            Some(value) => value,
        };

        if header_values.next().is_some() {
            return self.invalid_header(header_line);
        }

        self.header = Some(QdimacsHeader {
            var_count,
            clause_count,
        });

        if !self.declared_max_var {
            self.sink
                .declare_max_var_id(var_count as u32)
                .map_err(|e| ParserError::Sink(e.into()))?;
            self.declared_max_var = true;
        }

        Ok(())
    }

    fn invalid_header(&mut self, header_line: String) -> Result<(), ParserError> {
        self.error = true;
        Err(ParserError::InvalidHeader {
            line: self.line_number,
            header: header_line,
        })
    }
}

/// Write a QDIMACS header line.
pub fn write_qdimacs_header(target: &mut impl io::Write, header: QdimacsHeader) -> io::Result<()> {
    writeln!(
        target,
        "p cnf {var_count} {clause_count}",
        var_count = header.var_count,
        clause_count = header.clause_count
    )
}

/// Write one prefix line (`a`/`e` followed by variable ids and a terminating `0`).
pub fn write_qdimacs_prefix_line(
    target: &mut impl io::Write,
    qtype: QType,
    vars: impl IntoIterator<Item = u32>,
) -> io::Result<()> {
    target.write_all(&[qtype.letter() as u8, b' '])?;
    for var in vars {
        itoa::write(&mut *target, var)?;
        target.write_all(b" ")?;
    }
    target.write_all(b"0\n")
}

/// Write a single clause (literals followed by a terminating `0`).
pub fn write_qdimacs_clause(
    target: &mut impl io::Write,
    lits: impl IntoIterator<Item = i64>,
) -> io::Result<()> {
    for lit in lits {
        itoa::write(&mut *target, lit)?;
        target.write_all(b" ")?;
    }
    target.write_all(b"0\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingSink {
        events: Rc<RefCell<Vec<String>>>,
    }

    #[derive(Debug, Error)]
    #[error("recording sink never fails")]
    struct NeverFails;

    impl QdimacsSink for RecordingSink {
        type Error = NeverFails;

        fn declare_max_var_id(&mut self, max_var: u32) -> Result<(), NeverFails> {
            self.events
                .borrow_mut()
                .push(format!("declare_max_var_id({})", max_var));
            Ok(())
        }
        fn new_qblock(&mut self, qtype: QType) -> Result<(), NeverFails> {
            self.events
                .borrow_mut()
                .push(format!("new_qblock({:?})", qtype));
            Ok(())
        }
        fn add_var_to_qblock(&mut self, var: u32) -> Result<(), NeverFails> {
            self.events
                .borrow_mut()
                .push(format!("add_var_to_qblock({})", var));
            Ok(())
        }
        fn add_literal(&mut self, lit: i64) -> Result<(), NeverFails> {
            self.events
                .borrow_mut()
                .push(format!("add_literal({})", lit));
            Ok(())
        }
    }

    #[test]
    fn small_formula_events() {
        let events = Rc::new(RefCell::new(vec![]));
        let sink = RecordingSink {
            events: events.clone(),
        };

        let input = b"p cnf 2 2\ne 1 2 0\n1 2 0\n1 -2 0\n" as &[_];
        QdimacsParser::parse(input, sink).unwrap();

        let events = events.borrow();
        assert_eq!(events[0], "declare_max_var_id(2)");
        assert_eq!(events[1], "new_qblock(Exists)");
        assert_eq!(events[2], "add_var_to_qblock(1)");
        assert_eq!(events[3], "add_var_to_qblock(2)");
        assert_eq!(events[4], "add_literal(0)");
        assert_eq!(events[5], "add_literal(1)");
        assert_eq!(events[6], "add_literal(2)");
        assert_eq!(events[7], "add_literal(0)");
        assert_eq!(events[8], "add_literal(1)");
        assert_eq!(events[9], "add_literal(-2)");
        assert_eq!(events[10], "add_literal(0)");
    }

    #[test]
    fn comments_and_whitespace_are_skipped() {
        let events = Rc::new(RefCell::new(vec![]));
        let sink = RecordingSink {
            events: events.clone(),
        };
        let input = b"c a leading comment\np  cnf  2   1 \nc another comment\na 1 0\ne 2 0\n1 2 0\n"
            as &[_];
        QdimacsParser::parse(input, sink).unwrap();
        let events = events.borrow();
        assert!(events.contains(&"declare_max_var_id(2)".to_string()));
        assert!(events.contains(&"new_qblock(Forall)".to_string()));
        assert!(events.contains(&"new_qblock(Exists)".to_string()));
    }

    #[test]
    fn unterminated_clause_is_an_error() {
        let events = Rc::new(RefCell::new(vec![]));
        let sink = RecordingSink { events };
        let input = b"p cnf 2 1\ne 1 2 0\n1 2" as &[_];
        let err = QdimacsParser::parse(input, sink).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParserError>(),
            Some(ParserError::Unterminated { .. })
        ));
    }
}
