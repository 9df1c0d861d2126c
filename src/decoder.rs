//! Line decoder engine.
//!
//! A [`Decoder`] turns the ordered lines of one section into an ordered
//! sequence of records. Each line is offered to the rules in registration
//! order and the first rule whose pattern matches decides the outcome:
//!
//! - `Ok(Some(record))`: the line produced a record
//! - `Ok(None)`: the line was recognised but carries nothing (a discard)
//! - `Err(..)`: the matched line has malformed fields
//!
//! A line that no rule matches is a [`OdbError::LineFormat`] in
//! [`DecodeMode::Strict`] and a discard in [`DecodeMode::Lenient`].
//!
//! Decoding is lazy: [`Decoder::decode`] returns an iterator that reads one
//! line per step and stops after the first error.

use crate::dispatch::{Dispatcher, Matcher};
use crate::error::{OdbError, Result};
use regex::{Captures, Regex};
use std::fmt;
use std::str::FromStr;

/// Outcome of a rule builder. The error string becomes the `reason` of a
/// [`OdbError::LineFormat`].
pub type BuildResult<R> = std::result::Result<Option<R>, String>;

/// Pure function from a matched line to a record (or a discard).
pub type Builder<R> = fn(&Captures<'_>) -> BuildResult<R>;

/// A pattern plus the builder invoked when the pattern matches
pub struct DecoderRule<R> {
    name: &'static str,
    pattern: Regex,
    build: Builder<R>,
}

impl<R> DecoderRule<R> {
    /// Create a rule from a compiled pattern
    pub fn new(name: &'static str, pattern: Regex, build: Builder<R>) -> Self {
        Self {
            name,
            pattern,
            build,
        }
    }

    /// Create a rule, compiling `pattern`
    pub fn from_pattern(
        name: &'static str,
        pattern: &str,
        build: Builder<R>,
    ) -> std::result::Result<Self, regex::Error> {
        Ok(Self::new(name, Regex::new(pattern)?, build))
    }

    /// Rule name, used in diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

impl<R> fmt::Debug for DecoderRule<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

impl<R> Matcher for DecoderRule<R> {
    type Output = BuildResult<R>;

    fn try_match(&self, input: &str) -> Option<BuildResult<R>> {
        self.pattern.captures(input).map(|caps| (self.build)(&caps))
    }
}

/// Builder for lines that are recognised but carry no record
pub fn discard<R>(_: &Captures<'_>) -> BuildResult<R> {
    Ok(None)
}

/// Parse capture group `group` as a number, naming `field` on failure
pub fn capture_parse<T: FromStr>(caps: &Captures<'_>, group: usize, field: &str) -> std::result::Result<T, String> {
    let text = caps
        .get(group)
        .map(|m| m.as_str())
        .ok_or_else(|| format!("missing {}", field))?;
    text.trim()
        .parse::<T>()
        .map_err(|_| format!("invalid {} '{}'", field, text))
}

/// Behaviour for lines that match no rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Unmatched lines are a [`OdbError::LineFormat`]
    #[default]
    Strict,
    /// Unmatched lines are treated as discards
    Lenient,
}

/// Decodes lines of one section with an ordered rule set
pub struct Decoder<'r, R> {
    rules: Dispatcher<'r, DecoderRule<R>>,
    mode: DecodeMode,
    section: String,
}

impl<'r, R> Decoder<'r, R> {
    /// Create a strict decoder over `rules`, tried in slice order
    pub fn new(rules: &'r [DecoderRule<R>]) -> Self {
        Self {
            rules: Dispatcher::new(rules),
            mode: DecodeMode::Strict,
            section: String::new(),
        }
    }

    pub fn with_mode(mut self, mode: DecodeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Name of the section being decoded, reported in errors
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Decode a single line. `line_number` is only used for error context.
    ///
    /// Lenient-mode discards of unmatched lines are reported as `Ok(None)`
    /// exactly like rule discards.
    pub fn decode_line(&self, line_number: usize, line: &str) -> Result<Option<R>> {
        match self.outcome(line_number, line)? {
            LineOutcome::Record(record) => Ok(Some(record)),
            LineOutcome::Discard | LineOutcome::Unmatched => Ok(None),
        }
    }

    /// Lazily decode `lines` in order
    pub fn decode<I>(&self, lines: I) -> Decode<'_, 'r, I::IntoIter, R>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Decode {
            decoder: self,
            lines: lines.into_iter(),
            line_number: 0,
            unmatched: 0,
            first_unmatched: None,
            failed: false,
        }
    }

    fn outcome(&self, line_number: usize, line: &str) -> Result<LineOutcome<R>> {
        match self.rules.dispatch(line) {
            Some(Ok(Some(record))) => Ok(LineOutcome::Record(record)),
            Some(Ok(None)) => Ok(LineOutcome::Discard),
            Some(Err(reason)) => Err(self.line_error(line_number, line, reason)),
            None => match self.mode {
                DecodeMode::Strict => {
                    Err(self.line_error(line_number, line, "no rule matches".to_string()))
                }
                DecodeMode::Lenient => Ok(LineOutcome::Unmatched),
            },
        }
    }

    fn line_error(&self, line_number: usize, line: &str, reason: String) -> OdbError {
        OdbError::LineFormat {
            section: self.section.clone(),
            line_number,
            line: line.to_string(),
            reason,
        }
    }
}

enum LineOutcome<R> {
    Record(R),
    Discard,
    Unmatched,
}

/// A record together with the line it was decoded from
#[derive(Debug, Clone, PartialEq)]
pub struct Located<R> {
    /// 1-based line number within the section
    pub line_number: usize,
    pub line: String,
    pub record: R,
}

impl<R> Located<R> {
    pub fn into_inner(self) -> R {
        self.record
    }
}

/// Lazy decoding iterator returned by [`Decoder::decode`].
///
/// Yields one item per input line. After an error it yields nothing more.
pub struct Decode<'d, 'r, I, R> {
    decoder: &'d Decoder<'r, R>,
    lines: I,
    line_number: usize,
    unmatched: usize,
    first_unmatched: Option<(usize, String)>,
    failed: bool,
}

impl<'d, 'r, I, R> Decode<'d, 'r, I, R>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    /// Number of lines discarded so far because no rule matched (lenient mode)
    pub fn unmatched(&self) -> usize {
        self.unmatched
    }

    /// Line number and text of the first unmatched line (lenient mode)
    pub fn first_unmatched(&self) -> Option<(usize, &str)> {
        self.first_unmatched
            .as_ref()
            .map(|(n, line)| (*n, line.as_str()))
    }

    /// Skip discards, yielding only produced records
    pub fn records(self) -> Records<'d, 'r, I, R> {
        Records { decode: self }
    }

    /// Next produced record with its source line, skipping discards
    pub fn next_located(&mut self) -> Option<Result<Located<R>>> {
        loop {
            let step = self.step(|line_number, line, record| Located {
                line_number,
                line: line.to_string(),
                record,
            });
            match step? {
                Ok(Some(located)) => return Some(Ok(located)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }

    fn step<T>(&mut self, wrap: impl FnOnce(usize, &str, R) -> T) -> Option<Result<Option<T>>> {
        if self.failed {
            return None;
        }
        let line = self.lines.next()?;
        let line = line.as_ref();
        self.line_number += 1;

        let item = match self.decoder.outcome(self.line_number, line) {
            Ok(LineOutcome::Record(record)) => Ok(Some(wrap(self.line_number, line, record))),
            Ok(LineOutcome::Discard) => Ok(None),
            Ok(LineOutcome::Unmatched) => {
                self.unmatched += 1;
                if self.first_unmatched.is_none() {
                    self.first_unmatched = Some((self.line_number, line.to_string()));
                }
                Ok(None)
            }
            Err(err) => Err(err),
        };
        self.failed = item.is_err();
        Some(item)
    }
}

impl<I, R> Iterator for Decode<'_, '_, I, R>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Result<Option<R>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.step(|_, _, record| record)
    }
}

/// Iterator over produced records only, returned by [`Decode::records`]
pub struct Records<'d, 'r, I, R> {
    decode: Decode<'d, 'r, I, R>,
}

impl<I, R> Iterator for Records<'_, '_, I, R>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.decode.next()? {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Rec {
        Specific(u32),
        General(String),
    }

    fn specific(caps: &Captures<'_>) -> BuildResult<Rec> {
        Ok(Some(Rec::Specific(capture_parse(caps, 1, "number")?)))
    }

    fn general(caps: &Captures<'_>) -> BuildResult<Rec> {
        Ok(Some(Rec::General(caps[1].to_string())))
    }

    fn rules() -> Vec<DecoderRule<Rec>> {
        vec![
            DecoderRule::from_pattern("specific", r"^N\s+(\d+)$", specific).unwrap(),
            DecoderRule::from_pattern("general", r"^N\s+(.+)$", general).unwrap(),
            DecoderRule::from_pattern("marker", r"^#", discard).unwrap(),
        ]
    }

    #[test]
    fn test_first_rule_wins() {
        let rules = rules();
        let decoder = Decoder::new(&rules);
        assert_eq!(decoder.decode_line(1, "N 12").unwrap(), Some(Rec::Specific(12)));
        assert_eq!(
            decoder.decode_line(2, "N twelve").unwrap(),
            Some(Rec::General("twelve".to_string()))
        );
    }

    #[test]
    fn test_discard_is_not_unmatched() {
        let rules = rules();
        let decoder = Decoder::new(&rules);
        let out: Vec<_> = decoder.decode(["# marker", "N 1"]).collect::<Result<_>>().unwrap();
        assert_eq!(out, vec![None, Some(Rec::Specific(1))]);
    }

    #[test]
    fn test_strict_unmatched_line_fails_with_position() {
        let rules = rules();
        let decoder = Decoder::new(&rules).with_section("Test");
        let mut it = decoder.decode(["N 1", "Q 2", "N 3"]);
        assert!(it.next().unwrap().is_ok());
        match it.next().unwrap() {
            Err(OdbError::LineFormat {
                section,
                line_number,
                line,
                ..
            }) => {
                assert_eq!(section, "Test");
                assert_eq!(line_number, 2);
                assert_eq!(line, "Q 2");
            }
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
        assert!(it.next().is_none());
    }

    #[test]
    fn test_lenient_unmatched_line_is_discarded() {
        let rules = rules();
        let decoder = Decoder::new(&rules).with_mode(DecodeMode::Lenient);
        let mut it = decoder.decode(["Q 2", "N 3", "Z"]);
        let out: Vec<_> = it.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(out, vec![None, Some(Rec::Specific(3)), None]);
        assert_eq!(it.unmatched(), 2);
        assert_eq!(it.first_unmatched(), Some((1, "Q 2")));
    }

    #[test]
    fn test_records_skips_discards() {
        let rules = rules();
        let decoder = Decoder::new(&rules);
        let out: Vec<_> = decoder
            .decode(vec!["#".to_string(), "N 7".to_string()])
            .records()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(out, vec![Rec::Specific(7)]);
    }

    #[test]
    fn test_decode_line_agrees_with_iterator() {
        let rules = rules();
        let lines = ["N 1", "# marker", "Q 2", "N x"];
        let lenient = Decoder::new(&rules).with_mode(DecodeMode::Lenient);
        let iterated: Vec<_> = lenient.decode(lines).collect::<Result<_>>().unwrap();
        let single: Vec<_> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| lenient.decode_line(i + 1, line).unwrap())
            .collect();
        assert_eq!(iterated, single);

        let strict = Decoder::new(&rules);
        assert!(strict.decode_line(3, "Q 2").is_err());
        assert!(strict.decode(lines).nth(2).unwrap().is_err());
    }

    #[test]
    fn test_next_located_keeps_source_line() {
        let rules = rules();
        let decoder = Decoder::new(&rules).with_mode(DecodeMode::Lenient);
        let mut it = decoder.decode(["# marker", "Q", "N 5"]);
        let located = it.next_located().unwrap().unwrap();
        assert_eq!(located.line_number, 3);
        assert_eq!(located.line, "N 5");
        assert_eq!(located.into_inner(), Rec::Specific(5));
        assert!(it.next_located().is_none());
        assert_eq!(it.unmatched(), 1);
    }

    #[test]
    fn test_records_can_be_returned_from_borrowing_fn() {
        fn specifics(decoder: &Decoder<'_, Rec>, lines: &[String]) -> Result<Vec<Rec>> {
            decoder.decode(lines).records().collect()
        }
        let rules = rules();
        let decoder = Decoder::new(&rules);
        let lines = vec!["N 1".to_string(), "#".to_string(), "N 2".to_string()];
        assert_eq!(
            specifics(&decoder, &lines).unwrap(),
            vec![Rec::Specific(1), Rec::Specific(2)]
        );
    }

    #[test]
    fn test_builder_error_is_attributed_to_line() {
        fn overflow(caps: &Captures<'_>) -> BuildResult<Rec> {
            Ok(Some(Rec::Specific(capture_parse(caps, 1, "number")?)))
        }
        let rules = vec![DecoderRule::from_pattern("n", r"^N\s+(\d+)$", overflow).unwrap()];
        let decoder = Decoder::new(&rules);
        let err = decoder.decode_line(4, "N 99999999999").unwrap_err();
        assert!(err.to_string().contains("invalid number"));
        assert!(err.to_string().contains("line 4"));
    }
}
