//! Card assembler: physical lines to logical cards.
//!
//! Handles the three field formats (small 8-column, large 16-column with a
//! `*` name suffix, comma-delimited free field), continuation lines (blank
//! leading field, `+`/`*` markers, matching tags), inline comments, tabs and
//! the `=N=` repeat shorthand.

use std::collections::VecDeque;

use tracing::warn;

use crate::card::{Card, normalize_name};
use crate::error::InpError;
use crate::field::{self, FieldValue, FieldWidth};
use crate::source::LineSource;

/// Card name that terminates the bulk data.
pub const END_DATA: &str = "ENDDATA";

/// Assembler configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerOptions {
    /// Fail on malformed input instead of dropping it with a warning.
    pub strict: bool,
}

impl AssemblerOptions {
    /// Set strict mode.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Result of one [`CardAssembler::next_card`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum CardEvent {
    /// A complete logical card.
    Card(Card),
    /// Whitespace-only line.
    Blank,
    /// The `ENDDATA` terminator.
    EndData,
}

/// Groups physical lines into logical cards.
pub struct CardAssembler<S> {
    source: S,
    options: AssemblerOptions,
    line_no: usize,
    lookahead: VecDeque<(usize, String)>,
    last_card: Option<Card>,
    pending: VecDeque<Card>,
}

/// One physical line split into fields.
struct Row {
    lead: String,
    data: Vec<String>,
    tag: String,
    dropped: Vec<String>,
}

impl<S: LineSource> CardAssembler<S> {
    /// Create an assembler with default options.
    pub fn new(source: S) -> Self {
        Self::with_options(source, AssemblerOptions::default())
    }

    /// Create an assembler with explicit options.
    pub fn with_options(source: S, options: AssemblerOptions) -> Self {
        Self {
            source,
            options,
            line_no: 0,
            lookahead: VecDeque::new(),
            last_card: None,
            pending: VecDeque::new(),
        }
    }

    /// Number lines as if `offset` lines were already read.
    pub fn with_line_offset(mut self, offset: usize) -> Self {
        self.line_no = offset;
        self
    }

    /// Most recent non-repeat card.
    pub fn last_card(&self) -> Option<&Card> {
        self.last_card.as_ref()
    }

    /// Give back the line source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Assemble the next logical card. `None` once the source is exhausted.
    pub fn next_card(&mut self) -> Result<Option<CardEvent>, InpError> {
        if let Some(card) = self.pending.pop_front() {
            return Ok(Some(CardEvent::Card(card)));
        }

        loop {
            let Some((line_no, line)) = self.read_line()? else {
                return Ok(None);
            };
            if is_comment_line(&line) {
                continue;
            }
            let content = clean_line(&line);
            if content.trim().is_empty() {
                return Ok(Some(CardEvent::Blank));
            }

            let lead = leading_field(&content);
            if is_continuation_lead(&lead) {
                let message = format!("continuation line without a parent card: {line:?}");
                if self.options.strict {
                    return Err(InpError::syntax(line_no, message));
                }
                warn!(line = line_no, "{message}");
                continue;
            }

            if lead.starts_with('=') {
                let count = repeat_count(&lead)
                    .ok_or_else(|| InpError::syntax(line_no, format!("bad repeat marker {lead:?}")))?;
                let overrides = self.assemble(line_no, line, &content)?;
                return self.expand_repeat(count, overrides);
            }

            if !lead.starts_with(|c: char| c.is_ascii_alphabetic()) {
                let message = format!("card name must start with a letter: {lead:?}");
                if self.options.strict {
                    return Err(InpError::syntax(line_no, message));
                }
                warn!(line = line_no, "{message}");
                continue;
            }

            if normalize_name(&lead) == END_DATA {
                return Ok(Some(CardEvent::EndData));
            }

            let card = self.assemble(line_no, line, &content)?;
            self.last_card = Some(card.clone());
            return Ok(Some(CardEvent::Card(card)));
        }
    }

    /// Merge a first line and its continuations into one card.
    fn assemble(&mut self, line_no: usize, line: String, content: &str) -> Result<Card, InpError> {
        let lead = leading_field(content);
        let free = content.contains(',');
        let mut large = lead.ends_with('*');
        let format = match (free, large) {
            (true, _) => FieldWidth::Free,
            (false, true) => FieldWidth::Large,
            (false, false) => FieldWidth::Small,
        };

        let row = split_row(content, large);
        self.check_dropped(line_no, &row)?;
        let mut fields = vec![normalize_name(&row.lead)];
        fields.extend(row.data);
        let mut tag = row.tag;
        let mut lines = vec![line];

        while let Some(group) = self.take_continuation(&tag)? {
            for (cont_no, cont_line) in group {
                if is_comment_line(&cont_line) {
                    lines.push(cont_line);
                    continue;
                }
                let cont = clean_line(&cont_line);
                let cont_lead = leading_field(&cont);
                if cont_lead.starts_with('*') {
                    large = true;
                } else if cont_lead.starts_with('+') {
                    large = false;
                }
                let row = split_row(&cont, large);
                self.check_dropped(cont_no, &row)?;
                fields.extend(row.data);
                tag = row.tag;
                lines.push(cont_line);
            }
        }

        while fields.len() > 1 && fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }

        Ok(Card {
            name: fields[0].clone(),
            fields,
            line: line_no,
            lines,
            format,
        })
    }

    /// Copies of the last non-repeat card, with overrides and increments.
    fn expand_repeat(&mut self, count: usize, overrides: Card) -> Result<Option<CardEvent>, InpError> {
        let base = self.last_card.clone().ok_or_else(|| {
            InpError::syntax(overrides.line, "repeat card without a previous card")
        })?;
        let width = base.nfields().max(overrides.nfields());

        for copy in 1..=count {
            let mut fields = vec![base.name.clone()];
            for index in 1..width {
                let inherited = base.field(index);
                let given = overrides.field(index);
                let value = if given.is_empty() || given == "=" {
                    inherited.to_string()
                } else if let Some(step) = parse_increment(given) {
                    increment(inherited, &step, copy).ok_or_else(|| {
                        InpError::syntax(
                            overrides.line,
                            format!("cannot increment field {index} value {inherited:?} by {given}"),
                        )
                    })?
                } else {
                    given.to_string()
                };
                fields.push(value);
            }
            while fields.len() > 1 && fields.last().is_some_and(|f| f.is_empty()) {
                fields.pop();
            }
            self.pending.push_back(Card {
                name: base.name.clone(),
                fields,
                line: overrides.line,
                lines: Vec::new(),
                format: base.format,
            });
        }

        Ok(self.pending.pop_front().map(CardEvent::Card))
    }

    fn check_dropped(&self, line_no: usize, row: &Row) -> Result<(), InpError> {
        if row.dropped.is_empty() {
            return Ok(());
        }
        let message = format!("fields beyond the continuation tag: {:?}", row.dropped);
        if self.options.strict {
            return Err(InpError::syntax(line_no, message));
        }
        warn!(line = line_no, "{message}; dropped");
        Ok(())
    }

    fn fill(&mut self, count: usize) -> Result<bool, InpError> {
        while self.lookahead.len() < count {
            match self.source.next_line()? {
                Some(line) => {
                    self.line_no += 1;
                    self.lookahead.push_back((self.line_no, line));
                }
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    fn read_line(&mut self) -> Result<Option<(usize, String)>, InpError> {
        if !self.fill(1)? {
            return Ok(None);
        }
        Ok(self.lookahead.pop_front())
    }

    /// Comment lines plus the continuation line that follows them, if the
    /// next non-comment line continues the current card.
    fn take_continuation(&mut self, tag: &str) -> Result<Option<Vec<(usize, String)>>, InpError> {
        let mut k = 0usize;
        loop {
            if !self.fill(k + 1)? {
                return Ok(None);
            }
            let line = &self.lookahead[k].1;
            if is_comment_line(line) {
                k += 1;
                continue;
            }
            let content = clean_line(line);
            if content.trim().is_empty() {
                return Ok(None);
            }
            let lead = leading_field(&content);
            let tagged = !tag.is_empty() && lead == tag;
            if !(is_continuation_lead(&lead) || tagged) {
                return Ok(None);
            }
            return Ok(Some(self.lookahead.drain(..=k).collect()));
        }
    }
}

fn is_comment_line(line: &str) -> bool {
    line.trim_start().starts_with('$')
}

fn is_continuation_lead(lead: &str) -> bool {
    lead.is_empty() || lead.starts_with('+') || lead.starts_with('*')
}

/// Drop an inline `$` comment and expand tabs to 8-column stops.
fn clean_line(line: &str) -> String {
    let data = line.split('$').next().unwrap_or("");
    let mut out = String::with_capacity(data.len() + 8);
    for ch in data.chars() {
        if ch == '\t' {
            let column = out.chars().count();
            let next = (column / 8 + 1) * 8;
            out.extend(std::iter::repeat_n(' ', next - column));
        } else {
            out.push(ch);
        }
    }
    out
}

/// Trimmed first field of a cleaned line.
fn leading_field(content: &str) -> String {
    if content.contains(',') {
        content.split(',').next().unwrap_or("").trim().to_string()
    } else {
        content.chars().take(8).collect::<String>().trim().to_string()
    }
}

fn split_row(content: &str, large: bool) -> Row {
    let per_row = if large { 4 } else { 8 };

    if content.contains(',') {
        let mut tokens = content.split(',').map(|t| t.trim().to_string());
        let lead = tokens.next().unwrap_or_default();
        let mut data: Vec<String> = tokens.by_ref().take(per_row).collect();
        data.resize(per_row, String::new());
        let tag = tokens.next().unwrap_or_default();
        let dropped = tokens.filter(|t| !t.is_empty()).collect();
        return Row {
            lead,
            data,
            tag,
            dropped,
        };
    }

    let chars: Vec<char> = content.chars().collect();
    let width = if large { 16 } else { 8 };
    let data = (0..per_row)
        .map(|i| column(&chars, 8 + i * width, 8 + (i + 1) * width))
        .collect();
    Row {
        lead: column(&chars, 0, 8),
        data,
        tag: column(&chars, 72, 80),
        dropped: Vec::new(),
    }
}

fn column(chars: &[char], start: usize, end: usize) -> String {
    if start >= chars.len() {
        return String::new();
    }
    let end = end.min(chars.len());
    chars[start..end].iter().collect::<String>().trim().to_string()
}

/// `=N=`, `=(N)`, `=*=` and `=` markers; `*` and bare `=` mean one copy.
fn repeat_count(lead: &str) -> Option<usize> {
    let inner = lead
        .trim_start_matches('=')
        .trim_end_matches('=')
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim();
    if inner.is_empty() || inner == "*" {
        return Some(1);
    }
    inner.parse::<usize>().ok().filter(|n| *n > 0)
}

/// `*K` or `*(K)` increment.
fn parse_increment(text: &str) -> Option<FieldValue> {
    let inner = text
        .strip_prefix('*')?
        .trim_start_matches('(')
        .trim_end_matches(')');
    match field::classify(inner) {
        v @ (FieldValue::Integer(_) | FieldValue::Real(_)) => Some(v),
        _ => None,
    }
}

fn increment(inherited: &str, step: &FieldValue, copy: usize) -> Option<String> {
    let times = copy as i64;
    match (field::classify(inherited), step) {
        (FieldValue::Integer(base), FieldValue::Integer(k)) => {
            Some(base.checked_add(k.checked_mul(times)?)?.to_string())
        }
        (base, step) => {
            let value = base.as_f64()? + step.as_f64()? * times as f64;
            field::format_real(value, None).ok()
        }
    }
}
