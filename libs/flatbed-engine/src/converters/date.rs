use std::fmt::Write;

use chrono::format::{self, ParseResult, Parsed, StrftimeItems};

use flatbed_api::converter::FieldConverter;
use flatbed_api::error::ConversionError;
use flatbed_api::option::{ConversionOptions, FORMAT};
use flatbed_api::value::Value;

use super::type_mismatch;

pub const DEFAULT_FORMAT: &str = "yyyy-MM-dd";

/// Calendar date (or date-time) under a `format` pattern, default `yyyy-MM-dd`.
///
/// Patterns use the letter syntax flat-file layouts are written in
/// (`yyyyMMdd`, `dd/MM/yy HH:mm:ss`, `'T'` for quoted literals). A pattern
/// with time letters decodes to `Value::DateTime`, otherwise to
/// `Value::Date`. Parts a pattern leaves out default to 1970-01-01 and
/// midnight, so `yyyyMM` reads the first of the month and `HHmmss` a time
/// on 1970-01-01. Blank text decodes to `Value::Null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateConverter;

impl FieldConverter for DateConverter {
    fn type_name(&self) -> &'static str {
        "date"
    }

    fn decode(&self, text: &str, options: &ConversionOptions) -> Result<Value, ConversionError> {
        if text.is_empty() {
            return Ok(Value::Null);
        }
        let pattern = DatePattern::parse(options.format().unwrap_or(DEFAULT_FORMAT))?;
        pattern
            .decode(text)
            .map_err(|_| ConversionError::malformed(text, self.type_name()))
    }

    fn encode(&self, value: &Value, options: &ConversionOptions) -> Result<String, ConversionError> {
        let pattern = DatePattern::parse(options.format().unwrap_or(DEFAULT_FORMAT))?;

        let mut out = String::new();
        let written = match value {
            Value::Null => return Ok(out),
            Value::DateTime(dt) => write!(out, "{}", dt.format(&pattern.strftime)),
            Value::Date(d) if pattern.has_time => {
                write!(out, "{}", d.and_time(chrono::NaiveTime::MIN).format(&pattern.strftime))
            }
            Value::Date(d) => write!(out, "{}", d.format(&pattern.strftime)),
            other => return Err(type_mismatch(self.type_name(), other)),
        };
        written.map_err(|_| ConversionError::malformed(value.to_string(), self.type_name()))?;
        Ok(out)
    }
}

/// A layout date pattern translated to chrono's strftime syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    pub strftime: String,
    pub has_time: bool,
    fields: PatternFields,
}

/// Which calendar and clock parts a pattern names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct PatternFields {
    year: bool,
    month: bool,
    day: bool,
    day_of_year: bool,
    hour: bool,
    twelve_hour: bool,
    minute: bool,
    am_pm: bool,
}

impl DatePattern {
    pub fn parse(pattern: &str) -> Result<Self, ConversionError> {
        let invalid = || ConversionError::invalid_option(FORMAT, pattern);

        let mut strftime = String::with_capacity(pattern.len() * 2);
        let mut has_time = false;
        let mut fields = PatternFields::default();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '\'' {
                // '' is a literal quote, otherwise copy up to the closing quote.
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    strftime.push('\'');
                    continue;
                }
                loop {
                    match chars.next() {
                        Some('\'') if chars.peek() == Some(&'\'') => {
                            chars.next();
                            strftime.push('\'');
                        }
                        Some('\'') => break,
                        Some('%') => strftime.push_str("%%"),
                        Some(other) => strftime.push(other),
                        None => return Err(invalid()),
                    }
                }
                continue;
            }

            if !c.is_ascii_alphabetic() {
                if c == '%' {
                    strftime.push_str("%%");
                } else {
                    strftime.push(c);
                }
                continue;
            }

            let mut run = 1;
            while chars.peek() == Some(&c) {
                chars.next();
                run += 1;
            }

            let spec = match (c, run) {
                ('y', 2) => "%y",
                ('y', _) => "%Y",
                ('M', 1) => "%-m",
                ('M', 2) => "%m",
                ('M', 3) => "%b",
                ('M', _) => "%B",
                ('d', 1) => "%-d",
                ('d', _) => "%d",
                ('D', _) => "%j",
                ('E', 1..=3) => "%a",
                ('E', _) => "%A",
                ('H', 1) => "%-H",
                ('H', _) => "%H",
                ('h', 1) => "%-I",
                ('h', _) => "%I",
                ('m', 1) => "%-M",
                ('m', _) => "%M",
                ('s', 1) => "%-S",
                ('s', _) => "%S",
                ('S', 3) => "%3f",
                ('S', 6) => "%6f",
                ('S', 9) => "%9f",
                ('a', _) => "%p",
                _ => return Err(invalid()),
            };
            has_time |= matches!(c, 'H' | 'h' | 'm' | 's' | 'S' | 'a');
            match c {
                'y' => fields.year = true,
                'M' => fields.month = true,
                'd' => fields.day = true,
                'D' => fields.day_of_year = true,
                'H' => fields.hour = true,
                'h' => {
                    fields.hour = true;
                    fields.twelve_hour = true;
                }
                'm' => fields.minute = true,
                'a' => fields.am_pm = true,
                _ => {}
            }
            strftime.push_str(spec);
        }

        Ok(Self {
            strftime,
            has_time,
            fields,
        })
    }

    /// Parse `text`, taking the parts the pattern does not name from
    /// 1970-01-01 00:00.
    pub fn decode(&self, text: &str) -> ParseResult<Value> {
        let mut parsed = Parsed::new();
        format::parse(&mut parsed, text, StrftimeItems::new(&self.strftime))?;

        let fields = self.fields;
        if !fields.year {
            parsed.set_year(1970)?;
        }
        if !fields.day_of_year {
            if !fields.month {
                parsed.set_month(1)?;
            }
            if !fields.day {
                parsed.set_day(1)?;
            }
        }

        if !self.has_time {
            return parsed.to_naive_date().map(Value::Date);
        }
        if !fields.hour {
            parsed.set_hour(0)?;
        } else if fields.twelve_hour && !fields.am_pm {
            parsed.set_ampm(false)?;
        }
        if !fields.minute {
            parsed.set_minute(0)?;
        }
        parsed.to_naive_datetime_with_offset(0).map(Value::DateTime)
    }
}
