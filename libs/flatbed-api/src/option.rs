use std::str::FromStr;

use crate::error::ConversionError;

pub const JUSTIFY: &str = "justify";
pub const PAD_CHARACTER: &str = "pad-character";
pub const DEFAULT_VALUE: &str = "default-value";
pub const FORMAT: &str = "format";
pub const DECIMAL_IMPLIED: &str = "decimal-implied";
pub const DECIMAL_PLACES: &str = "decimal-places";

/// Largest accepted `decimal-places`, the widest scale a fixed-point decimal holds.
pub const MAX_DECIMAL_PLACES: u32 = 28;

/// Named configuration value attached to a field, e.g. `justify=left`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOption {
    name: String,
    value: String,
}

impl ConversionOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Which side(s) of a fixed-width field carry padding.
///
/// - `Left`: value is left-aligned, pad characters trail it
/// - `Right`: value is right-aligned, pad characters lead it
/// - `Both`: strip both sides on decode, pad trailing on encode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    Left,
    Right,
    #[default]
    Both,
}

impl FromStr for Justify {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Justify::Left),
            "right" => Ok(Justify::Right),
            "both" => Ok(Justify::Both),
            other => Err(ConversionError::invalid_option(JUSTIFY, other)),
        }
    }
}

/// Conversion options of one field, keyed by name.
///
/// Options are looked up per call: converters read what they need through
/// the typed getters, which centralize parsing and defaulting. Names are
/// case-sensitive and unknown names are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionOptions {
    entries: Vec<ConversionOption>,
}

impl ConversionOptions {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert an option. A repeated name replaces the earlier value.
    pub fn insert(&mut self, option: ConversionOption) {
        if let Some(entry) = self.entries.iter_mut().find(|o| o.name == option.name) {
            *entry = option;
        } else {
            self.entries.push(option);
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.insert(ConversionOption::new(name, value));
    }

    /// Builder-style `set`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ConversionOption> {
        self.entries.iter().find(|o| o.name == name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).map(ConversionOption::value)
    }

    pub fn get_bool(&self, name: &str) -> Result<Option<bool>, ConversionError> {
        match self.get_str(name) {
            None => Ok(None),
            Some(v) if v.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(v) if v.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(v) => Err(ConversionError::invalid_option(name, v)),
        }
    }

    pub fn get_u32(&self, name: &str) -> Result<Option<u32>, ConversionError> {
        match self.get_str(name) {
            None => Ok(None),
            Some(v) => v
                .trim()
                .parse::<u32>()
                .map(Some)
                .map_err(|_| ConversionError::invalid_option(name, v)),
        }
    }

    pub fn justify(&self) -> Result<Justify, ConversionError> {
        self.get_str(JUSTIFY)
            .map_or(Ok(Justify::default()), Justify::from_str)
    }

    /// First character of `pad-character`, space when absent.
    pub fn pad_character(&self) -> Result<char, ConversionError> {
        match self.get_str(PAD_CHARACTER) {
            None => Ok(' '),
            Some(v) => v
                .chars()
                .next()
                .ok_or_else(|| ConversionError::invalid_option(PAD_CHARACTER, v)),
        }
    }

    pub fn default_value(&self) -> Option<&str> {
        self.get_str(DEFAULT_VALUE)
    }

    pub fn format(&self) -> Option<&str> {
        self.get_str(FORMAT)
    }

    pub fn decimal_implied(&self) -> Result<bool, ConversionError> {
        Ok(self.get_bool(DECIMAL_IMPLIED)?.unwrap_or(false))
    }

    pub fn decimal_places(&self) -> Result<u32, ConversionError> {
        Ok(self.configured_decimal_places()?.unwrap_or(0))
    }

    /// `decimal-places` when set, bounded by [`MAX_DECIMAL_PLACES`].
    pub fn configured_decimal_places(&self) -> Result<Option<u32>, ConversionError> {
        match self.get_u32(DECIMAL_PLACES)? {
            Some(places) if places > MAX_DECIMAL_PLACES => Err(ConversionError::invalid_option(
                DECIMAL_PLACES,
                places.to_string(),
            )),
            places => Ok(places),
        }
    }

    /// Parse every option the shared layer and core converters understand,
    /// surfacing the first malformed one.
    pub fn validate(&self) -> Result<(), ConversionError> {
        self.justify()?;
        self.pad_character()?;
        self.decimal_implied()?;
        self.decimal_places()?;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversionOption> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ConversionOption> for ConversionOptions {
    fn from_iter<I: IntoIterator<Item = ConversionOption>>(iter: I) -> Self {
        let mut options = Self::new();
        for option in iter {
            options.insert(option);
        }
        options
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConversionOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| ConversionOption::new(k, v))
            .collect()
    }
}
