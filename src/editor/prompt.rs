// Field prompts: what the user may enter for a field and how it is applied

use crate::record::layout::{self, describe};
use crate::record::{CodecError, ConfigModel, FieldId, FieldValue};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: expected a number, got {input:?}")]
    NotANumber { field: &'static str, input: String },

    #[error("{field}: {value} exceeds maximum {max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        max: u16,
    },

    #[error("{field}: at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field}: only printable ASCII is allowed")]
    Charset { field: &'static str },

    #[error("{field}: {input:?} is not a valid {hint}")]
    Pattern {
        field: &'static str,
        input: String,
        hint: &'static str,
    },

    #[error("{field}: no option {input:?}")]
    NoSuchOption { field: &'static str, input: String },

    #[error(transparent)]
    Field(#[from] CodecError),
}

/// Fixed-format text inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// `DDMM.mmN`
    Latitude,
    /// `DDDMM.mmE`
    Longitude,
    /// `NNN.NNNN` MHz
    Frequency,
}

lazy_static! {
    static ref LATITUDE_RE: Regex = Regex::new(r"^[0-9]{4}\.[0-9]{2}[NS]$").unwrap();
    static ref LONGITUDE_RE: Regex = Regex::new(r"^[0-9]{5}\.[0-9]{2}[EW]$").unwrap();
    static ref FREQUENCY_RE: Regex = Regex::new(r"^[0-9]{3}\.[0-9]{4}$").unwrap();
}

impl Pattern {
    fn regex(self) -> &'static Regex {
        match self {
            Pattern::Latitude => &LATITUDE_RE,
            Pattern::Longitude => &LONGITUDE_RE,
            Pattern::Frequency => &FREQUENCY_RE,
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            Pattern::Latitude => "latitude (DDMM.mmN)",
            Pattern::Longitude => "longitude (DDDMM.mmE)",
            Pattern::Frequency => "frequency (NNN.NNNN)",
        }
    }

    /// Length of every matching input
    pub fn width(self) -> usize {
        match self {
            Pattern::Latitude => 8,
            Pattern::Longitude => 9,
            Pattern::Frequency => 8,
        }
    }
}

/// Acceptable input for a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Enable/disable. Empty input flips the current value.
    Toggle,
    /// One of the field's option labels, by index or label
    Options,
    Number { max: u16 },
    Text { max: usize, upper: bool },
    Pattern(Pattern),
}

/// One editable line of a menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt {
    pub field: FieldId,
    pub label: &'static str,
    pub constraint: Constraint,
}

impl Prompt {
    pub const fn new(field: FieldId, label: &'static str, constraint: Constraint) -> Self {
        Self {
            field,
            label,
            constraint,
        }
    }

    /// Short description of what may be entered
    pub fn hint(&self) -> String {
        match self.constraint {
            Constraint::Toggle => "0/1, empty to toggle".to_string(),
            Constraint::Options => options_of(self.field)
                .iter()
                .enumerate()
                .map(|(i, label)| format!("{}={}", i, label))
                .collect::<Vec<_>>()
                .join(", "),
            Constraint::Number { max } => format!("0-{}", max),
            Constraint::Text { max, .. } => format!("<= {} characters", max),
            Constraint::Pattern(pattern) => pattern.hint().to_string(),
        }
    }

    /// Current value for display
    pub fn display(&self, model: &ConfigModel) -> String {
        match model.get(self.field) {
            Some(value) => describe(self.field, &value),
            None => "<unreadable>".to_string(),
        }
    }

    /// Validate `input` and store it in `model`
    pub fn apply(&self, model: &mut ConfigModel, input: &str) -> Result<FieldValue, ValidationError> {
        let value = self.parse(model, input.trim())?;
        model.set(self.field, value.clone())?;
        Ok(value)
    }

    fn parse(&self, model: &ConfigModel, input: &str) -> Result<FieldValue, ValidationError> {
        let field = self.field.name();

        match self.constraint {
            Constraint::Toggle => {
                if input.is_empty() {
                    let current = matches!(model.get(self.field), Some(FieldValue::Choice(v)) if v != 0);
                    return Ok(FieldValue::Choice(if current { 0 } else { 1 }));
                }
                parse_option(self.field, layout::TOGGLE, input)
            }
            Constraint::Options => parse_option(self.field, options_of(self.field), input),
            Constraint::Number { max } => {
                let value: u32 = input.parse().map_err(|_| ValidationError::NotANumber {
                    field,
                    input: input.to_string(),
                })?;
                if value > u32::from(max) {
                    return Err(ValidationError::OutOfRange { field, value, max });
                }
                Ok(FieldValue::Number(value as u16))
            }
            Constraint::Text { max, upper } => {
                check_charset(field, input)?;
                if input.len() > max {
                    return Err(ValidationError::TooLong { field, max });
                }
                let text = if upper {
                    input.to_ascii_uppercase()
                } else {
                    input.to_string()
                };
                Ok(FieldValue::Text(text))
            }
            Constraint::Pattern(pattern) => {
                let text = input.to_ascii_uppercase();
                if !pattern.regex().is_match(&text) {
                    return Err(ValidationError::Pattern {
                        field,
                        input: input.to_string(),
                        hint: pattern.hint(),
                    });
                }
                Ok(FieldValue::Text(text))
            }
        }
    }
}

fn options_of(field: FieldId) -> &'static [&'static str] {
    layout::spec(field).map_or(&[], |spec| spec.options())
}

fn parse_option(field: FieldId, options: &[&str], input: &str) -> Result<FieldValue, ValidationError> {
    let by_index = input
        .parse::<usize>()
        .ok()
        .filter(|&i| i < options.len());
    let by_label = || options.iter().position(|o| o.eq_ignore_ascii_case(input));

    by_index
        .or_else(by_label)
        .map(|i| FieldValue::Choice(i as u8))
        .ok_or_else(|| ValidationError::NoSuchOption {
            field: field.name(),
            input: input.to_string(),
        })
}

fn check_charset(field: &'static str, input: &str) -> Result<(), ValidationError> {
    if input.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
        Ok(())
    } else {
        Err(ValidationError::Charset { field })
    }
}
