//! Dynamic input fields returned by the configuration queries.
//!
//! A `Field` describes one input control: type, bounds, options, the
//! validation regex and an optional display `Mask`. The UI that renders
//! fields is the host's business; this module only answers "which pattern
//! applies to this value", "what does the value look like formatted" and
//! "is this value acceptable".

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Text,
    Selection,
    Boolean,
    Number,
    Range,
    Date,
    Datetime,
    Phone,
    Email,
    ExpiryDate,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupName {
    AccountHolder,
    AccountInformation,
    Address,
    ContactInformation,
    Identification,
    IntermediaryAccount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    #[serde(default)]
    pub length: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub empty: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSize {
    #[serde(default)]
    pub min: Option<u64>,
    #[serde(default)]
    pub max: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalPattern {
    pub pattern: String,
    pub regex: String,
}

/// Lazily built value that never takes part in equality or serialization.
#[derive(Clone)]
struct Cache<T>(OnceLock<T>);

impl<T> Default for Cache<T> {
    fn default() -> Self {
        Self(OnceLock::new())
    }
}

impl<T> PartialEq for Cache<T> {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl<T> fmt::Debug for Cache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cache")
    }
}

/// Compile `source`; an invalid regex is logged and treated as absent.
fn compile(source: &str, anchored: bool) -> Option<Regex> {
    let text = if anchored {
        format!("^(?:{source})$")
    } else {
        source.to_string()
    };
    match Regex::new(&text) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(regex = source, error = %e, "ignoring invalid regex");
            None
        }
    }
}

/// Display formatting for a field value.
///
/// Pattern sources are fixed once built; the compiled regexes are cached
/// against them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mask {
    #[serde(default)]
    default_pattern: String,
    #[serde(default)]
    scrub_regex: String,
    #[serde(default)]
    conditional_patterns: Option<Vec<ConditionalPattern>>,
    #[serde(skip)]
    compiled_conditions: Cache<Vec<Option<Regex>>>,
    #[serde(skip)]
    compiled_scrub: Cache<Option<Regex>>,
}

impl Mask {
    pub fn new(default_pattern: impl Into<String>, scrub_regex: impl Into<String>) -> Self {
        Self {
            default_pattern: default_pattern.into(),
            scrub_regex: scrub_regex.into(),
            conditional_patterns: None,
            compiled_conditions: Cache::default(),
            compiled_scrub: Cache::default(),
        }
    }

    pub fn with_conditional_patterns(mut self, patterns: Vec<ConditionalPattern>) -> Self {
        self.conditional_patterns = Some(patterns);
        self.compiled_conditions = Cache::default();
        self
    }

    pub fn default_pattern(&self) -> &str {
        &self.default_pattern
    }

    pub fn scrub_regex(&self) -> &str {
        &self.scrub_regex
    }

    pub fn conditional_patterns(&self) -> &[ConditionalPattern] {
        self.conditional_patterns.as_deref().unwrap_or(&[])
    }

    /// Pattern of the first conditional whose regex matches anywhere in
    /// `value`, in declaration order; `default_pattern` otherwise.
    pub fn select_pattern(&self, value: &str) -> &str {
        let Some(conditions) = self.conditional_patterns.as_deref() else {
            return &self.default_pattern;
        };
        let compiled = self
            .compiled_conditions
            .0
            .get_or_init(|| conditions.iter().map(|c| compile(&c.regex, false)).collect());

        conditions
            .iter()
            .zip(compiled)
            .find(|(_, re)| re.as_ref().is_some_and(|re| re.is_match(value)))
            .map(|(condition, _)| condition.pattern.as_str())
            .unwrap_or(&self.default_pattern)
    }

    /// `value` with every match of `scrub_regex` removed.
    pub fn scrub(&self, value: &str) -> String {
        if self.scrub_regex.is_empty() {
            return value.to_string();
        }
        match self
            .compiled_scrub
            .0
            .get_or_init(|| compile(&self.scrub_regex, false))
        {
            Some(re) => re.replace_all(value, "").into_owned(),
            None => value.to_string(),
        }
    }

    /// Scrub `value`, pick its pattern and lay the value out on it.
    ///
    /// `#` takes a digit, `@` a letter, `*` anything; `\x` is a literal `x`.
    /// Other pattern characters are literals, emitted only once a later
    /// placeholder takes a character.
    pub fn format(&self, value: &str) -> String {
        let scrubbed = self.scrub(value);
        let pattern = self.select_pattern(&scrubbed);
        apply_pattern(pattern, &scrubbed)
    }
}

fn apply_pattern(pattern: &str, value: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut pending = String::new();
    let mut input = value.chars().peekable();
    let mut tokens = pattern.chars();

    while let Some(token) = tokens.next() {
        if input.peek().is_none() {
            break;
        }
        let accepts: fn(char) -> bool = match token {
            '#' => |c| c.is_ascii_digit(),
            '@' => |c| c.is_alphabetic(),
            '*' => |_| true,
            '\\' => {
                if let Some(literal) = tokens.next() {
                    pending.push(literal);
                }
                continue;
            }
            literal => {
                pending.push(literal);
                continue;
            }
        };
        // skip input that cannot fill this slot
        match input.by_ref().find(|c| accepts(*c)) {
            Some(c) => {
                out.push_str(&pending);
                pending.clear();
                out.push(c);
            }
            None => break,
        }
    }
    out
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(0))
}

fn default_true() -> bool {
    true
}

/// Why a value was rejected, with the message to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    Empty(String),
    Length(String),
    Pattern(String),
}

impl ValidationFailure {
    pub fn message(&self) -> &str {
        match self {
            ValidationFailure::Empty(m) | ValidationFailure::Length(m) | ValidationFailure::Pattern(m) => m,
        }
    }
}

/// One dynamic input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(default)]
    pub category: Option<String>,
    pub name: String,
    #[serde(default)]
    pub label: String,
    pub data_type: DataType,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default = "default_true")]
    pub is_editable: bool,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub min_length: u32,
    /// `None` is unbounded.
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    regular_expression: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<FileSize>,
    #[serde(default, rename = "fieldSelectionOptions")]
    pub selection_options: Option<Vec<SelectionOption>>,
    #[serde(default)]
    pub validation_message: Option<ValidationMessage>,
    #[serde(default)]
    pub mask: Option<Mask>,
    #[serde(skip)]
    compiled_regex: Cache<Option<Regex>>,
}

impl Field {
    /// Validation regex as sent by the server, unanchored.
    pub fn regular_expression(&self) -> Option<&str> {
        self.regular_expression.as_deref()
    }

    /// Same field with another validation regex.
    pub fn with_regular_expression(mut self, source: impl Into<String>) -> Self {
        self.regular_expression = Some(source.into());
        self.compiled_regex = Cache::default();
        self
    }

    /// Check `value` against the field's rules. Masked fields are checked
    /// on their scrubbed form.
    pub fn validate(&self, value: &str) -> Result<(), ValidationFailure> {
        let value = match &self.mask {
            Some(mask) => mask.scrub(value),
            None => value.to_string(),
        };
        let messages = self.validation_message.clone().unwrap_or_default();

        if value.is_empty() {
            if self.is_required {
                return Err(ValidationFailure::Empty(
                    messages.empty.unwrap_or_else(|| format!("{} is required", self.display_name())),
                ));
            }
            return Ok(());
        }

        let len = value.chars().count();
        let too_short = len < self.min_length as usize;
        let too_long = self.max_length.is_some_and(|max| len > max as usize);
        if too_short || too_long {
            return Err(ValidationFailure::Length(
                messages.length.unwrap_or_else(|| self.length_message()),
            ));
        }

        if let Some(source) = self.regular_expression.as_deref().filter(|s| !s.is_empty()) {
            let matches = self
                .compiled_regex
                .0
                .get_or_init(|| compile(source, true))
                .as_ref()
                .map_or(true, |re| re.is_match(&value));
            if !matches {
                return Err(ValidationFailure::Pattern(
                    messages
                        .pattern
                        .unwrap_or_else(|| format!("{} is invalid", self.display_name())),
                ));
            }
        }
        Ok(())
    }

    /// Formatted value for display; unmasked fields are returned as is.
    pub fn format_value(&self, value: &str) -> String {
        match &self.mask {
            Some(mask) => mask.format(value),
            None => value.to_string(),
        }
    }

    pub fn selection_option(&self, value: &str) -> Option<&SelectionOption> {
        self.selection_options.as_deref()?.iter().find(|o| o.value == value)
    }

    fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }

    fn length_message(&self) -> String {
        match self.max_length {
            Some(max) => format!("Length must be between {} and {}", self.min_length, max),
            None => format!("Length must be at least {}", self.min_length),
        }
    }
}

/// Fields grouped for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldGroup {
    #[serde(rename = "group")]
    pub group_name: GroupName,
    #[serde(default)]
    pub fields: Option<Vec<Field>>,
}

impl FieldGroup {
    pub fn fields(&self) -> &[Field] {
        self.fields.as_deref().unwrap_or(&[])
    }
}
