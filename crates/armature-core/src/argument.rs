//! Argument values for constructor arguments, properties and method calls.
//!
//! An [`Arguments`] mapping is keyed either by position or by name, and keeps
//! the document order of its entries. Positional keys follow array semantics:
//! appending a value uses the slot after the highest position seen so far.

use std::fmt;

use indexmap::IndexMap;

use crate::scalar::Scalar;

/// What the runtime should do when a referenced service does not exist.
///
/// The loader only records the choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InvalidBehavior {
    /// Raise an error when the service is missing.
    #[default]
    FailHard,
    /// Drop the argument or call that needs the missing service.
    Ignore,
    /// Substitute `null` for the missing service.
    NullSubstitute,
}

impl InvalidBehavior {
    /// Parse the `on-invalid` attribute value.
    ///
    /// `"ignore"` and `"null"` select their behaviors, anything else fails hard.
    pub fn from_attribute(value: &str) -> Self {
        match value {
            "ignore" => Self::Ignore,
            "null" => Self::NullSubstitute,
            _ => Self::FailHard,
        }
    }
}

impl fmt::Display for InvalidBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailHard => write!(f, "exception"),
            Self::Ignore => write!(f, "ignore"),
            Self::NullSubstitute => write!(f, "null"),
        }
    }
}

/// A reference to another service by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    id: String,
    invalid_behavior: InvalidBehavior,
}

impl Reference {
    /// Create a reference with the given missing-service behavior.
    pub fn new(id: impl Into<String>, invalid_behavior: InvalidBehavior) -> Self {
        Self {
            id: id.into(),
            invalid_behavior,
        }
    }

    /// Get the referenced service identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the missing-service behavior.
    pub fn invalid_behavior(&self) -> InvalidBehavior {
        self.invalid_behavior
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.id)?;
        if self.invalid_behavior != InvalidBehavior::FailHard {
            write!(f, " (on-invalid: {})", self.invalid_behavior)?;
        }
        Ok(())
    }
}

/// Key of an entry in an [`Arguments`] mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgumentKey {
    Position(usize),
    Name(String),
}

impl ArgumentKey {
    /// Build a key from an explicit key string.
    ///
    /// Canonical non-negative integers (`"0"`, `"12"`, but not `"012"`)
    /// become positions, everything else is a name.
    pub fn from_key(key: &str) -> Self {
        let canonical = !key.is_empty()
            && key.bytes().all(|b| b.is_ascii_digit())
            && (key == "0" || !key.starts_with('0'));

        match key.parse::<usize>() {
            Ok(position) if canonical => Self::Position(position),
            _ => Self::Name(key.to_string()),
        }
    }

    /// Returns the key rendered as a string.
    pub fn to_key_string(&self) -> String {
        match self {
            Self::Position(position) => position.to_string(),
            Self::Name(name) => name.clone(),
        }
    }
}

impl fmt::Display for ArgumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(position) => write!(f, "{position}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<usize> for ArgumentKey {
    fn from(position: usize) -> Self {
        Self::Position(position)
    }
}

impl From<&str> for ArgumentKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// A single resolved argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    /// Reference to another service.
    Reference(Reference),
    /// Expression source text, evaluated by the runtime.
    Expression(String),
    /// Lazily iterated collection of values.
    Iterator(Arguments),
    /// Nested keyed collection of values.
    Collection(Arguments),
    /// Host constant looked up by name, with the value it resolved to.
    Constant { name: String, value: Scalar },
    /// Verbatim string, never coerced.
    String(String),
    /// Coerced scalar value.
    Scalar(Scalar),
    /// Proxy closure calling `method` on the referenced service.
    ClosureProxy { reference: Reference, method: String },
}

impl ArgumentValue {
    /// Returns the reference if this value is a [`ArgumentValue::Reference`].
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Self::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    /// Returns the nested entries of a collection or iterator.
    pub fn as_arguments(&self) -> Option<&Arguments> {
        match self {
            Self::Collection(arguments) | Self::Iterator(arguments) => Some(arguments),
            _ => None,
        }
    }

    /// Returns the coerced scalar if this value is a [`ArgumentValue::Scalar`].
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference(reference) => write!(f, "{reference}"),
            Self::Expression(expression) => write!(f, "expr({expression})"),
            Self::Iterator(arguments) => write!(f, "iterator{arguments}"),
            Self::Collection(arguments) => write!(f, "{arguments}"),
            Self::Constant { name, value } => write!(f, "{name} ({value})"),
            Self::String(value) => write!(f, "{value:?}"),
            Self::Scalar(Scalar::String(value)) => write!(f, "{value:?}"),
            Self::Scalar(scalar) => write!(f, "{scalar}"),
            Self::ClosureProxy { reference, method } => {
                write!(f, "closure({reference}::{method})")
            }
        }
    }
}

/// Ordered mapping from [`ArgumentKey`] to [`ArgumentValue`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    entries: IndexMap<ArgumentKey, ArgumentValue>,
    next_position: usize,
}

impl Arguments {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// The position an appended value would receive.
    pub fn next_position(&self) -> usize {
        self.next_position
    }

    /// Append a value at the next free position and return that position.
    pub fn push(&mut self, value: ArgumentValue) -> usize {
        let position = self.next_position;
        self.insert(ArgumentKey::Position(position), value);
        position
    }

    /// Insert a value under a key, replacing any previous value in place.
    pub fn insert(&mut self, key: ArgumentKey, value: ArgumentValue) {
        if let ArgumentKey::Position(position) = key {
            self.next_position = self.next_position.max(position + 1);
        }
        self.entries.insert(key, value);
    }

    /// Get the value stored under a key.
    pub fn get(&self, key: &ArgumentKey) -> Option<&ArgumentValue> {
        self.entries.get(key)
    }

    /// Get the value stored at a position.
    pub fn position(&self, position: usize) -> Option<&ArgumentValue> {
        self.entries.get(&ArgumentKey::Position(position))
    }

    /// Get the value stored under a name.
    pub fn named(&self, name: &str) -> Option<&ArgumentValue> {
        self.entries.get(&ArgumentKey::Name(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ArgumentKey, &ArgumentValue)> {
        self.entries.iter()
    }

    /// Iterate over values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &ArgumentValue> {
        self.entries.values()
    }
}

impl FromIterator<(ArgumentKey, ArgumentValue)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (ArgumentKey, ArgumentValue)>>(iter: I) -> Self {
        let mut arguments = Self::new();
        for (key, value) in iter {
            arguments.insert(key, value);
        }
        arguments
    }
}

impl IntoIterator for Arguments {
    type Item = (ArgumentKey, ArgumentValue);
    type IntoIter = indexmap::map::IntoIter<ArgumentKey, ArgumentValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, (key, value)) in self.entries.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_behavior_from_attribute() {
        assert_eq!(InvalidBehavior::from_attribute("ignore"), InvalidBehavior::Ignore);
        assert_eq!(
            InvalidBehavior::from_attribute("null"),
            InvalidBehavior::NullSubstitute
        );
        assert_eq!(
            InvalidBehavior::from_attribute("exception"),
            InvalidBehavior::FailHard
        );
        assert_eq!(InvalidBehavior::from_attribute(""), InvalidBehavior::FailHard);
    }

    #[test]
    fn test_argument_key_from_key() {
        assert_eq!(ArgumentKey::from_key("0"), ArgumentKey::Position(0));
        assert_eq!(ArgumentKey::from_key("12"), ArgumentKey::Position(12));
        assert_eq!(ArgumentKey::from_key("012"), ArgumentKey::Name("012".into()));
        assert_eq!(ArgumentKey::from_key("-1"), ArgumentKey::Name("-1".into()));
        assert_eq!(ArgumentKey::from_key("foo"), ArgumentKey::Name("foo".into()));
    }

    #[test]
    fn test_push_follows_highest_position() {
        let mut arguments = Arguments::new();

        assert_eq!(arguments.push(ArgumentValue::Scalar(Scalar::Int(1))), 0);
        arguments.insert(ArgumentKey::Position(5), ArgumentValue::Scalar(Scalar::Int(2)));
        arguments.insert("name".into(), ArgumentValue::Scalar(Scalar::Int(3)));

        assert_eq!(arguments.push(ArgumentValue::Scalar(Scalar::Int(4))), 6);
        assert_eq!(arguments.len(), 4);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut arguments = Arguments::new();
        arguments.insert("a".into(), ArgumentValue::String("first".into()));
        arguments.insert("b".into(), ArgumentValue::String("second".into()));
        arguments.insert("a".into(), ArgumentValue::String("third".into()));

        let keys: Vec<_> = arguments.iter().map(|(key, _)| key.to_key_string()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(
            arguments.named("a"),
            Some(&ArgumentValue::String("third".into()))
        );
    }

    #[test]
    fn test_display() {
        let arguments: Arguments = [
            (
                ArgumentKey::Position(0),
                ArgumentValue::Reference(Reference::new("mailer", InvalidBehavior::Ignore)),
            ),
            (ArgumentKey::Name("debug".into()), ArgumentValue::Scalar(Scalar::Bool(true))),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            arguments.to_string(),
            "[0: @mailer (on-invalid: ignore), debug: true]"
        );
    }
}
