//! Container parameters.
//!
//! Parameter names are case-insensitive: they are stored lowercased and
//! looked up lowercased.

use indexmap::IndexMap;

use crate::argument::{ArgumentValue, Arguments};

/// Case-insensitive, insertion-ordered parameter bag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBag {
    parameters: IndexMap<String, ArgumentValue>,
}

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single parameter, replacing any previous value.
    pub fn set(&mut self, name: &str, value: ArgumentValue) {
        self.parameters.insert(name.to_lowercase(), value);
    }

    /// Merge a resolved `<parameters>` mapping into the bag.
    pub fn add(&mut self, arguments: Arguments) {
        for (key, value) in arguments {
            self.set(&key.to_key_string(), value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&ArgumentValue> {
        self.parameters.get(&name.to_lowercase())
    }

    pub fn has(&self, name: &str) -> bool {
        self.parameters.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgumentValue)> {
        self.parameters.iter().map(|(name, value)| (name.as_str(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{argument::ArgumentKey, scalar::Scalar};

    #[test]
    fn test_names_are_case_insensitive() {
        let mut bag = ParameterBag::new();
        bag.set("Mailer.Transport", ArgumentValue::Scalar(Scalar::from("smtp")));

        assert!(bag.has("mailer.transport"));
        assert_eq!(
            bag.get("MAILER.TRANSPORT"),
            Some(&ArgumentValue::Scalar(Scalar::from("smtp")))
        );
    }

    #[test]
    fn test_add_merges_and_overwrites() {
        let mut bag = ParameterBag::new();
        bag.set("debug", ArgumentValue::Scalar(Scalar::Bool(false)));

        let mut arguments = Arguments::new();
        arguments.insert(ArgumentKey::from_key("DEBUG"), ArgumentValue::Scalar(Scalar::Bool(true)));
        arguments.push(ArgumentValue::Scalar(Scalar::Int(7)));
        bag.add(arguments);

        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("debug"), Some(&ArgumentValue::Scalar(Scalar::Bool(true))));
        assert_eq!(bag.get("0"), Some(&ArgumentValue::Scalar(Scalar::Int(7))));
    }
}
