use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use thiserror::Error;
use trellis_protocol::ModifierTag;

/// A decoded modifier element, produced by the platform factory.
pub trait ModifierValue: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug> ModifierValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Ordered list of decorators carried by one widget.
#[derive(Debug, Default)]
pub struct Modifier {
    elements: Vec<Box<dyn ModifierValue>>,
}

impl Modifier {
    pub fn new(elements: Vec<Box<dyn ModifierValue>>) -> Self {
        Self { elements }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn then(mut self, element: impl ModifierValue) -> Self {
        self.elements.push(Box::new(element));
        self
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ModifierValue> + '_ {
        self.elements.iter().map(|element| &**element)
    }

    /// First element of type `T`, if any.
    pub fn find<T: Any>(&self) -> Option<&T> {
        self.elements
            .iter()
            .find_map(|element| (**element).as_any().downcast_ref::<T>())
    }
}

#[derive(Error, Debug)]
pub enum ModifierError {
    #[error("unknown modifier tag {0}")]
    Unknown(ModifierTag),

    #[error("invalid value for modifier tag {tag}: {source}")]
    InvalidValue {
        tag: ModifierTag,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode a modifier payload. A missing value decodes from `null`.
pub fn decode_modifier<T: DeserializeOwned>(
    tag: ModifierTag,
    value: &Value,
) -> Result<T, ModifierError> {
    T::deserialize(value).map_err(|source| ModifierError::InvalidValue { tag, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Weight(f64);

    #[derive(Debug, PartialEq)]
    struct Background(&'static str);

    #[test]
    fn test_find_by_type_keeps_order() {
        let modifier = Modifier::empty()
            .then(Weight(2.0))
            .then(Background("red"))
            .then(Weight(3.0));

        assert_eq!(modifier.len(), 3);
        assert_eq!(modifier.find::<Weight>(), Some(&Weight(2.0)));
        assert_eq!(modifier.find::<Background>(), Some(&Background("red")));
        assert_eq!(modifier.find::<String>(), None);
    }

    #[test]
    fn test_decode_modifier() {
        let weight: f64 = decode_modifier(ModifierTag(1), &serde_json::json!(2.5)).unwrap();
        assert_eq!(weight, 2.5);
        let err = decode_modifier::<f64>(ModifierTag(1), &Value::Null).unwrap_err();
        assert!(matches!(err, ModifierError::InvalidValue { .. }));
    }

    #[test]
    fn test_empty_modifier() {
        let modifier = Modifier::empty();
        assert!(modifier.is_empty());
        assert_eq!(modifier.iter().count(), 0);
    }
}
