use std::{borrow::Cow, fmt::Display};

/// Represent the path to an attribute, eg: `backends[0].targets`
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct AttributePath {
    pub steps: Vec<AttributePathStep>,
}

impl AttributePath {
    /// Create a new attribute path with the `root` attribute
    pub fn new<T: Into<Cow<'static, str>>>(root: T) -> Self {
        Self {
            steps: vec![AttributePathStep::Attribute(root.into())],
        }
    }
    /// Create a new attribute path where the attribute `.name` has been appended
    pub fn attribute<T: Into<Cow<'static, str>>>(mut self, name: T) -> Self {
        self.steps.push(AttributePathStep::Attribute(name.into()));
        self
    }
    /// Create a new attribute path where the access `["key"]` has been appended
    pub fn key<T: Into<Cow<'static, str>>>(mut self, key: T) -> Self {
        self.steps.push(AttributePathStep::Key(key.into()));
        self
    }
    /// Create a new attribute path where the access `[idx]` has been appended
    pub fn index<T: TryInto<i64>>(mut self, idx: T) -> Self {
        self.steps
            .push(AttributePathStep::Index(idx.try_into().unwrap_or(i64::MAX)));
        self
    }
    /// Check if the path points to the root of the object
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Display for AttributePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut sep = "";
        for step in &self.steps {
            if let AttributePathStep::Attribute(_) = step {
                f.write_str(sep)?;
            }
            step.fmt(f)?;
            sep = ".";
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum AttributePathStep {
    Attribute(Cow<'static, str>),
    Key(Cow<'static, str>),
    Index(i64),
}

impl Display for AttributePathStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributePathStep::Attribute(name) => f.write_str(name.as_ref()),
            AttributePathStep::Key(key) => write!(f, "[{:?}]", key),
            AttributePathStep::Index(idx) => write!(f, "[{}]", idx),
        }
    }
}
