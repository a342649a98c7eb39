use serde::{Deserialize, Serialize};

use crate::classfile::{ClassFile, FormatError};

/// Name fragments that the common class-synthesizing facilities put into the
/// names of the classes they generate at runtime.
pub const DEFAULT_GENERATED_PATTERNS: &[&str] = &[
    "$Proxy",
    "GeneratedMethodAccessor",
    "GeneratedConstructorAccessor",
    "GeneratedSerializationConstructorAccessor",
    "$$Lambda$",
    "$$EnhancerByCGLIB$$",
    "$$FastClassByCGLIB$$",
    "$$KeyFactoryByCGLIB$$",
    "_$$_javassist_",
    "$$_javassist",
    "$ByteBuddy$",
];

/// Pure predicate deciding whether a class name belongs to a runtime-generated
/// class whose name is not stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedNamePatterns {
    patterns: Vec<String>,
}

impl Default for GeneratedNamePatterns {
    fn default() -> Self {
        Self::new(DEFAULT_GENERATED_PATTERNS.iter().copied())
    }
}

impl GeneratedNamePatterns {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self { patterns: Vec::new() };
        out.extend(patterns);
        out
    }

    /// Add more fragments, skipping empty strings and duplicates.
    pub fn extend<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for pattern in patterns {
            let pattern = pattern.into();
            if !pattern.is_empty() && !self.patterns.contains(&pattern) {
                self.patterns.push(pattern);
            }
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_generated(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| name.contains(p.as_str()))
    }

    /// The run-independent prefix of a generated name: everything up to and
    /// including the earliest matching fragment. `None` for ordinary names.
    pub fn stem<'a>(&self, name: &'a str) -> Option<&'a str> {
        self.patterns
            .iter()
            .filter_map(|p| name.find(p.as_str()).map(|pos| pos + p.len()))
            .min()
            .map(|end| &name[..end])
    }

    /// Generated classes referenced by `class`, other than itself, in pool order.
    pub fn generated_references(&self, class: &ClassFile) -> Result<Vec<String>, FormatError> {
        let declared = class.declared_name()?;
        Ok(class
            .referenced_class_names()
            .into_iter()
            .filter(|name| *name != declared && self.is_generated(name))
            .collect())
    }
}
