//! Parameter schemas, the named pattern catalog, and validated bundles.

use std::collections::BTreeMap;

use regex::Regex;

use crate::domain::errors::{ValidationError, ValidationReason};

/// Declaration of a single editor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub description: String,
    pub display_name: String,
    /// Regular expression, or `$Name` to reference an entry of the [`PatternCatalog`].
    pub pattern: String,
    pub max_length: usize,
    pub default: Option<String>,
    pub required: bool,
}

impl ParameterSpec {
    /// A required parameter accepting anything up to 100 characters.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: String::new(),
            pattern: ".*".into(),
            max_length: 100,
            default: None,
            required: true,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Mark the parameter optional, falling back to `default` when unset.
    pub fn optional(mut self, default: Option<String>) -> Self {
        self.required = false;
        self.default = default;
        self
    }
}

/// Ordered set of parameter declarations for one editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSchema {
    params: Vec<ParameterSpec>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, spec: ParameterSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.params.iter().find(|spec| spec.name == name)
    }

    /// Validate raw host input against this schema.
    ///
    /// Fields are checked in declaration order, then any key without a
    /// declaration is rejected. Binding has no side effects.
    pub fn bind(
        &self,
        raw: &BTreeMap<String, String>,
        catalog: &PatternCatalog,
    ) -> Result<ParameterBundle, ValidationError> {
        let mut values = BTreeMap::new();

        for spec in &self.params {
            let value = match raw.get(&spec.name) {
                Some(value) => value,
                None if !spec.required => match &spec.default {
                    Some(default) => default,
                    None => continue,
                },
                None => {
                    return Err(ValidationError::new(
                        &spec.name,
                        ValidationReason::MissingRequired,
                    ));
                }
            };

            check_value(spec, value, catalog)?;
            values.insert(spec.name.clone(), value.clone());
        }

        if let Some(unknown) = raw.keys().find(|key| self.get(key).is_none()) {
            return Err(ValidationError::new(
                unknown,
                ValidationReason::UnknownParameter,
            ));
        }

        Ok(ParameterBundle { values })
    }
}

// Defaults go through the same checks as supplied values.
fn check_value(
    spec: &ParameterSpec,
    value: &str,
    catalog: &PatternCatalog,
) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > spec.max_length {
        return Err(ValidationError::new(
            &spec.name,
            ValidationReason::TooLong {
                max_length: spec.max_length,
                actual,
            },
        ));
    }

    let regex = catalog.compile(&spec.name, &spec.pattern)?;
    if !regex.is_match(value) {
        return Err(ValidationError::new(
            &spec.name,
            ValidationReason::PatternMismatch {
                pattern: spec.pattern.clone(),
            },
        ));
    }
    Ok(())
}

/// Named validation patterns referenced from schemas as `$Name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternCatalog {
    patterns: BTreeMap<String, String>,
}

impl PatternCatalog {
    pub fn new(patterns: BTreeMap<String, String>) -> Self {
        Self { patterns }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.patterns.get(name).map(String::as_str)
    }

    /// Resolve `$Name` references; plain patterns pass through.
    pub fn resolve<'a>(&'a self, pattern: &'a str) -> Option<&'a str> {
        match pattern.strip_prefix('$') {
            Some(name) => self.get(name),
            None => Some(pattern),
        }
    }

    fn compile(&self, field: &str, pattern: &str) -> Result<Regex, ValidationError> {
        let invalid = |detail: String| {
            ValidationError::new(
                field,
                ValidationReason::InvalidPattern {
                    pattern: pattern.to_owned(),
                    detail,
                },
            )
        };
        let resolved = self
            .resolve(pattern)
            .ok_or_else(|| invalid("no such named pattern".into()))?;
        // The pattern must parse on its own so it cannot close the anchoring group.
        Regex::new(resolved).map_err(|err| invalid(err.to_string()))?;
        Regex::new(&format!("^(?:{resolved})$")).map_err(|err| invalid(err.to_string()))
    }
}

/// Validated parameter values, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterBundle {
    values: BTreeMap<String, String>,
}

impl ParameterBundle {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Fetch a value the schema guarantees, reporting a binding error otherwise.
    pub fn require(&self, name: &str) -> Result<&str, ValidationError> {
        self.get(name)
            .ok_or_else(|| ValidationError::new(name, ValidationReason::MissingRequired))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Typed parameter struct for an editor.
pub trait Parameters: Sized {
    fn schema() -> ParameterSchema;

    fn from_bundle(bundle: &ParameterBundle) -> Result<Self, ValidationError>;
}

/// Parameters for editors that take none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoParameters;

impl Parameters for NoParameters {
    fn schema() -> ParameterSchema {
        ParameterSchema::new()
    }

    fn from_bundle(_bundle: &ParameterBundle) -> Result<Self, ValidationError> {
        Ok(Self)
    }
}
