//! The [`Parameter`] value object and its strict decoding from transform output.
//!
//! A parameter is validated when it is built and never afterwards: once a
//! [`Parameter`] exists it has a non-blank environment, project and key and
//! exactly one usable value source.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::ImporterError;

/// Unvalidated parameter fields, as produced by a transform or built in code.
///
/// Turn it into a [`Parameter`] with [`Parameter::new`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterDraft {
    pub environment: Option<String>,
    pub environment_parent: Option<String>,
    pub project: Option<String>,
    pub project_parent: Option<String>,
    pub key: Option<String>,
    pub value: Option<String>,
    pub secret: bool,
    pub fqn: Option<String>,
    pub jmes: Option<String>,
}

impl ParameterDraft {
    /// Draft with the three required fields set
    pub fn new(
        environment: impl Into<String>,
        project: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            environment: Some(environment.into()),
            project: Some(project.into()),
            key: Some(key.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn fqn(mut self, fqn: impl Into<String>) -> Self {
        self.fqn = Some(fqn.into());
        self
    }

    #[must_use]
    pub fn jmes(mut self, jmes: impl Into<String>) -> Self {
        self.jmes = Some(jmes.into());
        self
    }

    #[must_use]
    pub const fn secret(mut self, secret: bool) -> Self {
        self.secret = secret;
        self
    }

    #[must_use]
    pub fn environment_parent(mut self, parent: impl Into<String>) -> Self {
        self.environment_parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn project_parent(mut self, parent: impl Into<String>) -> Self {
        self.project_parent = Some(parent.into());
        self
    }

    /// Validate into a [`Parameter`]
    pub fn build(self) -> Result<Parameter, ImporterError> {
        Parameter::new(self)
    }
}

/// One configuration entry targeted at an environment and project.
///
/// Blank optional fields (`environment_parent`, `project_parent`, `fqn`,
/// `jmes`) are normalized to `None`. `value` keeps an explicit empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Parameter {
    environment: String,
    environment_parent: Option<String>,
    project: String,
    project_parent: Option<String>,
    key: String,
    value: Option<String>,
    secret: bool,
    fqn: Option<String>,
    jmes: Option<String>,
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, field: &str) -> Result<String, ImporterError> {
    present(value).ok_or_else(|| ImporterError::validation(format!("{field} is required")))
}

impl Parameter {
    /// Validate a draft.
    ///
    /// # Errors
    ///
    /// Returns [`ImporterError::Validation`] when environment, project or key
    /// is blank, or when there is neither a value nor an fqn.
    pub fn new(draft: ParameterDraft) -> Result<Self, ImporterError> {
        let environment = required(draft.environment, "environment")?;
        let project = required(draft.project, "project")?;
        let key = required(draft.key, "key")?;

        if draft.value.is_none() && is_blank(draft.fqn.as_deref()) {
            return Err(ImporterError::validation(format!(
                "A parameter value or fqn is required for key '{key}'"
            )));
        }

        let param = Self {
            environment,
            environment_parent: present(draft.environment_parent),
            project,
            project_parent: present(draft.project_parent),
            key,
            value: draft.value,
            secret: draft.secret,
            fqn: present(draft.fqn),
            jmes: present(draft.jmes),
        };

        if param.value.is_some() && (param.fqn.is_some() || param.jmes.is_some()) {
            tracing::warn!("Value is set, will ignore fqn+jmes: {}", param);
        }

        Ok(param)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn environment_parent(&self) -> Option<&str> {
        self.environment_parent.as_deref()
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn project_parent(&self) -> Option<&str> {
        self.project_parent.as_deref()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Literal value; wins over `fqn` when both are set
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub const fn is_secret(&self) -> bool {
        self.secret
    }

    pub fn fqn(&self) -> Option<&str> {
        self.fqn.as_deref()
    }

    pub fn jmes(&self) -> Option<&str> {
        self.jmes.as_deref()
    }

    /// The source the store should use for this parameter
    pub fn source(&self) -> ValueSource<'_> {
        match (&self.value, &self.fqn) {
            (Some(value), _) => ValueSource::Value(value),
            (None, Some(fqn)) => ValueSource::Reference {
                fqn,
                jmes: self.jmes.as_deref(),
            },
            // Construction guarantees one of the two
            (None, None) => ValueSource::Value(""),
        }
    }

    /// Decode one item of transform output.
    ///
    /// The item must be a mapping whose keys are parameter fields; unknown
    /// fields and non-scalar field values are rejected.
    pub fn from_yaml(item: serde_yaml::Value) -> Result<Self, ImporterError> {
        if !item.is_mapping() {
            return Err(ImporterError::validation(format!(
                "expected a mapping of parameter fields, got: {}",
                describe_yaml(&item)
            )));
        }

        let raw: RawParameter = serde_yaml::from_value(item)
            .map_err(|e| ImporterError::validation(format!("schema mismatch: {e}")))?;

        let draft = ParameterDraft {
            environment: scalar_field("environment", raw.environment)?,
            environment_parent: scalar_field("environment_parent", raw.environment_parent)?,
            project: scalar_field("project", raw.project)?,
            project_parent: scalar_field("project_parent", raw.project_parent)?,
            key: scalar_field("key", raw.key)?,
            value: scalar_field("value", raw.value)?,
            secret: bool_field("secret", raw.secret)?,
            fqn: scalar_field("fqn", raw.fqn)?,
            jmes: scalar_field("jmes", raw.jmes)?,
        };

        Self::new(draft)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.environment, self.project, self.key)?;
        if self.secret {
            write!(f, " (secret)")?;
        }
        if let Some(fqn) = &self.fqn {
            write!(f, " fqn={fqn}")?;
        }
        if let Some(jmes) = &self.jmes {
            write!(f, " jmes={jmes}")?;
        }
        Ok(())
    }
}

/// Where a parameter's value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource<'a> {
    Value(&'a str),
    Reference {
        fqn: &'a str,
        jmes: Option<&'a str>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawParameter {
    #[serde(default)]
    environment: Option<serde_yaml::Value>,
    #[serde(default)]
    environment_parent: Option<serde_yaml::Value>,
    #[serde(default)]
    project: Option<serde_yaml::Value>,
    #[serde(default)]
    project_parent: Option<serde_yaml::Value>,
    #[serde(default)]
    key: Option<serde_yaml::Value>,
    #[serde(default)]
    value: Option<serde_yaml::Value>,
    #[serde(default)]
    secret: Option<serde_yaml::Value>,
    #[serde(default)]
    fqn: Option<serde_yaml::Value>,
    #[serde(default)]
    jmes: Option<serde_yaml::Value>,
}

fn scalar_field(
    name: &str,
    value: Option<serde_yaml::Value>,
) -> Result<Option<String>, ImporterError> {
    use serde_yaml::Value;

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(Value::Tagged(tagged)) => scalar_field(name, Some(tagged.value)),
        Some(other) => Err(ImporterError::validation(format!(
            "field '{name}' must be a scalar, got: {}",
            describe_yaml(&other)
        ))),
    }
}

fn bool_field(name: &str, value: Option<serde_yaml::Value>) -> Result<bool, ImporterError> {
    use serde_yaml::Value;

    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(true),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") || s.is_empty() => Ok(false),
        Some(other) => Err(ImporterError::validation(format!(
            "field '{name}' must be a boolean, got: {}",
            describe_yaml(&other)
        ))),
    }
}

fn describe_yaml(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| format!("{value:?}"))
}

/// Parse rendered transform output into parameters.
///
/// A YAML list yields one parameter per item. Any other document (including an
/// empty one) yields no parameters and a warning.
///
/// # Errors
///
/// Returns [`ImporterError::Validation`] if the text is not YAML or an item
/// fails to decode.
pub fn decode_parameters(rendered: &str) -> Result<Vec<Parameter>, ImporterError> {
    let document: serde_yaml::Value = serde_yaml::from_str(rendered).map_err(|e| {
        ImporterError::validation(format!("transformed data is not valid YAML: {e}"))
    })?;

    match document {
        serde_yaml::Value::Sequence(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                Parameter::from_yaml(item).map_err(|e| match e {
                    ImporterError::Validation { message } => {
                        ImporterError::validation(format!("item {index}: {message}"))
                    }
                    other => other,
                })
            })
            .collect(),
        _ => {
            tracing::warn!("No params in transformed data");
            Ok(Vec::new())
        }
    }
}
