//! Constants used throughout the importer.
//!
//! Root names, the external command contract and the default transform live
//! here so the CLI, hierarchy resolution and the store adapter agree on them.

/// Environment every unparented environment hangs off; never created
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Project used when neither the CLI nor the transform names one
pub const DEFAULT_PROJECT: &str = "default";

/// Root of the project hierarchy; projects without a parent sit here
pub const PROJECT_ROOT: &str = "";

/// Executable invoked for every store operation unless overridden
pub const DEFAULT_CLI_PROGRAM: &str = "cloudtruth";

/// Environment variable that overrides [`DEFAULT_CLI_PROGRAM`]
pub const CLI_PROGRAM_ENV: &str = "CLOUDTRUTH_IMPORTER_CLI";

/// Marker printed by `param ls` when a project has no parameters
pub const NO_PARAMETERS_MARKER: &str = "No parameters found";

/// File name used in messages and template context for standard input
pub const STDIN_FILENAME: &str = "stdin";

/// Transform applied when neither `--transform` nor `--transform-file` is set.
///
/// Emits one parameter per top-level key of the scanned document.
pub const DEFAULT_TRANSFORM: &str = r#"{% for key, value in data %}
- environment: {{ environment | stringify }}
  project: {{ project | stringify }}
  key: {{ key | stringify }}
  value: {{ value | stringify }}
{% endfor %}
"#;
