//! Idempotent application of parameters to a store.
//!
//! [`apply`] takes the parameters produced by every scanned file and pushes
//! them into a [`ParameterStore`]:
//!
//! 1. With `create_environments`, every environment the parameters reference
//!    (and their parents) is ensured in parent-first order; likewise projects
//!    with `create_projects`. Environments go first.
//! 2. Parameters are grouped by `(environment, project)` in first-seen order.
//! 3. Unless `override_existing` is set, keys already present in the
//!    group's project are dropped; a group left empty is skipped with an info
//!    notice.
//! 4. The remaining parameters are dispatched in order, either one
//!    `set_parameter` call at a time or, with `bulk_import`, as one import per
//!    group for value-sourced parameters.
//!
//! Existing keys are looked up per project, not per environment, so a key
//! present in any environment of the project counts as existing.

use std::collections::HashMap;
use std::fmt;

use crate::core::{ImporterError, RunContext};
use crate::hierarchy::{HierarchyKind, HierarchyResolver};
use crate::models::{Parameter, ValueSource};
use crate::store::ParameterStore;

/// What [`apply`] is allowed to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Write parameters whose key already exists in the project
    pub override_existing: bool,
    pub create_environments: bool,
    pub create_projects: bool,
    /// Send value-sourced parameters through one import call per group
    pub bulk_import: bool,
    /// Passed to bulk imports so imported values do not inherit
    pub no_inherit: bool,
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub environments_ensured: usize,
    pub projects_ensured: usize,
    pub groups_applied: usize,
    pub groups_skipped: usize,
    pub parameters_dispatched: usize,
    pub parameters_existing: usize,
}

impl fmt::Display for ApplySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} parameters dispatched in {} groups ({} groups without new parameters, {} existing parameters skipped)",
            self.parameters_dispatched,
            self.groups_applied,
            self.groups_skipped,
            self.parameters_existing
        )
    }
}

/// The parameters targeting one environment of one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterGroup {
    pub environment: String,
    pub project: String,
    pub params: Vec<Parameter>,
}

impl fmt::Display for ParameterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{environment: {}, project: {}}}", self.environment, self.project)
    }
}

/// Group parameters by `(environment, project)`, keeping first-seen order
/// for groups and input order within a group
#[must_use]
pub fn group_parameters(params: &[Parameter]) -> Vec<ParameterGroup> {
    let mut groups: Vec<ParameterGroup> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for param in params {
        let key = (param.environment(), param.project());
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(ParameterGroup {
                environment: param.environment().to_string(),
                project: param.project().to_string(),
                params: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].params.push(param.clone());
    }

    groups
}

/// Ensure every entity of one hierarchy exists, parents first.
///
/// Returns the number of entities ensured.
pub async fn ensure_hierarchy<S: ParameterStore>(
    store: &S,
    kind: HierarchyKind,
    params: &[Parameter],
) -> Result<usize, ImporterError> {
    let order = HierarchyResolver::new(kind).resolve_for(params)?;
    for entry in &order {
        match kind {
            HierarchyKind::Environment => {
                store.ensure_environment(&entry.entity, Some(&entry.parent)).await?;
            }
            HierarchyKind::Project => {
                store.ensure_project(&entry.entity, Some(&entry.parent)).await?;
            }
        }
    }
    Ok(order.len())
}

/// Apply `params` to `store`.
///
/// # Errors
///
/// Stops at the first store failure or hierarchy cycle. Parameters dispatched
/// before the failure stay applied.
pub async fn apply<S: ParameterStore>(
    store: &S,
    params: &[Parameter],
    options: &ApplyOptions,
    ctx: &RunContext,
) -> Result<ApplySummary, ImporterError> {
    let mut summary = ApplySummary::default();

    if options.create_environments {
        summary.environments_ensured =
            ensure_hierarchy(store, HierarchyKind::Environment, params).await?;
    }
    if options.create_projects {
        summary.projects_ensured = ensure_hierarchy(store, HierarchyKind::Project, params).await?;
    }

    for group in group_parameters(params) {
        let pending = if options.override_existing {
            group.params.clone()
        } else {
            let existing = store.parameter_names(&group.project).await?;
            tracing::debug!("Existing parameters for {}: {:?}", group, existing);
            let (present, missing): (Vec<_>, Vec<_>) =
                group.params.iter().cloned().partition(|p| existing.contains(p.key()));
            summary.parameters_existing += present.len();
            missing
        };

        if pending.is_empty() {
            tracing::info!("No new parameters for {}", group);
            summary.groups_skipped += 1;
            continue;
        }

        let verb = if ctx.dry_run() { "Previewing" } else { "Applying" };
        tracing::debug!("{} {} parameters for {}", verb, pending.len(), group);
        if options.bulk_import {
            let (values, references): (Vec<_>, Vec<_>) = pending
                .iter()
                .cloned()
                .partition(|p| matches!(p.source(), ValueSource::Value(_)));
            if !values.is_empty() {
                store
                    .import_parameters(&group.project, &group.environment, &values, options.no_inherit)
                    .await?;
            }
            store.set_parameters(&references).await?;
        } else {
            store.set_parameters(&pending).await?;
        }

        summary.groups_applied += 1;
        summary.parameters_dispatched += pending.len();
    }

    Ok(summary)
}
