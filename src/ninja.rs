//! Build graph model and Ninja serialization.
//!
//! This module holds the in-memory representation of the generated build
//! description: variable bindings, rule templates, build targets, and
//! include directives, owned by a [`NinjaFile`]. Serialization sorts every
//! category by its ordering key so repeated runs over unchanged inputs
//! produce byte-identical text, which the stable file writer relies on to
//! skip rewrites.

use crate::wrap::wrap;
use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// Errors raised while constructing or querying the graph.
///
/// Both variants are fatal configuration errors: later translation phases
/// assume earlier phases registered their targets, so a miss or a collision
/// means the input is wrong, not that a fallback should run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// A second target claimed an output path already in the graph.
    #[error("duplicate target output: {output}")]
    DuplicateOutput {
        /// The contested output path.
        output: String,
    },
    /// A lookup by output path found nothing.
    #[error("target \"{name}\" not found")]
    TargetNotFound {
        /// The output path that was requested.
        name: String,
    },
}

/// A `name = value` binding, either global or scoped to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    value: String,
}

impl Variable {
    fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", wrap(&format!("{} = {}", self.name, self.value)))
    }
}

/// A reusable command template.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    command: String,
    depfile: Option<String>,
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", wrap(&format!("rule {}", self.name)))?;
        write!(f, "\n{}", wrap(&format!("    command = {}", self.command)))?;
        if let Some(depfile) = &self.depfile {
            write!(f, "\n{}", wrap("    deps = gcc"))?;
            write!(f, "\n{}", wrap(&format!("    depfile = {depfile}")))?;
        }
        Ok(())
    }
}

/// One buildable output node.
///
/// `inputs` are explicit build inputs passed to the rule; `dependencies`
/// are order-only edges that must exist before the target builds. Both
/// behave as ordered sets: adding a path twice stores one edge.
#[derive(Debug, Clone)]
pub struct Target {
    rule: String,
    output: String,
    inputs: Vec<String>,
    dependencies: Vec<String>,
    variables: Vec<Variable>,
}

impl Target {
    fn new(rule: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            output: output.into(),
            inputs: Vec::new(),
            dependencies: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// The output path this target produces.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Register an explicit build input.
    pub fn add_input(&mut self, input: impl Into<String>) {
        let input = input.into();
        if !self.inputs.contains(&input) {
            self.inputs.push(input);
        }
    }

    /// Remove an explicit build input, ignoring paths that are not present.
    pub fn remove_input(&mut self, input: &str) {
        self.inputs.retain(|existing| existing != input);
    }

    /// Register an order-only dependency edge.
    pub fn add_dependency(&mut self, dependency: impl Into<String>) {
        let dependency = dependency.into();
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency);
        }
    }

    /// Attach a target-scoped variable binding.
    pub fn add_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.push(Variable::new(name, value));
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut inputs = self.inputs.clone();
        inputs.sort();
        let mut dependencies = self.dependencies.clone();
        dependencies.sort();
        let mut variables = self.variables.clone();
        variables.sort_by(|a, b| a.name.cmp(&b.name));

        let mut line = format!("build {}: {}", self.output, self.rule);
        if !inputs.is_empty() {
            line.push_str(&format!(" {}", inputs.join(" ")));
        }
        if !dependencies.is_empty() {
            line.push_str(&format!(" | {}", dependencies.join(" ")));
        }
        write!(f, "{}", wrap(&line))?;
        for variable in &variables {
            write!(
                f,
                "\n{}",
                wrap(&format!("    {} = {}", variable.name, variable.value))
            )?;
        }
        Ok(())
    }
}

/// An `include <path>` directive.
#[derive(Debug, Clone)]
pub struct Include {
    file: String,
}

impl Display for Include {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", wrap(&format!("include {}", self.file)))
    }
}

/// The full build description for one emission unit.
#[derive(Debug, Default)]
pub struct NinjaFile {
    variables: Vec<Variable>,
    rules: Vec<Rule>,
    includes: Vec<Include>,
    targets: IndexMap<String, Target>,
}

impl NinjaFile {
    /// Create an empty build description.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a global variable.
    pub fn add_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.push(Variable::new(name, value));
    }

    /// Define a rule. `depfile` enables gcc-style header dependency scanning.
    pub fn add_rule(
        &mut self,
        name: impl Into<String>,
        command: impl Into<String>,
        depfile: Option<&str>,
    ) {
        self.rules.push(Rule {
            name: name.into(),
            command: command.into(),
            depfile: depfile.map(str::to_owned),
        });
    }

    /// Add an include directive.
    pub fn add_include(&mut self, file: impl Into<String>) {
        self.includes.push(Include { file: file.into() });
    }

    /// Create a target producing `output` with the given rule.
    ///
    /// # Errors
    ///
    /// Fails with [`GraphError::DuplicateOutput`] if a target already claims
    /// the output path.
    pub fn new_target(
        &mut self,
        rule: impl Into<String>,
        output: impl Into<String>,
    ) -> Result<&mut Target, GraphError> {
        let output = output.into();
        if self.targets.contains_key(&output) {
            return Err(GraphError::DuplicateOutput { output });
        }
        let target = Target::new(rule, output.clone());
        Ok(self.targets.entry(output).or_insert(target))
    }

    /// Look up a target by output path.
    ///
    /// # Errors
    ///
    /// Fails with [`GraphError::TargetNotFound`] if no target claims `name`.
    pub fn target(&self, name: &str) -> Result<&Target, GraphError> {
        self.targets.get(name).ok_or_else(|| GraphError::TargetNotFound {
            name: name.to_owned(),
        })
    }

    /// Look up a target for mutation.
    ///
    /// # Errors
    ///
    /// Fails with [`GraphError::TargetNotFound`] if no target claims `name`.
    pub fn target_mut(&mut self, name: &str) -> Result<&mut Target, GraphError> {
        self.targets.get_mut(name).ok_or_else(|| GraphError::TargetNotFound {
            name: name.to_owned(),
        })
    }

    /// Whether any target claims `name` as its output.
    #[must_use]
    pub fn has_target(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    /// Snapshot of every output path currently in the graph.
    #[must_use]
    pub fn output_names(&self) -> Vec<String> {
        self.targets.keys().cloned().collect()
    }

    /// Remove a target by output path.
    ///
    /// # Errors
    ///
    /// Fails with [`GraphError::TargetNotFound`] if no target claims `name`.
    pub fn delete_target(&mut self, name: &str) -> Result<Target, GraphError> {
        self.targets
            .shift_remove(name)
            .ok_or_else(|| GraphError::TargetNotFound {
                name: name.to_owned(),
            })
    }

    /// Serialize the graph: includes, variables, rules, then targets, each
    /// category sorted by its ordering key.
    #[must_use]
    pub fn render(&self) -> String {
        let mut includes: Vec<&Include> = self.includes.iter().collect();
        includes.sort_by(|a, b| a.file.cmp(&b.file));
        let mut variables: Vec<&Variable> = self.variables.iter().collect();
        variables.sort_by(|a, b| a.name.cmp(&b.name));
        let mut rules: Vec<&Rule> = self.rules.iter().collect();
        rules.sort_by(|a, b| a.name.cmp(&b.name));
        let mut targets: Vec<&Target> = self.targets.values().collect();
        targets.sort_by(|a, b| a.output.cmp(&b.output));

        format!(
            "ninja_required_version = 1.6\n\n{}\n\n{}\n\n{}\n\n{}\n\n",
            includes.iter().map(ToString::to_string).join("\n\n"),
            variables.iter().map(ToString::to_string).join("\n"),
            rules.iter().map(ToString::to_string).join("\n\n"),
            targets.iter().map(ToString::to_string).join("\n\n"),
        )
    }
}
