//! Pattern store - variables, their expressions, and the search queue.
//!
//! A [`PatternStore`] is the data that parameterizes one rename run:
//! - variables, each owning an ordered list of regex expressions (first match wins)
//! - the search queue, the order in which variables are extracted from a filename
//!
//! The store performs validation on mutation but holds no other state. Queue entries
//! are deliberately not tied to variable existence: a queued name with no variable
//! behind it is inert and contributes an empty replacement.

use crate::models::Preset;
use indexmap::IndexMap;
use regex::Regex;
use thiserror::Error;

/// Errors raised by [`PatternStore`] mutations.
///
/// All of these are recoverable. Front ends are expected to check before acting
/// (see [`PatternStore::define`]) rather than rely on handling them afterwards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Variable {0} already exists")]
    DuplicateVariable(String),

    #[error("Variable {0} does not exist")]
    UnknownVariable(String),

    #[error("Variable name must not be empty")]
    EmptyName,

    #[error("Variable name {0} must not contain '%'")]
    InvalidName(String),

    #[error("Expression must not be empty")]
    EmptyExpression,

    #[error("Invalid expression {expression}: {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("Queue position {index} is out of range (queue length {len})")]
    QueueIndexOutOfRange { index: usize, len: usize },
}

/// Variables and search queue for a rename session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternStore {
    /// Variable name -> expressions, in insertion order
    variables: IndexMap<String, Vec<String>>,

    /// Variable names in extraction order (may reference missing variables)
    queue: Vec<String>,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from persisted preset data.
    ///
    /// Preset contents are trusted as-is: empty expression lists and expressions that
    /// fail to compile are kept, and the engine treats them as never matching.
    pub fn from_preset(preset: &Preset) -> Self {
        for (name, expressions) in &preset.variables {
            if expressions.is_empty() {
                tracing::warn!("Preset variable {} has no expressions", name);
            }
        }

        Self {
            variables: preset.variables.clone(),
            queue: preset.queue.clone(),
        }
    }

    /// Convert to the persisted preset shape.
    pub fn to_preset(&self) -> Preset {
        Preset {
            variables: self.variables.clone(),
            queue: self.queue.clone(),
        }
    }

    /// Create a new variable with its first expression.
    ///
    /// # Errors
    /// - [`StoreError::DuplicateVariable`] if `name` is already defined
    /// - [`StoreError::EmptyName`] / [`StoreError::InvalidName`] for unusable names
    /// - [`StoreError::EmptyExpression`] / [`StoreError::InvalidExpression`] if the
    ///   expression is empty or does not compile
    pub fn add_variable(&mut self, name: &str, first_expression: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        if self.variables.contains_key(name) {
            return Err(StoreError::DuplicateVariable(name.to_string()));
        }
        validate_expression(first_expression)?;

        self.variables
            .insert(name.to_string(), vec![first_expression.to_string()]);
        tracing::debug!("Added variable {} with expression {:?}", name, first_expression);
        Ok(())
    }

    /// Append an expression to an existing variable.
    ///
    /// # Errors
    /// - [`StoreError::UnknownVariable`] if `variable` is not defined
    /// - [`StoreError::EmptyExpression`] / [`StoreError::InvalidExpression`]
    pub fn add_expression(&mut self, variable: &str, expression: &str) -> Result<(), StoreError> {
        validate_expression(expression)?;

        let expressions = self
            .variables
            .get_mut(variable)
            .ok_or_else(|| StoreError::UnknownVariable(variable.to_string()))?;
        expressions.push(expression.to_string());

        tracing::debug!(
            "Appended expression {:?} to {} ({} total)",
            expression,
            variable,
            expressions.len()
        );
        Ok(())
    }

    /// Add an expression, creating the variable if needed.
    ///
    /// Returns `true` when a new variable was created and `false` when the expression
    /// was appended to an existing one.
    pub fn define(&mut self, name: &str, expression: &str) -> Result<bool, StoreError> {
        if self.contains(name) {
            self.add_expression(name, expression)?;
            Ok(false)
        } else {
            self.add_variable(name, expression)?;
            Ok(true)
        }
    }

    /// Delete a variable and all of its expressions.
    ///
    /// The search queue is left alone; entries naming the removed variable become inert.
    pub fn remove_variable(&mut self, name: &str) -> Result<(), StoreError> {
        self.variables
            .shift_remove(name)
            .ok_or_else(|| StoreError::UnknownVariable(name.to_string()))?;

        tracing::debug!("Removed variable {}", name);
        Ok(())
    }

    /// Replace the search queue wholesale. Names are not checked against the variables.
    pub fn reorder_queue<I, S>(&mut self, new_order: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.queue = new_order.into_iter().map(Into::into).collect();
    }

    /// Append a variable name to the end of the queue.
    pub fn enqueue(&mut self, name: &str) {
        self.queue.push(name.to_string());
    }

    /// Remove the queue entry at `index`, returning its name.
    pub fn dequeue_at(&mut self, index: usize) -> Result<String, StoreError> {
        if index >= self.queue.len() {
            return Err(StoreError::QueueIndexOutOfRange {
                index,
                len: self.queue.len(),
            });
        }
        Ok(self.queue.remove(index))
    }

    /// Expressions for `variable` in evaluation order; empty when unknown.
    pub fn expressions_for(&self, variable: &str) -> &[String] {
        self.variables
            .get(variable)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn variables(&self) -> &IndexMap<String, Vec<String>> {
        &self.variables
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn queue(&self) -> &[String] {
        &self.queue
    }

    /// Number of defined variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::EmptyName);
    }
    if name.contains('%') {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn validate_expression(expression: &str) -> Result<(), StoreError> {
    if expression.is_empty() {
        return Err(StoreError::EmptyExpression);
    }
    Regex::new(expression).map_err(|e| StoreError::InvalidExpression {
        expression: expression.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}
