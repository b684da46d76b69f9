//! Rename engine - turns filenames into new names using queued variables.
//!
//! For every filename the engine:
//! 1. Splits off the extension ([`split_extension`]); only the base name is searched.
//! 2. Walks the search queue in order. For each variable, the first expression that
//!    matches anywhere in the current match target wins: its full match text becomes
//!    the variable's replacement and that span is cut out of the match target, so later
//!    variables only see what is left. A variable with no matching expression gets an
//!    empty replacement and leaves the target untouched.
//! 3. Substitutes `%name%` tokens in the template for every queued variable. Tokens for
//!    variables that are not queued are left verbatim.
//! 4. Appends the original extension.
//!
//! Nothing here fails. Unknown variables, empty expression lists, uncompilable
//! expressions and non-matching expressions all fall back to an empty replacement.
//!
//! # Example
//!
//! ```
//! use pattermer::engine::transform;
//! use std::collections::HashMap;
//!
//! let mut expressions = HashMap::new();
//! expressions.insert("year".to_string(), vec![r"\d{4}".to_string()]);
//! expressions.insert("author".to_string(), vec!["(.*)_".to_string()]);
//!
//! let names = transform(
//!     &["year", "author"],
//!     &expressions,
//!     "%author%-%year%",
//!     &["Smith_2020.jpg"],
//! );
//! assert_eq!(names, vec!["Smith_-2020.jpg"]);
//! ```

use crate::store::PatternStore;
use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::hash::BuildHasher;

/// Source of the ordered expressions for a variable name.
///
/// Unknown variables yield an empty slice; lookups never fail.
pub trait ExpressionLookup {
    fn expressions_for(&self, variable: &str) -> &[String];
}

impl ExpressionLookup for PatternStore {
    fn expressions_for(&self, variable: &str) -> &[String] {
        PatternStore::expressions_for(self, variable)
    }
}

impl<S: BuildHasher> ExpressionLookup for HashMap<String, Vec<String>, S> {
    fn expressions_for(&self, variable: &str) -> &[String] {
        self.get(variable).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl<S: BuildHasher> ExpressionLookup for IndexMap<String, Vec<String>, S> {
    fn expressions_for(&self, variable: &str) -> &[String] {
        self.get(variable).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Split a filename into base name and extension.
///
/// The extension starts at the last `.` of the final path segment and includes it.
/// A segment whose only dot is its first character (`.bashrc`) has no extension.
///
/// ```
/// use pattermer::engine::split_extension;
///
/// assert_eq!(split_extension("a.b.jpg"), ("a.b", ".jpg"));
/// assert_eq!(split_extension("README"), ("README", ""));
/// assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
/// ```
pub fn split_extension(filename: &str) -> (&str, &str) {
    let segment_start = filename.rfind(is_separator).map_or(0, |i| i + 1);

    match filename[segment_start..].rfind('.') {
        None | Some(0) => (filename, ""),
        Some(dot) => filename.split_at(segment_start + dot),
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || (cfg!(windows) && c == '\\')
}

/// Values extracted from one filename, keyed by variable name in queue order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementSet {
    values: IndexMap<String, String>,
}

impl ReplacementSet {
    pub fn get(&self, variable: &str) -> Option<&str> {
        self.values.get(variable).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn record(&mut self, variable: &str, value: String) {
        self.values.insert(variable.to_string(), value);
    }
}

#[derive(Debug, Clone)]
struct CompiledVariable {
    name: String,
    patterns: Vec<Regex>,
}

/// Compiled search queue, ready to rename any number of files.
///
/// Compile once per template/queue edit and reuse for every file in the listing.
#[derive(Debug, Clone)]
pub struct RenameEngine {
    variables: Vec<CompiledVariable>,

    /// Matches `%name%` for every queued name; `None` when the queue is empty or the
    /// combined pattern is too large to compile
    tokens: Option<Regex>,
}

impl RenameEngine {
    /// Compile the expressions of every queued variable.
    ///
    /// Expressions that fail to compile are logged and skipped.
    pub fn compile<Q, L>(queue: &[Q], lookup: &L) -> Self
    where
        Q: AsRef<str>,
        L: ExpressionLookup + ?Sized,
    {
        let variables: Vec<CompiledVariable> = queue
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let patterns = lookup
                    .expressions_for(name)
                    .iter()
                    .filter_map(|expression| match Regex::new(expression) {
                        Ok(regex) => Some(regex),
                        Err(e) => {
                            tracing::warn!(
                                "Ignoring invalid expression {:?} for variable {}: {}",
                                expression,
                                name,
                                e
                            );
                            None
                        }
                    })
                    .collect();

                CompiledVariable {
                    name: name.to_string(),
                    patterns,
                }
            })
            .collect();

        let tokens = token_pattern(&variables);

        Self { variables, tokens }
    }

    /// True when the queue was empty.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Run the extraction pass over a filename's base name.
    pub fn extract(&self, filename: &str) -> ReplacementSet {
        let (base_name, _) = split_extension(filename);
        let mut match_target = base_name.to_string();
        let mut replacements = ReplacementSet::default();

        for variable in &self.variables {
            let found = variable.patterns.iter().find_map(|pattern| {
                pattern
                    .find(&match_target)
                    .map(|m| (m.range(), m.as_str().to_string()))
            });

            match found {
                Some((span, text)) => {
                    match_target.replace_range(span, "");
                    replacements.record(&variable.name, text);
                }
                None => replacements.record(&variable.name, String::new()),
            }
        }

        replacements
    }

    /// New name for a single file. Does not apply the empty-queue short-circuit.
    pub fn rename(&self, template: &str, filename: &str) -> String {
        let (_, extension) = split_extension(filename);
        let replacements = self.extract(filename);

        let mut renamed = self.substitute(template, &replacements);
        renamed.push_str(extension);
        renamed
    }

    /// New names for every file, in input order. An empty queue yields no names.
    pub fn apply<F: AsRef<str>>(&self, template: &str, filenames: &[F]) -> Vec<String> {
        if self.is_empty() {
            return Vec::new();
        }

        filenames
            .iter()
            .map(|filename| self.rename(template, filename.as_ref()))
            .collect()
    }

    // Single left-to-right pass: inserted values are never rescanned for tokens.
    fn substitute(&self, template: &str, replacements: &ReplacementSet) -> String {
        match &self.tokens {
            Some(tokens) => tokens
                .replace_all(template, |caps: &Captures| {
                    replacements
                        .get(&caps[1])
                        .unwrap_or(&caps[0])
                        .to_string()
                })
                .into_owned(),
            // No combined matcher: substitute name by name
            None => replacements
                .iter()
                .fold(template.to_string(), |text, (name, value)| {
                    text.replace(&format!("%{}%", name), value)
                }),
        }
    }
}

fn token_pattern(variables: &[CompiledVariable]) -> Option<Regex> {
    if variables.is_empty() {
        return None;
    }

    let mut names: Vec<&str> = variables.iter().map(|v| v.name.as_str()).collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    names.dedup();

    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");

    match Regex::new(&format!("%({})%", alternation)) {
        Ok(regex) => Some(regex),
        Err(e) => {
            // Only reachable when the queue is large enough to exceed the regex size limit
            tracing::warn!(
                "Failed to build placeholder matcher, substituting one name at a time: {}",
                e
            );
            None
        }
    }
}

/// Compute the new name of every file.
///
/// Output is positionally aligned with `filenames`. Returns an empty list when `queue`
/// is empty, whatever the filenames or template.
pub fn transform<Q, L, F>(queue: &[Q], lookup: &L, template: &str, filenames: &[F]) -> Vec<String>
where
    Q: AsRef<str>,
    L: ExpressionLookup + ?Sized,
    F: AsRef<str>,
{
    RenameEngine::compile(queue, lookup).apply(template, filenames)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(entries: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(name, exprs)| {
                (
                    name.to_string(),
                    exprs.iter().map(|e| e.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_split_extension_rules() {
        assert_eq!(split_extension("Smith_2020.jpg"), ("Smith_2020", ".jpg"));
        assert_eq!(split_extension("a.b.jpg"), ("a.b", ".jpg"));
        assert_eq!(split_extension("noext"), ("noext", ""));
        assert_eq!(split_extension("name."), ("name", "."));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
        assert_eq!(split_extension(".config.yaml"), (".config", ".yaml"));
        assert_eq!(split_extension("dir.v2/file"), ("dir.v2/file", ""));
        assert_eq!(split_extension(""), ("", ""));
    }

    #[test]
    fn test_substitution_without_combined_matcher() {
        let exprs = lookup(&[("year", &[r"\d{4}"]), ("tag", &[r"\[\w+\]"])]);
        let mut engine = RenameEngine::compile(&["year", "tag"], &exprs);
        engine.tokens = None;

        assert_eq!(
            engine.rename("%year%%tag%-%ghost%", "trip 2019 [beach].jpg"),
            "2019[beach]-%ghost%.jpg"
        );
    }

    #[test]
    fn test_consumption_order() {
        let exprs = lookup(&[("year", &[r"\d{4}"]), ("author", &["(.*)_"])]);
        let engine = RenameEngine::compile(&["year", "author"], &exprs);

        let captures = engine.extract("Smith_2020.jpg");
        assert_eq!(captures.get("year"), Some("2020"));
        assert_eq!(captures.get("author"), Some("Smith_"));
        assert_eq!(engine.rename("%author%-%year%", "Smith_2020.jpg"), "Smith_-2020.jpg");
    }

    #[test]
    fn test_first_expression_wins() {
        let exprs = lookup(&[("id", &[r"\d+", r"[a-z]+"])]);
        let engine = RenameEngine::compile(&["id"], &exprs);

        assert_eq!(engine.rename("%id%", "abc123.txt"), "123.txt");
        assert_eq!(engine.rename("%id%", "abc.txt"), "abc.txt");
    }

    #[test]
    fn test_full_match_not_capture_group() {
        let exprs = lookup(&[("author", &["(.*)_"])]);
        let engine = RenameEngine::compile(&["author"], &exprs);

        assert_eq!(engine.rename("[%author%]", "Smith_2020.jpg"), "[Smith_].jpg");
    }

    #[test]
    fn test_only_first_occurrence_consumed() {
        let exprs = lookup(&[("a", &["x"]), ("b", &["x"]), ("c", &["x"])]);
        let engine = RenameEngine::compile(&["a", "b", "c"], &exprs);

        let captures = engine.extract("xx");
        assert_eq!(captures.get("a"), Some("x"));
        assert_eq!(captures.get("b"), Some("x"));
        assert_eq!(captures.get("c"), Some(""));
    }

    #[test]
    fn test_unmatched_variable_is_empty() {
        let exprs = lookup(&[("location", &[r"\[\w+\]"])]);
        let engine = RenameEngine::compile(&["location"], &exprs);

        assert_eq!(engine.rename("photo%location%", "beach.jpg"), "photo.jpg");
    }

    #[test]
    fn test_unknown_and_empty_variables() {
        let exprs = lookup(&[("empty", &[])]);
        let engine = RenameEngine::compile(&["empty", "missing"], &exprs);

        assert_eq!(engine.rename("<%empty%|%missing%>", "file.txt"), "<|>.txt");
    }

    #[test]
    fn test_invalid_expression_is_skipped() {
        let exprs = lookup(&[("v", &["(unclosed", r"\d+"])]);
        let engine = RenameEngine::compile(&["v"], &exprs);

        assert_eq!(engine.rename("%v%", "a42"), "42");
    }

    #[test]
    fn test_unqueued_placeholder_passthrough() {
        let exprs = lookup(&[("author", &["(.*)_"])]);
        let engine = RenameEngine::compile(&["author"], &exprs);

        assert_eq!(
            engine.rename("%ghost%-%author%", "Smith_2020.jpg"),
            "%ghost%-Smith_.jpg"
        );
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let exprs = lookup(&[("n", &[r"\d+"])]);
        let engine = RenameEngine::compile(&["n"], &exprs);

        assert_eq!(engine.rename("%n%-%n%", "7.png"), "7-7.png");
    }

    #[test]
    fn test_inserted_text_not_rescanned() {
        let exprs = lookup(&[("a", &["%b%"]), ("b", &["z"])]);
        let engine = RenameEngine::compile(&["a", "b"], &exprs);

        assert_eq!(engine.rename("%a%/%b%", "x%b%z"), "%b%/z");
    }

    #[test]
    fn test_empty_match_stops_search() {
        let exprs = lookup(&[("v", &["q*", "abc"])]);
        let engine = RenameEngine::compile(&["v"], &exprs);

        let captures = engine.extract("abc");
        assert_eq!(captures.get("v"), Some(""));
    }

    #[test]
    fn test_duplicate_queue_entry_overwrites() {
        let exprs = lookup(&[("n", &[r"\d"])]);
        let engine = RenameEngine::compile(&["n", "n"], &exprs);

        let captures = engine.extract("12");
        assert_eq!(captures.len(), 1);
        assert_eq!(captures.get("n"), Some("2"));
    }

    #[test]
    fn test_empty_queue_short_circuits() {
        let exprs = lookup(&[("year", &[r"\d{4}"])]);
        let queue: [&str; 0] = [];

        assert!(transform(&queue, &exprs, "%year%", &["a.jpg", "b.jpg"]).is_empty());
    }

    #[test]
    fn test_pattern_store_lookup() {
        let mut store = PatternStore::new();
        store.add_variable("year", r"\d{4}").unwrap();
        store.reorder_queue(["year"]);

        let names = transform(store.queue(), &store, "%year%", &["x1999y.txt"]);
        assert_eq!(names, vec!["1999.txt"]);
    }
}
