//! Dashboard state as a URL query string.
//!
//! ```text
//! m=cn|ct                 active modules, in order
//! ct.sort=posts:desc      per-module state
//! scope.code=code_1|code_2
//! ```
//!
//! Decoding never fails: unknown modules, unknown scope types, pairs without
//! `=` and bad percent-escapes are skipped.

use std::collections::BTreeMap;

use crate::dashboard::DashboardModule;
use crate::id::NodeKey;
use crate::scope::{Scope, ScopeDimension};

const MODULES_KEY: &str = "m";
const SCOPE_PREFIX: &str = "scope";
const SEPARATOR: char = '|';

/// Free-form key/value state of one module.
pub type ModuleState = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pub modules: Vec<DashboardModule>,
    pub module_states: BTreeMap<DashboardModule, ModuleState>,
    pub scope: Scope,
}

impl QueryState {
    /// Parses a query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> QueryState {
        let mut state = QueryState::default();
        let query = query.strip_prefix('?').unwrap_or(query);

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let Some((raw_key, raw_value)) = pair.split_once('=') else {
                continue;
            };
            let (Some(key), Some(value)) = (decode(raw_key), decode(raw_value)) else {
                tracing::debug!(pair = %pair, "skipping undecodable query pair");
                continue;
            };

            if key == MODULES_KEY {
                state.modules = value
                    .split(SEPARATOR)
                    .filter_map(DashboardModule::from_id)
                    .collect();
                continue;
            }
            let Some((prefix, field)) = key.split_once('.') else {
                continue;
            };
            if field.is_empty() {
                continue;
            }
            if prefix == SCOPE_PREFIX {
                if let Some(dim) = ScopeDimension::parse(field) {
                    state.scope.set(
                        dim,
                        value.split(SEPARATOR).filter(|id| !id.is_empty()).map(NodeKey::from),
                    );
                }
            } else if let Some(module) = DashboardModule::from_id(prefix) {
                state
                    .module_states
                    .entry(module)
                    .or_default()
                    .insert(field.to_string(), value);
            }
        }
        state
    }

    /// Encodes the state. Keys and values are percent-escaped; the output
    /// always starts with the module list. Scope ids containing `|` cannot
    /// be told apart from two ids and are left out.
    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let modules: Vec<&str> = self.modules.iter().map(|m| m.id()).collect();
        pairs.push((MODULES_KEY.to_string(), modules.join("|")));

        for (module, module_state) in &self.module_states {
            for (key, value) in module_state {
                pairs.push((format!("{}.{}", module.id(), key), value.clone()));
            }
        }
        for (dim, keys) in self.scope.iter() {
            let ids: Vec<&str> = keys
                .iter()
                .map(NodeKey::as_str)
                .filter(|id| {
                    let representable = !id.contains(SEPARATOR);
                    if !representable {
                        tracing::debug!(scope = %dim, id = %id, "scope id contains the separator, not encoded");
                    }
                    representable
                })
                .collect();
            if !ids.is_empty() {
                pairs.push((format!("{}.{}", SCOPE_PREFIX, dim), ids.join("|")));
            }
        }

        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn module_state(&self, module: DashboardModule) -> Option<&ModuleState> {
        self.module_states.get(&module)
    }
}

/// Form-style decoding: `+` is a space.
fn decode(s: &str) -> Option<String> {
    let s = s.replace('+', " ");
    urlencoding::decode(&s).ok().map(|c| c.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modules_states_and_scope() {
        let state = QueryState::from_query(
            "?m=cn%7Cct%7Cxx&ct.sort=posts%3Adesc&zz.k=v&scope.code=code_1|code_2&scope.topic=t",
        );
        assert_eq!(
            state.modules,
            vec![DashboardModule::CodesNetwork, DashboardModule::CodesTable]
        );
        assert_eq!(
            state.module_state(DashboardModule::CodesTable).and_then(|s| s.get("sort")),
            Some(&"posts:desc".to_string())
        );
        assert_eq!(state.module_states.len(), 1);
        assert!(state.scope.contains(ScopeDimension::Code, "code_2"));
        assert_eq!(state.scope.iter().count(), 1);
    }

    #[test]
    fn tolerates_garbage() {
        let state = QueryState::from_query("&&novalue&m=&.x=1&ct.=2&scope.user=");
        assert_eq!(state, QueryState::default());
    }

    #[test]
    fn encodes_in_a_stable_order() {
        let mut state = QueryState {
            modules: vec![DashboardModule::PostsTable, DashboardModule::CodesNetwork],
            ..QueryState::default()
        };
        state
            .module_states
            .entry(DashboardModule::PostsTable)
            .or_default()
            .insert("sort".into(), "like_count:desc".into());
        state.scope.insert(ScopeDimension::User, "user 1");

        let query = state.to_query_string();
        assert_eq!(
            query,
            "m=pt%7Ccn&pt.sort=like_count%3Adesc&scope.user=user%201"
        );
        assert_eq!(QueryState::from_query(&query), state);
    }

    #[test]
    fn scope_ids_with_the_separator_are_not_encoded() {
        let mut state = QueryState::default();
        state.scope.insert(ScopeDimension::Code, "code_1");
        state.scope.insert(ScopeDimension::Code, "a|b");
        state.scope.insert(ScopeDimension::User, "x|y");

        let query = state.to_query_string();
        assert_eq!(query, "m=&scope.code=code_1");
        let decoded = QueryState::from_query(&query);
        assert!(decoded.scope.contains(ScopeDimension::Code, "code_1"));
        assert!(!decoded.scope.contains(ScopeDimension::Code, "a"));
        assert!(decoded.scope.get(ScopeDimension::User).is_none());
    }
}
