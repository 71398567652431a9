use std::collections::HashMap;

use tracing::debug;

use super::action::Action;

/// Flow 转换表
///
/// Edges keyed by `(source node, action)`. Each pair has at most one
/// destination; wiring the same pair again replaces the previous one.
#[derive(Clone, Debug, Default)]
pub struct Transitions {
    edges: HashMap<String, HashMap<Action, String>>,
}

impl Transitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `from --action--> to` and returns the destination it replaced.
    pub fn connect(
        &mut self,
        from: impl Into<String>,
        action: impl Into<Action>,
        to: impl Into<String>,
    ) -> Option<String> {
        let from = from.into();
        let action = action.into();
        let to = to.into();
        let previous = self
            .edges
            .entry(from.clone())
            .or_default()
            .insert(action.clone(), to.clone());
        if let Some(old) = &previous {
            if old != &to {
                debug!(%from, %action, %old, new = %to, "overwriting transition");
            }
        }
        previous
    }

    pub fn successor(&self, from: &str, action: &str) -> Option<&str> {
        self.edges
            .get(from)
            .and_then(|out| out.get(action))
            .map(String::as_str)
    }

    /// Outgoing edges of `from`, sorted by action label.
    pub fn outgoing(&self, from: &str) -> Vec<(&Action, &str)> {
        let mut out: Vec<_> = self
            .edges
            .get(from)
            .map(|edges| edges.iter().map(|(a, to)| (a, to.as_str())).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Action, &str)> {
        self.edges.iter().flat_map(|(from, out)| {
            out.iter()
                .map(move |(action, to)| (from.as_str(), action, to.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.edges.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
