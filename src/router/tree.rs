//! Segment tree for dynamic (parametric) route matching.
//!
//! Used only when at least one registered template contains a `{name}` capture — otherwise the
//! router stays in the cheaper static hash-map mode (see [`super::Router`]).

use std::collections::HashMap;

use crate::kv::KvList;

#[derive(Default)]
pub struct Node<E> {
    literal: HashMap<String, Node<E>>,
    param: Option<(String, Box<Node<E>>)>,
    wildcard: Option<(String, Box<E>)>,
    endpoint: Option<E>,
}

impl<E> Node<E> {
    pub fn new() -> Self {
        Self { literal: HashMap::new(), param: None, wildcard: None, endpoint: None }
    }

    pub fn insert(&mut self, segments: &[&str], endpoint: E) {
        match segments.split_first() {
            None => self.endpoint = Some(endpoint),
            Some((seg, rest)) => {
                if let Some(name) = seg.strip_prefix('*') {
                    self.wildcard = Some((name.to_string(), Box::new(endpoint)));
                } else if let Some(name) = seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    let (_, child) =
                        self.param.get_or_insert_with(|| (name.to_string(), Box::new(Node::new())));
                    child.insert(rest, endpoint);
                } else {
                    self.literal.entry((*seg).to_string()).or_insert_with(Node::new).insert(rest, endpoint);
                }
            }
        }
    }

    /// Matches `segments` against this subtree, appending captured parameters to `params` as it
    /// descends. On a failed branch, captures made along that branch are left in place (the
    /// caller only cares about the `Some` result), matching a non-backtracking matcher: the
    /// first matching literal/param branch per level wins.
    pub fn lookup(&self, segments: &[&str], params: &mut KvList) -> Option<&E> {
        match segments.split_first() {
            None => self.endpoint.as_ref(),
            Some((seg, rest)) => {
                if let Some(child) = self.literal.get(*seg) {
                    if let Some(ep) = child.lookup(rest, params) {
                        return Some(ep);
                    }
                }
                if let Some((name, child)) = &self.param {
                    params.append(name.clone(), (*seg).to_string());
                    if let Some(ep) = child.lookup(rest, params) {
                        return Some(ep);
                    }
                }
                if let Some((name, endpoint)) = &self.wildcard {
                    params.append(name.clone(), segments.join("/"));
                    return Some(endpoint);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_literal_over_param_when_both_present() {
        let mut root: Node<&'static str> = Node::new();
        root.insert(&["users", "{id}"], "by-id");
        root.insert(&["users", "me"], "me");

        let mut params = KvList::new();
        assert_eq!(root.lookup(&["users", "me"], &mut params), Some(&"me"));
        assert!(params.is_empty());

        let mut params = KvList::new();
        assert_eq!(root.lookup(&["users", "42"], &mut params), Some(&"by-id"));
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn wildcard_captures_remaining_segments() {
        let mut root: Node<&'static str> = Node::new();
        root.insert(&["files", "*rest"], "files");

        let mut params = KvList::new();
        assert_eq!(root.lookup(&["files", "a", "b.txt"], &mut params), Some(&"files"));
        assert_eq!(params.get("rest"), Some("a/b.txt"));
    }

    #[test]
    fn no_match_returns_none() {
        let mut root: Node<&'static str> = Node::new();
        root.insert(&["a"], "a");
        let mut params = KvList::new();
        assert_eq!(root.lookup(&["b"], &mut params), None);
    }
}
