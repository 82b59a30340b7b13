//! Radix tree node implementation.
//!
//! This module provides the segment tree used for path matching. Each node
//! is one pattern segment; nodes that terminate a registered pattern carry a
//! [`MethodRouter`].

use http::Method;
use waypoint_core::{BoxHandler, Error, Params};

use crate::method_router::MethodRouter;
use crate::pattern::{Pattern, Segment};

/// A node in the routing tree.
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Method router for this node (if a pattern ends here)
    methods: Option<MethodRouter>,

    /// Static children, sorted by segment for binary search
    static_children: Vec<(String, Node)>,

    /// Parameter child (at most one per node) with its name
    param_child: Option<(String, Box<Node>)>,

    /// Wildcard child (at most one per node, always a leaf)
    wildcard_child: Option<(String, Box<Node>)>,
}

impl Node {
    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Inserts a handler for `method` at `pattern`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `(method, pattern)` is already
    /// registered, or if a parameter/wildcard at the same position was
    /// registered under a different name.
    pub fn insert(
        &mut self,
        pattern: &Pattern,
        method: Method,
        handler: BoxHandler,
    ) -> Result<(), Error> {
        let target = self.descend_or_create(pattern, pattern.segments())?;
        let methods = target.methods.get_or_insert_with(MethodRouter::new);
        if methods.insert(method.clone(), handler) {
            Ok(())
        } else {
            Err(Error::config(format!(
                "duplicate route: {method} {pattern} is already registered"
            )))
        }
    }

    fn descend_or_create(&mut self, pattern: &Pattern, segments: &[Segment]) -> Result<&mut Node, Error> {
        let Some((segment, remaining)) = segments.split_first() else {
            return Ok(self);
        };

        match segment {
            Segment::Static(text) => {
                let index = match self
                    .static_children
                    .binary_search_by(|(existing, _)| existing.as_str().cmp(text))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children
                            .insert(index, (text.clone(), Node::default()));
                        index
                    }
                };
                self.static_children[index].1.descend_or_create(pattern, remaining)
            }
            Segment::Param(name) => {
                let (existing, child) = self
                    .param_child
                    .get_or_insert_with(|| (name.clone(), Box::default()));
                if existing != name {
                    return Err(conflict(pattern, &format!("{{{existing}}}"), &format!("{{{name}}}")));
                }
                child.descend_or_create(pattern, remaining)
            }
            Segment::Wildcard(name) => {
                let (existing, child) = self
                    .wildcard_child
                    .get_or_insert_with(|| (name.clone(), Box::default()));
                if existing != name {
                    return Err(conflict(pattern, &format!("*{existing}"), &format!("*{name}")));
                }
                Ok(&mut **child)
            }
        }
    }

    /// Finds the handler for `method` at `path`.
    ///
    /// Static segments beat parameters, parameters beat wildcards, and
    /// deeper matches are tried before shallower wildcards. A node whose
    /// path matches but which has no handler for `method` does not end the
    /// search: its methods are added to `allowed` and matching backtracks
    /// into the remaining branches. With `method` set to `None` nothing is
    /// selected and `allowed` collects the methods of every matching node.
    pub fn lookup(
        &self,
        method: Option<&Method>,
        path: &str,
        allowed: &mut Vec<Method>,
    ) -> Option<(&BoxHandler, Params)> {
        // Repeated slashes collapse, so `/users//7` is `/users/7`
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let handler = self.match_segments(&segments, method, &mut params, allowed)?;
        Some((handler, params))
    }

    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        method: Option<&Method>,
        params: &mut Params,
        allowed: &mut Vec<Method>,
    ) -> Option<&'a BoxHandler> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self
                .methods
                .as_ref()
                .and_then(|methods| select(methods, method, allowed));
        };

        // Try static match first (highest priority)
        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, method, params, allowed) {
                return Some(found);
            }
        }

        if let Some((name, child)) = &self.param_child {
            let mark = params.len();
            params.push(name.clone(), *segment);
            if let Some(found) = child.match_segments(remaining, method, params, allowed) {
                return Some(found);
            }
            params.truncate(mark);
        }

        // Wildcard is the lowest priority and swallows the rest of the path
        if let Some((name, child)) = &self.wildcard_child {
            if let Some(handler) = child
                .methods
                .as_ref()
                .and_then(|methods| select(methods, method, allowed))
            {
                params.push(name.clone(), segments.join("/"));
                return Some(handler);
            }
        }

        None
    }

    /// Finds a static child by segment using binary search.
    fn find_static_child(&self, segment: &str) -> Option<&Node> {
        self.static_children
            .binary_search_by(|(existing, _)| existing.as_str().cmp(segment))
            .ok()
            .map(|index| &self.static_children[index].1)
    }
}

/// Picks the handler for `method`, or records the node's methods in `allowed`.
fn select<'a>(
    methods: &'a MethodRouter,
    method: Option<&Method>,
    allowed: &mut Vec<Method>,
) -> Option<&'a BoxHandler> {
    if let Some(handler) = method.and_then(|method| methods.get(method)) {
        return Some(handler);
    }
    for registered in methods.allowed_methods() {
        if !allowed.contains(&registered) {
            allowed.push(registered);
        }
    }
    None
}

fn conflict(pattern: &Pattern, existing: &str, new: &str) -> Error {
    Error::config(format!(
        "conflicting route pattern {pattern}: `{new}` clashes with previously registered `{existing}` at the same position"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::{boxed, sync_handler, ErrorKind};

    fn noop() -> BoxHandler {
        boxed(sync_handler(|_, _| Ok(())))
    }

    fn insert(node: &mut Node, pattern: &str) -> Result<(), Error> {
        insert_for(node, Method::GET, pattern)
    }

    fn insert_for(node: &mut Node, method: Method, pattern: &str) -> Result<(), Error> {
        node.insert(&Pattern::parse(pattern).unwrap(), method, noop())
    }

    fn get<'a>(node: &'a Node, path: &str) -> Option<(&'a BoxHandler, Params)> {
        node.lookup(Some(&Method::GET), path, &mut Vec::new())
    }

    #[test]
    fn test_static_children_stay_sorted() {
        let mut root = Node::root();
        insert(&mut root, "/zeta").unwrap();
        insert(&mut root, "/alpha").unwrap();
        insert(&mut root, "/mid").unwrap();

        let names: Vec<&str> = root.static_children.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_param_backtracking_drops_captures() {
        let mut root = Node::root();
        insert(&mut root, "/a/{x}/c").unwrap();
        insert(&mut root, "/a/*rest").unwrap();

        let (_, params) = get(&root, "/a/b/d").unwrap();
        assert_eq!(params.get("x"), None);
        assert_eq!(params.get("rest"), Some("b/d"));
    }

    #[test]
    fn test_conflicting_param_names() {
        let mut root = Node::root();
        insert(&mut root, "/users/{id}").unwrap();
        let err = insert(&mut root, "/users/{name}/posts").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("{name}"));
    }

    #[test]
    fn test_conflicting_wildcard_names() {
        let mut root = Node::root();
        insert(&mut root, "/files/*path").unwrap();
        assert!(insert(&mut root, "/files/*rest").is_err());
    }

    #[test]
    fn test_intermediate_node_without_methods_does_not_match() {
        let mut root = Node::root();
        insert(&mut root, "/api/v1/users").unwrap();
        assert!(get(&root, "/api/v1").is_none());
        assert!(get(&root, "/api/v1/users").is_some());
    }

    #[test]
    fn test_wildcard_needs_at_least_one_segment() {
        let mut root = Node::root();
        insert(&mut root, "/files/*path").unwrap();
        assert!(get(&root, "/files").is_none());
        assert!(get(&root, "/files/a").is_some());
    }

    #[test]
    fn test_method_miss_backtracks_to_param() {
        let mut root = Node::root();
        insert_for(&mut root, Method::POST, "/users/me").unwrap();
        insert_for(&mut root, Method::GET, "/users/{id}").unwrap();

        let mut allowed = Vec::new();
        let (_, params) = root.lookup(Some(&Method::GET), "/users/me", &mut allowed).unwrap();
        assert_eq!(params.get("id"), Some("me"));
    }

    #[test]
    fn test_method_miss_collects_every_matching_node() {
        let mut root = Node::root();
        insert_for(&mut root, Method::GET, "/a/{x}").unwrap();
        insert_for(&mut root, Method::POST, "/a/*rest").unwrap();
        insert_for(&mut root, Method::GET, "/a/*rest").unwrap();

        let mut allowed = Vec::new();
        assert!(root.lookup(Some(&Method::PUT), "/a/b", &mut allowed).is_none());
        assert_eq!(allowed, vec![Method::GET, Method::POST]);

        let mut all = Vec::new();
        assert!(root.lookup(None, "/a/b", &mut all).is_none());
        assert_eq!(all, allowed);
    }

    #[test]
    fn test_repeated_slashes_collapse() {
        let mut root = Node::root();
        insert(&mut root, "/users/{id}").unwrap();
        let (_, params) = get(&root, "//users///7").unwrap();
        assert_eq!(params.get("id"), Some("7"));
    }
}
