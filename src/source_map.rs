//! Mapping generated lines back to original source lines
//!
//! After a file is rewritten and emitted, the emitted text is parsed again so that
//! every emitted node has a location. Each emitted line is then matched against the
//! rewritten tree, which still carries the locations its nodes had in the original
//! file:
//!
//! 1. Every emitted node that fits on one line records its child-index path under its
//!    line, in pre-order.
//! 2. For each line, the paths are tried in order. A path that exists in the rewritten
//!    tree yields that node. A path that does not exist falls back to a structural
//!    search: take the deepest node along the path in the emitted tree, and look for
//!    the first equal node (pre-order) under the deepest ancestor of the path that
//!    does exist in the rewritten tree.
//! 3. The first candidate node that has a location answers for the line. Nodes built
//!    by code generation have none, so their lines are answered by the original
//!    operands inside them or stay unknown.

use crate::tree::Node;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMap {
    source_file_path: String,
    transformed_file_path: String,
    line_count: usize,
    mapping: BTreeMap<usize, Option<usize>>,
}

impl SourceMap {
    /// `rewritten` is the tree that was serialized; `emitted` is that text parsed again.
    pub fn build(
        source_file_path: &str,
        transformed_file_path: &str,
        rewritten: &Node,
        emitted: &Node,
    ) -> Self {
        let line_count = emitted
            .location()
            .map_or(0, |range| range.end.line);
        let mut lines: BTreeMap<usize, Vec<Vec<usize>>> = BTreeMap::new();
        collect_paths(emitted, &mut Vec::new(), &mut lines);

        let mapping = (1..=line_count)
            .map(|line| {
                let source_line = lines.get(&line).and_then(|paths| {
                    paths.iter().find_map(|path| {
                        approximate_dig(rewritten, emitted, path).and_then(Node::line)
                    })
                });
                trace!(line, ?source_line, "mapped emitted line");
                (line, source_line)
            })
            .collect();

        Self {
            source_file_path: source_file_path.to_string(),
            transformed_file_path: transformed_file_path.to_string(),
            line_count,
            mapping,
        }
    }

    pub fn source_file_path(&self) -> &str {
        &self.source_file_path
    }

    pub fn transformed_file_path(&self) -> &str {
        &self.transformed_file_path
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Original line for an emitted line, when one could be determined.
    pub fn line(&self, transformed_line: usize) -> Option<usize> {
        self.mapping.get(&transformed_line).copied().flatten()
    }

    pub fn mapping(&self) -> &BTreeMap<usize, Option<usize>> {
        &self.mapping
    }
}

fn collect_paths(node: &Node, path: &mut Vec<usize>, lines: &mut BTreeMap<usize, Vec<Vec<usize>>>) {
    if let Some(range) = node.location().filter(|range| range.is_single_line()) {
        lines.entry(range.start.line).or_default().push(path.clone());
    }
    for (index, child) in node.children().iter().enumerate() {
        if let Some(inner) = child.as_node() {
            path.push(index);
            collect_paths(inner, path, lines);
            path.pop();
        }
    }
}

fn approximate_dig<'a>(rewritten: &'a Node, emitted: &Node, path: &[usize]) -> Option<&'a Node> {
    if let Some(node) = rewritten.dig(path) {
        return Some(node);
    }
    let (_, parent_path) = path.split_last()?;
    let reference = deepest_valid(emitted, path).1;
    let (depth, ancestor) = deepest_valid(rewritten, parent_path);
    if depth == 0 {
        return None;
    }
    find_first(ancestor, reference)
}

/// Length of the longest prefix of `path` that digs to a node, and that node.
fn deepest_valid<'a>(root: &'a Node, path: &[usize]) -> (usize, &'a Node) {
    let mut node = root;
    for (depth, &index) in path.iter().enumerate() {
        match node.node_at(index) {
            Some(next) => node = next,
            None => return (depth, node),
        }
    }
    (path.len(), node)
}

fn find_first<'a>(root: &'a Node, target: &Node) -> Option<&'a Node> {
    if root == target {
        return Some(root);
    }
    root.child_nodes().find_map(|child| find_first(child, target))
}

/// Source maps of every rewritten file, keyed by the path of the emitted artifact
///
/// Shared by the pipeline, which registers maps, and by backtrace filters, which look
/// them up. Registering a path again replaces its map.
#[derive(Debug, Default)]
pub struct SourceMapRegistry {
    maps: DashMap<String, Arc<SourceMap>>,
}

impl SourceMapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, map: SourceMap) -> Arc<SourceMap> {
        let map = Arc::new(map);
        self.maps
            .insert(map.transformed_file_path.clone(), Arc::clone(&map));
        map
    }

    pub fn for_file_path(&self, transformed_file_path: &str) -> Option<Arc<SourceMap>> {
        self.maps
            .get(transformed_file_path)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{SexpSyntax, Syntax};
    use crate::testing::parse_sexp;
    use crate::tree::build::{begin, call, int, lvar};

    fn map_of(rewritten: &Node) -> SourceMap {
        let syntax = SexpSyntax::new();
        let emitted = syntax
            .parse(&syntax.serialize(rewritten), "out.sexp")
            .unwrap();
        SourceMap::build("in.sexp", "out.sexp", rewritten, &emitted)
    }

    #[test]
    fn test_unchanged_tree_maps_line_to_line() {
        let source = parse_sexp("(begin\n  (int 1)\n  (int 2))");
        let map = map_of(&source);
        assert_eq!(map.line_count(), 3);
        // The multi-line `begin` cannot answer for its first line.
        assert_eq!(map.line(1), None);
        assert_eq!(map.line(2), Some(2));
        assert_eq!(map.line(3), Some(3));
        assert_eq!(map.line(4), None);
    }

    #[test]
    fn test_synthesized_wrapper_maps_through_original_operands() {
        let source = parse_sexp("(begin\n\n\n  (send (lvar :a) :== (int 1)))");
        let statement = source.node_at(0).unwrap();
        let operands = statement.as_call().unwrap();
        let assertion = call(
            None,
            "assert_equal",
            vec![
                operands.args[0].clone(),
                operands.receiver.unwrap().clone().into(),
            ],
        );
        let map = map_of(&begin(vec![assertion]));
        assert_eq!(map.line_count(), 2);
        assert_eq!(map.line(1), None);
        assert_eq!(map.line(2), Some(4));
    }

    #[test]
    fn test_structural_search_uses_first_match() {
        let rewritten = parse_sexp("(begin\n  (kwbegin\n    (lvar :x)\n    (lvar :x)))");
        let emitted = parse_sexp(
            "(begin\n  (kwbegin\n    (lvar :x)\n    (lvar :x)\n    (int 9)\n    (lvar :x)))",
        );
        let map = SourceMap::build("in", "out", &rewritten, &emitted);
        assert_eq!(map.line(3), Some(3));
        assert_eq!(map.line(4), Some(4));
        assert_eq!(map.line(5), None);
        // Path [0, 3] does not exist in the rewritten tree; the first `(lvar :x)` wins.
        assert_eq!(map.line(6), Some(3));
    }

    #[test]
    fn test_top_level_paths_do_not_fall_back() {
        let rewritten = parse_sexp("(begin\n  (lvar :x))");
        let emitted = parse_sexp("(begin\n  (int 1)\n  (lvar :x))");
        let map = SourceMap::build("in", "out", &rewritten, &emitted);
        assert_eq!(map.line(3), None);
    }

    #[test]
    fn test_synthesized_only_tree_has_unknown_lines() {
        let rewritten = begin(vec![call(Some(lvar("a")), "b", vec![int(1).into()])]);
        let map = map_of(&rewritten);
        assert!(map.mapping().values().all(Option::is_none));
    }

    #[test]
    fn test_registry_replaces_by_transformed_path() {
        let registry = SourceMapRegistry::new();
        let first = map_of(&parse_sexp("(int 1)"));
        registry.register(first);
        let tree = parse_sexp("(int 1)");
        let second = SourceMap::build("other.sexp", "out.sexp", &tree, &tree);
        registry.register(second);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.for_file_path("out.sexp").unwrap().source_file_path(),
            "other.sexp"
        );
        assert!(registry.for_file_path("missing.sexp").is_none());
    }

    #[test]
    fn test_serializes_to_json() {
        let map = map_of(&parse_sexp("(int 1)"));
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["source_file_path"], "in.sexp");
        assert_eq!(json["mapping"]["1"], 1);
    }
}
