//! Command-tree construction.
//!
//! Turns a set of URL paths, each carrying its HTTP method bindings, into one
//! rooted [`CommandTree`]. Paths that share a prefix share the nodes for that
//! prefix, so `/users/{id}` and `/users/{id}/posts` both hang off a single
//! `{id}` node.
//!
//! # Examples
//!
//! ```
//! use restcmd_core::{ApiDocument, CommandTreeBuilder, GlobalContext, HttpMethod, Operation};
//!
//! let mut doc = ApiDocument::new("Petstore", "1.0.0");
//! doc.add_operation("/pets", HttpMethod::Get, Operation::new("listPets"));
//! doc.add_operation("/pets/{id}", HttpMethod::Get, Operation::new("getPet"));
//! doc.add_operation("/pets/{id}", HttpMethod::Delete, Operation::new("deletePet"));
//!
//! let tree = CommandTreeBuilder::from_document(&doc)
//!     .build(GlobalContext::new("petstore", "petstore", "https://petstore.example.com"));
//!
//! let id = tree.node(tree.find("/pets/{id}").unwrap());
//! assert_eq!(id.identifier(), "id");
//! assert_eq!(id.usage(), "<id>");
//! assert_eq!(id.methods().len(), 2);
//! ```

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::tree::{CommandTree, GlobalContext, split_path};
use crate::types::{ApiDocument, HttpMethod, Operation};

/// Method bindings for one path.
pub type MethodBindings = Vec<(HttpMethod, Operation)>;

/// Collects path bindings and assembles them into a [`CommandTree`].
#[derive(Debug, Default, Clone)]
pub struct CommandTreeBuilder {
    paths: BTreeMap<String, MethodBindings>,
}

impl CommandTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the builder with every path of `doc`, path-level parameters
    /// merged into each operation.
    pub fn from_document(doc: &ApiDocument) -> Self {
        let mut builder = Self::new();
        for (path, item) in &doc.paths {
            for (method, operation) in item.bindings() {
                builder = builder.with_binding(path, method, operation);
            }
        }
        builder
    }

    /// Adds one (path, method) binding. Later bindings for the same pair
    /// replace earlier ones when the tree is built.
    pub fn with_binding(mut self, path: &str, method: HttpMethod, operation: Operation) -> Self {
        self.paths
            .entry(path.to_string())
            .or_default()
            .push((method, operation));
        self
    }

    /// Builds the tree and broadcasts `context` into every node.
    pub fn build(self, context: GlobalContext) -> CommandTree {
        let mut tree = self.build_without_context();
        tree.broadcast_context(context);
        tree
    }

    /// Builds the tree without attaching a context.
    pub fn build_without_context(self) -> CommandTree {
        let mut tree = CommandTree::new();

        for (path, bindings) in self.paths {
            let mut current = tree.root_id();
            for segment in split_path(&path) {
                current = tree.child_or_insert(current, segment);
            }

            let node = tree.get_mut(current);
            for (method, operation) in bindings {
                if node.methods.insert(method, operation).is_some() {
                    warn!(path = %path, method = %method, "duplicate binding, keeping the last one");
                }
            }
        }

        debug!(nodes = tree.len(), "built command tree");
        tree
    }
}

/// Builds a command tree from raw path bindings.
///
/// Paths are processed in sorted order, so the result does not depend on
/// the iteration order of the caller's collection.
pub fn build_command_tree<I>(paths: I, context: GlobalContext) -> CommandTree
where
    I: IntoIterator<Item = (String, MethodBindings)>,
{
    let mut builder = CommandTreeBuilder::new();
    for (path, bindings) in paths {
        for (method, operation) in bindings {
            builder = builder.with_binding(&path, method, operation);
        }
    }
    builder.build(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Parameter, ParameterLocation};

    fn ctx() -> GlobalContext {
        GlobalContext::new("demo", "demo", "http://localhost:8080")
    }

    fn pets_tree() -> CommandTree {
        CommandTreeBuilder::new()
            .with_binding("/pets", HttpMethod::Get, Operation::new("op1"))
            .with_binding("/pets/{id}", HttpMethod::Get, Operation::new("op2"))
            .with_binding("/pets/{id}", HttpMethod::Delete, Operation::new("op3"))
            .build(ctx())
    }

    #[test]
    fn test_pets_scenario() {
        let tree = pets_tree();
        assert_eq!(tree.len(), 3);

        let root = tree.root();
        assert_eq!(root.identifier(), "cmd");
        assert_eq!(root.children().count(), 1);

        let pets = root.child("pets").unwrap();
        assert_eq!(pets.identifier(), "pets");
        assert_eq!(pets.usage(), "pets");
        assert_eq!(pets.methods().len(), 1);

        let id = pets.child("{id}").unwrap();
        assert!(id.is_parameter());
        assert_eq!(id.identifier(), "id");
        assert_eq!(id.usage(), "<id>");
        assert_eq!(id.default_method(), HttpMethod::Get);
        let methods: Vec<_> = id.methods().keys().copied().collect();
        assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Delete]);
    }

    #[test]
    fn test_shared_prefix_converges() {
        let tree = CommandTreeBuilder::new()
            .with_binding("/users/{id}", HttpMethod::Get, Operation::new("getUser"))
            .with_binding("/users/{id}/posts", HttpMethod::Get, Operation::new("listPosts"))
            .build(ctx());

        // root, users, {id}, posts
        assert_eq!(tree.len(), 4);
        let id = tree.find("/users/{id}").unwrap();
        let posts = tree.find("/users/{id}/posts").unwrap();
        assert_eq!(tree.get(posts).unwrap().parent, Some(id));
    }

    #[test]
    fn test_empty_components_are_skipped() {
        let tree = CommandTreeBuilder::new()
            .with_binding("//pets//", HttpMethod::Get, Operation::new("listPets"))
            .with_binding("/", HttpMethod::Get, Operation::new("index"))
            .build(ctx());

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.root().methods().len(), 1);
        assert_eq!(tree.node(tree.find("/pets").unwrap()).full_path(), "/pets");
    }

    #[test]
    fn test_duplicate_binding_last_wins() {
        let tree = CommandTreeBuilder::new()
            .with_binding("/pets", HttpMethod::Get, Operation::new("first"))
            .with_binding("/pets", HttpMethod::Get, Operation::new("second"))
            .build(ctx());

        let pets = tree.root().child("pets").unwrap();
        assert_eq!(
            pets.methods()[&HttpMethod::Get].operation_id.as_deref(),
            Some("second")
        );
    }

    #[test]
    fn test_reserved_names_receive_suffix() {
        let tree = CommandTreeBuilder::new()
            .with_binding("/type/{match}", HttpMethod::Get, Operation::new("op"))
            .build(ctx());

        let ty = tree.root().child("type").unwrap();
        assert_eq!(ty.identifier(), "type_cmd");
        let m = ty.child("{match}").unwrap();
        assert_eq!(m.identifier(), "match_cmd");
        assert_eq!(m.usage(), "<match>");
    }

    #[test]
    fn test_default_method_falls_back_in_declaration_order() {
        let tree = CommandTreeBuilder::new()
            .with_binding("/pets", HttpMethod::Delete, Operation::new("d"))
            .with_binding("/pets", HttpMethod::Put, Operation::new("p"))
            .build(ctx());

        let pets = tree.root().child("pets").unwrap();
        assert_eq!(pets.default_method(), HttpMethod::Put);
    }

    #[test]
    fn test_descriptions_follow_method_order() {
        let tree = CommandTreeBuilder::new()
            .with_binding(
                "/pets",
                HttpMethod::Post,
                Operation::new("create").with_summary("Create a `pet`"),
            )
            .with_binding(
                "/pets",
                HttpMethod::Get,
                Operation::new("list")
                    .with_summary("List pets")
                    .with_description("Returns every pet"),
            )
            .build(ctx());

        let pets = tree.root().child("pets").unwrap();
        assert_eq!(
            pets.short_description(),
            "\nGET\nList pets\n----------------------\nPOST\nCreate a \"pet\"\n----------------------"
        );
        assert_eq!(
            pets.long_description(),
            "\nGET\nReturns every pet\n----------------------\nPOST\n\n----------------------"
        );
    }

    #[test]
    fn test_build_is_deterministic_regardless_of_input_order() {
        let forward = vec![
            ("/a/{x}".to_string(), vec![(HttpMethod::Get, Operation::new("ax"))]),
            ("/b".to_string(), vec![(HttpMethod::Post, Operation::new("b"))]),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        let render = |tree: &CommandTree| -> Vec<(String, String, String)> {
            tree.walk()
                .into_iter()
                .map(|id| {
                    let n = tree.node(id);
                    (n.full_path(), n.identifier(), n.short_description())
                })
                .collect()
        };

        let t1 = build_command_tree(forward, ctx());
        let t2 = build_command_tree(backward, ctx());
        assert_eq!(render(&t1), render(&t2));
    }

    #[test]
    fn test_from_document_merges_path_parameters() {
        let mut doc = ApiDocument::new("Users", "1");
        doc.add_operation("/users/{id}", HttpMethod::Get, Operation::new("getUser"));
        doc.paths
            .get_mut("/users/{id}")
            .unwrap()
            .parameters
            .push(Parameter::new("verbose", ParameterLocation::Query));

        let tree = CommandTreeBuilder::from_document(&doc).build(ctx());
        let id = tree.node(tree.find("/users/{id}").unwrap());
        assert!(id.query_params().contains_key("verbose"));
    }
}
