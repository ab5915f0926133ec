//! Command tree arena.
//!
//! A [`CommandTree`] owns every [`CommandNode`] in a flat `Vec`; nodes refer
//! to their parent and children by [`NodeId`]. Derived properties (paths,
//! identifiers, descriptions) are computed through the read-only
//! [`NodeRef`] view, which pairs a node with the tree it lives in.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::naming::{self, ROOT_IDENTIFIER};
use crate::types::{HttpMethod, Operation, Parameter, ParameterLocation};

/// Index of a node inside its [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Cross-cutting configuration shared by every node.
///
/// Directories are relative to the output root (e.g. `src/cmd`). Import
/// paths are Rust paths rooted at the generated crate.
///
/// # Examples
///
/// ```
/// use restcmd_core::GlobalContext;
///
/// let ctx = GlobalContext::new("petctl", "pet-client", "https://api.example.com");
/// assert_eq!(ctx.crate_ident(), "pet_client");
/// assert_eq!(ctx.command_import_path(), "pet_client::cmd");
/// assert_eq!(ctx.config_import_path(), "pet_client::config");
/// assert_eq!(ctx.app_module(), "app");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalContext {
    /// Program name of the generated CLI.
    pub root_usage: String,
    /// Package name of the generated crate.
    pub module_name: String,
    /// Base URL requests are sent to.
    pub base_url: String,
    pub command_dir: String,
    pub config_dir: String,
    pub app_dir: String,
    pub service_dir: String,
    pub model_dir: String,
}

/// Directory holding shared command helpers, relative to the source root.
pub const COMMON_MODULE: &str = "common";

impl GlobalContext {
    /// Creates a context with the default project layout.
    pub fn new(root_usage: &str, module_name: &str, base_url: &str) -> Self {
        Self {
            root_usage: root_usage.to_string(),
            module_name: module_name.to_string(),
            base_url: base_url.to_string(),
            command_dir: "src/cmd".to_string(),
            config_dir: "src/config".to_string(),
            app_dir: "src/app".to_string(),
            service_dir: "src/service".to_string(),
            model_dir: "src/model".to_string(),
        }
    }

    /// Crate identifier used in `use` paths.
    pub fn crate_ident(&self) -> String {
        self.module_name.replace('-', "_")
    }

    fn import_path(&self, dir: &str) -> String {
        let mut parts = vec![self.crate_ident()];
        parts.extend(
            dir.trim_matches('/')
                .split('/')
                .filter(|s| !s.is_empty() && *s != "src")
                .map(str::to_string),
        );
        parts.join("::")
    }

    pub fn command_import_path(&self) -> String {
        self.import_path(&self.command_dir)
    }

    pub fn config_import_path(&self) -> String {
        self.import_path(&self.config_dir)
    }

    pub fn app_import_path(&self) -> String {
        self.import_path(&self.app_dir)
    }

    pub fn service_import_path(&self) -> String {
        self.import_path(&self.service_dir)
    }

    pub fn common_import_path(&self) -> String {
        format!("{}::{COMMON_MODULE}", self.crate_ident())
    }

    /// Last component of the application directory.
    pub fn app_module(&self) -> &str {
        self.app_dir
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}

/// One path segment of the command tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandNode {
    /// Raw segment: a literal, a `{param}` marker, or empty for the root.
    pub segment: String,
    pub parent: Option<NodeId>,
    /// Children keyed by raw segment.
    pub children: BTreeMap<String, NodeId>,
    pub methods: BTreeMap<HttpMethod, Operation>,
    pub depth: usize,
    /// Identifiers of the root-to-node chain, each followed by `/`.
    pub relative_path: String,
    #[serde(skip)]
    pub context: Option<Arc<GlobalContext>>,
}

impl CommandNode {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            parent: None,
            children: BTreeMap::new(),
            methods: BTreeMap::new(),
            depth: 0,
            relative_path: String::new(),
            context: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_parameter(&self) -> bool {
        self.segment.starts_with('{') && self.segment.ends_with('}')
    }

    /// Parameter name without braces, or `None` for literal nodes.
    pub fn param_name(&self) -> Option<&str> {
        if self.is_parameter() {
            Some(self.segment.trim_start_matches('{').trim_end_matches('}'))
        } else {
            None
        }
    }

    /// GET if bound, otherwise the first bound method in declaration order.
    pub fn default_method(&self) -> HttpMethod {
        if self.methods.contains_key(&HttpMethod::Get) {
            return HttpMethod::Get;
        }
        self.methods
            .keys()
            .next()
            .copied()
            .unwrap_or(HttpMethod::Get)
    }
}

/// Arena-backed command tree. Node `0` is always the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
}

impl Default for CommandTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTree {
    /// Creates a tree holding only the synthetic root.
    pub fn new() -> Self {
        let mut root = CommandNode::new("");
        root.relative_path = "/".to_string();
        Self { nodes: vec![root] }
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.node(self.root_id())
    }

    /// Returns a view of the node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    pub fn get(&self, id: NodeId) -> Option<&CommandNode> {
        self.nodes.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut CommandNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the child of `parent` keyed by `segment`, creating it if needed.
    pub fn child_or_insert(&mut self, parent: NodeId, segment: &str) -> NodeId {
        if let Some(&existing) = self.nodes[parent.0].children.get(segment) {
            return existing;
        }

        let id = NodeId(self.nodes.len());
        let (depth, relative_path) = {
            let p = &self.nodes[parent.0];
            (p.depth + 1, p.relative_path.clone())
        };
        let mut child = CommandNode::new(segment);
        child.parent = Some(parent);
        child.depth = depth;
        let identifier = match child.param_name() {
            Some(name) => naming::segment_identifier(name),
            None => naming::segment_identifier(segment),
        };
        child.relative_path = format!("{relative_path}{identifier}/");
        self.nodes.push(child);
        self.nodes[parent.0]
            .children
            .insert(segment.to_string(), id);
        id
    }

    /// Finds the node reached by walking `path` from the root.
    ///
    /// # Examples
    ///
    /// ```
    /// use restcmd_core::CommandTree;
    ///
    /// let mut tree = CommandTree::new();
    /// let pets = tree.child_or_insert(tree.root_id(), "pets");
    /// assert_eq!(tree.find("/pets"), Some(pets));
    /// assert_eq!(tree.find("/"), Some(tree.root_id()));
    /// assert_eq!(tree.find("/owners"), None);
    /// ```
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root_id();
        for segment in split_path(path) {
            current = *self.nodes[current.0].children.get(segment)?;
        }
        Some(current)
    }

    /// Stores one shared context into every node.
    pub fn broadcast_context(&mut self, context: GlobalContext) {
        let shared = Arc::new(context);
        let mut stack = vec![self.root_id()];
        while let Some(id) = stack.pop() {
            let node = &mut self.nodes[id.0];
            node.context = Some(Arc::clone(&shared));
            stack.extend(node.children.values().copied());
        }
    }

    /// Context shared by the tree, if it has been broadcast.
    pub fn context(&self) -> Option<&GlobalContext> {
        self.nodes[0].context.as_deref()
    }

    /// Node ids in depth-first pre-order, children in key order.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root_id()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.values().rev().copied());
        }
        order
    }
}

/// Splits a URL path into non-empty segments.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Read-only view of a node with access to its tree.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a CommandTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn data(&self) -> &'a CommandNode {
        &self.tree.nodes[self.id.0]
    }

    pub fn is_root(&self) -> bool {
        self.data().is_root()
    }

    pub fn is_parameter(&self) -> bool {
        self.data().is_parameter()
    }

    pub fn segment(&self) -> &'a str {
        &self.data().segment
    }

    pub fn depth(&self) -> usize {
        self.data().depth
    }

    pub fn methods(&self) -> &'a BTreeMap<HttpMethod, Operation> {
        &self.data().methods
    }

    pub fn default_method(&self) -> HttpMethod {
        self.data().default_method()
    }

    pub fn context(&self) -> Option<&'a GlobalContext> {
        self.data().context.as_deref()
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.data().parent.map(|id| self.tree.node(id))
    }

    /// Children in key order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        self.data().children.values().map(move |&id| tree.node(id))
    }

    pub fn child(&self, segment: &str) -> Option<NodeRef<'a>> {
        self.data()
            .children
            .get(segment)
            .map(|&id| self.tree.node(id))
    }

    /// Ancestors from the root down to (excluding) this node.
    fn ancestors(&self) -> Vec<NodeRef<'a>> {
        let mut chain = Vec::with_capacity(self.depth());
        let mut current = self.parent();
        while let Some(node) = current {
            chain.push(node);
            current = node.parent();
        }
        chain.reverse();
        chain
    }

    /// Full URL path of the node (`/` for the root).
    pub fn full_path(&self) -> String {
        if self.is_root() {
            return "/".to_string();
        }
        let segments: Vec<&str> = self
            .ancestors()
            .iter()
            .chain(std::iter::once(self))
            .filter(|n| !n.is_root())
            .map(|n| n.segment())
            .collect();
        format!("/{}", segments.join("/"))
    }

    /// Parameter name without braces; empty for literal nodes.
    pub fn param_name(&self) -> &'a str {
        self.data().param_name().unwrap_or_default()
    }

    /// Identifier used for the node's module and file.
    pub fn identifier(&self) -> String {
        if self.is_root() {
            return ROOT_IDENTIFIER.to_string();
        }
        match self.data().param_name() {
            Some(name) => naming::segment_identifier(name),
            None => naming::segment_identifier(self.segment()),
        }
    }

    /// Token shown in help output: program name, `<param>`, or identifier.
    pub fn usage(&self) -> String {
        if self.is_root() {
            return self
                .context()
                .map(|c| c.root_usage.clone())
                .unwrap_or_default();
        }
        if self.is_parameter() {
            return format!("<{}>", self.param_name());
        }
        self.identifier()
    }

    /// Name of the generated builder function for this command.
    pub fn function_name(&self) -> String {
        let source = if self.is_root() {
            self.context()
                .map(|c| c.root_usage.as_str())
                .unwrap_or_default()
        } else if self.is_parameter() {
            self.param_name()
        } else {
            self.segment()
        };
        naming::code_string(&naming::capitalize_first(source))
    }

    pub fn short_description(&self) -> String {
        self.describe(true)
    }

    pub fn long_description(&self) -> String {
        self.describe(false)
    }

    fn describe(&self, short: bool) -> String {
        let mut out = String::new();
        for (method, operation) in self.methods() {
            let text = if short {
                operation.summary.as_deref()
            } else {
                operation.description.as_deref()
            };
            out.push('\n');
            out.push_str(method.as_str());
            out.push('\n');
            out.push_str(&naming::remove_backticks(text.unwrap_or_default()));
            out.push_str("\n----------------------");
        }
        out
    }

    /// Rust path of the node's module, when the context is known.
    pub fn import_path(&self) -> Option<String> {
        let ctx = self.context()?;
        let mut path = ctx.command_import_path();
        for part in self.data().relative_path.split('/').filter(|s| !s.is_empty()) {
            path.push_str("::");
            path.push_str(part);
        }
        Some(path)
    }

    /// Parameters at `location` across all bound methods, keyed by name.
    pub fn params_in(&self, location: ParameterLocation) -> BTreeMap<&'a str, &'a Parameter> {
        let mut params = BTreeMap::new();
        for operation in self.methods().values() {
            for param in &operation.parameters {
                if param.location == location {
                    params.insert(param.name.as_str(), param);
                }
            }
        }
        params
    }

    pub fn query_params(&self) -> BTreeMap<&'a str, &'a Parameter> {
        self.params_in(ParameterLocation::Query)
    }

    pub fn header_params(&self) -> BTreeMap<&'a str, &'a Parameter> {
        self.params_in(ParameterLocation::Header)
    }

    /// Names of path parameters from the root down to this node.
    pub fn path_params(&self) -> Vec<&'a str> {
        self.ancestors()
            .into_iter()
            .chain(std::iter::once(*self))
            .filter(|n| n.is_parameter())
            .map(|n| n.param_name())
            .collect()
    }

    /// Returns `true` if any bound method declares a request body.
    pub fn accepts_body(&self) -> bool {
        self.methods()
            .values()
            .any(|op| op.request_body.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> CommandTree {
        let mut tree = CommandTree::new();
        let root = tree.root_id();
        let users = tree.child_or_insert(root, "users");
        let id = tree.child_or_insert(users, "{user-id}");
        tree.child_or_insert(id, "posts");
        tree
    }

    #[test]
    fn test_child_or_insert_reuses_existing_child() {
        let mut tree = CommandTree::new();
        let root = tree.root_id();
        let a = tree.child_or_insert(root, "pets");
        let b = tree.child_or_insert(root, "pets");
        assert_eq!(a, b);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_depth_and_relative_path() {
        let tree = sample_tree();
        let posts = tree.node(tree.find("/users/{user-id}/posts").unwrap());
        assert_eq!(posts.depth(), 3);
        assert_eq!(posts.data().relative_path, "/users/user_id/posts/");
    }

    #[test]
    fn test_full_path_round_trip() {
        let tree = sample_tree();
        for path in ["/users", "/users/{user-id}", "/users/{user-id}/posts"] {
            let node = tree.node(tree.find(path).unwrap());
            assert_eq!(node.full_path(), path);
        }
        assert_eq!(tree.root().full_path(), "/");
    }

    #[test]
    fn test_path_params_collects_ancestors() {
        let tree = sample_tree();
        let posts = tree.node(tree.find("/users/{user-id}/posts").unwrap());
        assert_eq!(posts.path_params(), vec!["user-id"]);
    }

    #[test]
    fn test_broadcast_context_reaches_every_node() {
        let mut tree = sample_tree();
        tree.broadcast_context(GlobalContext::new("demo", "demo", "http://localhost"));
        for id in tree.walk() {
            assert_eq!(tree.node(id).context().unwrap().root_usage, "demo");
        }
        assert_eq!(tree.root().usage(), "demo");
    }

    #[test]
    fn test_walk_is_preorder_in_key_order() {
        let mut tree = CommandTree::new();
        let root = tree.root_id();
        tree.child_or_insert(root, "b");
        let a = tree.child_or_insert(root, "a");
        tree.child_or_insert(a, "x");
        let order: Vec<String> = tree
            .walk()
            .into_iter()
            .map(|id| tree.node(id).full_path())
            .collect();
        assert_eq!(order, vec!["/", "/a", "/a/x", "/b"]);
    }

    #[test]
    fn test_import_path() {
        let mut tree = sample_tree();
        tree.broadcast_context(GlobalContext::new("demo", "demo-api", "http://localhost"));
        let id = tree.node(tree.find("/users/{user-id}").unwrap());
        assert_eq!(
            id.import_path().as_deref(),
            Some("demo_api::cmd::users::user_id")
        );
        assert_eq!(tree.root().import_path().as_deref(), Some("demo_api::cmd"));
    }

    #[test]
    fn test_function_name() {
        let mut tree = sample_tree();
        tree.broadcast_context(GlobalContext::new("pet-cli", "demo", "http://localhost"));
        assert_eq!(tree.root().function_name(), "Pet_cli");
        let id = tree.node(tree.find("/users/{user-id}").unwrap());
        assert_eq!(id.function_name(), "User_id");
    }
}
