//! API document model and command-tree construction.
//!
//! This crate holds the pieces of `restcmd` that do not touch the file
//! system or spawn processes:
//!
//! - [`ApiDocument`] and friends: the in-memory shape of an OpenAPI 3
//!   document (paths, operations, parameters, servers, schemas).
//! - [`CommandTree`]: an arena of [`CommandNode`]s, one per distinct URL
//!   path prefix, with derived naming exposed through [`NodeRef`].
//! - [`CommandTreeBuilder`] / [`build_command_tree`]: folds path bindings
//!   into a single rooted tree and broadcasts a shared [`GlobalContext`].
//! - [`naming`]: the identifier rules used for every generated module.
//!
//! # Example
//!
//! ```
//! use restcmd_core::*;
//!
//! let mut doc = ApiDocument::new("Users API", "1.0.0");
//! doc.add_operation(
//!     "/users/{id}",
//!     HttpMethod::Get,
//!     Operation::new("getUser").with_summary("Fetch a user"),
//! );
//! doc.add_operation("/users/{id}/posts", HttpMethod::Get, Operation::new("listPosts"));
//!
//! let tree = CommandTreeBuilder::from_document(&doc)
//!     .build(GlobalContext::new("users-api", "users-api", "https://api.example.com"));
//!
//! let posts = tree.node(tree.find("/users/{id}/posts").unwrap());
//! assert_eq!(posts.full_path(), "/users/{id}/posts");
//! assert_eq!(posts.path_params(), vec!["id"]);
//! assert_eq!(posts.import_path().unwrap(), "users_api::cmd::users::id::posts");
//! ```

mod builder;
pub mod naming;
mod tree;
mod types;

pub use builder::{CommandTreeBuilder, MethodBindings, build_command_tree};
pub use tree::{COMMON_MODULE, CommandNode, CommandTree, GlobalContext, NodeId, NodeRef, split_path};
pub use types::*;
