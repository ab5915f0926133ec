//! API document type definitions.
//!
//! This module defines the in-memory shape of an OpenAPI 3 document as far as
//! command generation needs it: servers, paths, the operations bound to each
//! path, their parameters, and the raw component schemas consumed by model
//! generation. The types deserialize directly from JSON or YAML via
//! [`serde`]; anything the generator does not use is ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// HTTP method bound to a path.
///
/// The set is closed. The derived ordering follows declaration order
/// (`GET`, `POST`, `PUT`, `PATCH`, `DELETE`), which is the order used
/// everywhere methods are iterated.
///
/// # Examples
///
/// ```
/// use restcmd_core::HttpMethod;
///
/// assert!(HttpMethod::Get < HttpMethod::Delete);
/// assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
/// assert_eq!("delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// All methods in declaration order.
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    /// Upper-case method token.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

/// Where a parameter is carried in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// A single operation parameter.
///
/// # Examples
///
/// ```
/// use restcmd_core::{Parameter, ParameterLocation};
///
/// let p = Parameter::new("limit", ParameterLocation::Query)
///     .with_description("Page size with `max` 100");
/// assert!(!p.required);
/// assert_eq!(p.safe_description(), "Page size with \"max\" 100");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name as it appears on the wire.
    pub name: String,
    /// Location of the parameter.
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter must be supplied.
    #[serde(default)]
    pub required: bool,
    /// Raw JSON schema of the parameter value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,
}

impl Parameter {
    /// Creates an optional parameter with no description or schema.
    pub fn new(name: &str, location: ParameterLocation) -> Self {
        Self {
            name: name.to_string(),
            location,
            description: None,
            required: location == ParameterLocation::Path,
            schema: None,
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Marks the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Description with backticks replaced, safe to embed in generated text.
    pub fn safe_description(&self) -> String {
        crate::naming::remove_backticks(self.description.as_deref().unwrap_or_default())
    }

    /// Returns `true` when the schema declares a boolean value.
    pub fn is_bool(&self) -> bool {
        self.schema
            .as_ref()
            .and_then(|s| s.get("type"))
            .and_then(|t| t.as_str())
            == Some("boolean")
    }
}

/// Request body declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Media type → raw media object.
    #[serde(default)]
    pub content: BTreeMap<String, serde_json::Value>,
}

/// Operation metadata bound to one (path, method) pair.
///
/// # Examples
///
/// ```
/// use restcmd_core::Operation;
///
/// let op = Operation::new("listPets").with_summary("List all pets");
/// assert_eq!(op.operation_id.as_deref(), Some("listPets"));
/// assert_eq!(op.summary.as_deref(), Some("List all pets"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
}

impl Operation {
    /// Creates an operation with the given id.
    pub fn new(operation_id: &str) -> Self {
        Self {
            operation_id: Some(operation_id.to_string()),
            ..Default::default()
        }
    }

    /// Adds a summary.
    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    /// Adds a long description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Adds a parameter.
    pub fn with_parameter(mut self, param: Parameter) -> Self {
        self.parameters.push(param);
        self
    }
}

/// Operations declared for one path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameters shared by every operation of this path.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
}

impl PathItem {
    /// Returns the operation bound to `method`, if any.
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
        }
    }

    /// Binds `operation` to `method`, replacing any previous binding.
    pub fn set_operation(&mut self, method: HttpMethod, operation: Operation) {
        let slot = match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Delete => &mut self.delete,
        };
        *slot = Some(operation);
    }

    /// Method bindings in declaration order.
    ///
    /// Path-level parameters are appended to each operation's own
    /// parameters unless the operation already declares a parameter with
    /// the same name and location.
    ///
    /// # Examples
    ///
    /// ```
    /// use restcmd_core::{HttpMethod, Operation, Parameter, ParameterLocation, PathItem};
    ///
    /// let mut item = PathItem::default();
    /// item.parameters.push(Parameter::new("id", ParameterLocation::Path));
    /// item.set_operation(HttpMethod::Delete, Operation::new("deletePet"));
    /// item.set_operation(HttpMethod::Get, Operation::new("getPet"));
    ///
    /// let bindings = item.bindings();
    /// assert_eq!(bindings[0].0, HttpMethod::Get);
    /// assert_eq!(bindings[1].1.parameters.len(), 1);
    /// ```
    pub fn bindings(&self) -> Vec<(HttpMethod, Operation)> {
        HttpMethod::ALL
            .iter()
            .filter_map(|&method| {
                self.operation(method).map(|op| {
                    let mut op = op.clone();
                    for shared in &self.parameters {
                        let declared = op
                            .parameters
                            .iter()
                            .any(|p| p.name == shared.name && p.location == shared.location);
                        if !declared {
                            op.parameters.push(shared.clone());
                        }
                    }
                    (method, op)
                })
            })
            .collect()
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A server entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Reusable components. Only schemas are consumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: BTreeMap<String, serde_json::Value>,
}

/// A parsed API description.
///
/// `paths` is a [`BTreeMap`], so iterating it is sorted by path string and
/// stable across runs.
///
/// # Examples
///
/// ```
/// use restcmd_core::{ApiDocument, HttpMethod, Operation};
///
/// let mut doc = ApiDocument::new("Petstore", "1.0.0");
/// doc.add_operation("/pets", HttpMethod::Get, Operation::new("listPets"));
/// doc.add_operation("/pets/{id}", HttpMethod::Get, Operation::new("getPet"));
///
/// assert_eq!(doc.paths.len(), 2);
/// assert_eq!(doc.operation_count(), 2);
/// assert_eq!(doc.first_server_url(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiDocument {
    /// OpenAPI version string (e.g. `3.0.3`).
    pub openapi: String,
    #[serde(default)]
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

impl ApiDocument {
    /// Creates an empty OpenAPI 3.0 document.
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            openapi: "3.0.3".to_string(),
            info: Info {
                title: title.to_string(),
                version: version.to_string(),
                description: None,
            },
            ..Default::default()
        }
    }

    /// Binds an operation to a path, creating the path item if needed.
    pub fn add_operation(&mut self, path: &str, method: HttpMethod, operation: Operation) {
        self.paths
            .entry(path.to_string())
            .or_default()
            .set_operation(method, operation);
    }

    /// Total number of bound operations across all paths.
    pub fn operation_count(&self) -> usize {
        self.paths
            .values()
            .map(|item| {
                HttpMethod::ALL
                    .iter()
                    .filter(|&&m| item.operation(m).is_some())
                    .count()
            })
            .sum()
    }

    /// URL of the first declared server, if any.
    pub fn first_server_url(&self) -> Option<&str> {
        self.servers.first().map(|s| s.url.as_str())
    }

    /// Component schemas, empty when the document has none.
    pub fn schemas(&self) -> Option<&BTreeMap<String, serde_json::Value>> {
        self.components.as_ref().map(|c| &c.schemas)
    }
}
