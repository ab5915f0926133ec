//! API description loading and structural validation.
//!
//! Documents are read from `.json`, `.yaml` or `.yml` files and checked for
//! the shape the tree builder depends on: an OpenAPI 3 version string and
//! well-formed path templates. Schema soundness is not checked.
//!
//! # Examples
//!
//! ```
//! use restcmd_codegen::loader::{DocumentFormat, parse_document, validate_document};
//!
//! let raw = r#"
//! openapi: 3.0.3
//! info:
//!   title: Petstore
//!   version: 1.0.0
//! paths:
//!   /pets/{id}:
//!     get:
//!       operationId: getPet
//! "#;
//!
//! let doc = parse_document(raw, DocumentFormat::Yaml).unwrap();
//! assert_eq!(doc.info.title, "Petstore");
//! assert!(validate_document(&doc).is_empty());
//! ```

use std::path::Path;

use restcmd_core::{ApiDocument, split_path};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::LoadError;

/// Structural problems found in a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The `openapi` field is not a 3.x version.
    #[error("unsupported OpenAPI version: {0:?}")]
    UnsupportedVersion(String),
    /// A path key does not start with `/`.
    #[error("path must start with '/': {0}")]
    RelativePath(String),
    /// A path segment opens a `{` without closing it, or the reverse.
    #[error("unbalanced parameter braces in path: {0}")]
    UnbalancedBraces(String),
    /// A path segment is `{}`.
    #[error("empty parameter name in path: {0}")]
    EmptyParameter(String),
}

/// Serialization format of an API description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(DocumentFormat::Json),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            _ => None,
        }
    }
}

/// Reads, parses and validates the document at `path`.
///
/// # Errors
///
/// Returns [`LoadError::UnsupportedFormat`] for unknown extensions,
/// [`LoadError::Io`] when the file cannot be read, a parse error when the
/// content is malformed, and [`LoadError::Invalid`] when validation finds
/// problems.
pub fn load_document(path: impl AsRef<Path>) -> Result<ApiDocument, LoadError> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| LoadError::UnsupportedFormat(path.to_path_buf()))?;

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let doc = parse_document(&content, format)?;
    let issues = validate_document(&doc);
    if !issues.is_empty() {
        return Err(LoadError::Invalid(issues));
    }

    debug!(
        path = %path.display(),
        paths = doc.paths.len(),
        operations = doc.operation_count(),
        "loaded API document"
    );
    Ok(doc)
}

/// Parses document text without validating it.
///
/// Local `$ref`s (`#/components/...`) are inlined before the text is mapped
/// onto [`ApiDocument`], so referenced parameters, request bodies and path
/// items behave like inline ones. Component schemas keep their references
/// because model generation names types after them.
///
/// # Errors
///
/// Returns a parse error for malformed text and [`LoadError::Reference`]
/// when a reference cannot be resolved.
pub fn parse_document(content: &str, format: DocumentFormat) -> Result<ApiDocument, LoadError> {
    let mut raw: Value = match format {
        DocumentFormat::Json => serde_json::from_str(content)?,
        DocumentFormat::Yaml => serde_yaml::from_str(content)?,
    };
    stringify_versions(&mut raw);

    let resolved =
        openapi_deref::resolve(&raw).map_err(|e| LoadError::Reference(format!("{e:?}")))?;
    let mut doc: ApiDocument = serde_json::from_value(resolved.value)?;

    if let (Some(components), Some(schemas)) =
        (doc.components.as_mut(), raw.pointer("/components/schemas"))
    {
        components.schemas = serde_json::from_value(schemas.clone())?;
    }
    Ok(doc)
}

/// YAML reads `openapi: 3.0` or `version: 1.0` as numbers.
fn stringify_versions(raw: &mut Value) {
    for pointer in ["/openapi", "/info/version"] {
        let number = match raw.pointer(pointer) {
            Some(Value::Number(n)) => n.to_string(),
            _ => continue,
        };
        if let Some(slot) = raw.pointer_mut(pointer) {
            *slot = Value::String(number);
        }
    }
}

/// Checks the structural invariants the tree builder relies on.
///
/// Returns every problem found; an empty vector means the document is
/// usable.
pub fn validate_document(doc: &ApiDocument) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !doc.openapi.trim().starts_with("3.") {
        errors.push(ValidationError::UnsupportedVersion(doc.openapi.clone()));
    }

    if doc.paths.is_empty() {
        warn!("document declares no paths");
    }

    for path in doc.paths.keys() {
        if !path.starts_with('/') {
            errors.push(ValidationError::RelativePath(path.clone()));
            continue;
        }
        for segment in split_path(path) {
            let opens = segment.matches('{').count();
            let closes = segment.matches('}').count();
            if opens != closes || opens > 1 {
                errors.push(ValidationError::UnbalancedBraces(path.clone()));
                break;
            }
            if segment == "{}" {
                errors.push(ValidationError::EmptyParameter(path.clone()));
                break;
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use restcmd_core::{HttpMethod, Operation, ParameterLocation};
    use std::io::Write;

    fn doc_with_path(path: &str) -> ApiDocument {
        let mut doc = ApiDocument::new("Test", "1.0");
        doc.add_operation(path, HttpMethod::Get, Operation::new("op"));
        doc
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("api.JSON")),
            Some(DocumentFormat::Json)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("api.yml")),
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("api.toml")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("api")), None);
    }

    #[test]
    fn test_validate_rejects_swagger_2() {
        let mut doc = doc_with_path("/pets");
        doc.openapi = "2.0".to_string();
        assert_eq!(
            validate_document(&doc),
            vec![ValidationError::UnsupportedVersion("2.0".to_string())]
        );
    }

    #[test]
    fn test_validate_path_shape() {
        assert_eq!(
            validate_document(&doc_with_path("pets")),
            vec![ValidationError::RelativePath("pets".to_string())]
        );
        assert_eq!(
            validate_document(&doc_with_path("/pets/{id")),
            vec![ValidationError::UnbalancedBraces("/pets/{id".to_string())]
        );
        assert_eq!(
            validate_document(&doc_with_path("/pets/{}")),
            vec![ValidationError::EmptyParameter("/pets/{}".to_string())]
        );
        assert!(validate_document(&doc_with_path("/pets/{id}/toys")).is_empty());
    }

    #[test]
    fn test_load_document_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"openapi":"3.1.0","info":{{"title":"T","version":"1"}},"paths":{{"/a":{{"get":{{}}}}}}}}"#
        )
        .unwrap();

        let doc = load_document(file.path()).unwrap();
        assert_eq!(doc.operation_count(), 1);
    }

    #[test]
    fn test_load_document_reports_invalid() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "openapi: '2.0'\npaths: {{}}").unwrap();

        let err = load_document(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Invalid(ref issues) if issues.len() == 1));
        assert!(err.to_string().contains("unsupported OpenAPI version"));
    }

    const WITH_REFS: &str = r#"
openapi: 3.0.3
info:
  title: Petstore
  version: 1.0
paths:
  /pets:
    get:
      operationId: listPets
      parameters:
        - $ref: '#/components/parameters/Limit'
    post:
      operationId: createPet
      requestBody:
        $ref: '#/components/requestBodies/NewPet'
components:
  parameters:
    Limit:
      name: limit
      in: query
      description: Page size
      schema:
        type: integer
  requestBodies:
    NewPet:
      required: true
      content:
        application/json:
          schema:
            $ref: '#/components/schemas/Pet'
  schemas:
    Pet:
      type: object
      properties:
        name:
          type: string
        owner:
          $ref: '#/components/schemas/Owner'
    Owner:
      type: object
      properties:
        name:
          type: string
"#;

    #[test]
    fn test_parse_resolves_parameter_ref() {
        let doc = parse_document(WITH_REFS, DocumentFormat::Yaml).unwrap();
        let get = doc.paths["/pets"].operation(HttpMethod::Get).unwrap();
        assert_eq!(get.parameters.len(), 1);
        assert_eq!(get.parameters[0].name, "limit");
        assert_eq!(get.parameters[0].location, ParameterLocation::Query);
        assert_eq!(get.parameters[0].description.as_deref(), Some("Page size"));
        assert_eq!(doc.info.version, "1.0");
    }

    #[test]
    fn test_parse_resolves_request_body_ref() {
        let doc = parse_document(WITH_REFS, DocumentFormat::Yaml).unwrap();
        let post = doc.paths["/pets"].operation(HttpMethod::Post).unwrap();
        let body = post.request_body.as_ref().unwrap();
        assert!(body.required);
        assert!(body.content.contains_key("application/json"));
    }

    #[test]
    fn test_parse_keeps_schema_refs_for_models() {
        let doc = parse_document(WITH_REFS, DocumentFormat::Yaml).unwrap();
        let pet = &doc.schemas().unwrap()["Pet"];
        assert_eq!(
            pet.pointer("/properties/owner/$ref").and_then(Value::as_str),
            Some("#/components/schemas/Owner")
        );
    }

    #[test]
    fn test_parse_json_parameter_ref() {
        let raw = r##"{
            "openapi": "3.1.0",
            "info": {"title": "T", "version": "1"},
            "paths": {"/a/{id}": {"get": {"parameters": [{"$ref": "#/components/parameters/Id"}]}}},
            "components": {"parameters": {"Id": {"name": "id", "in": "path", "required": true}}}
        }"##;
        let doc = parse_document(raw, DocumentFormat::Json).unwrap();
        let get = doc.paths["/a/{id}"].operation(HttpMethod::Get).unwrap();
        assert_eq!(get.parameters[0].name, "id");
        assert!(get.parameters[0].required);
    }

    #[test]
    fn test_load_document_unknown_extension() {
        let err = load_document("api.txt").unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_load_document_missing_file() {
        let err = load_document("/nonexistent/api.yaml").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
