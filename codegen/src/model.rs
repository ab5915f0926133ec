//! Data model generation from component schemas.
//!
//! The emitter only decides whether and where models are written; the
//! translation itself sits behind [`ModelGenerator`] so that other
//! strategies can be plugged in.

use std::collections::{BTreeMap, BTreeSet};

use restcmd_core::ApiDocument;
use restcmd_core::naming::{capitalize_first, is_reserved};
use serde_json::Value;
use tracing::debug;

use crate::error::{CodegenError, Result};

/// Turns a document's component schemas into Rust source.
pub trait ModelGenerator {
    /// Returns the full contents of the model module.
    fn generate(&self, doc: &ApiDocument) -> Result<String>;
}

/// Emits one serde-derived type per component schema.
///
/// - objects with `properties` become structs (optional fields wrapped in
///   `Option` and skipped when `None`)
/// - string `enum`s become unit enums
/// - everything else becomes an alias of the mapped type
///
/// A field that refers back to its own type, directly or through other
/// schemas, is boxed so the generated types have a known size.
///
/// # Examples
///
/// ```
/// use restcmd_codegen::{ModelGenerator, SerdeModelGenerator};
/// use restcmd_core::{ApiDocument, Components};
///
/// let mut doc = ApiDocument::new("Petstore", "1.0.0");
/// let mut components = Components::default();
/// components.schemas.insert(
///     "Pet".to_string(),
///     serde_json::json!({
///         "type": "object",
///         "required": ["name"],
///         "properties": {
///             "name": {"type": "string"},
///             "age": {"type": "integer", "format": "int32"}
///         }
///     }),
/// );
/// doc.components = Some(components);
///
/// let source = SerdeModelGenerator.generate(&doc).unwrap();
/// assert!(source.contains("pub struct Pet {"));
/// assert!(source.contains("pub name: String,"));
/// assert!(source.contains("pub age: Option<i32>,"));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeModelGenerator;

impl ModelGenerator for SerdeModelGenerator {
    fn generate(&self, doc: &ApiDocument) -> Result<String> {
        let empty = BTreeMap::new();
        let schemas = doc.schemas().unwrap_or(&empty);

        let mut out = String::new();
        out.push_str("//! Data types generated from component schemas. Do not edit.\n\n");
        out.push_str("#![allow(dead_code)]\n\n");
        out.push_str("use serde::{Deserialize, Serialize};\n");

        let graph = reference_graph(schemas);
        for (name, schema) in schemas {
            let type_name = type_ident(name);
            if type_name.is_empty() {
                return Err(CodegenError::Model(format!(
                    "schema name {name:?} has no usable characters"
                )));
            }
            out.push('\n');
            render_schema(&mut out, name, &type_name, schema, &graph);
        }

        debug!(types = schemas.len(), "generated model types");
        Ok(out)
    }
}

fn render_schema(
    out: &mut String,
    name: &str,
    type_name: &str,
    schema: &Value,
    graph: &RefGraph<'_>,
) {
    if let Some(desc) = schema.get("description").and_then(Value::as_str) {
        for line in desc.lines() {
            out.push_str(&format!("/// {line}\n"));
        }
    }

    if let Some(variants) = string_enum(schema) {
        out.push_str("#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]\n");
        out.push_str(&format!("pub enum {type_name} {{\n"));
        for variant in variants {
            let ident = type_ident(variant);
            let ident = if ident.is_empty() { "Empty".to_string() } else { ident };
            out.push_str(&format!("    #[serde(rename = {variant:?})]\n"));
            out.push_str(&format!("    {ident},\n"));
        }
        out.push_str("}\n");
        return;
    }

    let properties = schema.get("properties").and_then(Value::as_object);
    match properties {
        Some(props) if !props.is_empty() => {
            let required: Vec<&str> = schema
                .get("required")
                .and_then(Value::as_array)
                .map(|r| r.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();

            out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
            out.push_str(&format!("pub struct {type_name} {{\n"));
            for (prop, prop_schema) in props {
                let field = field_ident(prop);
                let mut ty = field_type(prop_schema, name, graph);
                if field != *prop {
                    out.push_str(&format!("    #[serde(rename = {prop:?})]\n"));
                }
                if !required.contains(&prop.as_str()) {
                    out.push_str(
                        "    #[serde(default, skip_serializing_if = \"Option::is_none\")]\n",
                    );
                    ty = format!("Option<{ty}>");
                }
                out.push_str(&format!("    pub {field}: {ty},\n"));
            }
            out.push_str("}\n");
        }
        _ => {
            out.push_str(&format!("pub type {type_name} = {};\n", rust_type(schema)));
        }
    }
}

fn string_enum(schema: &Value) -> Option<Vec<&str>> {
    let values = schema.get("enum")?.as_array()?;
    let strings: Vec<&str> = values.iter().filter_map(Value::as_str).collect();
    if strings.is_empty() || strings.len() != values.len() {
        return None;
    }
    Some(strings)
}

/// Schema name to the schema names it refers to at any depth.
type RefGraph<'a> = BTreeMap<&'a str, BTreeSet<&'a str>>;

fn reference_graph(schemas: &BTreeMap<String, Value>) -> RefGraph<'_> {
    schemas
        .iter()
        .map(|(name, schema)| {
            let mut refs = BTreeSet::new();
            collect_refs(schema, &mut refs);
            (name.as_str(), refs)
        })
        .collect()
}

fn collect_refs<'a>(value: &'a Value, out: &mut BTreeSet<&'a str>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                if key == "$ref" {
                    if let Some(target) = inner.as_str().and_then(ref_target) {
                        out.insert(target);
                    }
                } else {
                    collect_refs(inner, out);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, out)),
        _ => {}
    }
}

/// Whether `to` can be reached from `from`; every schema reaches itself.
fn reaches(graph: &RefGraph<'_>, from: &str, to: &str) -> bool {
    let mut seen = BTreeSet::new();
    let mut stack = vec![from];
    while let Some(current) = stack.pop() {
        if current == to {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        if let Some(next) = graph.get(current) {
            stack.extend(next.iter().copied());
        }
    }
    false
}

fn ref_target(reference: &str) -> Option<&str> {
    reference.rsplit('/').next().filter(|name| !name.is_empty())
}

/// Type of a struct field; direct references back into `owner` are boxed.
fn field_type(schema: &Value, owner: &str, graph: &RefGraph<'_>) -> String {
    let target = schema
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(ref_target);
    match target {
        Some(target) if reaches(graph, target, owner) => format!("Box<{}>", type_ident(target)),
        _ => rust_type(schema),
    }
}

/// Maps a JSON schema to a Rust type expression.
fn rust_type(schema: &Value) -> String {
    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        let target = ref_target(reference).unwrap_or(reference);
        return type_ident(target);
    }

    let format = schema.get("format").and_then(Value::as_str);
    match schema.get("type").and_then(Value::as_str) {
        Some("string") => "String".to_string(),
        Some("integer") => match format {
            Some("int32") => "i32".to_string(),
            _ => "i64".to_string(),
        },
        Some("number") => match format {
            Some("float") => "f32".to_string(),
            _ => "f64".to_string(),
        },
        Some("boolean") => "bool".to_string(),
        Some("array") => {
            let item = schema
                .get("items")
                .map(rust_type)
                .unwrap_or_else(|| "serde_json::Value".to_string());
            format!("Vec<{item}>")
        }
        Some("object") => match schema.get("additionalProperties") {
            Some(extra) if extra.is_object() => {
                format!("std::collections::BTreeMap<String, {}>", rust_type(extra))
            }
            _ => "serde_json::Value".to_string(),
        },
        _ => "serde_json::Value".to_string(),
    }
}

/// `pet_owner`, `pet-owner` and `pet owner` all become `PetOwner`.
fn type_ident(name: &str) -> String {
    let ident: String = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(capitalize_first)
        .collect();
    match ident.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("T{ident}"),
        _ => ident,
    }
}

/// `petName` becomes `pet_name`; keywords become raw identifiers.
fn field_ident(name: &str) -> String {
    let mut field = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                field.push('_');
            }
            field.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if c.is_ascii_alphanumeric() {
            field.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        } else {
            if !field.is_empty() && !field.ends_with('_') {
                field.push('_');
            }
            prev_lower = false;
        }
    }
    let field = field.trim_end_matches('_').to_string();
    if field.is_empty() {
        return "value".to_string();
    }
    if field.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("f_{field}");
    }
    match field.as_str() {
        "self" | "super" | "crate" => format!("{field}_"),
        name if is_keyword(name) => format!("r#{field}"),
        _ => field,
    }
}

fn is_keyword(name: &str) -> bool {
    const LAYOUT: &[&str] = &["main", "cmd", "config", "common", "app", "service", "model", "lib"];
    is_reserved(name) && !LAYOUT.contains(&name)
}
