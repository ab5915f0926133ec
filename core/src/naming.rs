//! Naming rules for generated identifiers.
//!
//! Every name derived from a path segment goes through these functions so
//! that the same input always yields the same identifiers.

/// Base name of the root command module.
pub const ROOT_IDENTIFIER: &str = "cmd";

/// Suffix appended to identifiers that collide with [`RESERVED_IDENTIFIERS`].
pub const RESERVED_SUFFIX: &str = "_cmd";

/// Names that cannot be used as a standalone module identifier.
///
/// Rust keywords (strict, reserved and weak) plus the module names used by
/// the generated project layout.
pub const RESERVED_IDENTIFIERS: &[&str] = &[
    // strict
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
    // reserved
    "abstract", "become", "box", "do", "final", "gen", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
    // weak
    "union", "macro_rules",
    // layout
    "main", "cmd", "config", "common", "app", "service", "model", "lib",
];

/// Returns `true` if `name` is reserved.
///
/// # Examples
///
/// ```
/// use restcmd_core::naming::is_reserved;
///
/// assert!(is_reserved("type"));
/// assert!(is_reserved("config"));
/// assert!(!is_reserved("pets"));
/// ```
pub fn is_reserved(name: &str) -> bool {
    RESERVED_IDENTIFIERS.contains(&name)
}

/// Converts a raw segment (already stripped of `{}`) into an identifier.
///
/// Lower-cases, replaces `-` with `_`, and suffixes reserved names.
///
/// # Examples
///
/// ```
/// use restcmd_core::naming::segment_identifier;
///
/// assert_eq!(segment_identifier("Pet-Owners"), "pet_owners");
/// assert_eq!(segment_identifier("type"), "type_cmd");
/// ```
pub fn segment_identifier(raw: &str) -> String {
    let name = raw.to_lowercase().replace('-', "_");
    if name.is_empty() {
        tracing::warn!("empty identifier derived from path segment");
    }
    if is_reserved(&name) {
        format!("{name}{RESERVED_SUFFIX}")
    } else {
        name
    }
}

/// Replaces backticks with double quotes.
///
/// Generated sources embed descriptions in string literals and doc
/// comments; backticks in descriptions are swapped before rendering.
pub fn remove_backticks(s: &str) -> String {
    s.replace('`', "\"")
}

/// Upper-cases the first character only.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Replaces `-` and spaces with `_`.
pub fn code_string(s: &str) -> String {
    s.replace(['-', ' '], "_")
}

/// Normalizes a free-form title into a kebab-case program name.
///
/// # Examples
///
/// ```
/// use restcmd_core::naming::program_name;
///
/// assert_eq!(program_name("Swagger Petstore"), "swagger-petstore");
/// assert_eq!(program_name("  My  API (v2) "), "my-api-v2");
/// ```
pub fn program_name(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
        } else if !result.is_empty() && !result.ends_with('-') {
            result.push('-');
        }
    }
    while result.ends_with('-') {
        result.pop();
    }
    result
}
