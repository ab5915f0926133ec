//! End-to-end generation from a fixture document.

use std::path::{Path, PathBuf};

use restcmd_codegen::{
    GenerationManifest, Generator, GeneratorConfig, MANIFEST_PATH, load_document,
};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/petstore.yaml")
}

fn read(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel)).unwrap_or_else(|e| panic!("{rel}: {e}"))
}

#[test]
fn generates_command_tree_mirror() {
    let doc = load_document(fixture()).unwrap();
    let out = tempfile::tempdir().unwrap();
    let generator = Generator::new(GeneratorConfig::new(out.path(), "petstore"));

    let result = generator.generate(&doc).unwrap();
    assert_eq!(result.root_usage, "swagger-petstore");

    for rel in [
        "src/cmd.rs",
        "src/cmd/pets.rs",
        "src/cmd/pets/petid.rs",
        "src/cmd/store.rs",
        "src/cmd/store/type_cmd.rs",
        "src/common.rs",
        "src/config/mod.rs",
        "src/config/command.rs",
        "src/config/request.rs",
        "src/config/method.rs",
        "src/config/extension.rs",
        "src/service/mod.rs",
        "src/app.rs",
        "src/lib.rs",
        MANIFEST_PATH,
    ] {
        assert!(out.path().join(rel).exists(), "missing {rel}");
    }

    assert!(!out.path().join("Cargo.toml").exists());
    assert!(!out.path().join("src/main.rs").exists());
    assert!(!out.path().join("src/model/mod.rs").exists());

    let root = read(out.path(), "src/cmd.rs");
    assert!(root.contains("pub mod pets;\npub mod store;\n"));

    let store = read(out.path(), "src/cmd/store.rs");
    assert!(store.contains("pub mod type_cmd;"));

    let pet = read(out.path(), "src/cmd/pets/petid.rs");
    assert!(pet.contains("methods: &[Method::Get, Method::Delete],"));
    assert!(pet.contains("Removes the pet \\\"permanently\\\""));
    assert!(pet.contains(".help(\"The id of the pet to retrieve\")"));

    let pets = read(out.path(), "src/cmd/pets.rs");
    assert!(pets.contains("query: &[(\"limit\", false)],"));
    assert!(pets.contains("accepts_body: true,"));

    let config = read(out.path(), "src/config/mod.rs");
    assert!(config.contains("\"https://petstore.example.com/v1\""));
}

#[test]
fn entry_point_and_model_are_optional_extras() {
    let doc = load_document(fixture()).unwrap();
    let out = tempfile::tempdir().unwrap();
    let config = GeneratorConfig::new(out.path(), "petstore")
        .with_command_name("petctl")
        .with_server_url("http://localhost:4010")
        .with_model(true)
        .with_entry_point(true);

    let result = Generator::new(config).generate(&doc).unwrap();
    assert_eq!(result.root_usage, "petctl");

    let manifest = read(out.path(), "Cargo.toml");
    assert!(manifest.contains("name = \"petctl\""));
    assert!(read(out.path(), "src/main.rs").contains("petstore::app::run()"));
    assert!(read(out.path(), "src/lib.rs").contains("pub mod model;"));

    let model = read(out.path(), "src/model/mod.rs");
    assert!(model.contains("pub struct Pet {"));
    assert!(model.contains("pub type Pets = Vec<Pet>;"));

    let config = read(out.path(), "src/config/mod.rs");
    assert!(config.contains("\"http://localhost:4010\""));
}

#[test]
fn manifest_matches_written_files() {
    let doc = load_document(fixture()).unwrap();
    let out = tempfile::tempdir().unwrap();
    let result = Generator::new(GeneratorConfig::new(out.path(), "petstore"))
        .generate(&doc)
        .unwrap();

    let manifest = GenerationManifest::load(out.path()).unwrap();
    assert_eq!(manifest.len(), result.files.len());
    assert_eq!(manifest.root_usage, "swagger-petstore");
    assert!(manifest.modified_files(out.path()).is_empty());
}

#[test]
fn generation_is_deterministic() {
    let doc = load_document(fixture()).unwrap();
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    let a = Generator::new(GeneratorConfig::new(first.path(), "petstore"))
        .generate(&doc)
        .unwrap();
    let b = Generator::new(GeneratorConfig::new(second.path(), "petstore"))
        .generate(&doc)
        .unwrap();

    assert_eq!(a.files, b.files);
    for (rel, entry) in &a.manifest.files {
        assert_eq!(b.manifest.files[rel].checksum, entry.checksum, "{rel}");
    }
}
