// Integration tests for cfex-core over real files on disk
use cfex_core::error::{CfexError, DocumentError};
use cfex_core::{load, load_with_context, Environment, Value};
use std::fs;
use std::path::{Path, PathBuf};

fn write_doc(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let env = load(dir.path().join("absent.cfex")).unwrap().environment;
    assert!(env.is_empty());
}

#[test]
fn test_include_merges_bindings() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_doc(dir.path(), "base.cfex", "shared = 1\ncommon = base\n");
    let main = write_doc(
        dir.path(),
        "main.cfex",
        &format!("@include {}\nlocal = 2\n", base.display()),
    );

    let env = load(&main).unwrap().environment;
    assert_eq!(env["shared"], Value::Int(1));
    assert_eq!(env["common"], Value::String("base".to_string()));
    assert_eq!(env["local"], Value::Int(2));
}

#[test]
fn test_lines_after_include_win() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_doc(dir.path(), "base.cfex", "key = included\n");
    let main = write_doc(
        dir.path(),
        "main.cfex",
        &format!("key = before\n@include {}\nkey = after\n", base.display()),
    );

    let env = load(&main).unwrap().environment;
    // The include overwrote `before`; the later line overwrote the include.
    assert_eq!(env["key"], Value::String("after".to_string()));
}

#[test]
fn test_include_of_missing_path_is_soft() {
    let dir = tempfile::tempdir().unwrap();
    let main = write_doc(
        dir.path(),
        "main.cfex",
        &format!("a = 1\n@include {}\nb = 2\n", dir.path().join("nope.cfex").display()),
    );

    let env = load(&main).unwrap().environment;
    assert_eq!(env.len(), 2);
    assert_eq!(env["a"], Value::Int(1));
    assert_eq!(env["b"], Value::Int(2));
}

#[test]
fn test_include_path_through_link() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_doc(dir.path(), "base.cfex", "from_base = yes\n");
    let main = write_doc(
        dir.path(),
        "main.cfex",
        &format!("base_path = {}\n@include $base_path\n", base.display()),
    );

    let env = load(&main).unwrap().environment;
    assert_eq!(env["from_base"], Value::String("yes".to_string()));
}

#[test]
fn test_included_document_privates_are_cleaned() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_doc(
        dir.path(),
        "base.cfex",
        "__hidden = 1\nexposed = $__hidden\n",
    );
    let main = write_doc(
        dir.path(),
        "main.cfex",
        &format!("@include {}\n", base.display()),
    );

    let env = load(&main).unwrap().environment;
    assert_eq!(env["exposed"], Value::Int(1));
    assert!(!env.contains_key("__hidden"));
}

#[test]
fn test_nested_includes() {
    let dir = tempfile::tempdir().unwrap();
    let inner = write_doc(dir.path(), "inner.cfex", "depth = 2\n");
    let outer = write_doc(
        dir.path(),
        "outer.cfex",
        &format!("@include {}\nmiddle = 1\n", inner.display()),
    );
    let main = write_doc(
        dir.path(),
        "main.cfex",
        &format!("@include {}\ntop = 0\n", outer.display()),
    );

    let env = load(&main).unwrap().environment;
    assert_eq!(env["depth"], Value::Int(2));
    assert_eq!(env["middle"], Value::Int(1));
    assert_eq!(env["top"], Value::Int(0));
}

#[test]
fn test_circular_include_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let a_path = dir.path().join("a.cfex");
    let b_path = dir.path().join("b.cfex");
    fs::write(&a_path, format!("@include {}\n", b_path.display())).unwrap();
    fs::write(&b_path, format!("@include {}\n", a_path.display())).unwrap();

    let result = load(&a_path);
    assert!(matches!(
        result,
        Err(CfexError::Document(DocumentError::CircularInclude { .. }))
    ));
}

#[test]
fn test_self_include_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("selfie.cfex");
    fs::write(&path, format!("@include {}\n", path.display())).unwrap();

    let result = load(&path);
    assert!(matches!(
        result,
        Err(CfexError::Document(DocumentError::CircularInclude { .. }))
    ));
}

#[test]
fn test_seed_context_is_linkable() {
    let dir = tempfile::tempdir().unwrap();
    let main = write_doc(dir.path(), "main.cfex", "copy = $seeded\n");

    let mut context = Environment::new();
    context.insert("seeded".to_string(), Value::Int(9));

    let env = load_with_context(&main, context).unwrap().environment;
    assert_eq!(env["copy"], Value::Int(9));
    assert_eq!(env["seeded"], Value::Int(9));
}

#[test]
fn test_empty_document_discards_seed() {
    let dir = tempfile::tempdir().unwrap();
    let main = write_doc(dir.path(), "main.cfex", "");

    let mut context = Environment::new();
    context.insert("seeded".to_string(), Value::Int(9));

    let env = load_with_context(&main, context).unwrap().environment;
    assert!(env.is_empty());
}

#[test]
fn test_section_stays_open_across_include() {
    // An include directive does not close the current section.
    let dir = tempfile::tempdir().unwrap();
    let base = write_doc(dir.path(), "base.cfex", "merged = 1\n");
    let main = write_doc(
        dir.path(),
        "main.cfex",
        &format!("[server]\nhost = a\n@include {}\nport = 22\n", base.display()),
    );

    let env = load(&main).unwrap().environment;
    assert_eq!(env["merged"], Value::Int(1));
    let server = env["server"].as_map().unwrap();
    assert_eq!(server["host"], Value::String("a".to_string()));
    assert_eq!(server["port"], Value::Int(22));
}
