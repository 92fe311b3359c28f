//! Integration tests for imitation-scss.
//!
//! These tests exercise the public API from outside the crate: whole documents
//! compiled against in-memory fixtures and, for the filesystem backend, real
//! temporary directories.

use std::fs;
use std::path::Path;

use imitation_scss::{
    compile_file, compile_str, CompileError, CompileOptions, Environment, FileSystem,
    MemoryResources, Value,
};
use pretty_assertions::assert_eq;

fn compile(source: &str) -> Result<imitation_scss::Compiled, CompileError> {
    compile_str(source, "index.scss", &MemoryResources::new(), &CompileOptions::new())
}

// ---------------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------------

#[test]
fn test_page_skeleton() {
    let out = compile(
        r#"
        // the page
        header#top {
            h1.title { content: "Hello & welcome"; }
            img[src="logo.png"][alt=logo];
        }
        main.content.wide {
            p { content: """
                A paragraph that
                spans lines.
            """; }
        }
        "#,
    )
    .unwrap();
    insta::assert_snapshot!(out.html, @r#"<header id="top"><h1 class="title">Hello &amp; welcome</h1><img src="logo.png" alt="logo"></header><main class="content wide"><p>A paragraph that spans lines.</p></main>"#);
    assert_eq!(out.css, "");
}

#[test]
fn test_default_tag_is_div() {
    assert_eq!(compile(".card{}").unwrap().html, r#"<div class="card"></div>"#);
}

#[test]
fn test_keyword_prefixes_are_plain_tag_names() {
    assert_eq!(compile("map { area; }").unwrap().html, "<map><area></map>");
    assert_eq!(compile("map.x {}").unwrap().html, r#"<map class="x"></map>"#);
    assert_eq!(compile("css .theme {}").unwrap().html, r#"<css class="theme"></css>"#);
    assert_eq!(compile("import {}").unwrap().html, "<import></import>");

    let err = compile("css p;").unwrap_err();
    let CompileError::Syntax(syntax) = &err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert_eq!(syntax.message, "tag name already set");
}

#[test]
fn test_leading_byte_order_mark() {
    assert_eq!(compile("\u{feff}p;").unwrap().html, "<p>");
}

#[test]
fn test_empty_document() {
    let out = compile("  \n// nothing\n").unwrap();
    assert_eq!(out, imitation_scss::Compiled::default());
}

// ---------------------------------------------------------------------------
// Raw CSS
// ---------------------------------------------------------------------------

#[test]
fn test_raw_css_is_collected_in_order() {
    let out = compile(
        "css {\n  body { margin : 0 }\n}\nmain;\ncss {\n  @media (max-width: 600px) {\n    main { padding: 1em 2em; }\n  }\n}\n",
    )
    .unwrap();
    assert_eq!(out.html, "<main>");
    insta::assert_snapshot!(out.css, @"body{margin:0}@media (max-width:600px){main{padding:1em 2em;}}");
}

// ---------------------------------------------------------------------------
// Loops
// ---------------------------------------------------------------------------

#[test]
fn test_each_over_numbers() {
    let resources = MemoryResources::new()
        .with_file(
            "index.scss",
            "ul { @each $n in import(\"n.json\") { li { content: \"#{$n}\"; } } }",
        )
        .with_file("n.json", "[1, 2, 3]");
    let out = compile_file("index.scss", &resources, &CompileOptions::new()).unwrap();
    assert_eq!(out.html, "<ul><li>1</li><li>2</li><li>3</li></ul>");
}

#[test]
fn test_each_with_initial_bindings() {
    let options = CompileOptions::new().with_variable(
        "$site",
        Value::map([(
            "links",
            Value::list([
                Value::map([("href", "/"), ("label", "Home")]),
                Value::map([("href", "/blog"), ("label", "Blog <new>")]),
            ]),
        )]),
    );
    let out = compile_str(
        "nav { @each $l in map.get($site, 'links') { a[href=\"#{map.get($l, 'href')}\"] { content: \"#{map.get($l, 'label')}\"; } } }",
        "index.scss",
        &MemoryResources::new(),
        &options,
    )
    .unwrap();
    insta::assert_snapshot!(out.html, @r#"<nav><a href="/">Home</a><a href="/blog">Blog &lt;new&gt;</a></nav>"#);
}

#[test]
fn test_destructuring_too_many_variables() {
    let resources = MemoryResources::new().with_file("d.yml", "[[a, b], [c]]");
    let err = compile_str(
        "@each $x, $y in import(\"d.yml\") { p; }",
        "index.scss",
        &resources,
        &CompileOptions::new(),
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::Range { variables: 2, minimum: 1 }));
}

#[test]
fn test_iterating_a_scalar() {
    let options = CompileOptions::new().with_variable("$page", Value::map([("title", "x")]));
    let err = compile_str(
        "@each $x in map.get($page, 'title') { p; }",
        "index.scss",
        &MemoryResources::new(),
        &options,
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::Type { .. }));
}

#[test]
fn test_non_scalar_mapping_keys() {
    let resources = MemoryResources::new().with_file("d.yml", "? [a, b]\n: 1\n");
    let err = compile_str(
        "@each $k, $v in import(\"d.yml\") { p; }",
        "index.scss",
        &resources,
        &CompileOptions::new(),
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::Type { .. }), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------------

fn site() -> MemoryResources {
    MemoryResources::new()
        .with_file(
            "site/index.scss",
            "@import \"partials/head.scss\";\nbody { @each $p in import(\"data/posts.yml\") { @import \"partials/post.scss\"; } }",
        )
        .with_file("site/partials/head.scss", "css { body { font: serif } }")
        .with_file(
            "site/partials/post.scss",
            "article.post-#{map.get($p, 'id')} { h2 { content: \"#{map.get($p, 'title')}\"; } }",
        )
        .with_file(
            "site/data/posts.yml",
            "- id: 1\n  title: First\n- id: 2\n  title: Second\n",
        )
}

#[test]
fn test_site_with_imports_and_loops() {
    let out = compile_file("site/index.scss", &site(), &CompileOptions::new()).unwrap();
    insta::assert_snapshot!(out.html, @r#"<body><article class="post-1"><h2>First</h2></article><article class="post-2"><h2>Second</h2></article></body>"#);
    assert_eq!(out.css, "body{font:serif}");
}

#[test]
fn test_markers_outside_loops_are_left_verbatim() {
    let out = compile_file("site/partials/post.scss", &site(), &CompileOptions::new()).unwrap();
    assert_eq!(
        out.html,
        r#"<article class="post-#{map.get($p, 'id')}"><h2>#{map.get($p, 'title')}</h2></article>"#
    );
}

#[test]
fn test_imported_marker_must_be_bound() {
    let resources = MemoryResources::new()
        .with_file("index.scss", "@each $x in map.get($rows, '0') { @import \"b.scss\"; }")
        .with_file("b.scss", "p { content: \"#{$nope}\"; }");
    let options = CompileOptions::new().with_variable("$rows", Value::list([Value::list(["x"])]));
    let err = compile_file("index.scss", &resources, &options).unwrap_err();
    assert!(matches!(err, CompileError::Reference { name } if name == "$nope"));
}

#[test]
fn test_import_cycle_is_reported() {
    let resources = MemoryResources::new()
        .with_file("a.scss", "@import \"sub/b.scss\";")
        .with_file("sub/b.scss", "@import \"../a.scss\";");
    let err = compile_file("a.scss", &resources, &CompileOptions::new()).unwrap_err();
    assert_eq!(err.to_string(), "import cycle: a.scss -> sub/b.scss -> a.scss");
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn test_syntax_error_message() {
    let err = compile("div {\n  span\n}").unwrap_err();
    let CompileError::Syntax(syntax) = &err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert_eq!(syntax.frame, "selector `span`");
    assert_eq!(
        err.to_string(),
        "index.scss: `}` before the statement is complete (found `}` \"}\" in selector `span`)"
    );
}

#[test]
fn test_lex_error_position() {
    let Err(CompileError::Lex(err)) = compile("p;\n  ~") else {
        panic!("expected a lex error");
    };
    assert_eq!((err.line, err.column), (2, 3));
}

#[test]
fn test_substituting_missing_variable() {
    let err = compile_str(
        "@each $x in map.get($list, '0') { p { content: \"#{$y}\"; } }",
        "index.scss",
        &MemoryResources::new(),
        &CompileOptions::new().with_variable("$list", Value::list([Value::list(["a"])])),
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::Reference { name } if name == "$y"));
}

#[test]
fn test_compilation_is_deterministic() {
    let resources = site();
    let first = compile_file("site/index.scss", &resources, &CompileOptions::new()).unwrap();
    let second = compile_file("site/index.scss", &resources, &CompileOptions::new()).unwrap();
    assert_eq!(first, second);
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

#[test]
fn test_file_system_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("parts")).unwrap();
    fs::write(
        root.join("index.scss"),
        "@import \"parts/list.scss\";\ncss { li { color: red } }\n",
    )
    .unwrap();
    fs::write(
        root.join("parts/list.scss"),
        "ol { @each $name, $age in import(\"../people.yaml\") { li[data-age=\"#{$age}\"] { content: \"#{$name}\"; } } }",
    )
    .unwrap();
    fs::write(root.join("people.yaml"), "ada: 36\nalan: 41\n").unwrap();

    let input = root.join("index.scss");
    let out = compile_file(&input, &FileSystem, &CompileOptions::new()).unwrap();
    assert_eq!(
        out.html,
        r#"<ol><li data-age="36">ada</li><li data-age="41">alan</li></ol>"#
    );
    assert_eq!(out.css, "li{color:red}");

    let page = out.html_document(Path::new("index.scss"));
    assert!(page.starts_with("<!DOCTYPE html><ol>"));
    assert!(page.ends_with("</ol>\n<!-- Generated from index.scss -->\n"));
}

#[test]
fn test_environment_is_not_mutated_by_loops() {
    let env = Environment::new();
    let options = CompileOptions::new().with_variables(env.clone());
    let resources = MemoryResources::new().with_file("d.yml", "[a]");
    compile_str(
        "@each $x in import(\"d.yml\") { p; }",
        "index.scss",
        &resources,
        &options,
    )
    .unwrap();
    assert!(options.variables.get("$x").is_none());
}
