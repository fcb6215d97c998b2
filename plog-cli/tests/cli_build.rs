use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const CONFIG: &str = r#"
paths:
  docs: "docs"
  output: "pages/docs"
  assets: "assets/images/docs"
mappings:
  h1: head1
  p: paragraph
"#;

#[test]
fn build_renders_markdown_tree() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let docs = dir.path().join("docs");
    fs::create_dir_all(docs.join("guide"))?;
    fs::write(docs.join("index.md"), "# Welcome\n\nHello.\n")?;
    fs::write(docs.join("guide").join("setup.md"), "# Setup\n")?;
    fs::write(dir.path().join("plog.yml"), CONFIG)?;

    #[allow(deprecated)]
    Command::cargo_bin("plog")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rendered 2 documents"));

    let output = dir.path().join("pages").join("docs");
    let index = fs::read_to_string(output.join("index.vue"))?;
    assert!(index.contains(r#"<h1 id="welcome" class="head1">Welcome</h1>"#));
    assert!(index.contains(r#"<p class="paragraph">Hello.</p>"#));

    let setup = fs::read_to_string(output.join("guide").join("setup.vue"))?;
    assert!(setup.contains(r#""link":"/docs/guide/setup""#));
    assert!(dir.path().join("assets").join("images").join("docs").is_dir());
    Ok(())
}

#[test]
fn build_with_explicit_config_path() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let site = dir.path().join("site");
    fs::create_dir_all(site.join("docs"))?;
    fs::write(site.join("docs").join("a.md"), "text\n")?;
    fs::write(site.join("custom.yml"), CONFIG)?;

    #[allow(deprecated)]
    Command::cargo_bin("plog")?
        .current_dir(dir.path())
        .args(["--config", "site/custom.yml", "build"])
        .assert()
        .success();

    assert!(site.join("pages").join("docs").join("a.vue").is_file());
    Ok(())
}

#[test]
fn build_fails_without_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    #[allow(deprecated)]
    Command::cargo_bin("plog")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
    Ok(())
}

#[test]
fn build_reports_missing_image() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let docs = dir.path().join("docs");
    fs::create_dir_all(&docs)?;
    fs::write(docs.join("a.md"), "![x](./nope.png)\n")?;
    fs::write(dir.path().join("plog.yml"), CONFIG)?;

    #[allow(deprecated)]
    Command::cargo_bin("plog")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.png"));
    Ok(())
}

#[test]
fn invalid_mapping_is_rejected_at_load() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::create_dir_all(dir.path().join("docs"))?;
    fs::write(
        dir.path().join("plog.yml"),
        "paths:\n  docs: docs\n  output: out\n  assets: assets\nmappings:\n  h1: 'a\"b'\n",
    )?;

    #[allow(deprecated)]
    Command::cargo_bin("plog")?
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .failure();
    assert!(!dir.path().join("out").exists());
    Ok(())
}
