use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::tempdir;

fn import(store: &Path, input: &Path) {
    Command::cargo_bin("contact-vault")
        .expect("binary exists")
        .args([
            "import",
            "-i",
            input.to_str().unwrap(),
            "-s",
            store.to_str().unwrap(),
        ])
        .assert()
        .success();
}

fn write_input(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write input file");
    path
}

fn search(store: &Path, extra: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("contact-vault").expect("binary exists");
    cmd.args(extra);
    cmd.args(["-s", store.to_str().unwrap()]);
    cmd
}

#[test]
fn phone_query_hits_only_the_phone_field() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("store");
    let input = write_input(
        dir.path(),
        "dump.csv",
        "tel;фио;tg;mail\n555123;Анна;@anna;a@x.com\n777;Борис555123;@boris;b@x.com\n",
    );
    import(&store, &input);

    search(&store, &["search", "555123"])
        .assert()
        .success()
        .stdout(contains("File: dump.csv"))
        .stdout(contains("phone: 555123"))
        .stdout(contains("name: Анна"))
        .stdout(contains("Борис").not());
}

#[test]
fn mixed_query_falls_back_to_whole_row_matching() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("store");
    let input = write_input(
        dir.path(),
        "dump.csv",
        "tel;фио;tg;mail\n555;Анна;@anna7x;a@x.com\n",
    );
    import(&store, &input);

    // "7x" is neither digits-only nor letters-only, so every field is tried.
    search(&store, &["search", "7x"])
        .assert()
        .success()
        .stdout(contains("handle: @anna7x"));
}

#[test]
fn empty_fields_show_the_missing_placeholder() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("store");
    let input = write_input(dir.path(), "dump.csv", "tel;фио\n555;Анна\n");
    import(&store, &input);

    search(&store, &["search", "555"])
        .assert()
        .success()
        .stdout(contains("handle: missing"))
        .stdout(contains("email: missing"));
}

#[test]
fn pagination_slices_and_signals_the_end() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("store");
    let rows: String = (0..5)
        .map(|i| format!("555000{i};Анна;@anna{i};a{i}@x.com\n"))
        .collect();
    let input = write_input(dir.path(), "dump.csv", &rows);
    import(&store, &input);

    search(&store, &["search", "555", "--page-size", "2", "--page", "1"])
        .assert()
        .success()
        .stdout(contains("5550002"))
        .stdout(contains("5550003"))
        .stdout(contains("more available"));

    search(&store, &["search", "555", "--page-size", "2", "--page", "2"])
        .assert()
        .success()
        .stdout(contains("5550004"))
        .stdout(contains("no more results"));

    search(&store, &["search", "555", "--page-size", "2", "--page", "7"])
        .assert()
        .success()
        .stdout(contains("no more results"));

    search(&store, &["search", "555", "--all"])
        .assert()
        .success()
        .stdout(contains("5 result(s)"));
}

#[test]
fn one_unreadable_file_does_not_stop_the_scan() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("store");
    let input = write_input(dir.path(), "a.csv", "555;Анна;@anna;a@x.com\n");
    import(&store, &input);
    let input = write_input(dir.path(), "z.csv", "555;Мария;@masha;m@x.com\n");
    import(&store, &input);
    // A directory with a .csv name enumerates but cannot be read.
    fs::create_dir(store.join("bad.csv")).expect("create bad entry");

    search(&store, &["search", "555"])
        .assert()
        .success()
        .stdout(contains("File: a.csv"))
        .stdout(contains("read error: bad.csv"))
        .stdout(contains("File: z.csv"));
}

#[test]
fn no_results_is_reported_as_such() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("store");
    let input = write_input(dir.path(), "dump.csv", "555;Анна;@anna;a@x.com\n");
    import(&store, &input);

    search(&store, &["search", "999999"])
        .assert()
        .success()
        .stdout(contains("no results"));
}

#[test]
fn blank_query_is_rejected() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("store");
    fs::create_dir_all(&store).expect("store dir");

    search(&store, &["search", "   "])
        .assert()
        .failure()
        .stderr(contains("query is empty"));
}
