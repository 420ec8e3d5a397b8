use assert_cmd::Command;

#[test]
fn openapi_prints_book_routes() {
    let output = Command::cargo_bin("bookshelf-cli")
        .unwrap()
        .arg("openapi")
        .output()
        .unwrap();

    assert!(output.status.success());
    let document: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(document["paths"]["/books"]["post"].is_object());
    assert!(document["paths"]["/books/{isbn}"]["delete"].is_object());
    assert!(document["components"]["schemas"]["ErrorResponse"].is_object());
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("bookshelf-cli")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .failure();
}
