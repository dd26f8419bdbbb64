use assert_cmd::Command;

fn exporter() -> Command {
    let mut cmd = Command::cargo_bin("entity-exporter").unwrap();
    // keep the host environment from leaking into flag defaults
    for var in [
        "ENTITY_EXPORTER_ORGS",
        "ENTITY_EXPORTER_WEB_PATH",
        "ENTITY_EXPORTER_COLLECTOR_ORG",
        "ENTITY_EXPORTER_REQUEST_TIMEOUT_MS",
        "ENTITY_EXPORTER_API_URL",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn list_metrics_prints_catalog() {
    let output = exporter().arg("--list-metrics").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 11);
    assert!(lines[0].starts_with("entity_public_repos\tgauge\tname\t"));
    assert!(lines[10].starts_with("entity_updated_timestamp\tgauge\tname\t"));
}

#[test]
fn missing_orgs_fails_startup() {
    let output = exporter().output().unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("no orgs are configured"), "stderr: {stderr}");
}

#[test]
fn invalid_web_path_fails_startup() {
    exporter()
        .args(["--orgs", "acme", "--web-path", "metrics"])
        .assert()
        .failure();
}

#[test]
fn version_flag() {
    exporter().arg("--version").assert().success();
}

#[test]
fn list_metrics_ignores_api_url() {
    let output = exporter()
        .args(["--list-metrics", "--api-url", "not a url"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap().lines().count(), 11);
}

#[test]
fn invalid_api_url_fails_startup() {
    let output = exporter()
        .args(["--orgs", "acme", "--api-url", "not a url"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("failed to build API client"), "stderr: {stderr}");
}
