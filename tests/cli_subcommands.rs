use predicates::str::contains;

#[test]
fn show_config_prints_defaults() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("sim-timeline");
    cmd.arg("show-config");
    cmd.assert()
        .success()
        .stdout(contains("base_url = \"http://127.0.0.1:5000\""))
        .stdout(contains("request_timeout_ms = 10000"))
        .stdout(contains("max_rows_per_lane = 8"))
        .stdout(contains("interval_ms = 500"));
}

#[test]
fn show_config_reflects_overrides() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("sim-timeline");
    cmd.args(["--base-url", "http://10.0.0.2:5000/", "show-config"]);
    cmd.assert()
        .success()
        .stdout(contains("base_url = \"http://10.0.0.2:5000/\""));
}

#[test]
fn help_lists_subcommands() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("sim-timeline");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(contains("run"))
        .stdout(contains("watch"))
        .stdout(contains("layout"))
        .stdout(contains("restore"));
}

#[test]
fn missing_subcommand_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("sim-timeline");
    cmd.assert().code(1).stderr(contains("Error:"));
}
