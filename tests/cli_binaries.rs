// tests/cli_binaries.rs

use std::error::Error;
use std::time::Duration;

use assert_cmd::Command;
use el_listen::config::loader::{
    BUILTIN_DIR_ENV_VAR, CONFIG_ENV_VAR, PLUGIN_CACHE_ENV_VAR, USER_DIR_ENV_VAR,
    WATCH_BACKEND_ENV_VAR,
};
use el_listen::logging::LOG_ENV_VAR;
use el_listen_test_utils::fixtures::RegistryFixture;

type TestResult = Result<(), Box<dyn Error>>;

/// Prints its previous run count, starting at 0, and bumps a counter file in
/// the working directory.
const COUNTER: &str = "n=$(cat count 2>/dev/null || echo 0); echo $((n+1)) > count; echo $n";

/// A binary wired to the fixture's directories, with ambient config cleared.
fn bin(name: &str, fx: &RegistryFixture) -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin(name)?;
    cmd.env("HOME", fx.scratch())
        .env(USER_DIR_ENV_VAR, &fx.config.user_dir)
        .env(BUILTIN_DIR_ENV_VAR, &fx.config.builtin_dir)
        .env(PLUGIN_CACHE_ENV_VAR, &fx.config.discovered_root)
        .env_remove(CONFIG_ENV_VAR)
        .env_remove(WATCH_BACKEND_ENV_VAR)
        .env_remove(LOG_ENV_VAR)
        .timeout(Duration::from_secs(10));
    Ok(cmd)
}

#[test]
fn dispatch_runs_the_resolved_source_and_propagates_its_exit_code() -> TestResult {
    let fx = RegistryFixture::new();
    fx.builtin("echoer", r#"echo "got:$*"; exit 3"#);

    bin("dispatch", &fx)?
        .args(["echoer", "a", "--flag"])
        .assert()
        .code(3)
        .stdout("got:a --flag\n");

    Ok(())
}

#[test]
fn dispatch_unknown_source_lists_known_ones() -> TestResult {
    let fx = RegistryFixture::new();
    fx.builtin("heartbeat", "echo");
    fx.discovered("market", "friend", "slack-message", "echo");

    let out = bin("dispatch", &fx)?.arg("nope").assert().code(1).get_output().clone();

    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8(out.stderr)?;
    assert!(stderr.contains("unknown source: nope"), "{stderr}");
    assert!(stderr.contains("heartbeat"), "{stderr}");
    assert!(stderr.contains("slack-message"), "{stderr}");

    Ok(())
}

#[test]
fn dispatch_without_a_source_name_fails() -> TestResult {
    let fx = RegistryFixture::new();
    bin("dispatch", &fx)?.assert().code(1);
    Ok(())
}

#[test]
fn dispatch_register_which_unregister_round() -> TestResult {
    let fx = RegistryFixture::new();
    fx.builtin("ci", "echo builtin");
    let script = fx.script("ci.sh", "echo user");

    bin("dispatch", &fx)?
        .arg("register")
        .arg(&script)
        .assert()
        .success();

    let which = bin("dispatch", &fx)?.args(["which", "ci"]).assert().success();
    let line = String::from_utf8(which.get_output().stdout.clone())?;
    assert!(line.trim_end().ends_with("\tuser"), "{line}");

    bin("dispatch", &fx)?.arg("ci").assert().success().stdout("user\n");

    bin("dispatch", &fx)?
        .args(["unregister", "ci"])
        .assert()
        .success();
    bin("dispatch", &fx)?.arg("ci").assert().success().stdout("builtin\n");

    bin("dispatch", &fx)?
        .args(["unregister", "ci"])
        .assert()
        .code(1);

    Ok(())
}

#[test]
fn dispatch_list_json_marks_shadowed_entries() -> TestResult {
    let fx = RegistryFixture::new();
    fx.builtin("ci", "echo builtin");
    fx.discovered("market", "friend", "ci", "echo discovered");

    let out = bin("dispatch", &fx)?
        .args(["list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let entries: serde_json::Value = serde_json::from_slice(&out)?;
    let entries = entries.as_array().ok_or("expected array")?;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["name"], "ci");
    assert_eq!(entries[0]["tier"], "builtin");
    assert_eq!(entries[0]["shadowed"], false);
    assert_eq!(entries[1]["tier"], "discovered");
    assert_eq!(entries[1]["shadowed"], true);

    Ok(())
}

#[test]
fn file_change_poll_backend_refuses_globs() -> TestResult {
    let fx = RegistryFixture::new();
    let root = tempfile::tempdir()?;

    let out = bin("file-change", &fx)?
        .current_dir(root.path())
        .args(["--backend", "poll", "**/*.md"])
        .assert()
        .code(1)
        .get_output()
        .clone();

    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8(out.stderr)?;
    assert!(stderr.contains("hint"), "{stderr}");

    Ok(())
}

#[test]
fn file_change_requires_a_target_and_an_existing_file() -> TestResult {
    let fx = RegistryFixture::new();
    let root = tempfile::tempdir()?;

    bin("file-change", &fx)?.current_dir(root.path()).assert().code(1);
    bin("file-change", &fx)?
        .current_dir(root.path())
        .arg("missing.txt")
        .assert()
        .code(1)
        .stdout("");

    Ok(())
}

#[test]
fn heartbeat_requires_interval_and_commands() -> TestResult {
    let fx = RegistryFixture::new();
    bin("heartbeat", &fx)?.assert().code(1);
    bin("heartbeat", &fx)?.arg("1").assert().code(1);
    bin("heartbeat", &fx)?.args(["soon", "echo", "x"]).assert().code(1);
    Ok(())
}

#[test]
fn command_help_points_at_the_shell_wrapper() -> TestResult {
    let fx = RegistryFixture::new();

    for name in ["heartbeat", "poll"] {
        let out = bin(name, &fx)?.arg("--help").assert().success().get_output().clone();
        let help = String::from_utf8(out.stdout)?;
        assert!(help.contains("sh -c"), "{name}: {help}");
        assert!(help.contains("literal `--`"), "{name}: {help}");
    }

    Ok(())
}

#[test]
fn heartbeat_prints_one_json_report() -> TestResult {
    let fx = RegistryFixture::new();
    let work = tempfile::tempdir()?;

    let out = bin("heartbeat", &fx)?
        .current_dir(work.path())
        .args(["0.05", "sh", "-c", COUNTER, "--", "echo", "ok"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(out)?;
    assert_eq!(text.lines().count(), 1, "{text}");

    let report: serde_json::Value = serde_json::from_str(&text)?;
    assert_eq!(report["changed"], serde_json::json!(["cmd_0"]));
    assert_eq!(report["results"]["cmd_0"]["old"], "0");
    assert_eq!(report["results"]["cmd_0"]["new"], "1");
    assert_eq!(report["results"]["cmd_1"]["old"], "ok");
    assert_eq!(report["results"]["cmd_1"]["new"], "ok");

    let ts = report["timestamp"].as_str().ok_or("timestamp")?;
    chrono::DateTime::parse_from_rfc3339(ts)?;
    assert!(ts.ends_with('Z'));

    Ok(())
}

#[test]
fn poll_prints_the_new_output() -> TestResult {
    let fx = RegistryFixture::new();
    let work = tempfile::tempdir()?;

    bin("poll", &fx)?
        .current_dir(work.path())
        .args(["0.05", "sh", "-c", COUNTER])
        .assert()
        .success()
        .stdout("1\n");

    Ok(())
}
