use std::fs;
use std::path::Path;
use std::process::Command;

fn usacloud_update() -> Command {
    Command::new(env!("CARGO_BIN_EXE_usacloud-update"))
}

fn write_busy_script(dir: &Path, name: &str) {
    let mut content = String::from("#!/bin/bash\n");
    for i in 0..4 {
        content.push_str(&format!("usacloud server create --name web-{i}\n"));
    }
    for i in 0..2 {
        content.push_str(&format!("usacloud disk create --name data-{i}\n"));
    }
    fs::write(dir.join(name), content).unwrap();
}

fn scan_json(args: &[&str]) -> serde_json::Value {
    let output = usacloud_update()
        .arg("scan")
        .args(args)
        .arg("--json")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "scan failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn result_for<'a>(report: &'a serde_json::Value, name: &str) -> Option<&'a serde_json::Value> {
    report["results"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["path"].as_str().unwrap().ends_with(name))
}

#[test]
fn ranks_directory_contents() {
    let dir = tempfile::TempDir::new().unwrap();
    write_busy_script(dir.path(), "a.sh");
    fs::write(dir.path().join("b.sh"), "#!/bin/bash\necho hello\n").unwrap();
    fs::write(dir.path().join("c.txt"), "usacloud server list\n").unwrap();

    let report = scan_json(&[dir.path().to_str().unwrap()]);

    let a = result_for(&report, "a.sh").unwrap();
    assert_eq!(a["is_script"], true);
    assert!(a["command_count"].as_u64().unwrap() >= 6);
    let priority = a["priority"].as_str().unwrap();
    assert!(
        priority == "high" || priority == "critical",
        "got priority {priority}"
    );

    let b = result_for(&report, "b.sh").unwrap();
    assert_eq!(b["is_script"], false);

    // c.txt fails the extension filter and never appears.
    assert!(result_for(&report, "c.txt").is_none());

    assert_eq!(report["total_files"], 3);
    assert_eq!(report["detected_files"], 1);
}

#[test]
fn human_output_shows_detected_scripts_only() {
    let dir = tempfile::TempDir::new().unwrap();
    write_busy_script(dir.path(), "deploy.sh");
    fs::write(dir.path().join("noise.sh"), "#!/bin/bash\necho hi\n").unwrap();

    let output = usacloud_update()
        .args(["scan", dir.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("deploy.sh"), "stdout: {stdout}");
    assert!(!stdout.contains("noise.sh"), "stdout: {stdout}");
    assert!(stdout.contains("scanned 2 file(s)"), "stdout: {stdout}");
}

#[test]
fn excluded_directories_are_not_descended() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::create_dir(dir.path().join("node_modules")).unwrap();
    write_busy_script(&dir.path().join("node_modules"), "dep.sh");
    write_busy_script(dir.path(), "top.sh");

    let report = scan_json(&[dir.path().to_str().unwrap()]);
    assert!(result_for(&report, "top.sh").is_some());
    assert!(result_for(&report, "dep.sh").is_none());
}

#[test]
fn max_depth_flag_limits_recursion() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    write_busy_script(dir.path(), "top.sh");
    write_busy_script(&dir.path().join("sub"), "deep.sh");

    let report = scan_json(&[dir.path().to_str().unwrap(), "--max-depth", "0"]);
    assert!(result_for(&report, "top.sh").is_some());
    assert!(result_for(&report, "deep.sh").is_none());
}

#[test]
fn only_high_priority_flag_filters() {
    let dir = tempfile::TempDir::new().unwrap();
    write_busy_script(dir.path(), "busy.sh");
    fs::write(
        dir.path().join("light.sh"),
        "#!/bin/bash\nusacloud ipaddress read\n",
    )
    .unwrap();

    let report = scan_json(&[dir.path().to_str().unwrap(), "--only-high-priority"]);
    assert!(result_for(&report, "busy.sh").is_some());
    assert!(result_for(&report, "light.sh").is_none());
}

#[test]
fn exclude_glob_flag_drops_files() {
    let dir = tempfile::TempDir::new().unwrap();
    write_busy_script(dir.path(), "deploy.sh");
    write_busy_script(dir.path(), "deploy_test.sh");

    let report = scan_json(&[dir.path().to_str().unwrap(), "--exclude", "*_test.sh"]);
    assert!(result_for(&report, "deploy.sh").is_some());
    assert!(result_for(&report, "deploy_test.sh").is_none());
}

#[test]
fn sort_by_path_ascending() {
    let dir = tempfile::TempDir::new().unwrap();
    write_busy_script(dir.path(), "zz.sh");
    write_busy_script(dir.path(), "aa.sh");

    let report = scan_json(&[
        dir.path().to_str().unwrap(),
        "--sort",
        "path",
        "--order",
        "asc",
    ]);
    let results = report["results"].as_array().unwrap();
    assert!(results[0]["path"].as_str().unwrap().ends_with("aa.sh"));
    assert!(results[1]["path"].as_str().unwrap().ends_with("zz.sh"));
}

#[test]
fn statistics_summarize_the_scan() {
    let dir = tempfile::TempDir::new().unwrap();
    write_busy_script(dir.path(), "busy.sh");
    fs::write(
        dir.path().join("legacy.sh"),
        "#!/bin/bash\nusacloud iso-image list\nusacloud summary\n",
    )
    .unwrap();

    let report = scan_json(&[dir.path().to_str().unwrap()]);
    let stats = &report["statistics"];
    assert!(stats["total_commands"].as_u64().unwrap() >= 12);
    assert!(stats["deprecated_commands"].as_u64().unwrap() >= 2);
    assert!(stats["critical"].as_u64().unwrap() >= 1);
}

#[test]
fn missing_path_exits_two() {
    let output = usacloud_update()
        .args(["scan", "/nonexistent-usacloud-update-dir"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("[usacloud-update] error")
            && stderr.contains("/nonexistent-usacloud-update-dir"),
        "stderr: {stderr}"
    );
}

#[test]
fn single_file_path_is_scanned_directly() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("notes.txt");
    fs::write(&file, "usacloud server list\nusacloud disk list\n").unwrap();

    let report = scan_json(&[file.to_str().unwrap()]);
    let result = result_for(&report, "notes.txt").unwrap();
    assert!(result["command_count"].as_u64().unwrap() >= 2);
}

#[test]
fn worker_flag_does_not_change_ranking() {
    let dir = tempfile::TempDir::new().unwrap();
    for i in 0..6 {
        write_busy_script(dir.path(), &format!("script-{i}.sh"));
    }

    let serial = scan_json(&[dir.path().to_str().unwrap(), "--workers", "1"]);
    let parallel = scan_json(&[dir.path().to_str().unwrap(), "--workers", "4"]);

    let paths = |report: &serde_json::Value| -> Vec<String> {
        report["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["path"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(paths(&serial), paths(&parallel));
}
