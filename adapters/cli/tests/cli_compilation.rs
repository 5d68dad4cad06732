use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "delve"])
        .status()
        .expect("failed to invoke cargo check for delve CLI binary");

    assert!(status.success(), "cargo check --bin delve should succeed");
}

#[test]
fn headless_session_prints_a_summary() {
    let output = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args([
            "run",
            "--quiet",
            "--bin",
            "delve",
            "--",
            "--seed",
            "7",
            "--ticks",
            "200",
            "--width",
            "40",
            "--height",
            "30",
        ])
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run delve CLI binary");

    assert!(output.status.success(), "delve should exit cleanly");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("depth "), "{stdout}");
    assert!(stdout.contains("explored"), "{stdout}");
}
