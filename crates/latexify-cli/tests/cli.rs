//! Runs the `latexify` binary against shell-script stand-ins for the TeX tools.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Output};

const FAKE_LATEX: &str = r#"#!/bin/sh
tex="$3"
job="${tex%.tex}"
echo "This is pdfTeX, Version 3.141592653"
if grep -q 'fracc' "$tex"; then
    printf '! Undefined control sequence.\nl.3 $\\fracc\n' > "$job.log"
    exit 1
fi
printf 'dvi' > "$job.dvi"
"#;

const FAKE_DVIPNG: &str = r#"#!/bin/sh
echo "This is dvipng 1.15"
cp "@PNG@" "$9"
"#;

fn install_tools(bin: &Path) {
    let png = bin.join("fixture.png");
    image::RgbaImage::new(10, 6).save(&png).unwrap();
    for (name, script) in [("latex", FAKE_LATEX), ("dvipng", FAKE_DVIPNG)] {
        let path = bin.join(name);
        fs::write(&path, script.replace("@PNG@", png.to_str().unwrap())).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}

fn latexify(bin: &Path, work: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_latexify"))
        .args(args)
        .current_dir(work)
        .env("PATH", format!("{}:/usr/bin:/bin", bin.display()))
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_verbose_json_keeps_stdout_for_the_report() {
    let bin = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    install_tools(bin.path());

    let out = latexify(
        bin.path(),
        work.path(),
        &["--verbose", "--json", "--tempDir", work.path().to_str().unwrap(), "a+b"],
    );

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["width"], 10);
    assert_eq!(report["dpi"], 120);

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("latex output"), "{stderr}");
    assert!(stderr.contains("This is pdfTeX"), "{stderr}");
    assert!(stderr.contains("dvipng output"), "{stderr}");
}

#[test]
fn test_failed_run_with_keep_temp_prints_directory() {
    let bin = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let scratch_root = tempfile::tempdir().unwrap();
    install_tools(bin.path());

    let out = latexify(
        bin.path(),
        work.path(),
        &[
            "--keep-temp",
            "--tempDir",
            scratch_root.path().to_str().unwrap(),
            r"\fracc{1}{2}",
        ],
    );

    assert_eq!(out.status.code(), Some(4));
    let kept = fs::read_dir(scratch_root.path())
        .unwrap()
        .next()
        .expect("kept directory")
        .unwrap()
        .path();
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Error! "), "{stderr}");
    assert!(stderr.contains(&kept.display().to_string()), "{stderr}");
    assert!(stderr.contains("Undefined control sequence"), "{stderr}");
}
