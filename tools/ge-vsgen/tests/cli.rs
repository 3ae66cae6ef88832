#![cfg(not(target_arch = "wasm32"))]

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn ge_vsgen() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ge-vsgen"))
}

fn state_file(json: &str) -> tempfile::NamedTempFile {
    let mut tmp = tempfile::NamedTempFile::new().expect("tempfile");
    tmp.write_all(json.as_bytes()).expect("write state");
    tmp
}

const LIT_STATE: &str = r#"{
    "vertex_type": 96,
    "enabled": "LIGHTS | LIGHT0",
    "lights": [
        { "computation": "both", "light_type": "point" },
        {}, {}, {}
    ],
    "use_hardware_transform": true
}"#;

#[test]
fn key_prints_hex_and_features() {
    let state = state_file(LIT_STATE);
    ge_vsgen()
        .arg("key")
        .arg("--state")
        .arg(state.path())
        .arg("--decode")
        .assert()
        .success()
        .stdout(predicate::str::is_match("^[0-9a-f]{32}\n").unwrap())
        .stdout(predicate::str::contains("light_type: Point"));
}

#[test]
fn gen_from_state_matches_gen_from_key() {
    let state = state_file(LIT_STATE);
    let key_output = ge_vsgen()
        .arg("key")
        .arg("--state")
        .arg(state.path())
        .output()
        .expect("run ge-vsgen key");
    assert!(key_output.status.success());
    let key = String::from_utf8(key_output.stdout).unwrap();
    let key = key.trim();

    let from_state = ge_vsgen()
        .args(["gen", "--gles"])
        .arg("--state")
        .arg(state.path())
        .output()
        .expect("run ge-vsgen gen --state");
    let from_key = ge_vsgen()
        .args(["gen", "--gles", "--key", key])
        .output()
        .expect("run ge-vsgen gen --key");
    assert!(from_state.status.success());
    assert_eq!(from_state.stdout, from_key.stdout);

    let source = String::from_utf8(from_key.stdout).unwrap();
    assert!(source.starts_with("#version 100\n"), "{source}");
    assert!(source.contains("toLight = u_lightpos0 - worldpos;"));
}

#[test]
fn primitive_gate_selects_software_path() {
    // Not through-mode, so the gate refuses the hardware path.
    let state = state_file(LIT_STATE);
    ge_vsgen()
        .args(["gen", "--primitive", "3"])
        .arg("--state")
        .arg(state.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("in vec4 position;"))
        .stdout(predicate::str::contains("u_world").not());
}

#[test]
fn gl_version_selects_profile() {
    ge_vsgen()
        .args(["gen", "--key", "0", "--gl-version", "2.1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("#version 110\n"))
        .stdout(predicate::str::contains("attribute vec4 position;"));

    ge_vsgen()
        .args(["gen", "--key", "0", "--gl-version", "three"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("MAJOR.MINOR"));
}

#[test]
fn decode_rejects_reserved_bits() {
    ge_vsgen()
        .args(["decode", "--key", "0x80"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reserved bits"));
}

#[test]
fn gen_requires_a_key_source() {
    ge_vsgen().arg("gen").assert().failure();
    ge_vsgen()
        .args(["gen", "--key", "zz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid hex digit"));
}
