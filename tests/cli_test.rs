use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

const CREATE_K1: &str = r#"{"op":"create","amount":"50000","currency":"COP","payment_method":"PSE","bank":"001","customer":{"email":"ana.gomez@example.com","name":"Ana Gomez","document":"CC-1234567"},"redirect_url":"https://merchant.example.com/return","idempotency_key":"k1"}"#;
const APPROVE_K1: &str = r#"{"op":"webhook","creation_key":"k1","status":"approved","timestamp":"2099-01-01T00:00:10Z","signature":"t=123,v1=deadbeef"}"#;

#[test]
fn test_replay_end_to_end() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{CREATE_K1}").unwrap();
    // Idempotent retry of the same creation.
    writeln!(file, "{CREATE_K1}").unwrap();
    writeln!(file, "{APPROVE_K1}").unwrap();
    // Exact retransmission, then a stale decline that must not regress state.
    writeln!(file, "{APPROVE_K1}").unwrap();
    writeln!(
        file,
        r#"{{"op":"webhook","creation_key":"k1","status":"declined","timestamp":"2099-01-01T00:00:05Z"}}"#
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("payrec"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "payment_id,status,amount,currency,creation_key,applied_events",
        ))
        .stdout(predicate::str::contains(",approved,50000,COP,k1,1"));
}

#[test]
fn test_malformed_and_invalid_records_are_skipped() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{CREATE_K1}").unwrap();
    // Unknown op tag.
    writeln!(file, r#"{{"op":"refund","payment_id":"pay_x"}}"#).unwrap();
    // Fails validation: non-numeric amount.
    writeln!(
        file,
        r#"{{"op":"create","amount":"abc","currency":"COP","payment_method":"CARD","customer":{{"email":"a@b.co","name":"Ana","document":"CC-1"}},"redirect_url":"https://merchant.example.com/return","idempotency_key":"k2"}}"#
    )
    .unwrap();
    // Orphan notification.
    writeln!(
        file,
        r#"{{"op":"webhook","payment_id":"pay_ffffffffffffffff","status":"approved","timestamp":"2099-01-01T00:00:10Z"}}"#
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("payrec"));
    cmd.arg(file.path());

    // The run survives every bad record and only k1's payment appears.
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(",pending,50000,COP,k1,0"))
        .stdout(predicate::str::contains("k2").not());
}

#[test]
fn test_config_file_switches_override_policy() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "override_policy = \"preserve_terminal\"").unwrap();

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{CREATE_K1}").unwrap();
    writeln!(file, "{APPROVE_K1}").unwrap();
    // Later decline; frozen under preserve_terminal.
    writeln!(
        file,
        r#"{{"op":"webhook","creation_key":"k1","status":"declined","timestamp":"2099-01-01T00:00:20Z"}}"#
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("payrec"));
    cmd.arg(file.path()).arg("--config").arg(config.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(",approved,50000,COP,k1,1"));
}
