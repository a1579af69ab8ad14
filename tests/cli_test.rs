use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

const SENDER: &str = "0x9999999999999999999999999999999999999999";
const ALICE: &str = "0x1111111111111111111111111111111111111111";
const BOB: &str = "0x2222222222222222222222222222222222222222";

fn hash(n: u64) -> String {
    format!("0x{n:064x}")
}

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("comfypay"));
    cmd.args([
        "--account",
        SENDER,
        "--recipients-file",
        "tests/fixtures/recipients.txt",
        "--amounts-file",
        "tests/fixtures/amounts.txt",
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("recipient,amount,status,hash,error"))
        .stdout(predicate::str::contains(format!("{ALICE},1.5,success,{},", hash(1))))
        .stdout(predicate::str::contains(format!("{BOB},2,success,{},", hash(2))))
        .stderr(predicate::str::contains("recipient=0x1111...1111"))
        .stderr(predicate::str::contains("All payments processed"));

    Ok(())
}

#[test]
fn test_cli_failed_recipient_is_reported_not_fatal() {
    let mut cmd = Command::new(cargo_bin!("comfypay"));
    cmd.args(["--account", SENDER])
        .arg("--recipients")
        .arg(format!("bob,{ALICE}"))
        .args(["--amounts", "1,2"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "bob,1,error,,invalid recipient address: bob",
        ))
        .stdout(predicate::str::contains(format!("{ALICE},2,success,{},", hash(1))));
}

#[test]
fn test_cli_without_account_is_rejected() {
    let mut cmd = Command::new(cargo_bin!("comfypay"));
    cmd.env_remove("WALLET_ACCOUNT")
        .args(["--recipients", ALICE, "--amounts", "1"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Wallet not connected"))
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_cli_mismatched_lists_are_rejected() {
    let mut cmd = Command::new(cargo_bin!("comfypay"));
    cmd.args(["--account", SENDER])
        .arg("--recipients")
        .arg(format!("{ALICE},{BOB}"))
        .args(["--amounts", "1"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains(
            "Number of recipients (2) must match number of amounts (1)",
        ));
}

#[test]
fn test_cli_unknown_network_needs_token() {
    let mut cmd = Command::new(cargo_bin!("comfypay"));
    cmd.env_remove("TOKEN_ADDRESS")
        .args(["--account", SENDER, "--chain-id", "1"])
        .args(["--recipients", ALICE, "--amounts", "1"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid token address"));
}

#[test]
fn test_cli_json_output_from_temp_files() {
    let mut recipients = tempfile::NamedTempFile::new().unwrap();
    writeln!(recipients, "{ALICE},").unwrap();
    let mut amounts = tempfile::NamedTempFile::new().unwrap();
    writeln!(amounts, " 3 ").unwrap();

    let mut cmd = Command::new(cargo_bin!("comfypay"));
    cmd.args(["--account", SENDER, "--format", "json", "--fetch-decimals"])
        .arg("--recipients-file")
        .arg(recipients.path())
        .arg("--amounts-file")
        .arg(amounts.path());

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["recipient"], ALICE);
    assert_eq!(value[0]["amount"], "3");
    assert_eq!(value[0]["status"], "success");
    assert_eq!(value[0]["hash"], hash(1));
}
