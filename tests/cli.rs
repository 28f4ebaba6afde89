use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use tempfile::TempDir;

const BIN_NAME: &str = "spendwise";

fn spendwise(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin(BIN_NAME).expect("binary exists");
    cmd.env("SPENDWISE_DATA_DIR", home.path());
    cmd.env_remove("RUST_LOG");
    cmd
}

fn initialized() -> TempDir {
    let home = TempDir::new().expect("temp dir");
    spendwise(&home)
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Initialization complete"));
    home
}

fn run(home: &TempDir, args: &[&str]) {
    spendwise(home).args(args).assert().success();
}

#[test]
fn data_commands_require_init() {
    let home = TempDir::new().expect("temp dir");
    spendwise(&home)
        .args(["account", "list"])
        .assert()
        .failure()
        .stderr(contains("not initialized"));
}

#[test]
fn records_move_the_account_balance() {
    let home = initialized();

    spendwise(&home)
        .args(["account", "create", "Wallet", "--balance", "1000"])
        .assert()
        .success()
        .stdout(contains("Created account: Wallet").and(contains("1,000.00")));

    spendwise(&home)
        .args(["record", "add", "Wallet", "Coffee", "200", "--cost", "50"])
        .assert()
        .success()
        .stdout(contains("New balance: 750.00"));

    spendwise(&home)
        .args(["record", "add", "Wallet", "Salary", "100", "--cost", "30"])
        .assert()
        .success()
        .stdout(contains("New balance: 850.00"));

    spendwise(&home)
        .args(["account", "check", "Wallet"])
        .assert()
        .success()
        .stdout(contains("Status:  OK"));

    spendwise(&home)
        .args(["record", "list", "--account", "Wallet"])
        .assert()
        .success()
        .stdout(contains("Food & Drink / Coffee").and(contains("Salary")));
}

#[test]
fn unknown_category_is_rejected() {
    let home = initialized();
    run(&home, &["account", "create", "Wallet", "--balance", "10"]);

    spendwise(&home)
        .args(["record", "add", "Wallet", "Caviar", "5"])
        .assert()
        .failure()
        .stderr(contains("not found"));

    spendwise(&home)
        .args(["account", "show", "Wallet"])
        .assert()
        .success()
        .stdout(contains("10.00"));
}

#[test]
fn statistics_group_sub_categories_under_their_parent() {
    let home = initialized();
    run(&home, &["account", "create", "Wallet", "--balance", "500"]);
    run(&home, &["record", "add", "Wallet", "Coffee", "30", "--date", "2024-03-02"]);
    run(&home, &["record", "add", "Wallet", "Groceries", "70", "--date", "2024-03-03"]);
    run(&home, &["record", "add", "Wallet", "Salary", "400", "--date", "2024-03-04"]);

    spendwise(&home)
        .args(["report", "stats", "--from", "2024-03-01", "--to", "2024-03-31"])
        .assert()
        .success()
        .stdout(contains("Food & Drink").and(contains("100.00")).and(contains("400.00")));
}

#[test]
fn limit_forecast_reports_pace() {
    let home = initialized();
    run(&home, &["account", "create", "Wallet", "--balance", "1000"]);
    run(&home, &["record", "add", "Wallet", "Coffee", "60", "--date", "2024-03-03"]);
    run(&home, &["record", "add", "Wallet", "Taxi", "40", "--date", "2024-03-04"]);
    run(&home, &["record", "add", "Wallet", "Salary", "900", "--date", "2024-03-04"]);

    spendwise(&home)
        .args([
            "limit", "add", "March food", "300", "--accounts", "Wallet", "--categories",
            "Food & Drink", "--start", "2024-03-01", "--end", "2024-03-10",
        ])
        .assert()
        .success()
        .stdout(contains("Created spending limit: March food"));

    spendwise(&home)
        .args(["limit", "show", "March food", "--on", "2024-03-05"])
        .assert()
        .success()
        .stdout(
            contains("5 of 10 elapsed")
                .and(contains("Spent:           100.00"))
                .and(contains("Actual / day:    20.00"))
                .and(contains("Should / day:    40.00"))
                .and(contains("Expected total:  200.00"))
                .and(contains("On track")),
        );
}

#[test]
fn export_records_to_stdout() {
    let home = initialized();
    run(&home, &["account", "create", "Wallet", "--balance", "20"]);
    run(&home, &["record", "add", "Wallet", "Taxi", "12.5"]);

    spendwise(&home)
        .args(["export", "records"])
        .assert()
        .success()
        .stdout(contains("id,date,account,category").and(contains("Transport / Taxi")));
}
