//! End-to-end checks of the command surface and fast-fail paths.
//!
//! These run the real binary but only exercise paths that fail before any
//! network call, so they are safe offline.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn blacklisted_major_exits_with_the_unsupported_code() {
    Command::cargo_bin("chromium-install")
        .unwrap()
        .arg("82")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unsupported chromium version 82"));
}

#[test]
fn major_below_the_minimum_exits_with_the_unsupported_code() {
    Command::cargo_bin("chromium-install")
        .unwrap()
        .arg("77")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unsupported chromium version 77"));
}

#[test]
fn garbage_version_string_is_a_resolution_error() {
    Command::cargo_bin("chromium-install")
        .unwrap()
        .arg("not-a-version")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("version resolution failed"));
}

#[test]
fn help_lists_the_full_option_surface() {
    Command::cargo_bin("chromium-install")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--basepath")
                .and(predicate::str::contains("--link"))
                .and(predicate::str::contains("--tidyup"))
                .and(predicate::str::contains("--redownload"))
                .and(predicate::str::contains("--proxy"))
                .and(predicate::str::contains("--ssl-no-verify"))
                .and(predicate::str::contains("--with-driver")),
        );
}
