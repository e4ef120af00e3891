//! Tests for settings resolution.

use super::*;
use clap::Parser;
use std::collections::HashMap;

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["ghboot"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.branch, "main");
    assert_eq!(settings.python, "python3");
    assert_eq!(settings.gh, "gh");
    assert_eq!(settings.auth_scopes, "repo,read:org");
    assert_eq!(settings.max_auth_attempts, 3);
    assert_eq!(settings.manifest, "requirements.txt");
    assert_eq!(settings.entry_candidates, ["main.py", "install.py", "setup.py"]);
    assert!(settings.color);
}

#[test]
fn test_branch_from_environment() {
    let settings = Settings::resolve(&cli(&["acme/tools"]), env_of(&[("BRANCH", "release")]));
    assert_eq!(settings.branch, "release");
}

#[test]
fn test_flag_overrides_environment() {
    let settings = Settings::resolve(
        &cli(&["--branch", "feature", "--python", "python3.12", "acme/tools"]),
        env_of(&[("BRANCH", "release"), ("GHBOOT_PYTHON", "python3.11")]),
    );
    assert_eq!(settings.branch, "feature");
    assert_eq!(settings.python, "python3.12");
}

#[test]
fn test_empty_environment_values_are_ignored() {
    let settings = Settings::resolve(
        &cli(&["acme/tools"]),
        env_of(&[("BRANCH", ""), ("NO_COLOR", "")]),
    );
    assert_eq!(settings.branch, "main");
    assert!(settings.color);
}

#[test]
fn test_color_disabled() {
    let by_env = Settings::resolve(&cli(&["acme/tools"]), env_of(&[("NO_COLOR", "1")]));
    assert!(!by_env.color);

    let by_flag = Settings::resolve(&cli(&["--no-color", "acme/tools"]), env_of(&[]));
    assert!(!by_flag.color);
}

#[test]
fn test_repo_slug_accepts_owner_and_name() {
    let slug: RepoSlug = "my-org/private_repo.v2".parse().unwrap();
    assert_eq!(slug.owner(), "my-org");
    assert_eq!(slug.name(), "private_repo.v2");
    assert_eq!(slug.to_string(), "my-org/private_repo.v2");
}

#[test]
fn test_repo_slug_rejects_malformed_identifiers() {
    for bad in ["", "repo", "a/b/c", "/repo", "owner/", "own er/repo", "../x", "--help"] {
        let err = bad.parse::<RepoSlug>().unwrap_err();
        assert!(matches!(err, BootstrapError::Usage(_)), "accepted {:?}", bad);
    }
}
