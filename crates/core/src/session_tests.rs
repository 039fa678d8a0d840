// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn debug_never_prints_secrets() {
    let creds = Credentials {
        access_key_id: Some("AKIAEXAMPLEKEY".to_string()),
        secret_access_key: Some("wJalrXUtnFEMI/K7MDENG".to_string()),
        session_token: Some("FwoGZXIvYXdzEJr".to_string()),
        export_block: Some("export A=1\nexport B=2".to_string()),
    };
    let debug = format!("{:?}", creds);
    assert!(!debug.contains("wJalrXUtnFEMI"), "{debug}");
    assert!(!debug.contains("FwoGZXIvYXdzEJr"), "{debug}");
    assert!(!debug.contains("EXAMPLEKEY"), "{debug}");
    assert!(debug.contains("AKIA***"), "{debug}");
    assert!(debug.contains("<2 lines>"), "{debug}");
}

#[yare::parameterized(
    long_value  = { "AKIAEXAMPLE", "AKIA***" },
    short_value = { "abc",         "***" },
    exact_four  = { "abcd",        "***" },
    empty       = { "",            "***" },
)]
fn redact_keeps_short_prefix(input: &str, expected: &str) {
    assert_eq!(redact(input), expected);
}

#[test]
fn empty_credentials() {
    assert!(Credentials::default().is_empty());
    assert!(Credentials::from_export_block("  \n ").is_empty());
    assert!(!Credentials::from_export_block("export A=1").is_empty());
    assert!(!Credentials::keys("a", "b").is_empty());
}

#[test]
fn summary_omits_credentials() {
    let session = Session {
        id: SessionId::new("sess-1"),
        target: ClusterTarget::new("demo", "us-east-1").with_profile("ops"),
        credentials: Credentials::keys("AKIA1234", "secret"),
        last_activity_ms: 20,
        created_at_ms: 10,
    };
    let summary = session.summary();
    assert_eq!(summary.cluster_name, "demo");
    assert_eq!(summary.profile.as_deref(), Some("ops"));
    assert!(summary.has_credentials);
    let json = serde_json::to_string(&summary).unwrap();
    assert!(!json.contains("secret"));
}
