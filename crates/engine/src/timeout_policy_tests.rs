// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    ping            = { "ping example.com",               Intent::NetworkProbe,       5 },
    ping_upper      = { "PING example.com",               Intent::NetworkProbe,       5 },
    ping_sudo_path  = { "sudo /usr/bin/ping 10.0.0.1",    Intent::NetworkProbe,       5 },
    dig             = { "dig +short example.com",         Intent::NetworkProbe,       5 },
    curl            = { "curl -sS https://example.com",   Intent::NetworkProbe,       10 },
    top             = { "top -b",                         Intent::InteractiveMonitor, 15 },
    kubectl_top     = { "kubectl top pods",               Intent::InteractiveMonitor, 15 },
    tail_follow     = { "tail -f /var/log/syslog",        Intent::Streaming,          15 },
    tail_follow_cap = { "tail -F /var/log/syslog",        Intent::Streaming,          15 },
    logs_follow     = { "kubectl logs -f deploy/api",     Intent::Streaming,          20 },
    logs_follow_eq  = { "kubectl logs api --follow=true", Intent::Streaming,          20 },
    s3_cp           = { "aws s3 cp s3://a/b .",           Intent::Transfer,           120 },
    rsync           = { "rsync -av a/ b/",                Intent::Transfer,           60 },
    get_watch       = { "kubectl get pods -w",            Intent::ClusterWatch,       15 },
    port_forward    = { "kubectl port-forward svc/api 8080:80", Intent::ClusterWatch, 15 },
)]
fn classified_commands(command: &str, intent: Intent, secs: u64) {
    let entry = lookup(command).unwrap();
    assert_eq!(entry.intent, intent);
    assert_eq!(entry.limit(), Duration::from_secs(secs));
}

#[yare::parameterized(
    ls             = { "ls -la" },
    tail_no_follow = { "tail -n 20 /var/log/syslog" },
    logs_plain     = { "kubectl logs deploy/api" },
    get_plain      = { "kubectl get pods" },
    pinger         = { "pinger --all" },
    empty          = { "" },
)]
fn unclassified_commands(command: &str) {
    assert_eq!(lookup(command), None);
}

#[test]
fn first_match_wins() {
    // `kubectl top` is listed before anything else that could match
    let entry = lookup("kubectl top nodes --watch").unwrap();
    assert_eq!(entry.intent, Intent::InteractiveMonitor);
}

#[test]
fn every_entry_has_a_positive_limit() {
    for entry in POLICY_TABLE {
        assert!(entry.limit_secs > 0, "{entry:?}");
        assert!(!entry.prefix.is_empty(), "{entry:?}");
    }
}

#[yare::parameterized(
    short_ns   = { "kubectl -n team-a logs -f api" },
    long_ns    = { "kubectl --namespace team-a logs --follow api" },
    eq_ns      = { "kubectl --namespace=team-a logs -f api" },
    all_ns     = { "kubectl -A logs -f api" },
)]
fn namespace_flags_do_not_hide_the_subcommand(command: &str) {
    assert_eq!(lookup(command).unwrap().intent, Intent::Streaming);
}

#[test]
fn scope_flags_are_only_stripped_for_the_cluster_cli() {
    assert_eq!(
        tokens("ping -n host"),
        vec!["ping".to_string(), "-n".to_string(), "host".to_string()]
    );
    // `-n` must not swallow `-f` for other programs
    assert_eq!(lookup("journalctl -n -f").unwrap().intent, Intent::Streaming);
    assert_eq!(tokens("kubectl -n team-a get pods"), vec!["kubectl", "get", "pods"]);
}
