//! Cluster-mode specs against stand-in cloud and cluster CLIs

use crate::prelude::*;

const AWS_OK: &str = r#"#!/bin/sh
echo "Updated context demo in $KUBECONFIG"
"#;

const AWS_NO_CLUSTER: &str = r#"#!/bin/sh
echo "An error occurred (ResourceNotFoundException) when calling the DescribeCluster operation: No cluster found for name: demo." >&2
exit 255
"#;

const KUBECTL: &str = r#"#!/bin/sh
case "$1" in
  cluster-info) echo "Kubernetes control plane is running at https://demo.example" ;;
  config) echo "demo-context" ;;
  auth) echo "yes" ;;
  *) echo "kubectl $*"; echo "key=$AWS_ACCESS_KEY_ID" ;;
esac
"#;

fn gateway(aws: &str) -> Gateway {
    let gw = Gateway::new();
    let aws = gw.tool("aws", aws);
    let kubectl = gw.tool("kubectl", KUBECTL);
    gw.config(&format!(
        "shell = \"sh\"\nceiling_secs = 5\nkill_grace_ms = 300\ndrain_ms = 200\ncloud_cli = \"{}\"\ncluster_cli = \"{}\"\n",
        aws.display(),
        kubectl.display()
    ));
    gw
}

fn session_from(stderr: &str) -> String {
    stderr
        .lines()
        .find_map(|l| l.strip_prefix("session: "))
        .expect("session line on stderr")
        .to_string()
}

#[test]
fn cluster_command_is_prefixed_scoped_and_credentialed() {
    let gw = gateway(AWS_OK);
    let run = gw
        .cg()
        .args(&["exec", "--cluster", "demo", "--region", "us-east-1", "-n", "team-a"])
        .args(&["--access-key-id", "AKIASPEC", "--secret-access-key", "s3cret"])
        .args(&["get", "pods"])
        .passes()
        .stdout_has("-n team-a get pods")
        .stdout_has("key=AKIASPEC");
    assert!(!session_from(&run.stderr()).is_empty());
}

#[test]
fn session_is_listed_without_secrets_and_reusable() {
    let gw = gateway(AWS_OK);
    let first = gw
        .cg()
        .args(&["exec", "--cluster", "demo", "--region", "us-east-1"])
        .args(&["--access-key-id", "AKIASPEC", "--secret-access-key", "s3cret"])
        .args(&["get", "nodes"])
        .passes();
    let session = session_from(&first.stderr());

    gw.cg()
        .args(&["session", "list"])
        .passes()
        .stdout_has(&session)
        .stdout_has("demo")
        .stdout_has("us-east-1")
        .stdout_lacks("AKIASPEC")
        .stdout_lacks("s3cret");

    gw.cg()
        .args(&["exec", "--session", session.as_str(), "get", "svc"])
        .passes()
        .stdout_has("get svc")
        .stdout_has("key=AKIASPEC");
}

#[test]
fn missing_cluster_is_diagnosed() {
    let gw = gateway(AWS_NO_CLUSTER);
    gw.cg()
        .args(&["exec", "--cluster", "demo", "--region", "us-east-1", "get", "pods"])
        .fails()
        .stderr_has("Cluster not found")
        .stderr_has("ResourceNotFoundException")
        .stdout_lacks("get pods");
}

#[test]
fn unsafe_cluster_name_is_rejected() {
    let gw = gateway(AWS_OK);
    gw.cg()
        .args(&["exec", "--cluster", "demo;reboot", "--region", "us-east-1", "get", "pods"])
        .fails()
        .stdout_lacks("kubectl");
}

#[test]
fn probe_reports_context_and_permissions() {
    let gw = gateway(AWS_OK);
    gw.cg()
        .args(&["probe", "--cluster", "demo", "--region", "us-east-1"])
        .passes()
        .stdout_has("Connected to cluster demo")
        .stdout_has("Context: demo-context")
        .stdout_has("Permissions: ok");
}

#[test]
fn probe_of_a_missing_cluster_fails() {
    let gw = gateway(AWS_NO_CLUSTER);
    let run = gw
        .cg()
        .args(&["-o", "json", "probe", "--cluster", "demo", "--region", "us-east-1"])
        .fails();
    let report = run.json();
    assert_eq!(report["success"], false);
    assert_eq!(report["has_permissions"], false);
}
