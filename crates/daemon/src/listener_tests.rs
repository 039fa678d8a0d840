// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cg_core::{ExecuteRequest, ProcessId};
use cg_engine::{GatewayConfig, GatewayDeps};
use std::time::Duration;
use tempfile::TempDir;

fn ctx(dir: &TempDir) -> ListenCtx {
    let config = GatewayConfig {
        shell: Some("sh".to_string()),
        kill_grace_ms: 300,
        drain_ms: 200,
        ..GatewayConfig::default()
    };
    let deps = GatewayDeps::system(&config, Some(dir.path().join("kube"))).unwrap();
    ListenCtx {
        gateway: Gateway::new(config, deps),
        start_time: Instant::now(),
        shutdown: Arc::new(Notify::new()),
    }
}

#[tokio::test]
async fn ping_and_hello() {
    let dir = TempDir::new().unwrap();
    let ctx = ctx(&dir);

    assert_eq!(handle_request(Request::Ping, &ctx).await, Response::Pong);
    assert_eq!(
        handle_request(
            Request::Hello {
                version: "0.0.0+old".to_string()
            },
            &ctx
        )
        .await,
        Response::Hello {
            version: PROTOCOL_VERSION.to_string()
        }
    );
}

#[tokio::test]
async fn execute_returns_the_report() {
    let dir = TempDir::new().unwrap();
    let ctx = ctx(&dir);

    let response = handle_request(
        Request::Execute {
            request: ExecuteRequest::server("echo via-daemon"),
        },
        &ctx,
    )
    .await;

    let Response::Executed { report } = response else {
        panic!("unexpected response: {response:?}");
    };
    assert!(report.success);
    assert!(report.output.contains("via-daemon"));
}

#[tokio::test]
async fn status_counts_live_processes() {
    let dir = TempDir::new().unwrap();
    let ctx = Arc::new(ctx(&dir));

    let running = tokio::spawn({
        let ctx = Arc::clone(&ctx);
        async move {
            handle_request(
                Request::Execute {
                    request: ExecuteRequest::server("sleep 30").with_process_id("slow"),
                },
                &ctx,
            )
            .await
        }
    });
    for _ in 0..100 {
        if ctx.gateway.process_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    match handle_request(Request::Status, &ctx).await {
        Response::Status {
            processes_active, ..
        } => assert_eq!(processes_active, 1),
        other => panic!("unexpected response: {other:?}"),
    }
    match handle_request(Request::ListProcesses, &ctx).await {
        Response::Processes { processes } => {
            assert_eq!(processes.len(), 1);
            assert_eq!(processes[0].process_id, ProcessId::new("slow"));
        }
        other => panic!("unexpected response: {other:?}"),
    }

    let cancelled = handle_request(
        Request::Cancel {
            process_id: ProcessId::new("slow"),
        },
        &ctx,
    )
    .await;
    assert!(matches!(cancelled, Response::Cancelled { report } if report.success));
    assert!(matches!(
        running.await.unwrap(),
        Response::Executed { report } if !report.success
    ));
}

#[tokio::test]
async fn shutdown_with_kill_cancels_and_notifies() {
    let dir = TempDir::new().unwrap();
    let ctx = Arc::new(ctx(&dir));

    let running = tokio::spawn({
        let ctx = Arc::clone(&ctx);
        async move {
            handle_request(
                Request::Execute {
                    request: ExecuteRequest::server("sleep 30").with_process_id("victim"),
                },
                &ctx,
            )
            .await
        }
    });
    for _ in 0..100 {
        if ctx.gateway.process_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let notified = ctx.shutdown.notified();
    let response = handle_request(Request::Shutdown { kill: true }, &ctx).await;
    assert_eq!(response, Response::ShuttingDown);
    tokio::time::timeout(Duration::from_secs(1), notified)
        .await
        .unwrap();
    assert_eq!(ctx.gateway.process_count(), 0);
    assert!(running.await.is_ok());
}

#[tokio::test]
async fn socket_round_trip_and_malformed_request() {
    let dir = TempDir::new().unwrap();
    let socket_path = dir.path().join("test.sock");
    let socket = UnixListener::bind(&socket_path).unwrap();
    tokio::spawn(Listener::new(socket, ctx(&dir)).run());

    let stream = UnixStream::connect(&socket_path).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    protocol::write_response(&mut writer, &Request::Ping, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    let response: Response = protocol::read_request(&mut reader, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(response, Response::Pong);

    let stream = UnixStream::connect(&socket_path).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    protocol::write_message(&mut writer, br#"{"type":"Reboot"}"#)
        .await
        .unwrap();
    let response: Response = protocol::read_request(&mut reader, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    assert!(matches!(response, Response::Error { message } if message.contains("malformed")));
}
