// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn running() -> StatusResponse {
    StatusResponse {
        is_recording: true,
        timeout: 30,
        uptime: 95.4,
        captured: 12,
        cors_origin: "*".to_string(),
        version: "0.1.0".to_string(),
    }
}

#[test]
fn not_running_is_one_line() {
    let view = StatusView::new(9444, None);
    assert_eq!(view.to_string(), "Daemon not running (port 9444)\n");

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json, serde_json::json!({ "running": false, "port": 9444 }));
}

#[test]
fn running_lists_fields() {
    let status = running();
    let text = StatusView::new(9555, Some(&status)).to_string();
    assert!(text.contains("Status: running"));
    assert!(text.contains("Port: 9555"));
    assert!(text.contains("Recording: yes"));
    assert!(text.contains("Captured: 12"));
    assert!(text.contains("Uptime: 1m 35s"));
    assert!(text.contains("Idle timeout: 30m"));
}

#[test]
fn json_flattens_daemon_status() {
    let status = running();
    let json = serde_json::to_value(StatusView::new(9444, Some(&status))).unwrap();
    assert_eq!(json["running"], true);
    assert_eq!(json["isRecording"], true);
    assert_eq!(json["corsOrigin"], "*");
    assert_eq!(json["captured"], 12);
}

#[yare::parameterized(
    seconds = { 42.9, "42s" },
    minutes = { 61.0, "1m 1s" },
    hours = { 7325.0, "2h 2m" },
)]
fn uptime_formatting(secs: f64, expected: &str) {
    assert_eq!(format_uptime(secs), expected);
}
