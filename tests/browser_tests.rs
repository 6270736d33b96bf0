use std::path::{Path, PathBuf};
use std::time::Duration;

use udyam_schema::{
    browser::{
        discovery::{ControlCandidate, ControlSource},
        session::{BrowserConfig, BrowserControlSource, BrowserRequest, BrowserResponse, BrowserSession},
    },
    service::error::ExtractError,
};

const URL: &str = "https://udyamregistration.gov.in/UdyamRegistration.aspx";

fn fake_helper(script: &str) -> BrowserConfig {
    BrowserConfig {
        node: "sh".into(),
        script: format!("tests/fixtures/{}", script),
    }
}

// =========================================================================
// BrowserRequest serialization
// =========================================================================

#[test]
fn browser_request_navigate_serializes_correctly() {
    let req = BrowserRequest::navigate("https://example.com", "form", Duration::from_secs(60));
    let json: serde_json::Value = serde_json::to_value(&req).unwrap();

    assert_eq!(json["cmd"], "navigate");
    assert_eq!(json["url"], "https://example.com");
    assert_eq!(json["wait_for"], "form");
    assert_eq!(json["timeout_ms"], 60_000);
}

#[test]
fn browser_request_list_controls_serializes_correctly() {
    let req = BrowserRequest::list_controls();
    let json: serde_json::Value = serde_json::to_value(&req).unwrap();

    assert_eq!(json["cmd"], "list_controls");
    assert!(json.get("url").is_none());
}

#[test]
fn browser_request_quit_serializes_correctly() {
    let req = BrowserRequest::quit();
    let json: serde_json::Value = serde_json::to_value(&req).unwrap();

    assert_eq!(json["cmd"], "quit");
}

// =========================================================================
// BrowserResponse deserialization
// =========================================================================

#[test]
fn browser_response_deserializes_ready_signal() {
    let resp: BrowserResponse = serde_json::from_str(r#"{"ok":true,"ready":true}"#).unwrap();
    assert!(resp.ok);
    assert_eq!(resp.ready, Some(true));
    assert!(resp.controls.is_none());
}

#[test]
fn browser_response_deserializes_timeout_error() {
    let json = r#"{"ok":false,"error":"Timeout 60000ms exceeded.","timeout":true}"#;
    let resp: BrowserResponse = serde_json::from_str(json).unwrap();
    assert!(!resp.ok);
    assert_eq!(resp.timeout, Some(true));
    assert_eq!(resp.error.as_deref(), Some("Timeout 60000ms exceeded."));
}

#[test]
fn browser_response_deserializes_controls_with_null_attributes() {
    let json = r#"{"ok":true,"controls":[
        {"tag":"select","type":null,"name":"ddlState","label":"State","required":true,"options":["Goa"]},
        {"tag":"input","type":"text","name":null,"label":"Mobile","required":false,"options":[]}
    ]}"#;
    let resp: BrowserResponse = serde_json::from_str(json).unwrap();
    let controls = resp.controls.unwrap();

    assert_eq!(
        controls[0],
        ControlCandidate {
            tag: "select".into(),
            type_attr: None,
            name: Some("ddlState".into()),
            label: "State".into(),
            required: true,
            options: vec!["Goa".into()],
        }
    );
    assert_eq!(controls[1].name, None);
}

// =========================================================================
// Session lifecycle against a scripted helper
// =========================================================================

#[test]
fn missing_helper_binary_fails_to_spawn() {
    let config = BrowserConfig {
        node: "udyam-schema-no-such-node-binary".into(),
        script: "form_server.js".into(),
    };
    let err = BrowserSession::launch(&config).err().unwrap();
    assert!(matches!(err, ExtractError::SubprocessSpawn { .. }));
}

#[cfg(unix)]
#[test]
fn browser_source_lists_filtered_controls() {
    let mut source = BrowserControlSource::new(
        fake_helper("fake_helper.sh"),
        URL,
        "form",
        Duration::from_secs(5),
    );
    let controls = source.list_controls().unwrap();

    assert_eq!(controls.len(), 2, "hidden __VIEWSTATE is dropped");
    assert_eq!(controls[0].name.as_deref(), Some("txtadharno"));
    assert_eq!(controls[0].control_type, "text");
    assert!(controls[0].required);
    assert_eq!(controls[1].control_type, "select");
    assert_eq!(controls[1].options, Some(vec!["Goa".to_string()]));
}

#[cfg(unix)]
#[test]
fn helper_timeout_maps_to_extraction_timeout() {
    let mut source = BrowserControlSource::new(
        fake_helper("fake_helper_timeout.sh"),
        URL,
        "form",
        Duration::from_secs(1),
    );
    let err = source.list_controls().unwrap_err();
    assert!(err.is_timeout(), "got {:?}", err);
}

#[cfg(unix)]
#[test]
fn helper_dying_mid_session_is_an_error_not_a_hang() {
    let mut session = BrowserSession::launch(&fake_helper("fake_helper_broken.sh")).unwrap();
    let err = session
        .navigate(URL, "form", Duration::from_secs(1))
        .unwrap_err();
    assert!(!err.is_timeout(), "got {:?}", err);
    session.quit();
    session.quit();
}

// =========================================================================
// Helper shutdown on every exit path
// =========================================================================

// Acknowledges quit before its slow cleanup, then leaves a marker file.
#[cfg(unix)]
const SLOW_QUIT_HELPER: &str = r#"#!/bin/sh
echo '{"ok":true,"ready":true}'
while IFS= read -r line; do
  case "$line" in
    *'"navigate"'*) echo '__NAVIGATE__' ;;
    *'"list_controls"'*) echo '{"ok":true,"controls":[{"tag":"input","type":"text","name":"txtPan","label":"PAN","required":true,"options":[]}]}' ;;
    *'"quit"'*) echo '{"ok":true}'; sleep 0.3; : > '__MARKER__'; exit 0 ;;
  esac
done
"#;

#[cfg(unix)]
fn slow_quit_helper(dir: &Path, navigate_reply: &str) -> (BrowserConfig, PathBuf) {
    let marker = dir.join("closed.marker");
    let script = dir.join("slow_quit_helper.sh");
    let body = SLOW_QUIT_HELPER
        .replace("__NAVIGATE__", navigate_reply)
        .replace("__MARKER__", &marker.display().to_string());
    std::fs::write(&script, body).unwrap();

    let config = BrowserConfig {
        node: "sh".into(),
        script: script.display().to_string(),
    };
    (config, marker)
}

#[cfg(unix)]
#[test]
fn successful_extraction_waits_for_helper_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let (config, marker) = slow_quit_helper(dir.path(), r#"{"ok":true}"#);
    let mut source = BrowserControlSource::new(config, URL, "form", Duration::from_secs(5));

    let controls = source.list_controls().unwrap();

    assert_eq!(controls.len(), 1);
    assert!(marker.exists(), "helper was stopped before it finished closing");
}

#[cfg(unix)]
#[test]
fn timed_out_extraction_still_shuts_helper_down_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let (config, marker) = slow_quit_helper(
        dir.path(),
        r#"{"ok":false,"error":"page.waitForSelector: Timeout 100ms exceeded.","timeout":true}"#,
    );
    let mut source = BrowserControlSource::new(config, URL, "form", Duration::from_secs(1));

    let err = source.list_controls().unwrap_err();

    assert!(err.is_timeout(), "got {:?}", err);
    assert!(marker.exists(), "helper was stopped before it finished closing");
}
