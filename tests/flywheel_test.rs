mod common;

use std::fs;

use meica_gear::errors::GearError;
use meica_gear::flywheel::{DataService, FlywheelClient};
use tempfile::TempDir;

#[test]
fn test_fetch_acquisition() {
    let mock = common::start();
    let client = FlywheelClient::new(&mock.base_url, common::API_KEY).unwrap();

    let acq = client.acquisition("acq1").unwrap();
    assert_eq!(acq.id, "acq1");
    assert_eq!(acq.label, "rest ME");
    assert_eq!(acq.parents.session.as_deref(), Some("ses1"));
    assert_eq!(acq.files.len(), 3);
    assert!(acq.files[0].is_functional());
    assert!(!acq.files[1].is_functional());
    assert_eq!(acq.files[2].echo_time(), Some(0.014));
}

#[test]
fn test_fetch_session() {
    let mock = common::start();
    let client = FlywheelClient::new(&mock.base_url, common::API_KEY).unwrap();

    let session = client.session("ses1").unwrap();
    assert_eq!(session.subject.code, "sub 01");
}

#[test]
fn test_download_file_with_space_in_name() {
    let mock = common::start();
    let client = FlywheelClient::new(&mock.base_url, common::API_KEY).unwrap();
    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("echo 2.nii.gz");

    client.download_file("acq1", "echo 2.nii.gz", &dest).unwrap();
    assert_eq!(fs::read(&dest).unwrap(), b"second echo");
}

#[test]
fn test_not_found_is_fetch_error() {
    let mock = common::start();
    let client = FlywheelClient::new(&mock.base_url, common::API_KEY).unwrap();

    let err = client.acquisition("missing").unwrap_err();
    assert!(matches!(err, GearError::FetchFailed(msg) if msg.contains("404")));
}

#[test]
fn test_wrong_key_is_rejected() {
    let mock = common::start();
    let client = FlywheelClient::new(&mock.base_url, "wrong").unwrap();

    let err = client.session("ses1").unwrap_err();
    assert!(matches!(err, GearError::FetchFailed(msg) if msg.contains("401")));
}
