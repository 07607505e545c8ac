//! # Status Code Tests
//!
//! Validates failure/success classification, the fixed wire values and the
//! mapping from lifecycle errors onto status codes.

use dtp_core::{DtpError, StatusCode};

#[test]
fn test_failure_is_sign_bit() {
    assert!(StatusCode::FAIL.is_failure());
    assert!(StatusCode::new(0x8000_0001).is_failure());
    assert!(StatusCode::new(u32::MAX).is_failure());

    assert!(!StatusCode::SUCCESS.is_failure());
    assert!(!StatusCode::new(0x7FFF_FFFF).is_failure());
}

#[test]
fn test_only_zero_is_success() {
    assert!(StatusCode::SUCCESS.is_success());
    assert!(!StatusCode::new(1).is_success());
    assert!(!StatusCode::new(1).is_failure(), "positive codes are neither");
}

#[test]
fn test_wire_values_are_stable() {
    assert_eq!(StatusCode::ALREADY_INITIALIZED.as_u32(), 0x8000_0002);
    assert_eq!(StatusCode::SOCKET_LISTEN_FAILED.as_u32(), 0x8000_0008);
    assert_eq!(StatusCode::SERVICE_IS_STOPPED.as_u32(), 0x8000_0009);
    assert_eq!(StatusCode::UNKNOWN_PACKET_TAG.as_u32(), 0x8000_000A);
    assert_eq!(u32::from(StatusCode::MALFORMED_PACKET), 0x8000_000B);
}

#[test]
fn test_debug_names_known_codes() {
    assert_eq!(format!("{:?}", StatusCode::UNKNOWN_PACKET_TAG), "UnknownPacketTag(0x8000000a)");
    assert_eq!(format!("{:?}", StatusCode::new(0x1234)), "StatusCode(0x00001234)");
    assert_eq!(StatusCode::SUCCESS.to_string(), "0x00000000");
}

#[test]
fn test_errors_map_to_status_codes() {
    let io = || std::io::Error::new(std::io::ErrorKind::Other, "boom");

    assert_eq!(DtpError::AlreadyInitialized.status(), StatusCode::ALREADY_INITIALIZED);
    assert_eq!(DtpError::NotInitialized.status(), StatusCode::NOT_INITIALIZED);
    assert_eq!(DtpError::ThreadLaunchFailed(io()).status(), StatusCode::THREAD_LAUNCH_FAILED);
    assert_eq!(DtpError::OutOfMemory { requested: 8 }.status(), StatusCode::OUT_OF_MEMORY);
    assert_eq!(DtpError::SocketCreationFailed(io()).status(), StatusCode::SOCKET_CREATION_FAILED);
    assert_eq!(
        DtpError::SocketConfigurationFailed(io()).status(),
        StatusCode::SOCKET_CONFIGURATION_FAILED
    );
    assert_eq!(
        DtpError::SocketBindFailed { addr: "127.0.0.1:1".parse().unwrap(), source: io() }.status(),
        StatusCode::SOCKET_BIND_FAILED
    );
    assert_eq!(DtpError::SocketListenFailed(io()).status(), StatusCode::SOCKET_LISTEN_FAILED);
    assert_eq!(StatusCode::from(&DtpError::ServiceIsStopped), StatusCode::SERVICE_IS_STOPPED);
    assert!(DtpError::InvalidConfiguration("x".into()).status().is_failure());
}
