//! # Privilege Mode Tests
//!
//! This module contains unit tests for RISC-V privilege mode conversions and representations.

use warpsim_core::core::arch::mode::PrivilegeMode;

#[test]
fn test_privilege_mode_from_u8() {
    assert_eq!(PrivilegeMode::from_u8(0), PrivilegeMode::User);
    assert_eq!(PrivilegeMode::from_u8(1), PrivilegeMode::Supervisor);
    assert_eq!(PrivilegeMode::from_u8(3), PrivilegeMode::Machine);
}

#[test]
fn test_privilege_mode_reserved_encoding_is_user() {
    assert_eq!(PrivilegeMode::from_u8(2), PrivilegeMode::User);
}

#[test]
fn test_privilege_mode_only_low_bits_decoded() {
    assert_eq!(PrivilegeMode::from_u8(0b111), PrivilegeMode::Machine);
    assert_eq!(PrivilegeMode::from_u8(0b101), PrivilegeMode::Supervisor);
}

#[test]
fn test_privilege_mode_round_trips_encoding() {
    for mode in [
        PrivilegeMode::User,
        PrivilegeMode::Supervisor,
        PrivilegeMode::Machine,
    ] {
        assert_eq!(PrivilegeMode::from_u8(mode.to_u8()), mode);
    }
}

#[test]
fn test_privilege_mode_default_and_display() {
    assert_eq!(PrivilegeMode::default(), PrivilegeMode::Machine);
    assert_eq!(PrivilegeMode::Supervisor.to_string(), "Supervisor");
}
