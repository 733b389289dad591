/// Unit tests for DiError and DiResult types

use opscope::{DiError, DiResult};
use std::error::Error;

#[test]
fn test_error_display_not_found() {
    let error = DiError::NotFound("TestService");
    assert_eq!(error.to_string(), "Service not found: TestService");
}

#[test]
fn test_error_display_type_mismatch() {
    let error = DiError::TypeMismatch("std::string::String");
    assert_eq!(error.to_string(), "Type mismatch for: std::string::String");
}

#[test]
fn test_error_display_circular() {
    let error = DiError::Circular(vec!["ServiceA", "ServiceB", "ServiceA"]);
    assert_eq!(error.to_string(), "Circular dependency: ServiceA -> ServiceB -> ServiceA");
}

#[test]
fn test_error_display_wrong_lifetime() {
    let error = DiError::WrongLifetime("Cannot resolve scoped service from root provider");
    assert_eq!(
        error.to_string(),
        "Lifetime error: Cannot resolve scoped service from root provider"
    );
}

#[test]
fn test_error_display_construction() {
    struct Widget;

    let error = DiError::construction::<Widget>("out of widgets");
    match &error {
        DiError::Construction { service, message } => {
            assert!(service.ends_with("Widget"));
            assert_eq!(message, "out of widgets");
        }
        other => panic!("unexpected variant {other:?}"),
    }
    assert!(error.to_string().starts_with("Failed to construct "));
    assert!(error.to_string().ends_with("Widget: out of widgets"));
}

#[test]
fn test_error_classification() {
    assert!(DiError::NotFound("x").is_configuration());
    assert!(DiError::TypeMismatch("x").is_configuration());
    assert!(DiError::Circular(vec!["x", "x"]).is_configuration());
    assert!(DiError::WrongLifetime("x").is_configuration());
    assert!(!DiError::construction::<u8>("x").is_configuration());
}

#[test]
fn test_error_is_std_error_without_source() {
    let error = DiError::NotFound("TestService");
    let as_std: &dyn Error = &error;
    assert!(as_std.source().is_none());
}

#[test]
fn test_di_result_alias() {
    fn succeed() -> DiResult<u8> {
        Ok(1)
    }

    fn fail() -> DiResult<u8> {
        Err(DiError::NotFound("some_service"))
    }

    assert_eq!(succeed(), Ok(1));
    assert_eq!(fail(), Err(DiError::NotFound("some_service")));
}
