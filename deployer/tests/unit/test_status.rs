//! Stack status vocabulary tests

use stack_deployer::cfn::status::StackStatus;

#[test]
fn test_terminal_statuses() {
    for token in ["CREATE_COMPLETE", "UPDATE_COMPLETE", "DELETE_COMPLETE", "IMPORT_COMPLETE"] {
        let status = StackStatus::from(token);
        assert!(status.is_terminal(), "{}", token);
        assert!(status.success(), "{}", token);
        assert!(!status.failure(), "{}", token);
    }
}

#[test]
fn test_rollbacks_are_failures() {
    for token in [
        "ROLLBACK_COMPLETE",
        "ROLLBACK_FAILED",
        "UPDATE_ROLLBACK_COMPLETE",
        "UPDATE_ROLLBACK_FAILED",
        "CREATE_FAILED",
    ] {
        let status = StackStatus::from(token);
        assert!(status.failure(), "{}", token);
        assert!(status.is_terminal(), "{}", token);
    }
}

#[test]
fn test_in_progress_is_not_terminal() {
    for token in [
        "CREATE_IN_PROGRESS",
        "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
        "UPDATE_ROLLBACK_IN_PROGRESS",
        "REVIEW_IN_PROGRESS",
    ] {
        let status = StackStatus::from(token);
        assert!(status.in_progress(), "{}", token);
        assert!(!status.is_terminal(), "{}", token);
        assert!(!status.failure(), "{}", token);
    }
}

#[test]
fn test_unknown_status_is_neither() {
    let status = StackStatus::from("SOMETHING_NEW");
    assert!(!status.is_recognized());
    assert!(!status.failure());
    assert!(!status.success());
    assert!(!status.is_terminal());
}

#[test]
fn test_status_serializes_as_token() {
    let status: StackStatus = serde_json::from_str("\"UPDATE_COMPLETE\"").unwrap();
    assert_eq!(status.as_str(), "UPDATE_COMPLETE");
    assert_eq!(status.to_string(), "UPDATE_COMPLETE");
}
