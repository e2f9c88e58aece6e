use insta::assert_snapshot;
use paddock::core::error::{AppError, DefaultErrorReporter, ErrorReporter};
use paddock::core::types::{ErrorCategory, ErrorSeverity};
use paddock::core::wizard::allocation::AllocationError;
use paddock_types::ServiceError;
use uuid::Uuid;

#[test]
fn test_error_creation_all_categories() {
    let categories = vec![
        ErrorCategory::ValidationError,
        ErrorCategory::NavigationError,
        ErrorCategory::AllocationError,
        ErrorCategory::RecordServiceError,
        ErrorCategory::StorageError,
        ErrorCategory::StagingError,
        ErrorCategory::CommitError,
        ErrorCategory::ConfigError,
        ErrorCategory::SerializationError,
        ErrorCategory::IoError,
        ErrorCategory::InternalError,
        ErrorCategory::Unknown,
    ];

    for category in categories {
        let error = AppError::new(category, "test message");
        assert_eq!(error.category, category);
        assert_eq!(error.message, "test message");
        assert_eq!(error.context.len(), 0);
        assert_eq!(error.recovery_suggestions.len(), 0);
        assert!(error.occurred_at <= chrono::Utc::now());
        assert!(error.source.is_none());
    }
}

#[test]
fn test_error_severity_mapping() {
    let test_cases = vec![
        (ErrorCategory::ValidationError, ErrorSeverity::Error),
        (ErrorCategory::NavigationError, ErrorSeverity::Warning),
        (ErrorCategory::AllocationError, ErrorSeverity::Error),
        (ErrorCategory::CommitError, ErrorSeverity::Error),
        (ErrorCategory::StagingError, ErrorSeverity::Error),
        (ErrorCategory::ConfigError, ErrorSeverity::Error),
        (ErrorCategory::Unknown, ErrorSeverity::Info),
    ];

    for (category, expected_severity) in test_cases {
        let error = AppError::new(category, "test");
        assert_eq!(error.severity(), expected_severity);
    }
}

#[test]
fn test_error_display_with_sorted_context() {
    let mut error =
        AppError::new(ErrorCategory::StagingError, "metadata insert failed").with_code("WIZ-STAGE-004");
    error.add_context("path", "t/horse/e/blob.jpg");
    error.add_context("bucket", "horse-media");

    assert_snapshot!(
        error.to_string(),
        @r#"[WIZ-STAGE-004] StagingError: metadata insert failed (Context: [("bucket", "horse-media"), ("path", "t/horse/e/blob.jpg")])"#
    );
}

#[test]
fn test_generated_code_until_overridden() {
    let error = AppError::new(ErrorCategory::InternalError, "boom");
    assert!(error.code.starts_with("ERR-"));
    let error = error.with_code("WIZ-NAV-005");
    assert_eq!(error.code, "WIZ-NAV-005");
}

#[test]
fn test_service_error_becomes_source() {
    let id = Uuid::from_u128(3);
    let error = AppError::from_service(
        ErrorCategory::RecordServiceError,
        "failed to load horse",
        ServiceError::NotFound {
            table: "horses".to_string(),
            id,
        },
    );
    assert_eq!(
        error.message,
        format!("failed to load horse: horses row {} not found", id)
    );
    assert!(error.source.is_some());
}

#[test]
fn test_allocation_errors_carry_codes() {
    let cases = vec![
        (AllocationError::SumMismatch { sum: 99 }, "WIZ-ALLOC-001"),
        (AllocationError::PrimaryCount { count: 0 }, "WIZ-ALLOC-002"),
        (
            AllocationError::PercentageOutOfRange {
                index: 0,
                percentage: 0,
            },
            "WIZ-ALLOC-003",
        ),
        (
            AllocationError::IndexOutOfRange { index: 4, len: 2 },
            "WIZ-ALLOC-005",
        ),
        (AllocationError::TooManyHolders { max: 100 }, "WIZ-ALLOC-006"),
    ];
    for (source, code) in cases {
        let message = source.to_string();
        let error: AppError = source.into();
        assert_eq!(error.code, code);
        assert_eq!(error.category, ErrorCategory::AllocationError);
        assert_eq!(error.message, message);
    }
}

#[test]
fn test_conversions_from_std_errors() {
    let io: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
    assert_eq!(io.category, ErrorCategory::IoError);
    assert_eq!(io.code, "IO_ERROR");

    let serde: AppError = serde_json::from_str::<u8>("nope").unwrap_err().into();
    assert_eq!(serde.category, ErrorCategory::SerializationError);
}

#[test]
fn test_default_reporter_accepts_every_severity() {
    let reporter = DefaultErrorReporter::new();
    reporter.report_error(&AppError::new(ErrorCategory::CommitError, "fatal"));
    reporter.report_error(&AppError::new(ErrorCategory::NavigationError, "blocked"));
    reporter.report_warning("owners not saved", Some("WIZ-COMMIT-005".to_string()));
    reporter.report_info("committed");
}
