//! Unit tests for API authentication extractor

use axum::extract::FromRequestParts;
use axum::http::Request;
use duckcat_api::api::ExtractUser;
use duckcat_api::error::AppError;
use uuid::Uuid;

#[tokio::test]
async fn test_extract_user_valid_uuid() {
    let user_id = Uuid::new_v4();
    let req = Request::builder()
        .header("X-User-ID", user_id.to_string())
        .body(())
        .unwrap();

    let (mut parts, _) = req.into_parts();
    let result = ExtractUser::from_request_parts(&mut parts, &()).await;

    assert!(result.is_ok());
    assert_eq!(result.unwrap().0, user_id);
}

#[tokio::test]
async fn test_extract_user_missing_header() {
    let req = Request::builder().body(()).unwrap();

    let (mut parts, _) = req.into_parts();
    let result = ExtractUser::from_request_parts(&mut parts, &()).await;

    let err = result.unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
    assert!(err.to_string().contains("missing"));
}

#[tokio::test]
async fn test_extract_user_invalid_uuid() {
    let req = Request::builder()
        .header("X-User-ID", "not-a-uuid")
        .body(())
        .unwrap();

    let (mut parts, _) = req.into_parts();
    let result = ExtractUser::from_request_parts(&mut parts, &()).await;

    let err = result.unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
    assert!(err.to_string().contains("invalid"));
}
