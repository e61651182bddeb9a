use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use slotbook_http::{AppError, Credential};

use super::admission::AdmissionPipeline;
use super::models::{BookingView, CreatedBooking};

pub fn router(pipeline: AdmissionPipeline) -> Router {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/guest", post(create_guest_booking))
        .route("/{id}", put(edit_booking).delete(delete_booking))
        .with_state(pipeline)
}

/// Bodies are read as raw bytes so the credential is checked before the JSON.
async fn create_booking(
    State(pipeline): State<AdmissionPipeline>,
    credential: Credential,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedBooking>), AppError> {
    let id = pipeline.create(credential.as_deref(), &body).await?;
    Ok((StatusCode::CREATED, Json(CreatedBooking { id })))
}

async fn create_guest_booking(
    State(pipeline): State<AdmissionPipeline>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedBooking>), AppError> {
    let id = pipeline.create_as_guest(&body).await?;
    Ok((StatusCode::CREATED, Json(CreatedBooking { id })))
}

async fn list_bookings(
    State(pipeline): State<AdmissionPipeline>,
    credential: Credential,
) -> Result<Json<Vec<BookingView>>, AppError> {
    Ok(Json(pipeline.list(credential.as_deref()).await?))
}

async fn edit_booking(
    State(pipeline): State<AdmissionPipeline>,
    credential: Credential,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    pipeline.edit(credential.as_deref(), id, &body).await?;
    Ok(StatusCode::OK)
}

async fn delete_booking(
    State(pipeline): State<AdmissionPipeline>,
    credential: Credential,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    pipeline.delete(credential.as_deref(), id).await?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{HeaderValue, Request, StatusCode},
    };
    use serde_json::json;
    use slotbook_db::BookingStore;
    use tower::ServiceExt;

    use crate::test_support::{booking_json, TestApp};

    #[tokio::test]
    async fn registered_user_round_trip() {
        let app = TestApp::new();
        let (user_id, key) = app.register("john@example.com", false).await;
        let (_, admin) = app.register("root@example.com", true).await;
        let payload = json!({
            "name": "John",
            "surname": "Doe",
            "email": "john@example.com",
            "phone": "",
            "service": 0,
            "start_time": "2025-05-01T09:00:00",
            "end_time": "2025-05-01T10:00:00"
        });

        let (status, created) = app.send("POST", "/api/bookings", Some(&key), Some(payload)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created["id"].as_i64().is_some());

        let expected = json!([{
            "id": created["id"],
            "user_id": user_id,
            "name": "John",
            "surname": "Doe",
            "email": "john@example.com",
            "phone": "",
            "service": 1,
            "start_time": "2025-05-01T09:00:00",
            "end_time": "2025-05-01T10:00:00"
        }]);

        let (status, as_admin) = app.send("GET", "/api/bookings", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(as_admin, expected);
        assert_eq!(as_admin[0]["service"], 1);
        assert_eq!(as_admin[0]["phone"], "");

        let (status, as_owner) = app.send("GET", "/api/bookings", Some(&key), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(as_owner, expected);
    }

    #[tokio::test]
    async fn anonymous_list_is_redacted() {
        let app = TestApp::new();
        let payload = booking_json("2025-05-01T09:00:00", "2025-05-01T10:00:00", "guest@example.com");
        app.send("POST", "/api/bookings", None, Some(payload)).await;

        let (_, listed) = app.send("GET", "/api/bookings", None, None).await;
        assert_eq!(listed[0]["name"], "Taken");
        assert_eq!(listed[0]["surname"], "");
        assert_eq!(listed[0]["email"], "Hidden");
        assert_eq!(listed[0]["phone"], "Hidden");
        assert_eq!(listed[0]["service"], 0);
        assert_eq!(listed[0]["user_id"], 0);
        assert_eq!(listed[0]["start_time"], "2025-05-01T09:00:00");
    }

    #[tokio::test]
    async fn overlapping_booking_is_conflict() {
        let app = TestApp::new();
        let first = booking_json("2025-05-01T09:00:00", "2025-05-01T10:00:00", "a@example.com");
        let second = booking_json("2025-05-01T09:30:00", "2025-05-01T10:30:00", "b@example.com");

        let (status, _) = app.send("POST", "/api/bookings", None, Some(first)).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = app.send("POST", "/api/bookings", None, Some(second)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["details"][0]["reason"], "overlap");
    }

    #[tokio::test]
    async fn guest_booking_with_registered_email_is_conflict() {
        let app = TestApp::new();
        app.register("owner@example.com", false).await;
        let payload = booking_json("2025-05-01T09:00:00", "2025-05-01T10:00:00", "owner@example.com");

        let (status, body) = app.send("POST", "/api/bookings/guest", None, Some(payload)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["details"][0]["reason"], "email_taken");
    }

    #[tokio::test]
    async fn unknown_credential_is_unauthorized() {
        let app = TestApp::new();
        let (status, body) = app.send("GET", "/api/bookings", Some("nope"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "unauthorized");
    }

    #[tokio::test]
    async fn undecodable_credential_is_unauthorized() {
        let app = TestApp::new();
        let payload = booking_json("2025-05-01T09:00:00", "2025-05-01T10:00:00", "a@example.com");

        for (method, body) in [("POST", Body::from(payload.to_string())), ("GET", Body::empty())] {
            let request = Request::builder()
                .method(method)
                .uri("/api/bookings")
                .header("content-type", "application/json")
                .header(
                    "authorization",
                    HeaderValue::from_bytes(b"k\xe9y-not-registered").unwrap(),
                )
                .body(body)
                .unwrap();

            let response = app.router.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method}");
        }
        assert!(app.ctx.store.list_bookings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_body_is_bad_request() {
        let app = TestApp::new();
        let inverted = booking_json("2025-05-01T10:00:00", "2025-05-01T09:00:00", "a@example.com");

        let (status, body) = app.send("POST", "/api/bookings", None, Some(inverted)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"][0]["field"], "end_time");

        let (status, _) = app
            .send("POST", "/api/bookings", None, Some(json!({ "name": "John" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_admin_cannot_edit_or_delete() {
        let app = TestApp::new();
        let (_, key) = app.register("john@example.com", false).await;
        let payload = booking_json("2025-05-01T09:00:00", "2025-05-01T10:00:00", "john@example.com");
        let (_, created) = app.send("POST", "/api/bookings", Some(&key), Some(payload.clone())).await;
        let uri = format!("/api/bookings/{}", created["id"]);

        let (status, _) = app.send("PUT", &uri, Some(&key), Some(payload)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = app.send("DELETE", &uri, Some(&key), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = app.send("DELETE", &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_edits_and_deletes_twice() {
        let app = TestApp::new();
        let (_, admin) = app.register("root@example.com", true).await;
        let payload = booking_json("2025-05-01T09:00:00", "2025-05-01T10:00:00", "a@example.com");
        let (_, created) = app.send("POST", "/api/bookings", None, Some(payload)).await;
        let uri = format!("/api/bookings/{}", created["id"]);

        let moved = booking_json("2025-05-02T09:00:00", "2025-05-02T10:00:00", "a@example.com");
        let (status, _) = app.send("PUT", &uri, Some(&admin), Some(moved)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = app.send("GET", "/api/bookings", Some(&admin), None).await;
        assert_eq!(listed[0]["start_time"], "2025-05-02T09:00:00");
        assert_eq!(listed[0]["email"], "a@example.com");

        let (status, _) = app.send("DELETE", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.send("DELETE", &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = app.send("GET", "/api/bookings", Some(&admin), None).await;
        assert_eq!(listed, json!([]));
    }
}
