use std::net::SocketAddr;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{chat, health, macros, meal_plans, vision};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(vision::router())
        .merge(chat::router())
        .merge(macros::router())
        .merge(meal_plans::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, ms, "response");
                        } else {
                            tracing::info!(%status, ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8000".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::dates::{format_date, today};
    use crate::llm::{Completion, ToolCall};
    use crate::test_support::ScriptedModel;

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn image_upload(uri: &str, content_type: &str, extra: &[(&str, &str)]) -> Request<Body> {
        let boundary = "mealcrew-boundary";
        let mut body = Vec::new();
        for (name, value) in extra {
            body.extend_from_slice(
                format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                    .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"fridge.jpg\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn lunch(calories: f64) -> Value {
        json!({
            "username": "alice",
            "meal_name": "lunch",
            "food_name": "chicken salad",
            "calories": calories,
            "proteins": 35.2,
            "fats": 12.9,
            "carbs": 20.1
        })
    }

    #[tokio::test]
    async fn root_and_health_report_status() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "API is running");

        let (_, body) = call(&app, get("/health")).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["agents_available"], true);
    }

    #[tokio::test]
    async fn saved_macros_are_truncated_and_never_deduplicated() {
        let app = build_app(AppState::fake());
        for _ in 0..2 {
            let (status, body) = call(&app, json_request(Method::POST, "/save-macros", lunch(450.7))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["success"], true);
        }

        let (status, body) = call(&app, get("/get-user-macros/alice")).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body["macros"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["calories"], 450);
        assert_eq!(rows[0]["proteins"], 35);
        assert_eq!(rows[0]["fats"], 12);
        assert_eq!(rows[0]["carbs"], 20);
        assert_eq!(rows[0]["date_added"], format_date(today()));
    }

    #[tokio::test]
    async fn save_macros_without_username_is_a_bad_request() {
        let app = build_app(AppState::fake());
        let mut payload = lunch(100.0);
        payload["username"] = json!("");
        let (status, body) = call(&app, json_request(Method::POST, "/save-macros", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Username is required");
    }

    #[tokio::test]
    async fn weekly_summary_totals_and_averages() {
        let app = build_app(AppState::fake());
        for (date, calories) in [("2024-03-04", 500.0), ("2024-03-04", 300.0), ("2024-03-06", 400.0), ("2024-03-20", 999.0)] {
            let mut payload = lunch(calories);
            payload["date_added"] = json!(date);
            call(&app, json_request(Method::POST, "/save-macros", payload)).await;
        }

        let (status, body) = call(
            &app,
            get("/get-user-weekly-macros/alice?start_date=2024-03-04&end_date=2024-03-10"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["weekly_totals"]["calories"], 1200);
        assert_eq!(body["daily_averages"]["calories"], 600.0);
        assert_eq!(body["daily_summary"]["2024-03-04"]["meals"].as_array().unwrap().len(), 2);
        assert_eq!(body["date_range"]["end_date"], "2024-03-10");
    }

    #[tokio::test]
    async fn weekly_summary_rejects_bad_dates() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, get("/get-user-weekly-macros/alice?start_date=03/04/2024")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Invalid date format. Use YYYY-MM-DD");
    }

    #[tokio::test]
    async fn identify_ingredients_returns_the_cleaned_list() {
        let model = Arc::new(ScriptedModel::new(vec![Completion::text("eggs, spinach , , tomato")]));
        let app = build_app(AppState::fake_with_llm(model.clone()));

        let (status, body) = call(&app, image_upload("/identify-ingredients", "image/jpeg", &[])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ingredients"], json!(["eggs", "spinach", "tomato"]));
        assert_eq!(model.requests()[0].model, "Llama-3.2-11B-Vision-Instruct");
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, image_upload("/identify-ingredients", "text/plain", &[])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "File is not an image");
    }

    #[tokio::test]
    async fn unparseable_macros_are_flagged_degraded() {
        let model = Arc::new(ScriptedModel::new(vec![Completion::text("I cannot tell from this photo.")]));
        let app = build_app(AppState::fake_with_llm(model));

        let (status, body) = call(
            &app,
            image_upload("/analyze-food-macros", "image/png", &[("food_name", "pasta")]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["degraded"], true);
        assert_eq!(body["macros"]["calories"], 0.0);
    }

    #[tokio::test]
    async fn llm_failure_surfaces_as_bad_gateway() {
        let app = build_app(AppState::fake());
        let (status, _) = call(&app, image_upload("/identify-ingredients", "image/jpeg", &[])).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn chat_routes_the_initial_message_to_the_planner() {
        let model = Arc::new(ScriptedModel::new(vec![
            Completion {
                content: None,
                tool_calls: vec![ToolCall {
                    id: "call_0".into(),
                    name: "create_meal_plan".into(),
                    arguments: r#"{"input":"Ingredients: tofu"}"#.into(),
                }],
            },
            Completion::text("### Weekly Meal Plan"),
        ]));
        let app = build_app(AppState::fake_with_llm(model.clone()));

        let (status, body) = call(
            &app,
            json_request(
                Method::POST,
                "/chat",
                json!({
                    "message": "",
                    "user_id": "alice",
                    "ingredients": ["tofu"],
                    "proteinTarget": 120,
                    "is_initial_message": true
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "### Weekly Meal Plan");
        assert_eq!(body["bot_avatar"], "🤖");

        let routing = format!("{:?}", model.requests()[0].messages[1].content);
        assert!(routing.contains("Daily Protein Target: 120 grams"));
    }

    #[tokio::test]
    async fn meal_plans_are_saved_and_listed() {
        let app = build_app(AppState::fake());
        let (status, body) = call(
            &app,
            json_request(
                Method::POST,
                "/save-meal-plan",
                json!({ "userId": "alice", "mealPlanContent": "### Weekly Meal Plan" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["meal_plan"]["mp_name"],
            format!("Meal Plan ({})", format_date(today()))
        );

        let (_, body) = call(&app, get("/get-saved-meal-plans/alice")).await;
        assert_eq!(body["meal_plans"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn saved_plans_can_be_renamed_counted_and_deleted() {
        let app = build_app(AppState::fake());
        for name in ["Cut", "Bulk"] {
            call(
                &app,
                json_request(
                    Method::POST,
                    "/save-meal-plan",
                    json!({ "userId": "alice", "mealPlanContent": "plan", "planName": name }),
                ),
            )
            .await;
        }

        let (status, body) = call(
            &app,
            json_request(Method::PATCH, "/saved-meal-plans/alice/1", json!({ "newName": "Lean" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meal_plan"]["mp_name"], "Lean");

        let (status, _) = call(
            &app,
            json_request(Method::PATCH, "/saved-meal-plans/bob/1", json!({ "newName": "Mine" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = call(&app, get("/get-saved-meal-plans/alice/count")).await;
        assert_eq!(body["count"], 2);

        let delete = Request::builder()
            .method(Method::DELETE)
            .uri("/saved-meal-plans/alice/2")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(&app, delete).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 1);

        let (_, body) = call(&app, get("/get-saved-meal-plans/alice")).await;
        let plans = body["meal_plans"].as_array().unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0]["mp_name"], "Lean");
        assert!(plans[0]["created_at"].is_string());
    }
}
