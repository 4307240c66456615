use axum::Json;

pub async fn home() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Scheduler Backend Running",
        "status": "Live",
    }))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
