use crate::agent::pipeline::nl_to_sql_and_run;
use crate::context::AppContext;
use actix_web::{get, post, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(query).service(healthcheck);
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

/// one submission: always 200, failures travel inside the result table
#[post("/api/query")]
async fn query(req: web::Json<QueryRequest>, ctx: web::Data<AppContext>) -> impl Responder {
    tracing::debug!("received question ({} chars)", req.question.len());
    let outcome = nl_to_sql_and_run(ctx.get_ref(), &req.question).await;
    HttpResponse::Ok().json(outcome)
}

#[get("/healthcheck")]
async fn healthcheck() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::pipeline::testing::MockLlm;
    use crate::agent::validator::ValidationPolicy;
    use crate::db::{connect, QueryBackend};
    use crate::schema::SchemaDescription;
    use actix_web::{test, App};
    use serde_json::Value;
    use std::sync::Arc;

    async fn context(reply: Option<&str>) -> AppContext {
        let schema = SchemaDescription::from_json_str(include_str!("../../../data/schema.json")).unwrap();
        let db = connect("sqlite::memory:", None).await.unwrap();
        db.fetch(
            "CREATE TABLE departments (department_id INTEGER PRIMARY KEY, name TEXT);
             INSERT INTO departments VALUES (1, 'Sales'), (2, 'Engineering');",
        )
        .await
        .unwrap();
        let llm = match reply {
            Some(reply) => MockLlm::replying(reply),
            None => MockLlm::failing(),
        };
        AppContext::new(schema, Arc::new(llm), db, ValidationPolicy::Disabled)
    }

    #[actix_web::test]
    async fn test_index_serves_form() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body = test::read_body(resp).await;
        let html = std::str::from_utf8(&body).unwrap();
        assert!(html.contains("Natural Language to SQL"));
        assert!(html.contains("Generate &amp; Run SQL"));
    }

    #[actix_web::test]
    async fn test_query_returns_sql_and_rows() {
        let ctx = context(Some("select name from departments order by department_id")).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/query")
            .set_json(QueryRequest {
                question: "List all departments".to_string(),
            })
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["sql"], "SELECT name\nFROM departments\nORDER BY department_id");
        assert_eq!(body["translation_available"], true);
        assert_eq!(body["result"]["columns"], serde_json::json!(["name"]));
        assert_eq!(body["result"]["rows"][1][0], "Engineering");
    }

    #[actix_web::test]
    async fn test_query_translation_failure_is_ok_response() {
        let ctx = context(None).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/query")
            .set_json(QueryRequest {
                question: "anything".to_string(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: Value = test::read_body_json(resp).await;
        assert!(body["sql"].is_null());
        assert_eq!(body["result"]["is_error"], true);
        assert_eq!(body["result"]["columns"], serde_json::json!(["Error"]));
    }

    #[actix_web::test]
    async fn test_healthcheck() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/healthcheck").to_request();
        let body: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }
}
