//! End-to-end tests of the HTTP API over an in-memory store.

use std::io::Read as _;
use std::sync::Arc;

use actix_web::{
    App,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    http::{StatusCode, header},
    test::{TestRequest, call_service, init_service, read_body},
    web,
};
use chrono::{Duration, FixedOffset, TimeZone as _, Utc};
use denuncia_database::{DenunciaStore, MemoryStore};
use denuncia_database_models::{DenunciaRow, UserIdentity, UserRole};
use denuncia_models::RecordedStatus;
use denuncia_report::layout::{OVERALL_HEADING, WINDOW_HEADING};
use denuncia_server::{AppState, configure, permissions::ACTOR_HEADER};
use serde_json::{Value, json};
use uuid::Uuid;

fn brt() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).unwrap()
}

fn test_app(
    store: Arc<MemoryStore>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let state = web::Data::new(AppState::new(store, brt()));
    App::new().app_data(state).configure(configure)
}

async fn json_body(response: ServiceResponse) -> Value {
    let body = read_body(response).await;
    serde_json::from_slice(&body).unwrap()
}

fn user(id: u128, role: UserRole) -> UserIdentity {
    UserIdentity {
        id: Uuid::from_u128(id),
        name: format!("Usuário {id}"),
        email: format!("usuario{id}@prefeitura.gov.br"),
        is_active: true,
        role,
    }
}

fn incident(categoria: &str, lat: f64, lon: f64, status: &str, days_ago: i64) -> DenunciaRow {
    let created = Utc.with_ymd_and_hms(2025, 10, 15, 15, 0, 0).unwrap() - Duration::days(days_ago);
    DenunciaRow {
        id: Uuid::new_v4(),
        protocolo: denuncia_models::generate_protocol(created.date_naive()),
        categoria: categoria.to_string(),
        descricao: format!("{categoria} registrado"),
        longitude: lon,
        latitude: lat,
        midia: None,
        audio: None,
        status: RecordedStatus::from(status),
        reporter_id: None,
        assigned_to: None,
        created_at: created,
        updated_at: created,
    }
}

async fn seed(store: &MemoryStore, rows: &[DenunciaRow]) {
    for row in rows {
        store.insert(row, None).await.unwrap();
    }
}

fn create_request(body: &Value) -> TestRequest {
    TestRequest::post().uri("/api/denuncias/create/").set_json(body)
}

#[actix_web::test]
async fn health_reports_version() {
    let app = init_service(test_app(Arc::new(MemoryStore::new()))).await;
    let response = call_service(&app, TestRequest::get().uri("/api/health").to_request()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["healthy"], true);
}

#[actix_web::test]
async fn create_returns_protocol() {
    let app = init_service(test_app(Arc::new(MemoryStore::new()))).await;
    let request = create_request(&json!({
        "categoria": "Vandalismo",
        "descricao": "Ponto de ônibus depredado",
        "latitude": -23.5505,
        "longitude": -46.6333,
    }))
    .to_request();

    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    let protocolo = body["protocolo"].as_str().unwrap();
    assert!(protocolo.starts_with("DEN"), "protocolo: {protocolo}");
    assert_eq!(body["status"], "em_analise");
    assert_eq!(body["reporter"], Value::Null);
}

#[actix_web::test]
async fn create_records_identified_reporter() {
    let store = Arc::new(MemoryStore::new());
    let citizen = user(7, UserRole::User);
    store.save_user(&citizen).await.unwrap();
    let app = init_service(test_app(store)).await;

    let request = create_request(&json!({
        "categoria": "Furto", "latitude": -23.55, "longitude": -46.63,
    }))
    .insert_header((ACTOR_HEADER, citizen.id.to_string()))
    .to_request();

    let body = json_body(call_service(&app, request).await).await;
    assert_eq!(body["reporter"], citizen.id.to_string());
}

#[actix_web::test]
async fn create_rejects_invalid_fields() {
    let app = init_service(test_app(Arc::new(MemoryStore::new()))).await;

    let blank = create_request(&json!({
        "categoria": "  ", "latitude": -23.55, "longitude": -46.63,
    }))
    .to_request();
    let response = call_service(&app, blank).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["categoria"].is_array());

    let long = create_request(&json!({
        "categoria": "Furto",
        "descricao": "a".repeat(1001),
        "latitude": -23.55,
        "longitude": -46.63,
    }))
    .to_request();
    let response = call_service(&app, long).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["descricao"].is_array());

    let bad_status = create_request(&json!({
        "categoria": "Furto", "latitude": -23.55, "longitude": -46.63, "status": "arquivado",
    }))
    .to_request();
    let response = call_service(&app, bad_status).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["status"].is_array());
}

#[actix_web::test]
async fn malformed_json_is_a_client_error() {
    let app = init_service(test_app(Arc::new(MemoryStore::new()))).await;
    let request = TestRequest::post()
        .uri("/api/denuncias/create/")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"categoria\": ")
        .to_request();

    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["detail"].is_string());
}

#[actix_web::test]
async fn list_filters_by_status() {
    let app = init_service(test_app(Arc::new(MemoryStore::new()))).await;
    for status in ["em_analise", "rejeitado"] {
        let request = create_request(&json!({
            "categoria": "Furto",
            "latitude": -23.55,
            "longitude": -46.63,
            "status": status,
        }))
        .to_request();
        assert_eq!(call_service(&app, request).await.status(), StatusCode::CREATED);
    }

    let request = TestRequest::get()
        .uri("/api/denuncias/?status=em_analise")
        .to_request();
    let body = json_body(call_service(&app, request).await).await;

    assert_eq!(body["count"], 1);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["status"], "em_analise");
}

#[actix_web::test]
async fn list_rejects_malformed_dates() {
    let app = init_service(test_app(Arc::new(MemoryStore::new()))).await;
    let request = TestRequest::get()
        .uri("/api/denuncias/?created_from=15-10-2025")
        .to_request();

    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["created_from"].is_string());
}

#[actix_web::test]
async fn list_paginates_newest_first() {
    let store = Arc::new(MemoryStore::new());
    seed(
        &store,
        &[
            incident("Furto", -23.55, -46.63, "em_analise", 3),
            incident("Roubo", -23.55, -46.63, "em_analise", 2),
            incident("Briga", -23.55, -46.63, "em_analise", 1),
        ],
    )
    .await;
    let app = init_service(test_app(store)).await;

    let request = TestRequest::get()
        .uri("/api/denuncias/?page_size=2")
        .to_request();
    let body = json_body(call_service(&app, request).await).await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"][0]["categoria"], "Briga");
    assert_eq!(body["results"][1]["categoria"], "Roubo");
    assert_eq!(body["previous"], Value::Null);
    let next = body["next"].as_str().unwrap();
    assert!(next.ends_with("/api/denuncias/?page_size=2&page=2"), "next: {next}");

    let request = TestRequest::get()
        .uri("/api/denuncias/?page_size=2&page=2")
        .to_request();
    let body = json_body(call_service(&app, request).await).await;
    assert_eq!(body["results"][0]["categoria"], "Furto");
    assert_eq!(body["next"], Value::Null);
    let previous = body["previous"].as_str().unwrap();
    assert!(previous.ends_with("/api/denuncias/?page_size=2"), "previous: {previous}");

    let request = TestRequest::get()
        .uri("/api/denuncias/?page=9")
        .to_request();
    let body = json_body(call_service(&app, request).await).await;
    assert_eq!(body["count"], 3);
    assert!(body["results"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn list_rejects_non_numeric_page_size() {
    let app = init_service(test_app(Arc::new(MemoryStore::new()))).await;

    let request = TestRequest::get()
        .uri("/api/denuncias/?page_size=abc")
        .to_request();
    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["page_size"].is_string(), "body: {body}");
}

#[actix_web::test]
async fn category_endpoint_matches_substrings() {
    let store = Arc::new(MemoryStore::new());
    seed(
        &store,
        &[
            incident("Roubo de celular", -23.55, -46.63, "em_analise", 1),
            incident("ROUBO", -23.55, -46.63, "em_analise", 2),
            incident("Furto", -23.55, -46.63, "em_analise", 3),
        ],
    )
    .await;
    let app = init_service(test_app(store)).await;

    let request = TestRequest::get()
        .uri("/api/denuncias/categoria/roubo/")
        .to_request();
    assert_eq!(json_body(call_service(&app, request).await).await["count"], 2);

    let request = TestRequest::get()
        .uri("/api/denuncias/?categoria=roubo")
        .to_request();
    assert_eq!(json_body(call_service(&app, request).await).await["count"], 1);
}

#[actix_web::test]
async fn heatmap_filters_by_bbox() {
    let app = init_service(test_app(Arc::new(MemoryStore::new()))).await;
    for (lat, lon) in [
        (-23.5505, -46.6333),
        (-23.545, -46.635),
        (-23.555, -46.625),
        (-22.9068, -43.1729),
    ] {
        let request = create_request(&json!({
            "categoria": "Furto", "latitude": lat, "longitude": lon,
        }))
        .to_request();
        assert_eq!(call_service(&app, request).await.status(), StatusCode::CREATED);
    }

    let request = TestRequest::get()
        .uri("/api/denuncias/heatmap/?bbox=-46.64,-23.56,-46.62,-23.54")
        .to_request();
    let points = json_body(call_service(&app, request).await).await;
    let points = points.as_array().unwrap();
    assert_eq!(points.len(), 3);
    assert!(points.iter().all(|p| p["weight"] == 1 && p["name"] == "Furto"));

    let request = TestRequest::get()
        .uri("/api/denuncias/heatmap/?bbox=garbage&start_date=nope&limit=-1")
        .to_request();
    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 4);

    let request = TestRequest::get()
        .uri("/api/denuncias/heatmap/?limit=2")
        .to_request();
    let points = json_body(call_service(&app, request).await).await;
    assert_eq!(points.as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn status_change_appears_in_history() {
    let store = Arc::new(MemoryStore::new());
    let staff = user(1, UserRole::Staff);
    store.save_user(&staff).await.unwrap();
    let app = init_service(test_app(store)).await;

    let request = create_request(&json!({
        "categoria": "Vandalismo", "latitude": -23.5505, "longitude": -46.6333,
    }))
    .to_request();
    let created = json_body(call_service(&app, request).await).await;
    let id = created["id"].as_str().unwrap();

    let request = TestRequest::patch()
        .uri(&format!("/api/denuncias/{id}/update/"))
        .insert_header((ACTOR_HEADER, staff.id.to_string()))
        .set_json(json!({ "status": "aprovado" }))
        .to_request();
    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["status"], "aprovado");
    assert_eq!(updated["protocolo"], created["protocolo"]);

    let request = TestRequest::get()
        .uri(&format!("/api/denuncias/{id}/historico/"))
        .to_request();
    let history = json_body(call_service(&app, request).await).await;

    assert_eq!(history[0]["field"], "status");
    assert_eq!(history[0]["old_value"], "em_analise");
    assert_eq!(history[0]["new_value"], "aprovado");
    assert_eq!(history[0]["user"]["email"], staff.email);
}

#[actix_web::test]
async fn assignment_resolves_user_in_history() {
    let store = Arc::new(MemoryStore::new());
    let admin = user(1, UserRole::Admin);
    let fiscal = user(2, UserRole::Staff);
    store.save_user(&admin).await.unwrap();
    store.save_user(&fiscal).await.unwrap();
    let row = incident("Tráfico", -23.55, -46.63, "em_analise", 1);
    seed(&store, std::slice::from_ref(&row)).await;
    let app = init_service(test_app(store)).await;

    let request = TestRequest::put()
        .uri(&format!("/api/denuncias/{}/update/", row.id))
        .insert_header((ACTOR_HEADER, admin.id.to_string()))
        .set_json(json!({ "usuario": fiscal.id }))
        .to_request();
    assert_eq!(call_service(&app, request).await.status(), StatusCode::OK);

    let request = TestRequest::put()
        .uri(&format!("/api/denuncias/{}/update/", row.id))
        .insert_header((ACTOR_HEADER, admin.id.to_string()))
        .set_json(json!({ "usuario": Uuid::from_u128(404) }))
        .to_request();
    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["usuario"].is_array());

    let request = TestRequest::get()
        .uri(&format!("/api/denuncias/{}/historico/", row.id))
        .to_request();
    let history = json_body(call_service(&app, request).await).await;
    let history = history.as_array().unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["field"], "usuario");
    assert_eq!(history[0]["old_value"], Value::Null);
    assert_eq!(history[0]["new_value"]["id"], fiscal.id.to_string());
    assert_eq!(history[0]["user"]["id"], admin.id.to_string());
}

#[actix_web::test]
async fn mutations_require_permission() {
    let store = Arc::new(MemoryStore::new());
    let citizen = user(5, UserRole::User);
    store.save_user(&citizen).await.unwrap();
    let mut row = incident("Furto", -23.55, -46.63, "em_analise", 1);
    row.reporter_id = Some(citizen.id);
    seed(&store, std::slice::from_ref(&row)).await;
    let app = init_service(test_app(store)).await;

    let request = TestRequest::patch()
        .uri(&format!("/api/denuncias/{}/update/", row.id))
        .set_json(json!({ "status": "aprovado" }))
        .to_request();
    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(json_body(response).await["detail"].is_string());

    let request = TestRequest::patch()
        .uri(&format!("/api/denuncias/{}/update/", row.id))
        .insert_header((ACTOR_HEADER, citizen.id.to_string()))
        .set_json(json!({ "status": "aprovado" }))
        .to_request();
    assert_eq!(call_service(&app, request).await.status(), StatusCode::FORBIDDEN);

    let request = TestRequest::delete()
        .uri(&format!("/api/denuncias/{}/delete/", row.id))
        .to_request();
    assert_eq!(call_service(&app, request).await.status(), StatusCode::FORBIDDEN);

    let request = TestRequest::delete()
        .uri(&format!("/api/denuncias/{}/delete/", row.id))
        .insert_header((ACTOR_HEADER, citizen.id.to_string()))
        .to_request();
    assert_eq!(call_service(&app, request).await.status(), StatusCode::NO_CONTENT);

    for path in ["", "historico/"] {
        let request = TestRequest::get()
            .uri(&format!("/api/denuncias/{}/{path}", row.id))
            .to_request();
        assert_eq!(
            call_service(&app, request).await.status(),
            StatusCode::NOT_FOUND,
            "{path}"
        );
    }
}

#[actix_web::test]
async fn detail_by_id_and_protocol() {
    let store = Arc::new(MemoryStore::new());
    let row = incident("Fraude", -23.55, -46.63, "aprovado", 1);
    seed(&store, std::slice::from_ref(&row)).await;
    let app = init_service(test_app(store)).await;

    let request = TestRequest::get()
        .uri(&format!("/api/denuncias/{}/", row.id))
        .to_request();
    let body = json_body(call_service(&app, request).await).await;
    assert_eq!(body["protocolo"], row.protocolo);

    let request = TestRequest::get()
        .uri(&format!("/api/denuncias/protocolo/{}/", row.protocolo))
        .to_request();
    let body = json_body(call_service(&app, request).await).await;
    assert_eq!(body["id"], row.id.to_string());

    let request = TestRequest::get()
        .uri("/api/denuncias/protocolo/DEN20250101-000000/")
        .to_request();
    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["detail"], "Não encontrado.");
}

#[actix_web::test]
async fn report_rejects_inverted_range() {
    let app = init_service(test_app(Arc::new(MemoryStore::new()))).await;
    let request = TestRequest::get()
        .uri("/api/denuncias/relatorios/?data_inicio=2025-10-20&data_fim=2025-10-01")
        .to_request();

    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["detail"].is_string());
}

#[actix_web::test]
async fn report_checks_format_first() {
    let app = init_service(test_app(Arc::new(MemoryStore::new()))).await;
    let request = TestRequest::get()
        .uri("/api/denuncias/relatorios/?formato=pdf&data_inicio=ontem")
        .to_request();

    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["formato"], "Formato inválido. Use csv, xlsx ou docs.");
    assert!(body.get("data_inicio").is_none());
}

#[actix_web::test]
async fn unfiltered_csv_report_has_no_overall_block() {
    let store = Arc::new(MemoryStore::new());
    seed(
        &store,
        &[
            incident("Furto", -23.55, -46.63, "em_analise", 1),
            incident("Roubo", -23.55, -46.63, "aprovado", 2),
            incident("Briga", -23.55, -46.63, "rejeitado", 3),
        ],
    )
    .await;
    let app = init_service(test_app(store)).await;

    let request = TestRequest::get()
        .uri("/api/denuncias/relatorios/")
        .to_request();
    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"relatorio_denuncias_"));
    assert!(disposition.ends_with(".csv\""));

    let body = String::from_utf8(read_body(response).await.to_vec()).unwrap();
    assert!(body.contains("Total de denúncias: 3"));
    assert!(body.contains(WINDOW_HEADING));
    assert!(!body.contains(OVERALL_HEADING));
}

#[actix_web::test]
async fn filtered_docx_report_has_overall_block() {
    let store = Arc::new(MemoryStore::new());
    let recent = incident("Furto", -23.55, -46.63, "em_analise", 0);
    seed(
        &store,
        &[
            recent.clone(),
            incident("Roubo", -23.55, -46.63, "aprovado", 40),
        ],
    )
    .await;
    let app = init_service(test_app(store)).await;

    let day = recent.created_at.with_timezone(&brt()).format("%Y-%m-%d");
    let request = TestRequest::get()
        .uri(&format!(
            "/api/denuncias/relatorios/?formato=docs&data_inicio={day}&data_fim={day}"
        ))
        .to_request();
    let response = call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = read_body(response).await.to_vec();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut document = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut document)
        .unwrap();

    assert!(document.contains("Total de denúncias: 1"));
    assert!(document.contains(OVERALL_HEADING));
    assert!(document.contains(&recent.protocolo));
}

#[actix_web::test]
async fn dashboard_wraps_metrics() {
    let store = Arc::new(MemoryStore::new());
    store.save_user(&user(1, UserRole::User)).await.unwrap();
    seed(
        &store,
        &[
            incident("Furto", -23.55, -46.63, "em_analise", 1),
            incident("Roubo", -23.55, -46.63, "aprovado", 2),
        ],
    )
    .await;
    let app = init_service(test_app(store)).await;

    let request = TestRequest::get()
        .uri("/api/denuncias/dashboard/")
        .to_request();
    let body = json_body(call_service(&app, request).await).await;
    let metrics = &body["metrics"];

    assert_eq!(metrics["totalReports"], 2);
    assert_eq!(metrics["totalActiveUsers"], 1);
    assert_eq!(metrics["reportsByStatus"]["pending"], 1);
    assert_eq!(metrics["reportsByStatus"]["resolved"], 1);
    assert!(metrics["resolutionRateComparison"]["currentMonth"]["month"].is_string());
}
