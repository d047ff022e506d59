//! HTTP handler functions for the denúncia API.

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use chrono::Utc;
use denuncia_analytics::{
    dashboard::build_dashboard,
    query::{build_report, heatmap_rows, list_page},
};
use denuncia_database::create_denuncia;
use denuncia_database_models::{
    DenunciaChanges, DenunciaFilter, DenunciaRow, MAX_CATEGORY_LENGTH, MAX_DESCRIPTION_LENGTH,
    NewDenuncia,
};
use denuncia_filters::{
    ListParams, category_filter, heatmap_filter, list_filter, parse_limit, parse_page_request,
    report_date_bounds,
};
use denuncia_history::load_history;
use denuncia_models::{DenunciaStatus, RecordedStatus};
use denuncia_report::{ReportFormat, render};
use denuncia_server_models::{
    ApiDashboard, ApiDenuncia, ApiHealth, ApiHeatmapPoint, ApiPage, CreateDenunciaPayload,
    HeatmapQueryParams, ListQueryParams, ReportQueryParams, UpdateDenunciaPayload,
    attachment_ref,
};
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    permissions::{Action, current_actor},
};

type ApiResult = Result<HttpResponse, ApiError>;

const BLANK_REASON: &str = "Este campo não pode ser em branco.";
const RANGE_REASON: &str = "Valor fora do intervalo permitido.";
const PAIR_REASON: &str = "Informe latitude e longitude juntas.";

fn too_long(max: usize) -> String {
    format!("Certifique-se de que este campo não tenha mais de {max} caracteres.")
}

fn validate_categoria(raw: &str) -> Result<String, ApiError> {
    let categoria = raw.trim();
    if categoria.is_empty() {
        return Err(ApiError::field("categoria", BLANK_REASON));
    }
    if categoria.chars().count() > MAX_CATEGORY_LENGTH {
        return Err(ApiError::field("categoria", too_long(MAX_CATEGORY_LENGTH)));
    }
    Ok(categoria.to_string())
}

fn validate_descricao(raw: &str) -> Result<String, ApiError> {
    if raw.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ApiError::field("descricao", too_long(MAX_DESCRIPTION_LENGTH)));
    }
    Ok(raw.to_string())
}

fn validate_location(latitude: f64, longitude: f64) -> Result<(f64, f64), ApiError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ApiError::field("latitude", RANGE_REASON));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ApiError::field("longitude", RANGE_REASON));
    }
    Ok((longitude, latitude))
}

fn parse_status(raw: &str) -> Result<DenunciaStatus, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::field("status", format!("\"{raw}\" não é um escolha válido.")))
}

fn changes_from(payload: UpdateDenunciaPayload) -> Result<DenunciaChanges, ApiError> {
    let location = match (payload.latitude, payload.longitude) {
        (None, None) => None,
        (Some(lat), Some(lon)) => Some(validate_location(lat, lon)?),
        (Some(_), None) => return Err(ApiError::field("longitude", PAIR_REASON)),
        (None, Some(_)) => return Err(ApiError::field("latitude", PAIR_REASON)),
    };

    Ok(DenunciaChanges {
        categoria: payload.categoria.as_deref().map(validate_categoria).transpose()?,
        descricao: payload.descricao.as_deref().map(validate_descricao).transpose()?,
        location,
        midia: payload.midia.map(attachment_ref),
        audio: payload.audio.map(attachment_ref),
        status: payload
            .status
            .as_deref()
            .map(parse_status)
            .transpose()?
            .map(RecordedStatus::from),
        assigned_to: payload.usuario,
    })
}

/// Current URL with `page` replaced. Page 1 drops the parameter.
fn page_link(req: &HttpRequest, page: u64) -> String {
    let mut url = req.full_url();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    {
        let mut query = url.query_pairs_mut();
        query.clear().extend_pairs(kept);
        if page > 1 {
            query.append_pair("page", &page.to_string());
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    url.to_string()
}

async fn paginated(
    state: &AppState,
    req: &HttpRequest,
    filter: &DenunciaFilter,
    params: &ListQueryParams,
) -> ApiResult {
    let request = parse_page_request(params.page.as_deref(), params.page_size.as_deref())?;
    let page = list_page(state.store.as_ref(), filter, request).await?;

    let next = page.has_next().then(|| page_link(req, page.page + 1));
    let previous = (page.page > 1).then(|| page_link(req, page.page - 1));

    Ok(HttpResponse::Ok().json(ApiPage {
        count: page.count,
        next,
        previous,
        results: page.results.into_iter().map(ApiDenuncia::from).collect(),
    }))
}

async fn existing(state: &AppState, id: Uuid) -> Result<DenunciaRow, ApiError> {
    state.store.get(id).await?.ok_or(ApiError::NotFound)
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/denuncias/create/`
///
/// Anonymous reports are accepted; an identified actor is recorded as the
/// reporter.
pub async fn create(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<CreateDenunciaPayload>,
) -> ApiResult {
    let actor = current_actor(&req, state.store.as_ref()).await?;
    if !state.policy.can_act(actor.as_ref(), Action::Create, None) {
        return Err(ApiError::Forbidden);
    }

    let payload = payload.into_inner();
    let (longitude, latitude) = validate_location(payload.latitude, payload.longitude)?;
    let actor_id = actor.as_ref().map(|user| user.id);
    let new = NewDenuncia {
        categoria: validate_categoria(&payload.categoria)?,
        descricao: validate_descricao(&payload.descricao)?,
        longitude,
        latitude,
        midia: attachment_ref(payload.midia),
        audio: attachment_ref(payload.audio),
        status: payload.status.as_deref().map(parse_status).transpose()?,
        reporter_id: actor_id,
    };

    let row = create_denuncia(state.store.as_ref(), new, actor_id, Utc::now(), state.tz).await?;

    Ok(HttpResponse::Created().json(ApiDenuncia::from(row)))
}

/// `GET /api/denuncias/`
///
/// Filters by `status`, `categoria`, `created_from`, `created_to`;
/// newest first, paginated.
pub async fn list(
    state: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<ListQueryParams>,
) -> ApiResult {
    let filter = list_filter(
        ListParams {
            status: params.status.as_deref(),
            categoria: params.categoria.as_deref(),
            created_from: params.created_from.as_deref(),
            created_to: params.created_to.as_deref(),
        },
        state.tz,
    )?;
    paginated(&state, &req, &filter, &params).await
}

/// `GET /api/denuncias/categoria/{categoria}/`
pub async fn by_category(
    state: web::Data<AppState>,
    req: HttpRequest,
    categoria: web::Path<String>,
    params: web::Query<ListQueryParams>,
) -> ApiResult {
    let filter = category_filter(&categoria);
    paginated(&state, &req, &filter, &params).await
}

/// `GET /api/denuncias/heatmap/`
///
/// Never fails on bad input: malformed values are dropped.
pub async fn heatmap(
    state: web::Data<AppState>,
    params: web::Query<HeatmapQueryParams>,
) -> ApiResult {
    let filter = heatmap_filter(
        params.bbox.as_deref(),
        params.start_date.as_deref(),
        params.end_date.as_deref(),
        state.tz,
    );
    let limit = parse_limit(params.limit.as_deref());

    let rows = heatmap_rows(state.store.as_ref(), &filter, limit).await?;
    let points: Vec<ApiHeatmapPoint> = rows
        .into_iter()
        .map(|row| ApiHeatmapPoint::from_row(row, state.tz))
        .collect();

    Ok(HttpResponse::Ok().json(points))
}

/// `GET /api/denuncias/relatorios/`
///
/// The format is checked before the dates so an unsupported `formato`
/// wins over a bad range.
pub async fn report(
    state: web::Data<AppState>,
    params: web::Query<ReportQueryParams>,
) -> ApiResult {
    let format = ReportFormat::parse(params.formato.as_deref())?;
    let (start, end) = report_date_bounds(
        params.data_inicio.as_deref(),
        params.data_fim.as_deref(),
        state.tz,
    )?;

    let report = build_report(state.store.as_ref(), start, end, state.tz).await?;
    let rendered = render(&report, format, Utc::now().with_timezone(&state.tz))?;
    log::info!(
        "Generated {format} report with {} incidents",
        report.summary.total
    );

    Ok(HttpResponse::Ok()
        .content_type(rendered.content_type)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", rendered.filename),
        ))
        .body(rendered.bytes))
}

/// `GET /api/denuncias/dashboard/`
pub async fn dashboard(state: web::Data<AppState>) -> ApiResult {
    let metrics = build_dashboard(state.store.as_ref(), Utc::now(), state.tz).await?;
    Ok(HttpResponse::Ok().json(ApiDashboard { metrics }))
}

/// `GET /api/denuncias/protocolo/{protocolo}/`
pub async fn by_protocol(state: web::Data<AppState>, protocolo: web::Path<String>) -> ApiResult {
    let row = state
        .store
        .get_by_protocol(protocolo.trim())
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(ApiDenuncia::from(row)))
}

/// `GET /api/denuncias/{id}/`
pub async fn detail(state: web::Data<AppState>, id: web::Path<Uuid>) -> ApiResult {
    let row = existing(&state, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiDenuncia::from(row)))
}

/// `PUT`/`PATCH /api/denuncias/{id}/update/`
///
/// Only the fields present in the body change. Changing `usuario` also
/// needs [`Action::Assign`].
pub async fn update(
    state: web::Data<AppState>,
    req: HttpRequest,
    id: web::Path<Uuid>,
    payload: web::Json<UpdateDenunciaPayload>,
) -> ApiResult {
    let id = id.into_inner();
    let actor = current_actor(&req, state.store.as_ref()).await?;
    let row = existing(&state, id).await?;
    if !state.policy.can_act(actor.as_ref(), Action::Update, Some(&row)) {
        return Err(ApiError::Forbidden);
    }

    let changes = changes_from(payload.into_inner())?;
    if changes.changes_assignee() {
        if !state.policy.can_act(actor.as_ref(), Action::Assign, Some(&row)) {
            return Err(ApiError::Forbidden);
        }
        if let Some(Some(assignee)) = changes.assigned_to
            && state.store.find_user(assignee).await?.is_none()
        {
            return Err(ApiError::field(
                "usuario",
                format!("Pk inválido \"{assignee}\" - objeto não existe."),
            ));
        }
    }

    let actor_id = actor.as_ref().map(|user| user.id);
    let updated = state
        .store
        .update(id, &changes, actor_id, Utc::now())
        .await?
        .ok_or(ApiError::NotFound)?;
    log::info!("Updated incident {}", updated.protocolo);

    Ok(HttpResponse::Ok().json(ApiDenuncia::from(updated)))
}

/// `DELETE /api/denuncias/{id}/delete/`
pub async fn delete(
    state: web::Data<AppState>,
    req: HttpRequest,
    id: web::Path<Uuid>,
) -> ApiResult {
    let id = id.into_inner();
    let actor = current_actor(&req, state.store.as_ref()).await?;
    let row = existing(&state, id).await?;
    if !state.policy.can_act(actor.as_ref(), Action::Delete, Some(&row)) {
        return Err(ApiError::Forbidden);
    }

    if !state.store.delete(id).await? {
        return Err(ApiError::NotFound);
    }
    log::info!("Deleted incident {}", row.protocolo);

    Ok(HttpResponse::NoContent().finish())
}

/// `GET /api/denuncias/{id}/historico/`
pub async fn history(state: web::Data<AppState>, id: web::Path<Uuid>) -> ApiResult {
    let entries = load_history(state.store.as_ref(), id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_is_trimmed_and_bounded() {
        assert_eq!(validate_categoria("  Furto ").unwrap(), "Furto");
        assert!(matches!(
            validate_categoria("   "),
            Err(ApiError::Field { ref field, .. }) if field == "categoria"
        ));
        assert!(validate_categoria(&"x".repeat(MAX_CATEGORY_LENGTH)).is_ok());
        assert!(validate_categoria(&"x".repeat(MAX_CATEGORY_LENGTH + 1)).is_err());
    }

    #[test]
    fn description_length_counts_characters() {
        assert!(validate_descricao(&"ã".repeat(MAX_DESCRIPTION_LENGTH)).is_ok());
        assert!(validate_descricao(&"ã".repeat(MAX_DESCRIPTION_LENGTH + 1)).is_err());
    }

    #[test]
    fn location_must_be_in_range() {
        assert_eq!(validate_location(-23.5, -46.6).unwrap(), (-46.6, -23.5));
        assert!(validate_location(91.0, 0.0).is_err());
        assert!(validate_location(0.0, -181.0).is_err());
    }

    #[test]
    fn update_needs_both_coordinates() {
        let payload = UpdateDenunciaPayload {
            latitude: Some(-23.5),
            ..UpdateDenunciaPayload::default()
        };
        assert!(matches!(
            changes_from(payload),
            Err(ApiError::Field { ref field, .. }) if field == "longitude"
        ));
    }

    #[test]
    fn update_maps_status_and_attachments() {
        let payload = UpdateDenunciaPayload {
            status: Some("rejeitado".to_string()),
            midia: Some(Some(String::new())),
            usuario: Some(None),
            ..UpdateDenunciaPayload::default()
        };
        let changes = changes_from(payload).unwrap();
        assert_eq!(changes.status, Some(DenunciaStatus::Rejeitado.into()));
        assert_eq!(changes.midia, Some(None));
        assert!(changes.changes_assignee());

        let bad = UpdateDenunciaPayload {
            status: Some("arquivado".to_string()),
            ..UpdateDenunciaPayload::default()
        };
        assert!(matches!(
            changes_from(bad),
            Err(ApiError::Field { ref field, .. }) if field == "status"
        ));
    }
}
