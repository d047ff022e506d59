//! Result limiting and pagination parameters.

use denuncia_database_models::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageRequest};

use crate::FilterError;

/// Heatmap `limit`: a positive integer caps the result, anything else
/// (absent, zero, negative, non-numeric) means no cap.
#[must_use]
pub fn parse_limit(raw: Option<&str>) -> Option<u64> {
    let value: i64 = raw?.trim().parse().ok()?;
    u64::try_from(value).ok().filter(|limit| *limit > 0)
}

/// `page` and `page_size`.
///
/// `page_size` falls back to the default when absent or not positive and is
/// capped at the maximum. `page` values below 1 are treated as 1; pages
/// past the end are allowed and simply come back empty.
///
/// # Errors
///
/// * [`FilterError::InvalidParameter`] if `page` or `page_size` is not an
///   integer
pub fn parse_page_request(
    page: Option<&str>,
    page_size: Option<&str>,
) -> Result<PageRequest, FilterError> {
    let page = match page.map(str::trim).filter(|p| !p.is_empty()) {
        None => 1,
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| FilterError::invalid("page", "Página inválida."))?
            .max(1),
    };

    let page_size = match page_size.map(str::trim).filter(|p| !p.is_empty()) {
        None => DEFAULT_PAGE_SIZE,
        Some(raw) => {
            let size = raw
                .parse::<i64>()
                .map_err(|_| FilterError::invalid("page_size", "Tamanho de página inválido."))?;
            u64::try_from(size)
                .ok()
                .filter(|size| *size > 0)
                .map_or(DEFAULT_PAGE_SIZE, |size| size.min(MAX_PAGE_SIZE))
        }
    };

    Ok(PageRequest::new(
        u64::try_from(page).unwrap_or(1),
        page_size,
    ))
}
