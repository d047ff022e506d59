//! Complete predicate sets for each endpoint family.

use chrono::FixedOffset;
use denuncia_database_models::{CategoryMatch, DenunciaFilter};

use crate::{FilterError, heatmap_date_bounds, list_date_bound, parse_bbox};

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

/// Raw list endpoint parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListParams<'a> {
    /// `status`
    pub status: Option<&'a str>,
    /// `categoria`
    pub categoria: Option<&'a str>,
    /// `created_from`
    pub created_from: Option<&'a str>,
    /// `created_to`
    pub created_to: Option<&'a str>,
}

/// Builds the list predicate: exact status, whole-value category, strict
/// creation bounds. Empty values are treated as absent.
///
/// # Errors
///
/// * [`FilterError::InvalidParameter`] if `created_from` or `created_to`
///   is not a date or timestamp
pub fn list_filter(params: ListParams<'_>, tz: FixedOffset) -> Result<DenunciaFilter, FilterError> {
    let created_from = present(params.created_from)
        .map(|raw| list_date_bound(raw, "created_from", false, tz))
        .transpose()?;
    let created_to = present(params.created_to)
        .map(|raw| list_date_bound(raw, "created_to", true, tz))
        .transpose()?;

    Ok(DenunciaFilter {
        status: present(params.status).map(str::to_string),
        category: present(params.categoria).map(|c| CategoryMatch::Exact(c.to_string())),
        ..DenunciaFilter::default()
    }
    .with_created_range(created_from, created_to))
}

/// Builds the category endpoint predicate: case-insensitive substring.
#[must_use]
pub fn category_filter(categoria: &str) -> DenunciaFilter {
    DenunciaFilter {
        category: Some(CategoryMatch::Contains(categoria.to_string())),
        ..DenunciaFilter::default()
    }
}

/// Builds the heatmap predicate. Nothing here can fail: a malformed
/// `bbox` or date simply contributes no constraint.
#[must_use]
pub fn heatmap_filter(
    bbox: Option<&str>,
    start_date: Option<&str>,
    end_date: Option<&str>,
    tz: FixedOffset,
) -> DenunciaFilter {
    let bbox = bbox.and_then(|raw| {
        let parsed = parse_bbox(raw);
        if parsed.is_none() {
            log::debug!("Ignoring malformed bbox {raw:?}");
        }
        parsed
    });
    let (from, to) = heatmap_date_bounds(start_date, end_date, tz);

    DenunciaFilter {
        bbox,
        ..DenunciaFilter::default()
    }
    .with_created_range(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone as _, Utc};

    fn brt() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    #[test]
    fn empty_list_params_select_everything() {
        let filter = list_filter(ListParams::default(), brt()).unwrap();
        assert_eq!(filter, DenunciaFilter::default());

        let blanks = ListParams {
            status: Some(""),
            categoria: Some("  "),
            created_from: Some(""),
            created_to: None,
        };
        assert_eq!(list_filter(blanks, brt()).unwrap(), DenunciaFilter::default());
    }

    #[test]
    fn list_filter_composes_every_parameter() {
        let filter = list_filter(
            ListParams {
                status: Some("em_analise"),
                categoria: Some("furto"),
                created_from: Some("2025-10-01"),
                created_to: Some("2025-10-01T18:30:00Z"),
            },
            brt(),
        )
        .unwrap();

        assert_eq!(filter.status.as_deref(), Some("em_analise"));
        assert_eq!(filter.category, Some(CategoryMatch::Exact("furto".to_string())));
        assert_eq!(
            filter.created_from,
            Some(Utc.with_ymd_and_hms(2025, 10, 1, 3, 0, 0).unwrap())
        );
        assert_eq!(
            filter.created_to,
            Some(Utc.with_ymd_and_hms(2025, 10, 1, 18, 30, 0).unwrap())
        );
    }

    #[test]
    fn list_filter_names_the_bad_parameter() {
        let err = list_filter(
            ListParams {
                created_to: Some("ontem"),
                ..ListParams::default()
            },
            brt(),
        )
        .unwrap_err();
        assert!(
            matches!(err, FilterError::InvalidParameter { ref param, .. } if param == "created_to"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn heatmap_filter_tolerates_garbage() {
        let filter = heatmap_filter(Some("1,2,3"), Some("amanhã"), None, brt());
        assert_eq!(filter, DenunciaFilter::default());

        let filter = heatmap_filter(Some("-46.64,-23.56,-46.62,-23.54"), None, None, brt());
        assert!(filter.bbox.is_some());
        assert!(!filter.has_temporal());
    }

    #[test]
    fn category_endpoint_uses_substring_match() {
        assert_eq!(
            category_filter("roub").category,
            Some(CategoryMatch::Contains("roub".to_string()))
        );
    }
}
