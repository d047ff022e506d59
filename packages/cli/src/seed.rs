//! Fictitious incidents for demos and load testing.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use denuncia_database::{DbError, DenunciaStore};
use denuncia_database_models::{DenunciaFilter, DenunciaRow};
use denuncia_models::{DenunciaStatus, generate_protocol};
use rand::Rng;
use rand::seq::SliceRandom as _;
use uuid::Uuid;

/// Categories drawn from when seeding.
pub const CATEGORIES: [&str; 10] = [
    "Furto",
    "Roubo",
    "Vandalismo",
    "Violência",
    "Tráfico",
    "Perturbação",
    "Depredação",
    "Briga",
    "Fraude",
    "Outros",
];

/// How far back creation dates go.
pub const MAX_DAYS_BACK: i64 = 180;

/// Brazil's bounding box as `(min, max)` latitude and longitude.
pub const LATITUDE_RANGE: (f64, f64) = (-33.75, 5.27);
pub const LONGITUDE_RANGE: (f64, f64) = (-73.98, -34.79);

/// Builds one random incident created before `now`.
pub fn random_incident(
    rng: &mut impl Rng,
    sequence: u64,
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> DenunciaRow {
    let created_at = now
        - Duration::days(rng.gen_range(0..=MAX_DAYS_BACK))
        - Duration::hours(rng.gen_range(0..24))
        - Duration::minutes(rng.gen_range(0..60));
    let updated_at = created_at + Duration::hours(rng.gen_range(0..=72));

    DenunciaRow {
        id: Uuid::new_v4(),
        protocolo: generate_protocol(created_at.with_timezone(&tz).date_naive()),
        categoria: CATEGORIES
            .choose(rng)
            .copied()
            .unwrap_or("Outros")
            .to_string(),
        descricao: format!("Denúncia automática #{sequence}"),
        longitude: rng.gen_range(LONGITUDE_RANGE.0..=LONGITUDE_RANGE.1),
        latitude: rng.gen_range(LATITUDE_RANGE.0..=LATITUDE_RANGE.1),
        midia: None,
        audio: None,
        status: DenunciaStatus::all()
            .choose(rng)
            .copied()
            .unwrap_or_default()
            .into(),
        reporter_id: None,
        assigned_to: None,
        created_at,
        updated_at,
    }
}

/// Tops the store up to `total` incidents. Returns how many were created.
///
/// Rows whose protocol collides with an existing one are skipped.
///
/// # Errors
///
/// Returns [`DbError`] if counting or inserting fails.
pub async fn seed(
    store: &dyn DenunciaStore,
    total: u64,
    rng: &mut (impl Rng + Send),
    tz: FixedOffset,
) -> Result<u64, DbError> {
    let existing = store.count(&DenunciaFilter::default()).await?;
    let missing = total.saturating_sub(existing);
    if missing == 0 {
        log::warn!("Store already holds {existing} incidents; nothing to seed");
        return Ok(0);
    }

    let now = Utc::now();
    let mut created = 0;
    for i in 0..missing {
        let row = random_incident(rng, existing + i + 1, now, tz);
        match store.insert(&row, None).await {
            Ok(()) => created += 1,
            Err(DbError::DuplicateProtocol { protocolo }) => {
                log::debug!("Skipping duplicate protocol {protocolo}");
            }
            Err(e) => return Err(e),
        }
    }

    log::info!("Seeded {created} incidents");
    Ok(created)
}
