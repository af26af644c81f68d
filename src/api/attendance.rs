use crate::auth::auth::AuthUser;
use crate::calendar::{bornes_mois, est_jour_ferie};
use crate::error::ApiError;
use crate::model::attendance::{Pointage, StatutPointage};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreatePointage {
    /// Obligatoire: un pointage sans employé sélectionné est rejeté.
    #[schema(example = 1)]
    pub employe_id: Option<i64>,

    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub statut: StatutPointage,

    #[schema(example = 1.0)]
    pub jours_travailles: Option<f64>,

    #[schema(example = 0.0)]
    pub heures_supp: Option<f64>,

    /// Avance en TND, facultative (0 par défaut).
    #[schema(example = 50.0)]
    pub avance: Option<f64>,

    pub note: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PointageQuery {
    #[schema(example = 1)]
    pub employe_id: Option<i64>,

    #[schema(example = 1)]
    pub mois: Option<u32>,

    #[schema(example = 2026)]
    pub annee: Option<i32>,

    #[schema(example = "PRESENT")]
    pub statut: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct PointageResponse {
    #[schema(example = "Présence enregistrée avec succès")]
    pub message: String,
    pub pointage: Pointage,
}

/// Saisie ou correction d'un pointage (chef de chantier uniquement)
#[utoipa::path(
    post,
    path = "/api/pointage",
    request_body = CreatePointage,
    responses(
        (status = 200, description = "Pointage enregistré", body = PointageResponse),
        (status = 400, description = "Champ requis manquant ou valeur invalide"),
        (status = 401, description = "Non authentifié"),
        (status = 403, description = "Accès refusé (rôle non autorisé)"),
        (status = 404, description = "Employé non trouvé")
    ),
    security(("bearer_auth" = [])),
    tag = "Pointage"
)]
pub async fn create_pointage(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreatePointage>,
) -> Result<HttpResponse, ApiError> {
    auth.require_chef()?;

    let employe_id = payload
        .employe_id
        .ok_or_else(|| ApiError::champ_requis("employé"))?;

    let avance = payload.avance.unwrap_or(0.0);
    if avance < 0.0 {
        return Err(ApiError::Validation(
            "L'avance ne peut pas être négative".into(),
        ));
    }

    let mut jours_travailles = payload.jours_travailles.unwrap_or(1.0);
    let mut heures_supp = payload.heures_supp.unwrap_or(0.0);
    if jours_travailles < 0.0 || heures_supp < 0.0 {
        return Err(ApiError::Validation(
            "Jours travaillés et heures supp doivent être positifs".into(),
        ));
    }

    let connu: Option<i64> = sqlx::query_scalar("SELECT id FROM employes WHERE id = ?")
        .bind(employe_id)
        .fetch_optional(pool.get_ref())
        .await?;
    if connu.is_none() {
        return Err(ApiError::NotFound("Employé".into()));
    }

    // une présence saisie un jour férié fixe est reclassée automatiquement
    let mut statut = payload.statut;
    if statut == StatutPointage::Present && est_jour_ferie(payload.date) {
        statut = StatutPointage::Ferie;
    }

    // un absent ne compte ni jours ni heures supp
    if statut == StatutPointage::Absent {
        jours_travailles = 0.0;
        heures_supp = 0.0;
    }

    // une ligne par (employé, date): la réécriture remplace en place
    sqlx::query(
        r#"
        INSERT INTO pointages (employe_id, date, statut, jours_travailles, heures_supp, avance, note)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (employe_id, date) DO UPDATE SET
            statut = excluded.statut,
            jours_travailles = excluded.jours_travailles,
            heures_supp = excluded.heures_supp,
            avance = excluded.avance,
            note = excluded.note
        "#,
    )
    .bind(employe_id)
    .bind(payload.date)
    .bind(statut)
    .bind(jours_travailles)
    .bind(heures_supp)
    .bind(avance)
    .bind(&payload.note)
    .execute(pool.get_ref())
    .await?;

    // relecture immédiate: l'état renvoyé est l'état stocké
    let pointage = sqlx::query_as::<_, Pointage>(
        r#"
        SELECT id, employe_id, date, statut, jours_travailles, heures_supp, avance, note
        FROM pointages
        WHERE employe_id = ? AND date = ?
        "#,
    )
    .bind(employe_id)
    .bind(payload.date)
    .fetch_one(pool.get_ref())
    .await?;

    tracing::info!(
        employe_id,
        date = %payload.date,
        statut = %statut,
        "Pointage enregistré"
    );

    Ok(HttpResponse::Ok().json(PointageResponse {
        message: "Présence enregistrée avec succès".into(),
        pointage,
    }))
}

/// Liste des pointages, filtrable par employé, période et statut
#[utoipa::path(
    get,
    path = "/api/pointages",
    params(PointageQuery),
    responses(
        (status = 200, description = "Liste des pointages", body = [Pointage]),
        (status = 400, description = "Filtre invalide"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Pointage"
)]
pub async fn list_pointages(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<PointageQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_chef_or_admin()?;

    let statut = match &query.statut {
        Some(s) => Some(
            StatutPointage::from_str(s)
                .map_err(|_| ApiError::Validation(format!("Statut inconnu: {s}")))?,
        ),
        None => None,
    };

    let (debut, fin) = match (query.mois, query.annee) {
        (Some(mois), Some(annee)) => {
            let bornes = bornes_mois(mois, annee)
                .ok_or_else(|| ApiError::Validation("Mois invalide".into()))?;
            (Some(bornes.0), Some(bornes.1))
        }
        _ => (None, None),
    };

    let pointages = sqlx::query_as::<_, Pointage>(
        r#"
        SELECT id, employe_id, date, statut, jours_travailles, heures_supp, avance, note
        FROM pointages
        WHERE (?1 IS NULL OR employe_id = ?1)
          AND (?2 IS NULL OR statut = ?2)
          AND (?3 IS NULL OR date >= ?3)
          AND (?4 IS NULL OR date <= ?4)
        ORDER BY date DESC, id DESC
        "#,
    )
    .bind(query.employe_id)
    .bind(statut)
    .bind(debut)
    .bind(fin)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(pointages))
}

/// Pointages d'un employé sur un mois donné (chargeur partagé paie/rapports).
pub(crate) async fn pointages_du_mois(
    pool: &SqlitePool,
    employe_id: i64,
    mois: u32,
    annee: i32,
) -> Result<Vec<Pointage>, ApiError> {
    let (debut, fin) =
        bornes_mois(mois, annee).ok_or_else(|| ApiError::Validation("Mois invalide".into()))?;

    let pointages = sqlx::query_as::<_, Pointage>(
        r#"
        SELECT id, employe_id, date, statut, jours_travailles, heures_supp, avance, note
        FROM pointages
        WHERE employe_id = ? AND date >= ? AND date <= ?
        ORDER BY date ASC
        "#,
    )
    .bind(employe_id)
    .bind(debut)
    .bind(fin)
    .fetch_all(pool)
    .await?;

    Ok(pointages)
}
