use crate::api::attendance::pointages_du_mois;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::employee::Employe;
use crate::payroll::{SalaireMensuel, calculer_salaire};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PeriodeQuery {
    #[schema(example = 1)]
    pub mois: u32,

    #[schema(example = 2026)]
    pub annee: i32,
}

#[derive(Serialize, ToSchema)]
pub struct FichePaieResponse {
    pub employe_id: i64,
    #[schema(example = "Karim Trabelsi")]
    pub employe: String,
    pub mois: u32,
    pub annee: i32,
    pub salaire: SalaireMensuel,
}

/// Fiche de paie d'un employé pour un mois donné
///
/// Dérivée des pointages du mois; rien n'est stocké. Le net est plafonné à
/// zéro et l'excédent d'avances apparaît en dette à recouvrer.
#[utoipa::path(
    get,
    path = "/api/paie/{employe_id}",
    params(
        ("employe_id", description = "Identifiant de l'employé"),
        PeriodeQuery
    ),
    responses(
        (status = 200, description = "Fiche de paie calculée", body = FichePaieResponse),
        (status = 400, description = "Période invalide"),
        (status = 401),
        (status = 403),
        (status = 404, description = "Employé non trouvé")
    ),
    security(("bearer_auth" = [])),
    tag = "Paie"
)]
pub async fn get_paie(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    query: web::Query<PeriodeQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    if !(1..=12).contains(&query.mois) {
        return Err(ApiError::Validation("Mois invalide".into()));
    }

    let employe_id = path.into_inner();

    let employe = sqlx::query_as::<_, Employe>(
        "SELECT id, nom, prenom, poste, salaire_base, statut FROM employes WHERE id = ?",
    )
    .bind(employe_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::NotFound("Employé".into()))?;

    let pointages = pointages_du_mois(pool.get_ref(), employe_id, query.mois, query.annee).await?;
    let salaire = calculer_salaire(&employe, &pointages);

    Ok(HttpResponse::Ok().json(FichePaieResponse {
        employe_id,
        employe: format!("{} {}", employe.prenom, employe.nom),
        mois: query.mois,
        annee: query.annee,
        salaire,
    }))
}
