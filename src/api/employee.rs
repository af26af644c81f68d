use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::employee::Employe;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmploye {
    #[schema(example = "Trabelsi")]
    pub nom: String,

    #[schema(example = "Karim")]
    pub prenom: String,

    #[schema(example = "Maçon")]
    pub poste: Option<String>,

    /// Salaire mensuel de base en TND.
    #[schema(example = 1560.0)]
    pub salaire_base: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateEmploye {
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub poste: Option<String>,
    #[schema(example = 1820.0)]
    pub salaire_base: Option<f64>,
    #[schema(example = "INACTIF")]
    pub statut: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    #[schema(example = "ACTIF")]
    pub statut: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeListResponse {
    pub data: Vec<Employe>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

/// Création d'une fiche employé (administrateur)
#[utoipa::path(
    post,
    path = "/api/employes",
    request_body = CreateEmploye,
    responses(
        (status = 201, description = "Employé créé"),
        (status = 400, description = "Données invalides"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Employés"
)]
pub async fn create_employe(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<CreateEmploye>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    if payload.nom.trim().is_empty() {
        return Err(ApiError::champ_requis("nom"));
    }
    if payload.prenom.trim().is_empty() {
        return Err(ApiError::champ_requis("prénom"));
    }
    if payload.salaire_base < 0.0 {
        return Err(ApiError::Validation(
            "Le salaire de base ne peut pas être négatif".into(),
        ));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employes (nom, prenom, poste, salaire_base, statut)
        VALUES (?, ?, ?, ?, 'ACTIF')
        "#,
    )
    .bind(payload.nom.trim())
    .bind(payload.prenom.trim())
    .bind(&payload.poste)
    .bind(payload.salaire_base)
    .execute(pool.get_ref())
    .await?;

    debug!(employe_id = result.last_insert_rowid(), "Employé créé");

    Ok(HttpResponse::Created().json(json!({
        "message": "Employé créé avec succès",
        "id": result.last_insert_rowid()
    })))
}

/// Mise à jour d'une fiche employé (administrateur)
#[utoipa::path(
    put,
    path = "/api/employes/{id}",
    request_body = UpdateEmploye,
    params(("id", description = "Identifiant de l'employé")),
    responses(
        (status = 200, description = "Employé mis à jour"),
        (status = 404, description = "Employé non trouvé")
    ),
    security(("bearer_auth" = [])),
    tag = "Employés"
)]
pub async fn update_employe(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    body: web::Json<UpdateEmploye>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let employe_id = path.into_inner();

    let current = sqlx::query_as::<_, Employe>(
        "SELECT id, nom, prenom, poste, salaire_base, statut FROM employes WHERE id = ?",
    )
    .bind(employe_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::NotFound("Employé".into()))?;

    let nom = body.nom.clone().unwrap_or(current.nom);
    let prenom = body.prenom.clone().unwrap_or(current.prenom);
    let poste = body.poste.clone().or(current.poste);
    let salaire_base = body.salaire_base.unwrap_or(current.salaire_base);
    let statut = body.statut.clone().unwrap_or(current.statut);

    if salaire_base < 0.0 {
        return Err(ApiError::Validation(
            "Le salaire de base ne peut pas être négatif".into(),
        ));
    }
    if statut != "ACTIF" && statut != "INACTIF" {
        return Err(ApiError::Validation(format!("Statut inconnu: {statut}")));
    }

    sqlx::query(
        r#"
        UPDATE employes
        SET nom = ?, prenom = ?, poste = ?, salaire_base = ?, statut = ?
        WHERE id = ?
        "#,
    )
    .bind(&nom)
    .bind(&prenom)
    .bind(&poste)
    .bind(salaire_base)
    .bind(&statut)
    .bind(employe_id)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employé mis à jour avec succès"
    })))
}

/// Fiche d'un employé
#[utoipa::path(
    get,
    path = "/api/employes/{id}",
    params(("id", description = "Identifiant de l'employé")),
    responses(
        (status = 200, body = Employe),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Employés"
)]
pub async fn get_employe(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_chef_or_admin()?;

    let employe = sqlx::query_as::<_, Employe>(
        "SELECT id, nom, prenom, poste, salaire_base, statut FROM employes WHERE id = ?",
    )
    .bind(path.into_inner())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| ApiError::NotFound("Employé".into()))?;

    Ok(HttpResponse::Ok().json(employe))
}

/// Liste paginée des employés
#[utoipa::path(
    get,
    path = "/api/employes",
    params(EmployeQuery),
    responses(
        (status = 200, body = EmployeListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Employés"
)]
pub async fn list_employes(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<EmployeQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_chef_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    // i64 arithmetic: huge page numbers must not overflow, just return empty
    let offset = (i64::from(page) - 1) * i64::from(per_page);

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM employes WHERE (?1 IS NULL OR statut = ?1)",
    )
    .bind(&query.statut)
    .fetch_one(pool.get_ref())
    .await?;

    let data = sqlx::query_as::<_, Employe>(
        r#"
        SELECT id, nom, prenom, poste, salaire_base, statut
        FROM employes
        WHERE (?1 IS NULL OR statut = ?1)
        ORDER BY nom ASC, prenom ASC
        LIMIT ?2 OFFSET ?3
        "#,
    )
    .bind(&query.statut)
    .bind(i64::from(per_page))
    .bind(offset)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(EmployeListResponse {
        data,
        page,
        per_page,
        total,
    }))
}
