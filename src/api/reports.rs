use crate::api::attendance::pointages_du_mois;
use crate::auth::auth::AuthUser;
use crate::calendar::{JoursDuMois, calculer_jours_ouvrables};
use crate::error::ApiError;
use crate::model::employee::Employe;
use crate::payroll::{SalaireMensuel, calculer_salaire, calculer_taux_presence, format_tnd};
use actix_web::{HttpResponse, web};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RapportQuery {
    /// Mois du rapport (1-12), mois courant par défaut.
    pub mois: Option<u32>,
    pub annee: Option<i32>,

    /// Limite le rapport à un seul employé.
    pub employe_id: Option<i64>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeRef {
    pub id: i64,
    pub nom: String,
    pub prenom: String,
    pub poste: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct Periode {
    pub mois: u32,
    pub annee: i32,
    pub jours: JoursDuMois,
}

/// Section présence du tableau de bord.
#[derive(Serialize, ToSchema)]
pub struct SectionPresence {
    pub jours_presence: f64,
    pub jours_absence: f64,
    pub jours_conge: f64,
    pub jours_maladie: f64,
    pub jours_ferie: f64,
    /// Pourcentage 0-100 sur les jours ouvrables du mois.
    pub taux_presence: u32,
}

/// Section heures supplémentaires.
#[derive(Serialize, ToSchema)]
pub struct SectionHeuresSupp {
    pub total_heures: f64,
    pub montant: f64,
    #[schema(example = "125.000 TND")]
    pub montant_affiche: String,
}

#[derive(Serialize, ToSchema)]
pub struct RapportEmploye {
    pub employe: EmployeRef,
    pub periode: Periode,
    pub presence: SectionPresence,
    pub heures_supp: SectionHeuresSupp,
    pub salaire: SalaireMensuel,
}

fn rapport_employe(
    employe: Employe,
    pointages: &[crate::model::attendance::Pointage],
    mois: u32,
    annee: i32,
    jours: JoursDuMois,
) -> RapportEmploye {
    let salaire = calculer_salaire(&employe, pointages);
    let taux_presence = calculer_taux_presence(pointages, jours.ouvrables);

    RapportEmploye {
        employe: EmployeRef {
            id: employe.id,
            nom: employe.nom,
            prenom: employe.prenom,
            poste: employe.poste,
        },
        periode: Periode { mois, annee, jours },
        presence: SectionPresence {
            jours_presence: salaire.jours_presence,
            jours_absence: salaire.jours_absence,
            jours_conge: salaire.jours_conge,
            jours_maladie: salaire.jours_maladie,
            jours_ferie: salaire.jours_ferie,
            taux_presence,
        },
        heures_supp: SectionHeuresSupp {
            total_heures: salaire.total_heures_supp,
            montant: salaire.montant_heures_supp,
            montant_affiche: format_tnd(salaire.montant_heures_supp),
        },
        salaire,
    }
}

/// Rapport récapitulatif du mois
///
/// Agrégation en lecture seule: sections présence, heures supplémentaires et
/// salaire, pour un employé ou pour tous les employés actifs.
#[utoipa::path(
    get,
    path = "/api/rapports",
    params(RapportQuery),
    responses(
        (status = 200, description = "Rapport généré", body = [RapportEmploye]),
        (status = 400, description = "Période invalide"),
        (status = 401),
        (status = 403),
        (status = 404, description = "Employé non trouvé")
    ),
    security(("bearer_auth" = [])),
    tag = "Rapports"
)]
pub async fn get_rapports(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<RapportQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let aujourd_hui = chrono::Utc::now().date_naive();
    let mois = query.mois.unwrap_or(aujourd_hui.month());
    let annee = query.annee.unwrap_or(aujourd_hui.year());

    if !(1..=12).contains(&mois) {
        return Err(ApiError::Validation("Mois invalide".into()));
    }
    let jours = calculer_jours_ouvrables(mois, annee);

    let employes = match query.employe_id {
        Some(id) => {
            let employe = sqlx::query_as::<_, Employe>(
                "SELECT id, nom, prenom, poste, salaire_base, statut FROM employes WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(pool.get_ref())
            .await?
            .ok_or_else(|| ApiError::NotFound("Employé".into()))?;
            vec![employe]
        }
        None => {
            sqlx::query_as::<_, Employe>(
                r#"
                SELECT id, nom, prenom, poste, salaire_base, statut
                FROM employes
                WHERE statut = 'ACTIF'
                ORDER BY nom ASC, prenom ASC
                "#,
            )
            .fetch_all(pool.get_ref())
            .await?
        }
    };

    let mut rapports = Vec::with_capacity(employes.len());
    for employe in employes {
        let pointages = pointages_du_mois(pool.get_ref(), employe.id, mois, annee).await?;
        rapports.push(rapport_employe(employe, &pointages, mois, annee, jours));
    }

    Ok(HttpResponse::Ok().json(rapports))
}
