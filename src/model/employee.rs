use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Employe {
    pub id: i64,
    pub nom: String,
    pub prenom: String,
    pub poste: Option<String>,

    /// Salaire mensuel de base, en TND. Le taux journalier est dérivé
    /// sur une base fixe de 26 jours.
    pub salaire_base: f64,

    /// ACTIF ou INACTIF; les employés ne sont jamais supprimés.
    pub statut: String,
}
