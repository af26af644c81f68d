use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Statut d'une journée pointée.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum_macros::Display,
    strum_macros::EnumString,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum StatutPointage {
    /// Compte comme jour travaillé.
    Present,
    /// Non payé: jours et heures supp forcés à zéro.
    Absent,
    /// Payé, décompté du solde de congés.
    Conge,
    /// Payé, décompté du solde maladie.
    Maladie,
    /// Jour férié payé non travaillé.
    Ferie,
}

/// Un pointage: une ligne par employé et par date (unicité en base).
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Pointage {
    pub id: i64,
    pub employe_id: i64,

    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,

    pub statut: StatutPointage,
    pub jours_travailles: f64,
    pub heures_supp: f64,

    /// Avance sur salaire rattachée à cette journée, en TND (≥ 0).
    pub avance: f64,

    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn statut_serialise_en_majuscules() {
        assert_eq!(
            serde_json::to_string(&StatutPointage::Present).unwrap(),
            "\"PRESENT\""
        );
        assert_eq!(StatutPointage::Ferie.to_string(), "FERIE");
    }

    #[test]
    fn statut_parse_depuis_filtre() {
        assert_eq!(
            StatutPointage::from_str("ABSENT").unwrap(),
            StatutPointage::Absent
        );
        assert!(StatutPointage::from_str("PARTI").is_err());
    }
}
