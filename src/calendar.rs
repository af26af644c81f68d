use chrono::{Datelike, NaiveDate, Weekday};
use once_cell::sync::Lazy;

pub struct JourFerie {
    pub nom: &'static str,
    pub mois: u32,
    pub jour: u32,
}

/// Jours fériés fixes en Tunisie. Les fêtes religieuses (calendrier
/// hégirien) varient chaque année et ne sont pas détectées automatiquement;
/// le chef les saisit avec le statut FERIE.
pub static JOURS_FERIES_TUNISIE: Lazy<Vec<JourFerie>> = Lazy::new(|| {
    vec![
        JourFerie { nom: "Jour de l'An", mois: 1, jour: 1 },
        JourFerie { nom: "Fête de l'Indépendance", mois: 3, jour: 20 },
        JourFerie { nom: "Fête de la Jeunesse", mois: 3, jour: 21 },
        JourFerie { nom: "Fête des Martyrs", mois: 4, jour: 9 },
        JourFerie { nom: "Fête du Travail", mois: 5, jour: 1 },
        JourFerie { nom: "Fête de la République", mois: 7, jour: 25 },
        JourFerie { nom: "Fête des Femmes", mois: 8, jour: 13 },
        JourFerie { nom: "Journée de l'Évacuation", mois: 10, jour: 15 },
        JourFerie { nom: "Fête de la Révolution", mois: 12, jour: 17 },
    ]
});

pub fn est_jour_ferie(date: NaiveDate) -> bool {
    JOURS_FERIES_TUNISIE
        .iter()
        .any(|f| f.mois == date.month() && f.jour == date.day())
}

pub fn est_dimanche(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

fn jours_dans_mois(mois: u32, annee: i32) -> u32 {
    let (annee_suiv, mois_suiv) = if mois == 12 { (annee + 1, 1) } else { (annee, mois + 1) };
    NaiveDate::from_ymd_opt(annee_suiv, mois_suiv, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}

/// Premier et dernier jour d'un mois, pour les filtres de période.
pub fn bornes_mois(mois: u32, annee: i32) -> Option<(NaiveDate, NaiveDate)> {
    let debut = NaiveDate::from_ymd_opt(annee, mois, 1)?;
    let fin = NaiveDate::from_ymd_opt(annee, mois, jours_dans_mois(mois, annee))?;
    Some((debut, fin))
}

/// Décompte des jours d'un mois: total, ouvrables (Lun-Sam hors fériés),
/// dimanches et fériés fixes.
#[derive(Debug, Clone, Copy, serde::Serialize, utoipa::ToSchema)]
pub struct JoursDuMois {
    pub total: u32,
    pub ouvrables: u32,
    pub dimanches: u32,
    pub feries: u32,
}

pub fn calculer_jours_ouvrables(mois: u32, annee: i32) -> JoursDuMois {
    let total = jours_dans_mois(mois, annee);
    let mut dimanches = 0;
    let mut feries = 0;

    for jour in 1..=total {
        if let Some(date) = NaiveDate::from_ymd_opt(annee, mois, jour) {
            if est_dimanche(date) {
                dimanches += 1;
            } else if est_jour_ferie(date) {
                // un férié tombant un dimanche n'est compté qu'une fois
                feries += 1;
            }
        }
    }

    JoursDuMois {
        total,
        ouvrables: total - dimanches - feries,
        dimanches,
        feries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premier_janvier_est_ferie() {
        assert!(est_jour_ferie(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
        assert!(!est_jour_ferie(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()));
    }

    #[test]
    fn detection_dimanche() {
        // le 4 janvier 2026 est un dimanche
        assert!(est_dimanche(NaiveDate::from_ymd_opt(2026, 1, 4).unwrap()));
        assert!(!est_dimanche(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()));
    }

    #[test]
    fn jours_ouvrables_janvier_2026() {
        let jours = calculer_jours_ouvrables(1, 2026);
        assert_eq!(jours.total, 31);
        assert_eq!(jours.dimanches, 4);
        assert_eq!(jours.feries, 1); // 1er janvier, un jeudi
        assert_eq!(jours.ouvrables, 26);
    }

    #[test]
    fn fevrier_bissextile() {
        assert_eq!(jours_dans_mois(2, 2028), 29);
        assert_eq!(jours_dans_mois(2, 2026), 28);
        assert_eq!(jours_dans_mois(12, 2026), 31);
    }
}
