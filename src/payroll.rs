//! Calcul de la paie mensuelle.
//!
//! Fonction pure des pointages du mois: aucun accès base ici, les handlers
//! chargent les lignes puis délèguent. Règles métier:
//! - base fixe de 26 jours, taux journalier = salaire_base / 26;
//! - heures supplémentaires majorées de 25 %;
//! - dimanche travaillé compté uniquement en heures supp (8 h par défaut);
//! - net plafonné à zéro, l'excédent d'avances devient une dette à recouvrer.

use serde::Serialize;
use utoipa::ToSchema;

use crate::calendar::est_dimanche;
use crate::model::attendance::{Pointage, StatutPointage};
use crate::model::employee::Employe;

pub const JOURS_BASE_CALCUL: f64 = 26.0;
pub const HEURES_PAR_JOUR: f64 = 8.0;
pub const MAJORATION_HEURES_SUPP: f64 = 1.25;

/// Fiche de paie dérivée, jamais stockée.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SalaireMensuel {
    pub salaire_base: f64,
    pub taux_journalier: f64,
    pub taux_horaire: f64,

    pub jours_presence: f64,
    pub jours_absence: f64,
    pub jours_conge: f64,
    pub jours_maladie: f64,
    pub jours_ferie: f64,
    pub jours_dimanche_travailles: u32,
    pub total_jours_payes: f64,
    pub total_heures_supp: f64,

    pub montant_presence: f64,
    pub montant_heures_supp: f64,
    pub montant_feries: f64,
    pub salaire_brut: f64,

    pub total_avances: f64,
    pub salaire_net: f64,

    /// Montant restant dû par l'employé quand les avances dépassent le brut.
    /// `salaire_net` et `dette_a_recouvrer` ne sont jamais positifs ensemble.
    pub dette_a_recouvrer: f64,

    #[schema(example = "0.000 TND")]
    pub salaire_net_affiche: String,
}

/// Monnaie affichée au millime près.
pub fn format_tnd(montant: f64) -> String {
    format!("{:.3} TND", montant)
}

fn arrondir_millimes(montant: f64) -> f64 {
    (montant * 1000.0).round() / 1000.0
}

pub fn calculer_salaire(employe: &Employe, pointages: &[Pointage]) -> SalaireMensuel {
    let taux_journalier = employe.salaire_base / JOURS_BASE_CALCUL;
    let taux_horaire = taux_journalier / HEURES_PAR_JOUR;

    let mut jours_presence = 0.0;
    let mut jours_absence = 0.0;
    let mut jours_conge = 0.0;
    let mut jours_maladie = 0.0;
    let mut jours_ferie = 0.0;
    let mut jours_dimanche_travailles = 0;
    let mut jours_payes = 0.0;
    let mut total_heures_supp = 0.0;
    let mut total_avances = 0.0;

    for p in pointages {
        total_avances += p.avance;

        match p.statut {
            StatutPointage::Absent => {
                jours_absence += 1.0;
            }
            StatutPointage::Present => {
                if est_dimanche(p.date) {
                    // dimanche: uniquement en heures supp, 8 h à défaut de saisie
                    let heures = if p.heures_supp > 0.0 { p.heures_supp } else { HEURES_PAR_JOUR };
                    total_heures_supp += heures;
                    jours_dimanche_travailles += 1;
                } else {
                    jours_presence += p.jours_travailles;
                    jours_payes += p.jours_travailles;
                    total_heures_supp += p.heures_supp;
                }
            }
            StatutPointage::Conge => {
                jours_conge += p.jours_travailles;
                jours_payes += p.jours_travailles;
            }
            StatutPointage::Maladie => {
                jours_maladie += p.jours_travailles;
                jours_payes += p.jours_travailles;
            }
            StatutPointage::Ferie => {
                jours_ferie += p.jours_travailles;
            }
        }
    }

    let montant_presence = jours_payes * taux_journalier;
    let montant_heures_supp = total_heures_supp * taux_horaire * MAJORATION_HEURES_SUPP;
    let montant_feries = jours_ferie * taux_journalier;

    let salaire_brut = montant_presence + montant_heures_supp + montant_feries;

    // Un net ne descend jamais sous zéro sur la fiche; le trop-perçu
    // d'avances bascule en dette, chaque mois calculé indépendamment.
    let salaire_net = arrondir_millimes((salaire_brut - total_avances).max(0.0));
    let dette_a_recouvrer = arrondir_millimes((total_avances - salaire_brut).max(0.0));

    SalaireMensuel {
        salaire_base: employe.salaire_base,
        taux_journalier,
        taux_horaire,
        jours_presence,
        jours_absence,
        jours_conge,
        jours_maladie,
        jours_ferie,
        jours_dimanche_travailles,
        total_jours_payes: jours_payes + jours_ferie,
        total_heures_supp,
        montant_presence,
        montant_heures_supp,
        montant_feries,
        salaire_brut: arrondir_millimes(salaire_brut),
        total_avances,
        salaire_net,
        dette_a_recouvrer,
        salaire_net_affiche: format_tnd(salaire_net),
    }
}

/// Taux de présence (0-100) sur les jours ouvrables du mois.
pub fn calculer_taux_presence(pointages: &[Pointage], jours_ouvrables: u32) -> u32 {
    if jours_ouvrables == 0 {
        return 0;
    }
    let jours: f64 = pointages
        .iter()
        .filter(|p| matches!(p.statut, StatutPointage::Present | StatutPointage::Ferie))
        .map(|p| p.jours_travailles)
        .sum();
    ((jours / jours_ouvrables as f64) * 100.0).round().min(100.0) as u32
}
