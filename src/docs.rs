use crate::api::attendance::{CreatePointage, PointageQuery, PointageResponse};
use crate::api::employee::{CreateEmploye, EmployeListResponse, EmployeQuery, UpdateEmploye};
use crate::api::payroll::{FichePaieResponse, PeriodeQuery};
use crate::api::reports::{
    EmployeRef, Periode, RapportEmploye, RapportQuery, SectionHeuresSupp, SectionPresence,
};
use crate::calendar::JoursDuMois;
use crate::model::attendance::{Pointage, StatutPointage};
use crate::model::employee::Employe;
use crate::payroll::SalaireMensuel;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pointage KL Beton API",
        version = "1.0.0",
        description = r#"
## Système de gestion des pointages

API du tableau de bord de gestion des présences et de la paie d'une
entreprise de construction.

### 🔹 Fonctionnalités
- **Employés**
  - Création et mise à jour des fiches par l'administrateur
- **Pointages**
  - Saisie quotidienne par le chef de chantier (présent, absent, congé,
    maladie, férié), avances sur salaire, correction des jours passés
- **Paie**
  - Fiche mensuelle dérivée des pointages: base 26 jours, heures supp
    majorées de 25 %, net plafonné à zéro et dette à recouvrer
- **Rapports**
  - Récapitulatif mensuel par employé: présence, heures supp, salaire

### 🔐 Sécurité
Authentification **JWT Bearer**. La saisie des pointages est réservée au
rôle **Chef de chantier**; la paie et les rapports à l'**Administrateur**.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::create_pointage,
        crate::api::attendance::list_pointages,

        crate::api::employee::create_employe,
        crate::api::employee::get_employe,
        crate::api::employee::list_employes,
        crate::api::employee::update_employe,

        crate::api::payroll::get_paie,

        crate::api::reports::get_rapports
    ),
    components(
        schemas(
            CreatePointage,
            PointageQuery,
            PointageResponse,
            Pointage,
            StatutPointage,
            CreateEmploye,
            UpdateEmploye,
            EmployeQuery,
            EmployeListResponse,
            Employe,
            PeriodeQuery,
            FichePaieResponse,
            SalaireMensuel,
            RapportQuery,
            RapportEmploye,
            EmployeRef,
            Periode,
            JoursDuMois,
            SectionPresence,
            SectionHeuresSupp
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Pointage", description = "Saisie et consultation des pointages"),
        (name = "Employés", description = "Gestion des fiches employés"),
        (name = "Paie", description = "Fiches de paie mensuelles"),
        (name = "Rapports", description = "Tableau de bord récapitulatif"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
