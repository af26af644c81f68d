//! Porte de migration au déploiement.
//!
//! Les migrations d'un déploiement sont appliquées dans une transaction
//! unique: soit la version est promue, soit rien n'est visible. Un conflit
//! laisse la porte en état `Failed` terminal pour cette tentative; pas de
//! relance automatique, une intervention opérateur est attendue.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Conflit de migration v{version} ({description}): {reason}")]
    Conflict {
        version: i64,
        description: String,
        reason: String,
    },

    #[error("Transition invalide: {from} -> Migrating")]
    InvalidTransition { from: String },

    #[error("Erreur base de données: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MigrationState {
    Idle,
    Migrating,
    Succeeded { version: i64 },
    /// Terminal pour la tentative: la version n'a pas été promue et le
    /// conflit est conservé pour affichage.
    Failed { version: i64, conflict: String },
}

pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub statements: &'static [&'static str],
}

/// Schéma courant de l'application.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "comptes utilisateurs et jetons de rafraîchissement",
        statements: &[
            r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                role_id INTEGER NOT NULL DEFAULT 3,
                employe_id INTEGER,
                last_login_at TEXT
            )
            "#,
            r#"
            CREATE TABLE refresh_tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                jti TEXT NOT NULL UNIQUE,
                expires_at INTEGER NOT NULL,
                revoked INTEGER NOT NULL DEFAULT 0
            )
            "#,
        ],
    },
    Migration {
        version: 2,
        description: "fiches employés",
        statements: &[
            r#"
            CREATE TABLE employes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nom TEXT NOT NULL,
                prenom TEXT NOT NULL,
                poste TEXT,
                salaire_base REAL NOT NULL DEFAULT 0,
                statut TEXT NOT NULL DEFAULT 'ACTIF'
            )
            "#,
        ],
    },
    Migration {
        version: 3,
        description: "pointages, uniques par employé et par date",
        statements: &[
            r#"
            CREATE TABLE pointages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                employe_id INTEGER NOT NULL REFERENCES employes(id),
                date TEXT NOT NULL,
                statut TEXT NOT NULL,
                jours_travailles REAL NOT NULL DEFAULT 1,
                heures_supp REAL NOT NULL DEFAULT 0,
                avance REAL NOT NULL DEFAULT 0,
                note TEXT,
                UNIQUE (employe_id, date)
            )
            "#,
            "CREATE INDEX idx_pointages_date ON pointages(date)",
        ],
    },
];

pub struct MigrationGate {
    state: MigrationState,
}

impl Default for MigrationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationGate {
    pub fn new() -> Self {
        MigrationGate {
            state: MigrationState::Idle,
        }
    }

    pub fn state(&self) -> &MigrationState {
        &self.state
    }

    /// Applique les migrations en attente et promeut la version du schéma.
    ///
    /// Retourne la version courante après application. En cas de conflit la
    /// transaction est annulée: la version précédente reste en place et la
    /// porte passe en `Failed`.
    pub async fn run(
        &mut self,
        pool: &SqlitePool,
        migrations: &[Migration],
    ) -> Result<i64, MigrationError> {
        match self.state {
            MigrationState::Idle => {}
            ref from => {
                return Err(MigrationError::InvalidTransition {
                    from: format!("{from:?}"),
                });
            }
        }
        self.state = MigrationState::Migrating;

        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(pool)
            .await?;

        let courante: Option<i64> = sqlx::query_scalar("SELECT version FROM schema_version")
            .fetch_optional(pool)
            .await?;
        let courante = courante.unwrap_or(0);

        let en_attente: Vec<&Migration> =
            migrations.iter().filter(|m| m.version > courante).collect();

        if en_attente.is_empty() {
            info!(version = courante, "Schéma à jour, aucune migration");
            self.state = MigrationState::Succeeded { version: courante };
            return Ok(courante);
        }

        let mut tx = pool.begin().await?;
        let mut version = courante;

        for migration in en_attente {
            info!(
                version = migration.version,
                description = migration.description,
                "Application de la migration"
            );

            for stmt in migration.statements {
                if let Err(e) = sqlx::query(stmt).execute(&mut *tx).await {
                    // annulation implicite au drop de la transaction
                    let conflict = MigrationError::Conflict {
                        version: migration.version,
                        description: migration.description.to_string(),
                        reason: e.to_string(),
                    };
                    error!(
                        version = migration.version,
                        error = %conflict,
                        "Migration en conflit, déploiement interrompu"
                    );
                    self.state = MigrationState::Failed {
                        version: migration.version,
                        conflict: conflict.to_string(),
                    };
                    return Err(conflict);
                }
            }
            version = migration.version;
        }

        sqlx::query("DELETE FROM schema_version")
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(version, "Migrations appliquées");
        self.state = MigrationState::Succeeded { version };
        Ok(version)
    }
}

/// Version de schéma actuellement promue (0 si aucune).
pub async fn version_schema(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let version: Option<i64> = sqlx::query_scalar("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool_memoire() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("pool sqlite en mémoire")
    }

    #[actix_web::test]
    async fn migrations_propres_promeuvent_la_version() {
        let pool = pool_memoire().await;
        let mut gate = MigrationGate::new();

        let version = gate.run(&pool, MIGRATIONS).await.unwrap();
        assert_eq!(version, 3);
        assert_eq!(gate.state(), &MigrationState::Succeeded { version: 3 });
        assert_eq!(version_schema(&pool).await.unwrap(), 3);
    }

    #[actix_web::test]
    async fn conflit_ne_promeut_pas_et_conserve_le_message() {
        let pool = pool_memoire().await;

        let mut gate = MigrationGate::new();
        gate.run(&pool, &MIGRATIONS[..1]).await.unwrap();

        // nouvelle tentative de déploiement dont la seconde migration entre
        // en conflit avec une table déjà présente
        const CASSEES: &[Migration] = &[
            Migration {
                version: 2,
                description: "fiches employés",
                statements: &["CREATE TABLE employes (id INTEGER PRIMARY KEY)"],
            },
            Migration {
                version: 3,
                description: "doublon en conflit",
                statements: &["CREATE TABLE employes (id INTEGER PRIMARY KEY)"],
            },
        ];

        let mut gate = MigrationGate::new();
        let err = gate.run(&pool, CASSEES).await.unwrap_err();

        match gate.state() {
            MigrationState::Failed { version, conflict } => {
                assert_eq!(*version, 3);
                assert!(!conflict.is_empty());
            }
            autre => panic!("état inattendu: {autre:?}"),
        }
        assert!(err.to_string().contains("Conflit de migration v3"));

        // tout-ou-rien: la v2 de la tentative échouée n'est pas visible
        assert_eq!(version_schema(&pool).await.unwrap(), 1);
        let table_v2: Option<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'employes'",
        )
        .fetch_optional(&pool)
        .await
        .unwrap();
        assert_eq!(table_v2, None);
    }

    #[actix_web::test]
    async fn pas_de_relance_automatique_apres_echec() {
        let pool = pool_memoire().await;

        const CASSEE: &[Migration] = &[Migration {
            version: 1,
            description: "sql invalide",
            statements: &["CREATE TALBE oops (id INTEGER)"],
        }];

        let mut gate = MigrationGate::new();
        gate.run(&pool, CASSEE).await.unwrap_err();

        // l'état Failed est terminal pour la tentative
        let err = gate.run(&pool, CASSEE).await.unwrap_err();
        assert!(matches!(err, MigrationError::InvalidTransition { .. }));
    }

    #[actix_web::test]
    async fn relance_sans_migration_en_attente_est_sans_effet() {
        let pool = pool_memoire().await;

        let mut gate = MigrationGate::new();
        gate.run(&pool, MIGRATIONS).await.unwrap();

        let mut gate2 = MigrationGate::new();
        let version = gate2.run(&pool, MIGRATIONS).await.unwrap();
        assert_eq!(version, 3);
    }
}
