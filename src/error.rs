use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Erreurs renvoyées par les handlers HTTP.
///
/// Chaque variante porte le message visible côté client; les détails
/// techniques (SQL, etc.) restent dans les logs.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Identifiants invalides")]
    Auth,

    #[error("Accès refusé: {0}")]
    Denied(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0} non trouvé")]
    NotFound(String),

    #[error("Erreur serveur")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn champ_requis(champ: &str) -> Self {
        ApiError::Validation(format!("Champ requis: {champ}"))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth => StatusCode::UNAUTHORIZED,
            ApiError::Denied(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Database(e) = self {
            tracing::error!(error = %e, "Database error");
        }
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string()
        }))
    }
}
