use crate::config::Config;
use crate::error::ApiError;
use crate::{model::role::Role, models::Claims};
use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::decode;
use jsonwebtoken::{DecodingKey, Validation};

pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employe_id: Option<i64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        let role = match Role::from_id(data.claims.role) {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Invalid role"))),
        };

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            username: data.claims.sub,
            role,
            employe_id: data.claims.employe_id,
        }))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Denied("réservé à l'administrateur".into()))
        }
    }

    /// La saisie des pointages est réservée au chef de chantier: un
    /// administrateur est refusé et aucune écriture n'a lieu.
    pub fn require_chef(&self) -> Result<(), ApiError> {
        if self.role == Role::Chef {
            Ok(())
        } else {
            Err(ApiError::Denied(
                "pointage réservé au chef de chantier".into(),
            ))
        }
    }

    pub fn require_chef_or_admin(&self) -> Result<(), ApiError> {
        if matches!(self.role, Role::Admin | Role::Chef) {
            Ok(())
        } else {
            Err(ApiError::Denied("réservé au chef ou à l'administrateur".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "u".into(),
            role,
            employe_id: None,
        }
    }

    #[test]
    fn admin_refuse_sur_pointage() {
        assert!(user(Role::Admin).require_chef().is_err());
        assert!(user(Role::Chef).require_chef().is_ok());
        assert!(user(Role::Employe).require_chef().is_err());
    }

    #[test]
    fn chef_refuse_sur_administration() {
        assert!(user(Role::Chef).require_admin().is_err());
        assert!(user(Role::Admin).require_admin().is_ok());
    }
}
