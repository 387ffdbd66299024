use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::Status;
use rocket::outcome::Outcome::{Error, Success};
use rocket::request::{self, FromRequest, Request};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::policy::Actor;
use crate::resp::problem::Problem;
use crate::role::Role;
use crate::util::date_time_as_unix_seconds;

/// Claims carried by the bearer token the auth service issues.
///
/// Token issuance lives outside this backend; this guard only verifies the
/// signature and hands routes the actor identity (user id + role).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleToken {
    #[serde(with = "date_time_as_unix_seconds")]
    iat: DateTime<Utc>,
    #[serde(with = "date_time_as_unix_seconds")]
    exp: DateTime<Utc>,
    pub user: Uuid,
    pub role: Role,
}

impl UserRoleToken {
    pub fn new(user: Uuid, role: Role) -> UserRoleToken {
        let now = Utc::now();
        UserRoleToken {
            iat: now,
            exp: now + Duration::weeks(1),
            user,
            role,
        }
    }

    pub fn encode_jwt(&self, secret: impl AsRef<[u8]>) -> Result<String, Problem> {
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(secret.as_ref());
        encode(&header, &self, &key).map_err(Problem::from)
    }

    /// Identity as the access policy consumes it.
    pub fn actor(&self) -> Actor {
        Actor {
            id: bson::Uuid::from_uuid_1(self.user),
            role: self.role,
        }
    }
}

pub fn auth_problem(detail: impl ToString) -> Problem {
    Problem::new_untyped(Status::Unauthorized, "Unable to authorize user.")
        .detail(detail)
        .clone()
}

pub fn extract_claims(token: &str, secret: impl AsRef<[u8]>) -> Result<UserRoleToken, Problem> {
    decode::<UserRoleToken>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| auth_problem("Bearer token was malformed or expired."))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for UserRoleToken {
    type Error = Problem;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let config: &Config = match req.rocket().state() {
            Some(c) => c,
            None => {
                return Error((
                    Status::InternalServerError,
                    crate::resp::problem::unexpected(),
                ))
            }
        };

        let token = req
            .headers()
            .get_one("Authorization")
            .and_then(|h| h.strip_prefix("Bearer "));
        let token = match token {
            Some(t) => t,
            None => {
                return Error((
                    Status::Unauthorized,
                    auth_problem("No Authorization bearer token."),
                ))
            }
        };

        match extract_claims(token, &config.jwt_secret) {
            Ok(claims) => {
                tracing::debug!("decoded user role token for user: {}", claims.user);
                Success(claims)
            }
            Err(e) => Error((Status::Unauthorized, e)),
        }
    }
}

pub mod doc {
    use utoipa::openapi::security::*;

    #[derive(Clone, Copy)]
    pub struct JWTAuth;

    impl From<JWTAuth> for SecurityScheme {
        fn from(_: JWTAuth) -> SecurityScheme {
            let mut http = Http::new(HttpAuthScheme::Bearer);
            http.bearer_format = Some("JWT".to_string());
            SecurityScheme::Http(http)
        }
    }

    impl utoipa::Modify for JWTAuth {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            let c = openapi.components.as_mut().unwrap();
            c.add_security_scheme("jwt", *self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SubsecRound;

    #[test]
    fn jwt_round_trips_through_hs256() {
        let mut now = Utc::now();
        now = now.round_subsecs(0);

        let user = Uuid::new_v4();
        let urt = UserRoleToken {
            iat: now,
            exp: now + Duration::weeks(1),
            user,
            role: Role::Student,
        };

        let token = urt.encode_jwt("test-secret").expect("encoding should work");
        let decoded = extract_claims(&token, "test-secret").expect("decoding should work");

        assert_eq!(decoded.iat, now);
        assert_eq!(decoded.exp, now + Duration::weeks(1));
        assert_eq!(decoded.user, user);
        assert_eq!(decoded.role, Role::Student);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let urt = UserRoleToken::new(Uuid::new_v4(), Role::Mentor);
        let token = urt.encode_jwt("test-secret").expect("encoding should work");
        assert!(extract_claims(&token, "other-secret").is_err());
    }

    #[test]
    fn actor_preserves_id_and_role() {
        let user = Uuid::new_v4();
        let actor = UserRoleToken::new(user, Role::Mentor).actor();
        assert_eq!(actor.id, bson::Uuid::from_uuid_1(user));
        assert_eq!(actor.role, Role::Mentor);
    }
}
