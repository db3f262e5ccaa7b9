//! HS256 session-cookie authenticator.
//!
//! - validate: `Cookie: <name>=<jwt>` を取り出し、署名 + exp + 必須 claim を検証
//! - extend: `exp = min(now + inactivity, iat + lifespan)` で再署名し `Set-Cookie` を書く
//!
//! トークンの発行 (login flow) はこの crate の外側。ここは検証と延長だけ。

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, header, request::Parts};
use chrono::{DateTime, TimeDelta, Utc};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::services::auth::authenticator::{Authenticator, Principal, TokenError};

/// Claims carried in the session JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iss: String,
    #[serde(default)]
    pub org: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub cookie_name: String,
    pub scheme: String,
    /// Hard upper bound on a session, counted from `iat`.
    pub lifespan: TimeDelta,
    /// Sliding window granted by each successful request.
    pub inactivity: TimeDelta,
    pub secure_cookie: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            scheme: "oauth2".to_string(),
            lifespan: TimeDelta::days(30),
            inactivity: TimeDelta::minutes(5),
            secure_cookie: true,
        }
    }
}

/// Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtCookieAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    policy: SessionPolicy,
}

impl std::fmt::Debug for JwtCookieAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtCookieAuthenticator")
            .field("validation", &self.validation)
            .field("policy", &self.policy)
            .finish()
    }
}

impl JwtCookieAuthenticator {
    pub fn new(secret: &[u8], policy: SessionPolicy) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            policy,
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Verify signature/expiry and reject claims that are present but empty.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let claims =
            jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &self.validation)?
                .claims;

        if claims.sub.trim().is_empty() {
            return Err(TokenError::EmptyClaim("sub"));
        }
        if claims.iss.trim().is_empty() {
            return Err(TokenError::EmptyClaim("iss"));
        }

        Ok(claims)
    }

    fn session_token(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|c| c.name() == self.policy.cookie_name)
            .map(|c| c.value().to_string())
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding_key,
        )?)
    }

    fn session_cookie(&self, token: String) -> Result<HeaderValue, TokenError> {
        let cookie = Cookie::build((self.policy.cookie_name.clone(), token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.policy.secure_cookie)
            .build();

        Ok(HeaderValue::from_str(&cookie.to_string())?)
    }
}

#[async_trait]
impl Authenticator for JwtCookieAuthenticator {
    fn scheme(&self) -> &str {
        &self.policy.scheme
    }

    async fn validate(&self, parts: &Parts) -> Result<Principal, TokenError> {
        let token = self
            .session_token(&parts.headers)
            .ok_or(TokenError::Missing)?;
        let claims = self.verify(&token)?;

        Ok(Principal {
            subject: claims.sub,
            issuer: claims.iss,
            organization: claims.org,
            issued_at: DateTime::from_timestamp(claims.iat, 0),
            expires_at: DateTime::from_timestamp(claims.exp, 0),
        })
    }

    async fn extend(
        &self,
        response_headers: &mut HeaderMap,
        principal: Principal,
    ) -> Result<Principal, TokenError> {
        let issued_at = principal.issued_at.ok_or(TokenError::EmptyClaim("iat"))?;
        let now = Utc::now();

        let deadline = issued_at
            .checked_add_signed(self.policy.lifespan)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let sliding = now
            .checked_add_signed(self.policy.inactivity)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let expires_at = sliding.min(deadline);
        if expires_at <= now {
            return Err(TokenError::Exhausted);
        }

        let claims = SessionClaims {
            sub: principal.subject.clone(),
            iss: principal.issuer.clone(),
            org: principal.organization.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let cookie = self.session_cookie(self.sign(&claims)?)?;
        response_headers.append(header::SET_COOKIE, cookie);

        Ok(Principal {
            expires_at: DateTime::from_timestamp(claims.exp, 0),
            ..principal
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    const SECRET: &[u8] = b"test-secret-test-secret-test-secret";

    fn authenticator() -> JwtCookieAuthenticator {
        JwtCookieAuthenticator::new(
            SECRET,
            SessionPolicy {
                secure_cookie: false,
                ..SessionPolicy::default()
            },
        )
    }

    fn mint(secret: &[u8], claims: &SessionClaims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn claims(issued: DateTime<Utc>, expires: DateTime<Utc>) -> SessionClaims {
        SessionClaims {
            sub: "billieta".to_string(),
            iss: "github".to_string(),
            org: "42".to_string(),
            iat: issued.timestamp(),
            exp: expires.timestamp(),
        }
    }

    fn parts_with_cookie(cookie: &str) -> Parts {
        Request::builder()
            .uri("/api/v1/me")
            .header(header::COOKIE, cookie)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn validate_accepts_signed_session_cookie() {
        let now = Utc::now();
        let token = mint(SECRET, &claims(now, now + TimeDelta::minutes(5)));
        let parts = parts_with_cookie(&format!("theme=dark; session={token}"));

        let principal = authenticator().validate(&parts).await.unwrap();

        assert_eq!(principal.subject, "billieta");
        assert_eq!(principal.issuer, "github");
        assert_eq!(principal.organization, "42");
        assert_eq!(principal.issued_at.map(|t| t.timestamp()), Some(now.timestamp()));
    }

    #[tokio::test]
    async fn validate_without_cookie_is_missing() {
        let parts = Request::builder().body(()).unwrap().into_parts().0;

        let err = authenticator().validate(&parts).await.unwrap_err();
        assert!(matches!(err, TokenError::Missing));
    }

    #[tokio::test]
    async fn validate_rejects_foreign_signature() {
        let now = Utc::now();
        let token = mint(b"some-other-secret", &claims(now, now + TimeDelta::minutes(5)));

        let err = authenticator()
            .validate(&parts_with_cookie(&format!("session={token}")))
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Jwt(_)));
    }

    #[tokio::test]
    async fn validate_rejects_expired_token() {
        let now = Utc::now();
        let token = mint(
            SECRET,
            &claims(now - TimeDelta::hours(2), now - TimeDelta::hours(1)),
        );

        let err = authenticator()
            .validate(&parts_with_cookie(&format!("session={token}")))
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Jwt(_)));
    }

    #[tokio::test]
    async fn validate_rejects_empty_subject() {
        let now = Utc::now();
        let mut c = claims(now, now + TimeDelta::minutes(5));
        c.sub = "  ".to_string();
        let token = mint(SECRET, &c);

        let err = authenticator()
            .validate(&parts_with_cookie(&format!("session={token}")))
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::EmptyClaim("sub")));
    }

    #[tokio::test]
    async fn extend_slides_expiry_and_writes_cookie() {
        let auth = authenticator();
        let now = Utc::now();
        let principal = Principal {
            issued_at: Some(now - TimeDelta::minutes(10)),
            expires_at: Some(now + TimeDelta::seconds(30)),
            ..Principal::new("billieta", "github", "42")
        };
        let mut headers = HeaderMap::new();

        let extended = auth.extend(&mut headers, principal).await.unwrap();

        let expires_at = extended.expires_at.unwrap();
        assert!(expires_at > now + TimeDelta::minutes(4));
        assert!(expires_at <= now + TimeDelta::minutes(5) + TimeDelta::seconds(1));

        let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("session="));
        assert!(set_cookie.contains("HttpOnly"));

        // the refreshed cookie must itself validate
        let parts = parts_with_cookie(set_cookie.split(';').next().unwrap());
        let revalidated = auth.validate(&parts).await.unwrap();
        assert_eq!(revalidated.subject, "billieta");
        assert_eq!(revalidated.expires_at, extended.expires_at);
    }

    #[tokio::test]
    async fn extend_never_passes_lifespan() {
        let auth = authenticator();
        let now = Utc::now();
        let issued_at = now - auth.policy().lifespan + TimeDelta::seconds(60);
        let principal = Principal {
            issued_at: Some(issued_at),
            ..Principal::new("billieta", "github", "42")
        };

        let extended = auth
            .extend(&mut HeaderMap::new(), principal)
            .await
            .unwrap();

        assert!(extended.expires_at.unwrap() <= issued_at + auth.policy().lifespan);
    }

    #[tokio::test]
    async fn extend_fails_once_lifespan_is_spent() {
        let auth = authenticator();
        let principal = Principal {
            issued_at: Some(Utc::now() - auth.policy().lifespan - TimeDelta::seconds(1)),
            ..Principal::new("billieta", "github", "42")
        };
        let mut headers = HeaderMap::new();

        let err = auth.extend(&mut headers, principal).await.unwrap_err();

        assert!(matches!(err, TokenError::Exhausted));
        assert!(headers.is_empty());
    }

    #[tokio::test]
    async fn extend_requires_issued_at() {
        let err = authenticator()
            .extend(&mut HeaderMap::new(), Principal::new("billieta", "github", "42"))
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::EmptyClaim("iat")));
    }
}
