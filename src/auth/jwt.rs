use std::{sync::Arc, time::Duration};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;
use uuid::Uuid;

use super::{Claims, IssuedToken, Role};
use crate::{clock::Clock, domain::Account, services::IdentityError};

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
        }
    }
}

#[derive(Deserialize)]
struct SubjectOnly {
    sub: String,
}

/// Issues and validates HS256 bearer tokens. Expiry is judged against the
/// injected clock with no leeway.
#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            keys: JwtKeys::from_secret(secret),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, account: &Account, roles: Vec<Role>) -> Result<IssuedToken, IdentityError> {
        let iat = self.clock.now_unix();
        let session_id = Uuid::new_v4().simple().to_string();
        let claims = Claims {
            sub: account.email.clone(),
            aid: account.id,
            roles,
            sid: session_id.clone(),
            iat,
            exp: iat + self.ttl.as_secs() as usize,
        };
        let expires_at = claims.exp;

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".into());

        let token = encode(&header, &claims, &self.keys.enc)
            .map_err(|err| IdentityError::Internal(format!("token encoding failed: {err}")))?;

        Ok(IssuedToken {
            token,
            session_id,
            token_type: "Bearer",
            expires_in: self.ttl.as_secs(),
            expires_at,
        })
    }

    /// Every failure cause collapses into `TokenInvalid`.
    pub fn validate(&self, token: &str) -> Result<Claims, IdentityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.keys.dec, &validation).map_err(|err| {
            tracing::debug!(error = %err, "token rejected");
            IdentityError::TokenInvalid
        })?;

        if self.clock.now_unix() >= data.claims.exp {
            tracing::debug!(exp = data.claims.exp, "token expired");
            return Err(IdentityError::TokenInvalid);
        }

        Ok(data.claims)
    }

    /// Reads `sub` without checking the signature. Only for tokens that already
    /// passed `validate` in the same request.
    pub fn subject_of(&self, token: &str) -> Result<String, IdentityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.set_required_spec_claims::<&str>(&[]);

        decode::<SubjectOnly>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims.sub)
            .map_err(|_| IdentityError::TokenInvalid)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use crate::{
        auth::Role,
        domain::{Account, AccountProfile},
        services::IdentityError,
        test_helpers::ManualClock,
    };

    use super::TokenService;

    fn account(email: &str) -> Account {
        Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            profile: AccountProfile::Customer {
                full_name: "Ada".to_string(),
            },
            enabled: true,
            locked: false,
            login_attempts: 0,
            created_at: Utc::now(),
            last_login_at: None,
            verified_at: Some(Utc::now()),
        }
    }

    fn service(secret: &[u8], clock: Arc<ManualClock>) -> TokenService {
        TokenService::new(secret, Duration::from_secs(600), clock)
    }

    fn fixed_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
                .single()
                .expect("timestamp should be valid"),
        ))
    }

    #[test]
    fn issued_token_validates_with_expected_claims() {
        let clock = fixed_clock();
        let tokens = service(b"unit-test-secret", clock);
        let account = account("a@x.com");

        let issued = tokens
            .issue(&account, vec![Role::Customer])
            .expect("token should issue");
        let claims = tokens.validate(&issued.token).expect("token should validate");

        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.aid, account.id);
        assert_eq!(claims.roles, vec![Role::Customer]);
        assert_eq!(claims.sid, issued.session_id);
        assert_eq!(claims.exp - claims.iat, 600);
        assert_eq!(issued.token_type, "Bearer");
        assert_eq!(issued.expires_in, 600);
        assert_eq!(issued.expires_at, claims.exp);
    }

    #[test]
    fn token_expires_after_ttl() {
        let clock = fixed_clock();
        let tokens = service(b"unit-test-secret", clock.clone());
        let issued = tokens
            .issue(&account("a@x.com"), vec![Role::Customer])
            .expect("token should issue");

        clock.advance(chrono::Duration::seconds(599));
        assert!(tokens.validate(&issued.token).is_ok());

        clock.advance(chrono::Duration::seconds(1));
        assert!(matches!(
            tokens.validate(&issued.token),
            Err(IdentityError::TokenInvalid)
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let tokens = service(b"unit-test-secret", fixed_clock());
        let issued = tokens
            .issue(&account("a@x.com"), vec![Role::Customer])
            .expect("token should issue");

        let payload_start = issued.token.find('.').expect("token has segments") + 1;
        let target = payload_start + 10;
        let mut bytes = issued.token.into_bytes();
        bytes[target] = if bytes[target] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).expect("still ascii");

        assert!(matches!(
            tokens.validate(&tampered),
            Err(IdentityError::TokenInvalid)
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let clock = fixed_clock();
        let issuer = service(b"secret-a", clock.clone());
        let verifier = service(b"secret-b", clock);
        let issued = issuer
            .issue(&account("a@x.com"), vec![Role::Admin])
            .expect("token should issue");

        assert!(matches!(
            verifier.validate(&issued.token),
            Err(IdentityError::TokenInvalid)
        ));
        assert!(matches!(
            verifier.validate("not-a-token"),
            Err(IdentityError::TokenInvalid)
        ));
    }

    #[test]
    fn subject_of_reads_email() {
        let tokens = service(b"unit-test-secret", fixed_clock());
        let issued = tokens
            .issue(&account("a@x.com"), vec![Role::Customer])
            .expect("token should issue");

        assert_eq!(
            tokens.subject_of(&issued.token).expect("subject should decode"),
            "a@x.com"
        );
        assert!(tokens.subject_of("garbage").is_err());
    }

    #[test]
    fn each_issue_gets_a_fresh_session_id() {
        let tokens = service(b"unit-test-secret", fixed_clock());
        let account = account("a@x.com");

        let first = tokens
            .issue(&account, vec![Role::Customer])
            .expect("token should issue");
        let second = tokens
            .issue(&account, vec![Role::Customer])
            .expect("token should issue");

        assert_ne!(first.session_id, second.session_id);
    }
}
