//! Request identity and webhook authenticity.
//!
//! Credential checking happens upstream: the auth proxy forwards the caller's
//! id in `X-User-Id` and marks staff with `X-User-Role: staff`. Webhooks are
//! authenticated here with the shared Chapa webhook hash.

use crate::error::{AppError, AppResult};
use actix_web::dev::Payload;
use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::future::{ready, Ready};
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// HMAC-SHA256 of the raw request body, keyed with the webhook hash
pub const BODY_SIGNATURE_HEADER: &str = "x-chapa-signature";
/// HMAC-SHA256 of the webhook hash keyed with itself
pub const SECRET_SIGNATURE_HEADER: &str = "chapa-signature";

type HmacSha256 = Hmac<Sha256>;

/// The caller on whose behalf a request runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser {
    pub id: Uuid,
    pub is_staff: bool,
}

impl ActingUser {
    /// Read the identity headers set by the upstream proxy
    pub fn from_headers(headers: &HeaderMap) -> AppResult<Self> {
        let raw = headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing X-User-Id header".to_string()))?
            .to_str()
            .map_err(|_| AppError::Unauthorized("Malformed X-User-Id header".to_string()))?;

        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::Unauthorized(format!("Invalid user id: {}", raw)))?;

        let is_staff = headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|role| role.trim().eq_ignore_ascii_case("staff"))
            .unwrap_or(false);

        Ok(Self { id, is_staff })
    }

    /// Owners and staff may act on a resource
    pub fn can_manage(&self, owner_id: Uuid) -> bool {
        self.is_staff || self.id == owner_id
    }

    /// Fail with 403 unless the caller owns the resource or is staff
    pub fn ensure_can_manage(&self, owner_id: Uuid, what: &str) -> AppResult<()> {
        if self.can_manage(owner_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("Not allowed to modify this {}", what)))
        }
    }
}

impl FromRequest for ActingUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req.headers()))
    }
}

fn keyed_mac(secret: &str) -> AppResult<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Config(format!("Invalid webhook key: {}", e)))
}

/// Hex-encoded HMAC-SHA256 of `message` keyed with `secret`
pub fn sign(secret: &str, message: &[u8]) -> AppResult<String> {
    let mut mac = keyed_mac(secret)?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn signature_matches(secret: &str, message: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = keyed_mac(secret) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(&expected).is_ok()
}

/// Authenticate a webhook delivery.
///
/// Either header may carry the proof. A body signature is checked first since
/// it also covers the payload.
pub fn verify_webhook_signature(
    webhook_hash: &str,
    body_signature: Option<&str>,
    secret_signature: Option<&str>,
    body: &[u8],
) -> AppResult<()> {
    if webhook_hash.is_empty() {
        return Err(AppError::Config("Webhook hash is not configured".to_string()));
    }

    if let Some(signature) = body_signature {
        if signature_matches(webhook_hash, body, signature) {
            return Ok(());
        }
    }

    if let Some(signature) = secret_signature {
        if signature_matches(webhook_hash, webhook_hash.as_bytes(), signature) {
            return Ok(());
        }
    }

    Err(AppError::Unauthorized("Invalid webhook signature".to_string()))
}

/// Header-based variant of [`verify_webhook_signature`]
pub fn verify_webhook_headers(webhook_hash: &str, headers: &HeaderMap, body: &[u8]) -> AppResult<()> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    verify_webhook_signature(
        webhook_hash,
        header(BODY_SIGNATURE_HEADER),
        header(SECRET_SIGNATURE_HEADER),
        body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};

    const HASH: &str = "my-webhook-hash";

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for &(name, value) in pairs {
            map.insert(
                HeaderName::from_static(name),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_body_signature_accepted() {
        let body = br#"{"tx_ref":"abc","status":"success"}"#;
        let signature = sign(HASH, body).unwrap();
        assert!(verify_webhook_signature(HASH, Some(&signature), None, body).is_ok());
    }

    #[test]
    fn test_sign_accepts_any_key_length() {
        assert_eq!(sign("", b"{}").unwrap().len(), 64);
        assert_eq!(sign(&"k".repeat(200), b"{}").unwrap().len(), 64);
    }

    #[test]
    fn test_secret_signature_accepted() {
        let signature = sign(HASH, HASH.as_bytes()).unwrap();
        assert!(verify_webhook_signature(HASH, None, Some(&signature), b"{}").is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let signature = sign(HASH, br#"{"tx_ref":"abc"}"#).unwrap();
        let result = verify_webhook_signature(HASH, Some(&signature), None, br#"{"tx_ref":"xyz"}"#);
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_missing_or_garbage_signature_rejected() {
        assert!(verify_webhook_signature(HASH, None, None, b"{}").is_err());
        assert!(verify_webhook_signature(HASH, Some("not-hex"), Some("zz"), b"{}").is_err());
        let wrong_key = sign("other-hash", b"{}").unwrap();
        assert!(verify_webhook_signature(HASH, Some(&wrong_key), None, b"{}").is_err());
    }

    #[test]
    fn test_verify_webhook_headers() {
        let body = b"{}";
        let map = headers(&[(BODY_SIGNATURE_HEADER, sign(HASH, body).unwrap().as_str())]);
        assert!(verify_webhook_headers(HASH, &map, body).is_ok());
        assert!(verify_webhook_headers(HASH, &HeaderMap::new(), body).is_err());
    }

    #[test]
    fn test_acting_user_from_headers() {
        let id = Uuid::new_v4();
        let map = headers(&[(USER_ID_HEADER, id.to_string().as_str()), (USER_ROLE_HEADER, "Staff")]);
        let user = ActingUser::from_headers(&map).unwrap();
        assert_eq!(user.id, id);
        assert!(user.is_staff);

        let map = headers(&[(USER_ID_HEADER, id.to_string().as_str())]);
        assert!(!ActingUser::from_headers(&map).unwrap().is_staff);
    }

    #[test]
    fn test_acting_user_requires_valid_id() {
        assert!(ActingUser::from_headers(&HeaderMap::new()).is_err());
        let map = headers(&[(USER_ID_HEADER, "42")]);
        assert!(matches!(
            ActingUser::from_headers(&map),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_can_manage() {
        let owner = Uuid::new_v4();
        let guest = ActingUser { id: owner, is_staff: false };
        let stranger = ActingUser { id: Uuid::new_v4(), is_staff: false };
        let staff = ActingUser { id: Uuid::new_v4(), is_staff: true };

        assert!(guest.can_manage(owner));
        assert!(staff.can_manage(owner));
        assert!(stranger.ensure_can_manage(owner, "booking").is_err());
    }
}
