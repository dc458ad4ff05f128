use serde::{Deserialize, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

/// Profile of the authenticated user, as returned by `GET {api_base}/user/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
pub struct UserProfile {
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub id: i64,
    pub email: String,
    /// Account balance
    pub credit: f64,
    /// API key issued to the user
    pub key: String,
}

impl UserProfile {
    /// Balance formatted for display, trimming a zero fractional part.
    pub fn display_credit(&self) -> String {
        if self.credit.fract() == 0.0 {
            format!("{:.0}", self.credit)
        } else {
            format!("{:.2}", self.credit)
        }
    }
}

/// Second factor accepted by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginCredential {
    Password(String),
    Otp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub credential: LoginCredential,
    pub remember: bool,
}

impl LoginRequest {
    pub fn with_password(email: impl Into<String>, password: impl Into<String>, remember: bool) -> Self {
        Self {
            email: email.into(),
            credential: LoginCredential::Password(password.into()),
            remember,
        }
    }

    pub fn with_otp(email: impl Into<String>, otp: impl Into<String>, remember: bool) -> Self {
        Self {
            email: email.into(),
            credential: LoginCredential::Otp(otp.into()),
            remember,
        }
    }

    /// JSON body for `POST {api_base}/auth/login`
    pub fn to_body(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "email": self.email,
            "remember": self.remember,
        });
        match &self.credential {
            LoginCredential::Password(password) => body["password"] = password.clone().into(),
            LoginCredential::Otp(otp) => body["otp"] = otp.clone().into(),
        }
        body
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub remember: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserializes_backend_shape() {
        let json = r#"{"id":1,"email":"a@b.com","credit":10,"key":"k"}"#;
        let user: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.credit, 10.0);
        assert_eq!(user.key, "k");
    }

    #[test]
    fn test_profile_missing_field_is_rejected() {
        let json = r#"{"id":1,"email":"a@b.com","credit":10}"#;
        assert!(serde_json::from_str::<UserProfile>(json).is_err());
    }

    #[cfg(feature = "ts")]
    #[test]
    fn test_ts_profile_id_is_number() {
        let decl = UserProfile::decl();
        assert!(decl.contains("id: number"));
        assert!(!decl.contains("bigint"));
    }

    #[test]
    fn test_display_credit() {
        let mut user = UserProfile {
            id: 1,
            email: "a@b.com".to_string(),
            credit: 10.0,
            key: "k".to_string(),
        };
        assert_eq!(user.display_credit(), "10");
        user.credit = 2.5;
        assert_eq!(user.display_credit(), "2.50");
    }

    #[test]
    fn test_login_body_password() {
        let body = LoginRequest::with_password("a@b.com", "secret", true).to_body();
        assert_eq!(body["email"], "a@b.com");
        assert_eq!(body["password"], "secret");
        assert_eq!(body["remember"], true);
        assert!(body.get("otp").is_none());
    }

    #[test]
    fn test_login_body_otp() {
        let body = LoginRequest::with_otp("a@b.com", "123456", false).to_body();
        assert_eq!(body["otp"], "123456");
        assert_eq!(body["remember"], false);
        assert!(body.get("password").is_none());
    }

    #[test]
    fn test_login_response_remember_defaults_false() {
        let resp: LoginResponse = serde_json::from_str(r#"{"success":true,"token":"t"}"#).unwrap();
        assert_eq!(resp.token, "t");
        assert!(!resp.remember);
    }
}
