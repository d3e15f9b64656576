use serde::{Deserialize, Serialize};

use bookbuddy_http::AppError;

/// Body of both `POST /auth/register` and `POST /auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// Both fields present and non-empty.
    pub fn require(self) -> Result<(String, String), AppError> {
        let username = self.username.filter(|u| !u.trim().is_empty());
        let password = self.password.filter(|p| !p.is_empty());

        match (username, password) {
            (Some(username), Some(password)) => Ok((username, password)),
            (username, password) => {
                let missing: Vec<_> = [
                    ("username", username.is_none()),
                    ("password", password.is_none()),
                ]
                .into_iter()
                .filter(|(_, missing)| *missing)
                .map(|(field, _)| serde_json::json!({ "field": field, "error": "required" }))
                .collect();
                Err(AppError::validation(missing, "username and password are required"))
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_reports_each_missing_field() {
        let err = Credentials {
            username: Some(" ".to_string()),
            password: None,
        }
        .require()
        .unwrap_err();

        match err {
            AppError::Validation { details, .. } => assert_eq!(details.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }

        let (username, password) = Credentials {
            username: Some("ana".to_string()),
            password: Some("pw".to_string()),
        }
        .require()
        .unwrap();
        assert_eq!((username.as_str(), password.as_str()), ("ana", "pw"));
    }
}
