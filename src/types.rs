use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
}

/// Body of `/auth/login` and `/auth/refresh` responses.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "accessToken", default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

impl AuthResponse {
    /// The bearer credential, if the payload carried a non-empty one.
    pub fn credential(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Registration form as entered; serialized with first and last name joined into `full_name`.
#[derive(Clone, Debug)]
pub struct RegisterRequest {
    pub login: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Serialize)]
pub(crate) struct RegisterPayload<'a> {
    pub login: &'a str,
    pub email: &'a str,
    pub full_name: String,
    pub password: &'a str,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: &'a str,
}

impl RegisterRequest {
    pub(crate) fn payload(&self) -> RegisterPayload<'_> {
        RegisterPayload {
            login: &self.login,
            email: &self.email,
            full_name: format!("{} {}", self.first_name, self.last_name),
            password: &self.password,
            confirm_password: &self.confirm_password,
        }
    }
}
