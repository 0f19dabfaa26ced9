use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Club, RoleAssignment};

/// Denormalized user data cached alongside the tokens.
///
/// Mutated wholesale on login and profile reload, or field-by-field through
/// the session store setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserProfile {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub height_cm: Option<u32>,
    #[serde(default)]
    pub weight_kg: Option<u32>,
    /// Role name the user prefers to operate as; drives current-role
    /// selection at login.
    #[serde(default)]
    pub preferred_role: Option<String>,
}

/// Response envelope of `GET /me/`.
#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub user: UserProfile,
    #[serde(default)]
    pub roles: Vec<RoleAssignment>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub club: Option<Club>,
}
