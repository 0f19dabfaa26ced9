use serde::{Deserialize, Serialize};

/// A category within the club (typically an age group or squad).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

/// One capability the user holds: a role name scoped to one category.
///
/// The role name is an open set; `player`, `coach` and `admin` are the ones
/// the screens know about today. A user may hold several assignments across
/// categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: String,
    pub category: CategoryRef,
}

pub const ROLE_PLAYER: &str = "player";

/// Picks the role the UI should operate under.
///
/// Order: the stored preference if it matches an assignment, else the first
/// `player` assignment, else the first assignment of any kind, else nothing
/// when the list is empty.
pub fn select_current_role(
    roles: &[RoleAssignment],
    preferred: Option<&str>,
) -> Option<RoleAssignment> {
    if let Some(pref) = preferred {
        if let Some(found) = roles.iter().find(|r| r.role == pref) {
            return Some(found.clone());
        }
    }

    roles
        .iter()
        .find(|r| r.role == ROLE_PLAYER)
        .or_else(|| roles.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str, category: &str) -> RoleAssignment {
        RoleAssignment {
            role: name.to_string(),
            category: CategoryRef {
                id: category.len() as i64,
                name: category.to_string(),
            },
        }
    }

    #[test]
    fn preference_wins_when_present() {
        let roles = vec![role("player", "U15"), role("coach", "U17")];
        let picked = select_current_role(&roles, Some("coach")).expect("role");
        assert_eq!(picked.role, "coach");
    }

    #[test]
    fn unmatched_preference_falls_back_to_player() {
        let roles = vec![role("coach", "U17"), role("player", "U15")];
        let picked = select_current_role(&roles, Some("admin")).expect("role");
        assert_eq!(picked.role, "player");
        assert_eq!(picked.category.name, "U15");
    }

    #[test]
    fn no_player_falls_back_to_first() {
        let roles = vec![role("coach", "U17"), role("admin", "U19")];
        let picked = select_current_role(&roles, None).expect("role");
        assert_eq!(picked.role, "coach");
    }

    #[test]
    fn empty_roles_selects_nothing() {
        assert_eq!(select_current_role(&[], Some("player")), None);
    }
}
