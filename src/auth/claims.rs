use serde::{Deserialize, Serialize};

/// Role that may manage blocks in every guild
pub const ADMIN_ROLE: &str = "admin";

/// JWT claims identifying a dashboard operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorClaims {
    /// Subject (Discord user ID of the operator)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Guilds the operator may manage
    #[serde(default)]
    pub guild_ids: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl OperatorClaims {
    pub fn operator_id(&self) -> &str {
        &self.sub
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn can_manage(&self, guild_id: &str) -> bool {
        self.has_role(ADMIN_ROLE) || self.guild_ids.iter().any(|g| g == guild_id)
    }

    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(guilds: &[&str], roles: &[&str]) -> OperatorClaims {
        OperatorClaims {
            sub: "42".to_string(),
            exp: chrono::Utc::now().timestamp() + 60,
            iat: chrono::Utc::now().timestamp(),
            guild_ids: guilds.iter().map(|g| g.to_string()).collect(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_guild_scope() {
        let operator = claims(&["9"], &[]);
        assert!(operator.can_manage("9"));
        assert!(!operator.can_manage("10"));
        assert!(!operator.is_expired());
    }

    #[test]
    fn test_admin_manages_any_guild() {
        let admin = claims(&[], &[ADMIN_ROLE]);
        assert!(admin.can_manage("10"));
    }
}
