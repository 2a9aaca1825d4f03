use serde::Serialize;

/// Role attribute of an account record. Only `Administrator` opens protected routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccountRole {
    Administrator,
    Member,
}

impl AccountRole {
    pub const ADMIN: &'static str = "ADMIN";

    /// Exact, case-sensitive match; anything unexpected is an ordinary member.
    pub fn from_column(value: &str) -> Self {
        if value == Self::ADMIN {
            AccountRole::Administrator
        } else {
            AccountRole::Member
        }
    }

    pub fn is_administrator(&self) -> bool {
        matches!(self, AccountRole::Administrator)
    }

    pub fn badge(&self) -> &'static str {
        match self {
            AccountRole::Administrator => "default",
            AccountRole::Member => "secondary",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_requires_exact_spelling() {
        assert_eq!(AccountRole::from_column("ADMIN"), AccountRole::Administrator);
        assert_eq!(AccountRole::from_column("admin"), AccountRole::Member);
        assert_eq!(AccountRole::from_column(" ADMIN"), AccountRole::Member);
        assert_eq!(AccountRole::from_column("USER"), AccountRole::Member);
        assert_eq!(AccountRole::from_column(""), AccountRole::Member);
    }
}
