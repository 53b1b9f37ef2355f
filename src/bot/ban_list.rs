use std::collections::HashSet;

/// Set of account logins whose activity should not be reported.
///
/// Logins are compared case-insensitively, the set only ever stores lowercase values.
#[derive(Debug, Default)]
pub struct BanList {
    logins: HashSet<String>,
}

impl BanList {
    pub fn contains(&self, login: &str) -> bool {
        self.logins.contains(&login.to_lowercase())
    }

    /// Bans the given login. Returns `false` if it was already banned.
    pub fn ban(&mut self, login: &str) -> bool {
        self.logins.insert(login.to_lowercase())
    }

    /// Unbans the given login. Returns `false` if it was not banned.
    pub fn unban(&mut self, login: &str) -> bool {
        self.logins.remove(&login.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.logins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ban_is_case_insensitive() {
        let mut bans = BanList::default();
        assert!(bans.ban("alice"));
        assert!(!bans.ban("ALICE"));
        assert_eq!(bans.len(), 1);
        assert!(bans.contains("Alice"));
    }

    #[test]
    fn stores_lowercase() {
        let mut bans = BanList::default();
        bans.ban("DependaBot");
        assert!(bans.logins.contains("dependabot"));
    }

    #[test]
    fn unban_missing() {
        let mut bans = BanList::default();
        assert!(!bans.unban("bob"));
        assert!(bans.is_empty());
    }

    #[test]
    fn unban_other_case() {
        let mut bans = BanList::default();
        bans.ban("bob");
        assert!(bans.unban("BOB"));
        assert!(!bans.contains("bob"));
    }
}
