#[derive(Debug, Copy, Clone, Eq, PartialEq, strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Role {
    Admin = 1,
    /// Chef de chantier: seul rôle autorisé à saisir les pointages.
    Chef = 2,
    Employe = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Chef),
            3 => Some(Role::Employe),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids_round_trip() {
        for role in [Role::Admin, Role::Chef, Role::Employe] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(9), None);
    }

    #[test]
    fn display_matches_session_claims() {
        assert_eq!(Role::Chef.to_string(), "CHEF");
        assert_eq!(Role::Admin.to_string(), "ADMIN");
    }
}
