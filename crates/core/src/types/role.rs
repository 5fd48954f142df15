//! User role (numeric permission tier).

use serde::{Deserialize, Serialize};

/// Error returned when a numeric tier does not name a role.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid role tier: {0}")]
pub struct RoleError(pub i32);

/// Permission tier of a user account.
///
/// Stored and serialized as its numeric tier: `0` for customers, `1` for
/// administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum Role {
    /// Regular shopper.
    #[default]
    Customer,
    /// Store administrator: may manage products, categories and orders.
    Admin,
}

impl Role {
    /// Numeric tier of the role.
    #[must_use]
    pub const fn tier(self) -> i32 {
        match self {
            Self::Customer => 0,
            Self::Admin => 1,
        }
    }

    /// Whether this role may use admin-only endpoints.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl From<Role> for i32 {
    fn from(role: Role) -> Self {
        role.tier()
    }
}

impl TryFrom<i32> for Role {
    type Error = RoleError;

    fn try_from(tier: i32) -> Result<Self, Self::Error> {
        match tier {
            0 => Ok(Self::Customer),
            1 => Ok(Self::Admin),
            other => Err(RoleError(other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let tier = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::try_from(tier)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Role {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.tier(), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_customer() {
        assert_eq!(Role::default(), Role::Customer);
        assert!(!Role::default().is_admin());
    }

    #[test]
    fn test_tier_round_trip() {
        for role in [Role::Customer, Role::Admin] {
            assert_eq!(Role::try_from(role.tier()).unwrap(), role);
        }
        assert_eq!(Role::try_from(7), Err(RoleError(7)));
    }

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "1");
        let role: Role = serde_json::from_str("0").unwrap();
        assert_eq!(role, Role::Customer);
        assert!(serde_json::from_str::<Role>("5").is_err());
    }
}
