//! Enumerated authorization roles carried by tokens and user records.

// self
use crate::_prelude::*;

/// Role granted to a principal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
	#[default]
	/// Regular account.
	User,
	/// Administrative account.
	Admin,
}
impl Role {
	/// Returns the wire label (`USER`, `ADMIN`).
	pub const fn as_str(self) -> &'static str {
		match self {
			Role::User => "USER",
			Role::Admin => "ADMIN",
		}
	}
}
impl Display for Role {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Role {
	type Err = UnknownRole;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"USER" => Ok(Role::User),
			"ADMIN" => Ok(Role::Admin),
			other => Err(UnknownRole(other.to_owned())),
		}
	}
}

/// Error returned when parsing an unrecognized role label.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown role `{0}`.")]
pub struct UnknownRole(pub String);

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn wire_labels_are_uppercase() {
		assert_eq!(
			serde_json::to_string(&Role::Admin).expect("Role should serialize."),
			"\"ADMIN\""
		);
		assert_eq!(
			serde_json::from_str::<Role>("\"USER\"").expect("Role should deserialize."),
			Role::User
		);
		assert!(serde_json::from_str::<Role>("\"user\"").is_err());
	}

	#[test]
	fn parse_matches_display() {
		for role in [Role::User, Role::Admin] {
			assert_eq!(role.to_string().parse::<Role>(), Ok(role));
		}

		assert_eq!("OWNER".parse::<Role>(), Err(UnknownRole("OWNER".into())));
	}
}
