//! Role flags and the views they route to.

// self
use crate::_prelude::*;

/// Landlord/tenant flags carried by a session. Both `false` means no role-gated view applies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleFlags {
	/// Session may reach landlord views.
	pub landlord: bool,
	/// Session may reach tenant views.
	pub tenant: bool,
}
impl RoleFlags {
	/// Flags for an unauthenticated session.
	pub const NONE: Self = Self { landlord: false, tenant: false };

	/// Checks whether the flags grant `role`.
	pub fn permits(self, role: Role) -> bool {
		match role {
			Role::Landlord => self.landlord,
			Role::Tenant => self.tenant,
		}
	}

	/// Returns `true` when neither flag is set.
	pub fn is_empty(self) -> bool {
		!self.landlord && !self.tenant
	}
}

/// Role required by a gated view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Property owner.
	Landlord,
	/// Renter assigned to a property.
	Tenant,
}
impl Role {
	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Role::Landlord => "landlord",
			Role::Tenant => "tenant",
		}
	}
}
impl Display for Role {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Navigation target the session layer hands to the view router.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
	/// Public landing view.
	Home,
	/// Login view; used after any forced logout.
	Login,
	/// Landlord dashboard.
	LandlordDashboard,
	/// Landlord dashboard in first-run mode (no properties registered yet).
	LandlordFirstRun,
	/// Tenant dashboard.
	TenantDashboard,
	/// Shown when a session lacks the role a view requires.
	Unauthorized,
}
impl Destination {
	/// Router path for the destination.
	pub const fn path(self) -> &'static str {
		match self {
			Destination::Home => "/",
			Destination::Login => "/login",
			Destination::LandlordDashboard => "/landlord-dashboard",
			Destination::LandlordFirstRun => "/landlord-dashboard?firstLogin=true",
			Destination::TenantDashboard => "/tenant-dashboard",
			Destination::Unauthorized => "/unauthorized",
		}
	}

	/// Dashboard an authenticated session should land on; landlord takes precedence.
	pub fn dashboard_for(flags: RoleFlags) -> Self {
		if flags.landlord {
			Destination::LandlordDashboard
		} else if flags.tenant {
			Destination::TenantDashboard
		} else {
			Destination::Unauthorized
		}
	}

	/// Route guard: `Err(Unauthorized)` unless `flags` grant `role`.
	pub fn guard(flags: RoleFlags, role: Role) -> Result<(), Self> {
		if flags.permits(role) { Ok(()) } else { Err(Destination::Unauthorized) }
	}

	/// Post-login target. `has_properties` only matters for landlords; `None` means the
	/// property count could not be read.
	pub fn after_login(flags: RoleFlags, has_properties: Option<bool>) -> Self {
		if flags.landlord {
			match has_properties {
				Some(false) => Destination::LandlordFirstRun,
				_ => Destination::LandlordDashboard,
			}
		} else if flags.tenant {
			Destination::TenantDashboard
		} else {
			Destination::Home
		}
	}
}
impl Display for Destination {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.path())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const LANDLORD: RoleFlags = RoleFlags { landlord: true, tenant: false };
	const TENANT: RoleFlags = RoleFlags { landlord: false, tenant: true };

	#[test]
	fn guards_follow_flags() {
		assert_eq!(Destination::guard(LANDLORD, Role::Landlord), Ok(()));
		assert_eq!(Destination::guard(LANDLORD, Role::Tenant), Err(Destination::Unauthorized));
		assert_eq!(Destination::guard(RoleFlags::NONE, Role::Tenant), Err(Destination::Unauthorized));
	}

	#[test]
	fn dashboard_redirect_prefers_landlord() {
		let both = RoleFlags { landlord: true, tenant: true };

		assert_eq!(Destination::dashboard_for(both), Destination::LandlordDashboard);
		assert_eq!(Destination::dashboard_for(TENANT), Destination::TenantDashboard);
		assert_eq!(Destination::dashboard_for(RoleFlags::NONE), Destination::Unauthorized);
	}

	#[test]
	fn login_destination_branches_on_property_count() {
		assert_eq!(Destination::after_login(LANDLORD, Some(false)), Destination::LandlordFirstRun);
		assert_eq!(Destination::after_login(LANDLORD, Some(true)), Destination::LandlordDashboard);
		assert_eq!(Destination::after_login(LANDLORD, None), Destination::LandlordDashboard);
		assert_eq!(Destination::after_login(TENANT, None), Destination::TenantDashboard);
		assert_eq!(Destination::after_login(RoleFlags::NONE, Some(true)), Destination::Home);
		assert_eq!(Destination::LandlordFirstRun.path(), "/landlord-dashboard?firstLogin=true");
	}
}
