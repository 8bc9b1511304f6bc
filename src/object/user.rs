//! Accessors and account operations of users, also available on computers.
use tracing::info;

use super::{ADObject, ObjectKind};
use crate::{
	constants::{UserAccountControl, PROP_UAC_COMPUTED},
	directory::Directory,
	domain::Domain,
	error::Error,
};

/// Whether the flag is set in `value`.
fn has(value: i64, flag: UserAccountControl) -> bool {
	crate::convert::bitmask_bool(value, i64::from(flag.bits()))
}

impl ADObject {
	/// The `userAccountControl` flags as an integer.
	pub fn user_account_control(&self) -> Result<i64, Error> {
		self.expect_kind(ObjectKind::User)?;
		self.integer("userAccountControl")
	}

	/// The flags computed by the server, such as lockout and password
	/// expiry.
	pub fn msds_ua_control_computed(&self) -> Result<i64, Error> {
		self.expect_kind(ObjectKind::User)?;
		self.integer(PROP_UAC_COMPUTED)
	}

	/// The `displayName` property
	pub fn display_name(&self) -> Result<&str, Error> {
		self.expect_kind(ObjectKind::User)?;
		self.first("displayName")
	}

	/// The account name used to log on, `sAMAccountName`.
	pub fn sam_account_name(&self) -> Result<&str, Error> {
		if !self.kind.is_a(ObjectKind::Group) {
			self.expect_kind(ObjectKind::User)?;
		}
		self.first("sAMAccountName")
	}

	/// Whether the account is disabled.
	pub fn disabled(&self) -> Result<bool, Error> {
		Ok(has(self.user_account_control()?, UserAccountControl::ACCOUNTDISABLE))
	}

	/// Whether the account is locked out. Uses the computed flags when they
	/// were retrieved.
	pub fn locked_out(&self) -> Result<bool, Error> {
		self.computed_flag(UserAccountControl::LOCKOUT)
	}

	/// Whether the password has expired.
	pub fn pwd_expired(&self) -> Result<bool, Error> {
		self.computed_flag(UserAccountControl::PASSWORD_EXPIRED)
	}

	/// Whether the password is exempt from expiry.
	pub fn pwd_never_expires(&self) -> Result<bool, Error> {
		Ok(has(self.user_account_control()?, UserAccountControl::DONT_EXPIRE_PASSWD))
	}

	/// Look up a flag in the computed flags, falling back to
	/// `userAccountControl`.
	fn computed_flag(&self, flag: UserAccountControl) -> Result<bool, Error> {
		match self.msds_ua_control_computed() {
			Ok(value) => Ok(has(value, flag)),
			Err(Error::PropertyNotFound(_)) => Ok(has(self.user_account_control()?, flag)),
			Err(err) => Err(err),
		}
	}

	/// Enable a disabled account.
	pub async fn enable<D: Directory>(&mut self, domain: &mut Domain<D>) -> Result<(), Error> {
		if !self.disabled()? {
			return Err(Error::UserNotDisabled);
		}
		let value =
			self.user_account_control()? & !i64::from(UserAccountControl::ACCOUNTDISABLE.bits());
		self.set_property("userAccountControl", vec![value.to_string()])?;
		self.set_properties(domain).await?;
		info!("Enabled {}", self.distinguished_name());
		Ok(())
	}

	/// Disable an enabled account.
	pub async fn disable<D: Directory>(&mut self, domain: &mut Domain<D>) -> Result<(), Error> {
		if self.disabled()? {
			return Err(Error::UserNotEnabled);
		}
		let value =
			self.user_account_control()? | i64::from(UserAccountControl::ACCOUNTDISABLE.bits());
		self.set_property("userAccountControl", vec![value.to_string()])?;
		self.set_properties(domain).await?;
		info!("Disabled {}", self.distinguished_name());
		Ok(())
	}

	/// Unlock a locked out account. Returns whether the server reports the
	/// account as unlocked afterwards.
	pub async fn unlock<D: Directory>(&mut self, domain: &mut Domain<D>) -> Result<bool, Error> {
		if !self.locked_out()? {
			return Err(Error::UserNotLockedOut);
		}
		self.set_property("lockoutTime", vec!["0".to_owned()])?;
		self.set_properties(domain).await?;
		self.get_properties(domain, &[PROP_UAC_COMPUTED.to_owned()]).await?;
		let unlocked = !self.locked_out()?;
		info!("Unlocked {}: {unlocked}", self.distinguished_name());
		Ok(unlocked)
	}
}
