//! Accessors of computer accounts.
use super::{ADObject, ObjectKind};
use crate::error::Error;

impl ADObject {
	/// First value of a computer property.
	fn computer_first(&self, name: &str) -> Result<&str, Error> {
		self.expect_kind(ObjectKind::Computer)?;
		self.first(name)
	}

	/// All service principal names registered for the computer.
	pub fn service_principal_name(&self) -> Result<&[String], Error> {
		self.expect_kind(ObjectKind::Computer)?;
		self.property("servicePrincipalName")
	}

	/// The `dNSHostName` property
	pub fn dns_hostname(&self) -> Result<&str, Error> {
		self.computer_first("dNSHostName")
	}

	/// The `operatingSystem` property
	pub fn os(&self) -> Result<&str, Error> {
		self.computer_first("operatingSystem")
	}

	/// The `operatingSystemServicePack` property
	pub fn os_service_pack(&self) -> Result<&str, Error> {
		self.computer_first("operatingSystemServicePack")
	}

	/// The `operatingSystemVersion` property
	pub fn os_version(&self) -> Result<&str, Error> {
		self.computer_first("operatingSystemVersion")
	}
}
