//! Group accessors and membership operations.
use std::collections::HashSet;

use tracing::debug;

use super::{ADObject, ObjectKind};
use crate::{constants::GroupType, directory::Directory, domain::Domain, error::Error};

impl ADObject {
	/// The `groupType` property as a signed integer, as stored by AD.
	pub fn group_type(&self) -> Result<i64, Error> {
		self.expect_kind(ObjectKind::Group)?;
		self.integer("groupType")
	}

	/// The `groupType` property as flags.
	pub fn group_flags(&self) -> Result<GroupType, Error> {
		// groupType is a signed 32 bit value; keep its bit pattern
		Ok(GroupType::from_bits_retain(self.group_type()? as u32))
	}

	/// Distinguished names of the members.
	pub fn member_dns(&self) -> Result<&[String], Error> {
		self.expect_kind(ObjectKind::Group)?;
		self.property("member")
	}

	/// Look up all members, each with its class guessed.
	pub async fn members<D: Directory>(
		&self,
		domain: &mut Domain<D>,
	) -> Result<Vec<ADObject>, Error> {
		let mut members = Vec::new();
		for dn in self.member_dns()? {
			match domain.get_object_by_dn(dn).await? {
				Some(member) => members.push(domain.guess_object_type(member).await?),
				None => debug!("Member {dn} of {} not found", self.distinguished_name()),
			}
		}
		Ok(members)
	}

	/// Add the objects with the given `sAMAccountName`s to the group. Names
	/// that do not resolve are skipped. Returns whether anything was written.
	pub async fn add_members<D: Directory>(
		&mut self,
		domain: &mut Domain<D>,
		names: &[&str],
	) -> Result<bool, Error> {
		let current = self.member_dns()?.to_vec();
		let mut added = Vec::new();
		for dn in resolve(domain, names, false).await? {
			if contains(&current, &dn) {
				return Err(Error::GroupMemberExists(dn));
			}
			added.push(dn);
		}
		let mut members = current;
		members.extend(added);
		self.set_property("member", members)?;
		self.set_properties(domain).await
	}

	/// Remove the objects with the given `sAMAccountName`s from the group.
	/// Names that do not resolve are skipped. Returns whether anything was
	/// written.
	pub async fn delete_members<D: Directory>(
		&mut self,
		domain: &mut Domain<D>,
		names: &[&str],
	) -> Result<bool, Error> {
		let current = self.member_dns()?.to_vec();
		let removed = resolve(domain, names, false).await?;
		if let Some(dn) = removed.iter().find(|dn| !contains(&current, dn)) {
			let dn = dn.clone();
			self.get_properties(domain, &["member".to_owned()]).await?;
			return Err(Error::GroupMemberDoesNotExist(dn));
		}
		let members = current.into_iter().filter(|member| !contains(&removed, member)).collect();
		self.set_property("member", members)?;
		self.set_properties(domain).await
	}

	/// Replace the member list. Every name must resolve. Returns whether
	/// anything was written.
	pub async fn overwrite_members<D: Directory>(
		&mut self,
		domain: &mut Domain<D>,
		names: &[&str],
	) -> Result<bool, Error> {
		let current = self.member_dns()?;
		let members = resolve(domain, names, true).await?;
		let old: HashSet<String> = current.iter().map(|dn| dn.to_ascii_lowercase()).collect();
		let new: HashSet<String> = members.iter().map(|dn| dn.to_ascii_lowercase()).collect();
		if old == new {
			return Ok(false);
		}
		self.set_property("member", members)?;
		self.set_properties(domain).await
	}
}

/// Resolve account names to distinguished names.
async fn resolve<D: Directory>(
	domain: &mut Domain<D>,
	names: &[&str],
	strict: bool,
) -> Result<Vec<String>, Error> {
	let mut dns = Vec::with_capacity(names.len());
	for name in names {
		match domain.get_object_by_name(name).await? {
			Some(object) => dns.push(object.distinguished_name().to_owned()),
			None if strict => return Err(Error::ObjectNotFound((*name).to_owned())),
			None => debug!("Skipping unknown account {name}"),
		}
	}
	Ok(dns)
}

/// Whether `dns` holds `dn`, ignoring case.
fn contains(dns: &[String], dn: &str) -> bool {
	dns.iter().any(|member| member.eq_ignore_ascii_case(dn))
}
