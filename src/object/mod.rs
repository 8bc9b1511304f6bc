//! Directory objects.
//!
//! Every entry is represented by one record type, [`ADObject`], tagged with
//! an [`ObjectKind`]. Class specific accessors and operations live in the
//! submodules and check the tag against the class table in
//! [`constants`](crate::constants) before interpreting properties.
use std::{
	collections::{HashMap, HashSet},
	fmt,
};

use ldap3::{Mod, SearchEntry};
use regex::Regex;
use tracing::debug;

use crate::{
	constants::{ClassInfo, CLASSES, RE_CN, RE_OU},
	convert::text_time_to_unix,
	directory::Directory,
	dn,
	domain::{Domain, SearchOptions},
	error::Error,
};

mod computer;
mod container;
mod group;
mod user;

/// Attribute name to values.
pub type Properties = HashMap<String, Vec<String>>;

/// The class of a directory object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
	/// Any object, with only generic accessors
	Object,
	/// A user account
	User,
	/// A computer account; also a user
	Computer,
	/// A security or distribution group
	Group,
	/// A CN container, organizational unit or domain
	Container,
}

impl ObjectKind {
	/// This class's row of the class table.
	#[must_use]
	pub fn info(self) -> &'static ClassInfo {
		&CLASSES[self as usize]
	}

	/// Properties that must be present for objects of this class.
	#[must_use]
	pub fn mandatory_properties(self) -> &'static [&'static str] {
		self.info().mandatory
	}

	/// Whether objects of this class support the accessors of `other`.
	#[must_use]
	pub fn is_a(self, other: ObjectKind) -> bool {
		let mut kind = Some(self);
		while let Some(current) = kind {
			if current == other {
				return true;
			}
			kind = current.info().parent;
		}
		false
	}

	/// Guess the class from an `objectCategory` value.
	#[must_use]
	pub fn from_category(category: &str) -> Option<Self> {
		let category = category.to_ascii_lowercase();
		[Self::Computer, Self::User, Self::Group, Self::Container].into_iter().find(|kind| {
			kind.info()
				.categories
				.iter()
				.any(|prefix| category.starts_with(&prefix.to_ascii_lowercase()))
		})
	}

	/// Attributes to request when searching for objects of this class.
	pub(crate) fn search_attributes(self, requested: Option<&[String]>) -> Vec<String> {
		let mut attrs = match requested {
			Some(requested) => requested.to_vec(),
			None => vec!["*".to_owned()],
		};
		let info = self.info();
		for attr in info.mandatory.iter().chain(info.extra_attributes) {
			if !attrs.iter().any(|a| a.eq_ignore_ascii_case(attr)) {
				attrs.push((*attr).to_owned());
			}
		}
		attrs
	}
}

impl fmt::Display for ObjectKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.info().label)
	}
}

/// An object in the directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ADObject {
	/// Class of the object
	kind: ObjectKind,
	/// Current, possibly locally modified, properties
	properties: Properties,
	/// Properties as last read from or written to the directory
	snapshot: Properties,
	/// Values that are not valid UTF-8, such as `objectGUID`
	binary: HashMap<String, Vec<Vec<u8>>>,
}

impl ADObject {
	/// Create an object from already retrieved properties. Mandatory
	/// properties of `kind` that are missing are added without values.
	#[must_use]
	pub fn new(kind: ObjectKind, distinguished_name: &str, mut properties: Properties) -> Self {
		if let Some(name) = find_key(&properties, "distinguishedName").map(str::to_owned) {
			properties.remove(&name);
		}
		properties.insert("distinguishedName".to_owned(), vec![distinguished_name.to_owned()]);
		for prop in kind.mandatory_properties() {
			if find_key(&properties, prop).is_none() {
				properties.insert((*prop).to_owned(), Vec::new());
			}
		}
		Self { kind, snapshot: properties.clone(), properties, binary: HashMap::new() }
	}

	/// Create an object from a search result.
	#[must_use]
	pub fn from_entry(kind: ObjectKind, entry: SearchEntry) -> Self {
		let mut object = Self::new(kind, &entry.dn, entry.attrs);
		object.binary = entry.bin_attrs;
		object
	}

	/// Class of the object
	#[must_use]
	pub fn kind(&self) -> ObjectKind {
		self.kind
	}

	/// All properties, including local modifications.
	#[must_use]
	pub fn properties(&self) -> &Properties {
		&self.properties
	}

	/// Values of a property.
	pub fn property(&self, name: &str) -> Result<&[String], Error> {
		find_key(&self.properties, name)
			.and_then(|key| self.properties.get(key))
			.map(Vec::as_slice)
			.ok_or_else(|| Error::PropertyNotFound(name.to_owned()))
	}

	/// First value of a property; empty if the property has no values.
	pub fn first(&self, name: &str) -> Result<&str, Error> {
		Ok(self.property(name)?.first().map_or("", String::as_str))
	}

	/// First value of a property parsed as an integer.
	pub(crate) fn integer(&self, name: &str) -> Result<i64, Error> {
		let value = self.first(name)?;
		if value.is_empty() {
			return Err(Error::PropertyNotFound(name.to_owned()));
		}
		value.parse().map_err(|_| {
			Error::InvalidPropertyFormat(format!("{name} is not an integer: {value:?}"))
		})
	}

	/// Values of a binary property.
	pub fn binary_property(&self, name: &str) -> Result<&[Vec<u8>], Error> {
		find_key(&self.binary, name)
			.and_then(|key| self.binary.get(key))
			.map(Vec::as_slice)
			.ok_or_else(|| Error::PropertyNotFound(name.to_owned()))
	}

	/// Replace the values of a property locally. Written to the directory by
	/// [`ADObject::set_properties`].
	///
	/// The distinguished name cannot be changed this way; use
	/// [`ADObject::move_to`].
	pub fn set_property(&mut self, name: &str, values: Vec<String>) -> Result<(), Error> {
		refuse_dn(name)?;
		let key = find_key(&self.properties, name).unwrap_or(name).to_owned();
		self.properties.insert(key, values);
		Ok(())
	}

	/// Remove a property locally, returning its values.
	pub fn remove_property(&mut self, name: &str) -> Result<Option<Vec<String>>, Error> {
		refuse_dn(name)?;
		Ok(find_key(&self.properties, name)
			.map(str::to_owned)
			.and_then(|key| self.properties.remove(&key)))
	}

	/// The distinguished name
	#[must_use]
	pub fn distinguished_name(&self) -> &str {
		self.first("distinguishedName").unwrap_or_default()
	}

	/// The `name` property
	pub fn name(&self) -> Result<&str, Error> {
		self.first("name")
	}

	/// The `description` property
	pub fn description(&self) -> Result<&str, Error> {
		self.first("description")
	}

	/// All `objectClass` values
	pub fn object_class(&self) -> Result<&[String], Error> {
		self.property("objectClass")
	}

	/// The `objectCategory` property
	pub fn object_category(&self) -> Result<&str, Error> {
		self.first("objectCategory")
	}

	/// Creation time in seconds since the Unix epoch; 0 if unknown.
	pub fn created_time(&self) -> Result<i64, Error> {
		self.time("createTimeStamp", "whenCreated")
	}

	/// Modification time in seconds since the Unix epoch; 0 if unknown.
	pub fn modified_time(&self) -> Result<i64, Error> {
		self.time("modifyTimeStamp", "whenChanged")
	}

	/// Parse the first non-empty of two time properties.
	fn time(&self, name: &str, fallback: &str) -> Result<i64, Error> {
		let value = match self.first(name) {
			Ok("") | Err(Error::PropertyNotFound(_)) => self.first(fallback).unwrap_or_default(),
			other => other?,
		};
		if value.is_empty() {
			Ok(0)
		} else {
			text_time_to_unix(value)
		}
	}

	/// The canonical name, e.g. `example.com\Users\jdoe`
	#[must_use]
	pub fn canonical_name(&self) -> String {
		dn::canonical_name(self.distinguished_name())
	}

	/// Fail unless the object supports the accessors of `kind`.
	pub(crate) fn expect_kind(&self, kind: ObjectKind) -> Result<(), Error> {
		if self.kind.is_a(kind) {
			Ok(())
		} else {
			Err(Error::WrongObjectClass { expected: kind, actual: self.kind })
		}
	}

	/// Check that all mandatory properties of the object's class are present.
	pub fn validate(&self) -> Result<(), Error> {
		match self
			.kind
			.mandatory_properties()
			.iter()
			.find(|prop| find_key(&self.properties, prop).is_none())
		{
			Some(prop) => Err(Error::MandatoryPropertyMissing {
				kind: self.kind,
				property: (*prop).to_owned(),
			}),
			None => Ok(()),
		}
	}

	/// Modifications turning the snapshot into the current properties,
	/// ordered by attribute name.
	#[must_use]
	pub fn changes(&self) -> Vec<Mod<String>> {
		let mut names: Vec<&String> = self
			.properties
			.keys()
			.chain(self.snapshot.keys().filter(|name| find_key(&self.properties, name).is_none()))
			.filter(|name| !name.eq_ignore_ascii_case("distinguishedName"))
			.collect();
		names.sort();

		let mut mods = Vec::new();
		for name in names {
			let old = find_key(&self.snapshot, name).and_then(|key| self.snapshot.get(key));
			let new = self.properties.get(name.as_str());
			match (old, new) {
				(Some(old), Some(new)) if same_values(old, new) => {}
				(None, Some(new)) if new.is_empty() => {}
				(_, Some(new)) if new.is_empty() => {
					mods.push(Mod::Delete(name.clone(), HashSet::new()));
				}
				(_, Some(new)) => {
					mods.push(Mod::Replace(name.clone(), new.iter().cloned().collect()));
				}
				(Some(old), None) if old.is_empty() => {}
				(_, None) => mods.push(Mod::Delete(name.clone(), HashSet::new())),
			}
		}
		mods
	}

	/// Write local property changes to the directory.
	///
	/// Every mandatory property of the object's class must be present, even
	/// when it is not among the changes. Nothing is written if no property
	/// changed. Returns whether anything was written.
	pub async fn set_properties<D: Directory>(
		&mut self,
		domain: &mut Domain<D>,
	) -> Result<bool, Error> {
		self.validate()?;
		let mods = self.changes();
		if mods.is_empty() {
			debug!("No changes to write for {}", self.distinguished_name());
			return Ok(false);
		}
		domain.update_object(self.distinguished_name(), mods).await?;
		self.snapshot = self.properties.clone();
		Ok(true)
	}

	/// Read properties from the directory, overwriting local values.
	pub async fn get_properties<D: Directory>(
		&mut self,
		domain: &mut Domain<D>,
		names: &[String],
	) -> Result<(), Error> {
		let options = SearchOptions::new()
			.base(self.distinguished_name())
			.scope(ldap3::Scope::Base)
			.properties(names.to_vec());
		let result = domain.search("(objectClass=*)", options).await?.into_iter().next();
		let Some(result) = result else {
			return Err(Error::ObjectNotFound(self.distinguished_name().to_owned()));
		};
		for name in names {
			let values = result.property(name).map(<[String]>::to_vec).unwrap_or_default();
			let key = find_key(&self.properties, name).unwrap_or(name).to_owned();
			self.properties.insert(key, values.clone());
			let key = find_key(&self.snapshot, name).unwrap_or(name).to_owned();
			self.snapshot.insert(key, values);
		}
		for (name, values) in result.binary {
			self.binary.insert(name, values);
		}
		Ok(())
	}

	/// Re-read every known property from the directory.
	pub async fn refresh<D: Directory>(&mut self, domain: &mut Domain<D>) -> Result<(), Error> {
		let names: Vec<String> = self
			.properties
			.keys()
			.filter(|name| !name.eq_ignore_ascii_case("distinguishedName"))
			.cloned()
			.collect();
		self.get_properties(domain, &names).await
	}

	/// Delete the object from the directory.
	pub async fn delete<D: Directory>(self, domain: &mut Domain<D>) -> Result<(), Error> {
		domain.delete_object(self.distinguished_name()).await
	}

	/// Move the object below `destination`, keeping its RDN.
	pub async fn move_to<D: Directory>(
		&mut self,
		domain: &mut Domain<D>,
		destination: &str,
	) -> Result<(), Error> {
		let new_dn = domain.move_object(self.distinguished_name(), destination).await?;
		self.properties.insert("distinguishedName".to_owned(), vec![new_dn.clone()]);
		self.snapshot.insert("distinguishedName".to_owned(), vec![new_dn]);
		Ok(())
	}
}

impl fmt::Display for ADObject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let dn = self.distinguished_name();
		match self.kind {
			ObjectKind::Object => write!(f, "ADObject: {dn}"),
			ObjectKind::Container => write!(
				f,
				"Container: {}",
				leading_value(&RE_OU, dn).or_else(|| leading_value(&RE_CN, dn)).unwrap_or(dn)
			),
			kind => write!(f, "{kind}: {}", leading_value(&RE_CN, dn).unwrap_or(dn)),
		}
	}
}

/// The value of the leading RDN if it matches `re`.
fn leading_value<'a>(re: &Regex, dn: &'a str) -> Option<&'a str> {
	re.captures(dn).and_then(|caps| caps.get(1)).map(|value| value.as_str())
}

/// Fail if `name` is the distinguished name, which only changes by renaming.
fn refuse_dn(name: &str) -> Result<(), Error> {
	if name.eq_ignore_ascii_case("distinguishedName") {
		Err(Error::Invalid(format!("{name} cannot be set locally, move the object instead")))
	} else {
		Ok(())
	}
}

/// Whether two value lists hold the same values, in any order.
fn same_values(old: &[String], new: &[String]) -> bool {
	old.len() == new.len()
		&& old.iter().collect::<HashSet<_>>() == new.iter().collect::<HashSet<_>>()
}

/// The key under which `name` is stored, matching case-insensitively if there
/// is no exact match.
fn find_key<'a, V>(map: &'a HashMap<String, V>, name: &str) -> Option<&'a str> {
	if let Some((key, _)) = map.get_key_value(name) {
		return Some(key);
	}
	map.keys().find(|key| key.eq_ignore_ascii_case(name)).map(String::as_str)
}
