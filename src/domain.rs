//! The domain handle: connection lifecycle, searches, lookups and writes.
use std::fmt;

use ldap3::{Mod, Scope};
use tracing::{debug, info};

use crate::{
	config::Config,
	constants::{RE_HOSTNAME, SERVER_MANAGED_PROPS},
	convert::escape,
	directory::{AddAttributes, Directory, LdapDirectory},
	dn,
	entry::SearchEntryExt,
	error::Error,
	object::{ADObject, ObjectKind, Properties},
};

/// Root DSE attributes read on connect.
const ROOT_DSE_ATTRIBUTES: [&str; 4] = [
	"defaultNamingContext",
	"rootDomainNamingContext",
	"schemaNamingContext",
	"configurationNamingContext",
];

/// Parameters of [`Domain::search`] besides the filter.
#[derive(Debug, Clone)]
pub struct SearchOptions {
	/// Where to start; the domain root when unset
	base: Option<String>,
	/// Class of the returned objects
	kind: ObjectKind,
	/// Search scope
	scope: Scope,
	/// Properties to retrieve in addition to the mandatory ones of `kind`;
	/// all user attributes when unset
	properties: Option<Vec<String>>,
}

impl Default for SearchOptions {
	fn default() -> Self {
		Self { base: None, kind: ObjectKind::Object, scope: Scope::Subtree, properties: None }
	}
}

impl SearchOptions {
	/// Subtree search below the domain root returning generic objects.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Start the search at `base`.
	#[must_use]
	pub fn base(mut self, base: &str) -> Self {
		self.base = Some(base.to_owned());
		self
	}

	/// Return objects of class `kind`.
	#[must_use]
	pub fn kind(mut self, kind: ObjectKind) -> Self {
		self.kind = kind;
		self
	}

	/// Use the given search scope.
	#[must_use]
	pub fn scope(mut self, scope: Scope) -> Self {
		self.scope = scope;
		self
	}

	/// Only retrieve these properties, plus the mandatory ones.
	#[must_use]
	pub fn properties(mut self, properties: Vec<String>) -> Self {
		self.properties = Some(properties);
		self
	}
}

/// An Active Directory domain, reached through a [`Directory`].
///
/// Created disconnected; [`Domain::connect`] (or [`Domain::attach`]) binds
/// and reads the naming contexts from the root DSE.
#[derive(Debug)]
pub struct Domain<D = LdapDirectory> {
	/// The bound session, if connected
	directory: Option<D>,
	/// Default naming context
	dn_root: String,
	/// Root domain naming context of the forest
	dn_forest: String,
	/// Schema naming context
	dn_schema: String,
	/// Configuration naming context
	dn_configuration: String,
}

impl<D> Default for Domain<D> {
	fn default() -> Self {
		Self {
			directory: None,
			dn_root: String::new(),
			dn_forest: String::new(),
			dn_schema: String::new(),
			dn_configuration: String::new(),
		}
	}
}

impl Domain<LdapDirectory> {
	/// Connect and bind to the server described by `config`, replacing any
	/// existing connection.
	pub async fn connect(&mut self, config: &Config) -> Result<(), Error> {
		let directory = LdapDirectory::connect(config).await?;
		self.attach(directory).await
	}
}

impl<D: Directory> Domain<D> {
	/// A disconnected domain.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Use an already bound directory session, replacing any existing
	/// connection, and read the root DSE.
	pub async fn attach(&mut self, mut directory: D) -> Result<(), Error> {
		self.disconnect().await?;
		let root_dse = match read_root_dse(&mut directory).await {
			Ok(root_dse) => root_dse,
			Err(err) => {
				if let Err(unbind_err) = directory.unbind().await {
					debug!("Unbinding after failed root DSE read: {unbind_err}");
				}
				return Err(err);
			}
		};
		[self.dn_root, self.dn_forest, self.dn_schema, self.dn_configuration] = root_dse;
		self.directory = Some(directory);
		info!("Connected to domain {}", self.dn_root);
		Ok(())
	}

	/// Unbind from the server. Does nothing if not connected.
	pub async fn disconnect(&mut self) -> Result<(), Error> {
		if let Some(mut directory) = self.directory.take() {
			directory.unbind().await?;
			info!("Disconnected from domain {}", self.dn_root);
		}
		Ok(())
	}

	/// Whether the domain is connected.
	#[must_use]
	pub fn is_connected(&self) -> bool {
		self.directory.is_some()
	}

	/// Default naming context, e.g. `DC=example,DC=com`
	#[must_use]
	pub fn dn_root(&self) -> &str {
		&self.dn_root
	}

	/// Naming context of the forest root domain
	#[must_use]
	pub fn dn_forest(&self) -> &str {
		&self.dn_forest
	}

	/// Schema naming context
	#[must_use]
	pub fn dn_schema(&self) -> &str {
		&self.dn_schema
	}

	/// Configuration naming context
	#[must_use]
	pub fn dn_configuration(&self) -> &str {
		&self.dn_configuration
	}

	/// DNS name of the domain, e.g. `example.com`
	#[must_use]
	pub fn dns_name(&self) -> String {
		dn::dns_name(&self.dn_root)
	}

	/// The session, or [`Error::DomainNotConnected`].
	fn directory(&mut self) -> Result<&mut D, Error> {
		self.directory.as_mut().ok_or(Error::DomainNotConnected)
	}

	/// Search for objects matching an LDAP filter. The outer parentheses of
	/// the filter are optional.
	pub async fn search(
		&mut self,
		filter: &str,
		options: SearchOptions,
	) -> Result<Vec<ADObject>, Error> {
		let directory = self.directory.as_mut().ok_or(Error::DomainNotConnected)?;
		let base = options.base.as_deref().unwrap_or(&self.dn_root);
		let filter =
			if filter.starts_with('(') { filter.to_owned() } else { format!("({filter})") };
		let attrs = options.kind.search_attributes(options.properties.as_deref());

		debug!("Searching {base} for {filter}");
		let entries = directory.search(base, options.scope, &filter, &attrs).await?;
		debug!("Found {} entries", entries.len());
		Ok(entries.into_iter().map(|entry| ADObject::from_entry(options.kind, entry)).collect())
	}

	/// The first match of a filter.
	async fn find(&mut self, filter: &str, kind: ObjectKind) -> Result<Option<ADObject>, Error> {
		Ok(self.search(filter, SearchOptions::new().kind(kind)).await?.into_iter().next())
	}

	/// Look up an object of class `kind` by account name.
	async fn by_name(&mut self, name: &str, kind: ObjectKind) -> Result<Option<ADObject>, Error> {
		self.find(&format!("(sAMAccountName={})", escape(name)?), kind).await
	}

	/// Look up an object of class `kind` by distinguished name, also matching
	/// its category unless `kind` is [`ObjectKind::Object`].
	async fn by_dn(&mut self, dn: &str, kind: ObjectKind) -> Result<Option<ADObject>, Error> {
		let dn_filter = format!("(distinguishedName={})", escape(dn)?);
		let categories: Vec<String> = kind
			.info()
			.categories
			.iter()
			.map(|category| format!("(objectCategory={category}{})", self.dn_configuration))
			.collect();
		let filter = match categories.as_slice() {
			[] => dn_filter,
			[category] => format!("(&{dn_filter}{category})"),
			categories => format!("(&{dn_filter}(|{}))", categories.concat()),
		};
		self.find(&filter, kind).await
	}

	/// Look up any object by `sAMAccountName`.
	pub async fn get_object_by_name(&mut self, name: &str) -> Result<Option<ADObject>, Error> {
		self.by_name(name, ObjectKind::Object).await
	}

	/// Look up a user by `sAMAccountName`.
	pub async fn get_user_by_name(&mut self, name: &str) -> Result<Option<ADObject>, Error> {
		self.by_name(name, ObjectKind::User).await
	}

	/// Look up a computer by FQDN, host name or account name (`HOST$`).
	pub async fn get_computer_by_name(&mut self, name: &str) -> Result<Option<ADObject>, Error> {
		let Some(account) = RE_HOSTNAME.find(name) else {
			debug!("{name:?} is not a computer name");
			return Ok(None);
		};
		let mut account = account.as_str().to_owned();
		if !account.ends_with('$') {
			account.push('$');
		}
		self.by_name(&account, ObjectKind::Computer).await
	}

	/// Look up a group by `sAMAccountName`.
	pub async fn get_group_by_name(&mut self, name: &str) -> Result<Option<ADObject>, Error> {
		self.by_name(name, ObjectKind::Group).await
	}

	/// Look up any object by distinguished name.
	pub async fn get_object_by_dn(&mut self, dn: &str) -> Result<Option<ADObject>, Error> {
		self.by_dn(dn, ObjectKind::Object).await
	}

	/// Look up a user by distinguished name.
	pub async fn get_user_by_dn(&mut self, dn: &str) -> Result<Option<ADObject>, Error> {
		self.by_dn(dn, ObjectKind::User).await
	}

	/// Look up a computer by distinguished name.
	pub async fn get_computer_by_dn(&mut self, dn: &str) -> Result<Option<ADObject>, Error> {
		self.by_dn(dn, ObjectKind::Computer).await
	}

	/// Look up a group by distinguished name.
	pub async fn get_group_by_dn(&mut self, dn: &str) -> Result<Option<ADObject>, Error> {
		self.by_dn(dn, ObjectKind::Group).await
	}

	/// Look up a CN container, organizational unit or domain by
	/// distinguished name.
	pub async fn get_container_by_dn(&mut self, dn: &str) -> Result<Option<ADObject>, Error> {
		self.by_dn(dn, ObjectKind::Container).await
	}

	/// Re-fetch an object as the class its `objectCategory` indicates.
	/// Returns the object unchanged if the class cannot be determined.
	pub async fn guess_object_type(&mut self, object: ADObject) -> Result<ADObject, Error> {
		let Some(kind) = object.object_category().ok().and_then(ObjectKind::from_category) else {
			return Ok(object);
		};
		if kind == object.kind() {
			return Ok(object);
		}
		let guessed = self.by_dn(object.distinguished_name(), kind).await?;
		Ok(guessed.unwrap_or(object))
	}

	/// Create an object. Properties without values are left out.
	pub async fn new_object(&mut self, dn: &str, properties: Properties) -> Result<(), Error> {
		let attrs: AddAttributes = properties
			.into_iter()
			.filter(|(_, values)| !values.is_empty())
			.map(|(name, values)| (name, values.into_iter().collect()))
			.collect();
		self.directory()?.add(dn, attrs).await?;
		info!("Created {dn}");
		Ok(())
	}

	/// Create a user. Sets the user category and object classes; all other
	/// user properties the server does not maintain itself must be given.
	pub async fn new_user(&mut self, dn: &str, mut properties: Properties) -> Result<(), Error> {
		let info = ObjectKind::User.info();
		properties.retain(|name, _| {
			!["objectCategory", "objectClass"].iter().any(|prop| name.eq_ignore_ascii_case(prop))
		});
		properties.insert(
			"objectCategory".to_owned(),
			vec![format!("{}{}", info.categories.concat(), self.dn_configuration)],
		);
		properties.insert(
			"objectClass".to_owned(),
			info.object_classes.iter().map(|class| (*class).to_owned()).collect(),
		);
		if let Some(missing) = info.mandatory.iter().find(|prop| {
			!SERVER_MANAGED_PROPS.contains(*prop)
				&& !properties.keys().any(|name| name.eq_ignore_ascii_case(prop))
		}) {
			return Err(Error::InvalidPropertyFormat(format!(
				"{missing} is missing from the properties of the new user"
			)));
		}
		self.new_object(dn, properties).await
	}

	/// Apply modifications to an object.
	pub async fn update_object(&mut self, dn: &str, mods: Vec<Mod<String>>) -> Result<(), Error> {
		debug!("Writing {} modifications to {dn}", mods.len());
		self.directory()?.modify(dn, mods).await
	}

	/// Delete an object.
	pub async fn delete_object(&mut self, dn: &str) -> Result<(), Error> {
		self.directory()?.delete(dn).await?;
		info!("Deleted {dn}");
		Ok(())
	}

	/// Move an object below `destination`, keeping its RDN. Returns the new
	/// distinguished name.
	pub async fn move_object(&mut self, dn: &str, destination: &str) -> Result<String, Error> {
		let Some(rdn) = dn::split_rdns(dn).first().copied() else {
			return Err(Error::Invalid(format!("Cannot move {dn:?}: no RDN")));
		};
		self.directory()?.rename(dn, rdn, Some(destination)).await?;
		let new_dn = format!("{rdn},{destination}");
		info!("Moved {dn} to {new_dn}");
		Ok(new_dn)
	}
}

impl<D> fmt::Display for Domain<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.directory.is_some() {
			write!(f, "Domain: {}", self.dn_root)
		} else {
			f.write_str("Domain: Not Connected")
		}
	}
}

/// Read the naming contexts from the root DSE: default, forest root, schema
/// and configuration.
async fn read_root_dse<D: Directory>(directory: &mut D) -> Result<[String; 4], Error> {
	let attrs: Vec<String> = ROOT_DSE_ATTRIBUTES.iter().map(|attr| (*attr).to_owned()).collect();
	let entries = directory.search("", Scope::Base, "(objectClass=*)", &attrs).await?;
	let root_dse = entries.first().ok_or_else(|| Error::ObjectNotFound("root DSE".to_owned()))?;

	let dn_root = root_dse.require_first("defaultNamingContext")?.to_owned();
	let dn_forest = root_dse.attr_first("rootDomainNamingContext").unwrap_or(&dn_root).to_owned();
	let dn_schema = root_dse.require_first("schemaNamingContext")?.to_owned();
	let dn_configuration = root_dse.require_first("configurationNamingContext")?.to_owned();
	Ok([dn_root, dn_forest, dn_schema, dn_configuration])
}
