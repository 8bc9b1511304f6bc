//! The LDAP operations a [`Domain`](crate::Domain) needs, and their
//! implementation on top of `ldap3`.
use std::{collections::HashSet, time::Duration};

use ldap3::{
	adapters::{Adapter, EntriesOnly, PagedResults},
	LdapConnAsync, LdapResult, Mod, Scope, SearchEntry,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{config::Config, error::Error};

/// Attribute values for adding an entry.
pub type AddAttributes = Vec<(String, HashSet<String>)>;

/// A bound session to a directory server.
///
/// Implemented by [`LdapDirectory`]; other implementations let a
/// [`Domain`](crate::Domain) run against an in-memory directory.
#[allow(async_fn_in_trait)]
pub trait Directory {
	/// Search below `base`, returning all entries (referrals are dropped).
	async fn search(
		&mut self,
		base: &str,
		scope: Scope,
		filter: &str,
		attrs: &[String],
	) -> Result<Vec<SearchEntry>, Error>;

	/// Add a new entry.
	async fn add(&mut self, dn: &str, attrs: AddAttributes) -> Result<(), Error>;

	/// Modify the attributes of an entry.
	async fn modify(&mut self, dn: &str, mods: Vec<Mod<String>>) -> Result<(), Error>;

	/// Rename an entry, optionally moving it below `new_superior`.
	async fn rename(
		&mut self,
		dn: &str,
		rdn: &str,
		new_superior: Option<&str>,
	) -> Result<(), Error>;

	/// Delete an entry.
	async fn delete(&mut self, dn: &str) -> Result<(), Error>;

	/// End the session.
	async fn unbind(&mut self) -> Result<(), Error>;
}

/// A [`Directory`] backed by an `ldap3` connection.
#[derive(Debug)]
pub struct LdapDirectory {
	/// The operation handle
	ldap: ldap3::Ldap,
	/// Background task driving the connection
	driver: Option<JoinHandle<()>>,
	/// Timeout applied to every operation
	operation_timeout: Duration,
	/// Page size for searches
	page_size: i32,
}

impl LdapDirectory {
	/// Connect and bind to the server described by `config`.
	pub async fn connect(config: &Config) -> Result<Self, Error> {
		let settings = config.connection.to_settings().await?;
		let (conn, mut ldap) = LdapConnAsync::from_url_with_settings(settings, &config.url)
			.await
			.map_err(|err| Error::ConnectionFailed(err.to_string()))?;
		let driver = tokio::spawn(async move {
			if let Err(err) = conn.drive().await {
				warn!("Ldap connection error {err}");
			}
		});

		ldap.with_timeout(config.connection.operation_timeout);
		let result = ldap.simple_bind(&config.bind_user, &config.bind_password).await;
		let mut directory = Self {
			ldap,
			driver: Some(driver),
			operation_timeout: config.connection.operation_timeout,
			page_size: config.page_size,
		};
		if let Err(err) = result.and_then(LdapResult::success).map_err(Error::from) {
			if let Err(unbind_err) = directory.unbind().await {
				debug!("Unbinding after failed bind: {unbind_err}");
			}
			return Err(err);
		}
		debug!("Bound to {} as {}", config.url, config.bind_user);
		Ok(directory)
	}

	/// The operation handle, with the configured timeout armed for the next
	/// operation.
	fn ldap(&mut self) -> &mut ldap3::Ldap {
		self.ldap.with_timeout(self.operation_timeout)
	}
}

impl Directory for LdapDirectory {
	async fn search(
		&mut self,
		base: &str,
		scope: Scope,
		filter: &str,
		attrs: &[String],
	) -> Result<Vec<SearchEntry>, Error> {
		let adapters: Vec<Box<dyn Adapter<_, _>>> =
			vec![Box::new(EntriesOnly::new()), Box::new(PagedResults::new(self.page_size))];
		let mut search = self
			.ldap()
			.streaming_search_with(adapters, base, scope, filter, attrs.to_vec())
			.await?;

		let mut entries = Vec::new();
		while let Some(entry) = search.next().await? {
			entries.push(SearchEntry::construct(entry));
		}
		search.finish().await.success()?;
		Ok(entries)
	}

	async fn add(&mut self, dn: &str, attrs: AddAttributes) -> Result<(), Error> {
		self.ldap().add(dn, attrs).await?.success()?;
		Ok(())
	}

	async fn modify(&mut self, dn: &str, mods: Vec<Mod<String>>) -> Result<(), Error> {
		self.ldap().modify(dn, mods).await?.success()?;
		Ok(())
	}

	async fn rename(
		&mut self,
		dn: &str,
		rdn: &str,
		new_superior: Option<&str>,
	) -> Result<(), Error> {
		self.ldap().modifydn(dn, rdn, true, new_superior).await?.success()?;
		Ok(())
	}

	async fn delete(&mut self, dn: &str) -> Result<(), Error> {
		self.ldap().delete(dn).await?.success()?;
		Ok(())
	}

	async fn unbind(&mut self) -> Result<(), Error> {
		let result = self.ldap.unbind().await;
		if let Some(driver) = self.driver.take() {
			if let Err(err) = driver.await {
				warn!("Failed to join background task: {err}");
			}
		}
		Ok(result?)
	}
}
