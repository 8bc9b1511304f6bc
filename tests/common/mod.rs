use std::{
	collections::{HashMap, VecDeque},
	sync::{Arc, Mutex},
};

use ad_ldap::{
	directory::{AddAttributes, Directory},
	Domain, Error, Mod, Scope, SearchEntry,
};

pub const DN_ROOT: &str = "DC=example,DC=com";
pub const DN_CONFIGURATION: &str = "CN=Configuration,DC=example,DC=com";

/// A search as received by the directory.
#[derive(Debug, Clone)]
pub struct Search {
	pub base: String,
	pub scope: Scope,
	pub filter: String,
	pub attrs: Vec<String>,
}

/// Everything the domain asked the directory to do.
#[derive(Debug, Default)]
pub struct Recorded {
	pub searches: Vec<Search>,
	pub adds: Vec<(String, AddAttributes)>,
	pub modifies: Vec<(String, Vec<Mod<String>>)>,
	pub renames: Vec<(String, String, Option<String>)>,
	pub deletes: Vec<String>,
	pub unbinds: usize,
}

/// An in-memory directory answering searches from a queue of canned results.
/// Clones share the queue and the record.
#[derive(Debug, Clone, Default)]
pub struct MockDirectory {
	responses: Arc<Mutex<VecDeque<Vec<SearchEntry>>>>,
	recorded: Arc<Mutex<Recorded>>,
}

impl MockDirectory {
	/// Queue the result of the next search. Searches without a queued result
	/// find nothing.
	pub fn respond(&self, entries: Vec<SearchEntry>) {
		self.responses.lock().unwrap().push_back(entries);
	}

	pub fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
		self.recorded.lock().unwrap()
	}

	pub fn last_search(&self) -> Search {
		self.recorded().searches.last().cloned().expect("no search was made")
	}
}

impl Directory for MockDirectory {
	async fn search(
		&mut self,
		base: &str,
		scope: Scope,
		filter: &str,
		attrs: &[String],
	) -> Result<Vec<SearchEntry>, Error> {
		self.recorded().searches.push(Search {
			base: base.to_owned(),
			scope,
			filter: filter.to_owned(),
			attrs: attrs.to_vec(),
		});
		Ok(self.responses.lock().unwrap().pop_front().unwrap_or_default())
	}

	async fn add(&mut self, dn: &str, attrs: AddAttributes) -> Result<(), Error> {
		self.recorded().adds.push((dn.to_owned(), attrs));
		Ok(())
	}

	async fn modify(&mut self, dn: &str, mods: Vec<Mod<String>>) -> Result<(), Error> {
		self.recorded().modifies.push((dn.to_owned(), mods));
		Ok(())
	}

	async fn rename(
		&mut self,
		dn: &str,
		rdn: &str,
		new_superior: Option<&str>,
	) -> Result<(), Error> {
		let rename = (dn.to_owned(), rdn.to_owned(), new_superior.map(str::to_owned));
		self.recorded().renames.push(rename);
		Ok(())
	}

	async fn delete(&mut self, dn: &str) -> Result<(), Error> {
		self.recorded().deletes.push(dn.to_owned());
		Ok(())
	}

	async fn unbind(&mut self) -> Result<(), Error> {
		self.recorded().unbinds += 1;
		Ok(())
	}
}

/// Build a search entry from literal attribute values.
pub fn entry(dn: &str, attrs: &[(&str, &[&str])]) -> SearchEntry {
	SearchEntry {
		dn: dn.to_owned(),
		attrs: attrs
			.iter()
			.map(|(name, values)| {
				((*name).to_owned(), values.iter().map(|value| (*value).to_owned()).collect())
			})
			.collect(),
		bin_attrs: HashMap::new(),
	}
}

pub fn root_dse() -> SearchEntry {
	entry(
		"",
		&[
			("defaultNamingContext", &[DN_ROOT]),
			("rootDomainNamingContext", &["DC=corp,DC=com"]),
			("schemaNamingContext", &["CN=Schema,CN=Configuration,DC=example,DC=com"]),
			("configurationNamingContext", &[DN_CONFIGURATION]),
		],
	)
}

/// A domain attached to a fresh mock directory, with the root DSE search
/// already consumed and cleared from the record.
pub async fn connected() -> (Domain<MockDirectory>, MockDirectory) {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();

	let directory = MockDirectory::default();
	directory.respond(vec![root_dse()]);
	let mut domain = Domain::new();
	domain.attach(directory.clone()).await.unwrap();
	directory.recorded().searches.clear();
	(domain, directory)
}
