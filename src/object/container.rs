//! Listing the contents of containers.
use ldap3::Scope;

use super::{ADObject, ObjectKind};
use crate::{
	directory::Directory,
	domain::{Domain, SearchOptions},
	error::Error,
};

impl ADObject {
	/// Objects inside the container, each with its class guessed. Only
	/// direct children unless `recursive` is set.
	pub async fn children<D: Directory>(
		&self,
		domain: &mut Domain<D>,
		recursive: bool,
	) -> Result<Vec<ADObject>, Error> {
		self.expect_kind(ObjectKind::Container)?;
		let options = SearchOptions::new()
			.base(self.distinguished_name())
			.scope(if recursive { Scope::Subtree } else { Scope::OneLevel })
			.properties(vec!["distinguishedName".to_owned()]);
		let mut children = Vec::new();
		for object in domain.search("objectClass=*", options).await? {
			children.push(domain.guess_object_type(object).await?);
		}
		Ok(children)
	}
}
