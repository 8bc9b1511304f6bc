//! Helper methods for extracting data from search results.
use ldap3::SearchEntry;

use crate::error::Error;

/// An extension trait for [`SearchEntry`] that provides convenience methods for
/// extracting data.
pub trait SearchEntryExt {
	/// Get the first value of an attribute. Will return `None` if attribute
	/// value is not valid UTF-8.
	fn attr_first(&self, attr: &str) -> Option<&str>;

	/// Get the first value of an attribute, failing with
	/// [`Error::PropertyNotFound`] if it is absent.
	fn require_first(&self, attr: &str) -> Result<&str, Error> {
		self.attr_first(attr).ok_or_else(|| Error::PropertyNotFound(attr.to_owned()))
	}
}

impl SearchEntryExt for SearchEntry {
	fn attr_first(&self, attr: &str) -> Option<&str> {
		let values = match self.attrs.get(attr) {
			Some(values) => values,
			None => {
				self.attrs.iter().find(|(name, _)| name.eq_ignore_ascii_case(attr))?.1
			}
		};
		values.first().map(String::as_str)
	}
}
