//! Helpers for working with distinguished names.

/// Split a distinguished name into its RDNs, honouring backslash escapes.
///
/// ```
/// assert_eq!(
/// 	ad_ldap::dn::split_rdns(r"CN=Doe\, John,DC=example,DC=com"),
/// 	[r"CN=Doe\, John", "DC=example", "DC=com"]
/// );
/// ```
#[must_use]
pub fn split_rdns(dn: &str) -> Vec<&str> {
	let mut rdns = Vec::new();
	let mut start = 0;
	let mut escaped = false;
	for (i, c) in dn.char_indices() {
		match c {
			_ if escaped => escaped = false,
			'\\' => escaped = true,
			',' => {
				rdns.push(dn[start..i].trim());
				start = i + 1;
			}
			_ => {}
		}
	}
	let last = dn[start..].trim();
	if !last.is_empty() || !rdns.is_empty() {
		rdns.push(last);
	}
	rdns
}

/// Split an RDN into its attribute type and value.
#[must_use]
pub fn split_rdn(rdn: &str) -> Option<(&str, &str)> {
	rdn.split_once('=').map(|(attr, value)| (attr.trim(), value.trim()))
}

/// Whether an RDN has the given attribute type, ignoring case.
fn is_type(rdn: &str, attr: &str) -> bool {
	split_rdn(rdn).is_some_and(|(rdn_attr, _)| rdn_attr.eq_ignore_ascii_case(attr))
}

/// Construct a DNS domain name from the `DC=` components of a distinguished
/// name.
///
/// ```
/// assert_eq!(ad_ldap::dn::dns_name("CN=x,OU=y,DC=example,DC=com"), "example.com");
/// ```
#[must_use]
pub fn dns_name(dn: &str) -> String {
	split_rdns(dn)
		.into_iter()
		.filter(|rdn| is_type(rdn, "dc"))
		.filter_map(|rdn| split_rdn(rdn).map(|(_, value)| value))
		.collect::<Vec<_>>()
		.join(".")
}

/// Construct the canonical name of an object, e.g. `example.com\Users\jdoe`
/// for `CN=jdoe,OU=Users,DC=example,DC=com`.
#[must_use]
pub fn canonical_name(dn: &str) -> String {
	let mut tail = split_rdns(dn)
		.into_iter()
		.filter(|rdn| !is_type(rdn, "dc"))
		.filter_map(|rdn| split_rdn(rdn).map(|(_, value)| value))
		.collect::<Vec<_>>();
	tail.reverse();
	format!("{}\\{}", dns_name(dn), tail.join("\\"))
}
