#![allow(
	clippy::expect_used,
	clippy::missing_docs_in_private_items,
	clippy::unwrap_used,
	clippy::bool_assert_comparison
)]
use std::error::Error as _;

use ad_ldap::{
	ADObject, Config, Domain, Error, Mod, ObjectKind, Properties, Scope, SearchEntry,
	SearchOptions,
};

mod common;

use common::{connected, entry, root_dse, MockDirectory, DN_CONFIGURATION, DN_ROOT};

const ALICE: &str = "CN=Alice,OU=Staff,DC=example,DC=com";
const BOB: &str = "CN=Bob,OU=Staff,DC=example,DC=com";
const CAROL: &str = "CN=Carol,OU=Staff,DC=example,DC=com";
const STAFF: &str = "CN=Staff,OU=Groups,DC=example,DC=com";

fn user_entry(dn: &str, uac: &str, computed: &str) -> SearchEntry {
	entry(
		dn,
		&[
			("sAMAccountName", &["alice"]),
			("objectCategory", &["CN=Person,CN=Schema,CN=Configuration,DC=example,DC=com"]),
			("userAccountControl", &[uac]),
			("msDS-User-Account-Control-Computed", &[computed]),
			("description", &["Accounting"]),
		],
	)
}

fn group_entry(members: &[&str]) -> SearchEntry {
	entry(
		STAFF,
		&[
			("sAMAccountName", &["Staff"]),
			("objectCategory", &["CN=Group,CN=Schema,CN=Configuration,DC=example,DC=com"]),
			("groupType", &["-2147483646"]),
			("member", members),
		],
	)
}

#[tokio::test]
async fn attach_reads_root_dse() {
	let directory = MockDirectory::default();
	directory.respond(vec![root_dse()]);
	let mut domain: Domain<MockDirectory> = Domain::new();
	assert_eq!(domain.to_string(), "Domain: Not Connected");

	domain.attach(directory.clone()).await.unwrap();
	assert!(domain.is_connected());
	assert_eq!(domain.dn_root(), DN_ROOT);
	assert_eq!(domain.dn_forest(), "DC=corp,DC=com");
	assert_eq!(domain.dn_schema(), "CN=Schema,CN=Configuration,DC=example,DC=com");
	assert_eq!(domain.dn_configuration(), DN_CONFIGURATION);
	assert_eq!(domain.dns_name(), "example.com");
	assert_eq!(domain.to_string(), "Domain: DC=example,DC=com");

	let search = directory.last_search();
	assert_eq!(search.base, "");
	assert_eq!(search.scope, Scope::Base);
	assert_eq!(search.filter, "(objectClass=*)");
}

#[tokio::test]
async fn attach_fails_without_root_dse() {
	let directory = MockDirectory::default();
	let mut domain = Domain::new();
	assert!(matches!(domain.attach(directory.clone()).await, Err(Error::ObjectNotFound(_))));
	assert!(!domain.is_connected());
	assert_eq!(directory.recorded().unbinds, 1);
}

#[tokio::test]
async fn not_connected() {
	let mut domain: Domain<MockDirectory> = Domain::new();
	assert!(matches!(
		domain.search("(objectClass=*)", SearchOptions::new()).await,
		Err(Error::DomainNotConnected)
	));
	assert!(matches!(domain.get_user_by_name("alice").await, Err(Error::DomainNotConnected)));
	assert!(matches!(domain.delete_object(ALICE).await, Err(Error::DomainNotConnected)));
	domain.disconnect().await.unwrap();
}

#[tokio::test]
async fn disconnect_twice() {
	let (mut domain, directory) = connected().await;
	domain.disconnect().await.unwrap();
	domain.disconnect().await.unwrap();
	assert_eq!(directory.recorded().unbinds, 1);
	assert_eq!(domain.to_string(), "Domain: Not Connected");
	assert!(matches!(domain.get_object_by_dn(ALICE).await, Err(Error::DomainNotConnected)));
}

#[tokio::test]
async fn search_defaults() {
	let (mut domain, directory) = connected().await;
	directory.respond(vec![entry(ALICE, &[("name", &["Alice"])])]);

	let objects = domain.search("objectClass=user", SearchOptions::new()).await.unwrap();
	let search = directory.last_search();
	assert_eq!(search.base, DN_ROOT);
	assert_eq!(search.scope, Scope::Subtree);
	assert_eq!(search.filter, "(objectClass=user)");
	assert!(search.attrs.contains(&"*".to_owned()));

	assert_eq!(objects.len(), 1);
	let object = &objects[0];
	assert_eq!(object.kind(), ObjectKind::Object);
	assert_eq!(object.distinguished_name(), ALICE);
	assert_eq!(object.name().unwrap(), "Alice");
	assert_eq!(object.description().unwrap(), "");
	assert!(object.object_class().unwrap().is_empty());
}

#[tokio::test]
async fn lookups_escape_values() {
	let (mut domain, directory) = connected().await;
	assert!(domain.get_user_by_name("j*doe(x)").await.unwrap().is_none());
	assert_eq!(directory.last_search().filter, r"(sAMAccountName=j\2adoe\28x\29)");

	domain.get_object_by_dn(r"CN=a\5c*,DC=example,DC=com").await.unwrap();
	assert_eq!(
		directory.last_search().filter,
		r"(distinguishedName=CN=a\5c5c\2a,DC=example,DC=com)"
	);
}

#[tokio::test]
async fn computer_names_are_normalized() {
	let (mut domain, directory) = connected().await;
	for (name, account) in [("ws01.example.com", "ws01$"), ("WS01", "WS01$"), ("WS01$", "WS01$")] {
		domain.get_computer_by_name(name).await.unwrap();
		assert_eq!(directory.last_search().filter, format!("(sAMAccountName={account})"));
	}
	let searches = directory.recorded().searches.len();
	assert!(domain.get_computer_by_name(".example.com").await.unwrap().is_none());
	assert_eq!(directory.recorded().searches.len(), searches);
}

#[tokio::test]
async fn connect_reports_unreachable_server() {
	let mut config = Config::for_host("127.0.0.1:1", "EXAMPLE\\admin", "secret").unwrap();
	config.connection.timeout = 5;
	let mut domain: Domain = Domain::new();
	assert!(matches!(domain.connect(&config).await, Err(Error::ConnectionFailed(_))));
	assert!(!domain.is_connected());
}

#[tokio::test]
async fn guessing_keeps_object_when_lookup_finds_nothing() {
	let (mut domain, directory) = connected().await;
	directory.respond(vec![user_entry(ALICE, "512", "0")]);
	let object = domain.get_object_by_dn(ALICE).await.unwrap().unwrap();
	assert_eq!(object.kind(), ObjectKind::Object);

	let guessed = domain.guess_object_type(object.clone()).await.unwrap();
	assert_eq!(guessed, object);
	assert_eq!(guessed.kind(), ObjectKind::Object);
	let search = directory.last_search();
	assert!(search.filter.contains("(objectCategory=CN=Person,CN=Schema,"), "{}", search.filter);
}

#[tokio::test]
async fn lookups_by_dn_match_category() {
	let (mut domain, directory) = connected().await;
	directory.respond(vec![user_entry(ALICE, "512", "0")]);
	let user = domain.get_user_by_dn(ALICE).await.unwrap().unwrap();
	assert_eq!(user.kind(), ObjectKind::User);
	assert_eq!(
		directory.last_search().filter,
		format!(
			"(&(distinguishedName={ALICE})(objectCategory=CN=Person,CN=Schema,{DN_CONFIGURATION}))"
		)
	);

	domain.get_container_by_dn("OU=Staff,DC=example,DC=com").await.unwrap();
	let filter = directory.last_search().filter;
	assert!(filter.starts_with("(&(distinguishedName=OU=Staff,DC=example,DC=com)(|"));
	for category in ["Container", "Domain-DNS", "Organizational-Unit"] {
		let category = format!("(objectCategory=CN={category},CN=Schema,{DN_CONFIGURATION})");
		assert!(filter.contains(&category));
	}
}

#[tokio::test]
async fn set_properties_writes_changes() {
	let (mut domain, directory) = connected().await;
	directory.respond(vec![user_entry(ALICE, "512", "0")]);
	let mut user = domain.get_user_by_name("alice").await.unwrap().unwrap();

	user.set_property("description", vec!["Finance".to_owned()]).unwrap();
	assert!(user.set_properties(&mut domain).await.unwrap());
	{
		let recorded = directory.recorded();
		assert_eq!(recorded.modifies.len(), 1);
		let (dn, mods) = &recorded.modifies[0];
		assert_eq!(dn, ALICE);
		assert_eq!(mods.len(), 1);
		assert!(matches!(&mods[0], Mod::Replace(name, values)
			if name == "description" && values.contains("Finance")));
	}

	assert!(!user.set_properties(&mut domain).await.unwrap());
	assert_eq!(directory.recorded().modifies.len(), 1);
}

#[tokio::test]
async fn set_properties_keeps_distinguished_name() {
	let (mut domain, directory) = connected().await;
	directory.respond(vec![user_entry(ALICE, "512", "0")]);
	let mut user = domain.get_user_by_name("alice").await.unwrap().unwrap();

	let other = vec!["CN=Other,OU=Staff,DC=example,DC=com".to_owned()];
	for name in ["distinguishedName", "DISTINGUISHEDNAME"] {
		assert!(matches!(user.set_property(name, other.clone()), Err(Error::Invalid(_))));
	}
	assert!(matches!(user.remove_property("distinguishedname"), Err(Error::Invalid(_))));
	assert_eq!(user.distinguished_name(), ALICE);

	user.set_property("description", vec!["Finance".to_owned()]).unwrap();
	assert!(user.set_properties(&mut domain).await.unwrap());
	let recorded = directory.recorded();
	assert_eq!(recorded.modifies.len(), 1);
	let (dn, mods) = &recorded.modifies[0];
	assert_eq!(dn, ALICE);
	assert!(matches!(&mods[..], [Mod::Replace(name, _)] if name == "description"));
}

#[tokio::test]
async fn refresh_overwrites_local_values() {
	let (mut domain, directory) = connected().await;
	directory.respond(vec![user_entry(ALICE, "512", "0")]);
	let mut user = domain.get_user_by_name("alice").await.unwrap().unwrap();
	user.set_property("description", vec!["Local".to_owned()]).unwrap();

	directory.respond(vec![entry(
		ALICE,
		&[
			("sAMAccountName", &["alice"]),
			("description", &["Finance"]),
			("userAccountControl", &["514"]),
		],
	)]);
	user.refresh(&mut domain).await.unwrap();
	assert_eq!(user.description().unwrap(), "Finance");
	assert!(user.disabled().unwrap());
	assert_eq!(user.distinguished_name(), ALICE);
	assert!(user.changes().is_empty());

	let search = directory.last_search();
	assert_eq!(search.base, ALICE);
	assert_eq!(search.scope, Scope::Base);
	assert!(search.attrs.iter().any(|attr| attr == "description"));
	assert!(!search.attrs.iter().any(|attr| attr == "distinguishedName"));
}

#[tokio::test]
async fn set_properties_requires_mandatory_properties() {
	let (mut domain, directory) = connected().await;
	directory.respond(vec![user_entry(ALICE, "512", "0")]);
	let mut user = domain.get_user_by_name("alice").await.unwrap().unwrap();

	user.remove_property("sAMAccountName").unwrap();
	user.set_property("description", vec!["Finance".to_owned()]).unwrap();
	let err = user.set_properties(&mut domain).await.unwrap_err();
	assert!(matches!(&err, Error::MandatoryPropertyMissing { kind: ObjectKind::User, property }
		if property == "sAMAccountName"));
	assert!(err.source().is_none());
	assert!(directory.recorded().modifies.is_empty());
}

#[tokio::test]
async fn enable_and_disable() {
	let (mut domain, directory) = connected().await;
	directory.respond(vec![user_entry(ALICE, "514", "0")]);
	let mut user = domain.get_user_by_name("alice").await.unwrap().unwrap();
	assert!(user.disabled().unwrap());

	assert!(matches!(user.disable(&mut domain).await, Err(Error::UserNotEnabled)));
	user.enable(&mut domain).await.unwrap();
	assert_eq!(user.disabled().unwrap(), false);
	assert!(matches!(user.enable(&mut domain).await, Err(Error::UserNotDisabled)));

	user.disable(&mut domain).await.unwrap();
	assert!(user.disabled().unwrap());

	let recorded = directory.recorded();
	let values: Vec<_> = recorded
		.modifies
		.iter()
		.map(|(_, mods)| match &mods[..] {
			[Mod::Replace(name, values)] if name == "userAccountControl" => {
				values.iter().next().cloned().unwrap()
			}
			other => panic!("unexpected modifications {other:?}"),
		})
		.collect();
	assert_eq!(values, ["512", "514"]);
}

#[tokio::test]
async fn unlock() {
	let (mut domain, directory) = connected().await;
	directory.respond(vec![user_entry(ALICE, "512", "16")]);
	let mut user = domain.get_user_by_name("alice").await.unwrap().unwrap();
	assert!(user.locked_out().unwrap());

	directory.respond(vec![entry(ALICE, &[("msDS-User-Account-Control-Computed", &["0"])])]);
	assert!(user.unlock(&mut domain).await.unwrap());
	assert!(!user.locked_out().unwrap());

	let search = directory.last_search();
	assert_eq!(search.base, ALICE);
	assert_eq!(search.scope, Scope::Base);
	let recorded = directory.recorded();
	assert!(matches!(&recorded.modifies[0].1[..], [Mod::Replace(name, values)]
		if name == "lockoutTime" && values.contains("0")));
	drop(recorded);

	assert!(matches!(user.unlock(&mut domain).await, Err(Error::UserNotLockedOut)));
}

#[tokio::test]
async fn group_membership() {
	let (mut domain, directory) = connected().await;
	directory.respond(vec![group_entry(&[ALICE])]);
	let mut group = domain.get_group_by_name("Staff").await.unwrap().unwrap();
	assert_eq!(group.kind(), ObjectKind::Group);
	assert_eq!(group.group_type().unwrap(), -2_147_483_646);

	directory.respond(vec![entry(BOB, &[])]);
	assert!(group.add_members(&mut domain, &["bob"]).await.unwrap());
	assert_eq!(group.member_dns().unwrap(), [ALICE, BOB]);

	directory.respond(vec![entry(ALICE, &[])]);
	assert!(matches!(
		group.add_members(&mut domain, &["alice"]).await,
		Err(Error::GroupMemberExists(dn)) if dn == ALICE
	));

	directory.respond(vec![entry(CAROL, &[])]);
	directory.respond(vec![group_entry(&[ALICE, BOB])]);
	assert!(matches!(
		group.delete_members(&mut domain, &["carol"]).await,
		Err(Error::GroupMemberDoesNotExist(dn)) if dn == CAROL
	));

	directory.respond(vec![entry(BOB, &[])]);
	assert!(group.delete_members(&mut domain, &["bob", "nobody"]).await.unwrap());
	assert_eq!(group.member_dns().unwrap(), [ALICE]);

	assert!(matches!(
		group.overwrite_members(&mut domain, &["nobody"]).await,
		Err(Error::ObjectNotFound(name)) if name == "nobody"
	));
	directory.respond(vec![entry(ALICE, &[])]);
	assert!(!group.overwrite_members(&mut domain, &["alice"]).await.unwrap());

	let recorded = directory.recorded();
	assert_eq!(recorded.modifies.len(), 2);
	assert!(matches!(&recorded.modifies[1].1[..], [Mod::Replace(name, values)]
		if name == "member" && values.len() == 1 && values.contains(ALICE)));
}

#[tokio::test]
async fn group_members_are_guessed() {
	let (mut domain, directory) = connected().await;
	directory.respond(vec![group_entry(&[ALICE])]);
	let group = domain.get_group_by_name("Staff").await.unwrap().unwrap();

	directory.respond(vec![user_entry(ALICE, "512", "0")]);
	directory.respond(vec![user_entry(ALICE, "512", "0")]);
	let members = group.members(&mut domain).await.unwrap();
	assert_eq!(members.len(), 1);
	assert_eq!(members[0].kind(), ObjectKind::User);
	assert_eq!(members[0].to_string(), "User: Alice");
}

#[tokio::test]
async fn container_children() {
	let (mut domain, directory) = connected().await;
	let ou = "OU=Staff,DC=example,DC=com";
	let category = format!("CN=Organizational-Unit,CN=Schema,{DN_CONFIGURATION}");
	directory.respond(vec![entry(ou, &[("objectCategory", &[category.as_str()])])]);
	let container = domain.get_container_by_dn(ou).await.unwrap().unwrap();
	assert_eq!(container.to_string(), "Container: Staff");

	directory.respond(vec![
		user_entry(ALICE, "512", "0"),
		entry(
			"CN=Supplier,OU=Staff,DC=example,DC=com",
			&[("objectCategory", &["CN=Contact,CN=Schema,CN=Configuration,DC=example,DC=com"])],
		),
	]);
	directory.respond(vec![user_entry(ALICE, "512", "0")]);
	let children = container.children(&mut domain, false).await.unwrap();
	let kinds: Vec<_> = children.iter().map(ADObject::kind).collect();
	assert_eq!(kinds, [ObjectKind::User, ObjectKind::Object]);

	let searches = directory.recorded().searches.clone();
	let listing = &searches[searches.len() - 2];
	assert_eq!(listing.base, ou);
	assert_eq!(listing.scope, Scope::OneLevel);
	assert!(listing.attrs.contains(&"distinguishedName".to_owned()));
	assert!(listing.attrs.contains(&"objectCategory".to_owned()));

	assert!(matches!(
		children[0].children(&mut domain, true).await,
		Err(Error::WrongObjectClass { expected: ObjectKind::Container, actual: ObjectKind::User })
	));
}

#[tokio::test]
async fn new_user() {
	let (mut domain, directory) = connected().await;
	let mut properties = Properties::new();
	properties.insert("sAMAccountName".to_owned(), vec!["dave".to_owned()]);
	properties.insert("name".to_owned(), vec!["Dave".to_owned()]);
	properties.insert("description".to_owned(), Vec::new());
	properties.insert("objectclass".to_owned(), vec!["top".to_owned()]);
	let dn = "CN=Dave,OU=Staff,DC=example,DC=com";

	assert!(matches!(
		domain.new_user(dn, properties.clone()).await,
		Err(Error::InvalidPropertyFormat(message)) if message.contains("userAccountControl")
	));
	assert!(directory.recorded().adds.is_empty());

	properties.insert("userAccountControl".to_owned(), vec!["514".to_owned()]);
	domain.new_user(dn, properties).await.unwrap();
	let recorded = directory.recorded();
	let (added, attrs) = &recorded.adds[0];
	assert_eq!(added, dn);
	let values = |name: &str| attrs.iter().find(|(attr, _)| attr == name).map(|(_, v)| v.clone());
	assert!(values("description").is_none());
	assert!(values("objectclass").is_none());
	let classes = attrs.iter().filter(|(attr, _)| attr.eq_ignore_ascii_case("objectClass"));
	assert_eq!(classes.count(), 1);
	assert_eq!(values("objectClass").unwrap().len(), 4);
	assert!(values("objectCategory")
		.unwrap()
		.contains(&format!("CN=Person,CN=Schema,{DN_CONFIGURATION}")));
}

#[tokio::test]
async fn move_and_delete() {
	let (mut domain, directory) = connected().await;
	directory.respond(vec![user_entry(ALICE, "512", "0")]);
	let mut object = domain.get_object_by_dn(ALICE).await.unwrap().unwrap();

	object.move_to(&mut domain, "OU=Archive,DC=example,DC=com").await.unwrap();
	assert_eq!(object.distinguished_name(), "CN=Alice,OU=Archive,DC=example,DC=com");
	assert_eq!(object.canonical_name(), r"example.com\Archive\Alice");
	assert!(object.changes().is_empty());

	object.delete(&mut domain).await.unwrap();
	let recorded = directory.recorded();
	assert_eq!(
		recorded.renames,
		[(ALICE.to_owned(), "CN=Alice".to_owned(), Some("OU=Archive,DC=example,DC=com".to_owned()))]
	);
	assert_eq!(recorded.deletes, ["CN=Alice,OU=Archive,DC=example,DC=com"]);
}
