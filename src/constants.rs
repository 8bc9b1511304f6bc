//! Static tables describing Active Directory schema details.
//!
//! Flag values follow the [User-Account-Control] and [Group-Type] attribute
//! documentation.
//!
//! [User-Account-Control]: https://learn.microsoft.com/en-us/windows/win32/adschema/a-useraccountcontrol
//! [Group-Type]: https://learn.microsoft.com/en-us/windows/win32/adschema/a-grouptype
use bitflags::bitflags;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::object::ObjectKind;

/// The Unix epoch (1970-01-01) expressed as a Windows filetime, i.e. the
/// number of 100ns intervals since 1601-01-01.
pub const EPOCH_AS_FILETIME: i64 = 116_444_736_000_000_000;

/// Number of filetime ticks in one second.
pub const FILETIME_TICKS_PER_SECOND: i64 = 10_000_000;

/// Page size requested through the [simple paged results control].
///
/// [simple paged results control]: https://www.rfc-editor.org/rfc/rfc2696.html
pub const PAGE_SIZE: i32 = 500;

bitflags! {
	/// Flags of the `userAccountControl` and
	/// `msDS-User-Account-Control-Computed` attributes.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct UserAccountControl: u32 {
		/// The logon script is executed.
		const SCRIPT = 0x0000_0001;
		/// The account is disabled.
		const ACCOUNTDISABLE = 0x0000_0002;
		/// A home directory is required.
		const HOMEDIR_REQUIRED = 0x0000_0008;
		/// The account is locked out.
		const LOCKOUT = 0x0000_0010;
		/// No password is required.
		const PASSWD_NOTREQD = 0x0000_0020;
		/// The user cannot change the password.
		const PASSWD_CANT_CHANGE = 0x0000_0040;
		/// The user can send an encrypted password.
		const ENCRYPTED_TEXT_PASSWORD_ALLOWED = 0x0000_0080;
		/// Local account for a user whose primary account is in another domain.
		const TEMP_DUPLICATE_ACCOUNT = 0x0000_0100;
		/// Default account type of a typical user.
		const NORMAL_ACCOUNT = 0x0000_0200;
		/// Trust account for a domain that trusts other domains.
		const INTERDOMAIN_TRUST_ACCOUNT = 0x0000_0800;
		/// Computer account of a domain member.
		const WORKSTATION_TRUST_ACCOUNT = 0x0000_1000;
		/// Computer account of a domain controller.
		const SERVER_TRUST_ACCOUNT = 0x0000_2000;
		/// The password never expires.
		const DONT_EXPIRE_PASSWD = 0x0001_0000;
		/// MNS logon account.
		const MNS_LOGON_ACCOUNT = 0x0002_0000;
		/// Interactive logon requires a smart card.
		const SMARTCARD_REQUIRED = 0x0004_0000;
		/// Trusted for Kerberos delegation.
		const TRUSTED_FOR_DELEGATION = 0x0008_0000;
		/// The security context is never delegated.
		const NOT_DELEGATED = 0x0010_0000;
		/// Only DES encryption types are used for keys.
		const USE_DES_KEY_ONLY = 0x0020_0000;
		/// Kerberos pre-authentication is not required.
		const DONT_REQUIRE_PREAUTH = 0x0040_0000;
		/// The password has expired.
		const PASSWORD_EXPIRED = 0x0080_0000;
		/// Enabled for protocol transition delegation.
		const TRUSTED_TO_AUTHENTICATE_FOR_DELEGATION = 0x0100_0000;
	}
}

bitflags! {
	/// Flags of the `groupType` attribute.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct GroupType: u32 {
		/// Group created by the system.
		const BUILTIN_LOCAL = 0x0000_0001;
		/// Global scope.
		const GLOBAL = 0x0000_0002;
		/// Domain local scope.
		const DOMAIN_LOCAL = 0x0000_0004;
		/// Universal scope.
		const UNIVERSAL = 0x0000_0008;
		/// APP_BASIC group for Windows Server Authorization Manager.
		const APP_BASIC = 0x0000_0010;
		/// APP_QUERY group for Windows Server Authorization Manager.
		const APP_QUERY = 0x0000_0020;
		/// Security group; distribution group when unset.
		const SECURITY = 0x8000_0000;
	}
}

/// Properties every directory object is expected to carry.
pub const MANDATORY_PROPS_DEFAULT: &[&str] = &[
	"distinguishedName",
	"objectClass",
	"objectCategory",
	"name",
	"description",
	"createTimeStamp",
	"modifyTimeStamp",
];

/// Properties of user objects.
pub const MANDATORY_PROPS_USER: &[&str] = &[
	"distinguishedName",
	"objectClass",
	"objectCategory",
	"name",
	"description",
	"createTimeStamp",
	"modifyTimeStamp",
	"sAMAccountName",
	"userAccountControl",
	"memberOf",
];

/// Properties of computer objects.
pub const MANDATORY_PROPS_COMPUTER: &[&str] = &[
	"distinguishedName",
	"objectClass",
	"objectCategory",
	"name",
	"description",
	"createTimeStamp",
	"modifyTimeStamp",
	"sAMAccountName",
	"userAccountControl",
	"memberOf",
	"dNSHostName",
	"servicePrincipalName",
	"operatingSystem",
	"operatingSystemServicePack",
	"operatingSystemVersion",
];

/// Properties of group objects.
pub const MANDATORY_PROPS_GROUP: &[&str] = &[
	"distinguishedName",
	"objectClass",
	"objectCategory",
	"name",
	"description",
	"createTimeStamp",
	"modifyTimeStamp",
	"sAMAccountName",
	"groupType",
	"member",
];

/// Properties the server maintains itself and which cannot be supplied when
/// creating an object.
pub const SERVER_MANAGED_PROPS: &[&str] =
	&["distinguishedName", "createTimeStamp", "modifyTimeStamp", "memberOf"];

/// Constructed attribute holding the computed account control flags.
pub const PROP_UAC_COMPUTED: &str = "msDS-User-Account-Control-Computed";

/// `objectCategory` prefixes; append the configuration naming context.
pub const CAT_USER: &str = "CN=Person,CN=Schema,";
/// Category prefix of computers.
pub const CAT_COMPUTER: &str = "CN=Computer,CN=Schema,";
/// Category prefix of groups.
pub const CAT_GROUP: &str = "CN=Group,CN=Schema,";
/// Category prefix of CN containers.
pub const CAT_CN: &str = "CN=Container,CN=Schema,";
/// Category prefix of organizational units.
pub const CAT_OU: &str = "CN=Organizational-Unit,CN=Schema,";
/// Category prefix of domain objects.
pub const CAT_DOMAIN: &str = "CN=Domain-DNS,CN=Schema,";

/// `objectClass` chain of users.
pub const CLASS_USER: &[&str] = &["top", "person", "organizationalPerson", "user"];
/// `objectClass` chain of computers.
pub const CLASS_COMPUTER: &[&str] = &["top", "person", "organizationalPerson", "user", "computer"];
/// `objectClass` chain of groups.
pub const CLASS_GROUP: &[&str] = &["top", "group"];
/// `objectClass` chain of CN containers.
pub const CLASS_CN: &[&str] = &["top", "container"];
/// `objectClass` chain of organizational units.
pub const CLASS_OU: &[&str] = &["top", "organizationalUnit"];

/// Leading host label of a host name, FQDN or computer account name.
#[allow(clippy::unwrap_used)]
pub static RE_HOSTNAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+\$?").unwrap());

/// Value of a leading `CN=` RDN.
#[allow(clippy::unwrap_used)]
pub static RE_CN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^CN=((?:\\.|[^,\\])+)").unwrap());

/// Value of a leading `OU=` RDN.
#[allow(clippy::unwrap_used)]
pub static RE_OU: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^OU=((?:\\.|[^,\\])+)").unwrap());

/// Per-class row of the class table.
#[derive(Debug)]
pub struct ClassInfo {
	/// Display label
	pub label: &'static str,
	/// The class whose accessors this one inherits
	pub parent: Option<ObjectKind>,
	/// Properties that must be present before writing
	pub mandatory: &'static [&'static str],
	/// `objectCategory` prefixes identifying the class
	pub categories: &'static [&'static str],
	/// `objectClass` chain for newly created objects
	pub object_classes: &'static [&'static str],
	/// Attributes to request in addition to `*`, as they are not returned
	/// by default.
	pub extra_attributes: &'static [&'static str],
}

/// Class table indexed by [`ObjectKind`].
pub(crate) static CLASSES: [ClassInfo; 5] = [
	ClassInfo {
		label: "ADObject",
		parent: None,
		mandatory: MANDATORY_PROPS_DEFAULT,
		categories: &[],
		object_classes: &[],
		extra_attributes: &["createTimeStamp", "modifyTimeStamp"],
	},
	ClassInfo {
		label: "User",
		parent: Some(ObjectKind::Object),
		mandatory: MANDATORY_PROPS_USER,
		categories: &[CAT_USER],
		object_classes: CLASS_USER,
		extra_attributes: &["createTimeStamp", "modifyTimeStamp", PROP_UAC_COMPUTED],
	},
	ClassInfo {
		label: "Computer",
		parent: Some(ObjectKind::User),
		mandatory: MANDATORY_PROPS_COMPUTER,
		categories: &[CAT_COMPUTER],
		object_classes: CLASS_COMPUTER,
		extra_attributes: &["createTimeStamp", "modifyTimeStamp", PROP_UAC_COMPUTED],
	},
	ClassInfo {
		label: "Group",
		parent: Some(ObjectKind::Object),
		mandatory: MANDATORY_PROPS_GROUP,
		categories: &[CAT_GROUP],
		object_classes: CLASS_GROUP,
		extra_attributes: &["createTimeStamp", "modifyTimeStamp"],
	},
	ClassInfo {
		label: "Container",
		parent: Some(ObjectKind::Object),
		mandatory: MANDATORY_PROPS_DEFAULT,
		categories: &[CAT_CN, CAT_DOMAIN, CAT_OU],
		object_classes: CLASS_CN,
		extra_attributes: &["createTimeStamp", "modifyTimeStamp"],
	},
];
