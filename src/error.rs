//! Error codes

use ldap3::{LdapError, LdapResult};

use crate::object::ObjectKind;

/// LDAP result code for an exceeded server-side time limit.
const RC_TIME_LIMIT_EXCEEDED: u32 = 3;
/// LDAP result code returned when a bind is rejected.
const RC_INVALID_CREDENTIALS: u32 = 49;

/// Errors that can occur when using this library
#[derive(thiserror::Error, Debug)]
pub enum Error {
	/// The object does not carry the requested property.
	#[error("Property not found: {0}")]
	PropertyNotFound(String),
	/// A property the object class requires is absent, so the object may not
	/// be written.
	#[error("{kind} object is missing mandatory property {property}")]
	MandatoryPropertyMissing {
		/// Class of the object being validated
		kind: ObjectKind,
		/// The absent property
		property: String,
	},
	/// The contents of a property did not conform to the expected syntax.
	#[error("Invalid property format: {0}")]
	InvalidPropertyFormat(String),
	/// A class-specific operation was attempted on an object of another class.
	#[error("Operation requires a {expected} object, got {actual}")]
	WrongObjectClass {
		/// Class the operation works on
		expected: ObjectKind,
		/// Class of the object it was called on
		actual: ObjectKind,
	},
	/// Tried to enable a user account that is not disabled.
	#[error("User is not disabled")]
	UserNotDisabled,
	/// Tried to disable a user account that is not enabled.
	#[error("User is not enabled")]
	UserNotEnabled,
	/// Tried to unlock a user account that is not locked out.
	#[error("User is not locked out")]
	UserNotLockedOut,
	/// The object to add to a group is already a member.
	#[error("{0} is already a member of the group")]
	GroupMemberExists(String),
	/// The object to remove from a group is not a member.
	#[error("{0} is not a member of the group")]
	GroupMemberDoesNotExist(String),
	/// No directory object matched.
	#[error("Object not found: {0}")]
	ObjectNotFound(String),
	/// The domain was used before connecting, or after disconnecting.
	#[error("Domain is not connected")]
	DomainNotConnected,
	/// The directory server could not be reached.
	#[error("LDAP connection failed: {0}")]
	ConnectionFailed(String),
	/// The directory server rejected the bind credentials.
	#[error("Invalid credentials")]
	InvalidCredentials,
	/// The search exceeded the time limit.
	#[error("Query timed out")]
	QueryTimeout,
	/// A timestamp was malformed or out of range.
	#[error("Invalid time: {0}")]
	InvalidTime(String),
	/// Bytes could not be decoded as UTF-8.
	#[error("Invalid UTF-8 data")]
	Encoding(#[from] std::str::Utf8Error),
	/// No flag with the given name exists.
	#[error("Unknown flag: {0}")]
	UnknownFlag(String),
	/// Configuration or input was unusable.
	#[error("Invalid: {0}")]
	Invalid(String),
	/// Reading certificates or keys failed.
	#[error(transparent)]
	Io(#[from] std::io::Error),
	/// An underlying protocol error or similar occurred, or the LDAP library
	/// was used incorrectly.
	#[error(transparent)]
	Ldap(LdapError),
}

impl From<LdapError> for Error {
	fn from(err: LdapError) -> Self {
		match err {
			LdapError::Timeout { .. } => Error::QueryTimeout,
			LdapError::LdapResult { result } => Error::from(result),
			err => Error::Ldap(err),
		}
	}
}

impl From<LdapResult> for Error {
	fn from(result: LdapResult) -> Self {
		match result.rc {
			RC_TIME_LIMIT_EXCEEDED => Error::QueryTimeout,
			RC_INVALID_CREDENTIALS => Error::InvalidCredentials,
			_ => Error::Ldap(LdapError::LdapResult { result }),
		}
	}
}
