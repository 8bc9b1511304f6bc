//! Conversions between Active Directory data representations and Rust types.
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::{
	constants::{UserAccountControl, EPOCH_AS_FILETIME, FILETIME_TICKS_PER_SECOND},
	error::Error,
};

/// Generalized time as used by `createTimeStamp` and friends. Configured
/// according the syntax definition
/// `( 1.3.6.1.4.1.1466.115.121.1.24 DESC 'Generalized Time' )` described in
/// RFC4517 section 3.1.13
pub const TIME_FORMAT: &[time::format_description::FormatItem] =
	time::macros::format_description!("[year][month][day][hour][minute][second]Z");

/// Generalized time with a fractional second, as used by `whenCreated` and
/// `whenChanged`.
pub const TEXT_TIME_FORMAT: &[time::format_description::FormatItem] =
	time::macros::format_description!("[year][month][day][hour][minute][second].[subsecond]Z");

/// Output form of [`TEXT_TIME_FORMAT`], which AD writes with a zero fraction.
const TEXT_TIME_OUTPUT: &[time::format_description::FormatItem] =
	time::macros::format_description!("[year][month][day][hour][minute][second].0Z");

/// Convert a filetime (100ns intervals since 1601-01-01) to seconds since the
/// Unix epoch.
///
/// Values that are negative, or that do not denote a date between the years 1
/// and 9999 (such as the `0x7FFFFFFFFFFFFFFF` "never" marker), are rejected.
pub fn filetime_to_unix(filetime: i64) -> Result<i64, Error> {
	if filetime < 0 {
		return Err(Error::InvalidTime(format!("negative filetime {filetime}")));
	}
	let seconds = (filetime - EPOCH_AS_FILETIME) / FILETIME_TICKS_PER_SECOND;
	OffsetDateTime::from_unix_timestamp(seconds)
		.map_err(|_| Error::InvalidTime(format!("filetime {filetime} is out of range")))?;
	Ok(seconds)
}

/// Convert seconds since the Unix epoch to a filetime.
pub fn unix_to_filetime(seconds: i64) -> Result<i64, Error> {
	seconds
		.checked_mul(FILETIME_TICKS_PER_SECOND)
		.and_then(|ticks| ticks.checked_add(EPOCH_AS_FILETIME))
		.filter(|filetime| *filetime >= 0)
		.ok_or_else(|| Error::InvalidTime(format!("{seconds} is not representable as a filetime")))
}

/// Parse a `YYYYMMDDHHMMSS.0Z` (or `YYYYMMDDHHMMSSZ`) timestamp as UTC and
/// return seconds since the Unix epoch.
pub fn text_time_to_unix(text: &str) -> Result<i64, Error> {
	let format = if text.contains('.') { TEXT_TIME_FORMAT } else { TIME_FORMAT };
	let time = PrimitiveDateTime::parse(text, format)
		.map_err(|err| Error::InvalidTime(format!("{text:?}: {err}")))?;
	Ok(time.assume_utc().unix_timestamp())
}

/// Format seconds since the Unix epoch as `YYYYMMDDHHMMSS.0Z`.
pub fn unix_to_text_time(seconds: i64) -> Result<String, Error> {
	OffsetDateTime::from_unix_timestamp(seconds)
		.map_err(|err| Error::InvalidTime(err.to_string()))?
		.format(TEXT_TIME_OUTPUT)
		.map_err(|err| Error::InvalidTime(err.to_string()))
}

/// Decode bytes as UTF-8. Text is passed through unchanged.
pub fn to_str<B: AsRef<[u8]> + ?Sized>(value: &B) -> Result<&str, Error> {
	Ok(std::str::from_utf8(value.as_ref())?)
}

/// Encode text as UTF-8 bytes. Bytes are passed through unchanged.
pub fn to_bytes<S: AsRef<[u8]> + ?Sized>(value: &S) -> &[u8] {
	value.as_ref()
}

/// Whether any bit of `value` is set in `bitmask`.
///
/// ```
/// use ad_ldap::{constants::UserAccountControl, convert::bitmask_bool};
///
/// let disable = i64::from(UserAccountControl::ACCOUNTDISABLE.bits());
/// assert!(bitmask_bool(514, disable));
/// assert!(!bitmask_bool(512, disable));
/// ```
#[must_use]
pub fn bitmask_bool(bitmask: i64, value: i64) -> bool {
	bitmask & value != 0
}

/// Whether the `userAccountControl` flag called `name` (e.g.
/// `"ACCOUNTDISABLE"`) is set in `bitmask`.
pub fn flag_set(bitmask: i64, name: &str) -> Result<bool, Error> {
	let flag =
		UserAccountControl::from_name(name).ok_or_else(|| Error::UnknownFlag(name.to_owned()))?;
	Ok(bitmask_bool(bitmask, i64::from(flag.bits())))
}

/// Escape text for use as a value in an LDAP search filter, so that it is
/// matched literally.
pub fn escape<B: AsRef<[u8]> + ?Sized>(text: &B) -> Result<String, Error> {
	let text = to_str(text)?;
	Ok(ldap3::ldap_escape(text).into_owned())
}
