//! A small client library for Active Directory over LDAP.
//!
//! A [`Domain`] wraps a bound LDAP session and knows the naming contexts of
//! the domain it is connected to. Searches and lookups return [`ADObject`]s:
//! directory entries tagged with an [`ObjectKind`] (generic object, user,
//! computer, group or container) that expose typed accessors for the
//! properties of their class. Properties are changed locally and written back
//! with [`ADObject::set_properties`], which sends only what changed.
//!
//! The [`convert`] module holds the conversions AD needs beyond plain LDAP:
//! Windows filetimes, generalized time, flag masks and filter escaping.
//!
//! For a general primer on LDAP, the [introduction] in the `ldap3` crate which
//! is used here for interfacing with LDAP is an excellent resource.
//!
//! [introduction]: https://github.com/inejge/ldap3/blob/master/LDAP-primer.md
//!
//! # Getting started
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use ad_ldap::{Config, Domain};
//!
//! // Configuration can also be deserialized with serde.
//! let config = Config::for_host("dc01.example.com", "EXAMPLE\\admin", "verysecret")?;
//!
//! let mut domain: Domain = Domain::new();
//! domain.connect(&config).await?;
//! println!("{domain} ({})", domain.dns_name());
//!
//! if let Some(mut user) = domain.get_user_by_name("jdoe").await? {
//!     if user.disabled()? {
//!         user.enable(&mut domain).await?;
//!     }
//!     user.set_property("description", vec!["Back from leave".to_owned()])?;
//!     user.set_properties(&mut domain).await?;
//! }
//!
//! domain.disconnect().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Limitations
//! * Only simple binds are supported. Use ldaps or StartTLS, a simple bind
//!   over plain ldap sends the password in cleartext.
//! * Referrals are not followed.
//! * [secrecy](https://docs.rs/secrecy) is not used for storing the bind
//!   password, it probably should be

pub mod config;
pub mod constants;
pub mod convert;
pub mod directory;
pub mod dn;
pub mod domain;
pub mod entry;
pub mod error;
pub mod object;

pub use ldap3::{self, Mod, Scope, SearchEntry};

pub use crate::{
	config::{Config, ConnectionConfig, TLSConfig},
	directory::{Directory, LdapDirectory},
	domain::{Domain, SearchOptions},
	entry::SearchEntryExt,
	error::Error,
	object::{ADObject, ObjectKind, Properties},
};
