//! Config for the LDAP client.
use std::{path::PathBuf, sync::Arc, time::Duration};

use ldap3::LdapConnSettings;
use rustls::{Certificate, ClientConfig, PrivateKey, RootCertStore};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{constants::PAGE_SIZE, error::Error};

/// LDAP configuration.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
	/// The URL to connect to the server with. Supports ldap, ldaps, and ldapi
	/// schemes. Use ldaps (or StartTLS): a simple bind over plain ldap sends
	/// the password in cleartext.
	pub url: Url,
	/// Connection settings.
	#[serde(default)]
	pub connection: ConnectionConfig,
	/// The user to bind as, either a DN or a `user@domain` principal
	pub bind_user: String,
	/// The password of the bind user
	pub bind_password: String,
	/// Page size for the [simple paged search control]
	///
	/// [simple paged search control]: https://www.rfc-editor.org/rfc/rfc2696.html
	#[serde(default = "default_page_size")]
	pub page_size: i32,
}

/// Serde default for [`Config::page_size`]
const fn default_page_size() -> i32 {
	PAGE_SIZE
}

impl Config {
	/// Configuration for an ldaps connection to `host` with default
	/// connection settings.
	pub fn for_host(host: &str, bind_user: &str, bind_password: &str) -> Result<Self, Error> {
		let url = Url::parse(&format!("ldaps://{host}"))
			.map_err(|err| Error::Invalid(format!("Invalid host {host:?}: {err}")))?;
		Ok(Self {
			url,
			connection: ConnectionConfig::default(),
			bind_user: bind_user.to_owned(),
			bind_password: bind_password.to_owned(),
			page_size: PAGE_SIZE,
		})
	}
}

/// Configuration for how to connect to the LDAP server
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionConfig {
	/// Timeout to establish a connection in seconds.
	pub timeout: u64,

	/// LDAP operation timeout. For search per reply.
	pub operation_timeout: Duration,

	/// TLS config
	#[serde(default)]
	pub tls: TLSConfig,
}

impl Default for ConnectionConfig {
	fn default() -> Self {
		Self { timeout: 30, operation_timeout: Duration::from_secs(60), tls: TLSConfig::default() }
	}
}

/// TLS Configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TLSConfig {
	/// Use StartTLS extended operation for establishing a secure connection,
	/// rather than TLS on a dedicated port.
	pub starttls: bool,

	/// Disable verification of TLS certificates
	pub no_tls_verify: bool,

	/// TLS root certificates path, PEM encoded
	pub root_certificates_path: Option<PathBuf>,

	/// Path of the TLS client key to use for the connection, PKCS8 PEM encoded
	pub client_key_path: Option<PathBuf>,

	/// Path of the TLS client certificate to use for the connection
	pub client_certificate_path: Option<PathBuf>,
}

impl ConnectionConfig {
	/// Create a [`LdapConnSettings`] based on this [`ConnectionConfig`]
	pub(crate) async fn to_settings(&self) -> Result<LdapConnSettings, Error> {
		let mut settings = LdapConnSettings::new();

		settings = settings.set_conn_timeout(Duration::from_secs(self.timeout));
		settings = settings.set_starttls(self.tls.starttls);
		settings = settings.set_no_tls_verify(self.tls.no_tls_verify);

		let identity = match (&self.tls.client_key_path, &self.tls.client_certificate_path) {
			(Some(key_path), Some(cert_path)) => Some((key_path, cert_path)),
			(None, None) => None,
			_ => Err(Error::Invalid(
				"Both a client certificate and key file in PKCS8 format must be specified"
					.to_owned(),
			))?,
		};

		let Some(path) = &self.tls.root_certificates_path else {
			if identity.is_some() {
				return Err(Error::Invalid(
					"Client certificates require root_certificates_path to be set".to_owned(),
				));
			}
			return Ok(settings);
		};

		let mut roots = RootCertStore::empty();
		let pem = tokio::fs::read(path).await?;
		let certs = rustls_pemfile::certs(&mut pem.as_slice())?;
		if certs.is_empty() {
			return Err(Error::Invalid("Could not read root certificate".to_owned()));
		}
		for cert in certs {
			roots
				.add(&Certificate(cert))
				.map_err(|_| Error::Invalid("Could not read root certificate".to_owned()))?;
		}
		let builder = ClientConfig::builder().with_safe_defaults().with_root_certificates(roots);

		let config = if let Some((key_path, cert_path)) = identity {
			let cert_pem = tokio::fs::read(cert_path).await?;
			let key_pem = tokio::fs::read(key_path).await?;
			let chain = rustls_pemfile::certs(&mut cert_pem.as_slice())?
				.into_iter()
				.map(Certificate)
				.collect();
			let key = rustls_pemfile::pkcs8_private_keys(&mut key_pem.as_slice())?
				.into_iter()
				.next()
				.ok_or_else(|| Error::Invalid("Could not read client key".to_owned()))?;
			builder
				.with_client_auth_cert(chain, PrivateKey(key))
				.map_err(|_| Error::Invalid("Could not read client certificates".to_owned()))?
		} else {
			builder.with_no_client_auth()
		};

		Ok(settings.set_config(Arc::new(config)))
	}
}
