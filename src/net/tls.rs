//! Root CA loading for TLS interception.
//!
//! The proxy engine signs a leaf certificate per intercepted host with this
//! CA; clients must trust `antigravity-ca.crt` for HTTPS interception to work.

use std::fs;
use std::path::{Path, PathBuf};

use hudsucker::certificate_authority::RcgenAuthority;
use hudsucker::rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    IsCa, Issuer, KeyPair, KeyUsagePurpose,
};
use hudsucker::rustls::crypto::aws_lc_rs::default_provider;
use thiserror::Error;

const CA_CERT_FILENAME: &str = "antigravity-ca.crt";
const CA_KEY_FILENAME: &str = "antigravity-ca.key";
const CA_COMMON_NAME: &str = "Antigravity Proxy Root CA";

/// Error loading or creating the root CA.
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("CA file error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to generate CA: {0}")]
    Generation(String),

    #[error("failed to parse CA: {0}")]
    Parse(String),

    #[error("CA directory {0:?} holds a certificate or a key but not both")]
    Incomplete(PathBuf),
}

/// Root CA persisted as PEM files in a directory.
#[derive(Debug, Clone)]
pub struct CertificateStore {
    ca_dir: PathBuf,
}

impl CertificateStore {
    pub fn new(ca_dir: impl AsRef<Path>) -> Self {
        Self {
            ca_dir: ca_dir.as_ref().to_path_buf(),
        }
    }

    pub fn cert_path(&self) -> PathBuf {
        self.ca_dir.join(CA_CERT_FILENAME)
    }

    pub fn key_path(&self) -> PathBuf {
        self.ca_dir.join(CA_KEY_FILENAME)
    }

    /// Load the CA, generating it on first run.
    ///
    /// A directory with only one of the two files is an error rather than
    /// being silently overwritten.
    pub fn ensure_authority(&self, cache_size: u64) -> Result<RcgenAuthority, CertificateError> {
        match (self.cert_path().exists(), self.key_path().exists()) {
            (true, true) => {}
            (false, false) => self.generate()?,
            _ => return Err(CertificateError::Incomplete(self.ca_dir.clone())),
        }
        self.load_authority(cache_size)
    }

    /// Generate and persist a new self-signed root CA.
    pub fn generate(&self) -> Result<(), CertificateError> {
        fs::create_dir_all(&self.ca_dir).map_err(|source| CertificateError::Io {
            path: self.ca_dir.clone(),
            source,
        })?;

        let key_pair = KeyPair::generate().map_err(|e| CertificateError::Generation(e.to_string()))?;

        let mut params = CertificateParams::default();
        let mut name = DistinguishedName::new();
        name.push(DnType::CommonName, CA_COMMON_NAME);
        params.distinguished_name = name;
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];

        let cert = params
            .self_signed(&key_pair)
            .map_err(|e| CertificateError::Generation(e.to_string()))?;

        write_file(&self.cert_path(), cert.pem().as_bytes())?;
        write_file(&self.key_path(), key_pair.serialize_pem().as_bytes())?;

        tracing::info!(path = ?self.cert_path(), "Generated new root CA; install it as trusted to intercept HTTPS");
        Ok(())
    }

    /// Build the engine's authority from the PEM files.
    pub fn load_authority(&self, cache_size: u64) -> Result<RcgenAuthority, CertificateError> {
        let cert_pem = read_file(&self.cert_path())?;
        let key_pem = read_file(&self.key_path())?;

        let key_pair = KeyPair::from_pem(&key_pem).map_err(|e| CertificateError::Parse(e.to_string()))?;
        let issuer = Issuer::from_ca_cert_pem(&cert_pem, key_pair)
            .map_err(|e| CertificateError::Parse(e.to_string()))?;

        Ok(RcgenAuthority::new(issuer, cache_size, default_provider()))
    }
}

fn read_file(path: &Path) -> Result<String, CertificateError> {
    fs::read_to_string(path).map_err(|source| CertificateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), CertificateError> {
    fs::write(path, contents).map_err(|source| CertificateError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if path.extension().is_some_and(|ext| ext == "key") {
        restrict_permissions(path);
    }
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!(path = ?path, error = %e, "Could not restrict CA key permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}
