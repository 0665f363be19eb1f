// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A remote HTTP signing oracle.
//!
//! The CMS signing step only ever needs a PKCS#1 v1.5 RSA-SHA256 signature
//! over a short message. Rather than requiring the private key to live on
//! the machine running the signer, this module lets that operation be
//! delegated to an HTTP endpoint that holds the key (for example, behind an
//! HSM or a company's internal signing service). [RemoteSigner] implements
//! [Sign] so it plugs directly into [crate::signing_settings::SigningSettings::set_signing_key]
//! alongside the in-memory key types in [crate::cryptography].

use {
    crate::AppleCodesignError,
    bytes::Bytes,
    log::debug,
    serde::{Deserialize, Serialize},
    std::time::Duration,
    thiserror::Error,
    x509_certificate::{KeyAlgorithm, Sign, SignatureAlgorithm, X509CertificateError},
};

/// An error specific to remote signing.
#[derive(Debug, Error)]
pub enum RemoteSignError {
    #[error("error reported from signing oracle: {0}")]
    OracleError(String),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

#[derive(Serialize)]
struct SignRequest<'a> {
    /// SHA-1 hex digest of the signer certificate's PEM encoding.
    ///
    /// Identifies which key the oracle should sign with, since a production
    /// oracle holds more than one key.
    key: &'a str,
    /// Base64 encoded digest to sign.
    digest: &'a str,
    /// Name of the digest algorithm, always `sha256` for CMS signing.
    digest_algorithm: &'static str,
}

#[derive(Deserialize)]
struct SignResponse {
    /// Base64 encoded PKCS#1 v1.5 signature over `digest`.
    signature: String,
}

/// Produces PKCS#1 v1.5 RSA-SHA256 signatures by calling out to an HTTP oracle.
///
/// The oracle is expected to accept a JSON POST body of `{"key": "<sha1 hex>",
/// "digest": "<base64>", "digest_algorithm": "sha256"}` and respond with
/// `{"signature": "<base64>"}`. `key` is the SHA-1 hex digest of the signer
/// certificate's PEM encoding, the same identifier [crate::cryptography]'s
/// file-based signer is keyed by; a real oracle holds more than one
/// certificate/key pair and uses this to pick the right one.
///
/// Only RSA is supported, matching the one PKCS#1 v1.5 signature the CMS
/// rewrite step ever requests. The caller supplies the public key bytes of
/// the certificate the oracle holds the matching private key for, since this
/// type never sees the private key itself.
pub struct RemoteSigner {
    url: String,
    client: reqwest::blocking::Client,
    key: String,
    public_key_data: Bytes,
}

impl RemoteSigner {
    /// Construct a new remote signer.
    ///
    /// `cert_pem` is the PEM encoding of the certificate whose private key
    /// the oracle holds; its SHA-1 hex digest becomes the `key` field sent
    /// with every signing request so a multi-key oracle knows which
    /// certificate to sign with.
    pub fn new(
        url: impl Into<String>,
        cert_pem: impl AsRef<[u8]>,
        public_key_data: impl Into<Bytes>,
    ) -> Result<Self, AppleCodesignError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(RemoteSignError::Reqwest)?;

        let key = hex::encode(ring::digest::digest(
            &ring::digest::SHA1_FOR_LEGACY_USE_ONLY,
            cert_pem.as_ref(),
        ));

        Ok(Self {
            url: url.into(),
            client,
            key,
            public_key_data: public_key_data.into(),
        })
    }

    /// The SHA-1 hex digest of the signer certificate's PEM encoding this
    /// signer identifies itself with.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Ask the oracle to produce a PKCS#1 v1.5 SHA-256 signature over `message`.
    fn request_signature(&self, message: &[u8]) -> Result<Vec<u8>, AppleCodesignError> {
        debug!(
            "requesting remote signature from {} (key {})",
            self.url, self.key
        );

        let request = SignRequest {
            key: &self.key,
            digest: &base64::encode(message),
            digest_algorithm: "sha256",
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(RemoteSignError::Reqwest)?;

        if !response.status().is_success() {
            return Err(AppleCodesignError::RemoteSign(RemoteSignError::OracleError(
                format!("oracle returned HTTP {}", response.status()),
            )));
        }

        let response: SignResponse = response.json().map_err(RemoteSignError::Reqwest)?;

        let signature = base64::decode(&response.signature).map_err(RemoteSignError::Base64)?;

        Ok(signature)
    }
}

impl Sign for RemoteSigner {
    fn sign(&self, message: &[u8]) -> Result<(Vec<u8>, SignatureAlgorithm), X509CertificateError> {
        let signature = self
            .request_signature(message)
            .map_err(|e| X509CertificateError::Other(e.to_string()))?;

        Ok((signature, SignatureAlgorithm::RsaSha256))
    }

    fn key_algorithm(&self) -> Option<KeyAlgorithm> {
        Some(KeyAlgorithm::Rsa)
    }

    fn public_key_data(&self) -> Bytes {
        self.public_key_data.clone()
    }

    fn signature_algorithm(&self) -> Result<SignatureAlgorithm, X509CertificateError> {
        Ok(SignatureAlgorithm::RsaSha256)
    }

    fn private_key_data(&self) -> Option<Vec<u8>> {
        None
    }

    fn rsa_primes(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>, X509CertificateError> {
        Ok(None)
    }
}
