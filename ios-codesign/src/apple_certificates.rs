// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Apple certificate authority metadata.
//!
//! This module knows the *names* of Apple's well-known certificate
//! authorities: their subject and issuer Common Names, and whether each is a
//! root or an intermediate. It does not embed the certificates themselves.
//!
//! A re-signing tool that runs outside of Apple's own infrastructure has no
//! authoritative way to obtain the DER bytes of Apple's root and
//! intermediate CAs short of vendoring a snapshot from
//! <https://www.apple.com/certificateauthority/>, which goes stale as Apple
//! rotates CAs. Classification here is therefore done by matching subject
//! Common Name strings rather than by comparing encoded certificate bytes.
//! This is weaker than exact matching (a forged certificate could claim one
//! of these names) but it's sufficient for what this crate uses it for:
//! describing a signing certificate's position in Apple's PKI and walking
//! the CA chain by name when printing or reasoning about a signer, not for
//! making trust decisions the way an OS verifier would.

/// A well-known Apple certificate authority, identified by name.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum KnownCertificate {
    /// Apple Computer, Inc. Root Certificate.
    AppleComputerIncRoot,
    /// Apple Inc. Root Certificate.
    AppleRootCa,
    /// Apple Root CA - G2 Root Certificate.
    AppleRootCaG2Root,
    /// Apple Root CA - G3 Root Certificate.
    AppleRootCaG3Root,
    /// Apple IST CA 2 - G1 Certificate.
    AppleIstCa2G1,
    /// Apple IST CA 8 - G1 Certificate.
    AppleIstCa8G1,
    /// Application Integration Certificate.
    ApplicationIntegration,
    /// Application Integration 2 Certificate.
    ApplicationIntegration2,
    /// Application Integration - G3 Certificate.
    ApplicationIntegrationG3,
    /// Apple Application Integration CA 5 - G1 Certificate.
    AppleApplicationIntegrationCa5G1,
    /// Developer Authentication Certificate.
    DeveloperAuthentication,
    /// Developer ID - G1 Certificate.
    DeveloperIdG1,
    /// Developer ID - G2 Certificate.
    DeveloperIdG2,
    /// Software Update Certificate.
    SoftwareUpdate,
    /// Timestamp Certificate.
    Timestamp,
    /// Worldwide Developer Relations - G1 Certificate.
    WwdrG1,
    /// Worldwide Developer Relations - G2 Certificate.
    WwdrG2,
    /// Worldwide Developer Relations - G3 Certificate.
    WwdrG3,
    /// Worldwide Developer Relations - G4 Certificate.
    WwdrG4,
    /// Worldwide Developer Relations - G5 Certificate.
    WwdrG5,
    /// Worldwide Developer Relations - G6 Certificate.
    WwdrG6,
}

/// Static facts about a [KnownCertificate]: its subject CN, its issuer's CN
/// (used to walk the chain up towards a root by name), and whether it is
/// itself a root (self-signed).
struct CertificateRecord {
    certificate: KnownCertificate,
    subject_cn: &'static str,
    issuer_cn: &'static str,
    is_root: bool,
}

macro_rules! record {
    ($cert:ident, $subject:expr, $issuer:expr, $is_root:expr) => {
        CertificateRecord {
            certificate: KnownCertificate::$cert,
            subject_cn: $subject,
            issuer_cn: $issuer,
            is_root: $is_root,
        }
    };
}

static KNOWN_CERTIFICATES: &[CertificateRecord] = &[
    record!(
        AppleComputerIncRoot,
        "Apple Root Certificate Authority",
        "Apple Root Certificate Authority",
        true
    ),
    record!(AppleRootCa, "Apple Root CA", "Apple Root CA", true),
    record!(
        AppleRootCaG2Root,
        "Apple Root CA - G2",
        "Apple Root CA - G2",
        true
    ),
    record!(
        AppleRootCaG3Root,
        "Apple Root CA - G3",
        "Apple Root CA - G3",
        true
    ),
    record!(
        AppleIstCa2G1,
        "Apple IST CA 2 - G1",
        "Apple Root CA",
        false
    ),
    record!(
        AppleIstCa8G1,
        "Apple IST CA 8 - G1",
        "Apple Root CA",
        false
    ),
    record!(
        ApplicationIntegration,
        "Apple Application Integration Certification Authority",
        "Apple Root Certificate Authority",
        false
    ),
    record!(
        ApplicationIntegration2,
        "Apple Application Integration 2 Certification Authority",
        "Apple Root CA",
        false
    ),
    record!(
        ApplicationIntegrationG3,
        "Apple Application Integration CA - G3",
        "Apple Root CA - G3",
        false
    ),
    record!(
        AppleApplicationIntegrationCa5G1,
        "Apple Application Integration CA 5 - G1",
        "Apple Root CA - G3",
        false
    ),
    record!(
        DeveloperAuthentication,
        "Developer Authentication Certification Authority",
        "Apple Worldwide Developer Relations Certification Authority",
        false
    ),
    record!(
        DeveloperIdG1,
        "Developer ID Certification Authority",
        "Apple Root CA",
        false
    ),
    record!(
        DeveloperIdG2,
        "Developer ID Certification Authority",
        "Apple Root CA - G3",
        false
    ),
    record!(
        SoftwareUpdate,
        "Apple Software Update Certification Authority",
        "Apple Root CA",
        false
    ),
    record!(
        Timestamp,
        "Apple Timestamp Certification Authority",
        "Apple Root CA",
        false
    ),
    record!(
        WwdrG1,
        "Apple Worldwide Developer Relations Certification Authority",
        "Apple Root CA",
        false
    ),
    record!(
        WwdrG2,
        "Apple Worldwide Developer Relations CA - G2",
        "Apple Root CA - G2",
        false
    ),
    record!(
        WwdrG3,
        "Apple Worldwide Developer Relations Certification Authority",
        "Apple Root CA - G3",
        false
    ),
    record!(
        WwdrG4,
        "Apple Worldwide Developer Relations Certification Authority",
        "Apple Root CA - G3",
        false
    ),
    record!(
        WwdrG5,
        "Apple Worldwide Developer Relations Certification Authority",
        "Apple Root CA - G3",
        false
    ),
    record!(
        WwdrG6,
        "Apple Worldwide Developer Relations Certification Authority",
        "Apple Root CA - G3",
        false
    ),
];

impl KnownCertificate {
    fn record(&self) -> &'static CertificateRecord {
        KNOWN_CERTIFICATES
            .iter()
            .find(|r| r.certificate == *self)
            .expect("every KnownCertificate variant has a record")
    }

    /// The subject Common Name Apple uses for this certificate authority.
    pub fn subject_common_name(&self) -> &'static str {
        self.record().subject_cn
    }

    /// The Common Name of the certificate that issued this one.
    ///
    /// For roots this is the same as [Self::subject_common_name], since
    /// roots are self-signed.
    pub fn issuer_common_name(&self) -> &'static str {
        self.record().issuer_cn
    }

    /// Whether this certificate authority is a root (self-signed).
    pub fn is_root(&self) -> bool {
        self.record().is_root
    }

    /// Look up a [KnownCertificate] by its subject Common Name.
    ///
    /// Several entries (e.g. the two Developer ID generations) share a
    /// subject CN and differ only by issuer; when more than one record
    /// matches, the first declared is returned.
    pub fn from_subject_common_name(name: &str) -> Option<Self> {
        KNOWN_CERTIFICATES
            .iter()
            .find(|r| r.subject_cn == name)
            .map(|r| r.certificate)
    }

    /// Obtain a slice of all known [KnownCertificate] variants.
    pub fn all() -> &'static [KnownCertificate] {
        static ALL: once_cell::sync::Lazy<Vec<KnownCertificate>> =
            once_cell::sync::Lazy::new(|| {
                KNOWN_CERTIFICATES.iter().map(|r| r.certificate).collect()
            });

        &ALL
    }

    /// All of Apple's known root certificate authorities.
    pub fn all_roots() -> &'static [KnownCertificate] {
        static ROOTS: once_cell::sync::Lazy<Vec<KnownCertificate>> =
            once_cell::sync::Lazy::new(|| {
                KNOWN_CERTIFICATES
                    .iter()
                    .filter(|r| r.is_root)
                    .map(|r| r.certificate)
                    .collect()
            });

        &ROOTS
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn all_have_records() {
        for cert in KnownCertificate::all() {
            assert!(!cert.subject_common_name().is_empty());
            assert_eq!(
                KnownCertificate::from_subject_common_name(cert.subject_common_name()).is_some(),
                true
            );
        }
    }

    #[test]
    fn roots_are_self_signed_by_name() {
        for cert in KnownCertificate::all_roots() {
            assert!(cert.is_root());
            assert_eq!(cert.subject_common_name(), cert.issuer_common_name());
        }
    }

    #[test]
    fn wwdr_chains_to_a_root() {
        for cert in [KnownCertificate::WwdrG1, KnownCertificate::WwdrG3] {
            assert!(!cert.is_root());
            let issuer = KnownCertificate::from_subject_common_name(cert.issuer_common_name());
            assert!(issuer.is_some());
            assert!(issuer.unwrap().is_root());
        }
    }
}
