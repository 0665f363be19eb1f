// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shelling out to the system `openssl` binary.
//!
//! Provisioning profiles are CMS (PKCS#7) signed blobs whose signer is
//! Apple's own WWDR chain, which this crate does not carry the certificates
//! for (see [crate::apple_certificates]). Rather than re-implement PKCS#7
//! `smime -verify` parsing, we shell out to the system `openssl` binary,
//! accepting a self-signed-looking chain (`-noverify`) since our goal is to
//! read the plist payload, not to make a trust decision.

use {
    crate::error::AppleCodesignError,
    duct::cmd,
    log::{debug, warn},
    std::path::Path,
};

const MINIMUM_OPENSSL_VERSION: (u64, u64, u64) = (1, 0, 1);

fn openssl_binary() -> String {
    std::env::var("OPENSSL").unwrap_or_else(|_| "openssl".to_string())
}

/// Run `openssl smime -verify -noverify` against a DER-encoded provisioning
/// profile and return its decoded plist payload.
///
/// Provisioning profiles always produce a `Verification successful` message
/// on stderr even when things go well; that's expected and not logged as an
/// error. Anything else written to stderr is logged at `warn` level, since
/// it's unexpected but not necessarily fatal (older OpenSSL releases phrase
/// this message slightly differently).
pub fn smime_verify_provisioning_profile(path: &Path) -> Result<Vec<u8>, AppleCodesignError> {
    let binary = openssl_binary();

    debug!(
        "invoking {} smime -verify on {}",
        binary,
        path.display()
    );

    let output = cmd!(
        &binary,
        "smime",
        "-inform",
        "der",
        "-verify",
        "-noverify",
        "-in",
        path
    )
    .stdout_capture()
    .stderr_capture()
    .unchecked()
    .run()
    .map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppleCodesignError::OpenSslNotFound
        } else {
            AppleCodesignError::OpenSsl(e.to_string())
        }
    })?;

    if !output.status.success() {
        return Err(AppleCodesignError::OpenSsl(format!(
            "openssl smime -verify exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.trim() != "Verification successful" && !stderr.trim().is_empty() {
        warn!("unexpected output from openssl: {}", stderr.trim());
    }

    Ok(output.stdout)
}

/// Run `openssl version` and parse out the `major.minor.patch` tuple.
pub fn installed_version() -> Result<(u64, u64, u64), AppleCodesignError> {
    let binary = openssl_binary();

    let output = cmd!(&binary, "version")
        .stdout_capture()
        .stderr_capture()
        .unchecked()
        .run()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppleCodesignError::OpenSslNotFound
            } else {
                AppleCodesignError::OpenSsl(e.to_string())
            }
        })?;

    let text = String::from_utf8_lossy(&output.stdout);
    parse_version(&text)
        .ok_or_else(|| AppleCodesignError::OpenSsl(format!("unable to parse version: {}", text)))
}

fn parse_version(text: &str) -> Option<(u64, u64, u64)> {
    // e.g. "OpenSSL 1.1.1n  15 Mar 2022" or "OpenSSL 3.0.2 15 Mar 2022"
    let version_token = text.split_whitespace().nth(1)?;
    let mut parts = version_token.splitn(3, '.');

    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts
        .next()?
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .ok()?;

    Some((major, minor, patch))
}

/// Verify the installed `openssl` binary is at least [MINIMUM_OPENSSL_VERSION].
///
/// Logs a warning (does not error) if it's older, since older releases have
/// historically still worked for the one command this module needs.
pub fn check_version() {
    match installed_version() {
        Ok(version) => {
            if version < MINIMUM_OPENSSL_VERSION {
                warn!(
                    "signing may not work: openssl version is {:?}, recommend at least {:?}",
                    version, MINIMUM_OPENSSL_VERSION
                );
            }
        }
        Err(e) => {
            warn!("unable to determine openssl version: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modern_version_string() {
        assert_eq!(
            parse_version("OpenSSL 3.0.2 15 Mar 2022"),
            Some((3, 0, 2))
        );
    }

    #[test]
    fn parses_legacy_version_string_with_suffix() {
        assert_eq!(
            parse_version("OpenSSL 0.9.8zd 8 Jan 2015"),
            Some((0, 9, 8))
        );
    }
}
