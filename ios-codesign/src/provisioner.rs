// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resolving provisioning profiles and entitlements for a bundle identifier.
//!
//! A provisioning profile is a CMS envelope whose signed content is an XML
//! plist describing which application identifier(s) (possibly wildcarded)
//! a team is authorized to sign. This module loads a set of profiles (and
//! optional entitlements override files) and answers, for a concrete bundle
//! identifier, which profile and which entitlements it should receive,
//! using the same wildcard specificity rule as [crate::identifier_matcher].

use {
    crate::{error::AppleCodesignError, identifier_matcher, openssl_shell},
    std::{collections::BTreeMap, path::Path, path::PathBuf},
};

/// An immutable, loaded provisioning profile.
#[derive(Clone, Debug)]
pub struct ProvisioningProfile {
    /// Path the profile was loaded from.
    pub path: PathBuf,

    /// Raw DER bytes of the profile's CMS envelope.
    pub der: Vec<u8>,

    /// `Entitlements.application-identifier` from the embedded plist.
    ///
    /// This is the key this profile is indexed under, and may itself carry
    /// a trailing wildcard (e.g. `TEAMID.*`).
    pub application_identifier: String,

    /// `TeamIdentifier[0]` from the embedded plist, if present.
    pub team_identifier: Option<String>,

    /// The `Entitlements` dictionary embedded in the profile.
    pub entitlements: plist::Dictionary,
}

impl ProvisioningProfile {
    /// Load a provisioning profile from a filesystem path.
    ///
    /// The profile is a DER CMS envelope; its signed content is extracted
    /// via the external `openssl smime -verify` shell (see
    /// [openssl_shell::smime_verify_provisioning_profile]), accepting
    /// self-signed-looking chains since our goal here is to read the plist
    /// payload, not to make a trust decision.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppleCodesignError> {
        let path = path.as_ref();
        let der = std::fs::read(path)?;

        let plist_data = openssl_shell::smime_verify_provisioning_profile(path)?;

        Self::from_plist_data(path.to_path_buf(), der, &plist_data)
    }

    /// Construct an instance from already-verified plist payload bytes.
    ///
    /// Split out from [Self::load] so the plist-parsing logic can be
    /// exercised in tests without shelling out to `openssl`.
    fn from_plist_data(
        path: PathBuf,
        der: Vec<u8>,
        plist_data: &[u8],
    ) -> Result<Self, AppleCodesignError> {
        let cursor = std::io::Cursor::new(plist_data);
        let value = plist::Value::from_reader_xml(cursor)
            .map_err(AppleCodesignError::PlistParseXml)?;
        let dict = value.into_dictionary().ok_or_else(|| {
            AppleCodesignError::ProvisioningProfile(format!(
                "{}: decoded payload is not a plist dictionary",
                path.display()
            ))
        })?;

        let entitlements = dict
            .get("Entitlements")
            .and_then(|v| v.as_dictionary())
            .ok_or_else(|| {
                AppleCodesignError::ProvisioningProfile(format!(
                    "{}: missing Entitlements dictionary",
                    path.display()
                ))
            })?
            .clone();

        let application_identifier = entitlements
            .get("application-identifier")
            .and_then(|v| v.as_string())
            .ok_or_else(|| {
                AppleCodesignError::ProvisioningProfile(format!(
                    "{}: Entitlements.application-identifier missing",
                    path.display()
                ))
            })?
            .to_string();

        let team_identifier = dict
            .get("TeamIdentifier")
            .and_then(|v| v.as_array())
            .and_then(|values| values.first())
            .and_then(|v| v.as_string())
            .map(|s| s.to_string());

        Ok(Self {
            path,
            der,
            application_identifier,
            team_identifier,
            entitlements,
        })
    }
}

/// An entitlements plist that overrides the entitlements portion of whatever
/// provisioning profile matches the same application identifier.
///
/// This is advisory only: the override may only narrow the profile's
/// entitlements, never widen them, but this store does not enforce that
/// (see the open question recorded in `DESIGN.md`).
#[derive(Clone, Debug)]
pub struct EntitlementsOverride {
    pub path: PathBuf,
    pub application_identifier: String,
    pub dictionary: plist::Dictionary,
}

impl EntitlementsOverride {
    /// Load an entitlements override plist from a filesystem path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppleCodesignError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;

        Self::from_plist_data(path.to_path_buf(), &data)
    }

    fn from_plist_data(path: PathBuf, data: &[u8]) -> Result<Self, AppleCodesignError> {
        let cursor = std::io::Cursor::new(data);
        let value = plist::Value::from_reader_xml(cursor)
            .map_err(AppleCodesignError::PlistParseXml)?;
        let dictionary = value.into_dictionary().ok_or_else(|| {
            AppleCodesignError::ProvisioningProfile(format!(
                "{}: entitlements override is not a plist dictionary",
                path.display()
            ))
        })?;

        let application_identifier = dictionary
            .get("application-identifier")
            .and_then(|v| v.as_string())
            .ok_or_else(|| {
                AppleCodesignError::ProvisioningProfile(format!(
                    "{}: entitlements override missing application-identifier",
                    path.display()
                ))
            })?
            .to_string();

        Ok(Self {
            path,
            application_identifier,
            dictionary,
        })
    }
}

/// An index of provisioning profiles and entitlements overrides, queryable
/// by application/bundle identifier.
///
/// Construction is fallible and fatal on any inconsistency: two profiles
/// claiming the same application identifier, or two overrides claiming the
/// same application identifier, abort the load. This mirrors the source
/// behavior of refusing to guess when provisioning is ambiguous.
#[derive(Default)]
pub struct ProvisioningStore {
    profiles: BTreeMap<String, ProvisioningProfile>,
    overrides: BTreeMap<String, EntitlementsOverride>,
}

impl ProvisioningStore {
    /// Load a store from a list of profile paths and a list of entitlements
    /// override paths.
    pub fn new(
        profile_paths: impl IntoIterator<Item = impl AsRef<Path>>,
        entitlements_paths: impl IntoIterator<Item = impl AsRef<Path>>,
    ) -> Result<Self, AppleCodesignError> {
        let mut profiles = BTreeMap::new();

        for path in profile_paths {
            let profile = ProvisioningProfile::load(path.as_ref())?;

            if let Some(existing) = profiles.insert(profile.application_identifier.clone(), profile)
            {
                return Err(AppleCodesignError::ProvisioningProfile(format!(
                    "duplicate application identifier {} across provisioning profiles ({})",
                    existing.application_identifier,
                    existing.path.display(),
                )));
            }
        }

        let mut overrides = BTreeMap::new();

        for path in entitlements_paths {
            let over = EntitlementsOverride::load(path.as_ref())?;

            if let Some(existing) = overrides.insert(over.application_identifier.clone(), over) {
                return Err(AppleCodesignError::ProvisioningProfile(format!(
                    "duplicate application identifier {} across entitlements overrides ({})",
                    existing.application_identifier,
                    existing.path.display(),
                )));
            }
        }

        Ok(Self { profiles, overrides })
    }

    /// Whether this store has no profiles registered (adhoc-only operation).
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Resolve the best provisioning profile for a concrete bundle identifier.
    pub fn get_profile(
        &self,
        identifier: &str,
    ) -> Result<Option<&ProvisioningProfile>, AppleCodesignError> {
        let patterns = self.profiles.keys().map(|s| s.as_str());

        match identifier_matcher::best_pattern(identifier, patterns)? {
            Some(pattern) => Ok(self.profiles.get(pattern)),
            None => Ok(None),
        }
    }

    /// Resolve the entitlements dictionary for a concrete bundle identifier.
    ///
    /// An entitlements override takes precedence over the matched profile's
    /// own `Entitlements` dictionary when both match.
    pub fn get_entitlements(
        &self,
        identifier: &str,
    ) -> Result<Option<&plist::Dictionary>, AppleCodesignError> {
        let override_patterns = self.overrides.keys().map(|s| s.as_str());

        if let Some(pattern) = identifier_matcher::best_pattern(identifier, override_patterns)? {
            return Ok(self.overrides.get(pattern).map(|o| &o.dictionary));
        }

        Ok(self.get_profile(identifier)?.map(|p| &p.entitlements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_plist(app_id: &str, team_id: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>TeamIdentifier</key>
    <array><string>{team}</string></array>
    <key>Entitlements</key>
    <dict>
        <key>application-identifier</key>
        <string>{app_id}</string>
        <key>get-task-allow</key>
        <false/>
    </dict>
</dict>
</plist>
"#,
            team = team_id,
            app_id = app_id,
        )
        .into_bytes()
    }

    #[test]
    fn parses_application_identifier_and_team() {
        let plist_bytes = profile_plist("ISIGNTESTS.foo.bar.baz", "ISIGNTESTS");
        let profile = ProvisioningProfile::from_plist_data(
            PathBuf::from("test.mobileprovision"),
            vec![],
            &plist_bytes,
        )
        .unwrap();

        assert_eq!(profile.application_identifier, "ISIGNTESTS.foo.bar.baz");
        assert_eq!(profile.team_identifier.as_deref(), Some("ISIGNTESTS"));
    }

    #[test]
    fn store_resolves_most_specific_profile() {
        let mut store = ProvisioningStore::default();

        for (app_id, team) in [
            ("ISIGNTESTS.*", "ISIGNTESTS"),
            ("ISIGNTESTS.foo.*", "ISIGNTESTS"),
            ("ISIGNTESTS.foo.bar.baz", "ISIGNTESTS"),
        ] {
            let plist_bytes = profile_plist(app_id, team);
            let profile = ProvisioningProfile::from_plist_data(
                PathBuf::from(format!("{app_id}.mobileprovision")),
                vec![],
                &plist_bytes,
            )
            .unwrap();
            store.profiles.insert(profile.application_identifier.clone(), profile);
        }

        let resolved = store
            .get_profile("ISIGNTESTS.foo.bar.baz")
            .unwrap()
            .expect("a profile should match");

        assert_eq!(resolved.application_identifier, "ISIGNTESTS.foo.bar.baz");
    }

    #[test]
    fn duplicate_application_identifier_across_profiles_is_fatal() {
        let plist_bytes = profile_plist("TEAMID.foo", "TEAMID");

        let mut profiles = BTreeMap::new();
        let first = ProvisioningProfile::from_plist_data(
            PathBuf::from("a.mobileprovision"),
            vec![],
            &plist_bytes,
        )
        .unwrap();
        profiles.insert(first.application_identifier.clone(), first);

        let second = ProvisioningProfile::from_plist_data(
            PathBuf::from("b.mobileprovision"),
            vec![],
            &plist_bytes,
        )
        .unwrap();

        assert!(profiles.insert(second.application_identifier.clone(), second).is_some());
    }

    #[test]
    fn entitlements_override_takes_precedence_over_profile() {
        let mut store = ProvisioningStore::default();

        let plist_bytes = profile_plist("TEAMID.foo", "TEAMID");
        let profile = ProvisioningProfile::from_plist_data(
            PathBuf::from("a.mobileprovision"),
            vec![],
            &plist_bytes,
        )
        .unwrap();
        store
            .profiles
            .insert(profile.application_identifier.clone(), profile);

        let override_plist = br#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>application-identifier</key>
    <string>TEAMID.foo</string>
    <key>get-task-allow</key>
    <true/>
</dict>
</plist>
"#;
        let over =
            EntitlementsOverride::from_plist_data(PathBuf::from("override.plist"), override_plist)
                .unwrap();
        store
            .overrides
            .insert(over.application_identifier.clone(), over);

        let entitlements = store
            .get_entitlements("TEAMID.foo")
            .unwrap()
            .expect("entitlements should resolve");

        assert_eq!(
            entitlements.get("get-task-allow"),
            Some(&plist::Value::Boolean(true))
        );
    }

    #[test]
    fn no_match_returns_none() {
        let store = ProvisioningStore::default();
        assert!(store.get_profile("TEAMID.foo").unwrap().is_none());
        assert!(store.get_entitlements("TEAMID.foo").unwrap().is_none());
    }
}
