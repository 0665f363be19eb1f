// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Container detection and the end-to-end re-signing facade.
//!
//! An iOS application archive arrives in one of three shapes: an `.ipa`
//! (a zip rooted at `Payload/<Name>.app`), a bare zip of a `.app` directory,
//! or an already-unpacked `.app` directory. [ResignCoordinator] detects the
//! shape, unpacks it into a scratch directory, resolves provisioning for
//! every `.app` in the tree (the root app plus any embedded Watch apps),
//! drives [crate::bundle_signing::BundleSigner] over the result, and
//! repacks the signed output into the same container shape.

use {
    crate::{
        bundle_signing::BundleSigner,
        error::AppleCodesignError,
        provisioner::ProvisioningStore,
        signing_settings::{SettingsScope, SigningSettings},
    },
    apple_bundles::DirectoryBundle,
    log::{info, warn},
    std::{
        fs,
        io::{Read, Write},
        path::{Path, PathBuf},
    },
};

/// The three container shapes an iOS application archive can take.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContainerKind {
    /// An `.ipa`: a zip archive rooted at `Payload/<Name>.app`.
    Ipa,
    /// A zip archive with a bare `*.app` directory at its root.
    AppZip,
    /// An unpacked, on-disk `*.app` directory.
    AppDir,
}

impl ContainerKind {
    /// Detect the container kind at `path`.
    ///
    /// Checks run in order: IPA, then AppZip, then AppDir. `NotMatched` is
    /// returned (and not any of the other checks' errors) if none apply, so
    /// callers probing multiple locations can treat it as recoverable.
    pub fn detect(path: &Path) -> Result<Self, AppleCodesignError> {
        if path.is_file() {
            let fh = fs::File::open(path)?;

            let mut archive = match zip::ZipArchive::new(fh) {
                Ok(archive) => archive,
                Err(_) => return Err(AppleCodesignError::NotMatched(path.to_path_buf())),
            };

            let names = (0..archive.len())
                .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
                .collect::<Vec<_>>();

            if names.iter().any(|n| is_ipa_info_plist_entry(n)) {
                return Ok(Self::Ipa);
            }

            if names.iter().any(|n| is_app_zip_info_plist_entry(n)) {
                return Ok(Self::AppZip);
            }

            return Err(AppleCodesignError::NotMatched(path.to_path_buf()));
        }

        if path.is_dir() {
            if path.join("Info.plist").is_file() {
                let bundle =
                    DirectoryBundle::new_from_path(path).map_err(AppleCodesignError::DirectoryBundle)?;

                if bundle
                    .is_ios_app_platform()
                    .map_err(AppleCodesignError::DirectoryBundle)?
                {
                    return Ok(Self::AppDir);
                }
            }
        }

        Err(AppleCodesignError::NotMatched(path.to_path_buf()))
    }
}

fn is_ipa_info_plist_entry(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("Payload/") else {
        return false;
    };

    rest.ends_with(".app/Info.plist") && rest.matches('/').count() == 1
}

fn is_app_zip_info_plist_entry(name: &str) -> bool {
    name.ends_with(".app/Info.plist") && name.matches('/').count() == 1
}

/// The end-to-end re-sign facade: unpack, provision, sign, repack.
pub struct ResignCoordinator<'key> {
    provisioner: ProvisioningStore,
    settings: SigningSettings<'key>,
}

impl<'key> ResignCoordinator<'key> {
    /// Construct a new coordinator.
    ///
    /// `settings` should already carry the signing key/certificate (or be
    /// left bare for ad-hoc signing) and any global options (digest type,
    /// time-stamp URL, etc). Per-bundle entitlements resolved from
    /// `provisioner` are layered on top, scoped by relative bundle path.
    pub fn new(provisioner: ProvisioningStore, settings: SigningSettings<'key>) -> Self {
        Self {
            provisioner,
            settings,
        }
    }

    /// Re-sign the archive at `input_path`, writing the result to `output_path`.
    ///
    /// `info_props`, if non-empty, is merged into the root app's `Info.plist`
    /// prior to signing.
    pub fn resign(
        &self,
        input_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        info_props: &plist::Dictionary,
    ) -> Result<(), AppleCodesignError> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        let kind = ContainerKind::detect(input_path)?;
        info!(
            "detected {:?} container at {}",
            kind,
            input_path.display()
        );

        let work_dir = tempfile::tempdir()?;

        let unpack_dir = work_dir.path().join("unpacked");
        fs::create_dir_all(&unpack_dir)?;

        let root_app = self
            .unpack(input_path, kind, &unpack_dir)
            .map_err(|e| {
                warn!("failed to unpack {}: {}", input_path.display(), e);
                e
            })?;

        if !info_props.is_empty() {
            self.apply_info_plist_overrides(&root_app, info_props)?;
        }

        let mut settings = self.settings.clone();
        self.provision_bundle_tree(&root_app, "", &mut settings)?;

        let sign_dir = work_dir.path().join("signed");
        fs::create_dir_all(&sign_dir)?;

        let app_name = root_app
            .file_name()
            .ok_or_else(|| AppleCodesignError::NotSignable(root_app.display().to_string()))?;
        let signed_root = sign_dir.join(app_name);

        let signer = BundleSigner::new_from_path(&root_app).map_err(|e| {
            AppleCodesignError::NotSignable(format!("{}: {}", root_app.display(), e))
        })?;

        signer
            .write_signed_bundle(&signed_root, &settings)
            .map_err(|e| {
                warn!("signing failed for {}: {}", root_app.display(), e);
                e
            })?;

        self.repack(&signed_root, kind, output_path)?;

        // `work_dir` (and any partial output it never produced) is removed
        // when it drops at the end of this function, on every exit path.
        Ok(())
    }

    fn unpack(
        &self,
        input_path: &Path,
        kind: ContainerKind,
        unpack_dir: &Path,
    ) -> Result<PathBuf, AppleCodesignError> {
        match kind {
            ContainerKind::Ipa => {
                extract_zip(input_path, unpack_dir)?;
                find_single_child(&unpack_dir.join("Payload"), ".app")
            }
            ContainerKind::AppZip => {
                extract_zip(input_path, unpack_dir)?;
                find_single_child(unpack_dir, ".app")
            }
            ContainerKind::AppDir => {
                let name = input_path
                    .file_name()
                    .ok_or_else(|| AppleCodesignError::NotSignable(input_path.display().to_string()))?;
                let dest = unpack_dir.join(name);
                copy_dir_recursive(input_path, &dest)?;
                Ok(dest)
            }
        }
    }

    fn repack(
        &self,
        signed_root: &Path,
        kind: ContainerKind,
        output_path: &Path,
    ) -> Result<(), AppleCodesignError> {
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        match kind {
            ContainerKind::Ipa => {
                let app_name = signed_root
                    .file_name()
                    .expect("app directory has a name")
                    .to_string_lossy()
                    .to_string();
                zip_directory(
                    signed_root,
                    &PathBuf::from("Payload").join(&app_name),
                    output_path,
                )
            }
            ContainerKind::AppZip => {
                let app_name = signed_root
                    .file_name()
                    .expect("app directory has a name")
                    .to_string_lossy()
                    .to_string();
                zip_directory(signed_root, &PathBuf::from(&app_name), output_path)
            }
            ContainerKind::AppDir => {
                if output_path.exists() {
                    fs::remove_dir_all(output_path)?;
                }
                copy_dir_recursive(signed_root, output_path)
            }
        }
    }

    /// Apply `Info.plist` key overrides to the root app bundle.
    ///
    /// If the override values already match the current `Info.plist`
    /// contents, no write occurs (idempotence of the override).
    fn apply_info_plist_overrides(
        &self,
        app_root: &Path,
        info_props: &plist::Dictionary,
    ) -> Result<(), AppleCodesignError> {
        let bundle =
            DirectoryBundle::new_from_path(app_root).map_err(AppleCodesignError::DirectoryBundle)?;
        let info_plist_path = bundle.info_plist_path();

        let data = fs::read(&info_plist_path)?;
        let value = plist::Value::from_reader_xml(std::io::Cursor::new(&data))
            .map_err(AppleCodesignError::PlistParseXml)?;
        let mut dict = value.into_dictionary().ok_or_else(|| {
            AppleCodesignError::NotSignable(format!(
                "{} is not a plist dictionary",
                info_plist_path.display()
            ))
        })?;

        let old_identifier = dict
            .get("CFBundleIdentifier")
            .and_then(|v| v.as_string())
            .map(|s| s.to_string());

        let mut changed = false;

        for (key, value) in info_props {
            if dict.get(key) != Some(value) {
                dict.insert(key.clone(), value.clone());
                changed = true;
            }
        }

        if !changed {
            return Ok(());
        }

        if !info_props.contains_key("CFBundleURLTypes") {
            if let (Some(old_id), Some(new_id)) = (
                old_identifier.as_deref(),
                info_props
                    .get("CFBundleIdentifier")
                    .and_then(|v| v.as_string()),
            ) {
                if old_id != new_id {
                    rename_url_types(&mut dict, old_id, new_id);
                }
            }
        }

        let mut buffer = Vec::new();
        plist::Value::from(dict)
            .to_writer_xml(&mut buffer)
            .map_err(AppleCodesignError::PlistSerializeXml)?;
        fs::write(&info_plist_path, buffer)?;

        Ok(())
    }

    /// Resolve provisioning for `app_root` and every `.app` it embeds under
    /// `Watch/`, recording embedded profiles on disk and entitlements into
    /// `settings` scoped by relative bundle path.
    fn provision_bundle_tree(
        &self,
        app_root: &Path,
        rel_prefix: &str,
        settings: &mut SigningSettings,
    ) -> Result<(), AppleCodesignError> {
        let bundle =
            DirectoryBundle::new_from_path(app_root).map_err(AppleCodesignError::DirectoryBundle)?;

        if !bundle
            .is_ios_app_platform()
            .map_err(AppleCodesignError::DirectoryBundle)?
        {
            return Err(AppleCodesignError::NotSignable(format!(
                "{} does not declare support for a recognized iOS/watchOS platform",
                app_root.display()
            )));
        }

        let identifier = bundle
            .identifier()
            .map_err(AppleCodesignError::DirectoryBundle)?
            .ok_or_else(|| AppleCodesignError::BundleNoIdentifier(bundle.info_plist_path()))?;

        self.provision_one(&identifier, app_root, rel_prefix, settings)?;

        for (rel, _watch_app) in bundle
            .nested_watch_apps()
            .map_err(AppleCodesignError::DirectoryBundle)?
        {
            let nested_root = app_root.join(&rel);
            let nested_prefix = if rel_prefix.is_empty() {
                rel.clone()
            } else {
                format!("{}/{}", rel_prefix, rel)
            };

            self.provision_bundle_tree(&nested_root, &nested_prefix, settings)?;
        }

        Ok(())
    }

    fn provision_one(
        &self,
        identifier: &str,
        app_root: &Path,
        rel_prefix: &str,
        settings: &mut SigningSettings,
    ) -> Result<(), AppleCodesignError> {
        // An empty store means ad-hoc signing: there is nothing to provision.
        if self.provisioner.is_empty() {
            return Ok(());
        }

        let profile = self
            .provisioner
            .get_profile(identifier)?
            .ok_or(AppleCodesignError::IdentifierNotProvisioned)?;

        info!(
            "provisioning {} ({}) with profile {}",
            app_root.display(),
            identifier,
            profile.path.display()
        );
        fs::write(app_root.join("embedded.mobileprovision"), &profile.der)?;

        let scope = if rel_prefix.is_empty() {
            SettingsScope::Main
        } else {
            SettingsScope::Path(rel_prefix.to_string())
        };

        if let Some(entitlements) = self.provisioner.get_entitlements(identifier)? {
            let mut buffer = Vec::new();
            plist::Value::from(entitlements.clone())
                .to_writer_xml(&mut buffer)
                .map_err(AppleCodesignError::PlistSerializeXml)?;
            let xml = String::from_utf8(buffer)
                .map_err(|e| AppleCodesignError::EntitlementsBadUtf8(e.utf8_error()))?;

            settings.set_entitlements_xml(scope, xml)?;
        }

        if rel_prefix.is_empty() {
            if let Some(team_id) = &profile.team_identifier {
                settings.set_team_id(team_id.clone());
            }
        }

        Ok(())
    }
}

fn rename_url_types(dict: &mut plist::Dictionary, old_identifier: &str, new_identifier: &str) {
    let Some(plist::Value::Array(url_types)) = dict.get_mut("CFBundleURLTypes") else {
        return;
    };

    for entry in url_types {
        if let Some(url_dict) = entry.as_dictionary_mut() {
            if url_dict.get("CFBundleURLName").and_then(|v| v.as_string()) == Some(old_identifier) {
                url_dict.insert(
                    "CFBundleURLName".to_string(),
                    plist::Value::String(new_identifier.to_string()),
                );
            }
        }
    }
}

fn extract_zip(path: &Path, dest_dir: &Path) -> Result<(), AppleCodesignError> {
    let fh = fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(fh)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            continue;
        };
        let out_path = dest_dir.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut buffer = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buffer)?;
        fs::write(&out_path, &buffer)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))?;
        }
    }

    Ok(())
}

fn zip_directory(
    root_dir: &Path,
    archive_prefix: &Path,
    output_path: &Path,
) -> Result<(), AppleCodesignError> {
    let fh = fs::File::create(output_path)?;
    let mut writer = zip::ZipWriter::new(fh);
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    let bundle =
        DirectoryBundle::new_from_path(root_dir).map_err(AppleCodesignError::DirectoryBundle)?;

    for file in bundle.files(true).map_err(AppleCodesignError::DirectoryBundle)? {
        let archive_path = archive_prefix.join(file.relative_path());
        let archive_name = archive_path.to_string_lossy().replace('\\', "/");

        if file.symlink_target().map_err(AppleCodesignError::DirectoryBundle)?.is_some() {
            warn!(
                "skipping symlink {} when repacking archive",
                file.relative_path().display()
            );
            continue;
        }

        writer.start_file(archive_name, options)?;
        let data = fs::read(file.absolute_path())?;
        writer.write_all(&data)?;
    }

    writer.finish()?;

    Ok(())
}

fn find_single_child(dir: &Path, suffix: &str) -> Result<PathBuf, AppleCodesignError> {
    let entries = fs::read_dir(dir)
        .map_err(|_| AppleCodesignError::NotSignable(dir.display().to_string()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_dir()
                && p.file_name()
                    .map(|n| n.to_string_lossy().ends_with(suffix))
                    .unwrap_or(false)
        })
        .collect::<Vec<_>>();

    entries
        .into_iter()
        .next()
        .ok_or_else(|| AppleCodesignError::NotSignable(dir.display().to_string()))
}

fn copy_dir_recursive(source: &Path, dest: &Path) -> Result<(), AppleCodesignError> {
    fs::create_dir_all(dest)?;

    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let source_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir_recursive(&source_path, &dest_path)?;
        } else if file_type.is_symlink() {
            let target = fs::read_link(&source_path)?;
            #[cfg(unix)]
            std::os::unix::fs::symlink(target, &dest_path)?;
            #[cfg(not(unix))]
            let _ = target;
        } else {
            fs::copy(&source_path, &dest_path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_app_dir(root: &Path, platforms: &[&str]) {
        fs::create_dir_all(root).unwrap();
        let platforms_xml = platforms
            .iter()
            .map(|p| format!("<string>{}</string>", p))
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(
            root.join("Info.plist"),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleIdentifier</key>
    <string>com.example.Test</string>
    <key>CFBundleExecutable</key>
    <string>Test</string>
    <key>CFBundleSupportedPlatforms</key>
    <array>{}</array>
</dict>
</plist>
"#,
                platforms_xml
            ),
        )
        .unwrap();
    }

    #[test]
    fn detects_app_dir_with_ios_platform() {
        let td = tempfile::tempdir().unwrap();
        let app = td.path().join("Test.app");
        write_app_dir(&app, &["iPhoneOS"]);

        assert_eq!(ContainerKind::detect(&app).unwrap(), ContainerKind::AppDir);
    }

    #[test]
    fn rejects_app_dir_without_ios_platform() {
        let td = tempfile::tempdir().unwrap();
        let app = td.path().join("Test.app");
        write_app_dir(&app, &["MacOSX"]);

        assert!(ContainerKind::detect(&app).is_err());
    }

    #[test]
    fn rejects_unrecognized_file() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("notes.txt");
        fs::write(&path, b"hello").unwrap();

        assert!(matches!(
            ContainerKind::detect(&path),
            Err(AppleCodesignError::NotMatched(_))
        ));
    }

    #[test]
    fn ipa_entry_names_are_recognized() {
        assert!(is_ipa_info_plist_entry("Payload/Test.app/Info.plist"));
        assert!(!is_ipa_info_plist_entry(
            "Payload/Test.app/Frameworks/Info.plist"
        ));
        assert!(!is_ipa_info_plist_entry("Test.app/Info.plist"));
    }

    #[test]
    fn app_zip_entry_names_are_recognized() {
        assert!(is_app_zip_info_plist_entry("Test.app/Info.plist"));
        assert!(!is_app_zip_info_plist_entry(
            "Test.app/Frameworks/Info.plist"
        ));
    }

    #[test]
    fn url_type_rename_updates_matching_entries_only() {
        let mut dict = plist::Dictionary::new();
        let mut url_type = plist::Dictionary::new();
        url_type.insert(
            "CFBundleURLName".to_string(),
            plist::Value::String("com.example.Old".to_string()),
        );
        let mut other_url_type = plist::Dictionary::new();
        other_url_type.insert(
            "CFBundleURLName".to_string(),
            plist::Value::String("com.example.Unrelated".to_string()),
        );
        dict.insert(
            "CFBundleURLTypes".to_string(),
            plist::Value::Array(vec![
                plist::Value::Dictionary(url_type),
                plist::Value::Dictionary(other_url_type),
            ]),
        );

        rename_url_types(&mut dict, "com.example.Old", "com.example.New");

        let array = dict.get("CFBundleURLTypes").unwrap().as_array().unwrap();
        assert_eq!(
            array[0]
                .as_dictionary()
                .unwrap()
                .get("CFBundleURLName")
                .unwrap()
                .as_string(),
            Some("com.example.New")
        );
        assert_eq!(
            array[1]
                .as_dictionary()
                .unwrap()
                .get("CFBundleURLName")
                .unwrap()
                .as_string(),
            Some("com.example.Unrelated")
        );
    }
}
