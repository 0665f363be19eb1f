// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bundles backed by a directory.

use {
    crate::{ApplePlatform, BundlePackageType},
    anyhow::{anyhow, Context, Result},
    std::path::{Path, PathBuf},
    tugger_file_manifest::{is_executable, FileData, FileEntry, FileManifest},
};

/// An Apple bundle backed by a filesystem/directory.
///
/// Instances represent a type-agnostic bundle (macOS application bundle, iOS
/// application bundle, framework bundles, etc).
pub struct DirectoryBundle {
    /// Root directory of this bundle.
    root: PathBuf,

    /// Name of the root directory.
    root_name: String,

    /// Whether the bundle is shallow.
    ///
    /// If false, content is in a `Contents/` sub-directory.
    shallow: bool,

    /// The type of this bundle.
    package_type: BundlePackageType,

    /// Parsed `Info.plist` file.
    info_plist: plist::Dictionary,
}

impl DirectoryBundle {
    /// Open an existing bundle from a filesystem path.
    ///
    /// The specified path should be the root directory of the bundle.
    ///
    /// This will validate that the directory is a bundle and error if not.
    /// Validation is limited to locating an `Info.plist` file, which is
    /// required for all bundle types.
    pub fn new_from_path(directory: &Path) -> Result<Self> {
        if !directory.is_dir() {
            return Err(anyhow!("{} is not a directory", directory.display()));
        }

        let root_name = directory
            .file_name()
            .ok_or_else(|| anyhow!("unable to resolve root directory name"))?
            .to_string_lossy()
            .to_string();

        let contents = directory.join("Contents");
        let shallow = !contents.is_dir();

        let app_plist = if shallow {
            directory.join("Info.plist")
        } else {
            contents.join("Info.plist")
        };

        let framework_plist = directory.join("Resources").join("Info.plist");

        let (package_type, info_plist_path) = if app_plist.is_file() {
            if root_name.ends_with(".app") {
                (BundlePackageType::App, app_plist)
            } else if root_name.ends_with(".appex") {
                (BundlePackageType::Appex, app_plist)
            } else {
                (BundlePackageType::Bundle, app_plist)
            }
        } else if framework_plist.is_file() {
            if root_name.ends_with(".framework") {
                (BundlePackageType::Framework, framework_plist)
            } else {
                (BundlePackageType::Bundle, framework_plist)
            }
        } else {
            return Err(anyhow!("Info.plist not found; not a valid bundle"));
        };

        let info_plist_data = std::fs::read(&info_plist_path)?;
        let cursor = std::io::Cursor::new(info_plist_data);
        let value = plist::Value::from_reader_xml(cursor).context("parsing Info.plist XML")?;
        let info_plist = value
            .into_dictionary()
            .ok_or_else(|| anyhow!("{} is not a dictionary", info_plist_path.display()))?;

        Ok(Self {
            root: directory.to_path_buf(),
            root_name,
            shallow,
            package_type,
            info_plist,
        })
    }

    /// Resolve the absolute path to a file in the bundle.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        if self.shallow {
            self.root.join(path.as_ref())
        } else {
            self.root.join("Contents").join(path.as_ref())
        }
    }

    /// The root directory of this bundle.
    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    /// The on-disk name of this bundle.
    ///
    /// This is effectively the directory name of the bundle. Contains the `.app`,
    /// `.framework`, etc suffix.
    pub fn name(&self) -> &str {
        &self.root_name
    }

    /// Whether this is a shallow bundle.
    ///
    /// If false, content is likely in a `Contents` directory.
    pub fn shallow(&self) -> bool {
        self.shallow
    }

    /// Obtain the path to the `Info.plist` file.
    pub fn info_plist_path(&self) -> PathBuf {
        match self.package_type {
            BundlePackageType::App | BundlePackageType::Appex | BundlePackageType::Bundle => {
                self.resolve_path("Info.plist")
            }
            BundlePackageType::Framework => self.root.join("Resources").join("Info.plist"),
        }
    }

    /// Obtain the parsed `Info.plist` file.
    pub fn info_plist(&self) -> &plist::Dictionary {
        &self.info_plist
    }

    /// Obtain an `Info.plist` key as a `String`.
    ///
    /// Will return `None` if the specified key doesn't exist. Errors if the key value
    /// is not a string.
    pub fn info_plist_key_string(&self, key: &str) -> Result<Option<String>> {
        if let Some(value) = self.info_plist.get(key) {
            Ok(Some(
                value
                    .as_string()
                    .ok_or_else(|| anyhow!("key {} is not a string", key))?
                    .to_string(),
            ))
        } else {
            Ok(None)
        }
    }

    /// Obtain the type of bundle.
    pub fn package_type(&self) -> BundlePackageType {
        self.package_type
    }

    /// Obtain the bundle display name.
    ///
    /// This retrieves the value of `CFBundleDisplayName` from the `Info.plist`.
    pub fn display_name(&self) -> Result<Option<String>> {
        self.info_plist_key_string("CFBundleDisplayName")
    }

    /// Obtain the bundle identifier.
    ///
    /// This retrieves `CFBundleIdentifier` from the `Info.plist`.
    pub fn identifier(&self) -> Result<Option<String>> {
        self.info_plist_key_string("CFBundleIdentifier")
    }

    /// Obtain the bundle version string.
    ///
    /// This retrieves `CFBundleVersion` from the `Info.plist`.
    pub fn version(&self) -> Result<Option<String>> {
        self.info_plist_key_string("CFBundleVersion")
    }

    /// Obtain the name of the bundle's main executable file.
    ///
    /// This retrieves `CFBundleExecutable` from the `Info.plist`.
    pub fn main_executable(&self) -> Result<Option<String>> {
        self.info_plist_key_string("CFBundleExecutable")
    }

    /// Obtain filenames of bundle icon files.
    ///
    /// This retrieves `CFBundleIconFiles` from the `Info.plist`.
    pub fn icon_files(&self) -> Result<Option<Vec<String>>> {
        if let Some(value) = self.info_plist.get("CFBundleIconFiles") {
            let values = value
                .as_array()
                .ok_or_else(|| anyhow!("CFBundleIconFiles not an array"))?;

            Ok(Some(
                values
                    .iter()
                    .map(|x| {
                        Ok(x.as_string()
                            .ok_or_else(|| anyhow!("CFBundleIconFiles value not a string"))?
                            .to_string())
                    })
                    .collect::<Result<Vec<_>>>()?,
            ))
        } else {
            Ok(None)
        }
    }

    /// Obtain the platforms this bundle declares support for.
    ///
    /// This retrieves `CFBundleSupportedPlatforms` from the `Info.plist` and
    /// parses each entry as an [ApplePlatform], silently dropping entries we
    /// don't recognize (e.g. `MacOSX`).
    pub fn supported_platforms(&self) -> Result<Vec<ApplePlatform>> {
        if let Some(value) = self.info_plist.get("CFBundleSupportedPlatforms") {
            let values = value
                .as_array()
                .ok_or_else(|| anyhow!("CFBundleSupportedPlatforms not an array"))?;

            Ok(values
                .iter()
                .filter_map(|v| v.as_string())
                .filter_map(ApplePlatform::from_str)
                .collect())
        } else {
            Ok(Vec::new())
        }
    }

    /// Whether this bundle declares support for an iOS device or simulator platform.
    pub fn is_ios_app_platform(&self) -> Result<bool> {
        Ok(self
            .supported_platforms()?
            .iter()
            .any(ApplePlatform::is_ios_family))
    }

    /// Obtain nested `Frameworks/*.framework` bundles, in deterministic order.
    pub fn nested_frameworks(&self) -> Result<Vec<(String, Self)>> {
        self.nested_bundles_under("Frameworks", |name| name.ends_with(".framework"))
    }

    /// Obtain nested `PlugIns/*.appex` bundles, in deterministic order.
    pub fn nested_plugins(&self) -> Result<Vec<(String, Self)>> {
        self.nested_bundles_under("PlugIns", |name| name.ends_with(".appex"))
    }

    /// Obtain nested `Watch/*.app` bundles, in deterministic order.
    pub fn nested_watch_apps(&self) -> Result<Vec<(String, Self)>> {
        self.nested_bundles_under("Watch", |name| name.ends_with(".app"))
    }

    /// Obtain loose `Frameworks/*.dylib` files (not wrapped in a `.framework`).
    pub fn nested_framework_dylibs(&self) -> Result<Vec<PathBuf>> {
        self.loose_dylibs_under("Frameworks")
    }

    /// Obtain loose `*.dylib` files directly in the bundle root.
    pub fn loose_dylibs(&self) -> Result<Vec<PathBuf>> {
        self.loose_dylibs_under("")
    }

    fn loose_dylibs_under(&self, subdir: &str) -> Result<Vec<PathBuf>> {
        let dir = if subdir.is_empty() {
            self.resolve_path("")
        } else {
            self.resolve_path(subdir)
        };

        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut paths = std::fs::read_dir(&dir)?
            .map(|entry| Ok(entry?.path()))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter(|p| {
                p.is_file()
                    && p.file_name()
                        .map(|n| n.to_string_lossy().ends_with(".dylib"))
                        .unwrap_or(false)
            })
            .collect::<Vec<_>>();

        paths.sort();

        Ok(paths)
    }

    fn nested_bundles_under(
        &self,
        subdir: &str,
        name_filter: impl Fn(&str) -> bool,
    ) -> Result<Vec<(String, Self)>> {
        let dir = self.resolve_path(subdir);

        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = std::fs::read_dir(&dir)?
            .map(|entry| Ok(entry?.path()))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter(|p| {
                p.is_dir()
                    && p.file_name()
                        .map(|n| name_filter(&n.to_string_lossy()))
                        .unwrap_or(false)
            })
            .collect::<Vec<_>>();

        entries.sort();

        entries
            .into_iter()
            .map(|p| {
                let bundle = Self::new_from_path(&p)?;
                let rel = bundle
                    .root
                    .strip_prefix(&self.root)
                    .expect("nested bundle should be in sub-directory of main");

                Ok((rel.to_string_lossy().to_string(), bundle))
            })
            .collect::<Result<Vec<_>>>()
    }

    /// Obtain all files within this bundle.
    ///
    /// The iteration order is deterministic.
    ///
    /// `traverse_nested` defines whether to traverse into nested bundles.
    pub fn files(&self, traverse_nested: bool) -> Result<Vec<DirectoryBundleFile<'_>>> {
        let nested_dirs = self
            .nested_bundles()?
            .into_iter()
            .map(|(_, bundle)| bundle.root_dir().to_path_buf())
            .collect::<Vec<_>>();

        Ok(walkdir::WalkDir::new(&self.root)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter()
            .map(|entry| {
                let entry = entry?;

                Ok(entry.path().to_path_buf())
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter_map(|path| {
                if path.is_dir()
                    || (!traverse_nested
                        && nested_dirs
                            .iter()
                            .any(|prefix| path.strip_prefix(prefix).is_ok()))
                {
                    None
                } else {
                    Some(DirectoryBundleFile::new(self, path))
                }
            })
            .collect::<Vec<_>>())
    }

    /// Obtain all files in this bundle as a [FileManifest].
    pub fn files_manifest(&self, traverse_nested: bool) -> Result<FileManifest> {
        let mut m = FileManifest::default();

        for f in self.files(traverse_nested)? {
            m.add_file_entry(f.relative_path(), f.as_file_entry()?)?;
        }

        Ok(m)
    }

    /// Obtain all nested bundles within this one.
    ///
    /// This walks the directory tree for directories that can be parsed
    /// as bundles.
    ///
    /// This will descend infinitely into nested bundles. i.e. we don't stop
    /// traversing directories when we encounter a bundle.
    pub fn nested_bundles(&self) -> Result<Vec<(String, Self)>> {
        Ok(walkdir::WalkDir::new(&self.root)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter()
            .map(|entry| {
                let entry = entry?;

                Ok(entry.path().to_path_buf())
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .filter_map(|p| {
                let file_name = p.file_name().map(|x| x.to_string_lossy());

                if p.is_dir() && file_name != Some("Contents".into()) && p != self.root {
                    if let Ok(bundle) = Self::new_from_path(&p) {
                        let rel = bundle
                            .root
                            .strip_prefix(&self.root)
                            .expect("nested bundle should be in sub-directory of main");

                        Some((rel.to_string_lossy().to_string(), bundle))
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .collect::<Vec<_>>())
    }
}

/// Represents a file in a [DirectoryBundle].
pub struct DirectoryBundleFile<'a> {
    bundle: &'a DirectoryBundle,
    absolute_path: PathBuf,
    relative_path: PathBuf,
}

impl<'a> DirectoryBundleFile<'a> {
    fn new(bundle: &'a DirectoryBundle, absolute_path: PathBuf) -> Self {
        let relative_path = absolute_path
            .strip_prefix(&bundle.root)
            .expect("path prefix strip should have worked")
            .to_path_buf();

        Self {
            bundle,
            absolute_path,
            relative_path,
        }
    }

    /// Absolute path to this file.
    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Relative path within the bundle to this file.
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Whether this is the `Info.plist` file.
    pub fn is_info_plist(&self) -> bool {
        self.absolute_path == self.bundle.info_plist_path()
    }

    /// Whether this is the main executable for the bundle.
    pub fn is_main_executable(&self) -> Result<bool> {
        if let Some(main) = self.bundle.main_executable()? {
            if self.bundle.shallow() {
                Ok(self.absolute_path == self.bundle.resolve_path(main))
            } else {
                Ok(self.absolute_path == self.bundle.resolve_path(format!("MacOS/{}", main)))
            }
        } else {
            Ok(false)
        }
    }

    /// Whether this file is in the code signature directory.
    pub fn is_in_code_signature_directory(&self) -> bool {
        let prefix = self.bundle.resolve_path("_CodeSignature");

        self.absolute_path.starts_with(&prefix)
    }

    /// Obtain the symlink target for this file.
    ///
    /// If `None`, the file is not a symlink.
    pub fn symlink_target(&self) -> Result<Option<PathBuf>> {
        let metadata = self.metadata()?;

        if metadata.file_type().is_symlink() {
            Ok(Some(std::fs::read_link(&self.absolute_path)?))
        } else {
            Ok(None)
        }
    }

    /// Obtain metadata for this file.
    pub fn metadata(&self) -> Result<std::fs::Metadata> {
        Ok(self.absolute_path.metadata()?)
    }

    /// Convert this instance to a [FileEntry].
    ///
    /// Symlinks are resolved to their target's content, as [FileEntry] has no
    /// notion of a symlink. Callers that need to special-case symlinks should
    /// consult [Self::symlink_target] directly.
    pub fn as_file_entry(&self) -> Result<FileEntry> {
        let metadata = self.metadata()?;

        Ok(FileEntry {
            data: FileData::from(self.absolute_path()),
            executable: is_executable(&metadata),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_info_plist(dir: &Path, extra: &str) {
        std::fs::write(
            dir.join("Info.plist"),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleIdentifier</key>
    <string>com.example.Test</string>
    <key>CFBundleExecutable</key>
    <string>Test</string>
    {}
</dict>
</plist>
"#,
                extra
            ),
        )
        .unwrap();
    }

    #[test]
    fn supported_platforms_parses_known_entries() {
        let td = tempfile::tempdir().unwrap();
        let app = td.path().join("Test.app");
        std::fs::create_dir_all(&app).unwrap();
        write_info_plist(
            &app,
            r#"<key>CFBundleSupportedPlatforms</key>
    <array>
        <string>iPhoneOS</string>
        <string>MacOSX</string>
    </array>"#,
        );

        let bundle = DirectoryBundle::new_from_path(&app).unwrap();
        let platforms = bundle.supported_platforms().unwrap();
        assert_eq!(platforms, vec![ApplePlatform::IPhoneOs]);
        assert!(bundle.is_ios_app_platform().unwrap());
    }

    #[test]
    fn no_supported_platforms_is_not_ios() {
        let td = tempfile::tempdir().unwrap();
        let app = td.path().join("Test.app");
        std::fs::create_dir_all(&app).unwrap();
        write_info_plist(&app, "");

        let bundle = DirectoryBundle::new_from_path(&app).unwrap();
        assert!(bundle.supported_platforms().unwrap().is_empty());
        assert!(!bundle.is_ios_app_platform().unwrap());
    }

    #[test]
    fn nested_plugins_frameworks_and_loose_dylibs_are_discovered() {
        let td = tempfile::tempdir().unwrap();
        let app = td.path().join("Test.app");
        std::fs::create_dir_all(&app).unwrap();
        write_info_plist(&app, "");

        let appex = app.join("PlugIns").join("Widget.appex");
        std::fs::create_dir_all(&appex).unwrap();
        write_info_plist(&appex, "");

        let framework_dir = app.join("Frameworks").join("Kit.framework");
        std::fs::create_dir_all(&framework_dir).unwrap();
        std::fs::write(framework_dir.join("Info.plist"), "").unwrap_or(());
        // Frameworks use a Resources/Info.plist; write both layouts to be safe.
        std::fs::create_dir_all(framework_dir.join("Resources")).unwrap();
        write_info_plist(&framework_dir, "");
        std::fs::write(framework_dir.join("Resources").join("Info.plist"), "").unwrap_or(());

        std::fs::write(app.join("Frameworks").join("loose.dylib"), b"").unwrap();
        std::fs::write(app.join("helper.dylib"), b"").unwrap();

        let bundle = DirectoryBundle::new_from_path(&app).unwrap();

        let plugins = bundle.nested_plugins().unwrap();
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].0, "PlugIns/Widget.appex");

        let dylibs = bundle.nested_framework_dylibs().unwrap();
        assert_eq!(dylibs.len(), 1);
        assert!(dylibs[0].ends_with("loose.dylib"));

        let loose = bundle.loose_dylibs().unwrap();
        assert_eq!(loose.len(), 1);
        assert!(loose[0].ends_with("helper.dylib"));
    }

    #[test]
    fn nested_watch_apps_are_discovered_before_signing_order_is_applied() {
        let td = tempfile::tempdir().unwrap();
        let app = td.path().join("Test.app");
        std::fs::create_dir_all(&app).unwrap();
        write_info_plist(&app, "");

        let watch_app = app.join("Watch").join("WatchCompanion.app");
        std::fs::create_dir_all(&watch_app).unwrap();
        write_info_plist(&watch_app, "");

        let bundle = DirectoryBundle::new_from_path(&app).unwrap();
        let watch_apps = bundle.nested_watch_apps().unwrap();
        assert_eq!(watch_apps.len(), 1);
        assert_eq!(watch_apps[0].0, "Watch/WatchCompanion.app");
    }
}
