// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interfaces for interacting with Apple bundle filesystem layouts.
//!
//! A *bundle* is a directory with a well-known layout and an `Info.plist`
//! manifest. This crate knows how to open one from disk, answer questions
//! about its `Info.plist`, and enumerate the nested bundles (frameworks,
//! app extensions, watch apps) and loose dynamic libraries it contains.

mod directory_bundle;

pub use directory_bundle::{DirectoryBundle, DirectoryBundleFile};

/// The flavor of bundle, as inferred from its directory suffix and `Info.plist`.
///
/// iOS application archives are built from a small, fixed set of these:
/// the main `.app`, `.framework` bundles it embeds, `.appex` app extensions,
/// and (recursively) further `.app` bundles nested under `Watch/`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum BundlePackageType {
    /// An application bundle (`.app`).
    App,
    /// A framework bundle (`.framework`).
    Framework,
    /// An app extension bundle (`.appex`).
    Appex,
    /// Some other bundle type we don't have a specialization for.
    Bundle,
}

/// The platform identifiers Apple uses in `CFBundleSupportedPlatforms`.
///
/// Only the iOS device and simulator platforms are meaningful to this crate;
/// everything else (macOS, tvOS, etc) is out of scope for re-signing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ApplePlatform {
    IPhoneOs,
    IPhoneSimulator,
    WatchOs,
    WatchSimulator,
}

impl ApplePlatform {
    /// Parse a `CFBundleSupportedPlatforms` string value.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "iPhoneOS" => Some(Self::IPhoneOs),
            "iPhoneSimulator" => Some(Self::IPhoneSimulator),
            "WatchOS" => Some(Self::WatchOs),
            "WatchSimulator" => Some(Self::WatchSimulator),
            _ => None,
        }
    }

    /// Whether this platform is a recognized iOS device/simulator platform.
    pub fn is_ios_family(&self) -> bool {
        matches!(
            self,
            Self::IPhoneOs | Self::IPhoneSimulator | Self::WatchOs | Self::WatchSimulator
        )
    }
}
