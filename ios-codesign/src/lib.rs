// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Re-signing iOS application bundles.
//!
//! This crate implements the machinery needed to take an already-signed (or
//! ad-hoc signed) iOS `.ipa`/`.app`/app-directory and produce a copy re-signed
//! with a different distribution certificate and provisioning profile,
//! without requiring a macOS host or access to Apple's `codesign` binary.
//!
//! Apple code signing is complex and underdocumented. This crate builds on
//! Rust's ecosystem crates for Mach-O parsing ([goblin]), ASN.1/CMS handling
//! ([cryptographic_message_syntax], [x509_certificate]), and property list
//! handling ([plist]) rather than hand-rolled parsers.
//!
//! # Features and Capabilities
//!
//! * Find code signature data embedded in Mach-O binaries (both single-arch
//!   and fat/universal binaries). (See [AppleSignable] and its methods.)
//! * Deeply parse code signature data into Rust structs. (See
//!   [EmbeddedSignature], [BlobData], and [CodeDirectoryBlob].)
//! * Parse and build RFC 5652 Cryptographic Message Syntax (CMS) signature
//!   data. (Functionality provided by the `cryptographic-message-syntax`
//!   crate, developed alongside this one.)
//! * Generate new embedded signature data, cryptographically signed with any
//!   key and X.509 certificate chain supplied by the caller. (See
//!   [MachOSigner] and [BundleSigner].)
//! * Resolve which identifier and entitlements a nested bundle, framework, or
//!   loose dylib should receive during a deep re-sign. (See
//!   [identifier_matcher] and [provisioner].)
//! * Parse `CodeResources` XML plist files describing sealed resources within
//!   a bundle, including the rule-based filtering they define.
//! * Sign entire bundles: nested bundles and loose Mach-O binaries are signed
//!   in dependency order and a fresh `CodeResources` plist is produced.
//! * Detect and repackage the three container shapes iOS apps are
//!   distributed in: `.ipa` archives, bare `.app` zip files, and unpacked
//!   `.app` directories. (See [archive].)
//!
//! There are a number of things this crate deliberately does not do:
//!
//! * Validate a signature the way Apple's operating systems do at launch
//!   time. We produce correctly-shaped signature data and can describe what a
//!   signature contains, but we don't reimplement the OS's trust policy.
//! * Speak to Apple's notarization or App Store Connect services, or staple
//!   tickets. Those are distribution concerns orthogonal to re-signing.
//! * Read or write macOS-only containers (`.pkg`/XAR, DMG). The bundles this
//!   crate handles are iOS application bundles.
//!
//! # Getting Started
//!
//! [archive::ResignCoordinator] is the entry point most callers want: give it
//! an input container path, a [signing_settings::SigningSettings], and an
//! output path, and it takes care of container detection, bundle walking, and
//! writing the result.
//!
//! [UnifiedSigner] and [BundleSigner] are the lower-level primitives that
//! operate directly on an already-unpacked bundle or a single Mach-O file.

mod apple_certificates;
pub use apple_certificates::*;
pub mod archive;
mod bundle_signing;
pub use bundle_signing::*;
mod certificate;
pub use certificate::*;
mod code_directory;
pub use code_directory::*;
mod code_hash;
pub use code_hash::*;
pub mod code_requirement;
pub use code_requirement::*;
mod code_resources;
pub use code_resources::*;
mod cryptography;
pub use cryptography::*;
pub mod embedded_signature;
pub use embedded_signature::*;
pub mod embedded_signature_builder;
pub use embedded_signature_builder::*;
pub mod entitlements;
mod error;
pub use error::*;
pub mod identifier_matcher;
pub use identifier_matcher::*;
mod macho;
pub use macho::*;
mod macho_signing;
pub use macho_signing::*;
mod openssl_shell;
pub use openssl_shell::*;
mod policy;
pub use policy::*;
pub mod provisioner;
pub use provisioner::*;
mod reader;
pub use reader::*;
mod remote_signing;
pub use remote_signing::*;
mod signing_settings;
pub use signing_settings::*;
mod signing;
pub use signing::*;
pub mod specification;
