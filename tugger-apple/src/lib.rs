// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Functionality related to Apple platforms.

pub mod macho;

pub use macho::{create_universal_macho, UniversalMachOError};
