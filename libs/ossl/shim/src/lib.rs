// Copyright 2024, The Android Open Source Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! C ABI exposing EC key pair generation and the OpenSSL 3 key management names that are only
//! available as preprocessor macros, for callers that cannot expand C macros.
//!
//! See `include/ec_gen_shim.h` for the C declarations.

use log::error;
use openssl_sys::EVP_PKEY;
use ossl_ec::{names, PKey};
use std::ffi::{c_char, c_int, CStr};
use std::ptr;

/// A `const char *` to a static, NUL terminated string.
#[repr(transparent)]
pub struct StaticCStr(*const c_char);

// SAFETY: The pointee is immutable static data.
unsafe impl Sync for StaticCStr {}

impl StaticCStr {
    const fn new(s: &'static CStr) -> Self {
        Self(s.as_ptr())
    }

    /// Returns the string the symbol points to.
    pub fn as_c_str(&self) -> &'static CStr {
        // SAFETY: The pointer was taken from a `&'static CStr` in `new`.
        unsafe { CStr::from_ptr(self.0) }
    }
}

/// EVP_PKEY_KEYPAIR
#[no_mangle]
pub static EVP_PKEY_KEYPAIR_W: c_int = names::EVP_PKEY_KEYPAIR;

/// EVP_PKEY_PUBLIC_KEY
#[no_mangle]
pub static EVP_PKEY_PUBLIC_KEY_W: c_int = names::EVP_PKEY_PUBLIC_KEY;

/// OSSL_PKEY_PARAM_GROUP_NAME
#[no_mangle]
pub static OSSL_PKEY_PARAM_GROUP_NAME_W: StaticCStr =
    StaticCStr::new(names::OSSL_PKEY_PARAM_GROUP_NAME);

/// OSSL_PKEY_PARAM_EC_POINT_CONVERSION_FORMAT
#[no_mangle]
pub static OSSL_PKEY_PARAM_EC_POINT_CONVERSION_FORMAT_W: StaticCStr =
    StaticCStr::new(names::OSSL_PKEY_PARAM_EC_POINT_CONVERSION_FORMAT);

/// OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_COMPRESSED
#[no_mangle]
pub static OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_COMPRESSED_W: StaticCStr =
    StaticCStr::new(names::OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_COMPRESSED);

/// OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_UNCOMPRESSED
#[no_mangle]
pub static OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_UNCOMPRESSED_W: StaticCStr =
    StaticCStr::new(names::OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_UNCOMPRESSED);

/// OSSL_PKEY_PARAM_PUB_KEY
#[no_mangle]
pub static OSSL_PKEY_PARAM_PUB_KEY_W: StaticCStr = StaticCStr::new(names::OSSL_PKEY_PARAM_PUB_KEY);

/// OSSL_PKEY_PARAM_PRIV_KEY
#[no_mangle]
pub static OSSL_PKEY_PARAM_PRIV_KEY_W: StaticCStr =
    StaticCStr::new(names::OSSL_PKEY_PARAM_PRIV_KEY);

/// Algorithm name of the EC key management, "EC".
#[no_mangle]
pub static EVP_PKEY_CTX_NAME_EC: StaticCStr = StaticCStr::new(names::EVP_PKEY_CTX_NAME_EC);

/// Generates a new EC key pair on the named curve `curve`, e.g. "P-256".
///
/// Returns the new key, which the caller owns and must release with `EVP_PKEY_free`, or null
/// on any failure. The failure is logged, and the OpenSSL error queue is left empty.
///
/// # Safety
///
/// `curve` must be null or point to a NUL terminated string that stays valid and unmodified
/// for the duration of the call.
#[allow(non_snake_case)]
#[no_mangle]
pub unsafe extern "C" fn EVP_EC_gen_wrapped(curve: *const c_char) -> *mut EVP_PKEY {
    if curve.is_null() {
        error!("EVP_EC_gen_wrapped called with a null curve name");
        return ptr::null_mut();
    }
    // SAFETY: Guaranteed by the caller, see above. The string is not retained.
    let curve = unsafe { CStr::from_ptr(curve) };
    match PKey::generate_ec_cstr(curve) {
        Ok(pkey) => pkey.into_raw(),
        Err(e) => {
            error!("Failed to generate an EC key pair on {curve:?}: {e}");
            ptr::null_mut()
        }
    }
}
