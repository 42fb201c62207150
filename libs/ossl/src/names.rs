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

//! Key selectors and parameter names that OpenSSL 3 only defines as preprocessor macros in
//! `core_names.h`, `core_dispatch.h` and `evp.h`.
//!
//! The values must match the headers of the `libcrypto` linked at runtime. A parameter name
//! the provider does not recognize is silently ignored.

use core::ffi::{c_int, CStr};

/// OSSL_KEYMGMT_SELECT_PRIVATE_KEY
pub const OSSL_KEYMGMT_SELECT_PRIVATE_KEY: c_int = 0x01;
/// OSSL_KEYMGMT_SELECT_PUBLIC_KEY
pub const OSSL_KEYMGMT_SELECT_PUBLIC_KEY: c_int = 0x02;
const OSSL_KEYMGMT_SELECT_DOMAIN_PARAMETERS: c_int = 0x04;
const OSSL_KEYMGMT_SELECT_OTHER_PARAMETERS: c_int = 0x80;
const OSSL_KEYMGMT_SELECT_ALL_PARAMETERS: c_int =
    OSSL_KEYMGMT_SELECT_DOMAIN_PARAMETERS | OSSL_KEYMGMT_SELECT_OTHER_PARAMETERS;

/// EVP_PKEY_KEY_PARAMETERS
pub const EVP_PKEY_KEY_PARAMETERS: c_int = OSSL_KEYMGMT_SELECT_ALL_PARAMETERS;
/// EVP_PKEY_PUBLIC_KEY
pub const EVP_PKEY_PUBLIC_KEY: c_int = EVP_PKEY_KEY_PARAMETERS | OSSL_KEYMGMT_SELECT_PUBLIC_KEY;
/// EVP_PKEY_KEYPAIR
pub const EVP_PKEY_KEYPAIR: c_int = EVP_PKEY_PUBLIC_KEY | OSSL_KEYMGMT_SELECT_PRIVATE_KEY;

/// OSSL_PKEY_PARAM_GROUP_NAME
pub const OSSL_PKEY_PARAM_GROUP_NAME: &CStr = c"group";
/// OSSL_PKEY_PARAM_EC_POINT_CONVERSION_FORMAT
pub const OSSL_PKEY_PARAM_EC_POINT_CONVERSION_FORMAT: &CStr = c"point-format";
/// OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_COMPRESSED
pub const OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_COMPRESSED: &CStr = c"compressed";
/// OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_UNCOMPRESSED
pub const OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_UNCOMPRESSED: &CStr = c"uncompressed";
/// OSSL_PKEY_PARAM_PUB_KEY
pub const OSSL_PKEY_PARAM_PUB_KEY: &CStr = c"pub";
/// OSSL_PKEY_PARAM_PRIV_KEY
pub const OSSL_PKEY_PARAM_PRIV_KEY: &CStr = c"priv";

/// Name of the EC key management in the default provider. `evp.h` has no macro for it.
pub const EVP_PKEY_CTX_NAME_EC: &CStr = c"EC";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_match_the_openssl_headers() {
        assert_eq!(0x84, EVP_PKEY_KEY_PARAMETERS);
        assert_eq!(0x86, EVP_PKEY_PUBLIC_KEY);
        assert_eq!(0x87, EVP_PKEY_KEYPAIR);
        assert_eq!(EVP_PKEY_KEYPAIR & OSSL_KEYMGMT_SELECT_PRIVATE_KEY, OSSL_KEYMGMT_SELECT_PRIVATE_KEY);
        assert_eq!(EVP_PKEY_PUBLIC_KEY & OSSL_KEYMGMT_SELECT_PRIVATE_KEY, 0);
    }

    #[test]
    fn parameter_names_are_byte_identical() {
        assert_eq!(b"group\0", OSSL_PKEY_PARAM_GROUP_NAME.to_bytes_with_nul());
        assert_eq!(b"point-format\0", OSSL_PKEY_PARAM_EC_POINT_CONVERSION_FORMAT.to_bytes_with_nul());
        assert_eq!(b"compressed\0", OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_COMPRESSED.to_bytes_with_nul());
        assert_eq!(
            b"uncompressed\0",
            OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_UNCOMPRESSED.to_bytes_with_nul()
        );
        assert_eq!(b"pub\0", OSSL_PKEY_PARAM_PUB_KEY.to_bytes_with_nul());
        assert_eq!(b"priv\0", OSSL_PKEY_PARAM_PRIV_KEY.to_bytes_with_nul());
        assert_eq!(b"EC\0", EVP_PKEY_CTX_NAME_EC.to_bytes_with_nul());
    }
}
