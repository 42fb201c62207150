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

//! EC key pair generation through the parameter-driven `EVP_PKEY_generate` API.

use crate::ec::to_curve_cstring;
use crate::evp::PKey;
use crate::names::{EVP_PKEY_CTX_NAME_EC, OSSL_PKEY_PARAM_GROUP_NAME};
use crate::param::ParamBuilder;
use crate::pkey_ctx::PKeyCtx;
use core::ffi::CStr;
use log::{debug, error};
use ossl_ec_error::{Error, Result};

impl PKey {
    /// Generates a new EC key pair on the named curve `curve_name`, e.g. "P-256",
    /// "P-384" or "secp521r1".
    ///
    /// Unknown curve names, and names of groups that are not elliptic curves, are rejected by
    /// OpenSSL during the generation.
    pub fn generate_ec(curve_name: &str) -> Result<Self> {
        let curve = to_curve_cstring(curve_name)?;
        Self::generate_ec_cstr(&curve)
    }

    /// Same as `generate_ec`, for a curve name that is already a C string.
    pub fn generate_ec_cstr(curve_name: &CStr) -> Result<Self> {
        if curve_name.is_empty() {
            error!("The EC curve name is empty");
            return Err(Error::InvalidCurveName);
        }
        crate::init();
        let mut builder = ParamBuilder::new()?;
        builder.push_utf8_string(OSSL_PKEY_PARAM_GROUP_NAME, curve_name)?;
        let params = builder.to_params()?;

        let mut ctx = PKeyCtx::new_from_name(EVP_PKEY_CTX_NAME_EC)?;
        ctx.keygen_init()?;
        ctx.set_params(&params)?;
        let pkey = ctx.generate()?;
        debug!("Generated an EC key pair on {curve_name:?}");
        Ok(pkey)
    }

    /// Generates a new EC key pair on the named curve `curve_name` whose public point is
    /// compact representable, see `is_compact_representable`.
    ///
    /// Keys are regenerated until one qualifies, which takes two attempts on average.
    pub fn generate_ec_compact_representable(curve_name: &str) -> Result<Self> {
        let curve = to_curve_cstring(curve_name)?;
        let mut attempts = 1;
        loop {
            let pkey = Self::generate_ec_cstr(&curve)?;
            if pkey.is_compact_representable()? {
                debug!("Found a compact representable key after {attempts} attempt(s)");
                return Ok(pkey);
            }
            attempts += 1;
        }
    }
}

/// Generates a new EC key pair on the named curve `curve_name`.
///
/// Returns `None` on any failure. The OpenSSL error queue has been drained and logged by then.
pub fn generate_ec_keypair(curve_name: &str) -> Option<PKey> {
    PKey::generate_ec(curve_name)
        .map_err(|e| error!("Failed to generate an EC key pair on '{curve_name}': {e}"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::EVP_PKEY_KEYPAIR;

    #[test]
    fn c_string_and_str_names_are_equivalent() -> Result<()> {
        let from_str = PKey::generate_ec("P-384")?;
        let from_cstr = PKey::generate_ec_cstr(c"P-384")?;

        assert_eq!(from_str.group_name()?, from_cstr.group_name()?);
        assert!(from_cstr.has_selection(EVP_PKEY_KEYPAIR)?);
        Ok(())
    }

    #[test]
    fn compact_representable_keys_qualify() -> Result<()> {
        for _ in 0..8 {
            assert!(PKey::generate_ec_compact_representable("P-256")?.is_compact_representable()?);
        }
        Ok(())
    }

    #[test]
    fn empty_c_string_name_is_rejected_before_openssl() {
        assert_eq!(Some(Error::InvalidCurveName), PKey::generate_ec_cstr(c"").err());
    }
}
