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

//! Wrappers of the `OSSL_PARAM` builder API in OpenSSL param_build.h.

use crate::ec::BigNum;
use crate::sys::{
    OSSL_PARAM_BLD_free, OSSL_PARAM_BLD_new, OSSL_PARAM_BLD_push_BN,
    OSSL_PARAM_BLD_push_octet_string, OSSL_PARAM_BLD_push_utf8_string, OSSL_PARAM_BLD_to_param,
    OSSL_PARAM_free, OSSL_PARAM_locate, OSSL_PARAM, OSSL_PARAM_BLD,
};
use crate::util::{check_int_result, check_ptr};
use core::ffi::{c_void, CStr};
use core::marker::PhantomData;
use core::ptr::NonNull;
use ossl_ec_error::{ApiName, Result};

/// Wrapper of an `OSSL_PARAM_BLD` object.
///
/// The builder keeps pointers to the pushed keys and values until `to_params()` copies them,
/// so the values must outlive the builder.
pub(crate) struct ParamBuilder<'a> {
    bld: NonNull<OSSL_PARAM_BLD>,
    _values: PhantomData<&'a [u8]>,
}

impl<'a> Drop for ParamBuilder<'a> {
    fn drop(&mut self) {
        // SAFETY: The builder has been allocated by `OSSL_PARAM_BLD_new` and isn't used
        // after this.
        unsafe { OSSL_PARAM_BLD_free(self.bld.as_ptr()) }
    }
}

impl<'a> ParamBuilder<'a> {
    /// Creates an empty builder.
    pub(crate) fn new() -> Result<Self> {
        // SAFETY: The returned pointer is checked below.
        let bld = unsafe { OSSL_PARAM_BLD_new() };
        let bld = check_ptr(bld, ApiName::OSSL_PARAM_BLD_new)?;
        Ok(Self { bld, _values: PhantomData })
    }

    /// Adds a UTF-8 string entry `key` → `value`.
    pub(crate) fn push_utf8_string(&mut self, key: &'static CStr, value: &'a CStr) -> Result<()> {
        // A size of zero lets OpenSSL compute the length of the NUL terminated value.
        let bsize = 0;
        // SAFETY: Both strings are NUL terminated. `key` is static and `value` outlives the
        // builder, so the pointers retained by the builder stay valid until `to_params()`.
        let ret = unsafe {
            OSSL_PARAM_BLD_push_utf8_string(self.bld.as_ptr(), key.as_ptr(), value.as_ptr(), bsize)
        };
        check_int_result(ret, ApiName::OSSL_PARAM_BLD_push_utf8_string)
    }

    /// Adds an octet string entry `key` → `value`.
    pub(crate) fn push_octet_string(&mut self, key: &'static CStr, value: &'a [u8]) -> Result<()> {
        // SAFETY: The builder only reads `value` within its bounds, and `value` outlives the
        // builder.
        let ret = unsafe {
            OSSL_PARAM_BLD_push_octet_string(
                self.bld.as_ptr(),
                key.as_ptr(),
                value.as_ptr() as *const c_void,
                value.len(),
            )
        };
        check_int_result(ret, ApiName::OSSL_PARAM_BLD_push_octet_string)
    }

    /// Adds an unsigned integer entry `key` → `value`.
    pub(crate) fn push_bn(&mut self, key: &'static CStr, value: &'a BigNum) -> Result<()> {
        // SAFETY: `key` is static and `value` outlives the builder, which only reads it.
        let ret =
            unsafe { OSSL_PARAM_BLD_push_BN(self.bld.as_ptr(), key.as_ptr(), value.as_ptr()) };
        check_int_result(ret, ApiName::OSSL_PARAM_BLD_push_BN)
    }

    /// Materializes the pushed entries into an immutable `Params`, consuming the builder.
    pub(crate) fn to_params(self) -> Result<Params> {
        // SAFETY: The builder is valid. All the pushed values are copied into the returned
        // allocation, which is checked below.
        let params = unsafe { OSSL_PARAM_BLD_to_param(self.bld.as_ptr()) };
        let params = check_ptr(params, ApiName::OSSL_PARAM_BLD_to_param)?;
        Ok(Params(params))
    }
}

/// Wrapper of an owned, end-terminated `OSSL_PARAM` array.
pub(crate) struct Params(NonNull<OSSL_PARAM>);

impl Drop for Params {
    fn drop(&mut self) {
        // SAFETY: The array has been allocated by OpenSSL and isn't used after this.
        unsafe { OSSL_PARAM_free(self.0.as_ptr()) }
    }
}

impl Params {
    /// Takes ownership of an `OSSL_PARAM` array allocated by OpenSSL.
    ///
    /// # Safety
    ///
    /// `params` must be an end-terminated array that can be freed with `OSSL_PARAM_free`, and
    /// must not be used by the caller afterwards.
    pub(crate) unsafe fn from_raw(params: NonNull<OSSL_PARAM>) -> Self {
        Self(params)
    }

    /// Returns whether the array has an entry named `key`.
    pub(crate) fn contains(&self, key: &CStr) -> bool {
        // SAFETY: The array is end-terminated and `key` is NUL terminated. The function only
        // reads both.
        let p = unsafe { OSSL_PARAM_locate(self.0.as_ptr(), key.as_ptr()) };
        !p.is_null()
    }

    pub(crate) fn as_ptr(&self) -> *const OSSL_PARAM {
        self.0.as_ptr()
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut OSSL_PARAM {
        self.0.as_ptr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::{
        OSSL_PKEY_PARAM_GROUP_NAME, OSSL_PKEY_PARAM_PRIV_KEY, OSSL_PKEY_PARAM_PUB_KEY,
    };

    #[test]
    fn built_params_contain_the_pushed_keys() -> Result<()> {
        crate::init();
        let mut builder = ParamBuilder::new()?;
        builder.push_utf8_string(OSSL_PKEY_PARAM_GROUP_NAME, c"P-256")?;
        let params = builder.to_params()?;

        assert!(params.contains(OSSL_PKEY_PARAM_GROUP_NAME));
        assert!(!params.contains(OSSL_PKEY_PARAM_PUB_KEY));
        Ok(())
    }

    #[test]
    fn empty_builder_yields_empty_params() -> Result<()> {
        crate::init();
        let params = ParamBuilder::new()?.to_params()?;

        assert!(!params.contains(OSSL_PKEY_PARAM_GROUP_NAME));
        Ok(())
    }

    #[test]
    fn big_numbers_can_be_pushed() -> Result<()> {
        crate::init();
        let scalar = BigNum::from_slice(&[0x01, 0x02])?;
        let mut builder = ParamBuilder::new()?;
        builder.push_bn(OSSL_PKEY_PARAM_PRIV_KEY, &scalar)?;
        let params = builder.to_params()?;

        assert!(params.contains(OSSL_PKEY_PARAM_PRIV_KEY));
        Ok(())
    }

    #[test]
    fn octet_strings_are_copied() -> Result<()> {
        crate::init();
        let params = {
            let point = [0x04u8; 65];
            let mut builder = ParamBuilder::new()?;
            builder.push_octet_string(OSSL_PKEY_PARAM_PUB_KEY, &point)?;
            builder.to_params()?
        };

        assert!(params.contains(OSSL_PKEY_PARAM_PUB_KEY));
        Ok(())
    }
}
