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

//! Wrappers of the EVP_PKEY functions in OpenSSL evp.h.

use crate::ec::{to_curve_cstring, BigNum, EcGroup, ZVec};
use crate::names::{
    EVP_PKEY_CTX_NAME_EC, EVP_PKEY_KEYPAIR, EVP_PKEY_PUBLIC_KEY, OSSL_KEYMGMT_SELECT_PRIVATE_KEY,
    OSSL_KEYMGMT_SELECT_PUBLIC_KEY, OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_COMPRESSED,
    OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_UNCOMPRESSED, OSSL_PKEY_PARAM_EC_POINT_CONVERSION_FORMAT,
    OSSL_PKEY_PARAM_GROUP_NAME, OSSL_PKEY_PARAM_PRIV_KEY, OSSL_PKEY_PARAM_PUB_KEY,
};
use crate::param::{ParamBuilder, Params};
use crate::pkey_ctx::PKeyCtx;
use crate::sys::{
    EVP_PKEY_dup, EVP_PKEY_free, EVP_PKEY_get_bn_param, EVP_PKEY_get_octet_string_param,
    EVP_PKEY_get_utf8_string_param, EVP_PKEY_set_utf8_string_param, EVP_PKEY_todata,
};
use crate::util::{check_int_result, check_ptr};
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::ffi::{c_int, CStr};
use core::mem::ManuallyDrop;
use core::ptr::{self, NonNull};
use log::error;
use openssl_sys::EVP_PKEY;
use ossl_ec_error::{ApiName, Error, Result};

/// Encoding of a serialized EC point, see SEC 1 section 2.3.3.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointConversionForm {
    /// `02 || X` or `03 || X`, depending on the parity of Y.
    Compressed,
    /// `04 || X || Y`.
    Uncompressed,
}

impl PointConversionForm {
    fn param_value(self) -> &'static CStr {
        match self {
            Self::Compressed => OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_COMPRESSED,
            Self::Uncompressed => OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_UNCOMPRESSED,
        }
    }

    /// Returns the length of a point of a curve whose coordinates take `coordinate_size` bytes.
    pub fn point_len(self, coordinate_size: usize) -> usize {
        match self {
            Self::Compressed => 1 + coordinate_size,
            Self::Uncompressed => 1 + 2 * coordinate_size,
        }
    }
}

/// Wrapper of an `EVP_PKEY` object, representing a public key or a key pair.
///
/// The wrapper owns one reference to the key and releases it exactly once when dropped.
pub struct PKey(NonNull<EVP_PKEY>);

impl Drop for PKey {
    fn drop(&mut self) {
        // SAFETY: It is safe because `EVP_PKEY` has been allocated by OpenSSL and isn't
        // used after this.
        unsafe { EVP_PKEY_free(self.0.as_ptr()) }
    }
}

// SAFETY: Provider-backed keys are immutable once created, and OpenSSL 3 guards the
// internal key data and the reference count with its own locks.
unsafe impl Send for PKey {}
// SAFETY: See above. All the methods taking `&self` only read the key.
unsafe impl Sync for PKey {}

impl PKey {
    pub(crate) fn from_non_null(pkey: NonNull<EVP_PKEY>) -> Self {
        Self(pkey)
    }

    /// Takes ownership of a raw `EVP_PKEY` pointer. Returns `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// A non-null `pkey` must point to a valid `EVP_PKEY` whose reference is transferred to
    /// the returned instance.
    pub unsafe fn from_raw(pkey: *mut EVP_PKEY) -> Option<Self> {
        NonNull::new(pkey).map(Self)
    }

    /// Releases ownership of the key to the caller, who must free it with `EVP_PKEY_free`.
    pub fn into_raw(self) -> *mut EVP_PKEY {
        ManuallyDrop::new(self).0.as_ptr()
    }

    pub(crate) fn as_ptr(&self) -> *mut EVP_PKEY {
        self.0.as_ptr()
    }

    /// Imports an EC public key of the curve `curve_name` from an encoded point, compressed or
    /// uncompressed, and validates it.
    pub fn from_public_key(curve_name: &str, public_key: &[u8]) -> Result<Self> {
        crate::init();
        let curve = to_curve_cstring(curve_name)?;
        let mut builder = ParamBuilder::new()?;
        builder.push_utf8_string(OSSL_PKEY_PARAM_GROUP_NAME, &curve)?;
        builder.push_octet_string(OSSL_PKEY_PARAM_PUB_KEY, public_key)?;
        let mut params = builder.to_params()?;

        let mut ctx = PKeyCtx::new_from_name(EVP_PKEY_CTX_NAME_EC)?;
        ctx.fromdata_init()?;
        let pkey = ctx.fromdata(EVP_PKEY_PUBLIC_KEY, &mut params)?;

        let mut validation_ctx = PKeyCtx::new_from_pkey(&pkey)?;
        validation_ctx.param_check()?;
        validation_ctx.public_check()?;
        Ok(pkey)
    }

    /// Imports an uncompressed public key in ANSI X9.62 form `04 || X || Y`.
    pub fn from_x962_public_key(curve_name: &str, x962: &[u8]) -> Result<Self> {
        check_point_len(curve_name, x962, PointConversionForm::Uncompressed)?;
        Self::from_public_key(curve_name, x962)
    }

    /// Imports a compressed public key `02 || X` or `03 || X`.
    pub fn from_compact_public_key(curve_name: &str, compact: &[u8]) -> Result<Self> {
        check_point_len(curve_name, compact, PointConversionForm::Compressed)?;
        Self::from_public_key(curve_name, compact)
    }

    /// Imports an EC key pair of the curve `curve_name` from its big-endian private scalar.
    ///
    /// The scalar takes at most as many bytes as a coordinate of the curve. The public key is
    /// derived from it, and the pair is checked before being returned.
    pub fn from_private_key(curve_name: &str, raw: &[u8]) -> Result<Self> {
        crate::init();
        let group = EcGroup::from_curve_name(curve_name)?;
        let coordinate_size = group.coordinate_byte_count()?;
        if raw.len() > coordinate_size {
            error!(
                "The size of the private key '{}' exceeds the coordinate size '{}'",
                raw.len(),
                coordinate_size
            );
            return Err(Error::IncorrectParameterSize);
        }
        let scalar = BigNum::from_slice(raw)?;
        let public_key = group.mul_generator(&scalar)?;

        let curve = to_curve_cstring(curve_name)?;
        let mut builder = ParamBuilder::new()?;
        builder.push_utf8_string(OSSL_PKEY_PARAM_GROUP_NAME, &curve)?;
        builder.push_bn(OSSL_PKEY_PARAM_PRIV_KEY, &scalar)?;
        builder.push_octet_string(OSSL_PKEY_PARAM_PUB_KEY, &public_key)?;
        let mut params = builder.to_params()?;

        let mut ctx = PKeyCtx::new_from_name(EVP_PKEY_CTX_NAME_EC)?;
        ctx.fromdata_init()?;
        let pkey = ctx.fromdata(EVP_PKEY_KEYPAIR, &mut params)?;
        // Rejects a zero scalar and scalars not below the order.
        pkey.check_pairwise()?;
        Ok(pkey)
    }

    /// Imports an EC key pair in the form `04 || X || Y || K`, where `K` is the private scalar
    /// padded to the coordinate size. The key pair is rebuilt from `K` alone.
    pub fn from_x962_private_key(curve_name: &str, x962: &[u8]) -> Result<Self> {
        let coordinate_size = EcGroup::from_curve_name(curve_name)?.coordinate_byte_count()?;
        let expected_len = 3 * coordinate_size + 1;
        if x962.len() != expected_len {
            error!(
                "The size of the private key '{}' does not match the expected size '{}'",
                x962.len(),
                expected_len
            );
            return Err(Error::IncorrectParameterSize);
        }
        Self::from_private_key(curve_name, &x962[1 + 2 * coordinate_size..])
    }

    /// Returns the name of the curve group of the key, as reported by the provider
    /// (e.g. "prime256v1" for a key generated with "P-256").
    pub fn group_name(&self) -> Result<String> {
        // OSSL_MAX_NAME_SIZE is 50, leave room for the terminator.
        const CAPACITY: usize = 64;
        let mut buf = [0u8; CAPACITY];
        let mut len = 0;
        // SAFETY: The key is valid. The function writes at most `CAPACITY` bytes into `buf`
        // and the length of the name into `len`.
        let ret = unsafe {
            EVP_PKEY_get_utf8_string_param(
                self.0.as_ptr(),
                OSSL_PKEY_PARAM_GROUP_NAME.as_ptr(),
                buf.as_mut_ptr().cast(),
                buf.len(),
                &mut len,
            )
        };
        check_int_result(ret, ApiName::EVP_PKEY_get_utf8_string_param)?;
        let name = buf.get(..len).ok_or(Error::InternalError)?;
        String::from_utf8(name.to_vec()).map_err(|e| {
            error!("The group name is not valid UTF-8: {e}");
            Error::InternalError
        })
    }

    /// Returns the public point of the key encoded in `form`.
    ///
    /// The conversion format is set on a duplicate of the key, this key is left untouched.
    pub fn public_key(&self, form: PointConversionForm) -> Result<Vec<u8>> {
        let dup = self.try_clone()?;
        // SAFETY: The duplicate is valid and exclusively owned here. Both strings are NUL
        // terminated and only read.
        let ret = unsafe {
            EVP_PKEY_set_utf8_string_param(
                dup.0.as_ptr(),
                OSSL_PKEY_PARAM_EC_POINT_CONVERSION_FORMAT.as_ptr(),
                form.param_value().as_ptr(),
            )
        };
        check_int_result(ret, ApiName::EVP_PKEY_set_utf8_string_param)?;
        dup.octet_string_param(OSSL_PKEY_PARAM_PUB_KEY)
    }

    /// Returns the private scalar of the key.
    pub fn private_key(&self) -> Result<BigNum> {
        let mut bn = ptr::null_mut();
        // SAFETY: The key is valid. On success a newly allocated `BIGNUM`, which we take
        // ownership of, is written to `bn`.
        let ret = unsafe {
            EVP_PKEY_get_bn_param(self.0.as_ptr(), OSSL_PKEY_PARAM_PRIV_KEY.as_ptr(), &mut bn)
        };
        check_int_result(ret, ApiName::EVP_PKEY_get_bn_param)?;
        check_ptr(bn, ApiName::EVP_PKEY_get_bn_param).map(BigNum::from_non_null)
    }

    /// Returns the private scalar as big-endian bytes, left-padded to the coordinate size of
    /// the curve.
    pub fn private_key_bytes(&self) -> Result<ZVec> {
        let group = EcGroup::from_curve_name(&self.group_name()?)?;
        let scalar = self.private_key()?;
        Ok(scalar.to_padded_vec(group.coordinate_byte_count()?)?.into())
    }

    /// Returns whether the Y coordinate of the public point is the smaller of `y` and `p - y`.
    /// Such a point is fully determined by its X coordinate alone.
    pub fn is_compact_representable(&self) -> Result<bool> {
        let group = EcGroup::from_curve_name(&self.group_name()?)?;
        let coordinate_size = group.coordinate_byte_count()?;
        let point = self.public_key(PointConversionForm::Uncompressed)?;
        let y = point.get(1 + coordinate_size..).ok_or(Error::InternalError)?;
        let y = BigNum::from_slice(y)?;
        let negated_y = group.field_prime()?.try_sub(&y)?;
        Ok(y <= negated_y)
    }

    /// Returns whether the key holds every component named by `selection`, e.g.
    /// `EVP_PKEY_KEYPAIR` for both the private and the public key.
    pub fn has_selection(&self, selection: c_int) -> Result<bool> {
        let params = self.to_params(selection)?;
        let has_private = selection & OSSL_KEYMGMT_SELECT_PRIVATE_KEY == 0
            || params.contains(OSSL_PKEY_PARAM_PRIV_KEY);
        let has_public = selection & OSSL_KEYMGMT_SELECT_PUBLIC_KEY == 0
            || params.contains(OSSL_PKEY_PARAM_PUB_KEY);
        Ok(has_private && has_public)
    }

    /// Checks that the private and the public components of the key pair match.
    pub fn check_pairwise(&self) -> Result<()> {
        PKeyCtx::new_from_pkey(self)?.pairwise_check()
    }

    /// Computes the ECDH shared secret between this key pair and the public key of `peer`.
    ///
    /// The secret is the X coordinate of the shared point, as long as a coordinate of the curve.
    pub fn derive_shared_secret(&self, peer: &PKey) -> Result<ZVec> {
        let mut ctx = PKeyCtx::new_from_pkey(self)?;
        ctx.derive_init()?;
        ctx.derive_set_peer(peer)?;
        ctx.derive()
    }

    /// Exports the `selection` components of the key.
    fn to_params(&self, selection: c_int) -> Result<Params> {
        let mut params = ptr::null_mut();
        // SAFETY: The key is valid. On success a newly allocated params array, which we take
        // ownership of, is written to `params`.
        let ret = unsafe { EVP_PKEY_todata(self.0.as_ptr(), selection, &mut params) };
        check_int_result(ret, ApiName::EVP_PKEY_todata)?;
        let params = check_ptr(params, ApiName::EVP_PKEY_todata)?;
        // SAFETY: The array has just been allocated by `EVP_PKEY_todata` for us.
        Ok(unsafe { Params::from_raw(params) })
    }

    fn octet_string_param(&self, key: &CStr) -> Result<Vec<u8>> {
        let mut len = 0;
        // SAFETY: The key is valid. A null buffer asks for the length of the value only.
        let ret = unsafe {
            EVP_PKEY_get_octet_string_param(
                self.0.as_ptr(),
                key.as_ptr(),
                ptr::null_mut(),
                0,
                &mut len,
            )
        };
        check_int_result(ret, ApiName::EVP_PKEY_get_octet_string_param)?;

        let mut buf = vec![0u8; len];
        // SAFETY: The function writes at most `buf.len()` bytes into `buf` and the number
        // of bytes written into `len`.
        let ret = unsafe {
            EVP_PKEY_get_octet_string_param(
                self.0.as_ptr(),
                key.as_ptr(),
                buf.as_mut_ptr(),
                buf.len(),
                &mut len,
            )
        };
        check_int_result(ret, ApiName::EVP_PKEY_get_octet_string_param)?;
        buf.truncate(len);
        Ok(buf)
    }

    /// Returns a deep copy of the key.
    fn try_clone(&self) -> Result<Self> {
        // SAFETY: The key is valid and only read. The returned pointer is checked below.
        let dup = unsafe { EVP_PKEY_dup(self.0.as_ptr()) };
        check_ptr(dup, ApiName::EVP_PKEY_dup).map(Self)
    }
}

fn check_point_len(curve_name: &str, point: &[u8], form: PointConversionForm) -> Result<()> {
    let coordinate_size = EcGroup::from_curve_name(curve_name)?.coordinate_byte_count()?;
    let expected_len = form.point_len(coordinate_size);
    if point.len() == expected_len {
        Ok(())
    } else {
        error!(
            "The size of the {:?} point '{}' does not match the expected size '{}'",
            form,
            point.len(),
            expected_len
        );
        Err(Error::IncorrectParameterSize)
    }
}
