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

//! Wrapper of the `EVP_PKEY_CTX` operations in OpenSSL evp.h.

use crate::ec::ZVec;
use crate::evp::PKey;
use crate::param::Params;
use crate::sys::{
    EVP_PKEY_CTX_free, EVP_PKEY_CTX_new_from_name, EVP_PKEY_CTX_new_from_pkey,
    EVP_PKEY_CTX_set_params, EVP_PKEY_derive, EVP_PKEY_derive_init, EVP_PKEY_derive_set_peer,
    EVP_PKEY_fromdata, EVP_PKEY_fromdata_init, EVP_PKEY_generate, EVP_PKEY_keygen_init,
    EVP_PKEY_pairwise_check, EVP_PKEY_param_check, EVP_PKEY_public_check,
};
use crate::util::{check_int_result, check_ptr};
use alloc::vec;
use core::ffi::{c_int, CStr};
use core::ptr::{self, NonNull};
use openssl_sys::EVP_PKEY_CTX;
use ossl_ec_error::{ApiName, Result};

/// Wrapper of an `EVP_PKEY_CTX`, an algorithm-specific session for one public key operation.
pub(crate) struct PKeyCtx(NonNull<EVP_PKEY_CTX>);

impl Drop for PKeyCtx {
    fn drop(&mut self) {
        // SAFETY: The context has been allocated by OpenSSL and isn't used after this.
        unsafe { EVP_PKEY_CTX_free(self.0.as_ptr()) }
    }
}

impl PKeyCtx {
    /// Creates a context for the algorithm `name` fetched from the default library context.
    pub(crate) fn new_from_name(name: &CStr) -> Result<Self> {
        let libctx = ptr::null_mut(); // Default library context.
        let propquery = ptr::null(); // No provider property query.
        // SAFETY: `name` is NUL terminated and only read during the call. The returned
        // pointer is checked below.
        let ctx = unsafe { EVP_PKEY_CTX_new_from_name(libctx, name.as_ptr(), propquery) };
        check_ptr(ctx, ApiName::EVP_PKEY_CTX_new_from_name).map(Self)
    }

    /// Creates a context operating on `pkey`. The context holds its own reference to the key.
    pub(crate) fn new_from_pkey(pkey: &PKey) -> Result<Self> {
        let libctx = ptr::null_mut();
        let propquery = ptr::null();
        // SAFETY: The key is valid. OpenSSL takes its own reference to it, and the returned
        // pointer is checked below.
        let ctx = unsafe { EVP_PKEY_CTX_new_from_pkey(libctx, pkey.as_ptr(), propquery) };
        check_ptr(ctx, ApiName::EVP_PKEY_CTX_new_from_pkey).map(Self)
    }

    pub(crate) fn keygen_init(&mut self) -> Result<()> {
        // SAFETY: The context is valid.
        let ret = unsafe { EVP_PKEY_keygen_init(self.0.as_ptr()) };
        check_int_result(ret, ApiName::EVP_PKEY_keygen_init)
    }

    /// Applies `params` to the operation the context was initialized for.
    pub(crate) fn set_params(&mut self, params: &Params) -> Result<()> {
        // SAFETY: The context is valid and the params array is end-terminated. OpenSSL copies
        // what it needs from the array.
        let ret = unsafe { EVP_PKEY_CTX_set_params(self.0.as_ptr(), params.as_ptr()) };
        check_int_result(ret, ApiName::EVP_PKEY_CTX_set_params)
    }

    /// Runs the key generation the context was initialized and parameterized for.
    pub(crate) fn generate(&mut self) -> Result<PKey> {
        let mut pkey = ptr::null_mut();
        // SAFETY: The context is valid and has been initialized for key generation.
        // On success a newly allocated key, which we take ownership of, is written to `pkey`.
        let ret = unsafe { EVP_PKEY_generate(self.0.as_ptr(), &mut pkey) };
        check_int_result(ret, ApiName::EVP_PKEY_generate)?;
        check_ptr(pkey, ApiName::EVP_PKEY_generate).map(PKey::from_non_null)
    }

    pub(crate) fn fromdata_init(&mut self) -> Result<()> {
        // SAFETY: The context is valid.
        let ret = unsafe { EVP_PKEY_fromdata_init(self.0.as_ptr()) };
        check_int_result(ret, ApiName::EVP_PKEY_fromdata_init)
    }

    /// Creates a key from the `selection` components found in `params`.
    pub(crate) fn fromdata(&mut self, selection: c_int, params: &mut Params) -> Result<PKey> {
        let mut pkey = ptr::null_mut();
        // SAFETY: The context is valid and has been initialized with `EVP_PKEY_fromdata_init`.
        // The params array is end-terminated. On success a newly allocated key, which we take
        // ownership of, is written to `pkey`.
        let ret =
            unsafe { EVP_PKEY_fromdata(self.0.as_ptr(), &mut pkey, selection, params.as_mut_ptr()) };
        check_int_result(ret, ApiName::EVP_PKEY_fromdata)?;
        check_ptr(pkey, ApiName::EVP_PKEY_fromdata).map(PKey::from_non_null)
    }

    /// Validates the domain parameters of the key of the context.
    pub(crate) fn param_check(&mut self) -> Result<()> {
        // SAFETY: The context is valid and was created from a key.
        let ret = unsafe { EVP_PKEY_param_check(self.0.as_ptr()) };
        check_int_result(ret, ApiName::EVP_PKEY_param_check)
    }

    /// Validates the public component of the key of the context.
    pub(crate) fn public_check(&mut self) -> Result<()> {
        // SAFETY: The context is valid and was created from a key.
        let ret = unsafe { EVP_PKEY_public_check(self.0.as_ptr()) };
        check_int_result(ret, ApiName::EVP_PKEY_public_check)
    }

    /// Validates that the private and public components of the key of the context match.
    pub(crate) fn pairwise_check(&mut self) -> Result<()> {
        // SAFETY: The context is valid and was created from a key.
        let ret = unsafe { EVP_PKEY_pairwise_check(self.0.as_ptr()) };
        check_int_result(ret, ApiName::EVP_PKEY_pairwise_check)
    }

    pub(crate) fn derive_init(&mut self) -> Result<()> {
        // SAFETY: The context is valid and was created from a key.
        let ret = unsafe { EVP_PKEY_derive_init(self.0.as_ptr()) };
        check_int_result(ret, ApiName::EVP_PKEY_derive_init)
    }

    /// Sets the peer key of the derivation. OpenSSL validates the peer public key here.
    pub(crate) fn derive_set_peer(&mut self, peer: &PKey) -> Result<()> {
        // SAFETY: Both the context and the peer key are valid. OpenSSL takes its own
        // reference to the peer key.
        let ret = unsafe { EVP_PKEY_derive_set_peer(self.0.as_ptr(), peer.as_ptr()) };
        check_int_result(ret, ApiName::EVP_PKEY_derive_set_peer)
    }

    /// Derives the shared secret between the key of the context and the peer key.
    pub(crate) fn derive(&mut self) -> Result<ZVec> {
        let mut len = 0;
        // SAFETY: The context is valid and initialized for derivation. A null output buffer
        // asks for the length of the secret only.
        let ret = unsafe { EVP_PKEY_derive(self.0.as_ptr(), ptr::null_mut(), &mut len) };
        check_int_result(ret, ApiName::EVP_PKEY_derive)?;

        let mut secret = ZVec::from(vec![0u8; len]);
        // SAFETY: The function writes at most `len` bytes to the buffer, which has exactly
        // `len` bytes, and updates `len` to the number of bytes written.
        let ret =
            unsafe { EVP_PKEY_derive(self.0.as_ptr(), secret.as_mut_slice().as_mut_ptr(), &mut len) };
        check_int_result(ret, ApiName::EVP_PKEY_derive)?;
        secret.truncate(len);
        Ok(secret)
    }
}
