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

use ossl_ec::{names, PKey, PointConversionForm, Result};
use ossl_ec_shim::*;
use std::ffi::{c_ulong, CStr};
use std::ptr;
use std::thread;

extern "C" {
    fn ERR_peek_error() -> c_ulong;
}

fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Calls the exported generator and takes ownership of the result.
fn gen(curve: &CStr) -> Option<PKey> {
    // SAFETY: `curve` is a valid C string for the duration of the call.
    let raw = unsafe { EVP_EC_gen_wrapped(curve.as_ptr()) };
    // SAFETY: A non-null result is a new key owned by the caller.
    unsafe { PKey::from_raw(raw) }
}

#[test]
fn integer_symbols_match_the_selectors() {
    assert_eq!(names::EVP_PKEY_KEYPAIR, EVP_PKEY_KEYPAIR_W);
    assert_eq!(names::EVP_PKEY_PUBLIC_KEY, EVP_PKEY_PUBLIC_KEY_W);
    assert_eq!(0x87, EVP_PKEY_KEYPAIR_W);
    assert_eq!(0x86, EVP_PKEY_PUBLIC_KEY_W);
}

#[test]
fn string_symbols_match_the_parameter_names() {
    let expected: [(&StaticCStr, &CStr); 7] = [
        (&OSSL_PKEY_PARAM_GROUP_NAME_W, c"group"),
        (&OSSL_PKEY_PARAM_EC_POINT_CONVERSION_FORMAT_W, c"point-format"),
        (&OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_COMPRESSED_W, c"compressed"),
        (&OSSL_PKEY_EC_POINT_CONVERSION_FORMAT_UNCOMPRESSED_W, c"uncompressed"),
        (&OSSL_PKEY_PARAM_PUB_KEY_W, c"pub"),
        (&OSSL_PKEY_PARAM_PRIV_KEY_W, c"priv"),
        (&EVP_PKEY_CTX_NAME_EC, c"EC"),
    ];
    for (symbol, value) in expected {
        assert_eq!(value.to_bytes_with_nul(), symbol.as_c_str().to_bytes_with_nul());
    }
}

#[test]
fn generates_keypairs_for_standard_curves() -> Result<()> {
    setup();
    for (curve, point_len) in [(c"P-256", 65), (c"P-384", 97), (c"P-521", 133), (c"secp521r1", 133)]
    {
        let pkey = gen(curve).expect("non-null key handle");

        assert!(pkey.has_selection(EVP_PKEY_KEYPAIR_W)?);
        assert_eq!(point_len, pkey.public_key(PointConversionForm::Uncompressed)?.len());
    }
    Ok(())
}

#[test]
fn returns_null_on_failure() {
    setup();
    for curve in [c"not-a-curve", c"rsa", c""] {
        assert!(gen(curve).is_none(), "{curve:?}");
    }
    // SAFETY: A null curve name is handled without being dereferenced.
    assert!(unsafe { EVP_EC_gen_wrapped(ptr::null()) }.is_null());
}

#[test]
fn failures_leave_the_error_queue_empty() {
    setup();
    assert!(gen(c"not-a-curve").is_none());

    // SAFETY: Only reads the thread-local error queue, without removing the entry.
    assert_eq!(0, unsafe { ERR_peek_error() });
}

#[test]
fn concurrent_calls_return_distinct_handles() -> Result<()> {
    setup();
    let handles: Vec<_> = [c"P-256", c"P-384", c"P-521", c"prime256v1"]
        .into_iter()
        .map(|curve| thread::spawn(move || gen(curve)))
        .collect();

    let mut points = Vec::new();
    for handle in handles {
        let pkey = handle.join().expect("keygen thread panicked").expect("non-null key handle");
        points.push(pkey.public_key(PointConversionForm::Compressed)?);
    }
    points.sort();
    points.dedup();
    assert_eq!(4, points.len());
    Ok(())
}
