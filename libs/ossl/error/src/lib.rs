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

//! Errors and relating structs returned by the OpenSSL EC wrapper library.

#![cfg_attr(not(feature = "std"), no_std)]

mod code;

use core::{fmt, result};
use serde::{Deserialize, Serialize};

pub use crate::code::{EcError, GlobalError, LibraryCode, ReasonCode};

/// libossl_ec result type.
pub type Result<T> = result::Result<T, Error>;

/// Error type used by libossl_ec.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Error {
    /// Failed to invoke an OpenSSL API.
    CallFailed(ApiName, ReasonCode),

    /// An unexpected internal error occurred.
    InternalError,

    /// The curve name is empty, contains an interior NUL byte or does not name a known
    /// EC group.
    InvalidCurveName,

    /// The size of the given key material does not match the curve.
    IncorrectParameterSize,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::CallFailed(api_name, reason) => {
                write!(f, "Failed to invoke the OpenSSL API: {api_name:?}. Reason: {reason}")
            }
            Self::InternalError => write!(f, "An unexpected internal error occurred"),
            Self::InvalidCurveName => write!(f, "Invalid EC curve name"),
            Self::IncorrectParameterSize => {
                write!(f, "The size of the key material does not match the curve")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// OpenSSL API names.
#[allow(missing_docs)]
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiName {
    BN_new,
    BN_bin2bn,
    BN_bn2binpad,
    BN_sub,
    EC_GROUP_get_curve,
    EC_GROUP_get_order,
    EC_GROUP_new_by_curve_name,
    EC_POINT_mul,
    EC_POINT_new,
    EC_POINT_point2oct,
    EVP_PKEY_CTX_new_from_name,
    EVP_PKEY_CTX_new_from_pkey,
    EVP_PKEY_CTX_set_params,
    EVP_PKEY_derive,
    EVP_PKEY_derive_init,
    EVP_PKEY_derive_set_peer,
    EVP_PKEY_dup,
    EVP_PKEY_fromdata,
    EVP_PKEY_fromdata_init,
    EVP_PKEY_generate,
    EVP_PKEY_get_bn_param,
    EVP_PKEY_get_octet_string_param,
    EVP_PKEY_get_utf8_string_param,
    EVP_PKEY_keygen_init,
    EVP_PKEY_pairwise_check,
    EVP_PKEY_param_check,
    EVP_PKEY_public_check,
    EVP_PKEY_set_utf8_string_param,
    EVP_PKEY_todata,
    OSSL_PARAM_BLD_new,
    OSSL_PARAM_BLD_push_BN,
    OSSL_PARAM_BLD_push_octet_string,
    OSSL_PARAM_BLD_push_utf8_string,
    OSSL_PARAM_BLD_to_param,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_failed_display_names_the_api_and_reason() {
        let err = Error::CallFailed(ApiName::EVP_PKEY_generate, EcError::InvalidCurve.into());
        assert_eq!(
            err.to_string(),
            "Failed to invoke the OpenSSL API: EVP_PKEY_generate. \
             Reason: An error occurred in an EC function: InvalidCurve"
        );
    }

    #[test]
    fn unknown_reason_display_keeps_the_raw_codes() {
        let reason = ReasonCode::Unknown(42, LibraryCode::Prov);
        assert_eq!(reason.to_string(), "Unknown reason code '42' from the library 'Prov'");
    }
}
