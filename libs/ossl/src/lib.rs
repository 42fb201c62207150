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

//! Safe wrappers around the OpenSSL 3 EC key generation and key management API.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(clippy::or_fun_call)]

extern crate alloc;

mod ec;
mod err;
mod evp;
mod keygen;
pub mod names;
mod param;
mod pkey_ctx;
mod sys;
mod util;

pub use ossl_ec_error::{
    ApiName, EcError, Error, GlobalError, LibraryCode, ReasonCode, Result,
};

pub use ec::{BigNum, EcGroup, ZVec};
pub use evp::{PKey, PointConversionForm};
pub use keygen::generate_ec_keypair;

/// Performs the one-time, process-wide OpenSSL initialization. Safe to call repeatedly.
pub fn init() {
    openssl_sys::init();
}
