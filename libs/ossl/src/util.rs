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

//! Utility functions.

use crate::err::process_error_queue;
use core::ptr::NonNull;
use log::error;
use ossl_ec_error::{ApiName, Error, Result};

pub(crate) fn check_int_result(ret: i32, api_name: ApiName) -> Result<()> {
    match ret {
        1 => Ok(()),
        0 => Err(Error::CallFailed(api_name, process_error_queue())),
        _ => {
            error!(
                "Received a return value ({}) other than 0 or 1 from the OpenSSL API: {:?}",
                ret, api_name
            );
            // Negative values can leave entries behind, e.g. -2 for unsupported operations.
            process_error_queue();
            Err(Error::InternalError)
        }
    }
}

pub(crate) fn to_call_failed_error(api_name: ApiName) -> Error {
    Error::CallFailed(api_name, process_error_queue())
}

/// Takes ownership of a pointer returned by an OpenSSL allocator, turning null into the
/// error of `api_name`.
pub(crate) fn check_ptr<T>(p: *mut T, api_name: ApiName) -> Result<NonNull<T>> {
    NonNull::new(p).ok_or_else(|| to_call_failed_error(api_name))
}
