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

//! Wrappers of the error handling functions in OpenSSL err.h.

use crate::sys::ERR_get_error_all;
use alloc::string::{String, ToString};
use core::ffi::{c_char, c_ulong, CStr};
use core::ptr;
use log::{debug, error};
use openssl_sys::{ERR_lib_error_string, ERR_reason_error_string};
use ossl_ec_error::{EcError, GlobalError, ReasonCode};

const NO_ERROR_REASON_CODE: i32 = 0;

// Packing of the error codes, see `ERR_GET_LIB` and `ERR_GET_REASON` in err.h.
const ERR_SYSTEM_FLAG: c_ulong = (i32::MAX as c_ulong) + 1;
const ERR_SYSTEM_MASK: c_ulong = i32::MAX as c_ulong;
const ERR_LIB_OFFSET: u32 = 23;
const ERR_LIB_MASK: c_ulong = 0xff;
const ERR_REASON_MASK: c_ulong = 0x7f_ffff;
const ERR_LIB_SYS: i32 = 2;
const ERR_LIB_EC: i32 = 16;

const ERR_RFLAG_FATAL: i32 = 0x1 << 18;
const ERR_RFLAG_COMMON: i32 = 0x2 << 18;
const ERR_R_FATAL: i32 = ERR_RFLAG_FATAL | ERR_RFLAG_COMMON;
const ERR_R_MALLOC_FAILURE: i32 = 256 | ERR_R_FATAL;
const ERR_R_SHOULD_NOT_HAVE_BEEN_CALLED: i32 = 257 | ERR_R_FATAL;
const ERR_R_PASSED_NULL_PARAMETER: i32 = 258 | ERR_R_FATAL;
const ERR_R_INTERNAL_ERROR: i32 = 259 | ERR_R_FATAL;

/// Processes the error queue till it is empty, logs the information for all the errors in
/// the queue from the least recent to the most recent, and returns the reason code for the
/// most recent error.
pub(crate) fn process_error_queue() -> ReasonCode {
    let mut reason_code = ReasonCode::NoError;
    loop {
        let code = process_least_recent_error();
        if code == ReasonCode::NoError {
            break;
        }
        reason_code = code;
    }
    reason_code
}

/// Removes the least recent error in the error queue and logs the error information.
///
/// Returns the reason code for the least recent error.
fn process_least_recent_error() -> ReasonCode {
    let mut file = ptr::null();
    let mut line = 0;
    let mut func = ptr::null();
    // SAFETY: This function only reads the error queue and writes to the given
    // pointers. It doesn't retain any references to the pointers. `data` and `flags`
    // are optional and left null.
    let packed_error = unsafe {
        ERR_get_error_all(&mut file, &mut line, &mut func, ptr::null_mut(), ptr::null_mut())
    };
    let reason = get_reason(packed_error);
    if packed_error == 0 || reason == NO_ERROR_REASON_CODE {
        debug!("No error in the OpenSSL error queue");
        return ReasonCode::NoError;
    }

    // SAFETY: Any non-null result is expected to point to a global const C string.
    let file = unsafe { cstr_to_string(file, "<unknown file>") };
    // SAFETY: Any non-null result is expected to point to a global const C string.
    let func = unsafe { cstr_to_string(func, "<unknown function>") };
    error!(
        "OpenSSL error: {}:{} ({}): lib = {}, reason = {}",
        file,
        line,
        func,
        lib_error_string(packed_error),
        reason_error_string(packed_error),
    );

    map_to_reason_code(reason, get_lib(packed_error))
}

fn lib_error_string(packed_error: c_ulong) -> String {
    // SAFETY: This function only reads the given error code and returns a
    // pointer to a static string.
    let p = unsafe { ERR_lib_error_string(packed_error) };
    // SAFETY: Any non-null result is expected to point to a global const C string.
    unsafe { cstr_to_string(p, "<unknown library>") }
}

fn reason_error_string(packed_error: c_ulong) -> String {
    // SAFETY: This function only reads the given error code and returns a
    // pointer to a static string.
    let p = unsafe { ERR_reason_error_string(packed_error) };
    // SAFETY: Any non-null result is expected to point to a global const C string.
    unsafe { cstr_to_string(p, "<unknown reason>") }
}

/// Converts a C string pointer to a Rust string.
///
/// # Safety
///
/// The caller needs to ensure that the pointer is null or points to a valid C string.
unsafe fn cstr_to_string(p: *const c_char, default: &str) -> String {
    if p.is_null() {
        return default.to_string();
    }
    // Safety: Safe given the requirements of this function.
    let s = unsafe { CStr::from_ptr(p) };
    s.to_str().unwrap_or(default).to_string()
}

fn is_system_error(packed_error: c_ulong) -> bool {
    packed_error & ERR_SYSTEM_FLAG != 0
}

fn get_reason(packed_error: c_ulong) -> i32 {
    let reason = if is_system_error(packed_error) {
        packed_error & ERR_SYSTEM_MASK
    } else {
        packed_error & ERR_REASON_MASK
    };
    // Both masks keep the value within `i32`.
    reason as i32
}

/// Returns the library code for the error.
fn get_lib(packed_error: c_ulong) -> i32 {
    if is_system_error(packed_error) {
        return ERR_LIB_SYS;
    }
    ((packed_error >> ERR_LIB_OFFSET) & ERR_LIB_MASK) as i32
}

fn map_to_reason_code(reason: i32, lib: i32) -> ReasonCode {
    if reason == NO_ERROR_REASON_CODE {
        return ReasonCode::NoError;
    }
    map_global_reason_code(reason)
        .map(ReasonCode::Global)
        .or_else(|| map_library_reason_code(reason, lib))
        .unwrap_or(ReasonCode::Unknown(reason, lib.into()))
}

/// Global errors may occur in any library.
fn map_global_reason_code(reason: i32) -> Option<GlobalError> {
    let reason = match reason {
        ERR_R_FATAL => GlobalError::Fatal,
        ERR_R_MALLOC_FAILURE => GlobalError::MallocFailure,
        ERR_R_SHOULD_NOT_HAVE_BEEN_CALLED => GlobalError::ShouldNotHaveBeenCalled,
        ERR_R_PASSED_NULL_PARAMETER => GlobalError::PassedNullParameter,
        ERR_R_INTERNAL_ERROR => GlobalError::InternalError,
        _ => return None,
    };
    Some(reason)
}

fn map_library_reason_code(reason: i32, lib: i32) -> Option<ReasonCode> {
    match lib {
        ERR_LIB_EC => map_ec_reason_code(reason).map(ReasonCode::Ec),
        _ => None,
    }
}

/// The values are from openssl/include/openssl/ecerr.h.
fn map_ec_reason_code(reason: i32) -> Option<EcError> {
    let error = match reason {
        100 => EcError::BufferTooSmall,
        101 => EcError::IncompatibleObjects,
        102 => EcError::InvalidEncoding,
        103 => EcError::InvalidField,
        104 => EcError::InvalidForm,
        106 => EcError::PointAtInfinity,
        107 => EcError::PointIsNotOnCurve,
        109 => EcError::InvalidCompressionBit,
        110 => EcError::InvalidCompressedPoint,
        111 => EcError::NotInitialized,
        112 => EcError::InvalidArgument,
        113 => EcError::UndefinedGenerator,
        114 => EcError::UndefinedOrder,
        116 => EcError::InvalidKey,
        119 => EcError::EcGroupNewByNameFailure,
        122 => EcError::InvalidGroupOrder,
        123 => EcError::InvalidPrivateKey,
        124 => EcError::MissingParameters,
        125 => EcError::MissingPrivateKey,
        126 => EcError::NotImplemented,
        129 => EcError::UnknownGroup,
        130 => EcError::WrongOrder,
        133 => EcError::InvalidPeerKey,
        141 => EcError::InvalidCurve,
        144 => EcError::BignumOutOfRange,
        145 => EcError::WrongCurveParameters,
        146 => EcError::CoordinatesOutOfRange,
        171 => EcError::InvalidCofactor,
        _ => return None,
    };
    Some(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ossl_ec_error::LibraryCode;

    fn pack(lib: c_ulong, reason: c_ulong) -> c_ulong {
        (lib << ERR_LIB_OFFSET) | reason
    }

    #[test]
    fn unpacks_library_and_reason() {
        let packed = pack(16, 141);
        assert_eq!(ERR_LIB_EC, get_lib(packed));
        assert_eq!(141, get_reason(packed));
        assert_eq!(ReasonCode::Ec(EcError::InvalidCurve), map_to_reason_code(141, ERR_LIB_EC));
    }

    #[test]
    fn system_errors_report_the_sys_library() {
        let packed = ERR_SYSTEM_FLAG | 2;
        assert_eq!(ERR_LIB_SYS, get_lib(packed));
        assert_eq!(2, get_reason(packed));
        assert_eq!(ReasonCode::Unknown(2, LibraryCode::Sys), map_to_reason_code(2, ERR_LIB_SYS));
    }

    #[test]
    fn common_reasons_take_precedence_over_the_library() {
        let packed = pack(6, ERR_R_MALLOC_FAILURE as c_ulong);
        assert_eq!(
            ReasonCode::Global(GlobalError::MallocFailure),
            map_to_reason_code(get_reason(packed), get_lib(packed))
        );
    }

    #[test]
    fn unmapped_reasons_are_unknown() {
        assert_eq!(
            ReasonCode::Unknown(999, LibraryCode::Prov),
            map_to_reason_code(999, 57)
        );
        assert_eq!(ReasonCode::NoError, map_to_reason_code(NO_ERROR_REASON_CODE, ERR_LIB_EC));
    }

    #[test]
    fn empty_queue_reports_no_error() {
        // SAFETY: Only clears the thread-local error queue.
        unsafe { openssl_sys::ERR_clear_error() };
        assert_eq!(ReasonCode::NoError, process_error_queue());
    }
}
