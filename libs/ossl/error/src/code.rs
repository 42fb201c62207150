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

use core::fmt;
use serde::{Deserialize, Serialize};

type OsslReasonCode = i32;

/// OpenSSL reason code of the most recent error in the thread-local error queue.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasonCode {
    NoError,
    Global(GlobalError),
    Ec(EcError),
    Unknown(OsslReasonCode, LibraryCode),
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NoError => write!(f, "No error in the OpenSSL error queue."),
            Self::Global(e) => write!(f, "{e}"),
            Self::Ec(e) => write!(f, "{e}"),
            Self::Unknown(code, lib) => {
                write!(f, "Unknown reason code '{code}' from the library '{lib:?}'")
            }
        }
    }
}

/// The OpenSSL sub-library that raised an error.
///
/// The values are from:
/// openssl/include/openssl/err.h
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LibraryCode {
    Sys,
    Bn,
    Evp,
    Crypto,
    Ec,
    Prov,
    Other(i32),
}

impl From<i32> for LibraryCode {
    fn from(lib: i32) -> Self {
        match lib {
            2 => Self::Sys,
            3 => Self::Bn,
            6 => Self::Evp,
            15 => Self::Crypto,
            16 => Self::Ec,
            57 => Self::Prov,
            other => Self::Other(other),
        }
    }
}

/// Global errors may occur in any library.
///
/// The values are from:
/// openssl/include/openssl/err.h
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalError {
    Fatal,
    MallocFailure,
    ShouldNotHaveBeenCalled,
    PassedNullParameter,
    InternalError,
}

impl From<GlobalError> for ReasonCode {
    fn from(e: GlobalError) -> ReasonCode {
        ReasonCode::Global(e)
    }
}

impl fmt::Display for GlobalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "A global error occurred: {self:?}")
    }
}

/// Errors occurred in the EC functions and the EC key management of the default provider.
///
/// The values are from:
/// openssl/include/openssl/ecerr.h
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EcError {
    BufferTooSmall,
    IncompatibleObjects,
    InvalidEncoding,
    InvalidField,
    InvalidForm,
    PointAtInfinity,
    PointIsNotOnCurve,
    InvalidCompressionBit,
    InvalidCompressedPoint,
    NotInitialized,
    InvalidArgument,
    UndefinedGenerator,
    UndefinedOrder,
    InvalidKey,
    EcGroupNewByNameFailure,
    InvalidGroupOrder,
    InvalidPrivateKey,
    MissingParameters,
    MissingPrivateKey,
    NotImplemented,
    UnknownGroup,
    WrongOrder,
    InvalidPeerKey,
    InvalidCurve,
    BignumOutOfRange,
    WrongCurveParameters,
    CoordinatesOutOfRange,
    InvalidCofactor,
}

impl From<EcError> for ReasonCode {
    fn from(e: EcError) -> ReasonCode {
        ReasonCode::Ec(e)
    }
}

impl fmt::Display for EcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "An error occurred in an EC function: {self:?}")
    }
}
