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

//! Contains structs and functions that wrap the named-curve `EC_GROUP` and `BIGNUM` APIs
//! in OpenSSL.

use crate::sys::{EC_GROUP_get_curve, EC_curve_nist2nid, OBJ_ln2nid, OBJ_sn2nid};
use crate::util::{check_int_result, check_ptr, to_call_failed_error};
use alloc::ffi::CString;
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::ffi::{c_int, CStr};
use core::ptr::{self, NonNull};
use log::error;
use openssl_sys::{
    BN_bin2bn, BN_bn2binpad, BN_clear_free, BN_cmp, BN_is_negative, BN_new, BN_num_bits, BN_sub,
    EC_GROUP_free, EC_GROUP_get_curve_name, EC_GROUP_get_degree, EC_GROUP_get_order,
    EC_GROUP_new_by_curve_name, EC_POINT_free, EC_POINT_mul, EC_POINT_new, EC_POINT_point2oct,
    BIGNUM, EC_GROUP, EC_POINT, NID_undef,
};
use ossl_ec_error::{ApiName, Error, Result};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Converts a caller-supplied curve name into a C string, rejecting the empty name and
/// names with interior NUL bytes.
pub(crate) fn to_curve_cstring(curve_name: &str) -> Result<CString> {
    if curve_name.is_empty() {
        error!("The EC curve name is empty");
        return Err(Error::InvalidCurveName);
    }
    CString::new(curve_name).map_err(|e| {
        error!("The EC curve name contains a NUL byte: {e}");
        Error::InvalidCurveName
    })
}

/// Resolves a curve name to its NID the way the EC key management of the default provider
/// does: NIST name first (e.g. "P-256"), then short name ("prime256v1", "secp384r1"), then
/// long name.
fn curve_nid_from_name(name: &CStr) -> Option<c_int> {
    // SAFETY: The lookup functions only read the NUL terminated name.
    let nid = unsafe { EC_curve_nist2nid(name.as_ptr()) };
    if nid != NID_undef {
        return Some(nid);
    }
    // SAFETY: As above.
    let nid = unsafe { OBJ_sn2nid(name.as_ptr()) };
    if nid != NID_undef {
        return Some(nid);
    }
    // SAFETY: As above.
    let nid = unsafe { OBJ_ln2nid(name.as_ptr()) };
    (nid != NID_undef).then_some(nid)
}

/// Wrapper of an owned named-curve `EC_GROUP`.
pub struct EcGroup(NonNull<EC_GROUP>);

impl Drop for EcGroup {
    fn drop(&mut self) {
        // SAFETY: The group has been allocated by `EC_GROUP_new_by_curve_name` and isn't
        // used after this.
        unsafe { EC_GROUP_free(self.0.as_ptr()) }
    }
}

// SAFETY: The group is exclusively owned and only read after construction.
unsafe impl Send for EcGroup {}

impl EcGroup {
    /// Creates the group of the named curve, e.g. "P-256", "prime256v1" or "secp521r1".
    pub fn from_curve_name(curve_name: &str) -> Result<Self> {
        crate::init();
        let name = to_curve_cstring(curve_name)?;
        let nid = curve_nid_from_name(&name).ok_or_else(|| {
            error!("Unknown EC curve name: {curve_name}");
            Error::InvalidCurveName
        })?;
        // SAFETY: The returned pointer is checked below.
        let group = unsafe { EC_GROUP_new_by_curve_name(nid) };
        check_ptr(group, ApiName::EC_GROUP_new_by_curve_name).map(Self)
    }

    /// Returns the NID that identifies the curve.
    pub fn curve_nid(&self) -> i32 {
        // SAFETY: The group is valid.
        unsafe { EC_GROUP_get_curve_name(self.0.as_ptr()) }
    }

    /// Returns the size of the underlying field in bits.
    pub fn degree(&self) -> Result<usize> {
        // SAFETY: The group is valid.
        let degree = unsafe { EC_GROUP_get_degree(self.0.as_ptr()) };
        usize::try_from(degree).map_err(|_| {
            error!("Invalid EC group degree: {degree}");
            Error::InternalError
        })
    }

    /// Returns the size in bytes of an affine coordinate or a private scalar.
    pub fn coordinate_byte_count(&self) -> Result<usize> {
        Ok(self.degree()?.div_ceil(8))
    }

    /// Returns the prime `p` of the underlying field.
    pub fn field_prime(&self) -> Result<BigNum> {
        let mut p = BigNum::new()?;
        let (a, b) = (ptr::null_mut(), ptr::null_mut()); // The coefficients are not needed.
        // SAFETY: The group and the destination `BIGNUM` are valid.
        let ret =
            unsafe { EC_GROUP_get_curve(self.0.as_ptr(), p.as_mut_ptr(), a, b, ptr::null_mut()) };
        check_int_result(ret, ApiName::EC_GROUP_get_curve)?;
        Ok(p)
    }

    /// Computes `scalar * G` and returns it as an uncompressed point.
    pub(crate) fn mul_generator(&self, scalar: &BigNum) -> Result<Vec<u8>> {
        let point = EcPoint::new(self)?;
        // SAFETY: The group, the point and the scalar are valid. The point belongs to this
        // group.
        let ret = unsafe {
            EC_POINT_mul(
                self.0.as_ptr(),
                point.0.as_ptr(),
                scalar.as_ptr(),
                ptr::null(),
                ptr::null(),
                ptr::null_mut(),
            )
        };
        check_int_result(ret, ApiName::EC_POINT_mul)?;
        point.to_uncompressed(self)
    }

    /// Returns the order of the generator.
    pub fn order(&self) -> Result<BigNum> {
        let mut order = BigNum::new()?;
        let ctx = ptr::null_mut(); // Allocated internally when needed.
        // SAFETY: The group and the destination `BIGNUM` are valid.
        let ret = unsafe { EC_GROUP_get_order(self.0.as_ptr(), order.as_mut_ptr(), ctx) };
        check_int_result(ret, ApiName::EC_GROUP_get_order)?;
        Ok(order)
    }
}

/// Wrapper of an owned `EC_POINT`.
struct EcPoint(NonNull<EC_POINT>);

impl Drop for EcPoint {
    fn drop(&mut self) {
        // SAFETY: The point has been allocated by `EC_POINT_new` and isn't used after this.
        unsafe { EC_POINT_free(self.0.as_ptr()) }
    }
}

impl EcPoint {
    fn new(group: &EcGroup) -> Result<Self> {
        // SAFETY: The group is valid. The returned pointer is checked below.
        let point = unsafe { EC_POINT_new(group.0.as_ptr()) };
        check_ptr(point, ApiName::EC_POINT_new).map(Self)
    }

    fn to_uncompressed(&self, group: &EcGroup) -> Result<Vec<u8>> {
        let form = openssl_sys::point_conversion_form_t::POINT_CONVERSION_UNCOMPRESSED;
        // SAFETY: The group and the point are valid. A null buffer asks for the length only.
        let len = unsafe {
            EC_POINT_point2oct(
                group.0.as_ptr(),
                self.0.as_ptr(),
                form,
                ptr::null_mut(),
                0,
                ptr::null_mut(),
            )
        };
        if len == 0 {
            return Err(to_call_failed_error(ApiName::EC_POINT_point2oct));
        }
        let mut buf = vec![0u8; len];
        // SAFETY: The function writes at most `buf.len()` bytes into `buf`.
        let written = unsafe {
            EC_POINT_point2oct(
                group.0.as_ptr(),
                self.0.as_ptr(),
                form,
                buf.as_mut_ptr(),
                buf.len(),
                ptr::null_mut(),
            )
        };
        if written != len {
            return Err(to_call_failed_error(ApiName::EC_POINT_point2oct));
        }
        Ok(buf)
    }
}

/// A u8 vector that is zeroed when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ZVec(Vec<u8>);

impl ZVec {
    /// Extracts a slice containing the entire vector.
    pub fn as_slice(&self) -> &[u8] {
        &self.0[..]
    }

    /// Returns the number of bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the vector is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0[..]
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.0.truncate(len)
    }
}

impl From<Vec<u8>> for ZVec {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

/// Wrapper of an owned `BIGNUM`, cleared when dropped.
pub struct BigNum(NonNull<BIGNUM>);

impl Drop for BigNum {
    fn drop(&mut self) {
        // SAFETY: The pointer has been allocated by OpenSSL and isn't used after this.
        unsafe { BN_clear_free(self.as_mut_ptr()) }
    }
}

// SAFETY: The `BIGNUM` is exclusively owned.
unsafe impl Send for BigNum {}

impl BigNum {
    /// Creates a `BigNum` from the big-endian bytes `x`.
    pub fn from_slice(x: &[u8]) -> Result<Self> {
        let len = x.len().try_into().map_err(|_| Error::IncorrectParameterSize)?;
        // SAFETY: The function reads `x` within its bounds, and the returned
        // pointer is checked below.
        let bn = unsafe { BN_bin2bn(x.as_ptr(), len, ptr::null_mut()) };
        check_ptr(bn, ApiName::BN_bin2bn).map(Self)
    }

    pub(crate) fn new() -> Result<Self> {
        // SAFETY: The returned pointer is checked below.
        let bn = unsafe { BN_new() };
        check_ptr(bn, ApiName::BN_new).map(Self)
    }

    /// Takes ownership of a `BIGNUM` allocated by OpenSSL.
    pub(crate) fn from_non_null(bn: NonNull<BIGNUM>) -> Self {
        Self(bn)
    }

    /// Returns the number of significant bits.
    pub fn num_bits(&self) -> usize {
        // SAFETY: The `BIGNUM` is valid.
        let bits = unsafe { BN_num_bits(self.0.as_ptr()) };
        bits.try_into().unwrap_or(0)
    }

    /// Returns whether the value is zero.
    pub fn is_zero(&self) -> bool {
        self.num_bits() == 0
    }

    /// Returns whether the value is negative.
    pub fn is_negative(&self) -> bool {
        // SAFETY: The `BIGNUM` is valid.
        unsafe { BN_is_negative(self.0.as_ptr()) == 1 }
    }

    /// Converts the `BigNum` to a big-endian integer. The integer is padded with leading zeros up
    /// to size `len`. The conversion fails if `len` is smaller than the size of the integer.
    pub fn to_padded_vec(&self, len: usize) -> Result<Vec<u8>> {
        let tolen = len.try_into().map_err(|_| Error::IncorrectParameterSize)?;
        let mut num = vec![0u8; len];
        // SAFETY: The function writes at most `tolen` bytes into `num`, which has `len` bytes.
        let ret = unsafe { BN_bn2binpad(self.0.as_ptr(), num.as_mut_ptr(), tolen) };
        if ret < 0 {
            return Err(to_call_failed_error(ApiName::BN_bn2binpad));
        }
        Ok(num)
    }

    /// Returns `self - other`.
    pub fn try_sub(&self, other: &BigNum) -> Result<BigNum> {
        let mut diff = BigNum::new()?;
        // SAFETY: All three `BIGNUM`s are valid and the destination is distinct from the
        // operands.
        let ret = unsafe { BN_sub(diff.as_mut_ptr(), self.as_ptr(), other.as_ptr()) };
        check_int_result(ret, ApiName::BN_sub)?;
        Ok(diff)
    }

    pub(crate) fn as_ptr(&self) -> *const BIGNUM {
        self.0.as_ptr()
    }

    fn as_mut_ptr(&mut self) -> *mut BIGNUM {
        self.0.as_ptr()
    }
}

impl PartialEq for BigNum {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BigNum {}

impl PartialOrd for BigNum {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigNum {
    fn cmp(&self, other: &Self) -> Ordering {
        // SAFETY: Both `BIGNUM`s are valid and only read.
        let ret = unsafe { BN_cmp(self.0.as_ptr(), other.0.as_ptr()) };
        ret.cmp(&0)
    }
}

impl core::fmt::Debug for BigNum {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        // The value may be a private scalar.
        f.debug_struct("BigNum").field("num_bits", &self.num_bits()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nist_and_sec_names_resolve_to_the_same_group() -> Result<()> {
        let nist = EcGroup::from_curve_name("P-256")?;
        let x962 = EcGroup::from_curve_name("prime256v1")?;
        assert_eq!(nist.curve_nid(), x962.curve_nid());

        let nist = EcGroup::from_curve_name("P-521")?;
        let sec = EcGroup::from_curve_name("secp521r1")?;
        assert_eq!(nist.curve_nid(), sec.curve_nid());
        Ok(())
    }

    #[test]
    fn coordinate_sizes() -> Result<()> {
        assert_eq!(32, EcGroup::from_curve_name("P-256")?.coordinate_byte_count()?);
        assert_eq!(48, EcGroup::from_curve_name("P-384")?.coordinate_byte_count()?);
        assert_eq!(66, EcGroup::from_curve_name("P-521")?.coordinate_byte_count()?);
        assert_eq!(521, EcGroup::from_curve_name("P-521")?.degree()?);
        Ok(())
    }

    #[test]
    fn unknown_or_empty_curve_names_are_rejected() {
        assert_eq!(Some(Error::InvalidCurveName), EcGroup::from_curve_name("not-a-curve").err());
        assert_eq!(Some(Error::InvalidCurveName), EcGroup::from_curve_name("").err());
        assert_eq!(Some(Error::InvalidCurveName), EcGroup::from_curve_name("P-256\0").err());
    }

    #[test]
    fn p256_order_has_256_bits() -> Result<()> {
        let order = EcGroup::from_curve_name("P-256")?.order()?;
        assert_eq!(256, order.num_bits());
        assert!(!order.is_negative());
        Ok(())
    }

    #[test]
    fn big_numbers_compare_by_value() -> Result<()> {
        let one = BigNum::from_slice(&[0x01])?;
        let padded_one = BigNum::from_slice(&[0x00, 0x00, 0x01])?;
        let big = BigNum::from_slice(&[0x01, 0x00])?;

        assert_eq!(one, padded_one);
        assert!(one < big);
        assert_eq!(vec![0x00, 0x01, 0x00], big.to_padded_vec(3)?);
        assert!(BigNum::from_slice(&[])?.is_zero());
        Ok(())
    }

    #[test]
    fn padding_smaller_than_the_value_fails() -> Result<()> {
        let big = BigNum::from_slice(&[0x01, 0x00])?;
        assert!(big.to_padded_vec(1).is_err());
        Ok(())
    }

    #[test]
    fn subtraction_can_go_negative() -> Result<()> {
        let one = BigNum::from_slice(&[0x01])?;
        let big = BigNum::from_slice(&[0x01, 0x00])?;

        assert_eq!(BigNum::from_slice(&[0xff])?, big.try_sub(&one)?);
        assert!(one.try_sub(&big)?.is_negative());
        Ok(())
    }

    #[test]
    fn p256_field_prime_exceeds_the_order() -> Result<()> {
        let group = EcGroup::from_curve_name("P-256")?;
        let p = group.field_prime()?;

        assert_eq!(256, p.num_bits());
        assert!(group.order()? < p);
        Ok(())
    }

    #[test]
    fn multiplying_the_generator() -> Result<()> {
        let group = EcGroup::from_curve_name("P-256")?;
        let one = group.mul_generator(&BigNum::from_slice(&[0x01])?)?;
        let two = group.mul_generator(&BigNum::from_slice(&[0x02])?)?;

        assert_eq!(65, one.len());
        assert_eq!(0x04, one[0]);
        assert_ne!(one, two);
        Ok(())
    }
}
