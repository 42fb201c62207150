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

//! Checks that failing key generations release every OpenSSL allocation.
//!
//! Runs without the test harness: the counting allocators can only be installed before
//! OpenSSL allocates anything, and the measurement must not race with other tests.

use libc::{c_char, c_int, c_void, size_t};
use log::info;
use ossl_ec::{generate_ec_keypair, PKey};
use std::sync::atomic::{AtomicIsize, Ordering};

extern "C" {
    fn CRYPTO_set_mem_functions(
        malloc_fn: unsafe extern "C" fn(size_t, *const c_char, c_int) -> *mut c_void,
        realloc_fn: unsafe extern "C" fn(*mut c_void, size_t, *const c_char, c_int) -> *mut c_void,
        free_fn: unsafe extern "C" fn(*mut c_void, *const c_char, c_int),
    ) -> c_int;
}

/// Bytes currently allocated by OpenSSL.
static LIVE_BYTES: AtomicIsize = AtomicIsize::new(0);

/// Every allocation is prefixed with its size. 16 bytes keep the payload aligned for any type.
const HEADER: usize = 16;

unsafe extern "C" fn counting_malloc(num: size_t, _file: *const c_char, _line: c_int) -> *mut c_void {
    // SAFETY: The block is large enough for the header, which is written before use.
    unsafe {
        let block = libc::malloc(num + HEADER) as *mut u8;
        if block.is_null() {
            return block as *mut c_void;
        }
        (block as *mut usize).write(num);
        LIVE_BYTES.fetch_add(num as isize, Ordering::SeqCst);
        block.add(HEADER) as *mut c_void
    }
}

unsafe extern "C" fn counting_realloc(
    addr: *mut c_void,
    num: size_t,
    file: *const c_char,
    line: c_int,
) -> *mut c_void {
    if addr.is_null() {
        // SAFETY: Same contract as `counting_malloc`.
        return unsafe { counting_malloc(num, file, line) };
    }
    // SAFETY: `addr` was returned by one of the counting allocators, so the header precedes it.
    unsafe {
        let block = (addr as *mut u8).sub(HEADER);
        let old = (block as *mut usize).read();
        let block = libc::realloc(block as *mut c_void, num + HEADER) as *mut u8;
        if block.is_null() {
            return block as *mut c_void;
        }
        (block as *mut usize).write(num);
        LIVE_BYTES.fetch_add(num as isize - old as isize, Ordering::SeqCst);
        block.add(HEADER) as *mut c_void
    }
}

unsafe extern "C" fn counting_free(addr: *mut c_void, _file: *const c_char, _line: c_int) {
    if addr.is_null() {
        return;
    }
    // SAFETY: `addr` was returned by one of the counting allocators, so the header precedes it.
    unsafe {
        let block = (addr as *mut u8).sub(HEADER);
        let old = (block as *mut usize).read();
        LIVE_BYTES.fetch_sub(old as isize, Ordering::SeqCst);
        libc::free(block as *mut c_void);
    }
}

const WARM_UP_ROUNDS: usize = 16;
const ROUNDS: usize = 2000;
/// A leak of even a few bytes per failing call exceeds this.
const MAX_DRIFT_BYTES: isize = 4096;

fn failing_generations(rounds: usize) {
    for _ in 0..rounds {
        assert!(generate_ec_keypair("not-a-curve").is_none());
        assert!(PKey::generate_ec("rsa").is_err());
    }
}

fn main() {
    // SAFETY: Called before any OpenSSL allocation, with functions honoring the
    // malloc/realloc/free contract.
    let installed =
        unsafe { CRYPTO_set_mem_functions(counting_malloc, counting_realloc, counting_free) };
    assert_eq!(1, installed, "OpenSSL allocated memory before the allocators were installed");
    env_logger::builder().is_test(true).filter_level(log::LevelFilter::Off).init();

    // Providers, name maps and error strings are loaded lazily on first use.
    failing_generations(WARM_UP_ROUNDS);
    let baseline = LIVE_BYTES.load(Ordering::SeqCst);

    failing_generations(ROUNDS);
    let drift = LIVE_BYTES.load(Ordering::SeqCst) - baseline;

    info!("Live OpenSSL bytes drifted by {drift} after {ROUNDS} failing generations");
    assert!(drift <= MAX_DRIFT_BYTES, "drift of {drift} bytes after {ROUNDS} failing generations");
    println!("leak_test: ok ({drift} bytes drift)");
}
