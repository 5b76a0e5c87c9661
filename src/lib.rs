use std::os::raw::{c_double, c_int};

pub mod algo;
pub mod base;
pub mod checkpoint;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod explain;
pub mod io;
pub mod matrix;

pub use base::{Contamination, Decision, DetectorBase, OutlierDetector, ProbaMethod};
pub use config::DetectorConfig;
pub use detector::Copod;
pub use error::{CopodError, Result};
pub use explain::Explanation;
pub use matrix::Matrix;

// --- Detector FFI ---

const FFI_OK: c_int = 0;
const FFI_NULL: c_int = -1;
const FFI_ERROR: c_int = -2;

/// Copy a row-major C buffer into a validated matrix.
///
/// # Safety
/// `data` must point to `rows * cols` readable doubles.
unsafe fn matrix_from_raw(data: *const c_double, rows: usize, cols: usize) -> Option<Matrix> {
    let values = unsafe { std::slice::from_raw_parts(data, rows.checked_mul(cols)?) };
    Matrix::from_vec(rows, cols, values.to_vec()).ok()
}

/// Returns null when `contamination` is outside (0, 0.5].
#[unsafe(no_mangle)]
pub extern "C" fn copod_create(contamination: c_double) -> *mut Copod {
    match Copod::new(contamination) {
        Ok(detector) => Box::into_raw(Box::new(detector)),
        Err(_) => std::ptr::null_mut(),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn copod_free(ptr: *mut Copod) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        let _ = Box::from_raw(ptr);
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn copod_fit(
    ptr: *mut Copod,
    data: *const c_double,
    rows: usize,
    cols: usize,
) -> c_int {
    if ptr.is_null() || data.is_null() {
        return FFI_NULL;
    }
    let Some(table) = (unsafe { matrix_from_raw(data, rows, cols) }) else {
        return FFI_ERROR;
    };
    let detector = unsafe { &mut *ptr };
    match detector.fit(&table) {
        Ok(()) => FFI_OK,
        Err(_) => FFI_ERROR,
    }
}

/// Writes one score per row into `out_scores`, which must hold `rows`
/// doubles.
#[unsafe(no_mangle)]
pub extern "C" fn copod_score(
    ptr: *mut Copod,
    data: *const c_double,
    rows: usize,
    cols: usize,
    out_scores: *mut c_double,
) -> c_int {
    if ptr.is_null() || data.is_null() || out_scores.is_null() {
        return FFI_NULL;
    }
    let Some(table) = (unsafe { matrix_from_raw(data, rows, cols) }) else {
        return FFI_ERROR;
    };
    let detector = unsafe { &mut *ptr };
    match detector.score(&table) {
        Ok(scores) => {
            let out = unsafe { std::slice::from_raw_parts_mut(out_scores, rows) };
            out.copy_from_slice(&scores);
            FFI_OK
        }
        Err(_) => FFI_ERROR,
    }
}

/// Threshold of the last scoring pass, NaN before any.
#[unsafe(no_mangle)]
pub extern "C" fn copod_threshold(ptr: *const Copod) -> c_double {
    if ptr.is_null() {
        return f64::NAN;
    }
    let detector = unsafe { &*ptr };
    if detector.decision_scores().is_empty() {
        return f64::NAN;
    }
    detector.threshold()
}

/// Copies up to `len` labels into `out_labels`; returns how many were
/// written.
#[unsafe(no_mangle)]
pub extern "C" fn copod_labels(ptr: *const Copod, out_labels: *mut u8, len: usize) -> usize {
    if ptr.is_null() || out_labels.is_null() {
        return 0;
    }
    let detector = unsafe { &*ptr };
    let labels = detector.labels();
    let n = labels.len().min(len);
    let out = unsafe { std::slice::from_raw_parts_mut(out_labels, n) };
    out.copy_from_slice(&labels[..n]);
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffi_lifecycle() {
        assert!(copod_create(0.7).is_null());

        let ptr = copod_create(0.25);
        assert!(!ptr.is_null());
        assert!(copod_threshold(ptr).is_nan());

        let data = [1.0, 2.0, 3.0, 100.0];
        assert_eq!(copod_fit(ptr, data.as_ptr(), 4, 1), FFI_OK);
        assert!(copod_threshold(ptr).is_finite());

        let mut labels = [9u8; 4];
        assert_eq!(copod_labels(ptr, labels.as_mut_ptr(), labels.len()), 4);
        assert_eq!(labels, [0, 0, 0, 1]);

        let query = [2.5, 500.0];
        let mut scores = [0.0; 2];
        assert_eq!(
            copod_score(ptr, query.as_ptr(), 2, 1, scores.as_mut_ptr()),
            FFI_OK
        );
        assert!(scores[1] > scores[0]);

        // Width mismatch against the training rows
        assert_eq!(
            copod_score(ptr, query.as_ptr(), 1, 2, scores.as_mut_ptr()),
            FFI_ERROR
        );

        copod_free(ptr);
    }

    #[test]
    fn test_ffi_null_guards() {
        assert_eq!(copod_fit(std::ptr::null_mut(), std::ptr::null(), 0, 0), FFI_NULL);
        assert_eq!(copod_labels(std::ptr::null(), std::ptr::null_mut(), 3), 0);
        copod_free(std::ptr::null_mut());
    }
}
