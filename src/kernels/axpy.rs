use crate::simd::{F64x4, SimdFloat, SimdLanes};

#[inline(always)]
fn check_preconditions(data: &[f64], out: &[f64], lanes: usize) {
    assert_eq!(
        data.len(),
        out.len(),
        "data and out must have the same length"
    );
    assert!(
        data.len() % lanes == 0,
        "length {} must be a multiple of the {lanes} lane vector width",
        data.len()
    );
}

/// Computes `out[i] += s * data[i]` one element at a time.
///
/// # Panics
///
/// Panics if `data` and `out` have different lengths.
pub fn scalar_axpy(s: f64, data: &[f64], out: &mut [f64]) {
    assert_eq!(
        data.len(),
        out.len(),
        "data and out must have the same length"
    );

    for (y, x) in out.iter_mut().zip(data.iter()) {
        *y += s * *x;
    }
}

/// Computes `out[i] += s * data[i]` as a separate vector multiply and add.
///
/// Each step loads a lane of `out` and a lane of `data`, multiplies the data lane
/// by a broadcast of `s`, adds it to the `out` lane and stores the result back.
///
/// # Panics
///
/// Panics if the lengths differ or are not a multiple of `V::LANES`; there is no
/// tail loop.
#[inline(always)]
pub fn simd_axpy<V: SimdFloat<Elem = f64>>(s: f64, data: &[f64], out: &mut [f64]) {
    check_preconditions(data, out, V::LANES);

    let len = data.len();
    let s_vec = V::splat(s);
    let data_ptr = data.as_ptr();
    let out_ptr = out.as_mut_ptr();

    let mut i = 0;
    while i < len {
        // SAFETY: len is a multiple of V::LANES, so i + V::LANES <= len for both buffers.
        unsafe {
            let y = V::load(out_ptr.add(i));
            let x = V::load(data_ptr.add(i));
            (y + x * s_vec).store_at(out_ptr.add(i));
        }
        i += V::LANES;
    }
}

/// Computes `out[i] += s * data[i]` with one fused multiply-add per lane.
///
/// # Panics
///
/// Same preconditions as [`simd_axpy`].
#[inline(always)]
pub fn simd_axpy_fma<V: SimdFloat<Elem = f64>>(s: f64, data: &[f64], out: &mut [f64]) {
    check_preconditions(data, out, V::LANES);

    let len = data.len();
    let s_vec = V::splat(s);
    let data_ptr = data.as_ptr();
    let out_ptr = out.as_mut_ptr();

    let mut i = 0;
    while i < len {
        // SAFETY: see simd_axpy.
        unsafe {
            let x = V::load(data_ptr.add(i));
            let y = V::load(out_ptr.add(i));
            x.fmadd(s_vec, y).store_at(out_ptr.add(i));
        }
        i += V::LANES;
    }
}

/// AXPY variants on an output slice, using the default 256-bit lanes.
///
/// ```rust
/// use lanebench::kernels::axpy::Axpy;
///
/// let data = [1.0, 2.0, 3.0, 4.0];
/// let mut out = [0.5, 1.0, 1.5, 2.0];
/// out.simd_axpy_fma(2.0, &data);
/// assert_eq!(out, [2.5, 5.0, 7.5, 10.0]);
/// ```
pub trait Axpy {
    fn scalar_axpy(&mut self, s: f64, data: &[f64]);
    fn simd_axpy(&mut self, s: f64, data: &[f64]);
    fn simd_axpy_fma(&mut self, s: f64, data: &[f64]);
}

impl Axpy for [f64] {
    #[inline(always)]
    fn scalar_axpy(&mut self, s: f64, data: &[f64]) {
        scalar_axpy(s, data, self)
    }

    #[inline(always)]
    fn simd_axpy(&mut self, s: f64, data: &[f64]) {
        simd_axpy::<F64x4>(s, data, self)
    }

    #[inline(always)]
    fn simd_axpy_fma(&mut self, s: f64, data: &[f64]) {
        simd_axpy_fma::<F64x4>(s, data, self)
    }
}

/// The three AXPY variants, instantiated with the default 256-bit lanes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AxpyVariant {
    Scalar,
    Vector,
    VectorFma,
}

impl AxpyVariant {
    pub const ALL: [AxpyVariant; 3] = [
        AxpyVariant::Scalar,
        AxpyVariant::Vector,
        AxpyVariant::VectorFma,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AxpyVariant::Scalar => "daxpy",
            AxpyVariant::Vector => "daxpyVector",
            AxpyVariant::VectorFma => "daxpyVectorFma",
        }
    }

    /// Runs this variant once over `out`.
    pub fn run(&self, s: f64, data: &[f64], out: &mut [f64]) {
        match self {
            AxpyVariant::Scalar => scalar_axpy(s, data, out),
            AxpyVariant::Vector => simd_axpy::<F64x4>(s, data, out),
            AxpyVariant::VectorFma => simd_axpy_fma::<F64x4>(s, data, out),
        }
    }
}
