//! Resonant-circuit arithmetic.
//!
//! For a parallel LC tank the period is `T = 2π·sqrt(L·C)`, so `T²` grows
//! linearly with both inductance and capacitance. Working in microseconds and
//! microfarads yields microhenries directly.
//!
//! Everything here is `f64`: LC and LCC periods are close in magnitude and the
//! difference of their squares cancels badly in single precision.

use core::f64::consts::PI;

/// `4·π²`.
pub const FOUR_PI_SQUARED: f64 = 4.0 * PI * PI;

/// Squared period in µs² of a period given in timer ticks.
#[inline]
pub fn period_square(ticks: f64, ticks_per_micro: f64) -> f64 {
    let micros = ticks / ticks_per_micro;
    micros * micros
}

/// Fractional growth of the squared period from `p1` to `p2`:
/// `(p2² - p1²) / p1²`, clamped to zero when `p2` is not longer than `p1`.
#[inline]
pub fn relative_growth(p1: f64, p2: f64) -> f64 {
    let p1_sq = p1 * p1;
    let p2_sq = p2 * p2;
    let growth = (p2_sq - p1_sq) / p1_sq;
    if growth < 0.0 { 0.0 } else { growth }
}

/// Inductance of the oscillator's own tank in µH.
///
/// Adding `cal_cap_uf` in parallel raises `T²` by `4π²·L·C_cal`, so
/// `L = (T_lcc² - T_lc²) / (4π²·C_cal)`.
pub fn intrinsic_inductance(lc: f64, lcc: f64, ticks_per_micro: f64, cal_cap_uf: f64) -> f64 {
    let coefficient = 1.0 / (FOUR_PI_SQUARED * cal_cap_uf);
    (period_square(lcc, ticks_per_micro) - period_square(lc, ticks_per_micro)) * coefficient
}

/// Capacitance of the oscillator's own tank in µF.
///
/// `C_cal / relative_growth(LC, LCC)`; infinite when the calibration periods
/// show no growth.
pub fn intrinsic_capacitance(lc: f64, lcc: f64, cal_cap_uf: f64) -> f64 {
    cal_cap_uf / relative_growth(lc, lcc)
}

/// Inductance in µH of a component in series with the tank, given the
/// intrinsic inductance and the baseline and measured mean periods in ticks.
#[inline]
pub fn external_inductance(intrinsic_uh: f64, lc: f64, measured: f64) -> f64 {
    intrinsic_uh * relative_growth(lc, measured)
}
