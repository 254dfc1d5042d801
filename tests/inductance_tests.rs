//! Integration tests for the resonant-circuit arithmetic

mod common;
use common::*;

use lc_meter::Calibration;
use lc_meter::config::CALIBRATION_CAPACITANCE_UF;
use lc_meter::inductance::{
    FOUR_PI_SQUARED, external_inductance, intrinsic_inductance, period_square, relative_growth,
};

const TICKS_PER_MICRO: f64 = 48.0;

#[test]
fn intrinsic_inductance_of_reference_tank() {
    let intrinsic =
        intrinsic_inductance(1000.0, 1100.0, TICKS_PER_MICRO, CALIBRATION_CAPACITANCE_UF);

    assert!(approx_eq(intrinsic, 2165.807626032034, 1e-12));
}

#[test]
fn external_inductance_of_reference_reading() {
    let intrinsic =
        intrinsic_inductance(1000.0, 1100.0, TICKS_PER_MICRO, CALIBRATION_CAPACITANCE_UF);

    let external = external_inductance(intrinsic, 1000.0, 1050.0);

    assert!(approx_eq(external, 221.9952816682835, 1e-12));
}

#[test]
fn calibration_agrees_with_free_functions() {
    let calibration = Calibration {
        lc: 1000.0,
        lcc: 1100.0,
    };

    let direct =
        intrinsic_inductance(1000.0, 1100.0, TICKS_PER_MICRO, CALIBRATION_CAPACITANCE_UF);

    assert_eq!(
        calibration.intrinsic_inductance_uh(TICKS_PER_MICRO, CALIBRATION_CAPACITANCE_UF),
        direct
    );
}

#[test]
fn growth_is_never_negative() {
    for measured in [0.0, 1.0, 500.0, 999.0, 1000.0] {
        assert_eq!(relative_growth(1000.0, measured), 0.0);
    }
}

#[test]
fn growth_increases_with_measured_period() {
    let mut previous = 0.0;
    for measured in (1001..1200).step_by(7) {
        let growth = relative_growth(1000.0, measured as f64);
        assert!(growth > previous);
        previous = growth;
    }
}

#[test]
fn growth_is_independent_of_tick_rate() {
    // Scaling both periods by the same factor leaves the ratio unchanged
    let at_48 = relative_growth(1000.0, 1050.0);
    let at_24 = relative_growth(500.0, 525.0);

    assert!(approx_eq(at_24, at_48, 1e-12));
}

#[test]
fn resonance_round_trip_recovers_inductance() {
    // Tank of 100 µH with 10 nF gives T = 2π·sqrt(L·C) µs
    let l_uh = 100.0;
    let c_uf = 0.01;
    let period_us = (FOUR_PI_SQUARED * l_uh * c_uf).sqrt();

    let ticks = period_us * TICKS_PER_MICRO;
    let recovered = period_square(ticks, TICKS_PER_MICRO) / (FOUR_PI_SQUARED * c_uf);

    assert!(approx_eq(recovered, l_uh, 1e-12));
}

#[test]
fn calibration_validity_requires_longer_lcc() {
    assert!(!Calibration::default().is_valid());
    assert!(!Calibration { lc: 1000.0, lcc: 1000.0 }.is_valid());
    assert!(!Calibration { lc: 1000.0, lcc: 990.0 }.is_valid());
    assert!(Calibration { lc: 1000.0, lcc: 1000.5 }.is_valid());
}
