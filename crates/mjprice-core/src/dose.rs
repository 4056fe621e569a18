//! Dose-to-dial conversion for multi-dose injector pens.

use serde::Serialize;
use thiserror::Error;

use crate::record::DoseLevel;

/// Dial increments representing a pen's full labeled strength.
pub const TOTAL_CLICKS: u32 = 60;

/// Labeled-strength doses deliverable from one pen, overfill included.
pub const DOSES_PER_PEN: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DoseError {
    #[error("dose must be a positive number of mg, got {0}")]
    InvalidDose(f64),
}

/// Result of [`compute_dial_setting`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DialSetting {
    pub pen_strength_mg: f64,
    /// Dose actually used after clamping to the pen strength.
    pub dose_mg: f64,
    pub clicks: u32,
    pub uses_per_pen: u64,
}

/// Converts a per-use dose into dial clicks and uses per pen.
///
/// Doses above the pen strength are clamped to it. `clicks` is
/// `dose * 60 / strength` rounded half-up; `uses_per_pen` is
/// `floor(strength * 4 / dose)`.
///
/// # Errors
///
/// Returns [`DoseError::InvalidDose`] if `dose_mg` is not finite or not
/// greater than zero.
pub fn compute_dial_setting(pen: DoseLevel, dose_mg: f64) -> Result<DialSetting, DoseError> {
    if !dose_mg.is_finite() || dose_mg <= 0.0 {
        return Err(DoseError::InvalidDose(dose_mg));
    }

    let pen_strength_mg = pen.mg();
    let dose_mg = dose_mg.min(pen_strength_mg);

    // Both operands are positive, so `round` (half away from zero) is half-up.
    let clicks = (dose_mg * f64::from(TOTAL_CLICKS) / pen_strength_mg).round();
    let total_available_mg = pen_strength_mg * f64::from(DOSES_PER_PEN);
    let uses = (total_available_mg / dose_mg).floor();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (clicks, uses_per_pen) = (clicks as u32, uses as u64);

    Ok(DialSetting {
        pen_strength_mg,
        dose_mg,
        clicks,
        uses_per_pen,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_mg_pen_five_mg_dose() {
        let setting = compute_dial_setting(DoseLevel::Mg10, 5.0).unwrap();
        assert_eq!(setting.clicks, 30);
        assert_eq!(setting.uses_per_pen, 8);
    }

    #[test]
    fn five_mg_pen_two_and_a_half_mg_dose() {
        let setting = compute_dial_setting(DoseLevel::Mg5, 2.5).unwrap();
        assert_eq!(setting.clicks, 30);
        assert_eq!(setting.uses_per_pen, 8);
    }

    #[test]
    fn dose_above_pen_strength_is_clamped() {
        let clamped = compute_dial_setting(DoseLevel::Mg10, 15.0).unwrap();
        let exact = compute_dial_setting(DoseLevel::Mg10, 10.0).unwrap();
        assert_eq!(clamped, exact);
        assert_eq!(clamped.clicks, TOTAL_CLICKS);
        assert_eq!(clamped.uses_per_pen, u64::from(DOSES_PER_PEN));
        assert!((clamped.dose_mg - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_and_negative_doses_are_rejected() {
        assert!(matches!(
            compute_dial_setting(DoseLevel::Mg10, 0.0),
            Err(DoseError::InvalidDose(_))
        ));
        assert!(matches!(
            compute_dial_setting(DoseLevel::Mg10, -3.0),
            Err(DoseError::InvalidDose(_))
        ));
    }

    #[test]
    fn non_finite_doses_are_rejected() {
        for dose in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(compute_dial_setting(DoseLevel::Mg5, dose).is_err());
        }
    }

    #[test]
    fn clicks_round_half_up() {
        // 0.125 * 60 / 15 = 0.5
        let setting = compute_dial_setting(DoseLevel::Mg15, 0.125).unwrap();
        assert_eq!(setting.clicks, 1);
        assert_eq!(setting.uses_per_pen, 480);
    }

    #[test]
    fn fractional_results() {
        let setting = compute_dial_setting(DoseLevel::Mg12_5, 3.0).unwrap();
        assert_eq!(setting.clicks, 14); // 14.4
        assert_eq!(setting.uses_per_pen, 16); // 50 / 3 = 16.67

        let setting = compute_dial_setting(DoseLevel::Mg7_5, 2.5).unwrap();
        assert_eq!(setting.clicks, 20);
        assert_eq!(setting.uses_per_pen, 12);
    }

    #[test]
    fn repeated_calls_agree() {
        let a = compute_dial_setting(DoseLevel::Mg2_5, 1.2);
        let b = compute_dial_setting(DoseLevel::Mg2_5, 1.2);
        assert_eq!(a, b);
    }
}
