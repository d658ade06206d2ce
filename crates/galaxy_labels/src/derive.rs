//! Branching rules that turn one galaxy's vote fractions into training targets.
//!
//! Every function here is pure: the result depends only on the row it is given.
//! Fields are read lazily, so a row only needs the fractions its branch consults.

use crate::types::{
    BinaryClass, EllipticalSubtype, GalaxyLabels, LabelError, LabelResult, Morphology,
    SpiralSubtype,
};
use data_contracts::{VoteField, VoteRow};

/// Added to `not_edge_on_frac` before it is used as the bar-ratio denominator.
pub const BAR_EPSILON: f64 = 1e-5;

fn nonzero_denominator(row: &VoteRow, field: VoteField) -> LabelResult<f64> {
    let value = row.require(field)?;
    if value == 0.0 {
        return Err(LabelError::DivisionByZero {
            galaxy_id: row.galaxy_id,
            denominator: field,
        });
    }
    Ok(value)
}

/// Elliptical only when `elliptical_frac > spiral_frac`; ties go to spiral.
pub fn derive_binary(row: &VoteRow) -> LabelResult<BinaryClass> {
    let elliptical = row.require(VoteField::Elliptical)?;
    let spiral = row.require(VoteField::Spiral)?;
    if elliptical > spiral {
        Ok(BinaryClass::Elliptical)
    } else {
        Ok(BinaryClass::Spiral)
    }
}

/// Edge-on check normalised by `spiral_frac`, then the bar check normalised by
/// `not_edge_on_frac + BAR_EPSILON`.
///
/// The two stages use different denominators (see DESIGN.md).
pub fn derive_spiral_subtype(row: &VoteRow) -> LabelResult<SpiralSubtype> {
    let edge_on = row.require(VoteField::EdgeOn)?;
    let not_edge_on = row.require(VoteField::NotEdgeOn)?;
    let spiral = nonzero_denominator(row, VoteField::Spiral)?;

    let edge_on_ratio = edge_on / spiral;
    let not_edge_on_ratio = not_edge_on / spiral;
    if edge_on_ratio > not_edge_on_ratio {
        return Ok(SpiralSubtype::EdgeOn);
    }

    let bar = row.require(VoteField::Bar)?;
    let no_bar = row.require(VoteField::NoBar)?;
    let bar_ratio = bar / (not_edge_on + BAR_EPSILON);
    let no_bar_ratio = no_bar / (not_edge_on + BAR_EPSILON);
    if bar_ratio > no_bar_ratio {
        Ok(SpiralSubtype::Barred)
    } else {
        Ok(SpiralSubtype::NotBarred)
    }
}

/// Argmax of the roundness ratios. Round wins every tie, in-between wins a tie with cigar.
pub fn derive_elliptical_subtype(row: &VoteRow) -> LabelResult<EllipticalSubtype> {
    let round = row.require(VoteField::Round)?;
    let inbetween = row.require(VoteField::InBetween)?;
    let cigar = row.require(VoteField::Cigar)?;
    let elliptical = nonzero_denominator(row, VoteField::Elliptical)?;

    let round_ratio = round / elliptical;
    let inbetween_ratio = inbetween / elliptical;
    let cigar_ratio = cigar / elliptical;

    if round_ratio >= inbetween_ratio && round_ratio >= cigar_ratio {
        Ok(EllipticalSubtype::Round)
    } else if inbetween_ratio >= cigar_ratio {
        Ok(EllipticalSubtype::InBetween)
    } else {
        Ok(EllipticalSubtype::Cigar)
    }
}

/// Binary decision followed by exactly one sub-type decision.
pub fn derive(row: &VoteRow) -> LabelResult<Morphology> {
    match derive_binary(row)? {
        BinaryClass::Elliptical => derive_elliptical_subtype(row).map(Morphology::Elliptical),
        BinaryClass::Spiral => derive_spiral_subtype(row).map(Morphology::Spiral),
    }
}

pub fn derive_labels(row: &VoteRow) -> LabelResult<GalaxyLabels> {
    Ok(GalaxyLabels {
        galaxy_id: row.galaxy_id,
        morphology: derive(row)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(VoteField, f64)]) -> VoteRow {
        pairs
            .iter()
            .fold(VoteRow::new(1), |row, (field, value)| row.with(*field, *value))
    }

    #[test]
    fn elliptical_scenario() {
        let r = row(&[
            (VoteField::Elliptical, 0.9),
            (VoteField::Spiral, 0.1),
            (VoteField::Round, 0.9),
            (VoteField::InBetween, 0.0),
            (VoteField::Cigar, 0.0),
        ]);
        assert_eq!(derive_binary(&r).unwrap().one_hot(), [1.0, 0.0]);
        let labels = derive_labels(&r).unwrap();
        assert_eq!(labels.elliptical_target(), Some([1.0, 0.0, 0.0]));
        assert_eq!(labels.spiral_target(), None);
    }

    #[test]
    fn not_barred_spiral_scenario() {
        let r = row(&[
            (VoteField::Elliptical, 0.1),
            (VoteField::Spiral, 0.9),
            (VoteField::EdgeOn, 0.1),
            (VoteField::NotEdgeOn, 0.8),
            (VoteField::Bar, 0.3),
            (VoteField::NoBar, 0.5),
        ]);
        let labels = derive_labels(&r).unwrap();
        assert_eq!(labels.binary_target(), [0.0, 1.0]);
        assert_eq!(labels.spiral_target(), Some([0.0, 1.0, 0.0]));
        assert_eq!(labels.elliptical_target(), None);
    }

    #[test]
    fn zero_not_edge_on_is_guarded_and_ties_to_not_barred() {
        let r = row(&[
            (VoteField::Elliptical, 0.2),
            (VoteField::Spiral, 0.8),
            (VoteField::EdgeOn, 0.0),
            (VoteField::NotEdgeOn, 0.0),
            (VoteField::Bar, 0.0),
            (VoteField::NoBar, 0.0),
        ]);
        assert_eq!(derive_spiral_subtype(&r).unwrap(), SpiralSubtype::NotBarred);
    }

    #[test]
    fn edge_on_short_circuits_bar_fields() {
        let r = row(&[
            (VoteField::Elliptical, 0.1),
            (VoteField::Spiral, 0.9),
            (VoteField::EdgeOn, 0.7),
            (VoteField::NotEdgeOn, 0.2),
        ]);
        assert_eq!(derive(&r).unwrap(), Morphology::Spiral(SpiralSubtype::EdgeOn));
    }

    #[test]
    fn barred_spiral() {
        let r = row(&[
            (VoteField::Elliptical, 0.3),
            (VoteField::Spiral, 0.7),
            (VoteField::EdgeOn, 0.05),
            (VoteField::NotEdgeOn, 0.65),
            (VoteField::Bar, 0.4),
            (VoteField::NoBar, 0.25),
        ]);
        assert_eq!(derive(&r).unwrap(), Morphology::Spiral(SpiralSubtype::Barred));
    }

    #[test]
    fn zero_spiral_fraction_on_spiral_branch() {
        let r = row(&[
            (VoteField::Elliptical, 0.0),
            (VoteField::Spiral, 0.0),
            (VoteField::EdgeOn, 0.0),
            (VoteField::NotEdgeOn, 0.0),
        ]);
        assert_eq!(
            derive(&r).unwrap_err(),
            LabelError::DivisionByZero {
                galaxy_id: 1,
                denominator: VoteField::Spiral
            }
        );
    }

    #[test]
    fn inbetween_beats_cigar_on_tie() {
        let r = row(&[
            (VoteField::Elliptical, 0.8),
            (VoteField::Spiral, 0.2),
            (VoteField::Round, 0.1),
            (VoteField::InBetween, 0.35),
            (VoteField::Cigar, 0.35),
        ]);
        assert_eq!(derive_elliptical_subtype(&r).unwrap(), EllipticalSubtype::InBetween);
    }

    #[test]
    fn cigar_when_strictly_largest() {
        let r = row(&[
            (VoteField::Elliptical, 0.8),
            (VoteField::Spiral, 0.2),
            (VoteField::Round, 0.1),
            (VoteField::InBetween, 0.2),
            (VoteField::Cigar, 0.5),
        ]);
        assert_eq!(derive_elliptical_subtype(&r).unwrap(), EllipticalSubtype::Cigar);
    }

    #[test]
    fn missing_field_on_taken_branch() {
        let r = row(&[
            (VoteField::Elliptical, 0.8),
            (VoteField::Spiral, 0.2),
            (VoteField::Round, 0.5),
            (VoteField::InBetween, 0.3),
        ]);
        assert_eq!(
            derive(&r).unwrap_err(),
            LabelError::MissingField {
                galaxy_id: 1,
                field: VoteField::Cigar
            }
        );
    }

    #[test]
    fn zero_elliptical_fraction_is_guarded() {
        let r = row(&[
            (VoteField::Elliptical, 0.0),
            (VoteField::Round, 0.0),
            (VoteField::InBetween, 0.0),
            (VoteField::Cigar, 0.0),
        ]);
        let expected = LabelError::DivisionByZero {
            galaxy_id: 1,
            denominator: VoteField::Elliptical,
        };
        assert_eq!(derive_elliptical_subtype(&r).unwrap_err(), expected);

        // Only a row outside the vote contract reaches the branch through `derive`.
        let r = r.with(VoteField::Spiral, -0.1);
        assert_eq!(derive_binary(&r).unwrap(), BinaryClass::Elliptical);
        assert_eq!(derive(&r).unwrap_err(), expected);
    }
}
