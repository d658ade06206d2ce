use galaxy_labels::{
    EllipticalSubtype, LabelError, Morphology, SpiralSubtype, VoteField, VoteRow, VoteTable,
    VoteTableError,
};
use std::io::Write;

const GALAXY_ZOO_CSV: &str = "\
GalaxyID,Class1.1,Class1.2,Class1.3,Class2.1,Class2.2,Class3.1,Class3.2,Class7.1,Class7.2,Class7.3
100008,0.383147,0.616853,0.0,0.0,0.616853,0.038452,0.578401,0.0,0.0,0.0
100023,0.327001,0.663777,0.009222,0.031178,0.632599,0.46737,0.165229,0.0,0.0,0.0
100053,0.765717,0.177352,0.056931,0.0,0.177352,0.0,0.177352,0.0,0.135082,0.630635
100078,0.693377,0.238564,0.068059,0.0,0.238564,0.0,0.238564,0.693377,0.0,0.0
";

#[test]
fn derives_from_galaxy_zoo_columns() {
    let table = VoteTable::from_reader(GALAXY_ZOO_CSV.as_bytes()).unwrap();
    assert_eq!(table.len(), 4);
    let ids: Vec<u64> = table.ids().collect();
    let labels = table.derive_many(&ids).unwrap();
    let morphologies: Vec<Morphology> = labels.iter().map(|l| l.morphology).collect();
    assert_eq!(
        morphologies,
        vec![
            Morphology::Spiral(SpiralSubtype::NotBarred),
            Morphology::Spiral(SpiralSubtype::Barred),
            Morphology::Elliptical(EllipticalSubtype::Cigar),
            Morphology::Elliptical(EllipticalSubtype::Round),
        ]
    );
    assert_eq!(labels[0].galaxy_id, 100008);
}

#[test]
fn unknown_identifier_derives_nothing() {
    let table = VoteTable::from_reader(GALAXY_ZOO_CSV.as_bytes()).unwrap();
    assert_eq!(
        table.derive_for(999).unwrap_err(),
        LabelError::UnknownIdentifier { galaxy_id: 999 }
    );
    assert!(table.lookup(999).is_err());
}

#[test]
fn derive_many_reports_earliest_failure() {
    let table: VoteTable = [
        VoteRow::new(1)
            .with(VoteField::Elliptical, 0.9)
            .with(VoteField::Spiral, 0.1),
        VoteRow::new(2)
            .with(VoteField::Elliptical, 0.0)
            .with(VoteField::Spiral, 0.0)
            .with(VoteField::EdgeOn, 0.0)
            .with(VoteField::NotEdgeOn, 0.0),
    ]
    .into_iter()
    .collect();
    let err = table.derive_many(&[2, 1, 3]).unwrap_err();
    assert_eq!(
        err,
        LabelError::DivisionByZero {
            galaxy_id: 2,
            denominator: VoteField::Spiral
        }
    );
    assert_eq!(err.galaxy_id(), 2);
}

#[test]
fn canonical_headers_and_blank_cells() {
    let csv = "galaxy_id,elliptical_frac,spiral_frac,round_frac,inbetween_frac,cigar_frac\n\
               7,0.6,0.4,,0.2,0.1\n";
    let table = VoteTable::from_reader(csv.as_bytes()).unwrap();
    let row = table.lookup(7).unwrap();
    assert_eq!(row.get(VoteField::Round), None);
    assert_eq!(
        table.derive_for(7).unwrap_err(),
        LabelError::MissingField {
            galaxy_id: 7,
            field: VoteField::Round
        }
    );
}

#[test]
fn rejects_missing_id_column() {
    let err = VoteTable::from_reader("Class1.1,Class1.2\n0.5,0.5\n".as_bytes()).unwrap_err();
    assert!(matches!(err, VoteTableError::MissingIdColumn));
}

#[test]
fn rejects_duplicate_and_malformed_rows() {
    let dup = "GalaxyID,Class1.1\n1,0.5\n1,0.6\n";
    assert!(matches!(
        VoteTable::from_reader(dup.as_bytes()).unwrap_err(),
        VoteTableError::DuplicateId { galaxy_id: 1, line: 3 }
    ));
    let bad_value = "GalaxyID,Class1.1\n1,abc\n";
    assert!(matches!(
        VoteTable::from_reader(bad_value.as_bytes()).unwrap_err(),
        VoteTableError::InvalidValue {
            field: VoteField::Elliptical,
            ..
        }
    ));
    let bad_id = "GalaxyID,Class1.1\nx1,0.5\n";
    assert!(matches!(
        VoteTable::from_reader(bad_id.as_bytes()).unwrap_err(),
        VoteTableError::InvalidId { .. }
    ));
}

#[test]
fn loads_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(GALAXY_ZOO_CSV.as_bytes()).unwrap();
    let table = VoteTable::from_csv_path(file.path()).unwrap();
    assert_eq!(table.len(), 4);

    let missing = VoteTable::from_csv_path(std::path::Path::new("/nonexistent/votes.csv"));
    assert!(matches!(missing.unwrap_err(), VoteTableError::Io { .. }));
}
