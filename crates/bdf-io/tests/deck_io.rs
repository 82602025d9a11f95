use std::fs;

use approx::assert_relative_eq;
use bdf_inp::{FieldValue, FieldWidth};
use bdf_io::{
    IoError, ReadOptions, WriteOptions, read_bdf, read_str, to_string, to_string_with, write_bdf_file,
    write_summary_json,
};
use bdf_model::{BdfModel, Category, ElementType, MassQuery, ModelError, XrefMode};
use nalgebra::Vector3;

fn caero1_lines() -> [String; 2] {
    [
        format!(
            "{:<8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{}",
            "CAERO1", "1000", "1000", "", "10", "", "", "", "1", "+CA1"
        ),
        format!(
            "{:<8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}",
            "+CA1", "0.", "0.", "0.", "1.", "1.", "0.", "0.", "1."
        ),
    ]
}

fn deck() -> String {
    let [caero, caero_cont] = caero1_lines();
    format!(
        "\
SOL 101
CEND
TITLE = ROUND TRIP
SUBCASE 1
  LOAD = 1
  SPC = 11
BEGIN BULK
PARAM,POST,-1
PARAM,WTMASS,.00259
GRID,1,,0.,0.,0.
GRID,2,,1.,0.,0.
GRID,3,,1.,1.,0.
GRID,4,,0.,1.,0.
GRID,5,7,1.,90.,2.
CORD2C,7,,0.,0.,0.,0.,0.,1.
,1.,0.,0.
$ elements
CQUAD4,100,10,1,2,3,4
CBAR,101,20,1,2,0.,0.,1.
CONM2,102,5,,2.5
PSHELL,10,1,.1
PBAR,20,1,2.
MAT1,1,2.1+5,,.3,7.85-9
FORCE,1,3,,10.,0.,0.,-1.
PLOAD2,1,.5,100
SPC1,10,123456,1,THRU,4
SPCADD,11,10
{caero}
{caero_cont}
ENDDATA
"
    )
}

fn entities(model: &BdfModel) -> Vec<(Category, Vec<FieldValue>)> {
    model.entities().collect()
}

#[test]
fn reads_a_complete_deck() {
    let model = read_str(&deck(), &ReadOptions::default().xref(Some(XrefMode::Strict))).unwrap();
    assert_eq!(model.executive_control, vec!["SOL 101", "CEND"]);
    assert_eq!(model.case_control.len(), 5);
    assert_eq!(model.nodes().len(), 5);
    assert_eq!(model.elements().len(), 3);
    assert_eq!(model.spc_set(11).len(), 1);
    assert_eq!(model.rejects().len(), 1);
    assert_relative_eq!(
        model.node_position(5).unwrap(),
        Vector3::new(0.0, 1.0, 2.0),
        epsilon = 1e-12
    );
    assert_eq!(model.param("WTMASS").and_then(|p| p.as_f64()), Some(0.00259));
}

#[test]
fn round_trip_in_every_field_width() {
    let first = read_str(&deck(), &ReadOptions::default()).unwrap();
    for width in [FieldWidth::Small, FieldWidth::Large, FieldWidth::Free] {
        let text = to_string(&first, width).unwrap();
        let second = read_str(&text, &ReadOptions::default()).unwrap();
        assert_eq!(entities(&first), entities(&second), "{width:?}");
        assert_eq!(second.executive_control, first.executive_control);
        assert_eq!(second.case_control, first.case_control);
        assert_eq!(second.rejects().len(), 1);
        assert_eq!(to_string(&second, width).unwrap(), text, "{width:?}");
    }
}

#[test]
fn unknown_card_is_written_back_verbatim() {
    let model = read_str(&deck(), &ReadOptions::default()).unwrap();
    let text = to_string(&model, FieldWidth::Small).unwrap();
    let [caero, caero_cont] = caero1_lines();
    let expected = format!("$REJECTS\n{caero}\n{caero_cont}\n$COORDS\n");
    assert!(text.contains(&expected), "{text}");
    assert!(text.ends_with("ENDDATA\n"));
}

#[test]
fn thru_ranges_are_written_compactly() {
    let model = read_str(&deck(), &ReadOptions::default()).unwrap();
    let text = to_string(&model, FieldWidth::Free).unwrap();
    assert!(text.contains("SPC1,10,123456,1,THRU,4\n"), "{text}");
}

fn total_area(model: &BdfModel) -> f64 {
    model
        .elements()
        .keys()
        .map(|&eid| model.element_area(eid).unwrap())
        .sum()
}

#[test]
fn quads_written_as_triangles() {
    let deck = "\
BEGIN BULK
GRID,1,,0.,0.,0.
GRID,2,,1.,0.,0.
GRID,3,,1.,1.,0.
GRID,4,,0.,1.,0.
GRID,5,,3.,0.,0.
GRID,6,,3.,1.,0.
CQUAD4,10,1,1,2,3,4
CTRIA3,15,1,1,2,3
CQUAD4,20,1,2,5,6,3
PSHELL,1,2,.1
MAT1,2,2.+5,,.3,1.
ENDDATA
";
    let model = read_str(deck, &ReadOptions::default()).unwrap();
    let options = WriteOptions::new(FieldWidth::Small).quads_as_trias(true);
    let text = to_string_with(&model, &options).unwrap();
    assert!(!text.contains("CQUAD4"), "{text}");

    let split = read_str(&text, &ReadOptions::default().xref(Some(XrefMode::Strict))).unwrap();
    let ids: Vec<i32> = split.elements().keys().copied().collect();
    assert_eq!(ids, [10, 15, 20, 21, 22]);
    assert!(
        split
            .elements()
            .values()
            .all(|e| e.element_type == ElementType::Ctria3 && e.pid == Some(1))
    );
    assert_eq!(split.element(21).unwrap().node_ids(), vec![1, 3, 4]);
    assert_eq!(split.element(22).unwrap().node_ids(), vec![2, 6, 3]);
    assert_relative_eq!(total_area(&split), total_area(&model), epsilon = 1e-12);
    assert_relative_eq!(total_area(&split), 3.5, epsilon = 1e-12);
    assert_eq!(split.nodes().len(), 6);
}

#[test]
fn safe_and_strict_cross_reference() {
    let deck = "\
BEGIN BULK
GRID,1,,0.,0.,0.
CROD,1,2,1,9
PROD,2,3,1.
MAT1,3,2.+5,,.3
ENDDATA
";
    let mut model = read_str(deck, &ReadOptions::default()).unwrap();
    let errors = model.pop_xref_errors();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        ModelError::DanglingReference { category: Category::Node, id: 9, .. }
    ));
    assert_eq!(model.elements().len(), 1);

    let err = read_str(deck, &ReadOptions::default().xref(Some(XrefMode::Strict))).unwrap_err();
    assert!(matches!(
        err,
        IoError::Model(ModelError::DanglingReference { id: 9, .. })
    ));
}

#[test]
fn cbar_end_to_end() {
    let deck = "\
BEGIN BULK
GRID,1,,0.,0.,0.
GRID,2,,1.,0.,0.
CBAR,1,2,1,2,0.,1.,0.
PBAR,2,3,2.
MAT1,3,2.+5,,.3,3.
ENDDATA
";
    let mut model = read_str(deck, &ReadOptions::default().xref(Some(XrefMode::Strict))).unwrap();
    assert_relative_eq!(model.element_length(1).unwrap(), 1.0);
    assert_relative_eq!(model.element_mass(1).unwrap(), 6.0);
    for point in [[0.0, 0.0, 0.0], [-3.0, 4.0, 1.0]] {
        let mass = model
            .mass_properties(&MassQuery::new().reference_point(point))
            .unwrap();
        assert_relative_eq!(mass.mass, 6.0);
    }
    model.cross_reference(XrefMode::Strict).unwrap();
    assert_relative_eq!(model.mass_properties(&MassQuery::new()).unwrap().mass, 6.0);
}

#[test]
fn files_with_includes_and_summary() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("mesh.bdf"),
        "GRID,1,,0.,0.,0.\nGRID,2,,1.,0.,0.\nCBAR,1,2,1,2,0.,1.,0.\n",
    )
    .unwrap();
    let root = tmp.path().join("model.bdf");
    fs::write(
        &root,
        "SOL 101\nCEND\nBEGIN BULK\nINCLUDE 'mesh.bdf'\nPBAR,2,3,2.\nMAT1,3,2.+5,,.3,3.\nENDDATA\n",
    )
    .unwrap();

    let model = read_bdf(&root, &ReadOptions::default()).unwrap();
    assert_eq!(model.nodes().len(), 2);
    assert!(model.is_cross_referenced());

    let out = tmp.path().join("out").join("model.bdf");
    write_bdf_file(&model, &out, FieldWidth::Large).unwrap();
    let again = read_bdf(&out, &ReadOptions::default()).unwrap();
    assert_eq!(entities(&model), entities(&again));

    let json_path = tmp.path().join("summary.json");
    write_summary_json(&again, &json_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["nodes"], 2);
    assert_eq!(json["element_counts"]["CBAR"], 1);
    assert_eq!(json["total_mass"], 6.0);
}

#[test]
fn include_cycle_fails_the_read() {
    let tmp = tempfile::tempdir().unwrap();
    let a = tmp.path().join("a.bdf");
    fs::write(&a, "BEGIN BULK\nINCLUDE 'b.bdf'\n").unwrap();
    fs::write(tmp.path().join("b.bdf"), "INCLUDE 'a.bdf'\n").unwrap();
    let err = read_bdf(&a, &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, IoError::Include { .. }));
}
