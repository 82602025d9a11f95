use approx::assert_relative_eq;
use bdf_inp::Card;
use bdf_model::{BdfModel, CardRegistry, MassQuery, ModelError, XrefMode};
use nalgebra::{Matrix3, Vector3};

fn build(cards: &[&[&str]]) -> BdfModel {
    let registry = CardRegistry::default();
    let mut model = BdfModel::new();
    for fields in cards {
        model
            .add_card(&Card::from_fields(fields), &registry)
            .expect("card should construct");
    }
    model.cross_reference(XrefMode::Strict).expect("model should resolve");
    model
}

fn cbar_model() -> BdfModel {
    build(&[
        &["GRID", "1", "", "0.", "0.", "0."],
        &["GRID", "2", "", "1.", "0.", "0."],
        &["CBAR", "10", "20", "1", "2", "0.", "1.", "0."],
        &["PBAR", "20", "30", "2."],
        &["MAT1", "30", "2.+5", "", ".3", "3."],
    ])
}

#[test]
fn cbar_length_and_mass() {
    let model = cbar_model();
    assert_relative_eq!(model.element_length(10).unwrap(), 1.0);
    assert_relative_eq!(model.element_mass(10).unwrap(), 6.0);

    for point in [[0.0, 0.0, 0.0], [5.0, -2.0, 7.0]] {
        let props = model
            .mass_properties(&MassQuery::new().reference_point(point))
            .unwrap();
        assert_relative_eq!(props.mass, 6.0);
        assert_relative_eq!(props.cg, Vector3::new(0.5, 0.0, 0.0));
    }
}

#[test]
fn inertia_about_the_reference_point() {
    let model = cbar_model();
    let props = model
        .mass_properties(&MassQuery::new().reference_point([0.5, 0.0, 1.0]))
        .unwrap();
    // point mass 6 at (0.5, 0, 0), offset (0, 0, -1)
    let expected = Matrix3::new(6.0, 0.0, 0.0, 0.0, 6.0, 0.0, 0.0, 0.0, 0.0);
    assert_relative_eq!(props.inertia, expected, epsilon = 1e-12);
}

#[test]
fn mass_is_stable_across_cross_reference_runs() {
    let mut model = cbar_model();
    let first = model.mass_properties(&MassQuery::new()).unwrap();
    model.cross_reference(XrefMode::Strict).unwrap();
    model.cross_reference(XrefMode::Safe).unwrap();
    let again = model.mass_properties(&MassQuery::new()).unwrap();
    assert_eq!(first, again);
    assert_eq!(model.elements().len(), 1);
}

#[test]
fn tapered_beam_mass_and_cg() {
    let model = build(&[
        &["GRID", "1", "", "0.", "0.", "0."],
        &["GRID", "2", "", "1.", "0.", "0."],
        &["CBEAM", "1", "2", "1", "2", "0.", "1.", "0."],
        &[
            "PBEAM", "2", "3", "2.", "1.", "1.", "", "", "", //
            "YES", "1.", "1.",
        ],
        &["MAT1", "3", "2.+5", "", ".3", "3."],
    ]);
    assert_relative_eq!(model.element_mass(1).unwrap(), 4.5, epsilon = 1e-12);
    let props = model.mass_properties(&MassQuery::new()).unwrap();
    assert_relative_eq!(props.cg.x, 4.0 / 9.0, epsilon = 1e-12);
}

#[test]
fn shells_solids_and_point_masses() {
    let model = build(&[
        &["GRID", "1", "", "0.", "0.", "0."],
        &["GRID", "2", "", "2.", "0.", "0."],
        &["GRID", "3", "", "2.", "1.", "0."],
        &["GRID", "4", "", "0.", "1.", "0."],
        &["GRID", "5", "", "0.", "0.", "1."],
        &["CQUAD4", "1", "10", "1", "2", "3", "4"],
        &["CQUAD4", "2", "11", "1", "2", "3", "4"],
        &["CTETRA", "3", "12", "1", "2", "4", "5"],
        &["CONM2", "4", "5", "", "2.", "1.", "0.", "0."],
        &["CELAS2", "5", "1.+3", "1", "1", "2", "1"],
        &["PSHELL", "10", "1", ".1", "", "", "", "", ".5"],
        &[
            "PCOMP", "11", "", "", "", "", "", "", "SYM", //
            "1", ".1", "0.", "", "1", ".2", "90.",
        ],
        &["PSOLID", "12", "1"],
        &["MAT1", "1", "2.+5", "", ".3", "10."],
    ]);
    // area 2: (10 * .1 + .5) * 2
    assert_relative_eq!(model.element_mass(1).unwrap(), 3.0, epsilon = 1e-12);
    // 2 * (10 * .1 + 10 * .2) * 2
    assert_relative_eq!(model.element_mass(2).unwrap(), 12.0, epsilon = 1e-12);
    // volume 1/3
    assert_relative_eq!(model.element_mass(3).unwrap(), 10.0 / 3.0, epsilon = 1e-12);
    assert_relative_eq!(model.element_mass(4).unwrap(), 2.0);
    assert_eq!(model.element_mass(5).unwrap(), 0.0);

    let shells = model
        .mass_properties(&MassQuery::new().property_ids([10, 11]))
        .unwrap();
    assert_relative_eq!(shells.mass, 15.0, epsilon = 1e-12);
    assert_relative_eq!(shells.cg, Vector3::new(1.0, 0.5, 0.0), epsilon = 1e-12);

    let conm2 = model.mass_properties(&MassQuery::new().element_ids([4])).unwrap();
    assert_relative_eq!(conm2.cg, Vector3::new(1.0, 0.0, 1.0), epsilon = 1e-12);

    let breakdown = model.mass_breakdown().unwrap();
    assert_relative_eq!(breakdown[&11], 12.0, epsilon = 1e-12);
    let areas = model.area_breakdown().unwrap();
    assert_relative_eq!(areas[&10], 2.0, epsilon = 1e-12);
}

#[test]
fn corner_thickness_overrides_the_property() {
    let model = build(&[
        &["GRID", "1", "", "0.", "0.", "0."],
        &["GRID", "2", "", "1.", "0.", "0."],
        &["GRID", "3", "", "0.", "1.", "0."],
        &["CTRIA3", "1", "10", "1", "2", "3", "", "", "", "", "", ".2", ".2", ".2"],
        &["PSHELL", "10", "1", ".1"],
        &["MAT1", "1", "2.+5", "", ".3", "10."],
    ]);
    // area .5, t .2
    assert_relative_eq!(model.element_mass(1).unwrap(), 1.0, epsilon = 1e-12);
}

#[test]
fn conm2_in_a_rotated_system() {
    let model = build(&[
        &["GRID", "1", "", "1.", "0.", "0."],
        &["CORD2R", "5", "", "0.", "0.", "0.", "0.", "0.", "1.", "0.", "1.", "0."],
        &[
            "CONM2", "1", "1", "5", "2.", "1.", "0.", "0.", "", //
            "1.", "", "2.", "", "", "3.",
        ],
    ]);
    let props = model.mass_properties(&MassQuery::new().element_ids([1])).unwrap();
    // local x is basic y
    assert_relative_eq!(props.cg, Vector3::new(1.0, 1.0, 0.0), epsilon = 1e-12);
    let about_cg = model
        .mass_properties(&MassQuery::new().reference_point([1.0, 1.0, 0.0]))
        .unwrap();
    assert_relative_eq!(
        about_cg.inertia,
        Matrix3::new(2.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 3.0),
        epsilon = 1e-12
    );
}

#[test]
fn missing_material_fails_mass_queries() {
    let registry = CardRegistry::default();
    let mut model = BdfModel::new();
    for fields in [
        &["GRID", "1", "", "0.", "0.", "0."][..],
        &["GRID", "2", "", "1.", "0.", "0."],
        &["CROD", "1", "2", "1", "2"],
        &["PROD", "2", "3", "1."],
    ] {
        model.add_card(&Card::from_fields(fields), &registry).unwrap();
    }
    assert_eq!(
        model.mass_properties(&MassQuery::new()),
        Err(ModelError::NotCrossReferenced)
    );
    let report = model.cross_reference(XrefMode::Safe).unwrap();
    assert_eq!(report.errors, 1);
    assert!(matches!(
        model.mass_properties(&MassQuery::new()),
        Err(ModelError::DanglingReference { .. })
    ));
}

#[test]
fn load_resultants() {
    let model = build(&[
        &["GRID", "1", "", "0.", "0.", "0."],
        &["GRID", "2", "", "1.", "0.", "0."],
        &["GRID", "3", "", "1.", "1.", "0."],
        &["GRID", "4", "", "0.", "1.", "0."],
        &["CQUAD4", "7", "10", "1", "2", "3", "4"],
        &["PSHELL", "10", "1", ".1"],
        &["MAT1", "1", "2.+5", "", ".3", "1."],
        &["FORCE", "1", "2", "", "10.", "0.", "0.", "1."],
        &["MOMENT", "1", "1", "", "2.", "1.", "0.", "0."],
        &["PLOAD", "2", "3.", "1", "2", "3", "4"],
        &["PLOAD2", "3", "4.", "7"],
    ]);
    let (force, moment) = model.sum_forces_moments(1, [0.0, 0.0, 0.0]).unwrap();
    assert_relative_eq!(force, Vector3::new(0.0, 0.0, 10.0), epsilon = 1e-12);
    // (1,0,0) x (0,0,10) = (0,-10,0), plus the couple (2,0,0)
    assert_relative_eq!(moment, Vector3::new(2.0, -10.0, 0.0), epsilon = 1e-12);

    let (force, moment) = model.sum_forces_moments(2, [0.0, 0.0, 0.0]).unwrap();
    assert_relative_eq!(force, Vector3::new(0.0, 0.0, 3.0), epsilon = 1e-12);
    assert_relative_eq!(moment, Vector3::new(1.5, -1.5, 0.0), epsilon = 1e-12);

    let (force, _) = model.sum_forces_moments(3, [0.0, 0.0, 0.0]).unwrap();
    assert_relative_eq!(force, Vector3::new(0.0, 0.0, 4.0), epsilon = 1e-12);

    assert!(model.sum_forces_moments(9, [0.0, 0.0, 0.0]).is_err());
}
