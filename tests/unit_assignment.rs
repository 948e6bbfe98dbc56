mod util;
use strata_sieve::prelude::*;
use util::*;

fn assign(model: &mut StratigraphicSection, block: ComponentId, unit_name: &str) {
    let u = unit(model.horizons_stack(), unit_name);
    ImplicitModelBuilder::new(model)
        .add_block_in_stratigraphic_unit(block, u)
        .unwrap();
}

fn unit_name_of(model: &StratigraphicSection, block: ComponentId) -> Option<String> {
    let u = model.stratigraphic_unit_of_block(block)?;
    Some(model.horizons_stack().display_name(u))
}

/// Single block whose boundaries lie in the given horizons and face nothing.
fn lone_block(horizons: &[&str], contacts: &[ContactType]) -> (StratigraphicSection, ComponentId) {
    let units: Vec<String> = (0..=horizons.len()).map(|i| format!("u{i}")).collect();
    let stack = horizons_stack_from_bottom_to_top_names(horizons, &units).unwrap();
    let mut model = StratigraphicSection::new();
    let mut builder = ImplicitModelBuilder::new(&mut model);
    builder.set_horizons_stack(stack);
    let block = builder.add_block(square_mesh([0.0, 0.0], 1.0));
    for (name, &contact) in horizons.iter().zip(contacts) {
        let h = horizon(builder.model().horizons_stack(), name);
        builder
            .horizons_stack_builder()
            .set_horizon_contact_type(h, contact)
            .unwrap();
        let boundary = builder.add_boundary();
        builder.add_block_boundary(block, boundary).unwrap();
        builder.add_boundary_in_horizon(boundary, h).unwrap();
    }
    (model, block)
}

#[test]
fn conformal_horizon_resolves_the_block_below() {
    let (mut model, blocks) = column_section(2, |_| ContactType::Conformal);
    assign(&mut model, blocks[1], "u1");
    let outcome = assign_stratigraphic_units(&mut ImplicitModelBuilder::new(&mut model)).unwrap();
    assert_eq!(outcome.already_assigned, vec![blocks[1]]);
    assert_eq!(outcome.newly_assigned, vec![blocks[0]]);
    assert!(outcome.is_complete());
    assert_eq!(unit_name_of(&model, blocks[0]).as_deref(), Some("u0"));
}

#[test]
fn a_whole_column_resolves_from_its_top_block() {
    let (mut model, blocks) = column_section(6, |_| ContactType::Conformal);
    assign(&mut model, blocks[5], "u5");
    let outcome = assign_stratigraphic_units(&mut ImplicitModelBuilder::new(&mut model))
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(outcome.newly_assigned.len(), 5);
    for (i, &block) in blocks.iter().enumerate() {
        assert_eq!(unit_name_of(&model, block), Some(format!("u{i}")));
    }
    assert_eq!(model.nb_blocks_in_stratigraphic_unit(unit(model.horizons_stack(), "u3")), 1);
}

#[test]
fn erosion_only_propagates_upwards() {
    let (mut model, blocks) = column_section(2, |_| ContactType::Erosion);
    assign(&mut model, blocks[0], "u0");
    let outcome = assign_stratigraphic_units(&mut ImplicitModelBuilder::new(&mut model)).unwrap();
    assert!(outcome.is_complete());
    assert_eq!(unit_name_of(&model, blocks[1]).as_deref(), Some("u1"));

    let (mut model, blocks) = column_section(2, |_| ContactType::Erosion);
    assign(&mut model, blocks[1], "u1");
    let outcome = assign_stratigraphic_units(&mut ImplicitModelBuilder::new(&mut model)).unwrap();
    assert_eq!(outcome.unassigned, vec![blocks[0]]);
    assert_eq!(
        outcome.into_result().unwrap_err(),
        StrataError::Unresolvable {
            unassigned: vec![blocks[0]]
        }
    );
}

#[test]
fn baselap_only_propagates_downwards() {
    let (mut model, blocks) = column_section(2, |_| ContactType::Baselap);
    assign(&mut model, blocks[1], "u1");
    let outcome = assign_stratigraphic_units(&mut ImplicitModelBuilder::new(&mut model)).unwrap();
    assert!(outcome.is_complete());
    assert_eq!(unit_name_of(&model, blocks[0]).as_deref(), Some("u0"));

    let (mut model, blocks) = column_section(2, |_| ContactType::Baselap);
    assign(&mut model, blocks[0], "u0");
    let outcome = assign_stratigraphic_units(&mut ImplicitModelBuilder::new(&mut model)).unwrap();
    assert_eq!(outcome.unassigned, vec![blocks[1]]);
}

#[test]
fn unclassified_boundaries_leave_blocks_pending() {
    let (mut model, blocks) = column_section(2, |_| ContactType::Conformal);
    let mut builder = ImplicitModelBuilder::new(&mut model);
    let loose = builder.add_block(square_mesh([5.0, 5.0], 1.0));
    let boundary = builder.add_boundary();
    builder.add_block_boundary(loose, boundary).unwrap();
    builder.add_block_boundary(blocks[1], boundary).unwrap();
    let outcome = assign_stratigraphic_units(&mut builder).unwrap();
    assert_eq!(outcome.already_assigned, Vec::<ComponentId>::new());
    assert_eq!(outcome.unassigned.len(), 3);
    assert!(outcome.unassigned.contains(&loose));

    // Containers created for the run are gone again since none got a block.
    assert_eq!(model.stratigraphic_unit_containers().collection_ids().count(), 0);
}

#[test]
fn two_conformal_horizons_bracket_a_unit() {
    let (mut model, block) = lone_block(&["h1", "h2"], &[ContactType::Conformal; 2]);
    let outcome = assign_stratigraphic_units(&mut ImplicitModelBuilder::new(&mut model)).unwrap();
    assert_eq!(outcome.newly_assigned, vec![block]);
    assert_eq!(unit_name_of(&model, block).as_deref(), Some("u1"));
}

#[test]
fn conformal_and_unconformity_locate_the_unit_between() {
    let (mut model, block) = lone_block(&["h1", "h2"], &[ContactType::Conformal, ContactType::Erosion]);
    assign_stratigraphic_units(&mut ImplicitModelBuilder::new(&mut model)).unwrap();
    assert_eq!(unit_name_of(&model, block).as_deref(), Some("u1"));

    let (mut model, block) = lone_block(&["h1", "h2"], &[ContactType::Erosion, ContactType::Conformal]);
    assign_stratigraphic_units(&mut ImplicitModelBuilder::new(&mut model)).unwrap();
    assert_eq!(unit_name_of(&model, block).as_deref(), Some("u1"));
}

#[test]
fn a_single_conformal_horizon_is_not_enough() {
    let (mut model, block) = lone_block(&["h1"], &[ContactType::Conformal]);
    let outcome = assign_stratigraphic_units(&mut ImplicitModelBuilder::new(&mut model)).unwrap();
    assert_eq!(outcome.unassigned, vec![block]);
}
