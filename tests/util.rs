#![allow(dead_code)]
use strata_sieve::prelude::*;

/// Unit-stepped stack built from names; panics on invalid input.
pub fn names_stack(horizons: &[&str], units: &[&str]) -> HorizonsStack {
    horizons_stack_from_bottom_to_top_names(horizons, units).unwrap()
}

pub fn horizon(stack: &HorizonsStack, name: &str) -> ComponentId {
    stack.horizon_id_from_name(name).unwrap()
}

pub fn unit(stack: &HorizonsStack, name: &str) -> ComponentId {
    stack.stratigraphic_unit_id_from_name(name).unwrap()
}

/// Square `[x0, x0 + size] x [y0, y0 + size]` split along its diagonal.
pub fn square_mesh(origin: [f64; 2], size: f64) -> SimplexMesh<2> {
    let [x, y] = origin;
    SimplexMesh::from_parts(
        vec![
            [x, y],
            [x + size, y],
            [x + size, y + size],
            [x, y + size],
        ],
        &[0, 1, 2, 0, 2, 3],
    )
    .unwrap()
}

/// `n x n` grid over the unit square, two triangles per cell.
pub fn grid_mesh(n: usize) -> SimplexMesh<2> {
    let h = 1.0 / n as f64;
    let mut points = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            points.push([i as f64 * h, j as f64 * h]);
        }
    }
    let idx = |i: usize, j: usize| j * (n + 1) + i;
    let mut cells = Vec::with_capacity(6 * n * n);
    for j in 0..n {
        for i in 0..n {
            let (a, b, c, d) = (idx(i, j), idx(i + 1, j), idx(i + 1, j + 1), idx(i, j + 1));
            cells.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }
    SimplexMesh::from_parts(points, &cells).unwrap()
}

/// Cube `origin + [0, size]^3` split into the six tetrahedra of the main
/// diagonal.
pub fn cube_mesh(origin: [f64; 3], size: f64) -> SimplexMesh<3> {
    let mut points = Vec::with_capacity(8);
    for corner in 0..8usize {
        points.push([
            origin[0] + size * (corner & 1) as f64,
            origin[1] + size * ((corner >> 1) & 1) as f64,
            origin[2] + size * ((corner >> 2) & 1) as f64,
        ]);
    }
    SimplexMesh::from_parts(
        points,
        &[
            0, 1, 3, 7, //
            0, 1, 5, 7, //
            0, 2, 3, 7, //
            0, 2, 6, 7, //
            0, 4, 5, 7, //
            0, 4, 6, 7,
        ],
    )
    .unwrap()
}

/// Vertical column of `nb_blocks` unit squares, bottom to top, under a stack
/// whose horizon `h{i}` separates block `i - 1` from block `i`.
///
/// Returns the model and the block ids, bottom first. Units are named
/// `u0` (bottom) .. `u{nb_blocks - 1}` (top).
pub fn column_section(
    nb_blocks: usize,
    contact: impl Fn(usize) -> ContactType,
) -> (StratigraphicSection, Vec<ComponentId>) {
    let horizons: Vec<String> = (1..nb_blocks).map(|i| format!("h{i}")).collect();
    let units: Vec<String> = (0..nb_blocks).map(|i| format!("u{i}")).collect();
    let stack = horizons_stack_from_bottom_to_top_names(&horizons, &units).unwrap();

    let mut model = StratigraphicSection::new();
    let mut builder = ImplicitModelBuilder::new(&mut model);
    builder.set_horizons_stack(stack);
    let blocks: Vec<ComponentId> = (0..nb_blocks)
        .map(|i| builder.add_block(square_mesh([0.0, i as f64], 1.0)))
        .collect();
    for i in 1..nb_blocks {
        let h = horizon(builder.model().horizons_stack(), &format!("h{i}"));
        builder
            .horizons_stack_builder()
            .set_horizon_contact_type(h, contact(i))
            .unwrap();
        let boundary = builder.add_boundary();
        builder.add_block_boundary(blocks[i - 1], boundary).unwrap();
        builder.add_block_boundary(blocks[i], boundary).unwrap();
        builder.add_boundary_in_horizon(boundary, h).unwrap();
    }
    (model, blocks)
}
