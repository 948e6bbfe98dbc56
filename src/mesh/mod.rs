pub mod simplex_mesh;

pub use simplex_mesh::SimplexMesh;
