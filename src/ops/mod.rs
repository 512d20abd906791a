// ============================================================================
// OPS MODULE — pixel-level drawing operations on the canvas
// ============================================================================
//
//   shapes.rs — SDF rasterization of stroke segments and committed shapes
// ============================================================================

pub mod shapes;
