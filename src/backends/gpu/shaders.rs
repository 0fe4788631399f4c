//! WGSL compute shaders

/// Integer matrix multiplication shader (WGSL)
///
/// Operands arrive widened to i32 (WGSL has no 8-bit storage type).
/// Each invocation computes one output element with i32 accumulation, which
/// cannot overflow for k < 65536.
pub const GEMM_I8_SHADER: &str = r#"
@group(0) @binding(0) var<storage, read> a: array<i32>;
@group(0) @binding(1) var<storage, read> b: array<i32>;
@group(0) @binding(2) var<storage, read_write> c: array<i32>;

struct Dimensions {
    M: u32,  // rows of A and C
    K: u32,  // cols of A, rows of B
    N: u32,  // cols of B and C
}

@group(0) @binding(3) var<uniform> dims: Dimensions;

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) global_id: vec3<u32>) {
    let row = global_id.x;
    let col = global_id.y;

    if (row >= dims.M || col >= dims.N) {
        return;
    }

    var sum: i32 = 0;
    for (var k: u32 = 0u; k < dims.K; k = k + 1u) {
        sum = sum + a[row * dims.K + k] * b[k * dims.N + col];
    }

    c[row * dims.N + col] = sum;
}
"#;
