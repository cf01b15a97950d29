use ddsfile::{AlphaMode, D3D10ResourceDimension, Dds, DxgiFormat, NewDxgiParams};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::error::{PreprocessError, Result};
use crate::slice::Slice;

/// Write one slice variable as an `R32G32_Float` texture. R holds the value
/// (0 where there is no data), G is 1 for valid nodes and 0 otherwise.
/// Texture rows follow grid rows.
pub fn write_slice_texture(path: &Path, slice: &Slice, variable: &str) -> Result<()> {
    let grid = slice
        .grid(variable)
        .ok_or_else(|| PreprocessError::UnknownVariable(variable.to_string()))?;
    let (rows, cols) = slice.grid_shape;

    let mut bytes = Vec::with_capacity(grid.len() * 8);
    for &value in grid {
        let (r, g) = if value.is_nan() {
            (0.0f32, 0.0f32)
        } else {
            (value as f32, 1.0)
        };
        bytes.extend_from_slice(&r.to_le_bytes());
        bytes.extend_from_slice(&g.to_le_bytes());
    }

    let params = NewDxgiParams {
        height: rows as u32,
        width: cols as u32,
        depth: None,
        format: DxgiFormat::R32G32_Float,
        mipmap_levels: Some(1),
        array_layers: Some(1),
        caps2: None,
        is_cubemap: false,
        resource_dimension: D3D10ResourceDimension::Texture2D,
        alpha_mode: AlphaMode::Unknown,
    };

    let mut dds = Dds::new_dxgi(params)?;
    dds.data = bytes;

    let file = File::create(path).map_err(|e| PreprocessError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    dds.write(&mut writer)?;
    writer.flush().map_err(|e| PreprocessError::io(path, e))?;

    info!(
        path = %path.display(),
        key = %slice.key(),
        variable,
        width = cols,
        height = rows,
        "Saved slice texture (R32G32F)"
    );
    Ok(())
}
