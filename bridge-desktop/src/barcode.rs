//! QR Decoder Implementation using `image` and `rqrr`

use bridge_traits::{
    barcode::BarcodeDecoder,
    error::{BridgeError, Result},
};
use tracing::{debug, warn};

/// Decodes the shared image with `image`, converts it to greyscale and runs
/// `rqrr` grid detection over it.
///
/// Grids that are detected but fail to decode are skipped, so the result
/// only holds readable values, in detection order.
///
/// Only QR codes are detected. Data Matrix codes yield nothing; hosts that
/// need them inject their own [`BarcodeDecoder`].
#[derive(Debug, Clone, Default)]
pub struct ImageBarcodeDecoder;

impl ImageBarcodeDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl BarcodeDecoder for ImageBarcodeDecoder {
    fn decode(&self, image: &[u8]) -> Result<Vec<String>> {
        let luma = image::load_from_memory(image)
            .map_err(|e| BridgeError::OperationFailed(format!("Image decode failed: {}", e)))?
            .to_luma8();

        let (width, height) = luma.dimensions();
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
                luma.get_pixel(x as u32, y as u32).0[0]
            });

        let grids = prepared.detect_grids();
        debug!(grids = grids.len(), "Barcode grids detected");

        let mut values = Vec::with_capacity(grids.len());
        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => values.push(content),
                Err(e) => warn!(error = ?e, "Skipping unreadable barcode grid"),
            }
        }

        Ok(values)
    }
}
