//! Barcode Detection Abstraction

use crate::error::Result;

/// Barcode / QR detector trait
///
/// Receives the encoded image bytes of a shared picture (JPEG, PNG, ...) and
/// returns the raw value of every detected code, in detector order.
///
/// Implementations that cannot run on the current device should report
/// `false` from [`is_operational`](BarcodeDecoder::is_operational) or return
/// [`BridgeError::NotAvailable`](crate::BridgeError::NotAvailable); the core
/// treats both as "zero barcodes found".
pub trait BarcodeDecoder: Send + Sync {
    /// Detect and decode every barcode in the image.
    fn decode(&self, image: &[u8]) -> Result<Vec<String>>;

    /// Whether the detector is usable on this device.
    fn is_operational(&self) -> bool {
        true
    }
}
