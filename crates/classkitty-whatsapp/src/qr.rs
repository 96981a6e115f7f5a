// SPDX-FileCopyrightText: 2026 Classkitty Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pairing payload to QR data URI rendering.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use qrcode::QrCode;
use qrcode::render::svg;
use tracing::warn;

/// Render a pairing payload as a `data:image/svg+xml;base64,...` URI
/// suitable for an `<img src>` attribute.
///
/// Returns `None` when the payload cannot be encoded (for example when it
/// exceeds QR capacity). Rendering failure is not fatal for the
/// connection: the session keeps connecting and the next pairing payload
/// gets another chance.
pub fn render_data_uri(payload: &str) -> Option<String> {
    let code = match QrCode::new(payload.as_bytes()) {
        Ok(code) => code,
        Err(error) => {
            warn!(%error, "failed to encode pairing payload as a QR code");
            return None;
        }
    };

    let image = code
        .render::<svg::Color>()
        .min_dimensions(256, 256)
        .build();

    Some(format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(image)
    ))
}
