//! Chat-side voucher delivery.
//!
//! The reconciliation worker talks to the chat backend through the [`ChatDelivery`] trait so that
//! it can be driven in tests without a live bot. The production implementation renders the
//! voucher code as a QR image and sends it via the Telegram Bot API.
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
use log::*;
use qrcode::{Color, QrCode};
use teloxide::{
    payloads::SendPhotoSetters,
    prelude::Requester,
    types::{ChatId, InputFile, MessageId, ParseMode},
    Bot,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("The chat backend did not respond in time")]
    Timeout,
    #[error("Chat backend error: {0}")]
    Api(String),
    #[error("Could not render the voucher QR code: {0}")]
    QrRender(String),
}

/// The gateway's view of the chat backend. `send_voucher` returns the chat message id, which is
/// persisted for later retraction.
#[async_trait]
pub trait ChatDelivery: Send + Sync {
    async fn send_voucher(&self, user_id: i64, code: &str) -> Result<i64, DeliveryError>;

    async fn retract(&self, user_id: i64, message_id: i64) -> Result<(), DeliveryError>;
}

/// Renders a voucher code as a PNG QR image with an 8px module size and a 4-module quiet zone.
pub fn make_qr_png(code: &str) -> Result<Vec<u8>, DeliveryError> {
    const SCALE: u32 = 8;
    const QUIET: u32 = 4;
    let qr = QrCode::new(code.as_bytes()).map_err(|e| DeliveryError::QrRender(e.to_string()))?;
    let width = qr.width() as u32;
    let modules = qr.to_colors();
    let side = (width + 2 * QUIET) * SCALE;
    let img = GrayImage::from_fn(side, side, |x, y| {
        let mx = (x / SCALE).checked_sub(QUIET);
        let my = (y / SCALE).checked_sub(QUIET);
        let dark = match (mx, my) {
            (Some(mx), Some(my)) if mx < width && my < width => {
                modules[(my * width + mx) as usize] == Color::Dark
            },
            _ => false,
        };
        if dark {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    });
    let mut png = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img)
        .write_to(&mut png, ImageOutputFormat::Png)
        .map_err(|e| DeliveryError::QrRender(e.to_string()))?;
    Ok(png.into_inner())
}

/// Telegram implementation of [`ChatDelivery`]. Every call is wrapped in a timeout so that a slow
/// Bot API cannot stall the worker loop.
#[derive(Clone)]
pub struct TelegramDelivery {
    bot: Bot,
    timeout: Duration,
}

impl TelegramDelivery {
    pub fn new(token: &str, timeout: Duration) -> Self {
        Self { bot: Bot::new(token), timeout }
    }
}

#[async_trait]
impl ChatDelivery for TelegramDelivery {
    async fn send_voucher(&self, user_id: i64, code: &str) -> Result<i64, DeliveryError> {
        let png = make_qr_png(code)?;
        let request = self
            .bot
            .send_photo(ChatId(user_id), InputFile::memory(png))
            .caption(format!("Your voucher: <b>{code}</b>"))
            .parse_mode(ParseMode::Html);
        let msg = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| DeliveryError::Timeout)?
            .map_err(|e| DeliveryError::Api(e.to_string()))?;
        debug!("📬 Voucher [{code}] delivered to chat {user_id} as message {}", msg.id.0);
        Ok(i64::from(msg.id.0))
    }

    async fn retract(&self, user_id: i64, message_id: i64) -> Result<(), DeliveryError> {
        let id = i32::try_from(message_id).map_err(|e| DeliveryError::Api(e.to_string()))?;
        let request = self.bot.delete_message(ChatId(user_id), MessageId(id));
        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| DeliveryError::Timeout)?
            .map_err(|e| DeliveryError::Api(e.to_string()))?;
        debug!("📬 Message {message_id} retracted from chat {user_id}");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn qr_png_has_a_png_signature() {
        let png = make_qr_png("0042").unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }

    #[test]
    fn qr_render_rejects_oversized_payloads() {
        let huge = "x".repeat(8000);
        assert!(matches!(make_qr_png(&huge), Err(DeliveryError::QrRender(_))));
    }
}
