// ============================================================================
// MAIL SERVICE - order confirmation emails
// ============================================================================

use anyhow::Result;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::models::Order;

pub struct MailService {
    smtp_server: String,
    smtp_username: String,
    smtp_password: String,
    from_address: String,
}

impl MailService {
    pub fn new() -> Result<Self> {
        Ok(Self {
            smtp_server: std::env::var("SMTP_SERVER")
                .unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            smtp_username: std::env::var("SMTP_USERNAME")
                .map_err(|_| anyhow::anyhow!("SMTP_USERNAME not configured"))?,
            smtp_password: std::env::var("SMTP_PASSWORD")
                .map_err(|_| anyhow::anyhow!("SMTP_PASSWORD not configured"))?,
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| "no-reply@bookstay.local".to_string()),
        })
    }

    pub async fn send_order_confirmation(&self, order: &Order, accommodation_name: &str) -> Result<()> {
        info!(order_id = order.id, "Sending order confirmation email");

        let subject = format!("Booking confirmation #{}", order.id);
        let plain = format!(
            "Hello {},\n\nYour booking at {} is confirmed.\nCheck-in: {}\nCheck-out: {}\nTotal: {:.2}\n",
            order.guest_name,
            accommodation_name,
            order.check_in_date,
            order.check_out_date,
            order.total_price,
        );
        let html = format!(
            "<p>Hello {},</p><p>Your booking at <b>{}</b> is confirmed.</p>\
             <ul><li>Check-in: {}</li><li>Check-out: {}</li><li>Total: {:.2}</li></ul>",
            order.guest_name,
            accommodation_name,
            order.check_in_date,
            order.check_out_date,
            order.total_price,
        );

        self.send(&order.guest_email, &subject, &html, &plain).await
    }

    async fn send(&self, to: &str, subject: &str, html: &str, plain: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html.to_string()),
                    ),
            )?;

        let credentials =
            Credentials::new(self.smtp_username.clone(), self.smtp_password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.smtp_server)?
            .credentials(credentials)
            .build();

        mailer.send(message).await?;
        Ok(())
    }
}
