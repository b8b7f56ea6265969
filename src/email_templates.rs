//! Transactional email copy, rendered as both HTML and plain text.

pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; color: #1f2933;">
    <div style="max-width: 560px; margin: 0 auto; padding: 24px;">
      <h2 style="color: #3b5bdb;">{}</h2>
      {}
      <p style="font-size: 12px; color: #7b8794;">School Payment Gateway</p>
    </div>
  </body>
</html>"#,
        escape_html(title),
        content
    )
}

pub fn welcome_email(name: &str) -> RenderedEmail {
    let subject = "Welcome to School Payment Gateway".to_string();
    let html = layout(
        &subject,
        &format!(
            "<p>Hi {},</p><p>Your account has been created. You can now sign in and start collecting school fees.</p>",
            escape_html(name)
        ),
    );
    let text = format!(
        "Hi {},\n\nYour account has been created. You can now sign in and start collecting school fees.",
        name
    );
    RenderedEmail {
        subject,
        html,
        text,
    }
}

pub fn password_reset_email(name: &str, reset_link: &str, valid_for_hours: i64) -> RenderedEmail {
    let subject = "Reset your password".to_string();
    let html = layout(
        &subject,
        &format!(
            r#"<p>Hi {},</p><p>We received a request to reset your password.</p><p><a href="{}">Reset password</a></p><p>This link expires in {} hours. If you did not ask for a reset you can ignore this email.</p>"#,
            escape_html(name),
            escape_html(reset_link),
            valid_for_hours
        ),
    );
    let text = format!(
        "Hi {},\n\nWe received a request to reset your password.\nOpen this link to choose a new one: {}\n\nThis link expires in {} hours. If you did not ask for a reset you can ignore this email.",
        name, reset_link, valid_for_hours
    );
    RenderedEmail {
        subject,
        html,
        text,
    }
}

pub struct PaymentReceipt<'a> {
    pub student_name: &'a str,
    pub order_id: &'a str,
    pub amount: f64,
    pub payment_mode: &'a str,
    pub bank_reference: &'a str,
}

pub fn payment_confirmation_email(receipt: &PaymentReceipt<'_>) -> RenderedEmail {
    let subject = format!("Payment received for order {}", receipt.order_id);
    let html = layout(
        "Payment successful",
        &format!(
            "<p>Hi {},</p><p>We have received your payment.</p><ul><li>Order: {}</li><li>Amount: {:.2}</li><li>Payment mode: {}</li><li>Bank reference: {}</li></ul>",
            escape_html(receipt.student_name),
            escape_html(receipt.order_id),
            receipt.amount,
            escape_html(receipt.payment_mode),
            escape_html(receipt.bank_reference)
        ),
    );
    let text = format!(
        "Hi {},\n\nWe have received your payment.\nOrder: {}\nAmount: {:.2}\nPayment mode: {}\nBank reference: {}",
        receipt.student_name,
        receipt.order_id,
        receipt.amount,
        receipt.payment_mode,
        receipt.bank_reference
    );
    RenderedEmail {
        subject,
        html,
        text,
    }
}
