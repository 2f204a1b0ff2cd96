//! HTML email templates.
//!
//! Every user-supplied string is escaped before it is interpolated.

use crate::Email;

/// What the purchase emails say about an order.
#[derive(Debug, Clone)]
pub struct PurchaseDetails<'a> {
  pub customer_email: &'a str,
  pub product_name:   &'a str,
  pub amount:         i64,
  pub currency:       &'a str,
  pub session_id:     &'a str,
}

/// What the booking emails say about a coaching request.
#[derive(Debug, Clone)]
pub struct BookingDetails<'a> {
  pub name:           &'a str,
  pub email:          &'a str,
  pub preferred_date: &'a str,
  pub preferred_time: &'a str,
  pub timezone:       &'a str,
  pub message:        Option<&'a str>,
}

/// Escape the five HTML-significant characters.
pub fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}

/// `2500, "usd"` → `$25.00`; other currencies get their code as a suffix.
pub fn format_amount(amount: i64, currency: &str) -> String {
  let sign = if amount < 0 { "-" } else { "" };
  let abs = amount.unsigned_abs();
  let major = format!("{sign}{}.{:02}", abs / 100, abs % 100);
  match currency.to_lowercase().as_str() {
    "usd" => format!("${major}"),
    other => format!("{major} {}", other.to_uppercase()),
  }
}

fn layout(heading: &str, body: &str) -> String {
  format!(
    "<!doctype html><html><body style=\"font-family:sans-serif;color:#111\">\
     <h2>{}</h2>{body}<p style=\"color:#666\">Ventaro AI</p></body></html>",
    escape_html(heading)
  )
}

fn booking_table(b: &BookingDetails<'_>) -> String {
  let message = b.message.map(escape_html).unwrap_or_else(|| "(none)".to_owned());
  format!(
    "<table>\
     <tr><td>Name</td><td>{}</td></tr>\
     <tr><td>Email</td><td>{}</td></tr>\
     <tr><td>Preferred date</td><td>{}</td></tr>\
     <tr><td>Preferred time</td><td>{} ({})</td></tr>\
     <tr><td>Message</td><td>{message}</td></tr>\
     </table>",
    escape_html(b.name),
    escape_html(b.email),
    escape_html(b.preferred_date),
    escape_html(b.preferred_time),
    escape_html(b.timezone),
  )
}

// ─── Purchases ───────────────────────────────────────────────────────────────

pub fn purchase_confirmation(p: &PurchaseDetails<'_>, site_url: &str) -> Email {
  let body = format!(
    "<p>Thank you for your purchase of <strong>{}</strong> ({}).</p>\
     <p>Your products are available from your account: \
     <a href=\"{}/my-account\">{}/my-account</a></p>\
     <p>Order reference: {}</p>",
    escape_html(p.product_name),
    format_amount(p.amount, p.currency),
    escape_html(site_url),
    escape_html(site_url),
    escape_html(p.session_id),
  );
  Email {
    to:      p.customer_email.to_owned(),
    subject: format!("Your Ventaro AI purchase: {}", p.product_name),
    html:    layout("Thank you for your purchase", &body),
    kind:    "purchase_confirmation",
  }
}

pub fn admin_new_purchase(admin_email: &str, p: &PurchaseDetails<'_>) -> Email {
  let body = format!(
    "<p><strong>{}</strong> bought <strong>{}</strong> for {}.</p><p>Session: {}</p>",
    escape_html(p.customer_email),
    escape_html(p.product_name),
    format_amount(p.amount, p.currency),
    escape_html(p.session_id),
  );
  Email {
    to:      admin_email.to_owned(),
    subject: format!("New purchase: {}", p.product_name),
    html:    layout("New purchase", &body),
    kind:    "admin_new_purchase",
  }
}

// ─── Bookings ────────────────────────────────────────────────────────────────

pub fn booking_received(b: &BookingDetails<'_>) -> Email {
  let body = format!(
    "<p>Hi {}, we received your coaching request and will confirm a time \
     within one business day.</p>{}",
    escape_html(b.name),
    booking_table(b),
  );
  Email {
    to:      b.email.to_owned(),
    subject: "We received your coaching session request".to_owned(),
    html:    layout("Booking received", &body),
    kind:    "booking_received",
  }
}

pub fn admin_new_booking(admin_email: &str, b: &BookingDetails<'_>) -> Email {
  Email {
    to:      admin_email.to_owned(),
    subject: format!("New coaching booking from {}", b.name),
    html:    layout("New coaching booking", &booking_table(b)),
    kind:    "admin_new_booking",
  }
}

/// Sent to the customer when an admin changes a booking's status.
pub fn booking_status_changed(b: &BookingDetails<'_>, status: &str) -> Email {
  let body = format!(
    "<p>Hi {}, your coaching session request is now <strong>{}</strong>.</p>{}",
    escape_html(b.name),
    escape_html(status),
    booking_table(b),
  );
  Email {
    to:      b.email.to_owned(),
    subject: format!("Your coaching session is {status}"),
    html:    layout("Booking update", &body),
    kind:    "booking_status",
  }
}

pub fn test_email(to: &str) -> Email {
  Email {
    to:      to.to_owned(),
    subject: "Ventaro AI test email".to_owned(),
    html:    layout(
      "Test email",
      "<p>If you can read this, SendGrid delivery is configured correctly.</p>",
    ),
    kind:    "test",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn booking() -> BookingDetails<'static> {
    BookingDetails {
      name:           "<script>alert(1)</script>",
      email:          "grace@example.com",
      preferred_date: "2026-11-02",
      preferred_time: "14:00",
      timezone:       "Europe/London",
      message:        Some("Tom & Jerry's \"agency\""),
    }
  }

  #[test]
  fn escapes_markup() {
    assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
  }

  #[test]
  fn amounts() {
    assert_eq!(format_amount(2500, "usd"), "$25.00");
    assert_eq!(format_amount(50000, "USD"), "$500.00");
    assert_eq!(format_amount(1005, "eur"), "10.05 EUR");
    assert_eq!(format_amount(-150, "usd"), "$-1.50");
  }

  #[test]
  fn booking_emails_escape_user_input() {
    let email = booking_received(&booking());
    assert_eq!(email.to, "grace@example.com");
    assert!(!email.html.contains("<script>"));
    assert!(email.html.contains("&lt;script&gt;"));
    assert!(email.html.contains("Tom &amp; Jerry&#39;s &quot;agency&quot;"));

    let admin = admin_new_booking("admin@ventaro.ai", &booking());
    assert_eq!(admin.to, "admin@ventaro.ai");
    assert_eq!(admin.kind, "admin_new_booking");
  }

  #[test]
  fn purchase_confirmation_mentions_product_and_price() {
    let p = PurchaseDetails {
      customer_email: "buyer@example.com",
      product_name:   "AI Tools Mastery Guide 2025",
      amount:         2500,
      currency:       "usd",
      session_id:     "cs_test_1",
    };
    let email = purchase_confirmation(&p, "https://ventaro.ai");
    assert_eq!(email.kind, "purchase_confirmation");
    assert!(email.subject.contains("AI Tools Mastery Guide 2025"));
    assert!(email.html.contains("$25.00"));
    assert!(email.html.contains("https://ventaro.ai/my-account"));
  }

  #[test]
  fn status_change_names_new_status() {
    let email = booking_status_changed(&booking(), "confirmed");
    assert_eq!(email.subject, "Your coaching session is confirmed");
    assert!(email.html.contains("<strong>confirmed</strong>"));
  }
}
