//! Email templates.
//!
//! Every template renders a plain-text and an HTML body.

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{
    domain::vouchers::evaluator::round_price, mail::EmailMessage, reminders::ReminderWindow,
};

const BRAND: &str = "Agora";

/// Details for a payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub buyer_name: String,
    pub solution_title: String,
    pub amount: Decimal,
    pub reference: String,
    pub paid_at: Timestamp,
}

/// Details for an event reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventReminder {
    pub attendee_name: String,
    pub event_title: String,
    pub location: Option<String>,
    pub starts_at: Timestamp,
}

#[must_use]
pub fn payment_confirmation(to: &str, receipt: &PaymentReceipt) -> EmailMessage {
    let amount = format_naira(receipt.amount);
    let paid_at = format_timestamp(receipt.paid_at);

    let subject = format!("Payment confirmed: {}", receipt.solution_title);

    let body_text = format!(
        "Hi {name},\n\n\
         Thank you for your payment. Your registration for {title} is confirmed.\n\n\
         Amount paid: {amount}\n\
         Reference: {reference}\n\
         Date: {paid_at}\n\n\
         The {BRAND} team",
        name = receipt.buyer_name,
        title = receipt.solution_title,
        reference = receipt.reference,
    );

    let body_html = layout(
        &subject,
        &format!(
            r#"<p>Hi {name},</p>
<p>Thank you for your payment. Your registration for <strong>{title}</strong> is confirmed.</p>
<table role="presentation" style="border-collapse: collapse;">
    <tr><td style="padding: 4px 12px 4px 0; color: #737373;">Amount paid</td><td>{amount}</td></tr>
    <tr><td style="padding: 4px 12px 4px 0; color: #737373;">Reference</td><td><code>{reference}</code></td></tr>
    <tr><td style="padding: 4px 12px 4px 0; color: #737373;">Date</td><td>{paid_at}</td></tr>
</table>"#,
            name = escape_html(&receipt.buyer_name),
            title = escape_html(&receipt.solution_title),
            reference = escape_html(&receipt.reference),
        ),
    );

    EmailMessage {
        to: to.to_string(),
        subject,
        body_text,
        body_html,
    }
}

#[must_use]
pub fn event_reminder(to: &str, reminder: &EventReminder, window: ReminderWindow) -> EmailMessage {
    let lead = match window {
        ReminderWindow::DayBefore => "tomorrow",
        ReminderWindow::HourBefore => "in about an hour",
    };

    let starts_at = format_timestamp(reminder.starts_at);
    let location = reminder.location.as_deref().unwrap_or("Online");

    let subject = format!("Reminder: {} starts {lead}", reminder.event_title);

    let body_text = format!(
        "Hi {name},\n\n\
         This is a reminder that {title} starts {lead}.\n\n\
         When: {starts_at}\n\
         Where: {location}\n\n\
         See you there,\n\
         The {BRAND} team",
        name = reminder.attendee_name,
        title = reminder.event_title,
    );

    let body_html = layout(
        &subject,
        &format!(
            r#"<p>Hi {name},</p>
<p>This is a reminder that <strong>{title}</strong> starts {lead}.</p>
<p><span style="color: #737373;">When:</span> {starts_at}<br>
<span style="color: #737373;">Where:</span> {location}</p>
<p>See you there!</p>"#,
            name = escape_html(&reminder.attendee_name),
            title = escape_html(&reminder.event_title),
            location = escape_html(location),
        ),
    );

    EmailMessage {
        to: to.to_string(),
        subject,
        body_text,
        body_html,
    }
}

fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body style="margin: 0; padding: 32px 16px; font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; background-color: #f5f5f5; color: #171717;">
    <div style="max-width: 600px; margin: 0 auto; background: #ffffff; border-radius: 12px; padding: 32px; line-height: 1.6;">
{content}
        <p style="margin-top: 32px; font-size: 12px; color: #a3a3a3;">{BRAND}</p>
    </div>
</body>
</html>"#,
        title = escape_html(title),
    )
}

/// Format an amount as naira with thousands separators, e.g. `₦10,000.00`.
#[must_use]
pub fn format_naira(amount: Decimal) -> String {
    let rendered = format!("{:.2}", round_price(amount).abs());
    let (whole, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);

    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }

        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };

    format!("{sign}₦{grouped}.{fraction}")
}

fn format_timestamp(timestamp: Timestamp) -> String {
    timestamp.strftime("%A, %B %-d, %Y at %H:%M UTC").to_string()
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }

    escaped
}
