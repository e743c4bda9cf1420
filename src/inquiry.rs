//! WhatsApp inquiry composition: the pre-filled message a shopper sends to
//! the store about one product, and the `wa.me` deep link that opens it.

use thiserror::Error;
use url::Url;

use crate::models::product;

#[derive(Debug, Error)]
pub enum InquiryError {
    #[error("invalid messaging base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("store contact number has no digits")]
    MissingPhoneNumber,
}

/// Format an amount in rupees with Indian digit grouping
/// (`123456.5` -> `1,23,456.50`). Whole amounts drop the paise.
pub fn format_inr(amount: f64) -> String {
    let rounded = (amount * 100.0).round() / 100.0;
    let negative = rounded < 0.0;
    let rounded = rounded.abs();

    let rupees = rounded.trunc() as u64;
    let paise = ((rounded - rounded.trunc()) * 100.0).round() as u64;

    let digits = rupees.to_string();
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (left, right) = rest.split_at(rest.len() - 2);
            groups.push(right);
            rest = left;
        }
        groups.push(rest);
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };

    let sign = if negative { "-" } else { "" };
    if paise == 0 {
        format!("{sign}₹{grouped}")
    } else {
        format!("{sign}₹{grouped}.{paise:02}")
    }
}

/// Compose the inquiry message for `product`.
///
/// `image_url` is the gallery image the shopper was looking at;
/// `product_link` points back at the product page when the caller knows it.
pub fn compose_inquiry(
    store_name: &str,
    product: &product::Model,
    image_url: &str,
    product_link: Option<&str>,
) -> String {
    let mut lines = vec![
        format!("Hi {store_name}, I'm interested in this phone:"),
        String::new(),
        format!("{} {}", product.brand, product.name),
        format!("Price: {}", format_inr(product.effective_price())),
        format!("MRP: {}", format_inr(product.price)),
        format!("Discount: {}% OFF", format_percent(product.discount)),
    ];

    lines.push(format!("Image: {image_url}"));

    if let Some(link) = product_link {
        lines.push(format!("View Details: {link}"));
    }

    lines.join("\n")
}

fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.1}")
    }
}

/// Build `<base>/<digits>?text=<message>`; the phone keeps only its digits.
pub fn whatsapp_link(base: &str, phone: &str, message: &str) -> Result<String, InquiryError> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(InquiryError::MissingPhoneNumber);
    }

    let base = Url::parse(base)?;
    let base = base.as_str().trim_end_matches('/');

    Ok(format!(
        "{base}/{digits}?text={}",
        urlencoding::encode(message)
    ))
}
