//! Named preset patterns.
//!
//! Regexes are compiled case-insensitively, so the upper-case classes below
//! also match lower-case input.

/// A built-in pattern definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub regex: &'static str,
}

const fn preset(name: &'static str, regex: &'static str) -> Preset {
    Preset { name, regex }
}

/// All presets, in display order.
pub static PRESETS: &[Preset] = &[
    preset("PAN Card Number", r"\b[A-Z]{5}[0-9]{4}[A-Z]\b"),
    preset(
        "GST Number",
        r"\b\d{2}[A-Z]{5}\d{4}[A-Z]{1}[1-9A-Z]{1}Z[0-9A-Z]{1}\b",
    ),
    preset(
        "Email Address",
        r"\b[a-zA-Z0-9]([a-zA-Z0-9._-]*[a-zA-Z0-9])?@[a-zA-Z0-9]([a-zA-Z0-9.-]*[a-zA-Z0-9])?\.[a-zA-Z]{2,}\b",
    ),
    preset("Phone Number (10 digits)", r"\b\d{10}\b"),
    preset("Amounts ending with .00", r"\d+\.00\b"),
    preset("Aadhaar Number", r"\b\d{4}\s\d{4}\s\d{4}\b"),
    preset("Passport Number", r"\b[A-PR-WY][1-9]\d{6}\b"),
    preset("Driving License", r"\b[A-Z]{2}\d{2}\s\d{11}\b"),
    preset("Voter ID", r"\b[A-Z]{3}[0-9]{7}\b"),
    preset(
        "CIN Number",
        r"\b[LU][0-9]{5}[A-Z]{2}[0-9]{4}[A-Z]{3}[0-9]{6}\b",
    ),
    preset("Bank Account Number", r"\b\d{9,18}\b"),
    preset("IFSC Code", r"\b[A-Z]{4}0[A-Z0-9]{6}\b"),
    preset("UPI ID", r"\b[a-zA-Z0-9.\-_]{2,}@[a-zA-Z]{3,}\b"),
    preset("Credit Card Number", r"\b(?:\d[ -]*?){13,16}\b"),
    preset("CVV (3 digits)", r"\b\d{3}\b"),
    preset("TAN Number", r"\b[A-Z]{4}\d{5}[A-Z]\b"),
    preset("IP Address (IPv4)", r"\b(?:\d{1,3}\.){3}\d{1,3}\b"),
    preset(
        "URL",
        r"https?://(?:www\.)?[a-zA-Z0-9]([a-zA-Z0-9.-]*[a-zA-Z0-9])?(?:\.[a-zA-Z]{2,})+(?:/[^\s]*)?|www\.[a-zA-Z0-9]([a-zA-Z0-9.-]*[a-zA-Z0-9])?\.[a-zA-Z]{2,}(?:/[^\s]*)?",
    ),
    preset("INR Amount (₹ Format)", r"₹\s?\d{1,3}(,\d{3})*(\.\d{2})?"),
    preset("PNR Number", r"\b\d{10}\b"),
    preset("Indian Mobile Number", r"\b[6-9]\d{9}\b"),
    preset("Date (DD/MM/YYYY)", r"\b\d{2}/\d{2}/\d{4}\b"),
    preset("Date (YYYY-MM-DD)", r"\b\d{4}-\d{2}-\d{2}\b"),
    preset("Pincode", r"\b\d{6}\b"),
    preset("Vehicle Number", r"\b[A-Z]{2}\d{2}[A-Z]{2}\d{4}\b"),
    preset("Invoice Number", r"\b(?:INV|INVOICE)[-\s]*\d+\b"),
    preset("Order Number", r"\b(?:ORD|ORDER)[-\s]*\d+\b"),
];

/// Looks up a preset by its exact name.
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}
