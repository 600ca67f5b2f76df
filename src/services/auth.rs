// src/services/auth.rs
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use log::{info, warn};
use regex::Regex;
use serde_json::Value;

/// Pull the loyalty customer id out of the operator's pasted cookie blob.
///
/// The `UserIdToken` cookie is a JWT whose payload carries `AltCustID`;
/// attaching that id to the rate search unlocks member-only pricing. Any
/// failure along the way (no cookie, bad base64, bad JSON) is logged and
/// yields `None`; the search still works, just without member rates.
pub fn extract_customer_id(browser_cookies: &str) -> Option<String> {
    match try_extract(browser_cookies) {
        Some(id) => {
            info!("Extracted customer id from cookie blob");
            Some(id)
        }
        None => {
            warn!("Could not extract customer id from cookie blob");
            None
        }
    }
}

fn try_extract(browser_cookies: &str) -> Option<String> {
    let re = Regex::new(r"UserIdToken=([^;]+)").ok()?;
    let token = re.captures(browser_cookies)?.get(1)?.as_str();
    let payload = token.split('.').nth(1)?;
    let bytes = decode_segment(payload)?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("AltCustID")?.as_str().map(str::to_string)
}

// JWT segments are base64url without padding, but tokens pasted out of
// devtools sometimes arrive standard-encoded; accept both.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    if let Ok(bytes) = URL_SAFE_NO_PAD.decode(segment) {
        return Some(bytes);
    }
    let mut padded = segment.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    STANDARD.decode(padded).ok()
}
