// src/fetch/mod.rs
//
// Thin DOM-provider boundary: builds the two source URLs per country and
// fetches their HTML. Everything interesting about the pages happens in
// `extract`; this layer only owns retries and HTTP failures.

use std::time::Duration;

use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::records::Alpha2;

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

/// The alpha-2 codes covered by a full extraction run.
pub static COUNTRY_CODES: &[&str] = &[
    "AD", "AE", "AF", "AG", "AI", "AL", "AM", "AO", "AQ", "AR", "AS", "AT", "AU", "AW", "AX", "AZ",
    "BA", "BB", "BD", "BE", "BF", "BG", "BH", "BI", "BJ", "BL", "BM", "BN", "BO", "BQ", "BR", "BS",
    "BT", "BV", "BW", "BY", "BZ", "CA", "CC", "CD", "CF", "CG", "CH", "CI", "CK", "CL", "CM", "CN",
    "CO", "CR", "CU", "CV", "CW", "CX", "CY", "CZ", "DE", "DJ", "DK", "DM", "DO", "DZ", "EC", "EE",
    "EG", "EH", "ER", "ES", "ET", "FI", "FJ", "FK", "FM", "FO", "FR", "GA", "GB", "GD", "GE", "GF",
    "GG", "GH", "GI", "GL", "GM", "GN", "GP", "GQ", "GR", "GS", "GT", "GU", "GW", "GY", "HK", "HM",
    "HN", "HR", "HT", "HU", "ID", "IE", "IL", "IM", "IN", "IO", "IQ", "IR", "IS", "IT", "JE", "JM",
    "JO", "JP", "KE", "KG", "KH", "KI", "KM", "KN", "KP", "KR", "KW", "KY", "KZ", "LA", "LB", "LC",
    "LI", "LK", "LR", "LS", "LT", "LU", "LV", "LY", "MA", "MC", "MD", "ME", "MF", "MG", "MH", "MK",
    "ML", "MM", "MN", "MO", "MP", "MQ", "MR", "MS", "MT", "MU", "MV", "MW", "MX", "MY", "MZ", "NA",
    "NC", "NE", "NF", "NG", "NI", "NL", "NO", "NP", "NR", "NU", "NZ", "OM", "PA", "PE", "PF", "PG",
    "PH", "PK", "PL", "PM", "PN", "PR", "PS", "PT", "PW", "PY", "QA", "RE", "RO", "RS", "RU", "RW",
    "SA", "SB", "SC", "SD", "SE", "SG", "SH", "SI", "SJ", "SK", "SL", "SM", "SN", "SO", "SR", "SS",
    "ST", "SV", "SX", "SY", "SZ", "TC", "TD", "TF", "TG", "TH", "TJ", "TK", "TL", "TM", "TN", "TO",
    "TR", "TT", "TV", "TW", "TZ", "UA", "UG", "UM", "US", "UY", "UZ", "VA", "VC", "VE", "VG", "VI",
    "VN", "VU", "WF", "WS", "YE", "YT", "ZA", "ZM", "ZW",
];

/// Raw HTML for one country's two sources.
#[derive(Debug, Clone)]
pub struct CountryPages {
    pub alpha2: Alpha2,
    pub wiki_html: String,
    pub obp_html: String,
}

/// The Wikipedia change-history page for a country.
pub fn wiki_url(alpha2: &Alpha2) -> String {
    format!("https://en.wikipedia.org/wiki/ISO_3166-2:{alpha2}")
}

/// The ISO Online Browsing Platform page for a country.
pub fn obp_url(alpha2: &Alpha2) -> String {
    format!("https://www.iso.org/obp/ui/#iso:code:3166:{alpha2}")
}

/// GET one page, retrying transient failures with exponential backoff.
pub async fn get_page(client: &Client, url: &str) -> Result<String> {
    let mut attempts = 0;
    loop {
        match get_page_core(client, url).await {
            Ok(body) => return Ok(body),
            Err(e) if attempts < MAX_RETRIES => {
                attempts += 1;
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempts - 1);
                warn!(%url, attempt = attempts, delay_ms = backoff, error = %e, "retrying");
                sleep(Duration::from_millis(backoff)).await;
            }
            Err(e) => {
                error!(%url, error = %e, "exhausted retries");
                return Err(e.into());
            }
        }
    }
}

async fn get_page_core(client: &Client, url: &str) -> std::result::Result<String, reqwest::Error> {
    debug!(%url, "fetching");
    client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}

/// Fetch both source pages for one country.
pub async fn fetch_country(client: &Client, alpha2: Alpha2) -> Result<CountryPages> {
    let wiki_html = get_page(client, &wiki_url(&alpha2)).await?;
    let obp_html = get_page(client, &obp_url(&alpha2)).await?;
    Ok(CountryPages {
        alpha2,
        wiki_html,
        obp_html,
    })
}
