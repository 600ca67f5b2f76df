// src/services/rates.rs
use std::fmt;

use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::Reservation;
use crate::services::auth;

const GRAPHQL_ENDPOINT: &str =
    "https://www.marriott.com/mi/query/PhoenixBookDTTSearchProductsByProperty";
const OPERATION_NAME: &str = "PhoenixBookDTTSearchProductsByProperty";
const OPERATION_SIGNATURE: &str =
    "a6e07eac0eafd7442668a026c453a5f9fa3964cee02ec45b6e07ad6bc792b260";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/145.0.0.0 Safari/537.36";

const GRAPHQL_QUERY: &str = r#"fragment PhoenixBookDTTAmountFragment on MonetaryAmount {
  amount currency decimalPoint __typename
}
query PhoenixBookDTTSearchProductsByProperty($search: ProductByPropertySearchInput!, $offset: Int, $limit: Int) {
  commerce {
    product {
      searchProductsByProperty(search: $search, offset: $offset, limit: $limit) {
        ... on ProductSearchByPropertyConnection {
          edges {
            node {
              ... on HotelRoom {
                id
                rates {
                  name
                  rateModes {
                    ... on HotelRoomRateModesCash {
                      averageNightlyRatePerUnit {
                        amount { ...PhoenixBookDTTAmountFragment __typename }
                        __typename
                      }
                      __typename
                    }
                    ... on HotelRoomRateModesPoints {
                      pointsPerUnit { points __typename }
                      __typename
                    }
                    __typename
                  }
                  __typename
                }
                basicInformation {
                  ratePlan { ratePlanCode marketCode __typename }
                  type name description isMembersOnly depositRequired
                  freeCancellationUntil sourceOfRate __typename
                }
                __typename
              }
              id __typename
            }
            __typename
          }
          total __typename
        }
        __typename
      }
      __typename
    }
    __typename
  }
}"#;

/// What went wrong for one reservation's check. `Fetch` covers transport and
/// non-success responses; `Parse` covers a response whose envelope is
/// structurally unusable. Individual bad records are never an error; they
/// are dropped during normalization.
#[derive(Debug, Clone)]
pub enum CheckError {
    Fetch(String),
    Parse(String),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CheckError::Fetch(msg) => write!(f, "rate fetch failed: {}", msg),
            CheckError::Parse(msg) => write!(f, "rate response malformed: {}", msg),
        }
    }
}

impl std::error::Error for CheckError {}

/// Monetary amount as the upstream sends it: an integer (or occasionally a
/// string) in minor units plus the number of decimal places.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RateAmount {
    pub amount: Option<Value>,
    pub currency: Option<String>,
    #[serde(rename = "decimalPoint")]
    pub decimal_point: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NightlyRate {
    pub amount: Option<RateAmount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PointsPerUnit {
    pub points: Option<i64>,
}

/// Pricing-mode payload, tagged by the upstream type name. New modes show up
/// as `Unknown` and are dropped quietly during normalization rather than
/// breaking the whole response.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "__typename")]
pub enum RateMode {
    #[serde(rename = "HotelRoomRateModesCash")]
    Cash {
        #[serde(rename = "averageNightlyRatePerUnit", default)]
        average_nightly_rate_per_unit: Option<NightlyRate>,
    },
    #[serde(rename = "HotelRoomRateModesPoints")]
    Points {
        #[serde(rename = "pointsPerUnit", default)]
        points_per_unit: Option<PointsPerUnit>,
    },
    #[serde(other)]
    Unknown,
}

/// One room/rate entry as returned by the search, before normalization.
/// Lives only for the duration of a single fetch.
#[derive(Debug, Clone)]
pub struct RawRateRecord {
    pub rate_name: String,
    pub room_type_code: String,
    pub room_type_name: String,
    pub room_description: String,
    pub rate_plan_code: String,
    pub market_code: String,
    pub mode: RateMode,
    pub is_members_only: bool,
    pub deposit_required: bool,
    pub free_cancellation_until: Option<String>,
}

// Wire shape of the response envelope. Everything below `data` degrades to
// empty rather than erroring; only a missing `data` is structural breakage.

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponseData {
    commerce: Option<Commerce>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Commerce {
    product: Option<ProductSearch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProductSearch {
    #[serde(rename = "searchProductsByProperty")]
    search_products_by_property: Option<SearchConnection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchConnection {
    edges: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: Option<Node>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Node {
    #[serde(rename = "__typename")]
    typename: String,
    #[serde(rename = "basicInformation")]
    basic_information: Option<BasicInformation>,
    rates: Option<Rates>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BasicInformation {
    #[serde(rename = "ratePlan")]
    rate_plan: Vec<RatePlan>,
    #[serde(rename = "type")]
    room_type: String,
    name: String,
    description: String,
    #[serde(rename = "isMembersOnly")]
    is_members_only: bool,
    #[serde(rename = "depositRequired")]
    deposit_required: bool,
    #[serde(rename = "freeCancellationUntil")]
    free_cancellation_until: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RatePlan {
    #[serde(rename = "ratePlanCode")]
    rate_plan_code: String,
    #[serde(rename = "marketCode")]
    market_code: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Rates {
    name: String,
    #[serde(rename = "rateModes")]
    rate_modes: Option<RateMode>,
}

/// Source of raw rate records for one reservation. The live implementation
/// talks to the booking API; tests drive the scheduler with stubs.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(
        &self,
        reservation: &Reservation,
        browser_cookies: &str,
    ) -> Result<Vec<RawRateRecord>, CheckError>;
}

/// Live fetcher against the booking GraphQL API. One request per
/// reservation, no retries; the next scheduled cycle is the retry.
pub struct MarriottRates;

impl MarriottRates {
    pub fn new() -> Self {
        MarriottRates
    }

    fn build_variables(reservation: &Reservation, customer_id: Option<&str>) -> Value {
        let mut options = json!({
            "startDate": reservation.check_in.format("%Y-%m-%d").to_string(),
            "endDate": reservation.check_out.format("%Y-%m-%d").to_string(),
            "quantity": reservation.num_rooms,
            "numberInParty": reservation.adults,
            "childAges": [],
            "productRoomType": ["ALL"],
            "productStatusType": ["AVAILABLE"],
            "rateRequestTypes": [
                {"value": "",    "type": "STANDARD"},
                {"value": "",    "type": "PREPAY"},
                {"value": "",    "type": "PACKAGES"},
                {"value": "MRM", "type": "CLUSTER"},
                {"value": "AAA", "type": "AAA"},
            ],
            "isErsProperty": false,
            "disabilityRequest": "ACCESSIBLE_AND_NON_ACCESSIBLE",
        });
        if let Some(id) = customer_id {
            options["customerId"] = json!(id);
        }
        json!({
            "search": {
                "options": options,
                "propertyId": reservation.property_code.to_uppercase(),
            },
            "offset": 0,
            "limit": 150,
        })
    }
}

impl Default for MarriottRates {
    fn default() -> Self {
        MarriottRates::new()
    }
}

#[async_trait]
impl RateSource for MarriottRates {
    async fn fetch_rates(
        &self,
        reservation: &Reservation,
        browser_cookies: &str,
    ) -> Result<Vec<RawRateRecord>, CheckError> {
        let label = reservation.display_name();
        let customer_id = if browser_cookies.trim().is_empty() {
            None
        } else {
            auth::extract_customer_id(browser_cookies)
        };

        let payload = json!({
            "operationName": OPERATION_NAME,
            "variables": Self::build_variables(reservation, customer_id.as_deref()),
            "query": GRAPHQL_QUERY,
        });

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| CheckError::Fetch(e.to_string()))?;

        info!(
            "[{}] Querying rates (customer id: {})",
            label,
            if customer_id.is_some() { "yes" } else { "no" }
        );

        let mut request = client
            .post(GRAPHQL_ENDPOINT)
            .header("accept", "*/*")
            .header("apollographql-client-name", "phoenix_book")
            .header("apollographql-client-version", "1")
            .header("application-name", "book")
            .header("graphql-force-safelisting", "true")
            .header("graphql-require-safelisting", "true")
            .header("graphql-operation-name", OPERATION_NAME)
            .header("graphql-operation-signature", OPERATION_SIGNATURE)
            .header("dtt", "true")
            .header("dnt", "1")
            .header(
                "referer",
                "https://www.marriott.com/reservation/rateListMenu.mi",
            )
            .json(&payload);
        if !browser_cookies.trim().is_empty() {
            request = request.header("cookie", browser_cookies.trim());
        }

        let response = request
            .send()
            .await
            .map_err(|e| CheckError::Fetch(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CheckError::Fetch(e.to_string()))?;
        info!("[{}] HTTP {}, {} bytes", label, status, text.len());

        if !status.is_success() {
            error!("[{}] HTTP {}: {}", label, status, truncate(&text, 400));
            return Err(CheckError::Fetch(format!("HTTP {}", status)));
        }

        let records = parse_rate_response(&text)?;
        info!("[{}] {} rate records returned", label, records.len());
        Ok(records)
    }
}

/// Parse the response body into raw records. A record that fails to decode
/// is skipped; only a body without a usable `data` envelope is an error.
pub fn parse_rate_response(body: &str) -> Result<Vec<RawRateRecord>, CheckError> {
    let envelope: GraphQlResponse =
        serde_json::from_str(body).map_err(|e| CheckError::Parse(e.to_string()))?;
    let data = envelope
        .data
        .ok_or_else(|| CheckError::Parse("response has no data envelope".to_string()))?;

    let edges = data
        .commerce
        .and_then(|c| c.product)
        .and_then(|p| p.search_products_by_property)
        .and_then(|s| s.edges)
        .unwrap_or_default();

    let mut records = Vec::new();
    for edge in edges {
        let edge: Edge = match serde_json::from_value(edge) {
            Ok(edge) => edge,
            Err(e) => {
                debug!("Skipping undecodable edge: {}", e);
                continue;
            }
        };
        let Some(node) = edge.node else { continue };
        if node.typename != "HotelRoom" {
            continue;
        }

        let basic = node.basic_information.unwrap_or_default();
        let rates = node.rates.unwrap_or_default();
        let plan = basic.rate_plan.first().cloned().unwrap_or_default();

        records.push(RawRateRecord {
            rate_name: rates.name,
            room_type_code: basic.room_type.to_uppercase(),
            room_type_name: if basic.name.is_empty() {
                "Room".to_string()
            } else {
                basic.name
            },
            room_description: basic.description,
            rate_plan_code: plan.rate_plan_code,
            market_code: plan.market_code,
            mode: rates.rate_modes.unwrap_or(RateMode::Unknown),
            is_members_only: basic.is_members_only,
            deposit_required: basic.deposit_required,
            free_cancellation_until: basic.free_cancellation_until,
        });
    }
    Ok(records)
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
