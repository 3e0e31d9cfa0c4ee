//! CLOB API collaborator interface and its HTTP implementation.
//!
//! [`ClobApi`] is the seam between the reconciliation core and the venue.
//! [`ClobClient`] implements it over the Polymarket CLOB REST API; tests use
//! [`crate::clob::MockClob`] instead. Key provisioning and order signing are
//! handled outside this crate: the client attaches pre-provisioned API
//! credentials as headers.

use std::future::Future;
use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::ClobError;
use crate::market::Market;
use crate::metrics;
use crate::orderbook::{CompetitorBook, PriceLevel, Side};

/// An open keeper order as reported by the venue, before token-id resolution.
#[derive(Debug, Clone)]
pub struct OpenOrder {
    /// Venue order id.
    pub id: String,
    /// Order side.
    pub side: Side,
    /// CLOB token id of the traded outcome.
    pub token_id: String,
    /// Limit price.
    pub price: Decimal,
    /// Remaining (unmatched) size.
    pub size: Decimal,
}

/// Parameters for placing a new order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderArgs {
    /// CLOB token id to trade.
    pub token_id: String,
    /// Order side.
    pub side: Side,
    /// Limit price.
    pub price: Decimal,
    /// Order size in tokens.
    pub size: Decimal,
}

/// Capabilities the reconciliation core needs from the venue.
///
/// Every method is best-effort: callers substitute safe defaults or skip the
/// tick on failure, per the error-handling design.
pub trait ClobApi: Send + Sync + 'static {
    /// Fetch the keeper's open orders for a market.
    fn get_open_orders(
        &self,
        condition_id: &str,
    ) -> impl Future<Output = Result<Vec<OpenOrder>, ClobError>> + Send;

    /// Fetch the collateral (USDC) balance.
    fn get_collateral_balance(&self) -> impl Future<Output = Result<Decimal, ClobError>> + Send;

    /// Fetch the balance of one outcome token.
    fn get_token_balance(
        &self,
        token_id: &str,
    ) -> impl Future<Output = Result<Decimal, ClobError>> + Send;

    /// Place a new order; returns the venue-assigned order id.
    fn place_order(
        &self,
        args: &OrderArgs,
    ) -> impl Future<Output = Result<String, ClobError>> + Send;

    /// Cancel one order; `Ok(true)` when the venue confirmed the cancel.
    fn cancel_order(&self, order_id: &str)
        -> impl Future<Output = Result<bool, ClobError>> + Send;

    /// Cancel every open keeper order.
    fn cancel_all(&self) -> impl Future<Output = Result<bool, ClobError>> + Send;

    /// Current midpoint price for a token.
    fn get_midpoint(&self, token_id: &str)
        -> impl Future<Output = Result<Decimal, ClobError>> + Send;

    /// Current top-of-book spread for a token.
    fn get_spread(&self, token_id: &str)
        -> impl Future<Output = Result<Decimal, ClobError>> + Send;

    /// Competitor order book for a token.
    fn get_order_book(
        &self,
        token_id: &str,
    ) -> impl Future<Output = Result<CompetitorBook, ClobError>> + Send;
}

/// Polymarket CLOB REST client.
#[derive(Debug, Clone)]
pub struct ClobClient {
    http: reqwest::Client,
    clob_url: String,
    api_key: Option<String>,
    api_secret: Option<String>,
    api_passphrase: Option<String>,
}

// === API response shapes ===

#[derive(Debug, Deserialize)]
struct MidpointResponse {
    mid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpreadResponse {
    spread: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLevel {
    price: String,
    size: String,
}

#[derive(Debug, Deserialize)]
struct BookResponse {
    bids: Option<Vec<RawLevel>>,
    asks: Option<Vec<RawLevel>>,
}

#[derive(Debug, Deserialize)]
struct OpenOrderResponse {
    id: String,
    side: String,
    asset_id: String,
    price: String,
    original_size: String,
    size_matched: String,
}

#[derive(Debug, Deserialize)]
struct PlaceOrderResponse {
    success: Option<bool>,
    #[serde(rename = "orderID")]
    order_id: Option<String>,
    #[serde(rename = "errorMsg")]
    error_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BalanceAllowanceResponse {
    balance: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MarketTokenResponse {
    token_id: String,
}

#[derive(Debug, Deserialize)]
struct MarketResponse {
    condition_id: Option<String>,
    tokens: Vec<MarketTokenResponse>,
}

/// USDC and conditional-token balances are reported with 6 decimals.
const BALANCE_DECIMALS: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

impl ClobClient {
    /// Connect to the CLOB API, probing connectivity.
    ///
    /// Failure here is fatal at startup: no meaningful reconciliation can
    /// happen without the venue.
    pub async fn connect(config: &Config) -> Result<Self, ClobError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(std::time::Duration::from_millis(500))
            .tcp_nodelay(true)
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .build()?;

        let client = Self {
            http,
            clob_url: config.clob_api_url.clone(),
            api_key: config.clob_api_key.clone(),
            api_secret: config.clob_api_secret.clone(),
            api_passphrase: config.clob_api_passphrase.clone(),
        };

        let response = client
            .http
            .get(format!("{}/", client.clob_url))
            .send()
            .await
            .map_err(|e| ClobError::ConnectFailed {
                host: client.clob_url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ClobError::ConnectFailed {
                host: client.clob_url.clone(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        info!(host = %client.clob_url, "Connected to CLOB API");
        Ok(client)
    }

    /// Fetch market metadata and resolve the two outcome token ids.
    pub async fn get_market(&self, condition_id: &str) -> Result<Market, ClobError> {
        let endpoint = "get_market";
        let url = format!("{}/markets/{}", self.clob_url, condition_id);

        let response = self.http.get(&url).send().await?;
        let market: MarketResponse = Self::parse(endpoint, response).await?;

        if market.tokens.len() != 2 {
            return Err(ClobError::NotBinary {
                condition_id: condition_id.to_string(),
            });
        }

        Ok(Market::new(
            market.condition_id.unwrap_or_else(|| condition_id.to_string()),
            market.tokens[0].token_id.clone(),
            market.tokens[1].token_id.clone(),
        ))
    }

    /// Attach pre-provisioned L2 API credentials.
    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut request = request;
        if let Some(key) = &self.api_key {
            request = request.header("POLY_API_KEY", key);
        }
        if let Some(secret) = &self.api_secret {
            request = request.header("POLY_SECRET", secret);
        }
        if let Some(passphrase) = &self.api_passphrase {
            request = request.header("POLY_PASSPHRASE", passphrase);
        }
        request
    }

    /// Check the status and decode the body, with latency metrics.
    async fn parse<T: serde::de::DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<T, ClobError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClobError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.json::<T>().await.map_err(|e| ClobError::Parse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    fn parse_decimal(endpoint: &str, field: &str, value: &str) -> Result<Decimal, ClobError> {
        value.parse::<Decimal>().map_err(|e| ClobError::Parse {
            endpoint: endpoint.to_string(),
            reason: format!("{field} = {value:?}: {e}"),
        })
    }

    async fn balance_allowance(
        &self,
        asset_type: &str,
        token_id: Option<&str>,
    ) -> Result<Decimal, ClobError> {
        let endpoint = "balance_allowance";
        let start = Instant::now();
        let url = format!("{}/balance-allowance", self.clob_url);

        let mut request = self.authed(self.http.get(&url)).query(&[("asset_type", asset_type)]);
        if let Some(token_id) = token_id {
            request = request.query(&[("token_id", token_id)]);
        }

        let result: Result<BalanceAllowanceResponse, ClobError> = async {
            let response = request.send().await?;
            Self::parse(endpoint, response).await
        }
        .await;

        match result {
            Ok(body) => {
                metrics::record_clob_latency(endpoint, "ok", start);
                let raw = Self::parse_decimal(
                    endpoint,
                    "balance",
                    body.balance.as_deref().unwrap_or("0"),
                )?;
                Ok(raw / BALANCE_DECIMALS)
            }
            Err(e) => {
                metrics::record_clob_latency(endpoint, "error", start);
                Err(e)
            }
        }
    }
}

impl ClobApi for ClobClient {
    #[instrument(skip(self))]
    async fn get_open_orders(&self, condition_id: &str) -> Result<Vec<OpenOrder>, ClobError> {
        let endpoint = "get_orders";
        let start = Instant::now();
        let url = format!("{}/data/orders", self.clob_url);

        let result: Result<Vec<OpenOrderResponse>, ClobError> = async {
            let response = self
                .authed(self.http.get(&url))
                .query(&[("market", condition_id)])
                .send()
                .await?;
            Self::parse(endpoint, response).await
        }
        .await;

        let raw = match result {
            Ok(raw) => {
                metrics::record_clob_latency(endpoint, "ok", start);
                raw
            }
            Err(e) => {
                metrics::record_clob_latency(endpoint, "error", start);
                return Err(e);
            }
        };

        let mut orders = Vec::with_capacity(raw.len());
        for order in raw {
            let side = match order.side.parse::<Side>() {
                Ok(side) => side,
                Err(_) => {
                    warn!(order_id = %order.id, side = %order.side, "Skipping order with unknown side");
                    continue;
                }
            };
            let original = Self::parse_decimal(endpoint, "original_size", &order.original_size)?;
            let matched = Self::parse_decimal(endpoint, "size_matched", &order.size_matched)?;
            orders.push(OpenOrder {
                id: order.id,
                side,
                token_id: order.asset_id,
                price: Self::parse_decimal(endpoint, "price", &order.price)?,
                size: original - matched,
            });
        }

        Ok(orders)
    }

    async fn get_collateral_balance(&self) -> Result<Decimal, ClobError> {
        self.balance_allowance("COLLATERAL", None).await
    }

    async fn get_token_balance(&self, token_id: &str) -> Result<Decimal, ClobError> {
        self.balance_allowance("CONDITIONAL", Some(token_id)).await
    }

    #[instrument(skip(self), fields(token_id = %args.token_id, price = %args.price, size = %args.size))]
    async fn place_order(&self, args: &OrderArgs) -> Result<String, ClobError> {
        let endpoint = "place_order";
        let start = Instant::now();
        let url = format!("{}/order", self.clob_url);

        let result: Result<PlaceOrderResponse, ClobError> = async {
            let response = self.authed(self.http.post(&url)).json(args).send().await?;
            Self::parse(endpoint, response).await
        }
        .await;

        match result {
            Ok(body) => {
                metrics::record_clob_latency(endpoint, "ok", start);
                match (body.success.unwrap_or(false), body.order_id) {
                    (true, Some(order_id)) => {
                        info!(%order_id, "Placed new order");
                        Ok(order_id)
                    }
                    _ => Err(ClobError::OrderRejected {
                        reason: body.error_msg.unwrap_or_else(|| "unknown".to_string()),
                    }),
                }
            }
            Err(e) => {
                metrics::record_clob_latency(endpoint, "error", start);
                Err(e)
            }
        }
    }

    #[instrument(skip(self))]
    async fn cancel_order(&self, order_id: &str) -> Result<bool, ClobError> {
        let endpoint = "cancel";
        let start = Instant::now();
        let url = format!("{}/order", self.clob_url);

        let result = self
            .authed(self.http.delete(&url))
            .json(&serde_json::json!({ "orderID": order_id }))
            .send()
            .await;

        match result {
            Ok(response) => {
                let ok = response.status().is_success();
                metrics::record_clob_latency(endpoint, if ok { "ok" } else { "error" }, start);
                if !ok {
                    debug!(order_id, status = %response.status(), "Cancel was not confirmed");
                }
                Ok(ok)
            }
            Err(e) => {
                metrics::record_clob_latency(endpoint, "error", start);
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self))]
    async fn cancel_all(&self) -> Result<bool, ClobError> {
        let endpoint = "cancel_all";
        let start = Instant::now();
        let url = format!("{}/cancel-all", self.clob_url);

        let result = self.authed(self.http.delete(&url)).send().await;

        match result {
            Ok(response) => {
                let ok = response.status().is_success();
                metrics::record_clob_latency(endpoint, if ok { "ok" } else { "error" }, start);
                Ok(ok)
            }
            Err(e) => {
                metrics::record_clob_latency(endpoint, "error", start);
                Err(e.into())
            }
        }
    }

    async fn get_midpoint(&self, token_id: &str) -> Result<Decimal, ClobError> {
        let endpoint = "get_midpoint";
        let start = Instant::now();
        let url = format!("{}/midpoint", self.clob_url);

        let result: Result<MidpointResponse, ClobError> = async {
            let response = self
                .http
                .get(&url)
                .query(&[("token_id", token_id)])
                .send()
                .await?;
            Self::parse(endpoint, response).await
        }
        .await;

        match result {
            Ok(body) => {
                metrics::record_clob_latency(endpoint, "ok", start);
                let mid = body.mid.ok_or_else(|| ClobError::Parse {
                    endpoint: endpoint.to_string(),
                    reason: "missing mid".to_string(),
                })?;
                Self::parse_decimal(endpoint, "mid", &mid)
            }
            Err(e) => {
                metrics::record_clob_latency(endpoint, "error", start);
                Err(e)
            }
        }
    }

    async fn get_spread(&self, token_id: &str) -> Result<Decimal, ClobError> {
        let endpoint = "get_spread";
        let url = format!("{}/spread", self.clob_url);

        let response = self
            .http
            .get(&url)
            .query(&[("token_id", token_id)])
            .send()
            .await?;
        let body: SpreadResponse = Self::parse(endpoint, response).await?;

        let spread = body.spread.ok_or_else(|| ClobError::Parse {
            endpoint: endpoint.to_string(),
            reason: "missing spread".to_string(),
        })?;
        Self::parse_decimal(endpoint, "spread", &spread)
    }

    async fn get_order_book(&self, token_id: &str) -> Result<CompetitorBook, ClobError> {
        let endpoint = "get_order_book";
        let url = format!("{}/book", self.clob_url);

        let response = self
            .http
            .get(&url)
            .query(&[("token_id", token_id)])
            .send()
            .await?;
        let body: BookResponse = Self::parse(endpoint, response).await?;

        let parse_levels = |levels: Option<Vec<RawLevel>>| -> Vec<PriceLevel> {
            levels
                .unwrap_or_default()
                .into_iter()
                .filter_map(|level| {
                    let price: Decimal = level.price.parse().ok()?;
                    let size: Decimal = level.size.parse().ok()?;
                    (size > Decimal::ZERO).then_some(PriceLevel { price, size })
                })
                .collect()
        };

        let mut bids = parse_levels(body.bids);
        let mut asks = parse_levels(body.asks);
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));

        Ok(CompetitorBook { bids, asks })
    }
}
