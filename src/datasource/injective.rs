//! HTTP data source backed by the exchange indexer gateway, the chain REST API and a
//! CoinGecko-compatible price oracle.

use super::{DataSource, DataSourceError, MAX_PRICE_IDS_PER_REQUEST};
use crate::domain::{
    Address, BankBalance, CoinId, CoinPrice, Decimal, Denom, DerivativeOrder, DerivativePosition,
    MarketId, OrderSide, PositionDirection, SpotOrder, SubaccountBalance, SubaccountId,
};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct InjectiveDataSource {
    client: Client,
    exchange_url: String,
    chain_url: String,
    oracle_url: String,
}

impl InjectiveDataSource {
    pub fn new(exchange_url: String, chain_url: String, oracle_url: String) -> Self {
        Self {
            client: Client::new(),
            exchange_url: exchange_url.trim_end_matches('/').to_string(),
            chain_url: chain_url.trim_end_matches('/').to_string(),
            oracle_url: oracle_url.trim_end_matches('/').to_string(),
        }
    }

    async fn send_json<F>(&self, build: F) -> Result<Value, DataSourceError>
    where
        F: Fn() -> RequestBuilder,
    {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = build().send().await.map_err(|e| {
                backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
            })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(DataSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await
    }

    async fn post_exchange(&self, path: &str, payload: Value) -> Result<Value, DataSourceError> {
        let url = format!("{}{}", self.exchange_url, path);
        debug!("POST {} {}", url, payload);
        self.send_json(|| self.client.post(&url).json(&payload))
            .await
    }

    async fn get_chain(&self, path: &str) -> Result<Value, DataSourceError> {
        let url = format!("{}{}", self.chain_url, path);
        debug!("GET {}", url);
        self.send_json(|| self.client.get(&url)).await
    }
}

#[async_trait]
impl DataSource for InjectiveDataSource {
    async fn fetch_subaccount_balances(
        &self,
        subaccount_id: &SubaccountId,
        denoms: &[Denom],
    ) -> Result<Vec<SubaccountBalance>, DataSourceError> {
        let payload = serde_json::json!({
            "subaccountId": subaccount_id.as_str(),
            "denoms": denoms.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
        });
        let response = self
            .post_exchange("/api/exchange/accounts/v1/subaccountBalances", payload)
            .await?;
        array_field(&response, "balances")?
            .iter()
            .map(parse_subaccount_balance)
            .collect()
    }

    async fn fetch_spot_orders(
        &self,
        market_ids: &[MarketId],
        subaccount_id: &SubaccountId,
    ) -> Result<Vec<SpotOrder>, DataSourceError> {
        if market_ids.is_empty() {
            return Ok(Vec::new());
        }
        let payload = serde_json::json!({
            "marketIds": market_ids.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
            "subaccountId": subaccount_id.as_str(),
        });
        let response = self
            .post_exchange("/api/exchange/spot/v1/orders", payload)
            .await?;
        array_field(&response, "orders")?
            .iter()
            .map(parse_spot_order)
            .collect()
    }

    async fn fetch_derivative_orders(
        &self,
        market_ids: &[MarketId],
        subaccount_id: &SubaccountId,
    ) -> Result<Vec<DerivativeOrder>, DataSourceError> {
        if market_ids.is_empty() {
            return Ok(Vec::new());
        }
        let payload = serde_json::json!({
            "marketIds": market_ids.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
            "subaccountId": subaccount_id.as_str(),
        });
        let response = self
            .post_exchange("/api/exchange/derivative/v1/orders", payload)
            .await?;
        array_field(&response, "orders")?
            .iter()
            .map(parse_derivative_order)
            .collect()
    }

    async fn fetch_positions(
        &self,
        subaccount_id: &SubaccountId,
    ) -> Result<Vec<DerivativePosition>, DataSourceError> {
        let payload = serde_json::json!({ "subaccountId": subaccount_id.as_str() });
        let response = self
            .post_exchange("/api/exchange/derivative/v1/positions", payload)
            .await?;
        array_field(&response, "positions")?
            .iter()
            .map(parse_position)
            .collect()
    }

    async fn fetch_bank_balances(
        &self,
        address: &Address,
    ) -> Result<Vec<BankBalance>, DataSourceError> {
        let response = self
            .get_chain(&format!("/cosmos/bank/v1beta1/balances/{}", address))
            .await?;
        array_field(&response, "balances")?
            .iter()
            .map(|coin| {
                Ok(BankBalance {
                    denom: Denom::new(str_field(coin, "denom")?),
                    amount: decimal_field(coin, "amount")?,
                })
            })
            .collect()
    }

    async fn fetch_staked_amount(
        &self,
        address: &Address,
        denom: &Denom,
    ) -> Result<Decimal, DataSourceError> {
        let response = self
            .get_chain(&format!("/cosmos/staking/v1beta1/delegations/{}", address))
            .await?;
        sum_delegations(&response, denom)
    }

    async fn fetch_prices_usd(&self, coin_ids: &[CoinId]) -> Result<Vec<CoinPrice>, DataSourceError> {
        if coin_ids.len() > MAX_PRICE_IDS_PER_REQUEST {
            return Err(DataSourceError::Other(format!(
                "at most {} coin ids per price request, got {}",
                MAX_PRICE_IDS_PER_REQUEST,
                coin_ids.len()
            )));
        }
        let url = format!("{}/simple/price", self.oracle_url);
        let ids = coin_ids
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(",");
        debug!("GET {} ids={}", url, ids);

        let response = self
            .send_json(|| {
                self.client
                    .get(&url)
                    .query(&[("ids", ids.as_str()), ("vs_currencies", "usd")])
            })
            .await?;
        parse_prices(&response, coin_ids)
    }
}

fn array_field<'a>(json: &'a Value, key: &str) -> Result<&'a Vec<Value>, DataSourceError> {
    match json.get(key) {
        Some(Value::Array(items)) => Ok(items),
        // Empty collections are sometimes sent as null.
        Some(Value::Null) | None => Ok(empty_array()),
        Some(_) => Err(DataSourceError::ParseError(format!(
            "Expected array field {}",
            key
        ))),
    }
}

fn empty_array() -> &'static Vec<Value> {
    static EMPTY: Vec<Value> = Vec::new();
    &EMPTY
}

fn str_field<'a>(json: &'a Value, key: &str) -> Result<&'a str, DataSourceError> {
    json.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| DataSourceError::ParseError(format!("Missing {} field", key)))
}

fn decimal_field(json: &Value, key: &str) -> Result<Decimal, DataSourceError> {
    let raw = str_field(json, key)?;
    Decimal::from_str_canonical(raw)
        .map_err(|e| DataSourceError::ParseError(format!("Invalid {}: {}", key, e)))
}

fn market_id_field(json: &Value) -> Result<MarketId, DataSourceError> {
    let raw = str_field(json, "marketId")?;
    MarketId::parse(raw).map_err(|e| DataSourceError::ParseError(format!("Invalid marketId: {}", e)))
}

fn parse_subaccount_balance(json: &Value) -> Result<SubaccountBalance, DataSourceError> {
    let denom = Denom::new(str_field(json, "denom")?);
    let deposit = json
        .get("deposit")
        .ok_or_else(|| DataSourceError::ParseError("Missing deposit field".to_string()))?;
    Ok(SubaccountBalance::new(
        denom,
        decimal_field(deposit, "totalBalance")?,
        decimal_field(deposit, "availableBalance")?,
    ))
}

fn parse_spot_order(json: &Value) -> Result<SpotOrder, DataSourceError> {
    let side_str = str_field(json, "orderSide")?;
    // Post-only orders reserve margin like their plain counterparts.
    let order_side = match side_str.trim_end_matches("_po") {
        "buy" => OrderSide::Buy,
        "sell" => OrderSide::Sell,
        _ => {
            return Err(DataSourceError::ParseError(format!(
                "Invalid orderSide: {}",
                side_str
            )))
        }
    };

    Ok(SpotOrder {
        market_id: market_id_field(json)?,
        order_side,
        price: decimal_field(json, "price")?,
        unfilled_quantity: decimal_field(json, "unfilledQuantity")?,
    })
}

fn parse_derivative_order(json: &Value) -> Result<DerivativeOrder, DataSourceError> {
    Ok(DerivativeOrder {
        market_id: market_id_field(json)?,
        margin: decimal_field(json, "margin")?,
    })
}

fn parse_position(json: &Value) -> Result<DerivativePosition, DataSourceError> {
    let direction_str = str_field(json, "direction")?;
    let direction = match direction_str {
        "long" => PositionDirection::Long,
        "short" => PositionDirection::Short,
        _ => {
            return Err(DataSourceError::ParseError(format!(
                "Invalid direction: {}",
                direction_str
            )))
        }
    };

    Ok(DerivativePosition {
        market_id: market_id_field(json)?,
        direction,
        quantity: decimal_field(json, "quantity")?,
        margin: decimal_field(json, "margin")?,
        entry_price: decimal_field(json, "entryPrice")?,
        mark_price: decimal_field(json, "markPrice")?,
    })
}

fn sum_delegations(json: &Value, denom: &Denom) -> Result<Decimal, DataSourceError> {
    let mut total = Decimal::zero();
    for delegation in array_field(json, "delegation_responses")? {
        let balance = delegation
            .get("balance")
            .ok_or_else(|| DataSourceError::ParseError("Missing balance field".to_string()))?;
        if str_field(balance, "denom")? == denom.as_str() {
            total = total
                .checked_add(decimal_field(balance, "amount")?)
                .ok_or_else(|| DataSourceError::ParseError("Delegation total overflows".to_string()))?;
        }
    }
    Ok(total)
}

fn parse_prices(json: &Value, coin_ids: &[CoinId]) -> Result<Vec<CoinPrice>, DataSourceError> {
    let quotes = json
        .as_object()
        .ok_or_else(|| DataSourceError::ParseError("Expected object response".to_string()))?;

    let mut prices = Vec::with_capacity(coin_ids.len());
    for coin_id in coin_ids {
        let Some(quote) = quotes.get(coin_id.as_str()) else {
            continue;
        };
        let price_usd = quote.get("usd").and_then(|v| v.as_f64()).ok_or_else(|| {
            DataSourceError::ParseError(format!("Missing usd price for {}", coin_id))
        })?;
        prices.push(CoinPrice {
            coin_id: coin_id.clone(),
            price_usd,
        });
    }
    Ok(prices)
}
