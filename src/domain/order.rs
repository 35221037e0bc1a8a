//! Client-signed orders and the CLOB wire envelope.
//!
//! Clients sign orders with their wallet (EIP-712) and hand them over as
//! JSON. Field encodings vary between client libraries (numeric vs string
//! amounts, `0/1` vs `BUY/SELL` sides), so input is accepted leniently and
//! re-emitted in the exchange's canonical form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ids::{ApiKey, WalletAddress};

/// Trade side. Serialized as the literal `BUY` / `SELL` the CLOB expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OrderSide {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderSide {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Lenient::deserialize(deserializer)? {
            Lenient::Int(0) => Ok(Self::Buy),
            Lenient::Int(1) => Ok(Self::Sell),
            Lenient::Text(s) => match s.trim().to_ascii_uppercase().as_str() {
                "BUY" | "0" => Ok(Self::Buy),
                "SELL" | "1" => Ok(Self::Sell),
                other => Err(serde::de::Error::custom(format!("unknown order side: {other}"))),
            },
            Lenient::Int(other) => Err(serde::de::Error::custom(format!(
                "unknown order side: {other}"
            ))),
        }
    }
}

/// Time-in-force accepted by the CLOB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Good-til-cancelled.
    #[default]
    Gtc,
    /// Good-til-date.
    Gtd,
    /// Fill-or-kill.
    Fok,
    /// Fill-and-kill.
    Fak,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Int(u64),
    Text(String),
}

pub(crate) fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Lenient::deserialize(deserializer)? {
        Lenient::Int(n) => n.to_string(),
        Lenient::Text(s) => s,
    })
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Lenient::deserialize(deserializer)? {
        Lenient::Int(n) => Ok(n),
        Lenient::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn lenient_u8<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    match Lenient::deserialize(deserializer)? {
        Lenient::Int(n) => u8::try_from(n).map_err(serde::de::Error::custom),
        Lenient::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// An order as signed by the client's wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOrder {
    #[serde(deserialize_with = "lenient_u64")]
    pub salt: u64,
    pub maker: WalletAddress,
    pub signer: WalletAddress,
    pub taker: WalletAddress,
    #[serde(deserialize_with = "lenient_string")]
    pub token_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub maker_amount: String,
    #[serde(deserialize_with = "lenient_string")]
    pub taker_amount: String,
    pub side: OrderSide,
    #[serde(deserialize_with = "lenient_string")]
    pub expiration: String,
    #[serde(deserialize_with = "lenient_string")]
    pub nonce: String,
    #[serde(deserialize_with = "lenient_string")]
    pub fee_rate_bps: String,
    #[serde(deserialize_with = "lenient_u8")]
    pub signature_type: u8,
    pub signature: String,
}

/// Order submission as received from a client.
///
/// `owner` is optional; when present it must equal the active API key.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOrderRequest {
    pub order: SignedOrder,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub order_type: OrderType,
}

/// Body POSTed to the CLOB `/order` endpoint.
///
/// `owner` is typed as `ApiKey`: the wallet address cannot be placed here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEnvelope {
    pub order: SignedOrder,
    pub owner: ApiKey,
    pub order_type: OrderType,
}

impl OrderEnvelope {
    pub fn new(order: SignedOrder, owner: &ApiKey, order_type: OrderType) -> Self {
        Self {
            order,
            owner: owner.clone(),
            order_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_json(side: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "salt": "1234567",
            "maker": "0x1111111111111111111111111111111111111111",
            "signer": "0x2222222222222222222222222222222222222222",
            "taker": "0x0000000000000000000000000000000000000000",
            "tokenId": "7123",
            "makerAmount": 5000000,
            "takerAmount": "10000000",
            "side": side,
            "expiration": "0",
            "nonce": 0,
            "feeRateBps": "0",
            "signatureType": 2,
            "signature": "0xdeadbeef"
        })
    }

    #[test]
    fn test_numeric_side_maps_to_literal() {
        let buy: SignedOrder = serde_json::from_value(order_json(serde_json::json!(0))).unwrap();
        let sell: SignedOrder = serde_json::from_value(order_json(serde_json::json!(1))).unwrap();
        assert_eq!(buy.side, OrderSide::Buy);
        assert_eq!(sell.side, OrderSide::Sell);
        assert_eq!(serde_json::to_value(sell).unwrap()["side"], "SELL");
    }

    #[test]
    fn test_text_side_any_case() {
        let o: SignedOrder = serde_json::from_value(order_json(serde_json::json!("buy"))).unwrap();
        assert_eq!(o.side, OrderSide::Buy);
        assert!(serde_json::from_value::<SignedOrder>(order_json(serde_json::json!(7))).is_err());
    }

    #[test]
    fn test_lenient_numbers_normalize() {
        let o: SignedOrder = serde_json::from_value(order_json(serde_json::json!("SELL"))).unwrap();
        assert_eq!(o.salt, 1_234_567);
        assert_eq!(o.maker_amount, "5000000");
        assert_eq!(o.nonce, "0");
        let wire = serde_json::to_value(&o).unwrap();
        assert_eq!(wire["salt"], 1_234_567);
        assert_eq!(wire["signatureType"], 2);
    }

    #[test]
    fn test_signature_type_accepts_text() {
        let mut raw = order_json(serde_json::json!("BUY"));
        raw["signatureType"] = serde_json::json!("2");
        let o: SignedOrder = serde_json::from_value(raw).unwrap();
        assert_eq!(o.signature_type, 2);
        assert_eq!(serde_json::to_value(&o).unwrap()["signatureType"], 2);

        let mut raw = order_json(serde_json::json!("BUY"));
        raw["signatureType"] = serde_json::json!(300);
        assert!(serde_json::from_value::<SignedOrder>(raw).is_err());
    }

    #[test]
    fn test_envelope_owner_is_api_key() {
        let o: SignedOrder = serde_json::from_value(order_json(serde_json::json!("BUY"))).unwrap();
        let key = ApiKey::new("api-key-1").unwrap();
        let env = OrderEnvelope::new(o, &key, OrderType::Fok);
        let wire = serde_json::to_value(&env).unwrap();
        assert_eq!(wire["owner"], "api-key-1");
        assert_eq!(wire["orderType"], "FOK");
        assert_eq!(wire["order"]["side"], "BUY");
    }

    #[test]
    fn test_client_request_defaults_to_gtc() {
        let req: ClientOrderRequest =
            serde_json::from_value(serde_json::json!({ "order": order_json(serde_json::json!(0)) }))
                .unwrap();
        assert_eq!(req.order_type, OrderType::Gtc);
        assert!(req.owner.is_none());
    }
}
