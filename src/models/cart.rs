use serde::{Deserialize, Serialize};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::OnceLock;

/// 계산 금액 컬럼 (추출 후 수량 × 단가로 채움)
pub const AMOUNT_COLUMN: &str = "금액";

/// 앱 변형: 장바구니 → Excel (Basic), 장바구니 → 품의서 (Procurement)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartVariant {
    Basic,
    #[default]
    Procurement,
}

impl CartVariant {
    /// 모델이 채워야 하는 컬럼 (순서 고정)
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            CartVariant::Basic => &["품명", "수량", "단가", "총액"],
            CartVariant::Procurement => &["내용", "규격", "수량", "예상단가"],
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" | "excel" => Some(CartVariant::Basic),
            "procurement" | "expense" => Some(CartVariant::Procurement),
            _ => None,
        }
    }

    /// 모델에 전달하는 자연어 지시문
    pub fn prompt(&self) -> &'static str {
        match self {
            CartVariant::Basic => concat!(
                "이 이미지는 쇼핑몰 장바구니입니다. ",
                "각 행을 {\"품명\":\"...\",\"수량\":정수,\"단가\":정수,\"총액\":정수} ",
                "형식의 JSON 배열로만 반환하세요."
            ),
            CartVariant::Procurement => concat!(
                "이 이미지는 쇼핑몰 장바구니입니다. ",
                "각 행을 {\"내용\":\"상품명\",\"규격\":\"옵션/규격(없으면 빈 문자열)\",",
                "\"수량\":정수,\"예상단가\":정수} ",
                "형식의 JSON 배열로만 반환하세요."
            ),
        }
    }

    /// function calling 스키마 (`extract_items`)
    pub fn tool_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for column in self.columns() {
            let kind = match *column {
                "품명" | "내용" | "규격" => "string",
                _ => "integer",
            };
            properties.insert((*column).to_string(), json!({ "type": kind }));
        }

        json!({
            "name": "extract_items",
            "description": "Extract cart items from image",
            "parameters": {
                "type": "object",
                "properties": {
                    "items": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": properties,
                            "required": self.columns(),
                        }
                    }
                },
                "required": ["items"]
            }
        })
    }
}

/// 모델 응답의 원본 행 - 모든 필드가 선택적이며 타입도 보장되지 않음
///
/// 같은 컬럼을 가리키는 키가 여러 개 와도(`품명`과 `내용` 등) 행을 버리지 않고
/// 목록 순서상 먼저 값이 있는 키를 쓴다.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct RawCartItem {
    pub name: Option<Value>,
    pub spec: Option<Value>,
    pub quantity: Option<Value>,
    pub unit_price: Option<Value>,
    pub total: Option<Value>,
}

const NAME_KEYS: &[&str] = &["품명", "내용", "name"];
const SPEC_KEYS: &[&str] = &["규격", "spec"];
const QUANTITY_KEYS: &[&str] = &["수량", "quantity"];
const UNIT_PRICE_KEYS: &[&str] = &["단가", "예상단가", "unit_price"];
const TOTAL_KEYS: &[&str] = &["총액", "total"];

fn first_present(map: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    let mut found = None;
    for key in keys {
        match map.remove(*key) {
            Some(Value::Null) | None => {}
            Some(value) if found.is_none() => found = Some(value),
            Some(value) => {
                tracing::debug!("Ignoring duplicate column {} = {}", key, value);
            }
        }
    }
    found
}

impl From<Map<String, Value>> for RawCartItem {
    fn from(mut map: Map<String, Value>) -> Self {
        Self {
            name: first_present(&mut map, NAME_KEYS),
            spec: first_present(&mut map, SPEC_KEYS),
            quantity: first_present(&mut map, QUANTITY_KEYS),
            unit_price: first_present(&mut map, UNIT_PRICE_KEYS),
            total: first_present(&mut map, TOTAL_KEYS),
        }
    }
}

/// 장바구니 한 행
///
/// 누락되거나 변환할 수 없는 값은 문자열은 `""`, 수량/단가는 `0`으로 채운다.
/// 총액은 모델이 읽은 값 그대로이며 없으면 `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub name: String,
    #[serde(default)]
    pub spec: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub unit_price: i64,
    #[serde(default)]
    pub total: Option<i64>,
}

impl CartItem {
    /// 원본 행을 고정 스키마로 변환 (타입 오류는 경고 후 기본값)
    pub fn from_raw(raw: RawCartItem) -> Self {
        Self {
            name: coerce_text("name", raw.name.as_ref()),
            spec: coerce_text("spec", raw.spec.as_ref()),
            quantity: coerce_int("quantity", raw.quantity.as_ref()).unwrap_or(0),
            unit_price: coerce_int("unit_price", raw.unit_price.as_ref()).unwrap_or(0),
            total: coerce_int("total", raw.total.as_ref()),
        }
    }

    /// 금액 = 수량 × 단가
    pub fn amount(&self) -> i64 {
        self.quantity.saturating_mul(self.unit_price)
    }

    /// 변형별 컬럼 순서에 맞춘 셀 값 (마지막은 금액)
    pub fn cells(&self, variant: CartVariant) -> Vec<String> {
        let mut cells = match variant {
            CartVariant::Basic => vec![
                self.name.clone(),
                self.quantity.to_string(),
                self.unit_price.to_string(),
                self.total.map(|t| t.to_string()).unwrap_or_default(),
            ],
            CartVariant::Procurement => vec![
                self.name.clone(),
                self.spec.clone(),
                self.quantity.to_string(),
                self.unit_price.to_string(),
            ],
        };
        cells.push(self.amount().to_string());
        cells
    }
}

fn coerce_text(field: &str, value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            tracing::warn!("Field {} has unexpected type, using empty string: {}", field, other);
            String::new()
        }
    }
}

/// 정수 변환: 정수, 실수(버림), "12,000원" 같은 문자열을 허용
fn coerce_int(field: &str, value: Option<&Value>) -> Option<i64> {
    let parsed = match value? {
        Value::Null => return None,
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => parse_int_text(s),
        _ => None,
    };

    if parsed.is_none() {
        tracing::warn!("Field {} could not be read as an integer: {:?}", field, value);
    }
    parsed
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid number pattern"))
}

/// "12,000원", "₩ 3,500", "3개" 처럼 숫자 하나로 읽히는 문자열만 허용
///
/// "1+1", "12,900원 → 9,900원" 같이 숫자가 여러 개인 값은 `None`.
fn parse_int_text(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    let trimmed = trimmed.strip_prefix('₩').unwrap_or(trimmed).trim_start();
    let trimmed = trimmed
        .strip_suffix('원')
        .or_else(|| trimmed.strip_suffix('개'))
        .unwrap_or(trimmed)
        .trim_end();
    let compact: String = trimmed
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if !number_pattern().is_match(&compact) {
        return None;
    }
    // 소수점 이하는 버림
    let integral = compact.split('.').next().unwrap_or_default();
    integral.parse().ok()
}

/// 추출 결과 테이블 - 한 변형의 행 목록 (업로드 순서 유지)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTable {
    pub variant: CartVariant,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl CartTable {
    pub fn new(variant: CartVariant) -> Self {
        Self {
            variant,
            items: Vec::new(),
        }
    }

    pub fn with_items(variant: CartVariant, items: Vec<CartItem>) -> Self {
        Self { variant, items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 다른 이미지의 결과를 뒤에 이어 붙임
    pub fn extend(&mut self, other: CartTable) {
        if other.variant != self.variant {
            tracing::warn!(
                "Appending {:?} rows to a {:?} table",
                other.variant, self.variant
            );
        }
        self.items.extend(other.items);
    }

    /// 내보내기 헤더: 변형 컬럼 + 금액
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = self.variant.columns().to_vec();
        columns.push(AMOUNT_COLUMN);
        columns
    }

    /// 합계 = 행별 금액의 합
    pub fn grand_total(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |acc, item| acc.saturating_add(item.amount()))
    }
}
